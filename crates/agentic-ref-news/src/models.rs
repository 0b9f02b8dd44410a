//! Deterministic stand-ins for a language model.
//!
//! Each function returns an `FnModel` that decides from the request alone:
//! the current turn's input and the tool results seen since then. No model
//! keeps state between calls, so the same request always gets the same
//! decision.

use std::collections::HashSet;

use serde_json::{json, Map, Value};

use agentic_contracts::{
    event::{Event, EventKind},
    model::{CompletionRequest, CompletionResponse, CompletionUsage, ToolSchema},
};
use agentic_core::{memory::READ_BLOCK_TOOL, FnModel};

use crate::mock_data::{FETCH_PROFILE, QUERY_NEWS, SEARCH_PROFILES};

/// The producer's human-input tool.
pub const HUMAN_INPUT_TOOL: &str = "get_human_input";
/// Tool name of the "News Reporter" sub-agent.
pub const REPORTER_TOOL: &str = "news_reporter";
/// The reporter's optional human-input tool.
pub const EDITOR_TOOL: &str = "ask_editor";
/// Tool name of the "Profile Writer" sub-agent.
pub const WRITER_TOOL: &str = "profile_writer";
pub const TOPIC_PROMPT: &str = "What is the news topic?";
/// Run variable holding the producer's answered topic.
pub const TOPIC_VAR: &str = "topic";

// ── Request helpers ───────────────────────────────────────────────────────────

/// Events of the current turn: the latest user input and everything after it.
fn current_turn(req: &CompletionRequest) -> &[Event] {
    let start = req
        .history
        .iter()
        .rposition(|e| e.kind == EventKind::UserInput)
        .unwrap_or(0);
    &req.history[start..]
}

fn user_input(req: &CompletionRequest) -> &str {
    current_turn(req)
        .iter()
        .find(|e| e.kind == EventKind::UserInput)
        .and_then(Event::text)
        .unwrap_or_default()
}

fn last_result(req: &CompletionRequest) -> Option<&Event> {
    current_turn(req)
        .iter()
        .rev()
        .find(|e| e.kind == EventKind::ToolResult)
}

/// The observation carried by a `ToolResult`, as text.
fn result_text(event: &Event) -> String {
    match (event.tool_result(), event.error_message()) {
        (Some(Value::String(s)), _) => s.clone(),
        (Some(other), _) => other.to_string(),
        (None, Some(message)) => message.to_string(),
        (None, None) => String::new(),
    }
}

fn first_sentences(text: &str, count: usize) -> String {
    let mut out = String::new();
    for (i, sentence) in text.split_inclusive(". ").enumerate() {
        if i == count {
            break;
        }
        out.push_str(sentence);
    }
    out.trim_end().to_string()
}

/// Rough token counts for the usage report, four characters to a token.
pub fn estimated_usage(req: &CompletionRequest, resp: &CompletionResponse) -> CompletionUsage {
    let prompt_chars = req.instructions.len()
        + req
            .history
            .iter()
            .map(|e| e.payload.to_string().len())
            .sum::<usize>();
    let reply_chars = match resp {
        CompletionResponse::Text { content } => content.len(),
        CompletionResponse::ToolCalls { calls } => calls
            .iter()
            .map(|c| c.tool_name.len() + c.arguments.to_string().len())
            .sum(),
    };
    CompletionUsage {
        input_tokens: prompt_chars.div_ceil(4) as u64,
        output_tokens: reply_chars.div_ceil(4) as u64,
        ..CompletionUsage::default()
    }
}

// ── Echo ──────────────────────────────────────────────────────────────────────

/// Call `echo` with the input once, then answer with what it returned.
pub fn echo_model() -> FnModel {
    FnModel::new(|req| {
        Ok(match last_result(req) {
            None => CompletionResponse::call("echo", json!({ "text": user_input(req) })),
            Some(result) => CompletionResponse::text(format!("You said: {}", result_text(result))),
        })
    })
    .metered(estimated_usage)
}

// ── News desk ─────────────────────────────────────────────────────────────────

/// Ask the human for a topic, hand it to the reporter, summarize the report
/// in one sentence.
pub fn producer_model() -> FnModel {
    FnModel::new(|req| {
        let ask = || CompletionResponse::call(HUMAN_INPUT_TOOL, json!({ "msg": TOPIC_PROMPT }));

        let Some(result) = last_result(req) else {
            return Ok(ask());
        };
        Ok(match result.tool() {
            Some(HUMAN_INPUT_TOOL) => {
                let topic = result_text(result);
                if topic.trim().is_empty() {
                    ask()
                } else {
                    CompletionResponse::call(REPORTER_TOOL, json!({ "input": topic.trim() }))
                }
            }
            _ if result.error_message().is_some() => CompletionResponse::text(format!(
                "The reporter could not file a story: {}",
                result_text(result)
            )),
            _ => CompletionResponse::text(format!(
                "Summary: {}",
                first_sentences(&result_text(result), 1)
            )),
        })
    })
    .metered(estimated_usage)
}

/// Query the wire for the input topic, then report the headlines.
///
/// When the wire has nothing and the agent offers [`EDITOR_TOOL`], the
/// reporter asks the editor for another topic once and queries again.
pub fn reporter_model() -> FnModel {
    FnModel::new(|req| {
        let turn = current_turn(req);
        let editor_answer = turn
            .iter()
            .rev()
            .find(|e| e.kind == EventKind::ToolResult && e.tool() == Some(EDITOR_TOOL))
            .map(result_text);
        let topic = editor_answer
            .clone()
            .unwrap_or_else(|| user_input(req).to_string());

        let Some(result) = last_result(req) else {
            return Ok(CompletionResponse::call(QUERY_NEWS, json!({ "topic": topic })));
        };
        if result.tool() == Some(EDITOR_TOOL) {
            return Ok(CompletionResponse::call(QUERY_NEWS, json!({ "topic": topic.trim() })));
        }

        let stories: Vec<String> = result
            .tool_result()
            .and_then(|v| v.get("headlines"))
            .and_then(Value::as_array)
            .map(|headlines| {
                headlines
                    .iter()
                    .map(|h| {
                        format!(
                            "{} ({})",
                            h["title"].as_str().unwrap_or_default(),
                            h["source"].as_str().unwrap_or_default()
                        )
                    })
                    .collect()
            })
            .unwrap_or_default();

        if let Some(message) = result.error_message() {
            return Ok(CompletionResponse::text(format!(
                "The wire is unavailable: {}.",
                message
            )));
        }
        if stories.is_empty() && editor_answer.is_none() && req.offers_tool(EDITOR_TOOL) {
            return Ok(CompletionResponse::call(
                EDITOR_TOOL,
                json!({ "msg": format!("No headlines for '{}'. Which topic instead?", topic) }),
            ));
        }
        Ok(CompletionResponse::text(if stories.is_empty() {
            format!("No headlines found for '{}'.", topic.trim())
        } else {
            format!("Top stories on {}: {}.", topic.trim(), stories.join(". "))
        }))
    })
    .metered(estimated_usage)
}

// ── Profiles ──────────────────────────────────────────────────────────────────

/// Search for the named person, store their profile as a memory block and
/// ask the writer for a profile built from that block.
pub fn researcher_model() -> FnModel {
    FnModel::new(|req| {
        let name = user_input(req);
        let Some(result) = last_result(req) else {
            return Ok(CompletionResponse::call(SEARCH_PROFILES, json!({ "name": name })));
        };
        if result.error_message().is_some() {
            return Ok(CompletionResponse::text(format!(
                "Research on '{}' stopped: {}",
                name,
                result_text(result)
            )));
        }

        let value = result.tool_result().cloned().unwrap_or(Value::Null);
        Ok(match result.tool() {
            Some(SEARCH_PROFILES) => match value["results"][0]["url"].as_str() {
                Some(url) => CompletionResponse::call(FETCH_PROFILE, json!({ "url": url })),
                None => CompletionResponse::text(format!("No profile found for '{}'.", name)),
            },
            Some(FETCH_PROFILE) => CompletionResponse::call(
                WRITER_TOOL,
                json!({
                    "input": format!(
                        "Write a two-sentence profile from memory block {}",
                        value["block_id"].as_str().unwrap_or_default()
                    )
                }),
            ),
            _ => CompletionResponse::text(result_text(result)),
        })
    })
    .metered(estimated_usage)
}

/// Read the memory block named at the end of the input and condense it.
pub fn writer_model() -> FnModel {
    FnModel::new(|req| {
        let Some(result) = last_result(req) else {
            let block_id = user_input(req).split_whitespace().last().unwrap_or_default();
            return Ok(CompletionResponse::call(
                READ_BLOCK_TOOL,
                json!({ "block_id": block_id }),
            ));
        };
        Ok(CompletionResponse::text(match result.error_message() {
            Some(message) => format!("Could not read the profile: {}", message),
            None => first_sentences(&result_text(result), 2),
        }))
    })
    .metered(estimated_usage)
}

// ── Generic ───────────────────────────────────────────────────────────────────

/// Call every offered tool once, in name order, then answer with what came
/// back.
///
/// Used for agents loaded from configuration whose model reference has no
/// dedicated stand-in. Every string argument of a tool is filled with the
/// turn's input.
pub fn walker_model() -> FnModel {
    FnModel::new(|req| {
        let turn = current_turn(req);
        let input = user_input(req);
        let called: HashSet<&str> = turn
            .iter()
            .filter(|e| e.kind == EventKind::ToolCallRequest)
            .filter_map(Event::tool)
            .collect();

        if let Some(schema) = req
            .tool_schemas
            .iter()
            .find(|s| !called.contains(s.name.as_str()))
        {
            return Ok(CompletionResponse::call(
                schema.name.clone(),
                walker_arguments(schema, input),
            ));
        }

        let gathered: Vec<String> = turn
            .iter()
            .filter(|e| e.kind == EventKind::ToolResult)
            .map(|e| format!("{} -> {}", e.tool().unwrap_or("?"), result_text(e)))
            .collect();
        Ok(CompletionResponse::text(if gathered.is_empty() {
            format!("{} received: {}", req.agent_id, input)
        } else {
            format!("{} gathered: {}", req.agent_id, gathered.join("; "))
        }))
    })
    .metered(estimated_usage)
}

fn walker_arguments(schema: &ToolSchema, input: &str) -> Value {
    let mut arguments = Map::new();
    if let Some(properties) = schema.argument_schema["properties"].as_object() {
        for name in properties.keys() {
            arguments.insert(name.clone(), Value::String(input.to_string()));
        }
    }
    if arguments.is_empty() {
        arguments.insert("input".to_string(), Value::String(input.to_string()));
    }
    Value::Object(arguments)
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use agentic_contracts::{
        event::payload,
        ids::{AgentId, CallId, TurnId},
    };
    use agentic_core::traits::ModelClient;

    use super::*;

    // ── Helpers ───────────────────────────────────────────────────────────────

    fn event(kind: EventKind, payload: Value) -> Event {
        Event {
            kind,
            payload,
            depth: 0,
            source_agent_id: AgentId::new("desk"),
            turn_id: TurnId::new(),
            sequence_no: 1,
            timestamp: Utc::now(),
        }
    }

    fn input(text: &str) -> Event {
        event(EventKind::UserInput, payload::text(text))
    }

    fn result(tool: &str, value: Value) -> Event {
        event(
            EventKind::ToolResult,
            payload::tool_result(&CallId::new(), tool, &value),
        )
    }

    fn request(history: Vec<Event>, tools: &[&str]) -> CompletionRequest {
        CompletionRequest {
            agent_id: AgentId::new("desk"),
            instructions: String::new(),
            history,
            tool_schemas: tools
                .iter()
                .map(|name| ToolSchema {
                    name: name.to_string(),
                    description: String::new(),
                    argument_schema: json!({
                        "type": "object",
                        "properties": { "topic": { "type": "string" } }
                    }),
                })
                .collect(),
        }
    }

    // ── Producer ──────────────────────────────────────────────────────────────

    #[test]
    fn test_producer_asks_then_delegates_then_summarizes() {
        let model = producer_model();

        let first = model.complete(&request(vec![input("go")], &[])).unwrap();
        assert_eq!(
            first,
            CompletionResponse::call(HUMAN_INPUT_TOOL, json!({ "msg": TOPIC_PROMPT }))
        );

        let answered = vec![input("go"), result(HUMAN_INPUT_TOOL, json!(" climate "))];
        assert_eq!(
            model.complete(&request(answered.clone(), &[])).unwrap(),
            CompletionResponse::call(REPORTER_TOOL, json!({ "input": "climate" }))
        );

        let mut reported = answered;
        reported.push(result(REPORTER_TOOL, json!("First line. Second line.")));
        assert_eq!(
            model.complete(&request(reported, &[])).unwrap(),
            CompletionResponse::text("Summary: First line.")
        );
    }

    #[test]
    fn test_producer_asks_again_on_blank_answer() {
        let history = vec![input("go"), result(HUMAN_INPUT_TOOL, json!("  "))];
        assert_eq!(
            producer_model().complete(&request(history, &[])).unwrap(),
            CompletionResponse::call(HUMAN_INPUT_TOOL, json!({ "msg": TOPIC_PROMPT }))
        );
    }

    #[test]
    fn test_only_the_current_turn_counts() {
        // A result from an earlier turn must not skip the question.
        let history = vec![
            input("earlier"),
            result(HUMAN_INPUT_TOOL, json!("ai")),
            input("again"),
        ];
        assert_eq!(
            producer_model().complete(&request(history, &[])).unwrap(),
            CompletionResponse::call(HUMAN_INPUT_TOOL, json!({ "msg": TOPIC_PROMPT }))
        );
    }

    // ── Reporter ──────────────────────────────────────────────────────────────

    #[test]
    fn test_reporter_formats_headlines() {
        let history = vec![
            input("sports"),
            result(QUERY_NEWS, crate::mock_data::headlines_for("sports")),
        ];
        match reporter_model().complete(&request(history, &[])).unwrap() {
            CompletionResponse::Text { content } => {
                assert!(content.starts_with("Top stories on sports: Underdog rowing club"));
            }
            other => panic!("expected text, got {:?}", other),
        }
    }

    #[test]
    fn test_reporter_asks_editor_once_when_offered() {
        let model = reporter_model();
        let mut history = vec![
            input("knitting"),
            result(QUERY_NEWS, crate::mock_data::headlines_for("knitting")),
        ];
        assert_eq!(
            model.complete(&request(history.clone(), &[EDITOR_TOOL, QUERY_NEWS])).unwrap(),
            CompletionResponse::call(
                EDITOR_TOOL,
                json!({ "msg": "No headlines for 'knitting'. Which topic instead?" })
            )
        );

        history.push(result(EDITOR_TOOL, json!("climate")));
        assert_eq!(
            model.complete(&request(history.clone(), &[EDITOR_TOOL, QUERY_NEWS])).unwrap(),
            CompletionResponse::call(QUERY_NEWS, json!({ "topic": "climate" }))
        );

        history.push(result(QUERY_NEWS, crate::mock_data::headlines_for("rowing")));
        assert_eq!(
            model.complete(&request(history, &[EDITOR_TOOL, QUERY_NEWS])).unwrap(),
            CompletionResponse::text("No headlines found for 'climate'.")
        );
    }

    #[test]
    fn test_reporter_handles_empty_wire() {
        let history = vec![
            input("knitting"),
            result(QUERY_NEWS, crate::mock_data::headlines_for("knitting")),
        ];
        assert_eq!(
            reporter_model().complete(&request(history, &[])).unwrap(),
            CompletionResponse::text("No headlines found for 'knitting'.")
        );
    }

    // ── Walker ────────────────────────────────────────────────────────────────

    #[test]
    fn test_walker_calls_each_tool_once_then_answers() {
        let model = walker_model();
        let tools = ["alpha", "beta"];

        let first = model.complete(&request(vec![input("ai")], &tools)).unwrap();
        assert_eq!(first, CompletionResponse::call("alpha", json!({ "topic": "ai" })));

        let history = vec![
            input("ai"),
            event(
                EventKind::ToolCallRequest,
                payload::tool_call(&CallId::new(), "alpha", &json!({})),
            ),
            result("alpha", json!("a")),
            event(
                EventKind::ToolCallRequest,
                payload::tool_call(&CallId::new(), "beta", &json!({})),
            ),
            result("beta", json!("b")),
        ];
        assert_eq!(
            model.complete(&request(history, &tools)).unwrap(),
            CompletionResponse::text("desk gathered: alpha -> a; beta -> b")
        );
    }

    #[test]
    fn test_estimated_usage_counts_prompt_and_reply() {
        let req = request(vec![input("AI")], &[]);
        let prompt_chars = req.instructions.len() + req.history[0].payload.to_string().len();

        let usage = estimated_usage(&req, &CompletionResponse::text("12345678"));
        assert_eq!(usage.input_tokens, prompt_chars.div_ceil(4) as u64);
        assert_eq!(usage.output_tokens, 2);
        assert_eq!(usage.cost, 0.0);

        let completion = echo_model().complete_with_usage(&req).unwrap();
        assert!(completion.usage.output_tokens > 0);
    }

    #[test]
    fn test_first_sentences() {
        assert_eq!(first_sentences("One. Two. Three.", 2), "One. Two.");
        assert_eq!(first_sentences("No stop", 1), "No stop");
    }
}
