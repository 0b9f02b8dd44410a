//! # agentic-contracts
//!
//! Shared types, events and error contracts for the agentic turn scheduler.
//!
//! All crates in the workspace import from here. No scheduling logic lives in
//! this crate, only data definitions and error types.

pub mod command;
pub mod error;
pub mod event;
pub mod ids;
pub mod memory;
pub mod model;
pub mod state;

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use serde_json::json;

    use super::*;
    use command::AgentCommand;
    use error::{AgenticError, ErrorCategory};
    use event::{payload, Event, EventKind};
    use ids::{AgentId, CallId, RunId, TurnId};
    use model::{Completion, CompletionResponse, CompletionUsage, TurnUsage};
    use state::TurnState;

    fn make_event(kind: EventKind, body: serde_json::Value) -> Event {
        Event {
            kind,
            payload: body,
            depth: 0,
            source_agent_id: AgentId::new("producer"),
            turn_id: TurnId::new(),
            sequence_no: 1,
            timestamp: Utc::now(),
        }
    }

    // ── Events ───────────────────────────────────────────────────────────────

    #[test]
    fn interrupt_request_requires_input_and_exposes_prompt() {
        let call = CallId::new();
        let event = make_event(
            EventKind::InterruptRequest,
            payload::interrupt_request(
                &call,
                "ask_human",
                "pick one",
                &AgentId::new("producer"),
                0,
                &[call.to_string()],
            ),
        );

        assert!(event.requires_input());
        assert_eq!(event.prompt(), Some("pick one"));
        assert_eq!(event.tool(), Some("ask_human"));
        assert_eq!(event.call_id(), Some(call.to_string().as_str()));
    }

    #[test]
    fn non_interrupt_events_have_no_prompt() {
        let event = make_event(EventKind::TurnComplete, payload::text("done"));
        assert!(!event.requires_input());
        assert_eq!(event.prompt(), None);
        assert_eq!(event.text(), Some("done"));
    }

    #[test]
    fn tool_result_accessors_distinguish_value_and_error() {
        let call = CallId::new();
        let ok = make_event(
            EventKind::ToolResult,
            payload::tool_result(&call, "echo", &json!("hi")),
        );
        assert_eq!(ok.tool_result(), Some(&json!("hi")));
        assert_eq!(ok.error_message(), None);

        let failed = make_event(
            EventKind::ToolResult,
            payload::tool_error(&call, "echo", "boom"),
        );
        assert_eq!(failed.tool_result(), None);
        assert_eq!(failed.error_message(), Some("boom"));
    }

    #[test]
    fn caller_originated_kinds() {
        assert!(EventKind::UserInput.is_caller_originated());
        assert!(EventKind::InterruptResponse.is_caller_originated());
        assert!(!EventKind::ToolResult.is_caller_originated());
        assert!(!EventKind::TurnComplete.is_caller_originated());
    }

    #[test]
    fn config_change_payload_carries_reason_only_when_given() {
        let call = CallId::new();
        let command = serde_json::to_value(AgentCommand::DisableTool {
            tool: "search".to_string(),
        })
        .unwrap();

        let applied = payload::config_change(&call, &command, true, None);
        assert!(applied.get("reason").is_none());
        assert_eq!(applied["command"]["op"], "disable_tool");

        let refused = payload::config_change(&call, &command, false, Some("unknown tool"));
        assert_eq!(refused["reason"], "unknown tool");
    }

    #[test]
    fn relayed_interrupts_are_marked_with_the_relaying_agent() {
        let call = CallId::new();
        let origin = AgentId::new("leaf");
        let body = payload::interrupt_request(&call, "ask", "why?", &origin, 2, &[]);
        let own = make_event(EventKind::InterruptRequest, body.clone());
        assert!(!own.is_relayed());

        let copy = make_event(
            EventKind::InterruptRequest,
            payload::relayed(body, &AgentId::new("mid")),
        );
        assert!(copy.is_relayed());
        assert_eq!(copy.payload["relayed_by"], "mid");
        assert_eq!(copy.payload["origin_agent"], "leaf");
        assert_eq!(copy.prompt(), Some("why?"));
    }

    #[test]
    fn turn_complete_payload_keeps_text_and_usage() {
        let usage = TurnUsage {
            completions: 2,
            input_tokens: 40,
            ..TurnUsage::default()
        };
        let event = make_event(EventKind::TurnComplete, payload::turn_complete("done", &usage));
        assert_eq!(event.text(), Some("done"));
        assert_eq!(event.payload["usage"]["completions"], 2);
        assert_eq!(event.payload["usage"]["input_tokens"], 40);
    }

    #[test]
    fn event_kind_serializes_snake_case() {
        let json = serde_json::to_string(&EventKind::ModelOutputChunk).unwrap();
        assert_eq!(json, "\"model_output_chunk\"");
        assert_eq!(EventKind::InterruptRequest.to_string(), "interrupt_request");
    }

    #[test]
    fn display_indents_by_depth() {
        let mut event = make_event(EventKind::ToolResult, json!({}));
        event.depth = 2;
        assert!(event.to_string().starts_with("...."));
    }

    // ── Model wire types ─────────────────────────────────────────────────────

    #[test]
    fn turn_usage_sums_completions() {
        let mut usage = TurnUsage::default();
        usage.record(&CompletionUsage {
            model: "gpt".to_string(),
            input_tokens: 120,
            output_tokens: 30,
            cost: 0.002,
            elapsed_ms: 400,
        });
        usage.record(&CompletionUsage {
            input_tokens: 80,
            output_tokens: 10,
            cost: 0.001,
            elapsed_ms: 100,
            ..CompletionUsage::default()
        });
        assert_eq!(usage.completions, 2);
        assert_eq!(usage.input_tokens, 200);
        assert_eq!(usage.output_tokens, 40);
        assert_eq!(usage.elapsed_ms, 500);
        assert!((usage.cost - 0.003).abs() < 1e-9);
    }

    #[test]
    fn plain_response_becomes_completion_without_usage() {
        let completion = Completion::from(CompletionResponse::text("hi"));
        assert_eq!(completion.usage, CompletionUsage::default());

        let parsed: Completion =
            serde_json::from_value(json!({ "response": { "kind": "text", "content": "hi" } }))
                .unwrap();
        assert_eq!(parsed, completion);
    }

    #[test]
    fn completion_response_is_tagged_by_kind() {
        let text = serde_json::to_value(CompletionResponse::text("hi")).unwrap();
        assert_eq!(text, json!({ "kind": "text", "content": "hi" }));

        let calls: CompletionResponse = serde_json::from_value(json!({
            "kind": "tool_calls",
            "calls": [{ "tool_name": "echo", "arguments": { "x": "hi" } }]
        }))
        .unwrap();
        assert_eq!(calls, CompletionResponse::call("echo", json!({ "x": "hi" })));
    }

    // ── Turn state ───────────────────────────────────────────────────────────

    #[test]
    fn turn_state_predicates() {
        assert!(TurnState::Idle.can_start());
        assert!(TurnState::Finished.can_start());
        assert!(TurnState::Failed.can_start());
        assert!(!TurnState::Running.can_start());
        assert!(!TurnState::AwaitingInput.can_start());

        assert!(TurnState::Finished.is_terminal());
        assert!(!TurnState::AwaitingInput.is_terminal());

        assert!(TurnState::AwaitingTool.is_active());
        assert!(!TurnState::AwaitingInput.is_active());
    }

    // ── Ids ──────────────────────────────────────────────────────────────────

    #[test]
    fn run_id_new_produces_unique_values() {
        let unique: std::collections::HashSet<String> =
            (0..100).map(|_| RunId::new().to_string()).collect();
        assert_eq!(unique.len(), 100);
    }

    // ── Errors ───────────────────────────────────────────────────────────────

    #[test]
    fn error_categories_follow_taxonomy() {
        let model = AgenticError::ModelError {
            model_ref: "scripted".to_string(),
            reason: "malformed".to_string(),
        };
        assert_eq!(model.category(), ErrorCategory::Model);

        let timeout = AgenticError::Timeout {
            operation: "completion".to_string(),
            elapsed_ms: 30_000,
        };
        assert_eq!(timeout.category(), ErrorCategory::Model);

        let cycle = AgenticError::Cycle {
            parent: "a".to_string(),
            child: "b".to_string(),
        };
        assert!(cycle.is_protocol());

        let not_waiting = AgenticError::NotAwaitingInput {
            state: "finished".to_string(),
        };
        assert!(not_waiting.is_protocol());

        let cancelled = AgenticError::Cancelled {
            reason: "caller".to_string(),
        };
        assert_eq!(cancelled.category(), ErrorCategory::Cancelled);
    }

    #[test]
    fn error_display_messages() {
        let err = AgenticError::DuplicateTool {
            agent: "producer".to_string(),
            tool: "reporter".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("producer"));
        assert!(msg.contains("reporter"));

        let err = AgenticError::Timeout {
            operation: "model completion".to_string(),
            elapsed_ms: 1500,
        };
        assert_eq!(err.to_string(), "model completion timed out after 1500 ms");
    }
}
