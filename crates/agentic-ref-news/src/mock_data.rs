//! Simulated newsroom data for the reference runtime.
//!
//! All data in this module is hardcoded and fictional. No external systems are
//! contacted. The tools built here stand in for a news search API and a people
//! directory in a production deployment.

use serde_json::{json, Value};

use agentic_config::ToolCatalog;
use agentic_core::{
    tool::{ToolEmission, ToolError, ToolOutcome},
    FunctionTool,
};

/// Name of the headline search tool.
pub const QUERY_NEWS: &str = "query_news";
pub const SEARCH_PROFILES: &str = "search_profiles";
pub const FETCH_PROFILE: &str = "fetch_profile";

// ── Headlines (mock) ──────────────────────────────────────────────────────────

/// Return mock headlines for a topic.
///
/// Known topics (case-insensitive): `ai`, `climate`, `sports`. Any other topic
/// returns an empty headline list.
pub fn headlines_for(topic: &str) -> Value {
    let normalized = topic.trim().to_lowercase();

    let headlines: &[(&str, &str)] = match normalized.as_str() {
        "ai" => &[
            (
                "Regional hospitals pilot open-weight models for triage notes",
                "The Lantern Post",
            ),
            (
                "Standards body publishes draft rules for agent audit logs",
                "Civic Ledger",
            ),
            (
                "Startup claims tenfold cut in inference energy use",
                "Northgate Tribune",
            ),
        ],
        "climate" => &[
            (
                "Coastal city finishes first phase of its living seawall",
                "Harbor Gazette",
            ),
            (
                "Heat pump sales overtake gas boilers for a second year",
                "The Lantern Post",
            ),
        ],
        "sports" => &[
            (
                "Underdog rowing club takes the river cup in a photo finish",
                "Northgate Tribune",
            ),
            (
                "League approves shorter season after player vote",
                "Civic Ledger",
            ),
        ],
        _ => &[],
    };

    json!({
        "topic": topic,
        "headlines": headlines
            .iter()
            .map(|(title, source)| json!({ "title": title, "source": source }))
            .collect::<Vec<_>>(),
        "fetched_at": "2026-10-19T08:00:00Z"
    })
}

// ── People directory (mock) ───────────────────────────────────────────────────

const PROFILES: &[(&str, &str, &str)] = &[
    (
        "Mara Quill",
        "directory://people/mara-quill",
        "Mara Quill is a marine engineer who designed the tidal barrier protecting \
         the fictional port of Calder Bay. She began her career surveying shipwrecks, \
         later led the barrier project for eleven years, and now teaches coastal \
         resilience at the Calder Institute. She is known for publishing every \
         design review in full.",
    ),
    (
        "Tomas Reyle",
        "directory://people/tomas-reyle",
        "Tomas Reyle is a data journalist who built the open archive of municipal \
         budgets for the fictional city of Ostermark. He trained as a statistician, \
         spent six years at a regional daily and now runs a small newsroom that \
         publishes its source code alongside every story.",
    ),
];

/// Search the directory for people whose name contains `name`.
pub fn search_profiles(name: &str) -> Value {
    let needle = name.trim().to_lowercase();
    let results: Vec<Value> = PROFILES
        .iter()
        .filter(|(n, _, _)| !needle.is_empty() && n.to_lowercase().contains(&needle))
        .map(|(n, url, _)| json!({ "name": n, "url": url }))
        .collect();

    json!({ "query": name, "results": results })
}

/// Fetch the full profile text behind a directory URL.
pub fn fetch_profile(url: &str) -> Option<&'static str> {
    PROFILES
        .iter()
        .find(|(_, u, _)| *u == url)
        .map(|(_, _, text)| *text)
}

// ── Tools ─────────────────────────────────────────────────────────────────────

fn string_arg<'a>(args: &'a Value, key: &str) -> Result<&'a str, ToolError> {
    args.get(key)
        .and_then(Value::as_str)
        .ok_or_else(|| ToolError::new(format!("missing '{}' argument", key)))
}

/// Headline search. Surfaces the search status as intermediate output before
/// returning the headlines.
pub fn query_news_tool() -> FunctionTool {
    FunctionTool::new(
        QUERY_NEWS,
        "Fetch the latest headlines for a topic.",
        json!({
            "type": "object",
            "properties": { "topic": { "type": "string" } },
            "required": ["topic"]
        }),
        |args, _ctx| {
            let topic = string_arg(args, "topic")?;
            let value = headlines_for(topic);
            let found = value["headlines"].as_array().map_or(0, Vec::len);
            Ok(ToolOutcome::Events {
                emissions: vec![ToolEmission::Output(json!({
                    "status": "searching",
                    "topic": topic,
                    "found": found
                }))],
                value,
            })
        },
    )
}

pub fn search_profiles_tool() -> FunctionTool {
    FunctionTool::from_fn(
        SEARCH_PROFILES,
        "Search the people directory by name.",
        json!({
            "type": "object",
            "properties": { "name": { "type": "string" } },
            "required": ["name"]
        }),
        |args, _ctx| Ok(search_profiles(string_arg(args, "name")?)),
    )
}

/// Fetch a profile and store it as a memory block owned by the caller.
///
/// Returns only the block id and the content length; the text itself stays in
/// the block store.
pub fn fetch_profile_tool() -> FunctionTool {
    FunctionTool::from_fn(
        FETCH_PROFILE,
        "Fetch a profile by directory URL and store it as a memory block.",
        json!({
            "type": "object",
            "properties": { "url": { "type": "string" } },
            "required": ["url"]
        }),
        |args, ctx| {
            let url = string_arg(args, "url")?;
            let text = fetch_profile(url)
                .ok_or_else(|| ToolError::new(format!("no profile at '{}'", url)))?;
            let block_id = ctx.store_block(text)?;
            Ok(json!({ "block_id": block_id.to_string(), "chars": text.len() }))
        },
    )
}

/// Every newsroom tool plus the runtime built-ins, for configuration files.
pub fn newsroom_catalog() -> ToolCatalog {
    ToolCatalog::with_builtins()
        .with(query_news_tool())
        .with(search_profiles_tool())
        .with(fetch_profile_tool())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_topic_is_case_insensitive() {
        let value = headlines_for(" AI ");
        assert_eq!(value["headlines"].as_array().unwrap().len(), 3);
        assert_eq!(value["topic"], " AI ");
    }

    #[test]
    fn test_unknown_topic_has_no_headlines() {
        let value = headlines_for("knitting");
        assert!(value["headlines"].as_array().unwrap().is_empty());
    }

    #[test]
    fn test_profile_search_and_fetch() {
        let found = search_profiles("quill");
        let url = found["results"][0]["url"].as_str().unwrap();
        assert!(fetch_profile(url).unwrap().starts_with("Mara Quill"));

        assert!(search_profiles("").get("results").unwrap().as_array().unwrap().is_empty());
        assert_eq!(fetch_profile("directory://people/nobody"), None);
    }

    #[test]
    fn test_catalog_lists_every_tool() {
        assert_eq!(
            newsroom_catalog().names(),
            vec![FETCH_PROFILE, QUERY_NEWS, "read_memory_block", SEARCH_PROFILES]
        );
    }
}
