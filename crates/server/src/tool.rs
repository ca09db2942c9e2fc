//! The summary lookup tool exposed to the chat model.

use std::sync::Arc;

use catalog::Catalog;
use llm_client::ToolDefinition;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

/// Function name advertised to the model
pub const TOOL_NAME: &str = "get_summary_by_title";

/// Returned for any title without a stored full summary
pub const SUMMARY_NOT_FOUND: &str = "Nu am găsit un rezumat complet pentru acest titlu.";

#[derive(Deserialize)]
struct LookupArgs {
    #[serde(default)]
    title: String,
}

/// Exact-title lookup of full summaries.
#[derive(Clone)]
pub struct LookupTool {
    catalog: Arc<Catalog>,
}

impl LookupTool {
    pub fn new(catalog: Arc<Catalog>) -> Self {
        Self { catalog }
    }

    /// Full summary for `title` (case-sensitive exact match), or [`SUMMARY_NOT_FOUND`]
    pub fn lookup(&self, title: &str) -> String {
        self.catalog
            .full_summary(title)
            .unwrap_or(SUMMARY_NOT_FOUND)
            .to_string()
    }

    /// Function schema sent with round-1 requests
    pub fn definition() -> ToolDefinition {
        ToolDefinition::function(
            TOOL_NAME,
            "Primește un titlu exact și întoarce rezumatul complet al cărții.",
            json!({
                "type": "object",
                "properties": {
                    "title": {
                        "type": "string",
                        "description": "Titlul exact al cărții recomandate."
                    }
                },
                "required": ["title"]
            }),
        )
    }

    /// Extract `title` from the model's raw argument JSON.
    ///
    /// Malformed or missing arguments give an empty title.
    pub fn parse_title(arguments: &str) -> String {
        if arguments.trim().is_empty() {
            return String::new();
        }
        match serde_json::from_str::<LookupArgs>(arguments) {
            Ok(args) => args.title,
            Err(e) => {
                debug!("Ignoring malformed tool arguments {:?}: {}", arguments, e);
                String::new()
            }
        }
    }
}
