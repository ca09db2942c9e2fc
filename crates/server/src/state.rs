//! Stages of one recommendation call.
//!
//! ```text
//! Retrieving ─┬─> NoResults
//!             └─> Round1 ─┬─> ToolInvoked ─> ToolExecuted ─> Round2 ─> Resolved
//!                         └─> NoTool ──────────────────────────────────> Resolved
//! ```

use llm_client::{ChatMessage, ToolCall};
use retrieval::Candidate;
use serde::{Deserialize, Serialize};

/// Output of one recommendation call.
///
/// Optional fields serialize as `null` when unset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationResult {
    pub answer: String,
    pub candidates: Vec<Candidate>,
    pub full_summary: Option<String>,
    pub recommended_title: Option<String>,
}

impl RecommendationResult {
    /// The fixed answer for a query with no candidates
    pub fn no_results() -> Self {
        Self {
            answer: crate::prompt::NO_RESULTS_ANSWER.to_string(),
            candidates: Vec::new(),
            full_summary: None,
            recommended_title: None,
        }
    }
}

/// Where a recommendation call currently is.
///
/// Each variant owns exactly the data the next transition needs.
#[derive(Debug, Clone, PartialEq)]
pub enum Stage {
    /// Waiting for candidates
    Retrieving,

    /// Retrieval came back empty (terminal)
    NoResults,

    /// Candidates in hand; the first model call is next
    Round1 { candidates: Vec<Candidate> },

    /// The model asked for tools
    ToolInvoked {
        candidates: Vec<Candidate>,
        dialogue: Vec<ChatMessage>,
        content: String,
        calls: Vec<ToolCall>,
    },

    /// Tool results appended to the dialogue
    ToolExecuted {
        candidates: Vec<Candidate>,
        dialogue: Vec<ChatMessage>,
        recommended_title: Option<String>,
        full_summary: Option<String>,
    },

    /// The second model call is next
    Round2 {
        candidates: Vec<Candidate>,
        dialogue: Vec<ChatMessage>,
        recommended_title: Option<String>,
        full_summary: Option<String>,
    },

    /// The model answered without tools
    NoTool {
        candidates: Vec<Candidate>,
        answer: String,
    },

    /// Final result (terminal)
    Resolved(RecommendationResult),
}

impl Stage {
    pub fn name(&self) -> &'static str {
        match self {
            Stage::Retrieving => "RETRIEVING",
            Stage::NoResults => "NO_RESULTS",
            Stage::Round1 { .. } => "ROUND1",
            Stage::ToolInvoked { .. } => "TOOL_INVOKED",
            Stage::ToolExecuted { .. } => "TOOL_EXECUTED",
            Stage::Round2 { .. } => "ROUND2",
            Stage::NoTool { .. } => "NO_TOOL",
            Stage::Resolved(_) => "RESOLVED",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Stage::NoResults | Stage::Resolved(_))
    }

    /// The result of a terminal stage; `None` while the call is still running
    pub fn into_result(self) -> Option<RecommendationResult> {
        match self {
            Stage::NoResults => Some(RecommendationResult::no_results()),
            Stage::Resolved(result) => Some(result),
            _ => None,
        }
    }
}
