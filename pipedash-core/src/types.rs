//! Core domain types for pipedash
//!
//! These types describe what the dashboard shows: the conversation with the
//! assistant, the pipeline report, and the artifacts produced by chat turns.
//!
//! ## Terminology
//!
//! | Term | Definition |
//! |------|------------|
//! | **Transcript** | Newline-delimited conversation history persisted by the backend |
//! | **Pipeline** | The backend's automation job; produces a report and a chart |
//! | **Report row** | One schema-less record of the pipeline report |
//! | **Generated data item** | A CSV or JSON artifact produced as a side effect of a chat turn |
//! | **Operation** | A user-triggered mutating action (send, run pipeline, clear context) |

use serde::{Deserialize, Serialize};
use serde_json::Value;

// ============================================
// Conversation
// ============================================

/// Who authored a conversation entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sender {
    User,
    Assistant,
}

impl Sender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sender::User => "user",
            Sender::Assistant => "assistant",
        }
    }
}

impl std::fmt::Display for Sender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single conversation entry.
///
/// Messages are never edited after creation; the conversation only grows
/// (or is reset as a whole).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub sender: Sender,
    pub text: String,
}

impl Message {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            sender: Sender::User,
            text: text.into(),
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            sender: Sender::Assistant,
            text: text.into(),
        }
    }
}

// ============================================
// Tabular payloads
// ============================================

/// One schema-less record. Key order follows the server payload.
pub type ReportRow = serde_json::Map<String, Value>;

/// Content of a generated data item, keyed by the wire `type` field.
#[derive(Debug, Clone, PartialEq)]
pub enum GeneratedContent {
    /// `type: "csv"` - rows rendered as a table
    Csv(Vec<ReportRow>),
    /// `type: "json"` - opaque value shown verbatim
    Json(Value),
}

impl GeneratedContent {
    pub fn kind(&self) -> &'static str {
        match self {
            GeneratedContent::Csv(_) => "csv",
            GeneratedContent::Json(_) => "json",
        }
    }
}

/// A named artifact produced as a side effect of conversation turns.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedDataItem {
    pub filename: String,
    pub content: GeneratedContent,
}

/// Wire shape of a generated data item before the `type` tag is resolved.
#[derive(Debug, Deserialize)]
pub(crate) struct RawDataItem {
    pub filename: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub content: Value,
}

impl TryFrom<RawDataItem> for GeneratedDataItem {
    type Error = String;

    fn try_from(raw: RawDataItem) -> Result<Self, Self::Error> {
        let content = match raw.kind.as_str() {
            "csv" => {
                let rows: Vec<ReportRow> = serde_json::from_value(raw.content)
                    .map_err(|e| format!("csv content of {} is not a row array: {}", raw.filename, e))?;
                GeneratedContent::Csv(rows)
            }
            "json" => GeneratedContent::Json(raw.content),
            other => return Err(format!("unknown data type {:?} for {}", other, raw.filename)),
        };

        Ok(Self {
            filename: raw.filename,
            content,
        })
    }
}

// ============================================
// Operations and view selection
// ============================================

/// A mutating user action. Only one may be in flight at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    SendMessage,
    RunPipeline,
    ClearContext,
}

impl Operation {
    pub fn label(&self) -> &'static str {
        match self {
            Operation::SendMessage => "sending message",
            Operation::RunPipeline => "running pipeline",
            Operation::ClearContext => "clearing context",
        }
    }
}

/// Dashboard tabs, in display order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Tab {
    #[default]
    Chat,
    Pipeline,
    ChatData,
}

impl Tab {
    pub const ALL: [Tab; 3] = [Tab::Chat, Tab::Pipeline, Tab::ChatData];

    pub fn index(&self) -> usize {
        match self {
            Tab::Chat => 0,
            Tab::Pipeline => 1,
            Tab::ChatData => 2,
        }
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub fn title(&self) -> &'static str {
        match self {
            Tab::Chat => "Chat",
            Tab::Pipeline => "Pipeline",
            Tab::ChatData => "Chat Data",
        }
    }

    pub fn next(&self) -> Self {
        Self::ALL[(self.index() + 1) % Self::ALL.len()]
    }

    pub fn previous(&self) -> Self {
        Self::ALL[(self.index() + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

/// Reachability of the backend as reported by `/status`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ServerStatus {
    #[default]
    Unknown,
    Online(String),
    Offline,
}

// ============================================
// Chat outcomes
// ============================================

/// Result of posting a chat message. Every outcome is a value, never an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatOutcome {
    /// Success with a reply
    Reply(String),
    /// Success without a reply field
    NoReply,
    /// Non-success status; carries the server detail (or a generic fallback)
    Rejected(String),
    /// The request never got a response
    Transport(String),
}
