//! Wire types for the Assistants endpoints.

use serde::{Deserialize, Serialize};

/// An assistant profile as returned by the remote side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assistant {
    /// Opaque assistant identifier.
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
}

/// A conversation thread.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Thread {
    /// Opaque thread identifier.
    pub id: String,
}

/// An uploaded file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileObject {
    pub id: String,
    #[serde(default)]
    pub filename: String,
}

/// Request body for creating an assistant.
#[derive(Debug, Clone, Serialize)]
pub struct AssistantSpec {
    pub name: String,
    pub instructions: String,
    pub model: String,
    pub tools: Vec<serde_json::Value>,
}

/// Role of a thread message author.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// Message written by the person driving the session.
    User,
    /// Message produced by the assistant during a run.
    Assistant,
}

/// A message to append to a thread.
#[derive(Debug, Clone, Serialize)]
pub struct NewMessage {
    pub role: MessageRole,
    pub content: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub file_ids: Vec<String>,
}

impl NewMessage {
    /// A user message carrying the given file attachments.
    #[must_use]
    pub fn user(content: impl Into<String>, file_ids: Vec<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
            file_ids,
        }
    }
}

/// A message stored on a thread.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThreadMessage {
    pub id: String,
    pub role: MessageRole,
    /// Unix timestamp (seconds) of creation.
    pub created_at: i64,
    #[serde(default)]
    pub content: Vec<MessageContent>,
    /// The run that produced this message, if any.
    #[serde(default)]
    pub run_id: Option<String>,
}

impl ThreadMessage {
    /// Render every content part as plain text, one part per line.
    #[must_use]
    pub fn text(&self) -> String {
        self.content
            .iter()
            .map(MessageContent::render)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// A content part of a thread message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MessageContent {
    /// Text content.
    Text {
        /// The text body.
        text: TextContent,
    },
    /// An image file produced by the assistant.
    ImageFile {
        /// Reference to the generated image.
        image_file: ImageFile,
    },
}

impl MessageContent {
    fn render(&self) -> String {
        match self {
            Self::Text { text } => text.value.clone(),
            Self::ImageFile { image_file } => format!("[image file: {}]", image_file.file_id),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextContent {
    pub value: String,
    #[serde(default)]
    pub annotations: Vec<serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageFile {
    pub file_id: String,
}

/// One remote asynchronous computation attached to a thread.
///
/// Every `Run` value is a snapshot taken from the remote side; nothing in this
/// crate changes `status` locally.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Run {
    pub id: String,
    pub thread_id: String,
    pub assistant_id: String,
    pub status: RunStatus,
    /// Present only while `status` is `requires_action`.
    #[serde(default)]
    pub required_action: Option<RequiredAction>,
    #[serde(default)]
    pub last_error: Option<LastError>,
}

impl Run {
    /// Tool calls the remote side is waiting on, empty unless the run needs action.
    #[must_use]
    pub fn pending_tool_calls(&self) -> &[ToolCall] {
        self.required_action
            .as_ref()
            .map_or(&[], |action| action.submit_tool_outputs.tool_calls.as_slice())
    }
}

/// Remote run status.
///
/// Closed on purpose: a status this enum does not know fails to deserialize
/// rather than being treated as any other state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Queued,
    InProgress,
    RequiresAction,
    Cancelling,
    Cancelled,
    Failed,
    Completed,
    Expired,
    Incomplete,
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Queued => "queued",
            Self::InProgress => "in_progress",
            Self::RequiresAction => "requires_action",
            Self::Cancelling => "cancelling",
            Self::Cancelled => "cancelled",
            Self::Failed => "failed",
            Self::Completed => "completed",
            Self::Expired => "expired",
            Self::Incomplete => "incomplete",
        };
        f.write_str(s)
    }
}

/// Error detail attached to a failed run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LastError {
    pub code: String,
    pub message: String,
}

impl std::fmt::Display for LastError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

/// The action a run is blocked on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequiredAction {
    #[serde(rename = "type")]
    pub action_type: String,
    pub submit_tool_outputs: SubmitToolOutputs,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmitToolOutputs {
    pub tool_calls: Vec<ToolCall>,
}

/// A tool call requested by the assistant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Correlation identifier echoed back in the matching [`ToolOutput`].
    pub id: String,
    /// Type of tool (always "function" for now).
    #[serde(rename = "type")]
    pub call_type: String,
    /// Function details.
    pub function: ToolCallFunction,
}

/// Function details in a tool call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCallFunction {
    /// Function name.
    pub name: String,
    /// Arguments as JSON string.
    pub arguments: String,
}

/// Local answer to one [`ToolCall`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolOutput {
    pub tool_call_id: String,
    pub output: String,
}

/// Envelope used by list endpoints.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ListResponse<T> {
    pub data: Vec<T>,
    #[serde(default)]
    pub has_more: bool,
    #[serde(default)]
    pub last_id: Option<String>,
}
