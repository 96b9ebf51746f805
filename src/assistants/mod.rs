//! Remote Assistants protocol surface.
//!
//! The remote side owns runs, threads and assistants. This module exposes it
//! through two traits so that each component only sees the calls it makes:
//!
//! - [`RunApi`]: everything the run driver needs to start, poll, resume and
//!   read back a run.
//! - [`SessionApi`]: one-off setup calls (assistant, thread, file uploads).
//!
//! [`AssistantsClient`] implements both over HTTP.

mod client;
mod error;
mod types;

pub use client::{ApiCredentials, AssistantsClient};
pub use error::{ApiError, Result};
pub use types::{
    Assistant, AssistantSpec, FileObject, ImageFile, LastError, MessageContent, MessageRole,
    NewMessage, RequiredAction, Run, RunStatus, SubmitToolOutputs, TextContent, Thread,
    ThreadMessage, ToolCall, ToolCallFunction, ToolOutput,
};

use std::path::Path;

/// Calls used while advancing a run.
#[async_trait::async_trait]
pub trait RunApi: Send + Sync + std::fmt::Debug {
    /// Append a message to a thread.
    async fn create_message(&self, thread_id: &str, message: &NewMessage) -> Result<ThreadMessage>;

    /// Start a run of `assistant_id` on `thread_id`.
    async fn create_run(&self, thread_id: &str, assistant_id: &str) -> Result<Run>;

    /// Fetch the current snapshot of a run.
    async fn retrieve_run(&self, thread_id: &str, run_id: &str) -> Result<Run>;

    /// Resume a run blocked on tool calls. All outputs go in one call.
    async fn submit_tool_outputs(
        &self,
        thread_id: &str,
        run_id: &str,
        outputs: &[ToolOutput],
    ) -> Result<Run>;

    /// Full thread history, oldest first.
    async fn list_messages(&self, thread_id: &str) -> Result<Vec<ThreadMessage>>;
}

/// Calls used once per session to prepare the remote side.
#[async_trait::async_trait]
pub trait SessionApi: Send + Sync + std::fmt::Debug {
    async fn create_assistant(&self, spec: &AssistantSpec) -> Result<Assistant>;

    async fn create_thread(&self) -> Result<Thread>;

    /// Upload a local file for use by assistants.
    async fn upload_file(&self, path: &Path) -> Result<FileObject>;

    /// Make an uploaded file visible to an assistant.
    async fn attach_file(&self, assistant_id: &str, file_id: &str) -> Result<()>;
}
