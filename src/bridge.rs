//! Translation between pending tool calls and tool outputs.
//!
//! The bridge is a transparent pass-through: it parses each call's arguments,
//! runs the code through a [`CodeExecutor`] and returns whatever text came
//! back, paired with the call's correlation id. Calls that cannot be executed
//! still produce an output, an explicit `Error: ...` marker, so the remote run
//! never waits on an id that will not resolve.

use std::sync::Arc;

use futures::{StreamExt, stream};
use serde::Deserialize;

use crate::assistants::{ToolCall, ToolOutput};
use crate::executor::CodeExecutor;

/// The one function this host offers to the assistant.
pub const EXECUTE_CODE_TOOL: &str = "execute_python_code";

/// Why a tool call was refused without running anything.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BridgeError {
    /// The arguments payload is not JSON or has no text `code` field.
    #[error("malformed arguments for tool call {call_id}: {reason}")]
    MalformedRequest { call_id: String, reason: String },

    /// The call names a function this host does not provide.
    #[error("tool call {call_id} requested unsupported function '{name}'")]
    UnsupportedOperation { call_id: String, name: String },
}

#[derive(Deserialize)]
struct ExecuteCodeArgs {
    code: String,
}

/// Extract the source code from an `execute_python_code` call.
pub fn parse_code(call: &ToolCall) -> Result<String, BridgeError> {
    if call.function.name != EXECUTE_CODE_TOOL {
        return Err(BridgeError::UnsupportedOperation {
            call_id: call.id.clone(),
            name: call.function.name.clone(),
        });
    }

    serde_json::from_str::<ExecuteCodeArgs>(&call.function.arguments)
        .map(|args| args.code)
        .map_err(|e| BridgeError::MalformedRequest {
            call_id: call.id.clone(),
            reason: e.to_string(),
        })
}

/// Turns tool calls into tool outputs by running their code.
#[derive(Debug, Clone)]
pub struct ToolCallBridge {
    executor: Arc<dyn CodeExecutor>,
    max_parallel: usize,
}

impl ToolCallBridge {
    /// `max_parallel` bounds how many scripts of one poll run at once.
    pub fn new(executor: Arc<dyn CodeExecutor>, max_parallel: usize) -> Self {
        Self {
            executor,
            max_parallel: max_parallel.max(1),
        }
    }

    /// Run one call, refusing it if its arguments are unusable.
    pub async fn execute(&self, call: &ToolCall) -> Result<ToolOutput, BridgeError> {
        let code = parse_code(call)?;

        tracing::info!(
            tool_call_id = %call.id,
            tool_name = %call.function.name,
            code_length = code.len(),
            "Executing tool call"
        );

        let output = match self.executor.execute(&code).await {
            Ok(result) => result.into_text(),
            Err(e) => format!("Error: {e}"),
        };

        Ok(ToolOutput {
            tool_call_id: call.id.clone(),
            output,
        })
    }

    /// Resolve one call, folding refusals into an error-marker output.
    pub async fn resolve(&self, call: &ToolCall) -> ToolOutput {
        match self.execute(call).await {
            Ok(output) => output,
            Err(e) => {
                tracing::warn!(
                    tool_call_id = %call.id,
                    tool_name = %call.function.name,
                    error = %e,
                    "Tool call refused"
                );
                ToolOutput {
                    tool_call_id: call.id.clone(),
                    output: format!("Error: {e}"),
                }
            }
        }
    }

    /// Resolve every call concurrently; one output per call, in call order.
    pub async fn resolve_all(&self, calls: &[ToolCall]) -> Vec<ToolOutput> {
        stream::iter(calls)
            .map(|call| self.resolve(call))
            .buffered(self.max_parallel)
            .collect()
            .await
    }
}
