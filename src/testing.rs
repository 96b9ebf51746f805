//! In-memory doubles for the remote API and the clock.

use std::collections::VecDeque;
use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;

use crate::assistants::{
    self, ApiError, Assistant, AssistantSpec, FileObject, MessageContent, MessageRole, NewMessage,
    RequiredAction, Run, RunApi, RunStatus, SessionApi, SubmitToolOutputs, TextContent, Thread,
    ThreadMessage, ToolCall, ToolCallFunction, ToolOutput,
};
use crate::bridge::EXECUTE_CODE_TOOL;
use crate::executor::{CodeExecutor, ExecutionResult, ExecutorError};
use crate::run::Clock;

pub(crate) const THREAD: &str = "thread_1";
pub(crate) const ASSISTANT: &str = "asst_1";

pub(crate) fn run(id: &str, status: RunStatus) -> Run {
    Run {
        id: id.to_string(),
        thread_id: THREAD.to_string(),
        assistant_id: ASSISTANT.to_string(),
        status,
        required_action: None,
        last_error: None,
    }
}

pub(crate) fn run_requiring(id: &str, calls: Vec<ToolCall>) -> Run {
    Run {
        required_action: Some(RequiredAction {
            action_type: "submit_tool_outputs".to_string(),
            submit_tool_outputs: SubmitToolOutputs { tool_calls: calls },
        }),
        ..run(id, RunStatus::RequiresAction)
    }
}

pub(crate) fn code_call(id: &str, code: &str) -> ToolCall {
    raw_call(id, &serde_json::json!({ "code": code }).to_string())
}

pub(crate) fn raw_call(id: &str, arguments: &str) -> ToolCall {
    ToolCall {
        id: id.to_string(),
        call_type: "function".to_string(),
        function: ToolCallFunction {
            name: EXECUTE_CODE_TOOL.to_string(),
            arguments: arguments.to_string(),
        },
    }
}

pub(crate) fn message(
    id: &str,
    role: MessageRole,
    created_at: i64,
    run_id: Option<&str>,
    text: &str,
) -> ThreadMessage {
    ThreadMessage {
        id: id.to_string(),
        role,
        created_at,
        content: vec![MessageContent::Text {
            text: TextContent {
                value: text.to_string(),
                annotations: vec![],
            },
        }],
        run_id: run_id.map(ToString::to_string),
    }
}

pub(crate) fn unavailable() -> ApiError {
    ApiError::Api {
        status: 503,
        message: "unavailable".to_string(),
    }
}

/// Remote side driven by a script of poll answers.
#[derive(Debug, Default)]
pub(crate) struct ScriptedApi {
    pub created: Mutex<VecDeque<Run>>,
    pub polls: Mutex<VecDeque<assistants::Result<Run>>>,
    pub after_submit: Mutex<VecDeque<Run>>,
    pub history: Mutex<Vec<ThreadMessage>>,
    pub posted: Mutex<Vec<NewMessage>>,
    pub submissions: Mutex<Vec<Vec<ToolOutput>>>,
    pub poll_count: Mutex<usize>,
    /// Errors returned by `submit_tool_outputs` after recording the call.
    pub submit_failures: Mutex<VecDeque<ApiError>>,
    /// Errors returned by `create_run` before any scripted run.
    pub create_failures: Mutex<VecDeque<ApiError>>,
    pub create_count: Mutex<usize>,
}

impl ScriptedApi {
    pub fn new(first: Run, polls: Vec<assistants::Result<Run>>) -> Self {
        Self {
            created: Mutex::new(VecDeque::from([first])),
            polls: Mutex::new(polls.into()),
            ..Self::default()
        }
    }

    pub fn with_history(self, history: Vec<ThreadMessage>) -> Self {
        *self.history.lock().unwrap() = history;
        self
    }

    pub fn failing_submissions(self, errors: Vec<ApiError>) -> Self {
        *self.submit_failures.lock().unwrap() = errors.into();
        self
    }

    pub fn failing_creates(self, errors: Vec<ApiError>) -> Self {
        *self.create_failures.lock().unwrap() = errors.into();
        self
    }

    pub fn then_created(&self, run: Run) {
        self.created.lock().unwrap().push_back(run);
    }

    pub fn then_polled(&self, polls: Vec<assistants::Result<Run>>) {
        self.polls.lock().unwrap().extend(polls);
    }

    pub fn submissions(&self) -> Vec<Vec<ToolOutput>> {
        self.submissions.lock().unwrap().clone()
    }

    pub fn poll_count(&self) -> usize {
        *self.poll_count.lock().unwrap()
    }
}

#[async_trait::async_trait]
impl RunApi for ScriptedApi {
    async fn create_message(
        &self,
        _thread_id: &str,
        message: &NewMessage,
    ) -> assistants::Result<ThreadMessage> {
        self.posted.lock().unwrap().push(message.clone());
        Ok(self::message("msg_user", message.role, 0, None, &message.content))
    }

    async fn create_run(&self, _thread_id: &str, _assistant_id: &str) -> assistants::Result<Run> {
        *self.create_count.lock().unwrap() += 1;
        if let Some(e) = self.create_failures.lock().unwrap().pop_front() {
            return Err(e);
        }
        self.created.lock().unwrap().pop_front().ok_or(ApiError::Api {
            status: 400,
            message: "no run scripted".to_string(),
        })
    }

    async fn retrieve_run(&self, _thread_id: &str, _run_id: &str) -> assistants::Result<Run> {
        *self.poll_count.lock().unwrap() += 1;
        self.polls
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| panic!("polled past the end of the script"))
    }

    async fn submit_tool_outputs(
        &self,
        _thread_id: &str,
        run_id: &str,
        outputs: &[ToolOutput],
    ) -> assistants::Result<Run> {
        self.submissions.lock().unwrap().push(outputs.to_vec());
        if let Some(e) = self.submit_failures.lock().unwrap().pop_front() {
            return Err(e);
        }
        Ok(self
            .after_submit
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| run(run_id, RunStatus::Queued)))
    }

    async fn list_messages(&self, _thread_id: &str) -> assistants::Result<Vec<ThreadMessage>> {
        Ok(self.history.lock().unwrap().clone())
    }
}

#[async_trait::async_trait]
impl SessionApi for ScriptedApi {
    async fn create_assistant(&self, spec: &AssistantSpec) -> assistants::Result<Assistant> {
        Ok(Assistant {
            id: ASSISTANT.to_string(),
            name: Some(spec.name.clone()),
        })
    }

    async fn create_thread(&self) -> assistants::Result<Thread> {
        Ok(Thread {
            id: THREAD.to_string(),
        })
    }

    async fn upload_file(&self, path: &Path) -> assistants::Result<FileObject> {
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(FileObject {
            id: format!("file-{filename}"),
            filename,
        })
    }

    async fn attach_file(&self, _assistant_id: &str, _file_id: &str) -> assistants::Result<()> {
        Ok(())
    }
}

/// Clock that returns immediately and remembers every requested wait.
#[derive(Debug, Default)]
pub(crate) struct RecordingClock {
    pub sleeps: Mutex<Vec<Duration>>,
}

impl RecordingClock {
    pub fn count(&self) -> usize {
        self.sleeps.lock().unwrap().len()
    }
}

#[async_trait::async_trait]
impl Clock for RecordingClock {
    async fn sleep(&self, duration: Duration) {
        self.sleeps.lock().unwrap().push(duration);
    }
}

/// Executor that answers with the snippet itself and counts invocations.
#[derive(Debug, Default)]
pub(crate) struct EchoExecutor {
    pub runs: Mutex<Vec<String>>,
}

#[async_trait::async_trait]
impl CodeExecutor for EchoExecutor {
    async fn execute(&self, code: &str) -> Result<ExecutionResult, ExecutorError> {
        self.runs.lock().unwrap().push(code.to_string());
        Ok(ExecutionResult::Output(format!("ran: {code}")))
    }
}
