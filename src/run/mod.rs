//! Run advancement loop.
//!
//! A run is a remote computation attached to a thread. The remote side is
//! authoritative for its status; this module only observes snapshots and
//! reacts to them:
//!
//! 1. `Pending` (queued, in progress, cancelling): wait one poll interval,
//!    then fetch a fresh snapshot.
//! 2. `NeedsLocalAction`: run every pending tool call through the
//!    [`ToolCallBridge`] and resubmit all outputs in a single call.
//! 3. `Completed`: read back the thread history, oldest first.
//! 4. `TerminalFailure`: stop and report the status and error detail.
//!
//! Transient failures of reads (`retrieve_run`, `list_messages`) are retried
//! at the poll interval a bounded number of times before the run is
//! abandoned. Calls with remote effects are never replayed blindly: posting
//! the task and creating the run are tried once, and a failed tool output
//! submission is followed by a fresh poll that decides whether to resend.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use graph_maker::run::{RunDriver, RunSettings, TokioClock};
//!
//! let driver = RunDriver::new(api, bridge, Arc::new(TokioClock), RunSettings::default());
//! let outcome = driver.run_to_completion(&thread_id, &assistant_id).await?;
//! for reply in outcome.replies() {
//!     println!("{}", reply.text());
//! }
//! ```

mod clock;

pub use clock::{Clock, TokioClock};

use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use tracing::instrument;

use crate::assistants::{
    self, ApiError, LastError, MessageRole, NewMessage, Run, RunApi, RunStatus, ThreadMessage,
    ToolOutput,
};
use crate::bridge::ToolCallBridge;

/// Polling behaviour of the loop.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RunSettings {
    /// Wait between two polls of a pending run, and between retries.
    pub poll_interval_ms: u64,
    /// Consecutive transient failures tolerated per remote call.
    pub max_poll_retries: u32,
    /// Scripts of one poll allowed to run at the same time.
    pub max_parallel_executions: usize,
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            poll_interval_ms: 1000,
            max_poll_retries: 5,
            max_parallel_executions: 4,
        }
    }
}

impl RunSettings {
    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

/// How the loop must react to a run status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPhase {
    /// The remote side is still working; wait and poll again.
    Pending,
    /// The run is blocked on tool outputs from this host.
    NeedsLocalAction,
    /// The run finished successfully.
    Completed,
    /// The run ended without success and will not recover.
    TerminalFailure,
}

impl From<RunStatus> for RunPhase {
    fn from(status: RunStatus) -> Self {
        match status {
            RunStatus::Queued | RunStatus::InProgress | RunStatus::Cancelling => Self::Pending,
            RunStatus::RequiresAction => Self::NeedsLocalAction,
            RunStatus::Completed => Self::Completed,
            RunStatus::Cancelled
            | RunStatus::Failed
            | RunStatus::Expired
            | RunStatus::Incomplete => Self::TerminalFailure,
        }
    }
}

/// Failures that end a run from the caller's point of view.
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    /// The remote run reached a non-success terminal status.
    #[error(
        "run {run_id} ended with status {status}{}",
        .last_error.as_ref().map(|e| format!(" ({e})")).unwrap_or_default()
    )]
    Terminal {
        run_id: String,
        status: RunStatus,
        last_error: Option<LastError>,
    },

    /// A remote call kept failing transiently.
    #[error("{operation} failed after {attempts} attempts: {source}")]
    PollRetriesExhausted {
        operation: &'static str,
        attempts: u32,
        #[source]
        source: ApiError,
    },

    /// The remote side rejected a call outright.
    #[error("{operation} failed: {source}")]
    Api {
        operation: &'static str,
        #[source]
        source: ApiError,
    },

    /// The run asked for tool outputs without naming any tool call.
    #[error("run {run_id} requires action but lists no tool calls")]
    EmptyAction { run_id: String },
}

/// A completed run together with its thread history.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    /// Final snapshot of the run.
    pub run: Run,
    /// Every message of the thread, oldest first.
    pub messages: Vec<ThreadMessage>,
}

impl RunOutcome {
    /// Assistant messages written during this run, in order.
    pub fn replies(&self) -> impl Iterator<Item = &ThreadMessage> {
        self.messages.iter().filter(|m| {
            m.role == MessageRole::Assistant && m.run_id.as_deref() == Some(self.run.id.as_str())
        })
    }
}

/// Drives runs from creation to a terminal status.
#[derive(Debug, Clone)]
pub struct RunDriver {
    api: Arc<dyn RunApi>,
    bridge: ToolCallBridge,
    clock: Arc<dyn Clock>,
    settings: RunSettings,
}

impl RunDriver {
    pub fn new(
        api: Arc<dyn RunApi>,
        bridge: ToolCallBridge,
        clock: Arc<dyn Clock>,
        settings: RunSettings,
    ) -> Self {
        Self {
            api,
            bridge,
            clock,
            settings,
        }
    }

    #[must_use]
    pub fn settings(&self) -> &RunSettings {
        &self.settings
    }

    /// Post `message` to the thread, then run the assistant on it.
    pub async fn submit_task(
        &self,
        thread_id: &str,
        assistant_id: &str,
        message: &NewMessage,
    ) -> Result<RunOutcome, RunError> {
        let api = &self.api;
        once("create_message", api.create_message(thread_id, message)).await?;
        self.run_to_completion(thread_id, assistant_id).await
    }

    /// Start a run and advance it until it completes or fails.
    #[instrument(
        skip(self),
        fields(run_id = tracing::field::Empty)
    )]
    pub async fn run_to_completion(
        &self,
        thread_id: &str,
        assistant_id: &str,
    ) -> Result<RunOutcome, RunError> {
        let api = &self.api;
        let run = once("create_run", api.create_run(thread_id, assistant_id)).await?;
        tracing::Span::current().record("run_id", run.id.as_str());
        tracing::info!(status = %run.status, "Run created");

        self.advance(run).await
    }

    /// Advance an existing run snapshot to a terminal status.
    pub async fn advance(&self, mut run: Run) -> Result<RunOutcome, RunError> {
        let api = &self.api;
        let mut action_rounds = 0usize;

        loop {
            match RunPhase::from(run.status) {
                RunPhase::Pending => {
                    self.clock.sleep(self.settings.poll_interval()).await;

                    let (thread_id, run_id) = (run.thread_id.clone(), run.id.clone());
                    let (thread_id, run_id) = (thread_id.as_str(), run_id.as_str());
                    let next = self
                        .remote("retrieve_run", move || api.retrieve_run(thread_id, run_id))
                        .await?;

                    if next.status != run.status {
                        tracing::info!(
                            run_id = %next.id,
                            from = %run.status,
                            to = %next.status,
                            "Run status changed"
                        );
                    } else {
                        tracing::debug!(run_id = %next.id, status = %next.status, "Run still pending");
                    }
                    run = next;
                }
                RunPhase::NeedsLocalAction => {
                    let calls = run.pending_tool_calls();
                    if calls.is_empty() {
                        return Err(RunError::EmptyAction { run_id: run.id });
                    }
                    action_rounds += 1;

                    tracing::info!(
                        run_id = %run.id,
                        round = action_rounds,
                        tool_call_count = calls.len(),
                        "Run requires local action"
                    );

                    let outputs = self.bridge.resolve_all(calls).await;
                    debug_assert_eq!(outputs.len(), calls.len());

                    run = self.submit_outputs(&run, &outputs).await?;

                    tracing::info!(
                        run_id = %run.id,
                        output_count = outputs.len(),
                        status = %run.status,
                        "Tool outputs submitted"
                    );
                }
                RunPhase::Completed => {
                    let thread_id = run.thread_id.as_str();
                    let mut messages = self
                        .remote("list_messages", move || api.list_messages(thread_id))
                        .await?;
                    // Stable, so messages created in the same second keep remote order.
                    messages.sort_by_key(|m| m.created_at);

                    tracing::info!(
                        run_id = %run.id,
                        message_count = messages.len(),
                        action_rounds,
                        "Run completed"
                    );
                    return Ok(RunOutcome { run, messages });
                }
                RunPhase::TerminalFailure => {
                    tracing::error!(
                        run_id = %run.id,
                        status = %run.status,
                        last_error = ?run.last_error,
                        "Run ended without success"
                    );
                    return Err(RunError::Terminal {
                        run_id: run.id,
                        status: run.status,
                        last_error: run.last_error,
                    });
                }
            }
        }
    }

    /// Hand `outputs` back to the run.
    ///
    /// A transient failure does not say whether the remote side took the
    /// outputs, so the run is fetched again first. The outputs are sent again
    /// only while that snapshot still waits on exactly these calls.
    async fn submit_outputs(&self, run: &Run, outputs: &[ToolOutput]) -> Result<Run, RunError> {
        let api = &self.api;
        let (thread_id, run_id) = (run.thread_id.as_str(), run.id.as_str());
        let mut failures = 0u32;

        loop {
            let e = match api.submit_tool_outputs(thread_id, run_id, outputs).await {
                Ok(next) => return Ok(next),
                Err(e) if e.is_transient() => e,
                Err(e) => {
                    return Err(RunError::Api {
                        operation: "submit_tool_outputs",
                        source: e,
                    });
                }
            };

            failures += 1;
            if failures > self.settings.max_poll_retries {
                tracing::error!(
                    run_id,
                    attempts = failures,
                    error = %e,
                    "Giving up on tool output submission"
                );
                return Err(RunError::PollRetriesExhausted {
                    operation: "submit_tool_outputs",
                    attempts: failures,
                    source: e,
                });
            }
            tracing::warn!(
                run_id,
                attempt = failures,
                error = %e,
                "Tool output submission failed, checking run before resending"
            );
            self.clock.sleep(self.settings.poll_interval()).await;

            let snapshot = self
                .remote("retrieve_run", move || api.retrieve_run(thread_id, run_id))
                .await?;
            if !awaits_outputs(&snapshot, outputs) {
                tracing::info!(
                    run_id,
                    status = %snapshot.status,
                    "Tool outputs were accepted before the failure"
                );
                return Ok(snapshot);
            }
        }
    }

    /// Issue a read-only remote call, retrying transient failures at the poll interval.
    async fn remote<T, F, Fut>(&self, operation: &'static str, mut call: F) -> Result<T, RunError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = assistants::Result<T>>,
    {
        let mut failures = 0u32;
        loop {
            match call().await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_transient() => {
                    failures += 1;
                    if failures > self.settings.max_poll_retries {
                        tracing::error!(
                            operation,
                            attempts = failures,
                            error = %e,
                            "Giving up on remote call"
                        );
                        return Err(RunError::PollRetriesExhausted {
                            operation,
                            attempts: failures,
                            source: e,
                        });
                    }
                    tracing::warn!(
                        operation,
                        attempt = failures,
                        max_retries = self.settings.max_poll_retries,
                        error = %e,
                        "Transient remote failure, retrying"
                    );
                    self.clock.sleep(self.settings.poll_interval()).await;
                }
                Err(e) => return Err(RunError::Api { operation, source: e }),
            }
        }
    }
}

/// Issue a call that must not be replayed; any failure ends the run.
async fn once<T>(
    operation: &'static str,
    call: impl Future<Output = assistants::Result<T>>,
) -> Result<T, RunError> {
    call.await
        .map_err(|source| RunError::Api { operation, source })
}

/// Whether `run` is still blocked on exactly the calls answered by `outputs`.
fn awaits_outputs(run: &Run, outputs: &[ToolOutput]) -> bool {
    let pending = run.pending_tool_calls();
    run.status == RunStatus::RequiresAction
        && pending.len() == outputs.len()
        && pending
            .iter()
            .all(|call| outputs.iter().any(|o| o.tool_call_id == call.id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{
        ASSISTANT, EchoExecutor, RecordingClock, ScriptedApi, THREAD, code_call, message,
        raw_call, run, run_requiring, unavailable,
    };

    struct Harness {
        api: Arc<ScriptedApi>,
        clock: Arc<RecordingClock>,
        executor: Arc<EchoExecutor>,
        driver: RunDriver,
    }

    fn harness(api: ScriptedApi) -> Harness {
        let api = Arc::new(api);
        let clock = Arc::new(RecordingClock::default());
        let executor = Arc::new(EchoExecutor::default());
        let bridge = ToolCallBridge::new(Arc::clone(&executor) as _, 4);
        let driver = RunDriver::new(
            Arc::clone(&api) as _,
            bridge,
            Arc::clone(&clock) as _,
            RunSettings {
                poll_interval_ms: 1000,
                max_poll_retries: 2,
                max_parallel_executions: 4,
            },
        );
        Harness {
            api,
            clock,
            executor,
            driver,
        }
    }

    fn history() -> Vec<ThreadMessage> {
        // Remote order deliberately scrambled.
        vec![
            message("m3", MessageRole::Assistant, 30, Some("run_1"), "Done, saved graph.png"),
            message("m1", MessageRole::User, 10, None, "plot it"),
            message("m2", MessageRole::Assistant, 20, Some("run_1"), "Working on it"),
        ]
    }

    #[test]
    fn test_phase_classification_is_total() {
        use RunStatus::*;
        let pending = [Queued, InProgress, Cancelling];
        let failed = [Cancelled, Failed, Expired, Incomplete];

        for s in pending {
            assert_eq!(RunPhase::from(s), RunPhase::Pending);
        }
        for s in failed {
            assert_eq!(RunPhase::from(s), RunPhase::TerminalFailure);
        }
        assert_eq!(RunPhase::from(RequiresAction), RunPhase::NeedsLocalAction);
        assert_eq!(RunPhase::from(Completed), RunPhase::Completed);
    }

    #[tokio::test]
    async fn test_pending_polls_until_completed() {
        let h = harness(
            ScriptedApi::new(
                run("run_1", RunStatus::Queued),
                vec![
                    Ok(run("run_1", RunStatus::InProgress)),
                    Ok(run("run_1", RunStatus::InProgress)),
                    Ok(run("run_1", RunStatus::Completed)),
                ],
            )
            .with_history(history()),
        );

        let outcome = h.driver.run_to_completion(THREAD, ASSISTANT).await.unwrap();

        // One wait per poll, nothing else happens while pending.
        assert_eq!(h.api.poll_count(), 3);
        assert_eq!(h.clock.count(), 3);
        assert!(h.clock.sleeps.lock().unwrap().iter().all(|d| *d == Duration::from_secs(1)));
        assert!(h.api.submissions().is_empty());
        assert!(h.executor.runs.lock().unwrap().is_empty());

        assert_eq!(outcome.run.status, RunStatus::Completed);
        let ids: Vec<_> = outcome.messages.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, ["m1", "m2", "m3"]);
    }

    #[tokio::test]
    async fn test_replies_are_this_runs_assistant_messages() {
        let mut messages = history();
        messages.push(message("m0", MessageRole::Assistant, 5, Some("run_0"), "old answer"));
        let h = harness(
            ScriptedApi::new(run("run_1", RunStatus::Completed), vec![]).with_history(messages),
        );

        let outcome = h.driver.run_to_completion(THREAD, ASSISTANT).await.unwrap();
        let replies: Vec<_> = outcome.replies().map(ThreadMessage::text).collect();
        assert_eq!(replies, ["Working on it", "Done, saved graph.png"]);
        assert_eq!(h.clock.count(), 0);
    }

    #[tokio::test]
    async fn test_required_action_is_resolved_and_resubmitted() {
        let h = harness(
            ScriptedApi::new(
                run("run_1", RunStatus::Queued),
                vec![
                    Ok(run_requiring("run_1", vec![code_call("call_a", "print(42)")])),
                    Ok(run("run_1", RunStatus::Completed)),
                ],
            )
            .with_history(history()),
        );

        h.driver.run_to_completion(THREAD, ASSISTANT).await.unwrap();

        assert_eq!(
            h.api.submissions(),
            vec![vec![ToolOutput {
                tool_call_id: "call_a".to_string(),
                output: "ran: print(42)".to_string(),
            }]]
        );
        // No wait between seeing the action and handling it.
        assert_eq!(h.clock.count(), 2);
    }

    #[tokio::test]
    async fn test_all_pending_calls_go_in_one_submission() {
        let h = harness(
            ScriptedApi::new(
                run("run_1", RunStatus::Queued),
                vec![
                    Ok(run_requiring(
                        "run_1",
                        vec![code_call("call_a", "first"), code_call("call_b", "second")],
                    )),
                    Ok(run("run_1", RunStatus::Completed)),
                ],
            )
            .with_history(history()),
        );

        h.driver.run_to_completion(THREAD, ASSISTANT).await.unwrap();

        let submissions = h.api.submissions();
        assert_eq!(submissions.len(), 1);
        let mut pairs: Vec<_> = submissions[0]
            .iter()
            .map(|o| (o.tool_call_id.as_str(), o.output.as_str()))
            .collect();
        pairs.sort_unstable();
        assert_eq!(pairs, [("call_a", "ran: first"), ("call_b", "ran: second")]);
    }

    #[tokio::test]
    async fn test_malformed_call_gets_error_marker_alongside_valid_ones() {
        let h = harness(
            ScriptedApi::new(
                run_requiring(
                    "run_1",
                    vec![code_call("call_ok", "print(1)"), raw_call("call_bad", r#"{"cmd":"x"}"#)],
                ),
                vec![Ok(run("run_1", RunStatus::Completed))],
            )
            .with_history(history()),
        );

        h.driver.run_to_completion(THREAD, ASSISTANT).await.unwrap();

        let submissions = h.api.submissions();
        assert_eq!(submissions.len(), 1);
        let outputs = &submissions[0];
        assert_eq!(outputs.len(), 2);
        assert_eq!(outputs[0].output, "ran: print(1)");
        assert_eq!(outputs[1].tool_call_id, "call_bad");
        assert!(outputs[1].output.starts_with("Error: malformed arguments"));
        assert_eq!(*h.executor.runs.lock().unwrap(), ["print(1)"]);
    }

    #[tokio::test]
    async fn test_multiple_action_rounds() {
        let h = harness(
            ScriptedApi::new(
                run("run_1", RunStatus::Queued),
                vec![
                    Ok(run_requiring("run_1", vec![code_call("c1", "draft")])),
                    Ok(run_requiring("run_1", vec![code_call("c2", "fixed")])),
                    Ok(run("run_1", RunStatus::Completed)),
                ],
            )
            .with_history(history()),
        );

        h.driver.run_to_completion(THREAD, ASSISTANT).await.unwrap();

        let ids: Vec<_> = h
            .api
            .submissions()
            .iter()
            .map(|s| s[0].tool_call_id.clone())
            .collect();
        assert_eq!(ids, ["c1", "c2"]);
    }

    #[tokio::test]
    async fn test_terminal_failure_is_surfaced() {
        let mut failed = run("run_1", RunStatus::Failed);
        failed.last_error = Some(LastError {
            code: "rate_limit_exceeded".to_string(),
            message: "quota".to_string(),
        });
        let h = harness(ScriptedApi::new(
            run("run_1", RunStatus::InProgress),
            vec![Ok(failed)],
        ));

        let err = h.driver.run_to_completion(THREAD, ASSISTANT).await.unwrap_err();

        match &err {
            RunError::Terminal {
                status, last_error, ..
            } => {
                assert_eq!(*status, RunStatus::Failed);
                assert_eq!(last_error.as_ref().unwrap().code, "rate_limit_exceeded");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(
            err.to_string(),
            "run run_1 ended with status failed (rate_limit_exceeded: quota)"
        );
        // Stopped right there: exactly one poll.
        assert_eq!(h.api.poll_count(), 1);
    }

    #[tokio::test]
    async fn test_expired_run_stops_polling() {
        let h = harness(ScriptedApi::new(
            run("run_1", RunStatus::Queued),
            vec![Ok(run("run_1", RunStatus::Expired))],
        ));
        let err = h.driver.run_to_completion(THREAD, ASSISTANT).await.unwrap_err();
        assert!(matches!(err, RunError::Terminal { status: RunStatus::Expired, .. }));
    }

    #[tokio::test]
    async fn test_transient_poll_failures_are_retried() {
        let h = harness(
            ScriptedApi::new(
                run("run_1", RunStatus::Queued),
                vec![
                    Err(unavailable()),
                    Err(unavailable()),
                    Ok(run("run_1", RunStatus::Completed)),
                ],
            )
            .with_history(history()),
        );

        h.driver.run_to_completion(THREAD, ASSISTANT).await.unwrap();
        assert_eq!(h.api.poll_count(), 3);
        // One regular wait plus one per retry.
        assert_eq!(h.clock.count(), 3);
    }

    #[tokio::test]
    async fn test_retries_are_bounded() {
        let h = harness(ScriptedApi::new(
            run("run_1", RunStatus::Queued),
            vec![Err(unavailable()), Err(unavailable()), Err(unavailable())],
        ));

        let err = h.driver.run_to_completion(THREAD, ASSISTANT).await.unwrap_err();

        assert!(matches!(
            err,
            RunError::PollRetriesExhausted {
                operation: "retrieve_run",
                attempts: 3,
                ..
            }
        ));
        assert_eq!(h.api.poll_count(), 3);
    }

    #[tokio::test]
    async fn test_permanent_api_error_is_not_retried() {
        let h = harness(ScriptedApi::new(
            run("run_1", RunStatus::Queued),
            vec![Err(ApiError::Api {
                status: 404,
                message: "No run found".to_string(),
            })],
        ));

        let err = h.driver.run_to_completion(THREAD, ASSISTANT).await.unwrap_err();
        assert!(matches!(err, RunError::Api { operation: "retrieve_run", .. }));
        assert_eq!(h.api.poll_count(), 1);
    }

    #[tokio::test]
    async fn test_lost_submission_response_is_not_resent() {
        // The outputs arrive but the response is lost; the run moved on.
        let h = harness(
            ScriptedApi::new(
                run_requiring("run_1", vec![code_call("c1", "print(1)")]),
                vec![
                    Ok(run("run_1", RunStatus::InProgress)),
                    Ok(run("run_1", RunStatus::Completed)),
                ],
            )
            .failing_submissions(vec![unavailable()])
            .with_history(history()),
        );

        let outcome = h.driver.run_to_completion(THREAD, ASSISTANT).await.unwrap();

        assert_eq!(outcome.run.status, RunStatus::Completed);
        assert_eq!(h.api.submissions().len(), 1);
        assert_eq!(h.executor.runs.lock().unwrap().len(), 1);
        assert_eq!(h.api.poll_count(), 2);
    }

    #[tokio::test]
    async fn test_unaccepted_submission_is_sent_again() {
        let pending = vec![code_call("c1", "print(1)")];
        let h = harness(
            ScriptedApi::new(
                run_requiring("run_1", pending.clone()),
                vec![
                    Ok(run_requiring("run_1", pending)),
                    Ok(run("run_1", RunStatus::Completed)),
                ],
            )
            .failing_submissions(vec![unavailable()])
            .with_history(history()),
        );

        h.driver.run_to_completion(THREAD, ASSISTANT).await.unwrap();

        let submissions = h.api.submissions();
        assert_eq!(submissions.len(), 2);
        assert_eq!(submissions[0], submissions[1]);
        // Same outputs resent, the script is not run twice.
        assert_eq!(*h.executor.runs.lock().unwrap(), ["print(1)"]);
    }

    #[tokio::test]
    async fn test_submission_retries_are_bounded() {
        let pending = vec![code_call("c1", "print(1)")];
        let h = harness(
            ScriptedApi::new(
                run_requiring("run_1", pending.clone()),
                vec![
                    Ok(run_requiring("run_1", pending.clone())),
                    Ok(run_requiring("run_1", pending)),
                ],
            )
            .failing_submissions(vec![unavailable(), unavailable(), unavailable()]),
        );

        let err = h.driver.run_to_completion(THREAD, ASSISTANT).await.unwrap_err();

        assert!(matches!(
            err,
            RunError::PollRetriesExhausted {
                operation: "submit_tool_outputs",
                attempts: 3,
                ..
            }
        ));
        assert_eq!(h.api.submissions().len(), 3);
    }

    #[tokio::test]
    async fn test_create_run_is_not_replayed() {
        let h = harness(
            ScriptedApi::new(run("run_1", RunStatus::Queued), vec![])
                .failing_creates(vec![unavailable()]),
        );

        let err = h.driver.run_to_completion(THREAD, ASSISTANT).await.unwrap_err();

        assert!(matches!(err, RunError::Api { operation: "create_run", .. }));
        assert_eq!(*h.api.create_count.lock().unwrap(), 1);
        assert_eq!(h.clock.count(), 0);
    }

    #[tokio::test]
    async fn test_empty_required_action_is_an_error() {
        let h = harness(ScriptedApi::new(run_requiring("run_1", vec![]), vec![]));
        let err = h.driver.run_to_completion(THREAD, ASSISTANT).await.unwrap_err();
        assert!(matches!(err, RunError::EmptyAction { .. }));
        assert!(h.api.submissions().is_empty());
    }

    #[tokio::test]
    async fn test_submit_task_posts_message_first() {
        let h = harness(
            ScriptedApi::new(run("run_1", RunStatus::Completed), vec![]).with_history(history()),
        );
        let message = NewMessage::user("plot sales", vec!["file-1".to_string()]);

        h.driver
            .submit_task(THREAD, ASSISTANT, &message)
            .await
            .unwrap();

        let posted = h.api.posted.lock().unwrap();
        assert_eq!(posted.len(), 1);
        assert_eq!(posted[0].content, "plot sales");
        assert_eq!(posted[0].file_ids, ["file-1"]);
    }
}
