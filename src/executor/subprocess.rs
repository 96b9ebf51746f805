//! Child-process executor.

use std::io::Write;
use std::path::Path;
use std::process::{Output, Stdio};
use std::time::Duration;

use tempfile::NamedTempFile;
use tokio::process::Command;

use super::limits::{self, ResourceLimits};
use super::{CodeExecutor, ExecutionResult, ExecutorError, SandboxSettings};

/// Host variables the child may see; everything else is dropped.
const INHERITED_ENV: &[&str] = &[
    "PATH",
    "HOME",
    "LANG",
    "LC_ALL",
    "TMPDIR",
    "SYSTEMROOT",
    "VIRTUAL_ENV",
    "PYTHONPATH",
];

const TRUNCATION_MARKER: &str = "\n[output truncated]";

/// Runs each snippet with the configured interpreter in its own process.
#[derive(Debug, Clone)]
pub struct SubprocessExecutor {
    settings: SandboxSettings,
}

impl SubprocessExecutor {
    #[must_use]
    pub fn new(settings: SandboxSettings) -> Self {
        Self { settings }
    }

    #[must_use]
    pub fn settings(&self) -> &SandboxSettings {
        &self.settings
    }

    /// Write `code` to a new uniquely named file.
    fn materialize(&self, code: &str) -> Result<NamedTempFile, ExecutorError> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("graph-maker-").suffix(&self.settings.script_suffix);
        let mut file = match &self.settings.script_dir {
            Some(dir) => builder.tempfile_in(dir),
            None => builder.tempfile(),
        }
        .map_err(ExecutorError::Materialize)?;
        file.write_all(code.as_bytes())
            .and_then(|()| file.flush())
            .map_err(ExecutorError::Materialize)?;
        Ok(file)
    }

    fn command(&self, script: &Path) -> Command {
        let mut cmd = Command::new(&self.settings.interpreter);
        cmd.arg(script)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .env_clear();

        for key in INHERITED_ENV {
            if let Ok(value) = std::env::var(key) {
                cmd.env(key, value);
            }
        }
        // Generated plotting code must never try to open a window.
        cmd.env("MPLBACKEND", "Agg");

        if let Some(dir) = &self.settings.working_dir {
            cmd.current_dir(dir);
        }

        limits::install(&mut cmd, ResourceLimits::from_settings(&self.settings));
        cmd
    }

    async fn run_script(&self, script: &Path) -> Result<ExecutionResult, ExecutorError> {
        let child = self
            .command(script)
            .spawn()
            .map_err(|source| ExecutorError::Spawn {
                interpreter: self.settings.interpreter.clone(),
                source,
            })?;

        let timeout = Duration::from_secs(self.settings.timeout_secs);
        match tokio::time::timeout(timeout, child.wait_with_output()).await {
            Ok(Ok(output)) => Ok(self.classify(&output)),
            Ok(Err(e)) => Err(ExecutorError::Wait(e)),
            // Dropping the wait future drops the child, which kills it.
            Err(_) => Ok(ExecutionResult::Failure(format!(
                "Execution timed out after {}s",
                self.settings.timeout_secs
            ))),
        }
    }

    fn classify(&self, output: &Output) -> ExecutionResult {
        let max = self.settings.max_output_bytes;
        if output.status.success() {
            return ExecutionResult::Output(truncate(
                &String::from_utf8_lossy(&output.stdout),
                max,
            ));
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        if stderr.trim().is_empty() {
            // Killed by a signal (e.g. the CPU limit) or failed silently.
            ExecutionResult::Failure(format!("Process exited with {}", output.status))
        } else {
            ExecutionResult::Failure(truncate(&stderr, max))
        }
    }
}

#[async_trait::async_trait]
impl CodeExecutor for SubprocessExecutor {
    async fn execute(&self, code: &str) -> Result<ExecutionResult, ExecutorError> {
        let script = self.materialize(code)?;
        let path = script.path().to_path_buf();

        tracing::debug!(
            script = %path.display(),
            interpreter = %self.settings.interpreter,
            code_length = code.len(),
            "Executing script"
        );

        let outcome = self.run_script(&path).await;

        if let Err(e) = script.close() {
            tracing::warn!(
                script = %path.display(),
                error = %e,
                "Failed to remove temporary script"
            );
        }

        match &outcome {
            Ok(result) => tracing::info!(
                failed = result.is_failure(),
                result_length = result.text().len(),
                "Script finished"
            ),
            Err(e) => tracing::error!(error = %e, "Script could not be run"),
        }

        outcome
    }
}

/// Cut `text` to at most `max` bytes on a char boundary.
fn truncate(text: &str, max: usize) -> String {
    if text.len() <= max {
        return text.to_string();
    }
    let mut end = max;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}{TRUNCATION_MARKER}", &text[..end])
}
