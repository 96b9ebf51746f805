//! Isolated execution of model-generated scripts.
//!
//! Each snippet is written to a fresh temporary file, run by a new child
//! process and reduced to a single [`ExecutionResult`] text. The temporary
//! file is removed on every exit path.
//!
//! # Example
//!
//! ```rust,ignore
//! use graph_maker::executor::{CodeExecutor, SandboxSettings, SubprocessExecutor};
//!
//! let executor = SubprocessExecutor::new(SandboxSettings::default());
//! let result = executor.execute("print(6 * 7)").await?;
//! assert_eq!(result.text().trim(), "42");
//! ```

mod limits;
mod subprocess;

pub use subprocess::SubprocessExecutor;

use std::path::PathBuf;

use serde::Deserialize;

/// Outcome of running one snippet.
///
/// Exactly one of the two texts is ever produced. A nonzero exit is not an
/// error of this crate; its stderr is handed to the agent so it can react.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionResult {
    /// Captured standard output of a process that exited zero.
    Output(String),
    /// Captured error text of a process that failed or timed out.
    Failure(String),
}

impl ExecutionResult {
    /// The captured text, whichever variant this is.
    #[must_use]
    pub fn text(&self) -> &str {
        match self {
            Self::Output(s) | Self::Failure(s) => s,
        }
    }

    #[must_use]
    pub fn into_text(self) -> String {
        match self {
            Self::Output(s) | Self::Failure(s) => s,
        }
    }

    #[must_use]
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failure(_))
    }
}

/// Errors raised before a script could produce a result.
#[derive(Debug, thiserror::Error)]
pub enum ExecutorError {
    /// The temporary script file could not be created or written.
    #[error("failed to materialize script: {0}")]
    Materialize(#[source] std::io::Error),

    /// The interpreter process could not be started.
    #[error("failed to spawn '{interpreter}': {source}")]
    Spawn {
        interpreter: String,
        #[source]
        source: std::io::Error,
    },

    /// Waiting on the child process failed.
    #[error("failed to collect process output: {0}")]
    Wait(#[source] std::io::Error),
}

/// Resource ceilings and environment for executed scripts.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SandboxSettings {
    /// Interpreter used to run each script.
    pub interpreter: String,
    /// Suffix of the temporary script file (the interpreter may care).
    pub script_suffix: String,
    /// Wall-clock limit; the child is killed when it expires.
    pub timeout_secs: u64,
    /// CPU seconds (`RLIMIT_CPU`).
    pub cpu_limit_secs: Option<u64>,
    /// Address space in MiB (`RLIMIT_AS`, Linux only).
    pub memory_limit_mb: Option<u64>,
    /// Open file descriptors (`RLIMIT_NOFILE`).
    pub max_open_files: Option<u64>,
    /// Captured text beyond this many bytes is cut off.
    pub max_output_bytes: usize,
    /// Working directory of the child; the host's when unset.
    pub working_dir: Option<PathBuf>,
    /// Where temporary scripts are written; the system temp dir when unset.
    pub script_dir: Option<PathBuf>,
}

impl Default for SandboxSettings {
    fn default() -> Self {
        Self {
            interpreter: "python3".to_string(),
            script_suffix: ".py".to_string(),
            timeout_secs: 120,
            cpu_limit_secs: Some(120),
            memory_limit_mb: Some(2048),
            max_open_files: Some(256),
            max_output_bytes: 64 * 1024,
            working_dir: None,
            script_dir: None,
        }
    }
}

/// Something that can run a source snippet and report what it printed.
#[async_trait::async_trait]
pub trait CodeExecutor: Send + Sync + std::fmt::Debug {
    /// Run `code` to completion in a fresh process.
    async fn execute(&self, code: &str) -> Result<ExecutionResult, ExecutorError>;
}
