mod aggregate;
mod compile;
mod error;
mod execute;
mod native_runner;
mod process;
mod runner;
mod workspace;

// Re-export the trait and common types
pub use aggregate::aggregate;
pub use compile::compile;
pub use error::SandboxError;
pub use execute::{RunPolicy, run};
pub use native_runner::NativeSandbox;
pub use runner::CodeSandbox;
pub use workspace::Workspace;

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::config::{Config, SandboxBackend};

/// One submission: source text, its language and one input per desired run
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct ExecuteCodeRequest {
    pub code: String,
    pub language: String,
    #[serde(default)]
    pub input_list: Vec<String>,
}

/// Verdict of a whole submission
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ExecuteCodeResponse {
    /// Stdout of every run that completed without a diagnostic, in input order
    pub output_list: Vec<String>,
    /// First diagnostic encountered (compiler or runtime error text)
    pub message: Option<String>,
    pub status: ExecuteStatus,
    pub judge_info: JudgeInfo,
}

impl ExecuteCodeResponse {
    pub fn compile_error(diagnostic: String) -> Self {
        Self {
            output_list: Vec::new(),
            message: Some(diagnostic),
            status: ExecuteStatus::CompileError,
            judge_info: JudgeInfo::default(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct JudgeInfo {
    /// Longest elapsed time over all processed runs, in milliseconds
    pub time: u64,
}

/// Status code reported to callers, serialized as its numeric value
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(into = "u8", try_from = "u8")]
pub enum ExecuteStatus {
    Success = 1,
    CompileError = 2,
    RuntimeError = 3,
}

impl From<ExecuteStatus> for u8 {
    fn from(status: ExecuteStatus) -> Self {
        status as u8
    }
}

impl TryFrom<u8> for ExecuteStatus {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::Success),
            2 => Ok(Self::CompileError),
            3 => Ok(Self::RuntimeError),
            other => Err(format!("unknown status code {other}")),
        }
    }
}

/// Result of the compile step
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompileOutcome {
    Success,
    Failure { diagnostic: String },
}

/// Why a supervised process stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// Exited with status 0
    Completed,
    /// Exited with a non-zero status, or was killed by a signal (`None`)
    NonZeroExit(Option<i32>),
    /// Killed by the timeout supervisor
    TimedOut,
}

/// Result of a single run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunResult {
    pub stdout: String,
    /// Captured stderr, or error text describing the failure; empty if none
    pub error: String,
    pub elapsed_ms: u64,
    pub termination: Termination,
}

impl RunResult {
    /// Error text of the run, if it failed
    ///
    /// Classification only looks at the error text: whitespace-only text counts
    /// as empty, and the exit status is not consulted.
    pub fn diagnostic(&self) -> Option<&str> {
        if self.error.trim().is_empty() {
            None
        } else {
            Some(&self.error)
        }
    }
}

/// Creates the sandbox backend named in the configuration
pub fn create_sandbox(config: &Config) -> anyhow::Result<Arc<dyn CodeSandbox>> {
    match config.sandbox.backend {
        SandboxBackend::Native => {
            let root = config.sandbox.workspace_root()?;
            log::info!("Creating NativeSandbox with workspace root {}", root.display());
            let sandbox = NativeSandbox::new(root, config.sandbox.clone(), config.languages.clone());
            Ok(Arc::new(sandbox))
        }
    }
}
