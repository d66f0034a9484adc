use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Infrastructure failures of the sandbox
///
/// None of these describe the submitted code: they abort the request instead of
/// being folded into the response status.
#[derive(Debug, Error)]
pub enum SandboxError {
    #[error("workspace error at {}: {source}", path.display())]
    Workspace { path: PathBuf, source: io::Error },

    #[error("failed to launch `{program}`: {source}")]
    Launch { program: String, source: io::Error },

    #[error("failed to capture process output: {0}")]
    Capture(#[from] io::Error),

    #[error("empty command template")]
    EmptyCommand,

    #[error("unsupported language: {0}")]
    UnsupportedLanguage(String),
}

impl SandboxError {
    pub(crate) fn workspace(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Workspace {
            path: path.into(),
            source,
        }
    }
}
