use std::fmt;

use thiserror::Error;

/// Reason the surrounding runtime ends a run.
///
/// These are not failures of the report itself and must reach the runtime
/// unchanged so it can record why the run stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Termination {
    /// Normal end of the run, successful or not
    Exit { success: bool, message: Option<String> },
    /// Aborted from outside (maintenance, Ctrl-C)
    ForceAbort,
    /// Maximum execution time exceeded
    Timeout,
    /// Interactive user closed the session
    #[allow(dead_code)]
    UserDetached,
}

impl Termination {
    pub fn success() -> Self {
        Self::Exit {
            success: true,
            message: None,
        }
    }

    pub fn fail(message: impl Into<String>) -> Self {
        Self::Exit {
            success: false,
            message: Some(message.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Exit { success: true, .. })
    }

    /// Process exit code used by the binary
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Exit { success: true, .. } => 0,
            Self::Exit { success: false, .. } => 1,
            Self::ForceAbort => 2,
            Self::Timeout => 3,
            Self::UserDetached => 4,
        }
    }
}

impl fmt::Display for Termination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exit { success: true, .. } => write!(f, "exit success"),
            Self::Exit {
                success: false,
                message: Some(message),
            } => write!(f, "exit fail: {}", message),
            Self::Exit { success: false, .. } => write!(f, "exit fail"),
            Self::ForceAbort => write!(f, "forced abort"),
            Self::Timeout => write!(f, "execution timeout"),
            Self::UserDetached => write!(f, "interactive user detached"),
        }
    }
}

#[derive(Debug, Error)]
pub enum ScriptError {
    #[error("script terminated: {0}")]
    Terminated(Termination),

    #[error("Backend request failed: {0}")]
    Backend(String),

    #[error("Unexpected data: {0}")]
    Data(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl From<Termination> for ScriptError {
    fn from(termination: Termination) -> Self {
        Self::Terminated(termination)
    }
}

pub type ScriptResult<T> = Result<T, ScriptError>;
