/// Error types for helm and kubectl invocations
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for command execution
pub type Result<T> = std::result::Result<T, ExecError>;

/// Failures surfaced by the command helpers
#[derive(Error, Debug)]
pub enum ExecError {
    /// Creating a destination or output directory failed
    #[error("failed to create directory {}: {source}", path.display())]
    Directory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The external binary could not be started
    #[error(transparent)]
    Launch(std::io::Error),

    /// The process ran but exited non-zero
    #[error("exit code {0}")]
    Command(i32),
}

impl ExecError {
    /// Exit code carried by a `Command` failure
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            Self::Command(code) => Some(*code),
            _ => None,
        }
    }
}
