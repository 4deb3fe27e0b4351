//! Error types for command execution

use crate::process::ExitStatus;
use thiserror::Error;

/// Unified error type for command execution
#[derive(Error, Debug)]
pub enum Error {
    /// Failed to spawn a process
    #[error("failed to spawn {program}: {reason}")]
    SpawnFailed {
        /// The program that could not be started
        program: String,
        /// The reason for the spawn failure
        reason: String,
    },

    /// Command not found
    #[error("command not found: {command}")]
    CommandNotFound {
        /// The command that was not found
        command: String,
    },

    /// The process ran but did not exit successfully
    ///
    /// The combined output is kept because external tools report their
    /// diagnostics there.
    #[error("{program} {status}: {}", String::from_utf8_lossy(.output).trim_end())]
    ExitFailure {
        /// The program that failed
        program: String,
        /// How the process ended
        status: ExitStatus,
        /// Combined stdout and stderr of the process
        output: Vec<u8>,
    },

    /// I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create a spawn failed error
    pub fn spawn_failed(program: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::SpawnFailed {
            program: program.into(),
            reason: reason.into(),
        }
    }

    /// Map a spawn-time I/O error, distinguishing a missing executable
    pub fn from_spawn_io(program: impl Into<String>, err: std::io::Error) -> Self {
        let program = program.into();
        if err.kind() == std::io::ErrorKind::NotFound {
            Self::CommandNotFound { command: program }
        } else {
            Self::spawn_failed(program, err.to_string())
        }
    }

    /// Captured output attached to this error, if any
    pub fn output(&self) -> Option<&[u8]> {
        match self {
            Error::ExitFailure { output, .. } => Some(output),
            _ => None,
        }
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
