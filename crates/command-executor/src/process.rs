//! Process exit status and captured output

use std::fmt;

/// Process exit status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitStatus {
    /// Exit code if the process exited normally
    pub code: Option<i32>,
    /// Signal that terminated the process (Unix only)
    #[cfg(unix)]
    pub signal: Option<i32>,
}

impl ExitStatus {
    /// Status for a process that exited normally with `code`
    pub fn from_code(code: i32) -> Self {
        Self {
            code: Some(code),
            #[cfg(unix)]
            signal: None,
        }
    }

    /// Returns true if the process exited successfully (code 0)
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

impl From<std::process::ExitStatus> for ExitStatus {
    fn from(status: std::process::ExitStatus) -> Self {
        Self {
            code: status.code(),
            #[cfg(unix)]
            signal: {
                use std::os::unix::process::ExitStatusExt;
                status.signal()
            },
        }
    }
}

impl fmt::Display for ExitStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        #[cfg(unix)]
        if let Some(signal) = self.signal {
            return write!(f, "signal: {}", signal);
        }
        match self.code {
            Some(code) => write!(f, "exit status: {}", code),
            None => f.write_str("exit status: unknown"),
        }
    }
}

/// Result of running a command to completion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedOutput {
    /// How the process ended
    pub status: ExitStatus,
    /// Standard output and standard error, interleaved in arrival order
    pub output: Vec<u8>,
}

impl CapturedOutput {
    /// Output of a successful run
    pub fn success(output: impl Into<Vec<u8>>) -> Self {
        Self {
            status: ExitStatus::from_code(0),
            output: output.into(),
        }
    }

    /// Output of a run that exited with `code`
    pub fn failure(code: i32, output: impl Into<Vec<u8>>) -> Self {
        Self {
            status: ExitStatus::from_code(code),
            output: output.into(),
        }
    }
}
