//! Runtime-agnostic command execution library
//!
//! This crate runs external command-line tools and captures their merged
//! standard output and standard error. A non-zero exit is turned into an
//! [`Error::ExitFailure`] that still carries the captured bytes, since for
//! tools like `docker` or `sti` that output is the only diagnostic available.
//!
//! ```no_run
//! use command_executor::{Command, Executor};
//!
//! # futures::executor::block_on(async {
//! let executor = Executor::local("docker");
//! let cmd = Command::builder("docker").arg("version").build();
//! let output = executor.combined_output(&cmd).await?;
//! println!("{}", String::from_utf8_lossy(&output));
//! # Ok::<(), command_executor::Error>(())
//! # }).unwrap();
//! ```

#![warn(missing_docs)]

pub mod backends;
pub mod command;
pub mod error;
pub mod executor;
pub mod launcher;
pub mod process;
#[cfg(any(test, feature = "test-utils"))]
pub mod testing;

pub use backends::LocalLauncher;
pub use command::Command;
pub use error::{Error, Result};
pub use executor::Executor;
pub use launcher::Launcher;
pub use process::{CapturedOutput, ExitStatus};
