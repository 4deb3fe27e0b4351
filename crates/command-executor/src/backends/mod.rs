//! Launcher implementations for different execution contexts
//!
//! Only local process execution is built in. Tests that must not touch the
//! host can use the scripted launcher in [`crate::testing`] instead, or
//! implement [`Launcher`](crate::Launcher) themselves.

pub mod local;
pub use local::LocalLauncher;
