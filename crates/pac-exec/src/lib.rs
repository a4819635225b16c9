//! # pac-exec
//!
//! Subprocess plumbing for the pac-mcp server: locating external binaries
//! on PATH and running them under a wall-clock timeout with full output
//! capture.
//!
//! The split matters for retry semantics: command outcomes (non-zero exit,
//! timeout) are data, reported through [`ExecutionResult`], while
//! preconditions that make a run impossible (binary missing, spawn failure)
//! are [`ExecError`] values surfaced before or instead of a result.

mod error;
mod resolver;
mod runner;

pub use error::ExecError;
pub use resolver::{resolve, CommandSpec, CLOUD_CLI, SHELL_INTERPRETER};
pub use runner::{execute, ExecutionRequest, ExecutionResult, DEFAULT_TIMEOUT};
