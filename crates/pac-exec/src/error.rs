// error.rs — Error types for subprocess execution.

use thiserror::Error;

/// Errors that make a command run impossible.
///
/// A command that runs and fails is *not* an error — see
/// [`ExecutionResult`](crate::ExecutionResult).
#[derive(Debug, Error)]
pub enum ExecError {
    /// None of the candidate executables for a command were found on PATH.
    /// Retrying cannot succeed until the binary is installed, so this is
    /// reported immediately with a remediation hint.
    #[error("{name} not found on PATH. {hint}")]
    ToolNotFound {
        name: &'static str,
        hint: &'static str,
    },

    /// The process could not be spawned (bad path, permissions, ...).
    #[error("failed to launch {program}: {source}")]
    Launch {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// An I/O operation on the child's pipes failed mid-run.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
