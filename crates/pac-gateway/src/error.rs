// error.rs — Error types for the MCP gateway.

use thiserror::Error;

/// Errors that can occur during gateway operations.
///
/// These are domain failures: tool handlers render them into the JSON
/// `error` payload callers depend on, rather than aborting the MCP call.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// One or more required settings are missing or invalid. Carries the
    /// full list so everything can be fixed in one round trip.
    #[error("invalid configuration: {}", .0.join("; "))]
    Configuration(Vec<String>),

    /// An expected artifact is absent; names the action that produces it.
    #[error("no {artifact} found in {folder}. Run {prerequisite} first")]
    MissingArtifact {
        artifact: &'static str,
        folder: String,
        prerequisite: &'static str,
    },

    /// A caller-supplied string field did not parse as JSON.
    #[error("invalid JSON in {field}: {source}")]
    InvalidJson {
        field: &'static str,
        #[source]
        source: serde_json::Error,
    },

    /// The requested definition type is not one of the known categories.
    #[error("unknown definition type: {0}")]
    UnknownDefinitionType(String),

    /// Binary resolution or process launch failed.
    #[error(transparent)]
    Exec(#[from] pac_exec::ExecError),

    /// The plan document could not be parsed.
    #[error(transparent)]
    Plan(#[from] pac_plan::PlanError),

    /// An I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
