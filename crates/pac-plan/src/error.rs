// error.rs — Error types for plan parsing.

use thiserror::Error;

/// Errors raised while parsing a plan document.
///
/// Only structural failure of the whole document is an error; malformed
/// individual items degrade to a textual fallback during summarization so
/// one bad record cannot block review of the rest of the plan.
#[derive(Debug, Error)]
pub enum PlanError {
    /// The top level of the document is not a JSON object.
    #[error("malformed plan document: {0}")]
    MalformedPlan(String),
}
