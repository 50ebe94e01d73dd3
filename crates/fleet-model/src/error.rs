use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("malformed app handle '{handle}': {reason}")]
    MalformedHandle { handle: String, reason: &'static str },

    #[error(
        "{0} is not of the form SCHEDULER://[SESSION_NAME]/APP_ID/ROLE_NAME/[REPLICA_IDS,...]"
    )]
    MalformedLogTarget(String),

    #[error("unknown named resource: {0}")]
    UnknownResource(String),

    #[error("invalid run config: {}", violations.join("; "))]
    InvalidRunConfig { violations: Vec<String> },

    #[error("invalid run option '{name}': {reason}")]
    InvalidOption { name: String, reason: String },

    #[error("unknown retry policy: {0}")]
    UnknownRetryPolicy(String),

    #[error("unknown app state: {0}")]
    UnknownAppState(String),

    #[error("invalid model: {0}")]
    Invalid(String),
}

pub type ModelResult<T> = Result<T, ModelError>;
