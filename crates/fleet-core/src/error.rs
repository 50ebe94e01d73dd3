use thiserror::Error;

use fleet_model::ModelError;

/// Failure raised by a backend implementation.
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// The backend's runtime dependency cannot be loaded.
    #[error("backend '{backend}' is unavailable: {reason}")]
    Unavailable { backend: String, reason: String },

    /// The app uses a feature the backend cannot satisfy.
    #[error("app '{app}' is not supported by '{backend}': {reason}")]
    Unsupported {
        backend: String,
        app: String,
        reason: String,
    },

    #[error("invalid log filter {0}")]
    InvalidRegex(String),

    #[error("dry-run request does not belong to backend '{0}'")]
    ForeignRequest(String),

    #[error("log stream failed: {0}")]
    Logs(String),

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error("backend error: {0}")]
    Internal(String),
}

/// Failure surfaced by [`Runner`](crate::runner::Runner) and [`LogTailer`](crate::logs::LogTailer).
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("unknown scheduler backend: '{0}'")]
    UnknownBackend(String),

    #[error("backend '{backend}' is unavailable: {reason}")]
    BackendUnavailable { backend: String, reason: String },

    #[error("no role named '{role}' in app '{app}', valid roles: [{}]", .valid.join(", "))]
    UnknownRole {
        role: String,
        app: String,
        valid: Vec<String>,
    },

    #[error("failed to read logs of {role}/{replica_id}: {source}")]
    ReplicaLogs {
        role: String,
        replica_id: u32,
        #[source]
        source: SchedulerError,
    },

    #[error("log worker for {role}/{replica_id} did not finish: {reason}")]
    Worker {
        role: String,
        replica_id: u32,
        reason: String,
    },

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error(transparent)]
    Scheduler(SchedulerError),

    #[error("io error: {0}")]
    Io(String),
}

impl CoreError {
    /// Whether the failure is caused by caller input rather than by a backend.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            CoreError::UnknownBackend(_)
                | CoreError::UnknownRole { .. }
                | CoreError::Model(_)
                | CoreError::Scheduler(SchedulerError::Model(_))
                | CoreError::Scheduler(SchedulerError::Unsupported { .. })
                | CoreError::Scheduler(SchedulerError::InvalidRegex(_))
        )
    }
}

impl From<SchedulerError> for CoreError {
    fn from(e: SchedulerError) -> Self {
        match e {
            SchedulerError::Unavailable { backend, reason } => {
                CoreError::BackendUnavailable { backend, reason }
            }
            other => CoreError::Scheduler(other),
        }
    }
}

impl From<std::io::Error> for CoreError {
    fn from(e: std::io::Error) -> Self {
        CoreError::Io(e.to_string())
    }
}

pub type CoreResult<T> = Result<T, CoreError>;
