use thiserror::Error;

use fleet_core::error::SchedulerError;

#[derive(Debug, Error)]
pub enum SimError {
    #[error("unknown app: {0}")]
    UnknownApp(String),

    #[error("app '{app_id}' has no replica {role}/{replica_id}")]
    UnknownReplica {
        app_id: String,
        role: String,
        replica_id: u32,
    },

    #[error("failed to render request: {0}")]
    Render(String),
}

impl From<SimError> for SchedulerError {
    fn from(e: SimError) -> Self {
        match e {
            e @ SimError::UnknownReplica { .. } => SchedulerError::Logs(e.to_string()),
            other => SchedulerError::Internal(other.to_string()),
        }
    }
}
