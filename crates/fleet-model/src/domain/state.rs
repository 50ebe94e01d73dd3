use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

#[cfg(feature = "schema")]
use schemars::JsonSchema;

use crate::error::{ModelError, ModelResult};

/// Lifecycle state of a submitted application (or of one replica).
///
/// Transitions are driven by the backend:
/// `Unsubmitted -> Submitted -> Pending -> Running -> {Succeeded | Failed | Cancelled}`.
/// `Unknown` may be reported from any state when the backend cannot tell; it is not terminal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(JsonSchema))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[repr(u8)]
pub enum AppState {
    Unsubmitted = 0,
    Submitted = 1,
    Pending = 2,
    Running = 3,
    Succeeded = 4,
    Failed = 5,
    Cancelled = 6,
    Unknown = 7,
}

/// Replicas share the application state vocabulary.
pub type ReplicaState = AppState;

impl AppState {
    /// All states in ordinal order.
    pub const ALL: [AppState; 8] = [
        AppState::Unsubmitted,
        AppState::Submitted,
        AppState::Pending,
        AppState::Running,
        AppState::Succeeded,
        AppState::Failed,
        AppState::Cancelled,
        AppState::Unknown,
    ];

    /// Returns `true` for `Succeeded`, `Failed` and `Cancelled`.
    #[inline]
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            AppState::Succeeded | AppState::Failed | AppState::Cancelled
        )
    }

    /// Stable numeric ordinal.
    #[inline]
    pub fn ordinal(&self) -> u8 {
        *self as u8
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AppState::Unsubmitted => "UNSUBMITTED",
            AppState::Submitted => "SUBMITTED",
            AppState::Pending => "PENDING",
            AppState::Running => "RUNNING",
            AppState::Succeeded => "SUCCEEDED",
            AppState::Failed => "FAILED",
            AppState::Cancelled => "CANCELLED",
            AppState::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for AppState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.as_str(), self.ordinal())
    }
}

impl FromStr for AppState {
    type Err = ModelError;
    fn from_str(s: &str) -> ModelResult<Self> {
        let norm = s.trim().to_ascii_uppercase();
        AppState::ALL
            .into_iter()
            .find(|st| st.as_str() == norm)
            .ok_or_else(|| ModelError::UnknownAppState(s.to_string()))
    }
}
