use std::{fmt, str::FromStr, sync::LazyLock};

use regex::Regex;

use crate::{
    AppHandle,
    error::{ModelError, ModelResult},
};

/// Session used when a log target leaves the session empty.
pub const DEFAULT_SESSION: &str = "default";

static LOG_TARGET_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\w+://[^/.]*/[^/.]+/[^/.]+(/(\d+,?)+)?$").expect("log target pattern is valid")
});

/// Address of one or more replicas of one role:
/// `{backend}://[{session}]/{app_id}/{role}[/{id}[,{id}...]]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogTarget {
    pub backend: String,
    pub session: String,
    pub app_id: String,
    pub role: String,
    /// Explicit replica ids; `None` means every replica of the role.
    pub replica_ids: Option<Vec<u32>>,
}

impl LogTarget {
    /// Validate `identifier` against the log-target grammar and split it.
    ///
    /// Nothing else is consulted, so callers can reject bad input before
    /// touching any backend.
    pub fn parse(identifier: &str) -> ModelResult<Self> {
        if !LOG_TARGET_RE.is_match(identifier) {
            return Err(ModelError::MalformedLogTarget(identifier.to_string()));
        }
        let malformed = || ModelError::MalformedLogTarget(identifier.to_string());

        let (backend, rest) = identifier.split_once("://").ok_or_else(malformed)?;
        let mut parts = rest.split('/');

        let session = match parts.next() {
            Some("") | None => DEFAULT_SESSION.to_string(),
            Some(s) => s.to_string(),
        };
        let app_id = parts.next().ok_or_else(malformed)?.to_string();
        let role = parts.next().ok_or_else(malformed)?.to_string();
        let replica_ids = match parts.next() {
            Some(ids) => Some(
                ids.split(',')
                    .filter(|id| !id.is_empty())
                    .map(|id| id.parse::<u32>().map_err(|_| malformed()))
                    .collect::<ModelResult<Vec<_>>>()?,
            ),
            None => None,
        };

        Ok(Self {
            backend: backend.to_string(),
            session,
            app_id,
            role,
            replica_ids,
        })
    }

    /// Handle of the application this target belongs to.
    pub fn app_handle(&self) -> AppHandle {
        AppHandle::new(&self.backend, &self.session, &self.app_id)
    }
}

impl FromStr for LogTarget {
    type Err = ModelError;
    fn from_str(s: &str) -> ModelResult<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for LogTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}://{}/{}/{}",
            self.backend, self.session, self.app_id, self.role
        )?;
        if let Some(ids) = &self.replica_ids {
            let ids: Vec<String> = ids.iter().map(u32::to_string).collect();
            write!(f, "/{}", ids.join(","))?;
        }
        Ok(())
    }
}
