use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::{ModelError, ModelResult};

/// Parsed form of an app handle: `{backend}://{session}/{app_id}`.
///
/// The handle is created once at submission time and is the only key used
/// for later describe / cancel / log calls.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AppHandle {
    pub backend: String,
    pub session: String,
    pub app_id: String,
}

impl AppHandle {
    pub fn new(
        backend: impl Into<String>,
        session: impl Into<String>,
        app_id: impl Into<String>,
    ) -> Self {
        Self {
            backend: backend.into(),
            session: session.into(),
            app_id: app_id.into(),
        }
    }
}

/// Format `{backend}://{session}/{app_id}`.
pub fn make_app_handle(scheduler_backend: &str, session_name: &str, app_id: &str) -> String {
    format!("{scheduler_backend}://{session_name}/{app_id}")
}

/// Parse a handle into `(backend, session, app_id)`.
///
/// The scheme, the session (netloc) and the first path segment must all be non-empty.
/// Path segments after the app id are ignored.
pub fn parse_app_handle(handle: &str) -> ModelResult<(String, String, String)> {
    let malformed = |reason| ModelError::MalformedHandle {
        handle: handle.to_string(),
        reason,
    };

    let (scheme, rest) = handle
        .split_once("://")
        .ok_or_else(|| malformed("missing scheduler backend"))?;
    if scheme.is_empty() {
        return Err(malformed("missing scheduler backend"));
    }

    let (session, path) = match rest.split_once('/') {
        Some((session, path)) => (session, path),
        None => (rest, ""),
    };
    if session.is_empty() {
        return Err(malformed("missing session"));
    }

    let app_id = path.split('/').next().unwrap_or_default();
    if app_id.is_empty() {
        return Err(malformed("missing app_id"));
    }

    Ok((scheme.to_string(), session.to_string(), app_id.to_string()))
}

impl FromStr for AppHandle {
    type Err = ModelError;
    fn from_str(s: &str) -> ModelResult<Self> {
        let (backend, session, app_id) = parse_app_handle(s)?;
        Ok(Self {
            backend,
            session,
            app_id,
        })
    }
}

impl TryFrom<String> for AppHandle {
    type Error = ModelError;
    fn try_from(s: String) -> ModelResult<Self> {
        s.parse()
    }
}

impl From<AppHandle> for String {
    fn from(h: AppHandle) -> Self {
        h.to_string()
    }
}

impl fmt::Display for AppHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&make_app_handle(&self.backend, &self.session, &self.app_id))
    }
}
