use std::fmt;

use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value};

#[cfg(feature = "schema")]
use schemars::JsonSchema;

use crate::{AppState, ReplicaState};

/// Observed state of one replica of a role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(JsonSchema))]
pub struct ReplicaStatus {
    pub id: u32,
    pub role: String,
    pub state: ReplicaState,
    #[serde(default)]
    pub hostname: String,
}

/// Replica statuses grouped by role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(JsonSchema))]
pub struct RoleStatus {
    pub role: String,
    #[serde(default)]
    pub replicas: Vec<ReplicaStatus>,
}

impl RoleStatus {
    pub fn new(role: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            replicas: Vec::new(),
        }
    }
}

/// Point-in-time status of an application as reported by its backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(JsonSchema))]
pub struct AppStatus {
    pub state: AppState,
    #[serde(default)]
    pub msg: String,
    #[serde(default)]
    pub num_restarts: u32,
    #[serde(default)]
    pub roles: Vec<RoleStatus>,
    /// JSON document or raw text describing the failure, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub structured_error_msg: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ui_url: Option<String>,
}

impl AppStatus {
    pub fn new(state: AppState) -> Self {
        Self {
            state,
            msg: String::new(),
            num_restarts: 0,
            roles: Vec::new(),
            structured_error_msg: None,
            ui_url: None,
        }
    }

    #[inline]
    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }

    /// YAML value used by `Display`: keys sorted, state rendered with its ordinal,
    /// a JSON `structured_error_msg` embedded as a nested document.
    fn render_value(&self) -> Value {
        let error_msg = match &self.structured_error_msg {
            None => Value::String("<NONE>".into()),
            Some(raw) => match serde_json::from_str::<serde_json::Value>(raw) {
                Ok(doc) => serde_yaml::to_value(doc).unwrap_or_else(|_| Value::String(raw.clone())),
                Err(_) => Value::String(raw.clone()),
            },
        };
        let roles = serde_yaml::to_value(&self.roles).unwrap_or(Value::Sequence(Vec::new()));

        let mut body = Mapping::new();
        body.insert("msg".into(), Value::String(self.msg.clone()));
        body.insert("num_restarts".into(), Value::from(self.num_restarts));
        body.insert("roles".into(), roles);
        body.insert("state".into(), Value::String(self.state.to_string()));
        body.insert("structured_error_msg".into(), error_msg);
        body.insert(
            "ui_url".into(),
            self.ui_url.clone().map(Value::String).unwrap_or(Value::Null),
        );

        let mut root = Mapping::new();
        root.insert("AppStatus".into(), Value::Mapping(body));
        Value::Mapping(root)
    }
}

impl fmt::Display for AppStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered = serde_yaml::to_string(&self.render_value()).map_err(|_| fmt::Error)?;
        f.write_str(&rendered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn is_terminal_follows_state() {
        for s in AppState::ALL {
            assert_eq!(AppStatus::new(s).is_terminal(), s.is_terminal());
        }
    }

    #[test]
    fn display_renders_defaults() {
        let rendered = AppStatus::new(AppState::Failed).to_string();

        assert!(rendered.starts_with("AppStatus:\n"), "got: {rendered}");
        assert!(rendered.contains("  msg: ''\n"), "got: {rendered}");
        assert!(rendered.contains("  num_restarts: 0\n"), "got: {rendered}");
        assert!(rendered.contains("  roles: []\n"), "got: {rendered}");
        assert!(rendered.contains("  state: FAILED (5)\n"), "got: {rendered}");
        assert!(rendered.contains("  structured_error_msg: <NONE>\n"), "got: {rendered}");
        assert!(rendered.contains("  ui_url: null\n"), "got: {rendered}");
    }

    #[test]
    fn display_embeds_json_error_message() {
        let mut status = AppStatus::new(AppState::Failed);
        status.structured_error_msg = Some(r#"{"message": "test error"}"#.into());

        let rendered = status.to_string();
        assert!(rendered.contains("  structured_error_msg:\n"), "got: {rendered}");
        assert!(rendered.contains("    message: test error\n"), "got: {rendered}");
    }

    #[test]
    fn display_keeps_raw_error_message() {
        let mut status = AppStatus::new(AppState::Failed);
        status.structured_error_msg = Some("oom killed".into());

        let rendered = status.to_string();
        assert!(rendered.contains("structured_error_msg: oom killed"), "got: {rendered}");
    }
}
