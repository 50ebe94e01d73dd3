use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

#[cfg(feature = "schema")]
use schemars::JsonSchema;

use crate::{Role, error::ModelResult};

/// A named collection of roles describing one distributed job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(JsonSchema))]
pub struct AppDef {
    pub name: String,
    #[serde(default)]
    pub roles: Vec<Role>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, String>,
}

impl AppDef {
    /// Create an application without roles.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            roles: Vec::new(),
            metadata: BTreeMap::new(),
        }
    }

    pub fn with_role(mut self, role: Role) -> Self {
        self.roles.push(role);
        self
    }

    pub fn with_roles<I: IntoIterator<Item = Role>>(mut self, roles: I) -> Self {
        self.roles.extend(roles);
        self
    }

    pub fn with_metadata<K, V>(mut self, key: K, value: V) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Find a role by name.
    pub fn role(&self, name: &str) -> Option<&Role> {
        self.roles.iter().find(|r| r.name == name)
    }

    /// Names of all roles in declaration order.
    pub fn role_names(&self) -> Vec<String> {
        self.roles.iter().map(|r| r.name.clone()).collect()
    }

    /// Validate every role.
    pub fn validate(&self) -> ModelResult<()> {
        self.roles.iter().try_for_each(Role::validate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_app_has_no_roles() {
        let app = AppDef::new("test_app");
        assert_eq!(app.name, "test_app");
        assert!(app.roles.is_empty());
    }

    #[test]
    fn roles_keep_declaration_order() {
        let app = AppDef::new("test_app")
            .with_role(Role::new("trainer", "img").with_replicas(2))
            .with_role(Role::new("ps", "img"));

        assert_eq!(app.role_names(), vec!["trainer", "ps"]);
        assert_eq!(app.role("trainer").map(|r| r.num_replicas), Some(2));
        assert!(app.role("missing").is_none());
    }

    #[test]
    fn metadata_get_set() {
        let app = AppDef::new("test_app").with_metadata("test_key", "test_value");
        assert_eq!(app.metadata.get("test_key").map(String::as_str), Some("test_value"));
        assert!(app.metadata.get("non_existent").is_none());
    }

    #[test]
    fn validate_reports_bad_role() {
        let app = AppDef::new("bad").with_role(Role::new("w", "img").with_replicas(0));
        assert!(app.validate().is_err());
    }
}
