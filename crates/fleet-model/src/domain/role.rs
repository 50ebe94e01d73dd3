use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

#[cfg(feature = "schema")]
use schemars::JsonSchema;

use crate::{
    Resource, RetryPolicy,
    error::{ModelError, ModelResult},
};

/// One replicated unit of work within an [`crate::AppDef`].
///
/// `entrypoint == None` is the MISSING sentinel: the role has not declared
/// what to execute and the backend (or image default) decides.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(JsonSchema))]
#[serde(rename_all = "snake_case")]
pub struct Role {
    pub name: String,
    pub image: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entrypoint: Option<String>,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default)]
    pub env: BTreeMap<String, String>,
    #[serde(default)]
    pub port_map: BTreeMap<String, u16>,
    #[serde(default = "default_replicas")]
    pub num_replicas: u32,
    #[serde(default)]
    pub max_retries: u32,
    #[serde(default)]
    pub retry_policy: RetryPolicy,
    #[serde(default)]
    pub resource: Resource,
}

fn default_replicas() -> u32 {
    1
}

impl Role {
    /// Create a role with all optional fields at their defaults.
    pub fn new(name: impl Into<String>, image: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            image: image.into(),
            base_image: None,
            entrypoint: None,
            args: Vec::new(),
            env: BTreeMap::new(),
            port_map: BTreeMap::new(),
            num_replicas: default_replicas(),
            max_retries: 0,
            retry_policy: RetryPolicy::default(),
            resource: Resource::default(),
        }
    }

    pub fn with_base_image(mut self, base_image: impl Into<String>) -> Self {
        self.base_image = Some(base_image.into());
        self
    }

    pub fn with_entrypoint(mut self, entrypoint: impl Into<String>) -> Self {
        self.entrypoint = Some(entrypoint.into());
        self
    }

    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_env<K, V>(mut self, key: K, value: V) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.env.insert(key.into(), value.into());
        self
    }

    pub fn with_port(mut self, name: impl Into<String>, port: u16) -> Self {
        self.port_map.insert(name.into(), port);
        self
    }

    pub fn with_replicas(mut self, num_replicas: u32) -> Self {
        self.num_replicas = num_replicas;
        self
    }

    pub fn with_retries(mut self, max_retries: u32, retry_policy: RetryPolicy) -> Self {
        self.max_retries = max_retries;
        self.retry_policy = retry_policy;
        self
    }

    pub fn with_resource(mut self, resource: Resource) -> Self {
        self.resource = resource;
        self
    }

    /// Returns `true` if the role has no entrypoint (MISSING).
    pub fn is_entrypoint_missing(&self) -> bool {
        self.entrypoint.is_none()
    }

    /// Check structural invariants.
    ///
    /// Rules:
    /// - `name` is not empty or whitespace-only;
    /// - `num_replicas >= 1`.
    pub fn validate(&self) -> ModelResult<()> {
        if self.name.trim().is_empty() {
            return Err(ModelError::Invalid("role name is empty".into()));
        }
        if self.num_replicas == 0 {
            return Err(ModelError::Invalid(format!(
                "role '{}' must have at least one replica",
                self.name
            )));
        }
        Ok(())
    }
}
