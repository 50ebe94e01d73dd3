use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

#[cfg(feature = "schema")]
use schemars::JsonSchema;

/// Compute footprint of a single role replica.
///
/// `capabilities` carries free-form, backend-interpreted requirements
/// (e.g. instance type, accelerator model).
#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(JsonSchema))]
pub struct Resource {
    pub cpu: u32,
    pub gpu: u32,
    #[serde(rename = "memMB")]
    pub mem_mb: u64,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub capabilities: BTreeMap<String, String>,
}

/// The "unspecified" resource: the backend decides what to allocate.
pub const NULL_RESOURCE: Resource = Resource {
    cpu: 0,
    gpu: 0,
    mem_mb: 0,
    capabilities: BTreeMap::new(),
};

impl Resource {
    /// Create a resource without capabilities.
    pub fn new(cpu: u32, gpu: u32, mem_mb: u64) -> Self {
        Self {
            cpu,
            gpu,
            mem_mb,
            capabilities: BTreeMap::new(),
        }
    }

    /// Builder-style helper that adds (or replaces) a single capability.
    pub fn with_capability<K, V>(mut self, key: K, value: V) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.capabilities.insert(key.into(), value.into());
        self
    }

    /// Returns `true` if this is the null resource.
    pub fn is_null(&self) -> bool {
        *self == NULL_RESOURCE
    }

    /// Return a copy of `self` with `overrides` applied on top of its capabilities.
    ///
    /// `cpu`, `gpu` and `mem_mb` are preserved. `self` is left untouched.
    pub fn copy<I, K, V>(&self, overrides: I) -> Resource
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut capabilities = self.capabilities.clone();
        for (k, v) in overrides {
            capabilities.insert(k.into(), v.into());
        }
        Resource {
            cpu: self.cpu,
            gpu: self.gpu,
            mem_mb: self.mem_mb,
            capabilities,
        }
    }
}
