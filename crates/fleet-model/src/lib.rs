//! Portable application model: apps, roles, resources, run configuration
//! and the addressing scheme used to refer to submitted jobs.
mod domain;
pub use domain::{
    AppDef, AppId, AppState, AppStatus, NULL_RESOURCE, ReplicaState, ReplicaStatus, Resource,
    RetryPolicy, Role, RoleStatus, SchedulerBackend,
};

mod config;
pub use config::{CfgValue, OptType, RunConfig, RunOpt, RunOpts};

mod error;
pub use error::{ModelError, ModelResult};

mod handle;
pub use handle::{AppHandle, DEFAULT_SESSION, LogTarget, make_app_handle, parse_app_handle};

pub mod components;
pub mod macros;
pub mod named_resources;
