mod app;
pub use app::AppDef;

mod resource;
pub use resource::{NULL_RESOURCE, Resource};

mod retry;
pub use retry::RetryPolicy;

mod role;
pub use role::Role;

mod state;
pub use state::{AppState, ReplicaState};

mod status;
pub use status::{AppStatus, ReplicaStatus, RoleStatus};

/// Backend-local identifier of a submitted application.
pub type AppId = String;

/// Name of a scheduler backend (e.g. `"local"`, `"kubernetes"`).
pub type SchedulerBackend = String;
