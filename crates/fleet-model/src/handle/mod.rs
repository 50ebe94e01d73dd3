mod app_handle;
pub use app_handle::{AppHandle, make_app_handle, parse_app_handle};

mod log_target;
pub use log_target::{DEFAULT_SESSION, LogTarget};
