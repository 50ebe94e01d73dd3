mod run_config;
pub use run_config::RunConfig;

mod runopts;
pub use runopts::{RunOpt, RunOpts};

mod value;
pub use value::{CfgValue, OptType};
