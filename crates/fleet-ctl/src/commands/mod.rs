pub mod builtins;
pub mod cancel;
pub mod log;
pub mod run;
pub mod runopts;
pub mod status;
