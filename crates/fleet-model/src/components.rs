//! Ready-to-use application factories that run well-known binaries.
//!
//! Mostly useful as smoke tests for a backend or as glue between workflow stages.
use crate::{AppDef, Role};

/// Names of the built-in components, in listing order.
pub const BUILTINS: [&str; 3] = ["echo", "touch", "sh"];

/// Echo `msg` to stdout (runs `/bin/echo`).
pub fn echo(msg: &str, image: &str, num_replicas: u32) -> AppDef {
    AppDef::new("echo").with_role(
        Role::new("echo", image)
            .with_entrypoint("/bin/echo")
            .with_args([msg])
            .with_replicas(num_replicas),
    )
}

/// Create `file` (runs `/bin/touch`).
pub fn touch(file: &str) -> AppDef {
    AppDef::new("touch").with_role(
        Role::new("touch", "/tmp")
            .with_entrypoint("/bin/touch")
            .with_args([file])
            .with_replicas(1),
    )
}

/// Run `args` through `/bin/sh -c`, quoting each argument.
pub fn sh<S: AsRef<str>>(args: &[S], image: &str, num_replicas: u32) -> AppDef {
    let script: Vec<String> = args.iter().map(|a| shell_quote(a.as_ref())).collect();
    AppDef::new("sh").with_role(
        Role::new("sh", image)
            .with_entrypoint("/bin/sh")
            .with_args(["-c".to_string(), script.join(" ")])
            .with_replicas(num_replicas),
    )
}

fn shell_quote(arg: &str) -> String {
    let safe = !arg.is_empty()
        && arg
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "@%+=:,./-_".contains(c));
    if safe {
        arg.to_string()
    } else {
        format!("'{}'", arg.replace('\'', r#"'"'"'"#))
    }
}
