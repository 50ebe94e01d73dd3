use std::collections::BTreeMap;

use fleet_model::{AppDef, Resource, Role, RunConfig, macros};
use serde::Serialize;

use crate::error::SimError;

/// Backend-native request of the simulated backend: one task per replica.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimRequest {
    pub app_name: String,
    pub namespace: String,
    pub priority: i64,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub labels: Vec<String>,
    pub auto_complete: bool,
    pub tasks: Vec<SimTask>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimTask {
    pub name: String,
    pub role: String,
    pub replica_id: u32,
    pub image: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entrypoint: Option<String>,
    pub args: Vec<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub env: BTreeMap<String, String>,
    pub resource: Resource,
    pub max_retries: u32,
}

impl SimRequest {
    /// Translate `app` under an already resolved `cfg`.
    ///
    /// `${app_id}` is left in place because the id is only known at submission.
    pub fn build(app: &AppDef, cfg: &RunConfig) -> Self {
        let tasks = app
            .roles
            .iter()
            .flat_map(|role| (0..role.num_replicas).map(move |id| SimTask::build(role, id)))
            .collect();

        Self {
            app_name: app.name.clone(),
            namespace: cfg.get_str("namespace").unwrap_or("default").to_string(),
            priority: cfg.get_int("priority").unwrap_or(0),
            labels: cfg.get_str_list("labels").unwrap_or_default(),
            auto_complete: cfg.get_bool("auto_complete").unwrap_or(false),
            tasks,
        }
    }

    /// Bind `${app_id}` in every task to `app_id`.
    pub fn bind_app_id(&mut self, app_id: &str) {
        let values = macros::Values::new(macros::IMG_ROOT, app_id, macros::REPLICA_ID)
            .with_base_img_root(macros::BASE_IMG_ROOT);
        for task in &mut self.tasks {
            task.args = task.args.iter().map(|a| values.substitute(a)).collect();
            for value in task.env.values_mut() {
                *value = values.substitute(value);
            }
        }
    }

    pub fn render(&self) -> Result<String, SimError> {
        serde_yaml::to_string(self).map_err(|e| SimError::Render(e.to_string()))
    }
}

impl SimTask {
    fn build(role: &Role, replica_id: u32) -> Self {
        let values = macros::Values::new("", macros::APP_ID, replica_id.to_string());
        let role = values.apply(role);
        Self {
            name: format!("{}-{replica_id}", role.name),
            role: role.name,
            replica_id,
            image: role.image,
            entrypoint: role.entrypoint,
            args: role.args,
            env: role.env,
            resource: role.resource,
            max_retries: role.max_retries,
        }
    }

    /// First log line of a freshly started task.
    pub fn launch_line(&self) -> String {
        let program = self.entrypoint.as_deref().unwrap_or(&self.image);
        if self.args.is_empty() {
            format!("launching {program}")
        } else {
            format!("launching {program} {}", self.args.join(" "))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fleet_model::macros::{APP_ID, REPLICA_ID};

    fn app() -> AppDef {
        AppDef::new("trainer").with_role(
            Role::new("worker", "img")
                .with_entrypoint("train.py")
                .with_args(["--rank", REPLICA_ID, "--out", APP_ID])
                .with_env("RUN", APP_ID)
                .with_replicas(2),
        )
    }

    #[test]
    fn one_task_per_replica_with_replica_id_applied() {
        let req = SimRequest::build(&app(), &RunConfig::new());

        assert_eq!(req.tasks.len(), 2);
        assert_eq!(req.tasks[1].name, "worker-1");
        assert_eq!(req.tasks[1].args, vec!["--rank", "1", "--out", APP_ID]);
        assert_eq!(req.namespace, "default");
    }

    #[test]
    fn bind_app_id_fills_remaining_token() {
        let mut req = SimRequest::build(&app(), &RunConfig::new());
        req.bind_app_id("trainer-1f");

        assert_eq!(req.tasks[0].args, vec!["--rank", "0", "--out", "trainer-1f"]);
        assert_eq!(
            req.tasks[0].env.get("RUN").map(String::as_str),
            Some("trainer-1f")
        );
    }

    #[test]
    fn render_is_yaml() {
        let cfg = RunConfig::new().with("namespace", "ml").with("priority", 3i64);
        let rendered = SimRequest::build(&app(), &cfg)
            .render()
            .expect("request should render");

        assert!(rendered.contains("namespace: ml"), "{rendered}");
        assert!(rendered.contains("priority: 3"), "{rendered}");
        assert!(rendered.contains("name: worker-0"), "{rendered}");
    }

    #[test]
    fn launch_line_falls_back_to_image() {
        let req = SimRequest::build(
            &AppDef::new("x").with_role(Role::new("r", "busybox")),
            &RunConfig::new(),
        );
        assert_eq!(req.tasks[0].launch_line(), "launching busybox");
    }
}
