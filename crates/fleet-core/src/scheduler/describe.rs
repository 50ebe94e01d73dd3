use fleet_model::{AppDef, AppId, AppState, AppStatus, Role, RoleStatus};

/// Result of [`Scheduler::describe`](super::Scheduler::describe).
///
/// Built fresh on every call. A backend that cannot find the job reports
/// [`AppState::Unknown`] with no role data instead of failing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DescribeAppResponse {
    pub app_id: AppId,
    pub state: AppState,
    pub num_restarts: u32,
    pub msg: String,
    pub structured_error_msg: Option<String>,
    pub ui_url: Option<String>,
    pub roles_statuses: Vec<RoleStatus>,
    pub roles: Vec<Role>,
}

impl DescribeAppResponse {
    pub fn new(app_id: impl Into<AppId>, state: AppState) -> Self {
        Self {
            app_id: app_id.into(),
            state,
            num_restarts: 0,
            msg: String::new(),
            structured_error_msg: None,
            ui_url: None,
            roles_statuses: Vec::new(),
            roles: Vec::new(),
        }
    }

    /// Response for a job the backend does not know about.
    #[inline]
    pub fn unknown(app_id: impl Into<AppId>) -> Self {
        Self::new(app_id, AppState::Unknown)
    }

    #[inline]
    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }

    /// `true` when the backend could not find the job at all.
    pub fn is_missing(&self) -> bool {
        self.state == AppState::Unknown && self.roles.is_empty()
    }

    pub fn role(&self, name: &str) -> Option<&Role> {
        self.roles.iter().find(|r| r.name == name)
    }

    pub fn role_names(&self) -> Vec<String> {
        self.roles.iter().map(|r| r.name.clone()).collect()
    }

    /// Rebuild the app definition from the roles the backend reported.
    pub fn app_def(&self) -> AppDef {
        AppDef::new(self.app_id.clone()).with_roles(self.roles.iter().cloned())
    }

    /// Project onto the caller-facing status shape.
    pub fn status(&self) -> AppStatus {
        AppStatus {
            state: self.state,
            msg: self.msg.clone(),
            num_restarts: self.num_restarts,
            roles: self.roles_statuses.clone(),
            structured_error_msg: self.structured_error_msg.clone(),
            ui_url: self.ui_url.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_response_has_no_roles() {
        let resp = DescribeAppResponse::unknown("app-1");
        assert!(resp.is_missing());
        assert!(!resp.is_terminal());
        assert!(resp.role_names().is_empty());
    }

    #[test]
    fn status_carries_state_and_messages() {
        let mut resp = DescribeAppResponse::new("app-1", AppState::Failed);
        resp.msg = "exit code 1".into();
        resp.roles.push(Role::new("trainer", "img"));

        let status = resp.status();
        assert_eq!(status.state, AppState::Failed);
        assert_eq!(status.msg, "exit code 1");
        assert!(status.is_terminal());
        assert!(!resp.is_missing());
        assert_eq!(resp.app_def().role_names(), vec!["trainer"]);
    }
}
