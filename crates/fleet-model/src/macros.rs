//! Macro tokens substituted into role `args` and `env` values at submission time.
//!
//! Substitution is a literal replacement of the recognized tokens below;
//! anything else that merely looks like a token is left as-is.
use crate::Role;

/// Root directory of the role's image once materialized on the host.
pub const IMG_ROOT: &str = "${img_root}";
/// Root directory of the role's base image.
pub const BASE_IMG_ROOT: &str = "${base_img_root}";
/// Backend-assigned application id.
pub const APP_ID: &str = "${app_id}";
/// Index of the replica within its role.
pub const REPLICA_ID: &str = "${replica_id}";

/// Concrete values for every macro token.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Values {
    pub img_root: String,
    pub app_id: String,
    pub replica_id: String,
    pub base_img_root: String,
}

impl Values {
    pub fn new(
        img_root: impl Into<String>,
        app_id: impl Into<String>,
        replica_id: impl Into<String>,
    ) -> Self {
        Self {
            img_root: img_root.into(),
            app_id: app_id.into(),
            replica_id: replica_id.into(),
            base_img_root: String::new(),
        }
    }

    pub fn with_base_img_root(mut self, base_img_root: impl Into<String>) -> Self {
        self.base_img_root = base_img_root.into();
        self
    }

    fn pairs(&self) -> [(&'static str, &str); 4] {
        [
            (IMG_ROOT, &self.img_root),
            (BASE_IMG_ROOT, &self.base_img_root),
            (APP_ID, &self.app_id),
            (REPLICA_ID, &self.replica_id),
        ]
    }

    /// Replace every recognized token in `s` in a single left-to-right pass.
    ///
    /// Substituted values are never rescanned.
    pub fn substitute(&self, s: &str) -> String {
        let pairs = self.pairs();
        let mut out = String::with_capacity(s.len());
        let mut rest = s;

        while let Some(pos) = rest.find("${") {
            out.push_str(&rest[..pos]);
            let tail = &rest[pos..];
            match pairs.iter().find(|(token, _)| tail.starts_with(token)) {
                Some((token, value)) => {
                    out.push_str(value);
                    rest = &tail[token.len()..];
                }
                None => {
                    out.push_str("${");
                    rest = &tail[2..];
                }
            }
        }
        out.push_str(rest);
        out
    }

    /// Return a copy of `role` with macros applied to every arg and every env value.
    ///
    /// Env keys and all other role fields are copied unchanged.
    pub fn apply(&self, role: &Role) -> Role {
        let mut out = role.clone();
        out.args = role.args.iter().map(|a| self.substitute(a)).collect();
        out.env = role
            .env
            .iter()
            .map(|(k, v)| (k.clone(), self.substitute(v)))
            .collect();
        out
    }
}
