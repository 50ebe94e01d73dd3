use std::{any::Any, fmt};

use fleet_model::{AppDef, RunConfig};

use crate::error::SchedulerError;

/// Backend-native request produced by [`Scheduler::submit_dryrun`](super::Scheduler::submit_dryrun)
/// together with a human-readable rendering of it.
///
/// The request itself is opaque to the core; only the backend that produced it
/// knows its concrete type and can take it back with [`DryRunInfo::into_request`].
pub struct DryRunInfo {
    backend: String,
    rendered: String,
    request: Box<dyn Any + Send + Sync>,
    app: Option<AppDef>,
    cfg: Option<RunConfig>,
}

impl DryRunInfo {
    pub fn new<R>(backend: impl Into<String>, request: R, rendered: impl Into<String>) -> Self
    where
        R: Any + Send + Sync,
    {
        Self {
            backend: backend.into(),
            rendered: rendered.into(),
            request: Box::new(request),
            app: None,
            cfg: None,
        }
    }

    /// Attach the app and the resolved config the request was built from.
    pub fn with_source(mut self, app: AppDef, cfg: RunConfig) -> Self {
        self.app = Some(app);
        self.cfg = Some(cfg);
        self
    }

    #[inline]
    pub fn backend(&self) -> &str {
        &self.backend
    }

    #[inline]
    pub fn rendered(&self) -> &str {
        &self.rendered
    }

    #[inline]
    pub fn app(&self) -> Option<&AppDef> {
        self.app.as_ref()
    }

    #[inline]
    pub fn cfg(&self) -> Option<&RunConfig> {
        self.cfg.as_ref()
    }

    /// Borrow the request as `R`, if that is its concrete type.
    pub fn request<R: Any>(&self) -> Option<&R> {
        self.request.downcast_ref::<R>()
    }

    /// Take ownership of the request as `R`.
    pub fn into_request<R: Any>(self) -> Result<R, SchedulerError> {
        let backend = self.backend;
        self.request
            .downcast::<R>()
            .map(|r| *r)
            .map_err(|_| SchedulerError::ForeignRequest(backend))
    }
}

impl fmt::Debug for DryRunInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DryRunInfo")
            .field("backend", &self.backend)
            .field("app", &self.app.as_ref().map(|a| a.name.as_str()))
            .field("rendered", &self.rendered)
            .finish_non_exhaustive()
    }
}

impl fmt::Display for DryRunInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.rendered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Request {
        tasks: Vec<String>,
    }

    #[test]
    fn request_round_trips_through_any() {
        let info = DryRunInfo::new(
            "fake",
            Request {
                tasks: vec!["a".into()],
            },
            "tasks: [a]",
        );

        assert_eq!(info.to_string(), "tasks: [a]");
        assert!(info.request::<String>().is_none());
        assert_eq!(
            info.request::<Request>().map(|r| r.tasks.len()),
            Some(1)
        );

        let req: Request = info.into_request().expect("request type should match");
        assert_eq!(req.tasks, vec!["a"]);
    }

    #[test]
    fn into_request_rejects_foreign_type() {
        let info = DryRunInfo::new("fake", 42u32, "42");
        match info.into_request::<Request>() {
            Err(SchedulerError::ForeignRequest(backend)) => assert_eq!(backend, "fake"),
            other => panic!("expected ForeignRequest, got {other:?}"),
        }
    }
}
