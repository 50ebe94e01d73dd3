use futures::{StreamExt, future, stream::BoxStream};
use regex::Regex;
use time::OffsetDateTime;

use crate::error::SchedulerError;

/// Lazy, single-pass sequence of log lines for one replica, in source order.
pub type LogStream = BoxStream<'static, Result<String, SchedulerError>>;

/// Parameters of a [`Scheduler::log_iter`](super::Scheduler::log_iter) call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogQuery {
    /// Lines must match this pattern in full.
    pub regex: Option<String>,
    pub since: Option<OffsetDateTime>,
    pub until: Option<OffsetDateTime>,
    /// Keep yielding new lines until the source closes.
    pub should_tail: bool,
}

impl LogQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_regex(mut self, regex: Option<&str>) -> Self {
        self.regex = regex.map(str::to_string);
        self
    }

    pub fn since(mut self, at: OffsetDateTime) -> Self {
        self.since = Some(at);
        self
    }

    pub fn until(mut self, at: OffsetDateTime) -> Self {
        self.until = Some(at);
        self
    }

    pub fn tail(mut self, should_tail: bool) -> Self {
        self.should_tail = should_tail;
        self
    }

    /// Whether a line stamped `at` falls inside `[since, until)`.
    pub fn in_window(&self, at: OffsetDateTime) -> bool {
        self.since.is_none_or(|s| at >= s) && self.until.is_none_or(|u| at < u)
    }
}

/// Compile `pattern` so that it only accepts whole lines.
pub fn line_filter(pattern: &str) -> Result<Regex, SchedulerError> {
    Regex::new(&format!("^(?:{pattern})$"))
        .map_err(|e| SchedulerError::InvalidRegex(format!("{pattern}: {e}")))
}

/// Keep only the lines of `lines` that fully match `pattern`.
///
/// Errors are passed through untouched. `None` returns the stream as-is.
pub fn filter_regex(pattern: Option<&str>, lines: LogStream) -> Result<LogStream, SchedulerError> {
    let Some(pattern) = pattern else {
        return Ok(lines);
    };
    let re = line_filter(pattern)?;

    Ok(lines
        .filter(move |item| {
            future::ready(match item {
                Ok(line) => re.is_match(line.trim_end_matches(['\r', '\n'])),
                Err(_) => true,
            })
        })
        .boxed())
}
