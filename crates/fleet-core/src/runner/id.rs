use std::sync::atomic::{AtomicU64, Ordering};

/// Process-wide monotonically increasing sequence for app ids.
static APP_SEQ: AtomicU64 = AtomicU64::new(1);

fn next_seq() -> u64 {
    APP_SEQ.fetch_add(1, Ordering::Relaxed)
}

/// Build a backend-local app id: `{app_name}-{seq:x}`.
///
/// Characters that are not valid inside a handle segment are replaced with `-`
/// and the name is lowercased.
pub fn make_app_id(app_name: &str) -> String {
    let name: String = app_name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c.to_ascii_lowercase()
            } else {
                '-'
            }
        })
        .collect();
    let name = if name.is_empty() { "app" } else { name.as_str() };
    format!("{name}-{seq:x}", seq = next_seq())
}
