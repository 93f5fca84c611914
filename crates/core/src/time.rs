//! Relative time text ("10 minutes ago").

use chrono::{DateTime, Utc};

/// Describe how long ago `then` was, relative to `now`.
///
/// Future instants and anything under a minute read "Just now".
#[must_use]
pub fn time_ago(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let elapsed = now.signed_duration_since(then);
    let minutes = elapsed.num_minutes();
    let hours = elapsed.num_hours();
    let days = elapsed.num_days();

    match (days, hours, minutes) {
        (_, _, m) if m < 1 => "Just now".to_string(),
        (_, 0, 1) => "1 minute ago".to_string(),
        (_, 0, m) => format!("{m} minutes ago"),
        (0, 1, _) => "1 hour ago".to_string(),
        (0, h, _) => format!("{h} hours ago"),
        (1, _, _) => "Yesterday".to_string(),
        (d, _, _) => format!("{d} days ago"),
    }
}
