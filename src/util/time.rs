//! Time formatting utilities.
//!
//! All formatters take `now` explicitly so callers render against the same
//! injected clock the scheduler decides with.

use chrono::{DateTime, Utc};

/// Format a countdown to a future time.
#[must_use]
pub fn format_countdown(target: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let duration = target.signed_duration_since(now);

    if duration.num_seconds() <= 0 {
        return "now".to_string();
    }

    let hours = duration.num_hours();
    let minutes = duration.num_minutes() % 60;

    if hours > 24 {
        let days = hours / 24;
        format!("in {days} day{}", if days == 1 { "" } else { "s" })
    } else if hours > 0 {
        format!("in {hours}h {minutes}m")
    } else if minutes > 0 {
        format!("in {minutes}m")
    } else {
        let seconds = duration.num_seconds();
        format!("in {seconds}s")
    }
}

/// Format a relative time (past or future).
#[must_use]
pub fn format_relative_time(target: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let duration = now.signed_duration_since(target);

    if duration.num_seconds().abs() < 60 {
        return "just now".to_string();
    }

    let minutes = duration.num_minutes().abs();
    let hours = duration.num_hours().abs();
    let days = duration.num_days().abs();

    let suffix = if duration.num_seconds() > 0 {
        "ago"
    } else {
        "from now"
    };

    if days > 0 {
        format!("{days} day{} {suffix}", if days == 1 { "" } else { "s" })
    } else if hours > 0 {
        format!("{hours} hour{} {suffix}", if hours == 1 { "" } else { "s" })
    } else {
        format!(
            "{minutes} minute{} {suffix}",
            if minutes == 1 { "" } else { "s" }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeDelta;

    fn base() -> DateTime<Utc> {
        "2026-08-15T12:00:00Z".parse().unwrap()
    }

    #[test]
    fn countdown_hours() {
        let now = base();
        let target = now + TimeDelta::hours(3) + TimeDelta::minutes(30);
        assert_eq!(format_countdown(target, now), "in 3h 30m");
    }

    #[test]
    fn countdown_in_the_past_is_now() {
        let now = base();
        assert_eq!(format_countdown(now - TimeDelta::seconds(5), now), "now");
        assert_eq!(format_countdown(now, now), "now");
    }

    #[test]
    fn countdown_days() {
        let now = base();
        assert_eq!(format_countdown(now + TimeDelta::days(3), now), "in 3 days");
    }

    #[test]
    fn relative_time_past_and_future() {
        let now = base();
        assert_eq!(format_relative_time(now - TimeDelta::hours(2), now), "2 hours ago");
        assert_eq!(
            format_relative_time(now + TimeDelta::minutes(5), now),
            "5 minutes from now"
        );
        assert_eq!(format_relative_time(now, now), "just now");
    }
}
