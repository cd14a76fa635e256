//! Relative "posted at" labels for feed cards.

use chrono::{DateTime, Datelike, Duration, Utc};

/// Label for anything posted within the last two minutes.
pub const JUST_NOW: &str = "just now";

/// Formats `timestamp` relative to `now` at minute resolution.
///
/// Anything newer than two minutes, including timestamps ahead of the local
/// clock, reads "just now". Older posts get a relative span up to a week and
/// a calendar date after that.
pub fn date_label(timestamp: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let elapsed = now.signed_duration_since(timestamp);
    if elapsed < Duration::minutes(2) {
        return JUST_NOW.to_string();
    }

    if elapsed < Duration::hours(1) {
        return plural(elapsed.num_minutes(), "minute");
    }
    if elapsed < Duration::days(1) {
        return plural(elapsed.num_hours(), "hour");
    }
    if elapsed < Duration::days(7) {
        let days = elapsed.num_days();
        if days == 1 {
            return "yesterday".to_string();
        }
        return format!("{days} days ago");
    }

    if timestamp.year() == now.year() {
        timestamp.format("%b %-d").to_string()
    } else {
        timestamp.format("%b %-d, %Y").to_string()
    }
}

fn plural(count: i64, unit: &str) -> String {
    if count == 1 {
        format!("1 {unit} ago")
    } else {
        format!("{count} {unit}s ago")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap()
    }

    #[test]
    fn recent_posts_read_just_now() {
        assert_eq!(date_label(now(), now()), JUST_NOW);
        assert_eq!(
            date_label(now() - Duration::seconds(119), now()),
            JUST_NOW
        );
    }

    #[test]
    fn future_posts_read_just_now() {
        assert_eq!(date_label(now() + Duration::hours(3), now()), JUST_NOW);
    }

    #[test]
    fn minutes_and_hours() {
        assert_eq!(
            date_label(now() - Duration::minutes(2), now()),
            "2 minutes ago"
        );
        assert_eq!(
            date_label(now() - Duration::minutes(59), now()),
            "59 minutes ago"
        );
        assert_eq!(date_label(now() - Duration::minutes(60), now()), "1 hour ago");
        assert_eq!(
            date_label(now() - Duration::hours(23), now()),
            "23 hours ago"
        );
    }

    #[test]
    fn days_within_a_week() {
        assert_eq!(date_label(now() - Duration::hours(30), now()), "yesterday");
        assert_eq!(date_label(now() - Duration::days(6), now()), "6 days ago");
    }

    #[test]
    fn older_posts_show_a_date() {
        let same_year = Utc.with_ymd_and_hms(2024, 3, 5, 9, 0, 0).unwrap();
        assert_eq!(date_label(same_year, now()), "Mar 5");

        let last_year = Utc.with_ymd_and_hms(2023, 12, 24, 9, 0, 0).unwrap();
        assert_eq!(date_label(last_year, now()), "Dec 24, 2023");
    }
}
