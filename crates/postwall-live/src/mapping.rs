//! Raw document to feed record mapping.

use chrono::{DateTime, Utc};
use postwall_core::{
    FeedRecord, RawRecord, FIELD_AUTHOR_AVATAR_URL, FIELD_AUTHOR_NAME, FIELD_DATE_POSTED,
    FIELD_TEXT,
};
use tracing::debug;

/// Maps one document, defaulting missing or malformed fields.
///
/// Strings default to empty and the timestamp defaults to `now`.
pub fn map_record(raw: &RawRecord, now: DateTime<Utc>) -> FeedRecord {
    let timestamp = raw.instant_field(FIELD_DATE_POSTED).unwrap_or_else(|| {
        debug!(document_id = %raw.id, "document has no usable date_posted, using now");
        now
    });

    FeedRecord {
        text: raw.string_field(FIELD_TEXT).unwrap_or_default().to_string(),
        timestamp,
        author_name: raw
            .string_field(FIELD_AUTHOR_NAME)
            .unwrap_or_default()
            .to_string(),
        author_avatar_ref: raw
            .string_field(FIELD_AUTHOR_AVATAR_URL)
            .unwrap_or_default()
            .to_string(),
    }
}

/// Maps a snapshot and sorts it newest first.
///
/// The sort is stable, so documents with equal timestamps keep the order
/// the store delivered them in.
pub fn map_snapshot(raw: &[RawRecord], now: DateTime<Utc>) -> Vec<FeedRecord> {
    let mut posts: Vec<FeedRecord> = raw.iter().map(|record| map_record(record, now)).collect();
    posts.sort_by(FeedRecord::newest_first);
    posts
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use serde_json::json;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap()
    }

    fn raw(fields: serde_json::Value) -> RawRecord {
        match fields {
            serde_json::Value::Object(map) => RawRecord::new(map),
            other => panic!("expected object, got {other}"),
        }
    }

    #[test]
    fn maps_all_fields() {
        let record = map_record(
            &raw(json!({
                "text": "hello",
                "date_posted": "2024-06-15T11:00:00Z",
                "author_name": "Ada",
                "author_avatar_url": "https://img.example/ada",
            })),
            now(),
        );

        assert_eq!(record.text, "hello");
        assert_eq!(record.timestamp, now() - Duration::hours(1));
        assert_eq!(record.author_name, "Ada");
        assert_eq!(record.author_avatar_ref, "https://img.example/ada");
    }

    #[test]
    fn missing_fields_get_defaults() {
        let record = map_record(&raw(json!({})), now());
        assert_eq!(record.text, "");
        assert_eq!(record.timestamp, now());
        assert_eq!(record.author_name, "");
        assert_eq!(record.author_avatar_ref, "");
    }

    #[test]
    fn one_bad_record_does_not_spoil_the_snapshot() {
        let posts = map_snapshot(
            &[
                raw(json!({ "text": "good", "date_posted": "2024-06-15T10:00:00Z" })),
                raw(json!({ "text": 7, "date_posted": { "seconds": 1 } })),
            ],
            now(),
        );

        assert_eq!(posts.len(), 2);
        // The malformed record defaults to `now`, which is the newest.
        assert_eq!(posts[0].text, "");
        assert_eq!(posts[0].timestamp, now());
        assert_eq!(posts[1].text, "good");
    }

    #[test]
    fn sorts_newest_first_regardless_of_input_order() {
        let posts = map_snapshot(
            &[
                raw(json!({ "text": "t1", "date_posted": "2024-06-15T09:00:00Z" })),
                raw(json!({ "text": "t3", "date_posted": "2024-06-15T11:00:00Z" })),
                raw(json!({ "text": "t2", "date_posted": "2024-06-15T10:00:00Z" })),
            ],
            now(),
        );

        let texts: Vec<&str> = posts.iter().map(|p| p.text.as_str()).collect();
        assert_eq!(texts, vec!["t3", "t2", "t1"]);
    }

    #[test]
    fn equal_timestamps_keep_arrival_order() {
        let posts = map_snapshot(
            &[
                raw(json!({ "text": "first", "date_posted": "2024-06-15T10:00:00Z" })),
                raw(json!({ "text": "newer", "date_posted": "2024-06-15T11:00:00Z" })),
                raw(json!({ "text": "second", "date_posted": "2024-06-15T10:00:00Z" })),
            ],
            now(),
        );

        let texts: Vec<&str> = posts.iter().map(|p| p.text.as_str()).collect();
        assert_eq!(texts, vec!["newer", "first", "second"]);
    }
}
