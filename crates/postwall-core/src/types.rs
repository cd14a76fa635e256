//! Core types for the Postwall feed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use uuid::Uuid;

/// Document field holding the post body.
pub const FIELD_TEXT: &str = "text";
/// Document field holding the post instant.
pub const FIELD_DATE_POSTED: &str = "date_posted";
/// Document field holding the author's display name.
pub const FIELD_AUTHOR_NAME: &str = "author_name";
/// Document field holding the author's avatar URL.
pub const FIELD_AUTHOR_AVATAR_URL: &str = "author_avatar_url";

/// Field map of a document as stored remotely.
pub type RecordFields = serde_json::Map<String, serde_json::Value>;

/// Unique identifier for a remote document.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(pub String);

impl DocumentId {
    /// Creates a new random document ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Returns the document ID as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for DocumentId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for DocumentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One document exactly as delivered by the remote store.
///
/// Nothing about the field contents is guaranteed; mapping into a
/// [`FeedRecord`] substitutes defaults for anything missing or malformed.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RawRecord {
    pub id: DocumentId,
    pub fields: RecordFields,
}

impl RawRecord {
    /// Creates a raw record with a fresh document ID.
    pub fn new(fields: RecordFields) -> Self {
        Self {
            id: DocumentId::new(),
            fields,
        }
    }

    /// Returns a string field, or None if absent or not a string.
    pub fn string_field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).and_then(|value| value.as_str())
    }

    /// Returns an instant field.
    ///
    /// Accepts RFC 3339 strings and integer milliseconds since the Unix epoch.
    pub fn instant_field(&self, name: &str) -> Option<DateTime<Utc>> {
        match self.fields.get(name)? {
            serde_json::Value::String(raw) => DateTime::parse_from_rfc3339(raw)
                .ok()
                .map(|parsed| parsed.with_timezone(&Utc)),
            serde_json::Value::Number(number) => number
                .as_i64()
                .and_then(DateTime::<Utc>::from_timestamp_millis),
            _ => None,
        }
    }
}

/// A post as shown in the feed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedRecord {
    pub text: String,
    pub timestamp: DateTime<Utc>,
    pub author_name: String,
    pub author_avatar_ref: String,
}

impl FeedRecord {
    /// Orders two records newest first.
    ///
    /// Equal timestamps compare equal so a stable sort keeps arrival order.
    pub fn newest_first(a: &FeedRecord, b: &FeedRecord) -> Ordering {
        b.timestamp.cmp(&a.timestamp)
    }

    /// Human label for when this record was posted, relative to `now`.
    pub fn date_label(&self, now: DateTime<Utc>) -> String {
        crate::date_label::date_label(self.timestamp, now)
    }
}

/// The authenticated user, as reported by the auth collaborator.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub uid: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub photo_url: Option<String>,
}

impl Identity {
    /// Creates an identity with only a user ID.
    pub fn new(uid: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            display_name: None,
            photo_url: None,
        }
    }

    /// Sets the display name.
    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    /// Sets the photo URL.
    pub fn with_photo_url(mut self, url: impl Into<String>) -> Self {
        self.photo_url = Some(url.into());
        self
    }

    /// Display name used as a post's author, empty when unknown.
    pub fn author_name(&self) -> &str {
        self.display_name.as_deref().unwrap_or_default()
    }
}

/// Consolidated state published to the rendering layer.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum UiState {
    /// No data yet.
    #[default]
    Loading,
    /// Nobody is signed in; nothing is subscribed.
    NeedsAuthentication,
    /// Posts newest first, plus the signed-in user's avatar.
    Loaded {
        posts: Vec<FeedRecord>,
        avatar_ref: String,
    },
}

impl UiState {
    /// Returns true while waiting for the first snapshot.
    pub fn is_loading(&self) -> bool {
        matches!(self, UiState::Loading)
    }

    /// Returns true if the screen should hand over to sign-in.
    pub fn needs_authentication(&self) -> bool {
        matches!(self, UiState::NeedsAuthentication)
    }

    /// Returns the posts if loaded.
    pub fn posts(&self) -> Option<&[FeedRecord]> {
        match self {
            UiState::Loaded { posts, .. } => Some(posts),
            UiState::Loading | UiState::NeedsAuthentication => None,
        }
    }

    /// Returns the avatar reference if loaded.
    pub fn avatar_ref(&self) -> Option<&str> {
        match self {
            UiState::Loaded { avatar_ref, .. } => Some(avatar_ref),
            UiState::Loading | UiState::NeedsAuthentication => None,
        }
    }

    /// Short label for logging.
    pub fn as_str(&self) -> &'static str {
        match self {
            UiState::Loading => "loading",
            UiState::NeedsAuthentication => "needs_authentication",
            UiState::Loaded { .. } => "loaded",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn raw(fields: serde_json::Value) -> RawRecord {
        match fields {
            serde_json::Value::Object(map) => RawRecord::new(map),
            other => panic!("expected object, got {other}"),
        }
    }

    #[test]
    fn instant_field_accepts_rfc3339_and_millis() {
        let record = raw(json!({
            "a": "2024-03-05T10:00:00Z",
            "b": 1_709_632_800_000_i64,
        }));
        let expected = Utc.with_ymd_and_hms(2024, 3, 5, 10, 0, 0).unwrap();
        assert_eq!(record.instant_field("a"), Some(expected));
        assert_eq!(record.instant_field("b"), Some(expected));
    }

    #[test]
    fn instant_field_rejects_garbage() {
        let record = raw(json!({ "a": "yesterday-ish", "b": true }));
        assert_eq!(record.instant_field("a"), None);
        assert_eq!(record.instant_field("b"), None);
        assert_eq!(record.instant_field("missing"), None);
    }

    #[test]
    fn string_field_ignores_non_strings() {
        let record = raw(json!({ "text": 42 }));
        assert_eq!(record.string_field("text"), None);
    }

    #[test]
    fn identity_author_name_defaults_to_empty() {
        assert_eq!(Identity::new("u1").author_name(), "");
        assert_eq!(
            Identity::new("u1").with_display_name("Ada").author_name(),
            "Ada"
        );
    }

    #[test]
    fn ui_state_defaults_to_loading() {
        let state = UiState::default();
        assert!(state.is_loading());
        assert!(state.posts().is_none());
    }

    #[test]
    fn ui_state_serializes_with_kind_tag() {
        let json = serde_json::to_value(UiState::NeedsAuthentication).unwrap();
        assert_eq!(json, json!({ "kind": "needs_authentication" }));
    }
}
