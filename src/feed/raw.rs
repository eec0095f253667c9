//! Loosely-typed envelopes for records as the community backend returns them.
//!
//! The backend has gone through several incompatible payload shapes for the
//! same concepts (document-store `_id` vs `id`, `author` vs `userId`, poll
//! options in three different places). Rather than pretend there is one
//! schema, each envelope declares an explicit optional field for every shape
//! we have seen, and the free-form `data` blob stays a [`serde_json::Value`]
//! resolved through the small lookup helpers at the bottom of this module.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;

/// A post record from the feed endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawPost {
    #[serde(default)]
    pub id: Option<String>,
    /// Identity field from the document-store era.
    #[serde(default, rename = "_id")]
    pub legacy_id: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
    /// Older payloads carried the author id under `author`.
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    /// Poll discriminator, current shape.
    #[serde(default)]
    pub is_poll: Option<bool>,
    /// Poll discriminator, older shape (`"type": "poll"`).
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    /// Poll reference when the options live behind a separate endpoint.
    #[serde(default)]
    pub poll_id: Option<String>,
    /// Free-form payload blob. May be a bare string, an object with any
    /// combination of text/title/question/poll/tags/fileId, or absent.
    #[serde(default)]
    pub data: Value,
    #[serde(default)]
    pub reactions_count: Option<i64>,
    #[serde(default)]
    pub comments_count: Option<i64>,
    /// Grouped poll options (current shape).
    #[serde(default)]
    pub options: Option<Vec<RawPollOption>>,
    /// Legacy child records doubling as poll options.
    #[serde(default)]
    pub children: Option<Vec<RawPollOption>>,
    /// Post-level tags; some payload versions put tags inside `data` instead.
    #[serde(default)]
    pub tags: Value,
}

/// A poll option record, from either the grouped list or the legacy children
/// list. The two lists share a shape apart from where the label hides.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawPollOption {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default, rename = "_id")]
    pub legacy_id: Option<String>,
    #[serde(default)]
    pub data: Value,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub question: Option<String>,
    #[serde(default)]
    pub metadata: Value,
    #[serde(default)]
    pub reactions_count: Option<i64>,
    /// Ordering hint; missing means 0.
    #[serde(default)]
    pub position: Option<i64>,
}

/// A comment record from the feed endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawComment {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
    /// Id of the post this comment belongs to.
    #[serde(default)]
    pub ref_id: Option<String>,
    #[serde(default)]
    pub data: Value,
    /// Either a map of reaction-name -> count or a bare scalar total.
    #[serde(default)]
    pub reactions_count: Value,
    #[serde(default)]
    pub created_at: Option<String>,
}

/// A user record from the feed endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawUser {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    /// File reference for the avatar, resolved against the page's files.
    #[serde(default)]
    pub avatar_id: Option<String>,
}

/// A file record from the feed endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawFile {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

impl RawPost {
    /// Effective post identity: `id` preferred, `_id` as fallback.
    /// Empty strings count as absent.
    #[must_use]
    pub fn identity(&self) -> Option<&str> {
        non_empty(self.id.as_deref()).or_else(|| non_empty(self.legacy_id.as_deref()))
    }

    /// Effective author id across both historical fields.
    #[must_use]
    pub fn author_id(&self) -> Option<&str> {
        non_empty(self.user_id.as_deref()).or_else(|| non_empty(self.author.as_deref()))
    }

    /// Whether the backend flagged this post as a poll, in either shape.
    #[must_use]
    pub fn is_poll_flagged(&self) -> bool {
        self.is_poll == Some(true)
            || self
                .kind
                .as_deref()
                .is_some_and(|k| k.eq_ignore_ascii_case("poll"))
    }
}

fn non_empty(s: Option<&str>) -> Option<&str> {
    s.filter(|s| !s.is_empty())
}

/// Parse a backend timestamp. The backend emits RFC 3339; anything else is
/// treated as missing rather than surfaced as an error.
#[must_use]
pub fn parse_timestamp(raw: Option<&str>) -> Option<DateTime<Utc>> {
    raw.and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&Utc))
}

/// Non-empty string at `key` on a JSON object, or `None` for any other shape.
#[must_use]
pub fn str_field<'a>(value: &'a Value, key: &str) -> Option<&'a str> {
    value
        .get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
}

/// First non-empty string found at any of `keys`, in order.
#[must_use]
pub fn first_str<'a>(value: &'a Value, keys: &[&str]) -> Option<&'a str> {
    keys.iter().find_map(|key| str_field(value, key))
}

/// Integer at `key`, accepting both JSON numbers and numeric strings
/// (older payloads stringified their counters).
#[must_use]
pub fn int_field(value: &Value, key: &str) -> Option<i64> {
    match value.get(key)? {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Whether `value` is an object with at least one key.
#[must_use]
pub fn has_keys(value: &Value) -> bool {
    value.as_object().is_some_and(|map| !map.is_empty())
}
