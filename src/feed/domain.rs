//! Stable domain entities consumed by the UI layer.
//!
//! These are immutable values produced for a single render cycle; nothing in
//! the engine caches them across page or filter changes.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// A normalized community post.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: String,
    /// Empty when the backend omitted both historical author fields.
    pub author_id: String,
    pub content: String,
    pub image: Option<String>,
    pub likes: i64,
    pub comments: Vec<Comment>,
    pub comments_count: i64,
    pub created_at: DateTime<Utc>,
    pub category: Option<String>,
    pub tags: Option<Vec<String>>,
    pub overline: Option<String>,
    pub title: Option<String>,
    pub author_name: Option<String>,
    pub author_avatar: Option<String>,
    pub poll: Option<Poll>,
}

/// A normalized comment attached to a post.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: String,
    pub author_id: String,
    pub content: String,
    pub created_at: Option<DateTime<Utc>>,
    pub author_name: Option<String>,
    pub author_avatar: Option<String>,
    pub reactions_count: Option<i64>,
    pub reactions: Option<Vec<Reaction>>,
}

/// A single reaction entry in a comment's expanded display list.
///
/// The `id` is a display-only artifact (`"{kind}-{index}"`), synthesized so
/// list renderers have a key. It is not a stable entity identity: it must not
/// be persisted or compared across normalization calls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Reaction {
    pub id: String,
    pub kind: String,
}

/// A normalized poll carried by a post.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Poll {
    pub id: String,
    pub question: String,
    pub options: Vec<PollOption>,
    pub total_votes: i64,
    pub ended_at: Option<DateTime<Utc>>,
    pub is_finished: bool,
}

/// One poll option with its vote share.
///
/// Percentages are rounded per option independently, so a poll's percentages
/// may sum to 99 or 101. This mirrors the backend's historical behavior;
/// flagged for product clarification rather than silently corrected here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PollOption {
    pub id: String,
    pub text: String,
    pub votes: i64,
    pub percentage: i64,
}

impl PollOption {
    /// Vote share as an integer percentage: `round(votes / total * 100)`,
    /// or 0 when the poll has no votes.
    #[must_use]
    pub fn percentage_of(votes: i64, total_votes: i64) -> i64 {
        if total_votes > 0 {
            ((votes as f64 / total_votes as f64) * 100.0).round() as i64
        } else {
            0
        }
    }
}
