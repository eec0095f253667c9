//! Shared constants used across the engine.

/// User agent string sent with community backend requests.
pub const USER_AGENT: &str = "community-feed-engine/0.1";

/// Content shown when a post payload carries no resolvable text at all.
pub const FALLBACK_CONTENT: &str = "Conteúdo indisponível";

/// Reaction names counted as upvotes, checked in order; the first key present
/// in the reaction map wins.
pub const UPVOTE_KEYS: &[&str] = &["like", "upvote", "👍"];

/// Reaction names counted as downvotes, checked in order.
pub const DOWNVOTE_KEYS: &[&str] = &["dislike", "downvote", "👎"];
