//! Comment normalization and reaction tallying.

use serde_json::Value;

use crate::constants::{DOWNVOTE_KEYS, UPVOTE_KEYS};
use crate::feed::domain::{Comment, Reaction};
use crate::feed::raw::{parse_timestamp, str_field, RawComment, RawFile, RawUser};

/// Upvote/downvote totals plus the expanded display list for a reaction map.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReactionTally {
    pub upvotes: i64,
    pub downvotes: i64,
    /// Display-only: one entry per individual reaction, with synthetic
    /// index-suffixed ids. Never persist or compare these across calls.
    pub expanded: Vec<Reaction>,
}

/// Map a raw comment into the domain, resolving the author against the
/// page's user and file tables. Never fails; every malformed field degrades
/// to its documented fallback.
#[must_use]
pub fn normalize_comment(raw: &RawComment, files: &[RawFile], users: &[RawUser]) -> Comment {
    let author_id = raw.user_id.clone().unwrap_or_default();
    let (author_name, author_avatar) = resolve_author(&author_id, users, files);

    let (reactions_count, reactions) = match &raw.reactions_count {
        Value::Object(_) => {
            let tally = tally_reactions(&raw.reactions_count);
            (Some(tally.upvotes), Some(tally.expanded))
        }
        Value::Number(n) => (n.as_i64(), None),
        _ => (None, None),
    };

    Comment {
        id: raw.id.clone().unwrap_or_default(),
        author_id,
        content: resolve_content(&raw.data),
        created_at: parse_timestamp(raw.created_at.as_deref()),
        author_name,
        author_avatar,
        reactions_count,
        reactions,
    }
}

/// Comment body: `data.text`, else the payload itself when it is a bare
/// string, else the JSON serialization of whatever the payload is.
fn resolve_content(data: &Value) -> String {
    if let Some(text) = str_field(data, "text") {
        return text.to_string();
    }
    if let Some(text) = data.as_str() {
        return text.to_string();
    }
    data.to_string()
}

/// Convert a reaction-name -> count map into totals and a display list.
///
/// `upvotes` takes the first present key of [`UPVOTE_KEYS`], `downvotes` the
/// first of [`DOWNVOTE_KEYS`]; the keys are alternatives for the same
/// concept across backend versions, not independent counters to sum.
#[must_use]
pub fn tally_reactions(counts: &Value) -> ReactionTally {
    let Some(map) = counts.as_object() else {
        return ReactionTally::default();
    };

    let count_of = |keys: &[&str]| {
        keys.iter()
            .find_map(|key| map.get(*key).and_then(Value::as_i64))
            .unwrap_or(0)
    };

    let mut expanded = Vec::new();
    for (kind, value) in map {
        let count = value.as_i64().unwrap_or(0).max(0);
        for index in 0..count {
            expanded.push(Reaction {
                id: format!("{kind}-{index}"),
                kind: kind.clone(),
            });
        }
    }

    ReactionTally {
        upvotes: count_of(UPVOTE_KEYS),
        downvotes: count_of(DOWNVOTE_KEYS),
        expanded,
    }
}

/// Look up a file's URL by id. Files without an id or URL never match.
#[must_use]
pub fn file_url(file_id: &str, files: &[RawFile]) -> Option<String> {
    if file_id.is_empty() {
        return None;
    }
    files
        .iter()
        .find(|f| f.id.as_deref() == Some(file_id))
        .and_then(|f| f.url.clone())
}

/// Resolve an author's display name and avatar URL. The avatar takes a
/// second hop through the file table via the user's avatar reference.
#[must_use]
pub fn resolve_author(
    author_id: &str,
    users: &[RawUser],
    files: &[RawFile],
) -> (Option<String>, Option<String>) {
    if author_id.is_empty() {
        return (None, None);
    }
    let Some(user) = users.iter().find(|u| u.id.as_deref() == Some(author_id)) else {
        return (None, None);
    };
    let avatar = user
        .avatar_id
        .as_deref()
        .and_then(|file_id| file_url(file_id, files));
    (user.name.clone(), avatar)
}
