//! Post normalization: one raw post plus its page's lookup tables in, one
//! domain post (or nothing) out.

use serde_json::Value;
use tracing::warn;

use crate::client::PollDetailFetcher;
use crate::constants::FALLBACK_CONTENT;
use crate::feed::comment::{file_url, normalize_comment, resolve_author};
use crate::feed::domain::{Comment, Post};
use crate::feed::poll::resolve_poll;
use crate::feed::raw::{has_keys, parse_timestamp, str_field, RawComment, RawFile, RawPost, RawUser};

/// Map a raw post into the domain.
///
/// Returns `None` for unrecoverable records (no identity in either field, or
/// no valid `createdAt`), logged at warn level so a bad record never takes
/// the rest of the feed down with it. Every other malformed field degrades
/// to a fallback. Posts in a page share no mutable state, so callers may
/// normalize them concurrently.
pub async fn normalize_post(
    raw: &RawPost,
    files: &[RawFile],
    users: &[RawUser],
    comments: &[RawComment],
    poll_fetcher: &dyn PollDetailFetcher,
) -> Option<Post> {
    let Some(id) = raw.identity() else {
        warn!("Dropping post without id in either identity field");
        return None;
    };
    let Some(created_at) = parse_timestamp(raw.created_at.as_deref()) else {
        warn!(post_id = %id, "Dropping post without a valid createdAt");
        return None;
    };

    let author_id = raw.author_id().unwrap_or_default().to_string();
    let (author_name, author_avatar) = resolve_author(&author_id, users, files);

    let post_comments = attach_comments(raw, comments, files, users);
    let comments_count = raw
        .comments_count
        .unwrap_or_else(|| post_comments.len() as i64);

    let poll = if raw.is_poll_flagged() {
        resolve_poll(raw, poll_fetcher).await
    } else {
        None
    };

    Some(Post {
        id: id.to_string(),
        author_id,
        content: resolve_content(&raw.data),
        image: str_field(&raw.data, "fileId").and_then(|file_id| file_url(file_id, files)),
        likes: raw.reactions_count.unwrap_or(0),
        comments: post_comments,
        comments_count,
        created_at,
        category: str_field(&raw.data, "category").map(ToString::to_string),
        tags: resolve_tags(raw),
        overline: str_field(&raw.data, "overline").map(ToString::to_string),
        title: str_field(&raw.data, "title").map(ToString::to_string),
        author_name,
        author_avatar,
        poll,
    })
}

/// Post body through the payload's historical shapes: a bare string is used
/// directly, then `text`, then `title`, then the JSON serialization of a
/// non-empty payload object, then a fixed placeholder.
fn resolve_content(data: &Value) -> String {
    if let Some(text) = data.as_str() {
        return text.to_string();
    }
    if let Some(text) = str_field(data, "text") {
        return text.to_string();
    }
    if let Some(title) = str_field(data, "title") {
        return title.to_string();
    }
    if has_keys(data) {
        return data.to_string();
    }
    FALLBACK_CONTENT.to_string()
}

/// Comments belonging to this post, matched against either identity field,
/// in the order the backend returned them.
fn attach_comments(
    raw: &RawPost,
    comments: &[RawComment],
    files: &[RawFile],
    users: &[RawUser],
) -> Vec<Comment> {
    comments
        .iter()
        .filter(|comment| {
            comment.ref_id.as_deref().is_some_and(|ref_id| {
                raw.id.as_deref() == Some(ref_id) || raw.legacy_id.as_deref() == Some(ref_id)
            })
        })
        .map(|comment| normalize_comment(comment, files, users))
        .collect()
}

/// Tags from the post-level field or the payload, whichever is populated.
/// The backend has emitted tags as an array, a scalar string, and an object
/// of values; all three normalize to a flat list. A tag equal to the literal
/// word "tags" (any case) is corrupt metadata from an old serializer bug and
/// is discarded.
fn resolve_tags(raw: &RawPost) -> Option<Vec<String>> {
    let source = if raw.tags.is_null() {
        raw.data.get("tags")?
    } else {
        &raw.tags
    };

    let collected: Vec<String> = match source {
        Value::Array(items) => items
            .iter()
            .filter_map(Value::as_str)
            .map(ToString::to_string)
            .collect(),
        Value::String(tag) => vec![tag.clone()],
        Value::Object(map) => map
            .values()
            .filter_map(Value::as_str)
            .map(ToString::to_string)
            .collect(),
        _ => Vec::new(),
    };

    let tags: Vec<String> = collected
        .into_iter()
        .filter(|tag| !tag.is_empty() && !tag.eq_ignore_ascii_case("tags"))
        .collect();

    if tags.is_empty() {
        None
    } else {
        Some(tags)
    }
}
