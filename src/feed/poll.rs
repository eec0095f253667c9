//! Poll resolution for poll-flagged posts.
//!
//! A poll's options have lived in three places across backend versions:
//! behind the poll-detail endpoint, embedded in the payload's `poll` object,
//! or as grouped/legacy child records on the post itself. Resolution walks a
//! fixed precedence chain, first satisfied tier wins, and a failure at any
//! tier falls through instead of failing the post.

use serde_json::Value;
use tracing::{debug, warn};

use crate::client::{PollDetail, PollDetailFetcher};
use crate::feed::domain::{Poll, PollOption};
use crate::feed::raw::{
    first_str, has_keys, int_field, parse_timestamp, str_field, RawPollOption, RawPost,
};

/// Resolve a poll from a poll-flagged post, or `None` when no tier of the
/// precedence chain is satisfied (the post then renders as plain content).
///
/// The remote fetch in the first tier is the engine's only suspension point;
/// its rejection is absorbed here and never propagates to the caller.
pub async fn resolve_poll(raw: &RawPost, fetcher: &dyn PollDetailFetcher) -> Option<Poll> {
    let fallback_id = raw.identity().unwrap_or_default();
    let poll_id = extract_poll_id(raw);

    // Tier 1: remote detail, only when nothing local could answer.
    if let Some(id) = &poll_id {
        if !has_local_options(raw) {
            match fetcher.fetch_poll(id).await {
                Ok(detail) => {
                    if let Some(poll) = poll_from_detail(id, &detail) {
                        return Some(poll);
                    }
                    warn!(poll_id = %id, "Poll detail incomplete, falling back to local data");
                }
                Err(e) => {
                    warn!(poll_id = %id, "Poll detail fetch failed, falling back: {e:#}");
                }
            }
        }
    }

    let poll_key = poll_id.as_deref().unwrap_or(fallback_id);

    // Tier 2: poll object embedded in the payload, options included.
    if let Some(poll) = poll_from_embedded(poll_key, &raw.data) {
        return Some(poll);
    }

    // Tier 3: without a resolvable question this is not a poll after all.
    let Some(question) = resolve_question(&raw.data) else {
        debug!(post_id = %fallback_id, "Poll-flagged post has no resolvable question");
        return None;
    };

    // Tiers 4-5: grouped options, then legacy children.
    let records = local_option_records(raw)?;
    let options = build_options(records);
    let total_votes: i64 = options.iter().map(|o| o.votes).sum();
    let options = options
        .into_iter()
        .map(|o| PollOption {
            percentage: PollOption::percentage_of(o.votes, total_votes),
            ..o
        })
        .collect();

    let embedded = raw.data.get("poll");
    let ended_at = parse_timestamp(
        embedded
            .and_then(|p| str_field(p, "endedAt"))
            .or_else(|| str_field(&raw.data, "endedAt")),
    );
    let is_finished = embedded
        .and_then(|p| p.get("isFinished"))
        .and_then(Value::as_bool)
        .or_else(|| raw.data.get("isFinished").and_then(Value::as_bool))
        .unwrap_or(ended_at.is_some());

    Some(Poll {
        id: poll_key.to_string(),
        question: question.to_string(),
        options,
        total_votes,
        ended_at,
        is_finished,
    })
}

/// Poll id from any of its historical locations.
fn extract_poll_id(raw: &RawPost) -> Option<String> {
    raw.poll_id
        .clone()
        .filter(|id| !id.is_empty())
        .or_else(|| str_field(&raw.data, "pollId").map(ToString::to_string))
        .or_else(|| {
            raw.data
                .get("poll")
                .and_then(|poll| str_field(poll, "id"))
                .map(ToString::to_string)
        })
}

/// Whether any option data is already present on the post, making the
/// remote detail fetch unnecessary.
fn has_local_options(raw: &RawPost) -> bool {
    let embedded = raw
        .data
        .get("poll")
        .and_then(|p| p.get("options"))
        .and_then(Value::as_array)
        .is_some_and(|opts| !opts.is_empty());
    let grouped = raw.options.as_ref().is_some_and(|o| !o.is_empty());
    let children = raw.children.as_ref().is_some_and(|c| !c.is_empty());
    embedded || grouped || children
}

/// Build a poll from the detail endpoint's payload. `None` when the payload
/// is too incomplete to render (no question).
fn poll_from_detail(poll_id: &str, detail: &PollDetail) -> Option<Poll> {
    let question = detail.question.as_deref().filter(|q| !q.is_empty())?;

    let summed: i64 = detail
        .options
        .iter()
        .map(|o| o.vote_count.unwrap_or(0))
        .sum();
    let total_votes = detail.total_votes.unwrap_or(summed);

    let options = detail
        .options
        .iter()
        .enumerate()
        .map(|(index, option)| {
            let votes = option.vote_count.unwrap_or(0);
            PollOption {
                id: option
                    .id
                    .clone()
                    .unwrap_or_else(|| synthetic_option_id(index)),
                text: option
                    .text
                    .clone()
                    .filter(|t| !t.is_empty())
                    .unwrap_or_else(|| placeholder_text(index)),
                votes,
                percentage: PollOption::percentage_of(votes, total_votes),
            }
        })
        .collect();

    let ended_at = parse_timestamp(detail.ended_at.as_deref());
    Some(Poll {
        id: poll_id.to_string(),
        question: question.to_string(),
        options,
        total_votes,
        ended_at,
        is_finished: detail.is_finished.unwrap_or(ended_at.is_some()),
    })
}

/// Build a poll from a payload-embedded `poll` object carrying its own
/// options, the same mapping as the detail tier minus the network call.
fn poll_from_embedded(poll_id: &str, data: &Value) -> Option<Poll> {
    let embedded = data.get("poll")?;
    let raw_options = embedded.get("options")?.as_array()?;
    if raw_options.is_empty() {
        return None;
    }
    let question = str_field(embedded, "question")?;

    let votes_of = |option: &Value| {
        int_field(option, "voteCount")
            .or_else(|| int_field(option, "votes"))
            .unwrap_or(0)
    };

    let summed: i64 = raw_options.iter().map(|o| votes_of(o)).sum();
    let total_votes = int_field(embedded, "totalVotes").unwrap_or(summed);

    let options = raw_options
        .iter()
        .enumerate()
        .map(|(index, option)| {
            let votes = votes_of(option);
            PollOption {
                id: first_str(option, &["id", "_id"])
                    .map_or_else(|| synthetic_option_id(index), ToString::to_string),
                text: first_str(option, &["text", "title"])
                    .map_or_else(|| placeholder_text(index), ToString::to_string),
                votes,
                percentage: PollOption::percentage_of(votes, total_votes),
            }
        })
        .collect();

    let ended_at = parse_timestamp(str_field(embedded, "endedAt"));
    Some(Poll {
        id: poll_id.to_string(),
        question: question.to_string(),
        options,
        total_votes,
        ended_at,
        is_finished: embedded
            .get("isFinished")
            .and_then(Value::as_bool)
            .unwrap_or(ended_at.is_some()),
    })
}

/// Question text across the payload's historical locations, in order.
fn resolve_question(data: &Value) -> Option<&str> {
    data.get("poll")
        .and_then(|poll| str_field(poll, "question"))
        .or_else(|| first_str(data, &["question", "title", "text"]))
}

/// Option records local to the post: grouped list preferred, legacy children
/// as fallback, sorted ascending by sequence number. Missing numbers sort as
/// 0 and the sort is stable, so ties keep their received order.
fn local_option_records(raw: &RawPost) -> Option<Vec<&RawPollOption>> {
    let records = raw
        .options
        .as_ref()
        .filter(|o| !o.is_empty())
        .or_else(|| raw.children.as_ref().filter(|c| !c.is_empty()))?;

    let mut sorted: Vec<&RawPollOption> = records.iter().collect();
    sorted.sort_by_key(|o| o.position.unwrap_or(0));
    Some(sorted)
}

/// Map sorted option records to domain options; percentages are filled in by
/// the caller once the total is known.
fn build_options(records: Vec<&RawPollOption>) -> Vec<PollOption> {
    records
        .iter()
        .enumerate()
        .map(|(index, record)| PollOption {
            id: record
                .id
                .clone()
                .or_else(|| record.legacy_id.clone())
                .filter(|id| !id.is_empty())
                .unwrap_or_else(|| synthetic_option_id(index)),
            text: resolve_option_text(record, index),
            votes: option_votes(record),
            percentage: 0,
        })
        .collect()
}

/// Option label through every location a backend version has used, ending in
/// a synthetic placeholder so a poll never renders a blank row.
fn resolve_option_text(record: &RawPollOption, index: usize) -> String {
    const TEXT_KEYS: &[&str] = &["text", "title", "question"];

    if let Some(text) = first_str(&record.data, TEXT_KEYS) {
        return text.to_string();
    }
    if let Some(text) = [&record.text, &record.title, &record.question]
        .into_iter()
        .find_map(|field| field.as_deref().filter(|s| !s.is_empty()))
    {
        return text.to_string();
    }
    if let Some(text) = first_str(&record.metadata, TEXT_KEYS) {
        return text.to_string();
    }
    if let Some(json) = meaningful_payload_json(&record.data) {
        return json;
    }
    placeholder_text(index)
}

/// Vote count across its historical locations.
fn option_votes(record: &RawPollOption) -> i64 {
    record
        .reactions_count
        .or_else(|| int_field(&record.data, "votes"))
        .or_else(|| int_field(&record.data, "voteCount"))
        .unwrap_or(0)
}

/// JSON serialization of the payload, unless the payload is empty or holds
/// nothing but a poll-id reference (which would render as noise).
fn meaningful_payload_json(data: &Value) -> Option<String> {
    if !has_keys(data) {
        return None;
    }
    let map = data.as_object()?;
    if map.len() == 1 && map.contains_key("pollId") {
        return None;
    }
    Some(data.to_string())
}

fn placeholder_text(index: usize) -> String {
    format!("Opção {}", index + 1)
}

fn synthetic_option_id(index: usize) -> String {
    format!("option-{}", index + 1)
}
