//! Poll precedence chain tests with stub detail fetchers.

use std::sync::atomic::{AtomicUsize, Ordering};

use anyhow::Result;
use async_trait::async_trait;
use serde_json::json;

use community_feed_engine::client::{PollDetail, PollDetailFetcher};
use community_feed_engine::feed::poll::resolve_poll;
use community_feed_engine::feed::raw::RawPost;

/// Serves one canned detail payload and counts calls.
struct CannedFetcher {
    detail: PollDetail,
    calls: AtomicUsize,
}

impl CannedFetcher {
    fn new(detail: serde_json::Value) -> Self {
        Self {
            detail: serde_json::from_value(detail).expect("test detail should deserialize"),
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl PollDetailFetcher for CannedFetcher {
    async fn fetch_poll(&self, _poll_id: &str) -> Result<PollDetail> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.detail.clone())
    }
}

#[derive(Default)]
struct RejectingFetcher {
    calls: AtomicUsize,
}

#[async_trait]
impl PollDetailFetcher for RejectingFetcher {
    async fn fetch_poll(&self, _poll_id: &str) -> Result<PollDetail> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        anyhow::bail!("poll endpoint down")
    }
}

fn raw_post(value: serde_json::Value) -> RawPost {
    serde_json::from_value(value).expect("test post should deserialize")
}

#[tokio::test]
async fn remote_tier_used_when_no_local_options() {
    let fetcher = CannedFetcher::new(json!({
        "question": "Remote?",
        "options": [
            {"id": "a", "text": "A", "voteCount": 3},
            {"id": "b", "text": "B", "voteCount": 1}
        ]
    }));
    let raw = raw_post(json!({
        "id": "p1",
        "type": "poll",
        "pollId": "poll-1",
        "data": {}
    }));

    let poll = resolve_poll(&raw, &fetcher).await.unwrap();
    assert_eq!(fetcher.calls.load(Ordering::SeqCst), 1);
    assert_eq!(poll.id, "poll-1");
    assert_eq!(poll.question, "Remote?");
    assert_eq!(poll.total_votes, 4);
    assert_eq!(
        poll.options.iter().map(|o| o.percentage).collect::<Vec<_>>(),
        vec![75, 25]
    );
}

#[tokio::test]
async fn remote_tier_honors_explicit_total() {
    let fetcher = CannedFetcher::new(json!({
        "question": "Totals?",
        "totalVotes": 10,
        "options": [{"id": "a", "text": "A", "voteCount": 5}]
    }));
    let raw = raw_post(json!({"id": "p1", "type": "poll", "pollId": "poll-1", "data": {}}));

    let poll = resolve_poll(&raw, &fetcher).await.unwrap();
    assert_eq!(poll.total_votes, 10);
    assert_eq!(poll.options[0].percentage, 50);
}

#[tokio::test]
async fn remote_tier_skipped_when_options_are_local() {
    let fetcher = CannedFetcher::new(json!({
        "question": "Never asked",
        "options": [{"id": "z", "text": "Z", "voteCount": 99}]
    }));
    let raw = raw_post(json!({
        "id": "p1",
        "type": "poll",
        "pollId": "poll-1",
        "data": {
            "poll": {
                "question": "Embedded wins",
                "options": [{"id": "a", "text": "A", "voteCount": 2}]
            }
        }
    }));

    let poll = resolve_poll(&raw, &fetcher).await.unwrap();
    assert_eq!(fetcher.calls.load(Ordering::SeqCst), 0);
    assert_eq!(poll.question, "Embedded wins");
    assert_eq!(poll.options[0].votes, 2);
}

#[tokio::test]
async fn local_children_preempt_remote_fetch() {
    // The poll id sits inside the embedded poll object, but legacy children
    // are present locally, so the remote tier must not fire at all.
    let fetcher = RejectingFetcher::default();
    let raw = raw_post(json!({
        "id": "p1",
        "type": "poll",
        "data": {"poll": {"id": "poll-2"}, "question": "Fallback?"},
        "children": [
            {"id": "c1", "position": 2, "data": {"text": "B", "votes": 1}},
            {"id": "c2", "position": 1, "data": {"text": "A", "votes": 3}}
        ]
    }));

    let poll = resolve_poll(&raw, &fetcher).await.unwrap();
    assert_eq!(fetcher.calls.load(Ordering::SeqCst), 0);
    assert_eq!(poll.id, "poll-2");
    assert_eq!(
        poll.options.iter().map(|o| o.text.as_str()).collect::<Vec<_>>(),
        vec!["A", "B"]
    );
}

#[tokio::test]
async fn rejected_fetch_with_no_local_data_resolves_to_none() {
    let fetcher = RejectingFetcher::default();
    let raw = raw_post(json!({
        "id": "p1",
        "type": "poll",
        "pollId": "poll-3",
        "data": {}
    }));
    assert!(resolve_poll(&raw, &fetcher).await.is_none());
    assert_eq!(fetcher.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn incomplete_detail_falls_through() {
    // Detail without a question is unusable; grouped options still work.
    let fetcher = CannedFetcher::new(json!({
        "options": [{"id": "a", "text": "A", "voteCount": 1}]
    }));
    let raw = raw_post(json!({
        "id": "p1",
        "type": "poll",
        "pollId": "poll-4",
        "data": {"question": "Recovered?"}
    }));

    let poll = resolve_poll(&raw, &fetcher).await;
    assert_eq!(fetcher.calls.load(Ordering::SeqCst), 1);
    // No grouped or legacy options either, so this one ends with nothing.
    assert!(poll.is_none());
}

#[tokio::test]
async fn unresolvable_question_means_no_poll() {
    let fetcher = RejectingFetcher::default();
    let raw = raw_post(json!({
        "id": "p1",
        "type": "poll",
        "data": {},
        "options": [{"id": "a", "data": {"text": "A"}}]
    }));
    assert!(resolve_poll(&raw, &fetcher).await.is_none());
}

#[tokio::test]
async fn grouped_options_sorted_by_sequence() {
    let fetcher = RejectingFetcher::default();
    let raw = raw_post(json!({
        "id": "p1",
        "type": "poll",
        "data": {"question": "Order?"},
        "options": [
            {"id": "b", "position": 2, "data": {"text": "B"}},
            {"id": "a", "position": 1, "data": {"text": "A"}}
        ]
    }));
    let poll = resolve_poll(&raw, &fetcher).await.unwrap();
    assert_eq!(
        poll.options.iter().map(|o| o.text.as_str()).collect::<Vec<_>>(),
        vec!["A", "B"]
    );
}

#[tokio::test]
async fn option_text_placeholder_is_one_based() {
    let fetcher = RejectingFetcher::default();
    let raw = raw_post(json!({
        "id": "p1",
        "type": "poll",
        "data": {"question": "Labels?"},
        "options": [
            {"id": "a", "data": {"text": "Named"}},
            {"id": "b", "data": {}}
        ]
    }));
    let poll = resolve_poll(&raw, &fetcher).await.unwrap();
    assert_eq!(poll.options[0].text, "Named");
    assert_eq!(poll.options[1].text, "Opção 2");
}

#[tokio::test]
async fn independent_rounding_may_not_sum_to_hundred() {
    let fetcher = RejectingFetcher::default();
    let raw = raw_post(json!({
        "id": "p1",
        "type": "poll",
        "data": {"question": "Thirds?"},
        "options": [
            {"id": "a", "data": {"text": "A", "votes": 1}},
            {"id": "b", "data": {"text": "B", "votes": 1}},
            {"id": "c", "data": {"text": "C", "votes": 1}}
        ]
    }));
    let poll = resolve_poll(&raw, &fetcher).await.unwrap();
    let sum: i64 = poll.options.iter().map(|o| o.percentage).sum();
    assert_eq!(sum, 99);
}

#[tokio::test]
async fn legacy_end_date_marks_poll_finished() {
    let fetcher = RejectingFetcher::default();
    let raw = raw_post(json!({
        "id": "p1",
        "type": "poll",
        "data": {"question": "Over?", "endedAt": "2024-01-01T00:00:00Z"},
        "options": [{"id": "a", "data": {"text": "A"}}]
    }));
    let poll = resolve_poll(&raw, &fetcher).await.unwrap();
    assert!(poll.is_finished);
    assert!(poll.ended_at.is_some());
}

#[tokio::test]
async fn explicit_is_finished_overrides_end_date_default() {
    let fetcher = RejectingFetcher::default();
    let raw = raw_post(json!({
        "id": "p1",
        "type": "poll",
        "data": {
            "question": "Still open?",
            "endedAt": "2999-01-01T00:00:00Z",
            "isFinished": false
        },
        "options": [{"id": "a", "data": {"text": "A"}}]
    }));
    let poll = resolve_poll(&raw, &fetcher).await.unwrap();
    assert!(!poll.is_finished);
}

#[tokio::test]
async fn poll_without_discoverable_id_reuses_post_id() {
    let fetcher = RejectingFetcher::default();
    let raw = raw_post(json!({
        "id": "post-key",
        "type": "poll",
        "data": {"question": "Key?"},
        "options": [{"id": "a", "data": {"text": "A"}}]
    }));
    let poll = resolve_poll(&raw, &fetcher).await.unwrap();
    assert_eq!(poll.id, "post-key");
}
