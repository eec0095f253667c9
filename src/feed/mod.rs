//! Feed normalization pipeline.
//!
//! Raw page records flow through [`post::normalize_post`] per post, which
//! delegates comments to [`comment`] and poll-flagged posts to [`poll`].
//! [`filters::translate_filters`] produces the query parameters the feed
//! fetch expects. Every transform here is pure and stateless; the one
//! suspension point is the remote poll-detail fetch.

pub mod comment;
pub mod domain;
pub mod filters;
pub mod poll;
pub mod post;
pub mod raw;

pub use filters::translate_filters;
pub use post::normalize_post;
