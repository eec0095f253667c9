//! Community feed engine library.
//!
//! Normalizes the heterogeneous, versioned records returned by the community
//! backend (posts, polls, comments, reactions, authors, media) into the stable
//! domain model the app renders. The backend has shipped several incompatible
//! payload shapes for the same concepts over time; this crate reconciles all of
//! them deterministically and never fails a whole feed render over one
//! malformed record.

pub mod client;
pub mod config;
pub mod constants;
pub mod feed;
