//! State module for tracking crawl progress
//!
//! # Components
//!
//! - `UrlState`: the per-URL state machine (pending, in progress, done, skipped, failed)
//! - `UrlTracker`: the state of every URL in one crawl run

mod tracker;
mod url_state;

// Re-export main types
pub use tracker::UrlTracker;
pub use url_state::UrlState;
