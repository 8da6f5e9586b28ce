//! Integration test suite
//!
//! Collected into a single test binary.

mod crawl_tests;
mod search_tests;
mod server_tests;
