//! Output module for console reports
//!
//! This module handles:
//! - Corpus statistics and the most recent run
//! - Crawl run summaries
//! - Ranked search results

mod report;
pub mod stats;

pub use report::{print_crawl_report, print_search_results};
pub use stats::{load_statistics, print_statistics, CorpusReport};
