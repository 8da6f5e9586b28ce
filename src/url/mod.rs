//! URL handling module for Article-Lens
//!
//! This module provides URL normalization (the corpus key) and crawl input
//! list loading.

mod input;
mod normalize;

pub use input::{load_url_list, parse_url_list};
pub use normalize::normalize_url;
