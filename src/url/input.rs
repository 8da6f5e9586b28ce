//! Crawl input loading
//!
//! The crawl input is a newline-delimited list of URLs. Blank lines and lines
//! starting with `#` are ignored, malformed lines are logged and skipped, and
//! duplicates collapse onto their first occurrence.

use crate::url::normalize_url;
use std::collections::HashSet;
use std::path::Path;

/// Parses a newline-delimited URL list into normalized, de-duplicated URLs
///
/// Order of first appearance is preserved.
pub fn parse_url_list(content: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut urls = Vec::new();

    for (line_no, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        match normalize_url(line) {
            Ok(url) => {
                let url = url.to_string();
                if seen.insert(url.clone()) {
                    urls.push(url);
                }
            }
            Err(e) => {
                tracing::warn!("Skipping line {}: '{}' ({})", line_no + 1, line, e);
            }
        }
    }

    urls
}

/// Loads a URL list from a file
///
/// # Arguments
///
/// * `path` - Path to the newline-delimited URL file
///
/// # Returns
///
/// * `Ok(Vec<String>)` - Normalized URLs in input order
/// * `Err(std::io::Error)` - The file could not be read
pub fn load_url_list(path: &Path) -> std::io::Result<Vec<String>> {
    let content = std::fs::read_to_string(path)?;
    let urls = parse_url_list(&content);
    tracing::info!("Loaded {} URLs from {}", urls.len(), path.display());
    Ok(urls)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_skips_blank_and_comment_lines() {
        let content = "\n# seeds\nhttps://example.com/a\n\n   \nhttps://example.com/b\n";
        let urls = parse_url_list(content);
        assert_eq!(
            urls,
            vec!["https://example.com/a", "https://example.com/b"]
        );
    }

    #[test]
    fn test_deduplicates_preserving_order() {
        let content = "https://example.com/b\nhttps://example.com/a\nhttps://example.com/b#x\n";
        let urls = parse_url_list(content);
        assert_eq!(
            urls,
            vec!["https://example.com/b", "https://example.com/a"]
        );
    }

    #[test]
    fn test_skips_malformed_lines() {
        let content = "not-a-url\nhttps://example.com/ok\nmailto:me@example.com\n";
        let urls = parse_url_list(content);
        assert_eq!(urls, vec!["https://example.com/ok"]);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "https://example.com/one").unwrap();
        writeln!(file, "https://example.com/two").unwrap();
        file.flush().unwrap();

        let urls = load_url_list(file.path()).unwrap();
        assert_eq!(urls.len(), 2);
    }

    #[test]
    fn test_load_missing_file() {
        assert!(load_url_list(Path::new("/nonexistent/urls.txt")).is_err());
    }
}
