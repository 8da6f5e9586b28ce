//! HTML parser for article pages
//!
//! This module turns a fetched article page into an `Article`:
//! - Title, subtitle and body text
//! - Clap count, including abbreviated forms such as `1.2K`
//! - Author, author profile link and reading time when present
//! - Content images, external link count and body keywords
//!
//! Every field goes through a chain of fallbacks because article markup
//! varies between publications and layout revisions.

use crate::crawler::{extract_keywords, ExtractionError, MAX_KEYWORDS};
use crate::storage::Article;
use chrono::Utc;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;
use url::Url;

/// Minimum length of a text block inside an article container
const MIN_BLOCK_CHARS: usize = 5;

/// Minimum length of a loose body paragraph in the last-resort fallback
const MIN_LOOSE_PARAGRAPH_CHARS: usize = 20;

/// Images with a declared width or height below this are icons or avatars
const MIN_IMAGE_PX: u32 = 100;

/// Largest clap count the corpus can hold (SQLite integers are signed)
pub const MAX_CLAPS: u64 = i64::MAX as u64;

/// Parses an article page
///
/// A page with a body but no recognizable title yields a partial article
/// (empty title, `partial` set). A page with neither is a parse failure.
///
/// # Arguments
///
/// * `html` - The page HTML
/// * `url` - Corpus key recorded on the article
///
/// # Returns
///
/// * `Ok(Article)` - Extracted article
/// * `Err(ExtractionError::ParseFailure)` - No title and no body text found
///
/// # Example
///
/// ```
/// use article_lens::crawler::parse_article;
///
/// let html = r#"<html><body><h1>Hello</h1><article><p>Some body text here.</p></article>
///               <span data-testid="clapCount">1.2K</span></body></html>"#;
/// let article = parse_article(html, "https://example.com/hello").unwrap();
/// assert_eq!(article.title, "Hello");
/// assert_eq!(article.claps, 1200);
/// ```
pub fn parse_article(html: &str, url: &str) -> Result<Article, ExtractionError> {
    let document = Html::parse_document(html);

    let title = extract_title(&document);
    let content = extract_content(&document);

    if title.is_none() && content.is_none() {
        return Err(ExtractionError::ParseFailure(format!(
            "no title or article text found at {}",
            url
        )));
    }

    let partial = title.is_none();
    if partial {
        tracing::debug!("No title found at {}, keeping partial article", url);
    }

    let base = Url::parse(url).ok();
    let (author, author_url) = extract_author(&document, base.as_ref());
    let keywords = content
        .as_deref()
        .map(|text| extract_keywords(text, MAX_KEYWORDS))
        .unwrap_or_default();

    Ok(Article {
        url: url.to_string(),
        title: title.unwrap_or_default(),
        claps: extract_claps(&document),
        subtitle: extract_subtitle(&document),
        author,
        author_url,
        reading_time: extract_reading_time(&document),
        image_urls: extract_image_urls(&document, base.as_ref()),
        num_external_links: count_external_links(&document, base.as_ref()),
        keywords,
        content,
        partial,
        scraped_at: Utc::now(),
    })
}

/// Collapses runs of whitespace into single spaces and trims
pub fn clean_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Parses a clap count such as `342`, `1,024`, `1.2K` or `3M`
///
/// Anything that does not read as a non-negative count yields 0. Counts
/// above `MAX_CLAPS` are clamped to it.
pub fn parse_claps(text: &str) -> u64 {
    let text = text.trim().replace(',', "");
    let (number, multiplier) = match text.chars().last() {
        Some('K') | Some('k') => (&text[..text.len() - 1], 1_000.0),
        Some('M') | Some('m') => (&text[..text.len() - 1], 1_000_000.0),
        _ => (text.as_str(), 1.0),
    };

    match number.trim().parse::<f64>() {
        Ok(value) if value.is_finite() && value >= 0.0 => {
            ((value * multiplier).round() as u64).min(MAX_CLAPS)
        }
        _ => 0,
    }
}

/// Parses a reading time such as `5 min read` into minutes
pub fn parse_reading_time(text: &str) -> Option<u32> {
    let text = text.to_lowercase();
    let tokens: Vec<&str> = text.split_whitespace().collect();

    for (i, token) in tokens.iter().enumerate() {
        let digits: String = token.chars().take_while(|c| c.is_ascii_digit()).collect();
        if digits.is_empty() {
            continue;
        }
        let rest = &token[digits.len()..];
        let unit_follows = rest.starts_with("min")
            || (rest.is_empty() && tokens.get(i + 1).map_or(false, |t| t.starts_with("min")));
        if unit_follows {
            return digits.parse().ok();
        }
    }
    None
}

fn selector(css: &str) -> Option<Selector> {
    Selector::parse(css).ok()
}

fn element_text(element: ElementRef<'_>) -> String {
    clean_text(&element.text().collect::<String>())
}

fn first_text(document: &Html, css: &str) -> Option<String> {
    let selector = selector(css)?;
    document
        .select(&selector)
        .map(element_text)
        .find(|text| !text.is_empty())
}

fn meta_content(document: &Html, css: &str) -> Option<String> {
    let selector = selector(css)?;
    document
        .select(&selector)
        .filter_map(|el| el.value().attr("content"))
        .map(clean_text)
        .find(|text| !text.is_empty())
}

/// Title from the headline, then `og:title`, then `<title>` up to the first `|`
fn extract_title(document: &Html) -> Option<String> {
    first_text(document, "h1")
        .or_else(|| meta_content(document, "meta[property='og:title']"))
        .or_else(|| {
            first_text(document, "title").and_then(|title| {
                title
                    .split('|')
                    .next()
                    .map(|part| part.trim().to_string())
                    .filter(|part| !part.is_empty())
            })
        })
}

fn extract_subtitle(document: &Html) -> Option<String> {
    meta_content(document, "meta[name='description']")
        .or_else(|| meta_content(document, "meta[property='og:description']"))
}

/// Body text from the article container, falling back to looser selections
fn extract_content(document: &Html) -> Option<String> {
    container_text(document)
        .or_else(|| joined_blocks(document, "p.pw-post-body-paragraph", 0))
        .or_else(|| joined_blocks(document, "body p", MIN_LOOSE_PARAGRAPH_CHARS))
}

fn container_text(document: &Html) -> Option<String> {
    let container_selector = selector("article, section")?;
    let block_selector = selector("p, h2, h3, blockquote, li")?;
    let container = document.select(&container_selector).next()?;

    let blocks: Vec<String> = container
        .select(&block_selector)
        .map(element_text)
        .filter(|text| text.chars().count() > MIN_BLOCK_CHARS)
        .collect();

    (!blocks.is_empty()).then(|| blocks.join(" "))
}

fn joined_blocks(document: &Html, css: &str, min_chars: usize) -> Option<String> {
    let selector = selector(css)?;
    let blocks: Vec<String> = document
        .select(&selector)
        .map(element_text)
        .filter(|text| !text.is_empty() && text.chars().count() > min_chars)
        .collect();

    (!blocks.is_empty()).then(|| blocks.join(" "))
}

/// Clap count from the dedicated counter, an aria label, or loose `N claps` text
fn extract_claps(document: &Html) -> u64 {
    if let Some(text) = first_text(document, "[data-testid='clapCount']") {
        return parse_claps(&text);
    }

    if let Some(label_selector) = selector("[aria-label]") {
        for element in document.select(&label_selector) {
            let Some(label) = element.value().attr("aria-label") else {
                continue;
            };
            if !label.to_lowercase().contains("clap") {
                continue;
            }
            if let Some(count) = label.split_whitespace().find(|t| is_count_token(t)) {
                return parse_claps(count);
            }
        }
    }

    let text = clean_text(&document.root_element().text().collect::<Vec<_>>().join(" "));
    find_claps_in_text(&text).unwrap_or(0)
}

fn find_claps_in_text(text: &str) -> Option<u64> {
    let tokens: Vec<&str> = text.split_whitespace().collect();
    tokens.windows(2).find_map(|pair| {
        let unit = pair[1].to_lowercase();
        (unit.starts_with("clap") && is_count_token(pair[0])).then(|| parse_claps(pair[0]))
    })
}

fn is_count_token(token: &str) -> bool {
    let number = token.trim_end_matches(['K', 'k', 'M', 'm']);
    number.chars().any(|c| c.is_ascii_digit())
        && number
            .chars()
            .all(|c| c.is_ascii_digit() || c == '.' || c == ',')
}

/// Author name and profile link from the first `/@handle` link, else the
/// author meta tag (which carries no link)
fn extract_author(document: &Html, base: Option<&Url>) -> (Option<String>, Option<String>) {
    let from_profile_link = selector("a[href*='/@']").and_then(|sel| {
        document.select(&sel).find_map(|link| {
            let text = element_text(link);
            if text.chars().count() <= 1 || text.starts_with('@') {
                return None;
            }
            let href = link.value().attr("href").and_then(|h| resolve_link(base, h));
            Some((text, href))
        })
    });

    match from_profile_link {
        Some((name, href)) => (Some(name), href),
        None => (meta_content(document, "meta[name='author']"), None),
    }
}

/// Resolves `href` against the page URL; absolute links pass through
fn resolve_link(base: Option<&Url>, href: &str) -> Option<String> {
    let href = href.trim();
    let resolved = match Url::parse(href) {
        Ok(url) => url,
        Err(_) => base?.join(href).ok()?,
    };
    matches!(resolved.scheme(), "http" | "https").then(|| resolved.to_string())
}

/// The article container, or the whole page when there is none
fn content_root(document: &Html) -> ElementRef<'_> {
    selector("article")
        .and_then(|sel| document.select(&sel).next())
        .unwrap_or_else(|| document.root_element())
}

fn declared_size_too_small(element: ElementRef<'_>) -> bool {
    ["width", "height"].iter().any(|attr| {
        element
            .value()
            .attr(attr)
            .and_then(|value| value.trim().trim_end_matches("px").parse::<u32>().ok())
            .map_or(false, |px| px < MIN_IMAGE_PX)
    })
}

/// Content image URLs in page order, deduplicated
fn extract_image_urls(document: &Html, base: Option<&Url>) -> Vec<String> {
    let Some(img_selector) = selector("img") else {
        return Vec::new();
    };

    let mut seen = HashSet::new();
    content_root(document)
        .select(&img_selector)
        .filter(|img| !declared_size_too_small(*img))
        .filter_map(|img| {
            let value = img.value();
            value.attr("src").or_else(|| value.attr("data-src"))
        })
        .filter(|src| !src.trim_start().starts_with("data:"))
        .filter_map(|src| resolve_link(base, src))
        .filter(|src| seen.insert(src.clone()))
        .collect()
}

/// Distinct links in the article body whose host differs from the page's
fn count_external_links(document: &Html, base: Option<&Url>) -> u32 {
    let Some(link_selector) = selector("a[href]") else {
        return 0;
    };
    let page_host = base.and_then(Url::host_str);

    let external: HashSet<String> = content_root(document)
        .select(&link_selector)
        .filter_map(|link| link.value().attr("href"))
        .filter_map(|href| Url::parse(href.trim()).ok())
        .filter(|url| matches!(url.scheme(), "http" | "https"))
        .filter(|url| url.host_str() != page_host)
        .map(String::from)
        .collect();

    u32::try_from(external.len()).unwrap_or(u32::MAX)
}

fn extract_reading_time(document: &Html) -> Option<u32> {
    if let Some(text) = first_text(document, "[data-testid='storyReadTime']") {
        if let Some(minutes) = parse_reading_time(&text) {
            return Some(minutes);
        }
    }

    let selector = selector("span, p, div")?;
    document
        .select(&selector)
        .map(element_text)
        .filter(|text| text.len() < 20 && text.to_lowercase().contains("min read"))
        .find_map(|text| parse_reading_time(&text))
}
