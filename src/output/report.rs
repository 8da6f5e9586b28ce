//! Console output for crawl runs and search results

use crate::crawler::CrawlReport;
use crate::search::SearchHit;

/// Prints a crawl run summary to stdout
pub fn print_crawl_report(report: &CrawlReport) {
    println!("=== Crawl Run #{} ===\n", report.run_id);
    if report.cancelled {
        println!("Run was cancelled before finishing.\n");
    }

    println!("  Done: {}", report.done);
    println!("  Skipped (already stored): {}", report.skipped);
    println!("  Failed: {}", report.failed);

    if !report.failures.is_empty() {
        println!("\nFailures:");
        for failure in &report.failures {
            println!("  - [{}] {}: {}", failure.kind, failure.url, failure.message);
        }
    }

    if !report.unfinished.is_empty() {
        println!(
            "\nUnfinished ({}), picked up by the next resumed run:",
            report.unfinished.len()
        );
        for url in &report.unfinished {
            println!("  - {}", url);
        }
    }
}

/// Prints ranked search results to stdout
pub fn print_search_results(query: &str, hits: &[SearchHit]) {
    println!("Results for \"{}\" ({}):\n", query, hits.len());
    if hits.is_empty() {
        println!("  No articles indexed.");
        return;
    }

    for (rank, hit) in hits.iter().enumerate() {
        let title = if hit.title.is_empty() {
            "(untitled)"
        } else {
            hit.title.as_str()
        };
        println!(
            "{:>3}. {:.4}  {}  [{} claps]",
            rank + 1,
            hit.score,
            title,
            hit.claps
        );
        match &hit.author {
            Some(author) => println!("       {} by {}", hit.url, author),
            None => println!("       {}", hit.url),
        }
    }
}
