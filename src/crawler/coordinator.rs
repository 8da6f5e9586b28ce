//! Crawl coordinator - main crawl orchestration logic
//!
//! This module drives one crawl run over an input URL list:
//! - Resetting the corpus for no-resume runs
//! - Skipping URLs the corpus already holds
//! - Running extractions under a concurrency bound
//! - Appending every success as soon as it arrives (single writer)
//! - Recording failures and run bookkeeping
//! - Stopping cleanly on cancellation

use crate::crawler::{ExtractionError, Extractor};
use crate::state::{UrlState, UrlTracker};
use crate::storage::{Article, CorpusStore, FailureRecord, RunCounts, RunStatus, StorageError};
use crate::LensError;
use std::sync::Arc;
use tokio::sync::{watch, Semaphore};
use tokio::task::JoinSet;

/// Number of settled URLs between progress log lines
const PROGRESS_INTERVAL: u64 = 10;

/// Options for one crawl run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CrawlOptions {
    /// Keep the existing corpus and skip URLs already in it
    pub resume: bool,
    /// Re-extract URLs even when present, overwriting them in place
    pub force: bool,
}

impl Default for CrawlOptions {
    fn default() -> Self {
        Self {
            resume: true,
            force: false,
        }
    }
}

/// Outcome of a crawl run
#[derive(Debug, Clone)]
pub struct CrawlReport {
    pub run_id: i64,
    pub done: u64,
    pub skipped: u64,
    pub failed: u64,
    /// URLs that never reached a terminal state (only non-empty when cancelled)
    pub unfinished: Vec<String>,
    pub failures: Vec<FailureRecord>,
    pub cancelled: bool,
}

impl CrawlReport {
    pub fn counts(&self) -> RunCounts {
        RunCounts {
            done: self.done,
            skipped: self.skipped,
            failed: self.failed,
        }
    }
}

/// Main crawler coordinator structure
pub struct Coordinator {
    store: Arc<dyn CorpusStore>,
    extractor: Arc<Extractor>,
    max_concurrency: usize,
    config_hash: String,
}

/// Result of one spawned extraction task
type TaskOutput = (String, Result<Article, ExtractionError>);

impl Coordinator {
    /// Creates a new coordinator
    ///
    /// # Arguments
    ///
    /// * `store` - The corpus every success is appended to
    /// * `extractor` - Shared extraction worker
    /// * `max_concurrency` - Upper bound on extractions in flight (at least 1)
    pub fn new(store: Arc<dyn CorpusStore>, extractor: Arc<Extractor>, max_concurrency: usize) -> Self {
        Self {
            store,
            extractor,
            max_concurrency: max_concurrency.max(1),
            config_hash: String::new(),
        }
    }

    /// Sets the configuration hash recorded with each run
    pub fn with_config_hash(mut self, config_hash: impl Into<String>) -> Self {
        self.config_hash = config_hash.into();
        self
    }

    /// Runs a crawl to completion
    pub async fn run(&self, urls: &[String], options: CrawlOptions) -> Result<CrawlReport, LensError> {
        // The sender stays alive for the whole run, so the crawl is never cancelled
        let (_cancel_tx, cancel_rx) = watch::channel(false);
        self.run_until_cancelled(urls, options, cancel_rx).await
    }

    /// Runs a crawl until it completes or `cancel` turns true
    ///
    /// On cancellation no new extraction is started and in-flight ones are
    /// aborted. Results that arrived before that are already appended.
    ///
    /// # Returns
    ///
    /// * `Ok(CrawlReport)` - The run finished or was cancelled
    /// * `Err(LensError)` - A store failure stopped the run
    pub async fn run_until_cancelled(
        &self,
        urls: &[String],
        options: CrawlOptions,
        cancel: watch::Receiver<bool>,
    ) -> Result<CrawlReport, LensError> {
        if !options.resume {
            tracing::info!("No-resume run: clearing corpus before crawling");
            self.store.reset()?;
        }

        let run_id = self.store.create_run(&self.config_hash)?;
        tracing::info!("Starting crawl run {} over {} URLs", run_id, urls.len());

        let mut run = RunState {
            run_id,
            options,
            tracker: UrlTracker::new(urls.iter().cloned()),
            counts: RunCounts::default(),
        };
        if run.tracker.is_empty() {
            tracing::warn!("Crawl run {} has no URLs to process", run_id);
        }

        match self.crawl(&mut run, cancel).await {
            Ok(cancelled) => {
                let status = if cancelled {
                    RunStatus::Cancelled
                } else {
                    RunStatus::Completed
                };
                self.store.finish_run(run_id, status, run.counts)?;

                let report = CrawlReport {
                    run_id,
                    done: run.counts.done,
                    skipped: run.counts.skipped,
                    failed: run.counts.failed,
                    unfinished: run.tracker.unfinished(),
                    failures: self.store.failures_for_run(run_id)?,
                    cancelled,
                };

                tracing::info!(
                    "Crawl run {} {}: {} done, {} skipped, {} failed, {} unfinished",
                    run_id,
                    status.to_db_string(),
                    report.done,
                    report.skipped,
                    report.failed,
                    report.unfinished.len()
                );
                Ok(report)
            }
            Err(e) => {
                tracing::error!("Crawl run {} stopped: {}", run_id, e);
                if let Err(finish_err) = self.store.finish_run(run_id, RunStatus::Failed, run.counts)
                {
                    tracing::warn!("Could not mark run {} as failed: {}", run_id, finish_err);
                }
                Err(e)
            }
        }
    }

    /// Main crawl loop; returns whether the run was cancelled
    async fn crawl(
        &self,
        run: &mut RunState,
        mut cancel: watch::Receiver<bool>,
    ) -> Result<bool, LensError> {
        let mut queue = Vec::new();
        let urls: Vec<String> = run.tracker.urls().map(str::to_string).collect();
        for url in urls {
            if run.options.resume && !run.options.force && self.store.contains(&url)? {
                run.tracker.transition(&url, UrlState::Skipped)?;
                run.counts.skipped += 1;
            } else {
                queue.push(url);
            }
        }
        if run.counts.skipped > 0 {
            tracing::info!("Skipping {} URLs already in the corpus", run.counts.skipped);
        }

        let semaphore = Arc::new(Semaphore::new(self.max_concurrency));
        let mut tasks: JoinSet<TaskOutput> = JoinSet::new();
        let mut queue = queue.into_iter().peekable();
        let mut cancelled = *cancel.borrow();
        let mut watching = true;

        loop {
            let can_start = !cancelled && queue.peek().is_some();
            if tasks.is_empty() && !can_start {
                break;
            }

            tokio::select! {
                biased;

                changed = cancel.changed(), if watching && !cancelled => {
                    match changed {
                        Ok(()) if *cancel.borrow() => {
                            tracing::warn!("Cancellation requested; aborting {} in-flight extractions", tasks.len());
                            cancelled = true;
                            tasks.abort_all();
                        }
                        Ok(()) => {}
                        // Sender dropped: cancellation can no longer happen
                        Err(_) => watching = false,
                    }
                }

                joined = tasks.join_next(), if !tasks.is_empty() => {
                    match joined {
                        Some(Ok((url, result))) => {
                            if let Err(e) = self.settle(run, &url, result) {
                                tasks.abort_all();
                                return Err(e);
                            }
                        }
                        Some(Err(e)) if e.is_cancelled() => {}
                        Some(Err(e)) => {
                            tasks.abort_all();
                            return Err(e.into());
                        }
                        None => {}
                    }
                }

                permit = Arc::clone(&semaphore).acquire_owned(), if can_start => {
                    let Ok(permit) = permit else { break };
                    let Some(url) = queue.next() else { continue };

                    run.tracker.transition(&url, UrlState::InProgress)?;
                    let extractor = Arc::clone(&self.extractor);
                    tasks.spawn(async move {
                        let _permit = permit;
                        let result = extractor.extract(&url).await;
                        (url, result)
                    });
                }
            }
        }

        Ok(cancelled)
    }

    /// Applies one extraction result to the corpus and the run state
    ///
    /// An article the store rejects as invalid fails only its own URL. Any
    /// other store error stops the run.
    fn settle(
        &self,
        run: &mut RunState,
        url: &str,
        result: Result<Article, ExtractionError>,
    ) -> Result<(), LensError> {
        match result {
            Ok(article) => match self.store.append(&article, run.options.force) {
                Ok(outcome) => {
                    run.tracker.transition(url, UrlState::Done)?;
                    run.counts.done += 1;
                    tracing::debug!("Stored {} ({:?})", url, outcome);
                }
                Err(StorageError::InvalidArticle(reason)) => {
                    self.fail(run, url, &ExtractionError::ParseFailure(reason))?;
                }
                Err(e) => return Err(e.into()),
            },
            Err(error) => self.fail(run, url, &error)?,
        }

        let settled = run.counts.done + run.counts.failed;
        if settled % PROGRESS_INTERVAL == 0 {
            tracing::info!(
                "Progress: {} done, {} failed, {} skipped of {} URLs",
                run.counts.done,
                run.counts.failed,
                run.counts.skipped,
                run.tracker.len()
            );
        }
        Ok(())
    }

    fn fail(&self, run: &mut RunState, url: &str, error: &ExtractionError) -> Result<(), LensError> {
        run.tracker.transition(url, UrlState::Failed)?;
        run.counts.failed += 1;
        tracing::warn!("Failed {}: {}", url, error);
        self.store
            .record_failure(run.run_id, url, error.kind(), &error.to_string())?;
        Ok(())
    }
}

/// Mutable bookkeeping for one run, owned by the coordinator loop
struct RunState {
    run_id: i64,
    options: CrawlOptions,
    tracker: UrlTracker,
    counts: RunCounts,
}
