//! Worklist-driven site crawler.
//!
//! The crawler starts from the seed pages, scrapes each worklist entry in
//! FIFO order, and appends newly discovered row links until the worklist is
//! exhausted. Scrape failures are logged and skipped; they never abort the crawl.

use std::collections::HashSet;
use std::time::{Duration, Instant};

use tracing::{debug, info, instrument, warn};

use reqgraph_shared::{ProgressReporter, RawPages, Result, SiteConfig};

use crate::fetch::PageFetcher;
use crate::scrape::{collect_seed_urls, scrape_page};

// ---------------------------------------------------------------------------
// Worklist
// ---------------------------------------------------------------------------

/// Append-only FIFO of URLs with a read cursor.
///
/// A URL is admitted at most once; admission is checked against everything
/// ever pushed, so growth is bounded by the distinct URLs discovered.
#[derive(Debug, Default)]
pub struct Worklist {
    urls: Vec<String>,
    members: HashSet<String>,
    cursor: usize,
}

impl Worklist {
    /// Start from `seeds` in order. Repeated seeds are kept as given.
    pub fn new(seeds: Vec<String>) -> Self {
        let members = seeds.iter().cloned().collect();
        Self {
            urls: seeds,
            members,
            cursor: 0,
        }
    }

    /// Append `url` unless it is already in the worklist.
    pub fn push(&mut self, url: &str) -> bool {
        if self.members.contains(url) {
            return false;
        }
        self.members.insert(url.to_string());
        self.urls.push(url.to_string());
        true
    }

    /// Total entries ever admitted.
    pub fn len(&self) -> usize {
        self.urls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }

    /// Entries already handed out by [`Worklist::next_url`].
    pub fn visited(&self) -> usize {
        self.cursor
    }

    /// Next unvisited entry, advancing the cursor.
    pub fn next_url(&mut self) -> Option<String> {
        let url = self.urls.get(self.cursor)?.clone();
        self.cursor += 1;
        Some(url)
    }
}

// ---------------------------------------------------------------------------
// CrawlResult
// ---------------------------------------------------------------------------

/// Summary of a completed crawl.
#[derive(Debug, Clone)]
pub struct CrawlResult {
    /// Successfully scraped pages keyed by URL, in scrape order.
    pub pages: RawPages,
    /// Number of scrape attempts made.
    pub pages_attempted: usize,
    /// Worklist entries skipped because the URL was already scraped.
    pub pages_skipped: usize,
    /// Failed scrapes (URL, error message).
    pub errors: Vec<(String, String)>,
    /// Final worklist length.
    pub worklist_len: usize,
    /// Total duration of the crawl.
    pub duration: Duration,
}

// ---------------------------------------------------------------------------
// SiteCrawler
// ---------------------------------------------------------------------------

/// Sequential crawler over a documentation site.
pub struct SiteCrawler<'a, F: ?Sized> {
    fetcher: &'a F,
    site: &'a SiteConfig,
}

impl<'a, F: PageFetcher + ?Sized> SiteCrawler<'a, F> {
    pub fn new(fetcher: &'a F, site: &'a SiteConfig) -> Self {
        Self { fetcher, site }
    }

    /// Discover seeds from the navigation index, then crawl from them.
    ///
    /// Only a failure to fetch the index is returned as an error.
    #[instrument(skip_all, fields(index = %self.site.index_url))]
    pub async fn crawl(&self, progress: &dyn ProgressReporter) -> Result<CrawlResult> {
        progress.phase("Collecting seed pages");
        let seeds = collect_seed_urls(self.fetcher, self.site).await?;
        Ok(self.crawl_from(seeds, progress).await)
    }

    /// Crawl the link graph reachable from `seeds`.
    pub async fn crawl_from(
        &self,
        seeds: Vec<String>,
        progress: &dyn ProgressReporter,
    ) -> CrawlResult {
        let start_time = Instant::now();
        let mut worklist = Worklist::new(seeds);
        let mut pages = RawPages::new();
        let mut errors: Vec<(String, String)> = Vec::new();
        let mut pages_attempted = 0;
        let mut pages_skipped = 0;

        progress.phase("Scraping pages");
        info!(seeds = worklist.len(), "starting crawl");

        while let Some(url) = worklist.next_url() {
            if pages.contains_key(&url) {
                debug!(%url, "already scraped, skipping");
                pages_skipped += 1;
                continue;
            }

            pages_attempted += 1;
            match scrape_page(self.fetcher, &url).await {
                Ok(scraped) => {
                    let mut admitted = 0;
                    for child in &scraped.child_urls {
                        if worklist.push(child) {
                            admitted += 1;
                        }
                    }

                    info!(
                        %url,
                        name = %scraped.content.name,
                        admitted,
                        worklist = worklist.len(),
                        "collected page content"
                    );
                    progress.item(&url, worklist.visited(), worklist.len());
                    pages.insert(url, scraped.content);
                }
                Err(e) => {
                    warn!(%url, error = %e, "error scraping page");
                    progress.failed(&url, &e.to_string());
                    errors.push((url, e.to_string()));
                }
            }
        }

        let result = CrawlResult {
            pages,
            pages_attempted,
            pages_skipped,
            errors,
            worklist_len: worklist.len(),
            duration: start_time.elapsed(),
        };

        info!(
            pages = result.pages.len(),
            attempted = result.pages_attempted,
            skipped = result.pages_skipped,
            errors = result.errors.len(),
            duration_ms = result.duration.as_millis(),
            "crawl completed"
        );

        result
    }
}
