//! Documentation site crawler and table content extraction.
//!
//! This crate provides:
//! - [`PageFetcher`] — the fetch capability, with the `reqwest`-backed [`HttpFetcher`]
//! - [`document`] — a flattened, index-addressable view over parsed HTML
//! - [`scrape`] — seed discovery and per-page section/row extraction
//! - [`engine`] — the FIFO worklist traversal producing the raw pages map

pub mod document;
pub mod engine;
pub mod fetch;
pub mod scrape;

pub use engine::{CrawlResult, SiteCrawler, Worklist};
pub use fetch::{HttpFetcher, PageFetcher};
pub use scrape::{ScrapedPage, collect_seed_urls, extract_page, extract_seed_urls, scrape_page};
