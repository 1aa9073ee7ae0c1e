//! Seed discovery and single-page content extraction.

use std::sync::LazyLock;

use indexmap::IndexMap;
use regex::Regex;
use scraper::Html;
use tracing::{debug, info};
use url::Url;

use reqgraph_shared::{PageContent, ReqGraphError, Result, Row, SiteConfig};

use crate::document::{self, FlatDocument};
use crate::fetch::PageFetcher;

/// Absolute URLs embedded in heading text.
static EMBEDDED_URL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"http\S+").expect("embedded url regex"));

/// Content of one page plus the links discovered in its rows.
#[derive(Debug, Clone)]
pub struct ScrapedPage {
    pub content: PageContent,
    /// Row links resolved against the page URL, in row order (may repeat).
    pub child_urls: Vec<String>,
}

// ---------------------------------------------------------------------------
// Seed discovery
// ---------------------------------------------------------------------------

/// Fetch the navigation index and return the program page URLs it links to.
pub async fn collect_seed_urls<F>(fetcher: &F, site: &SiteConfig) -> Result<Vec<String>>
where
    F: PageFetcher + ?Sized,
{
    let body = fetcher.fetch(&site.index_url).await?;
    let seeds = extract_seed_urls(&body, site);

    info!(index = %site.index_url, count = seeds.len(), "collected seed pages");
    Ok(seeds)
}

/// Prefix-join every navigation href under the program path, in document order.
pub fn extract_seed_urls(html: &str, site: &SiteConfig) -> Vec<String> {
    let doc = Html::parse_document(html);

    document::links(&doc)
        .into_iter()
        .filter(|(href, _)| href.starts_with(&site.program_path_prefix))
        .map(|(href, _)| format!("{}{href}", site.url_prefix))
        .collect()
}

// ---------------------------------------------------------------------------
// Page scrape
// ---------------------------------------------------------------------------

/// Fetch `url` and extract its content and child links.
pub async fn scrape_page<F>(fetcher: &F, url: &str) -> Result<ScrapedPage>
where
    F: PageFetcher + ?Sized,
{
    let page_url =
        Url::parse(url).map_err(|e| ReqGraphError::parse(format!("invalid page URL {url}: {e}")))?;
    let body = fetcher.fetch(url).await?;
    let page = extract_page(&page_url, &body);

    debug!(%url, name = %page.content.name, "collected page content");
    Ok(page)
}

/// Extract the heading and table sections from an HTML page.
///
/// Each table's section holds every `<tr>` positioned after the table start in
/// the whole document, so sections of later tables are suffixes of earlier
/// ones.
pub fn extract_page(url: &Url, html: &str) -> ScrapedPage {
    let doc = Html::parse_document(html);
    let flat = FlatDocument::new(&doc);

    let name = flat
        .first("h2")
        .map(|h2| heading_text(&document::element_text(&h2)))
        .unwrap_or_else(|| url.to_string());

    let mut sections = IndexMap::new();
    let mut child_urls = Vec::new();

    for table in flat.positions("table") {
        let title = flat.preceding_sibling_text(table);
        let mut rows = Vec::new();

        for tr in flat.following(table, "tr") {
            let mut row = Row {
                name: document::element_text(&tr).trim().to_string(),
                url: String::new(),
            };

            if let Some(href) = document::first_link(&tr) {
                if let Ok(child) = url.join(&href) {
                    row.url = child.to_string();
                    child_urls.push(row.url.clone());
                }
            }

            rows.push(row);
        }

        sections.insert(title, rows);
    }

    ScrapedPage {
        content: PageContent { name, sections },
        child_urls,
    }
}

/// Strip embedded URLs from heading text and trim.
fn heading_text(raw: &str) -> String {
    EMBEDDED_URL_RE.replace_all(raw, "").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn load_fixture(name: &str) -> String {
        let path = format!("../../../fixtures/html/{name}");
        std::fs::read_to_string(&path).unwrap_or_else(|_| panic!("missing fixture: {path}"))
    }

    fn page_url() -> Url {
        Url::parse("https://www.opencaesar.io/firesat-example/programs/firesat.html").unwrap()
    }

    #[test]
    fn seeds_from_navigation_fixture() {
        let html = load_fixture("navigation.html");
        let seeds = extract_seed_urls(&html, &SiteConfig::default());

        assert_eq!(seeds, vec![
            "https://www.opencaesar.io/firesat-example/opencaesar.io/examples/firesat/programs/Program.html",
            "https://www.opencaesar.io/firesat-example/opencaesar.io/examples/firesat/programs/Mission.html",
            "https://www.opencaesar.io/firesat-example/opencaesar.io/examples/firesat/programs/Program.html",
        ]);
    }

    #[test]
    fn heading_strips_urls() {
        assert_eq!(
            heading_text("  Fire Detection https://example.com/x/y  "),
            "Fire Detection"
        );
        assert_eq!(heading_text("Plain"), "Plain");
    }

    #[test]
    fn program_fixture_extraction() {
        let html = load_fixture("program.html");
        let page = extract_page(&page_url(), &html);

        assert_eq!(page.content.name, "FireSat Program");
        assert_eq!(
            page.content.sections.keys().collect::<Vec<_>>(),
            vec!["Requirements", "Components"]
        );

        let requirements = page.content.sections.get("Requirements").unwrap();
        let components = page.content.sections.get("Components").unwrap();
        assert_eq!(requirements.len(), 3);
        assert_eq!(components.len(), 1);
        assert_eq!(requirements[2], components[0]);

        assert_eq!(requirements[0].name, "R1 Detect wildfires");
        assert_eq!(
            requirements[0].url,
            "https://www.opencaesar.io/firesat-example/programs/r1.html"
        );
        assert_eq!(requirements[1].url, "");
        assert_eq!(page.child_urls, vec![
            "https://www.opencaesar.io/firesat-example/programs/r1.html",
            "https://www.opencaesar.io/firesat-example/programs/sub/payload.html",
            "https://www.opencaesar.io/firesat-example/programs/sub/payload.html",
        ]);
    }

    #[test]
    fn cumulative_rows_across_tables() {
        let html = r#"<html><body>
            <h4>T1</h4><table><tr><td>r1</td></tr><tr><td>r2</td></tr></table>
            <h4>T2</h4><table><tr><td>r3</td></tr></table>
        </body></html>"#;
        let page = extract_page(&page_url(), html);

        let names = |title: &str| -> Vec<String> {
            page.content.sections.get(title).unwrap().iter().map(|r| r.name.clone()).collect()
        };
        assert_eq!(names("T1"), vec!["r1", "r2", "r3"]);
        assert_eq!(names("T2"), vec!["r3"]);
    }

    #[test]
    fn missing_heading_falls_back_to_url() {
        let page = extract_page(&page_url(), "<html><body><p>no heading</p></body></html>");
        assert_eq!(page.content.name, page_url().to_string());
        assert!(page.content.sections.is_empty());
        assert!(page.child_urls.is_empty());
    }

    #[test]
    fn duplicate_section_titles_last_wins() {
        let html = r#"<html><body>
            <h4>Same</h4><table><tr><td>a</td></tr></table>
            <h4>Same</h4><table><tr><td>b</td></tr></table>
        </body></html>"#;
        let page = extract_page(&page_url(), html);

        assert_eq!(page.content.sections.len(), 1);
        let rows = page.content.sections.get("Same").unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].name, "b");
    }
}
