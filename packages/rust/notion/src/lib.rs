//! Pure Notion REST API client.
//!
//! Exposes the two capabilities the table normalizer needs through the
//! [`RecordSource`] trait: read every row of a database, and render a row's
//! page body as Markdown.

pub mod render;
pub mod types;

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use tracing::debug;

use reqgraph_shared::{ReqGraphError, Result};

pub use types::{Block, Record};
use types::{PAGE_SIZE, Paginated, QueryRequest};

const BASE_URL: &str = "https://api.notion.com/v1";

const USER_AGENT: &str = concat!("reqgraph/", env!("CARGO_PKG_VERSION"));

/// API version pinned in every request.
const NOTION_VERSION: &str = "2022-06-28";

/// Nested blocks deeper than this are not rendered.
const MAX_BLOCK_DEPTH: usize = 8;

/// Source of database records and their rendered bodies.
#[async_trait]
pub trait RecordSource: Send + Sync {
    /// Every record of the collection, in the collection's natural order.
    async fn query_all(&self, collection_id: &str) -> Result<Vec<Record>>;

    /// The record's page content rendered as Markdown.
    async fn render_body(&self, record_id: &str) -> Result<String>;
}

pub struct NotionClient {
    client: Client,
    token: String,
    base_url: String,
}

impl NotionClient {
    /// Create a client whose requests time out after `timeout_secs`.
    pub fn new(token: impl Into<String>, timeout_secs: u64) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| ReqGraphError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            token: token.into(),
            base_url: BASE_URL.to_string(),
        })
    }

    /// Point the client at another API root (proxies, mock servers).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .bearer_auth(&self.token)
            .header("Notion-Version", NOTION_VERSION)
    }

    /// Every child of `block_id` via `GET /blocks/{id}/children`, following cursors.
    async fn list_children(&self, block_id: &str) -> Result<Vec<Block>> {
        let url = format!("{}/blocks/{block_id}/children", self.base_url);
        let mut blocks = Vec::new();
        let mut cursor: Option<String> = None;

        loop {
            let mut request = self
                .client
                .get(&url)
                .query(&[("page_size", PAGE_SIZE.to_string())]);
            if let Some(c) = &cursor {
                request = request.query(&[("start_cursor", c)]);
            }

            let page: Paginated<Block> = read_json(self.authorized(request)).await?;
            blocks.extend(page.results);

            match (page.has_more, page.next_cursor) {
                (true, Some(next)) => cursor = Some(next),
                _ => break,
            }
        }

        Ok(blocks)
    }

    /// Render the children of `block_id`, recursing into nested blocks.
    fn render_children<'a>(
        &'a self,
        block_id: &'a str,
        depth: usize,
    ) -> Pin<Box<dyn Future<Output = Result<String>> + Send + 'a>> {
        Box::pin(async move {
            let blocks = self.list_children(block_id).await?;
            let mut rendered: Vec<(String, String)> = Vec::new();
            let mut number = 0;

            for block in &blocks {
                number = if block.kind == "numbered_list_item" {
                    number + 1
                } else {
                    0
                };

                let Some(mut text) = render::render_block(block, number) else {
                    continue;
                };

                if block.has_children && depth < MAX_BLOCK_DEPTH {
                    let children = self.render_children(&block.id, depth + 1).await?;
                    if !children.is_empty() {
                        text.push('\n');
                        text.push_str(&render::indent(&children));
                    }
                }

                rendered.push((block.kind.clone(), text));
            }

            Ok(render::join_blocks(&rendered))
        })
    }
}

#[async_trait]
impl RecordSource for NotionClient {
    async fn query_all(&self, collection_id: &str) -> Result<Vec<Record>> {
        let url = format!("{}/databases/{collection_id}/query", self.base_url);
        let mut records = Vec::new();
        let mut start_cursor: Option<String> = None;

        loop {
            let body = QueryRequest {
                page_size: PAGE_SIZE,
                start_cursor: start_cursor.take(),
            };
            let request = self.authorized(self.client.post(&url).json(&body));
            let page: Paginated<Record> = read_json(request).await?;

            debug!(collection_id, fetched = page.results.len(), "fetched database page");
            records.extend(page.results);

            match (page.has_more, page.next_cursor) {
                (true, Some(next)) => start_cursor = Some(next),
                _ => break,
            }
        }

        Ok(records)
    }

    async fn render_body(&self, record_id: &str) -> Result<String> {
        self.render_children(record_id, 0).await
    }
}

/// Send a request and decode a successful JSON response.
async fn read_json<T: DeserializeOwned>(request: RequestBuilder) -> Result<T> {
    let response = request
        .send()
        .await
        .map_err(|e| ReqGraphError::Network(e.to_string()))?;
    let response = check_status(response).await?;

    response
        .json::<T>()
        .await
        .map_err(|e| ReqGraphError::Serialization(format!("invalid API response: {e}")))
}

async fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let message = response.text().await.unwrap_or_default();
    Err(ReqGraphError::Api {
        status: status.as_u16(),
        message,
    })
}
