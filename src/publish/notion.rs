//! Document workspace API client.
//!
//! [`WorkspaceApi`] is the seam the publisher and the built-in workspace
//! server depend on; [`NotionClient`] implements it over the Notion REST
//! API with `reqwest`.

use async_trait::async_trait;
use reqwest::{Client, Method};
use serde::Serialize;
use serde_json::{Value, json};
use tracing::debug;

use super::block::{Block, to_children};
use super::config::{API_VERSION, WorkspaceConfig};
use crate::error::WorkspaceError;

/// Identifier and public URL of a page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageHandle {
    /// Page identifier.
    pub id: String,
    /// Public URL.
    pub url: String,
}

/// A page returned by workspace search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageSummary {
    /// Page identifier.
    pub id: String,
    /// Page title, or `Untitled`.
    pub title: String,
    /// Public URL.
    pub url: String,
    /// Creation timestamp as reported by the API.
    pub created_time: Option<String>,
    /// Last edit timestamp as reported by the API.
    pub last_edited_time: Option<String>,
}

/// Operations against a document workspace.
///
/// Each call is a single request/response exchange; implementations must
/// not retry.
#[async_trait]
pub trait WorkspaceApi: Send + Sync {
    /// Creates a page under `parent_page_id` with the given title and
    /// initial children.
    async fn create_page(
        &self,
        parent_page_id: &str,
        title: &str,
        children: &[Block],
    ) -> Result<PageHandle, WorkspaceError>;

    /// Appends blocks to the end of a page (or block).
    async fn append_blocks(&self, page_id: &str, blocks: &[Block]) -> Result<(), WorkspaceError>;

    /// Searches pages by title keyword. An empty query lists recent pages.
    async fn search_pages(
        &self,
        query: &str,
        page_size: u32,
    ) -> Result<Vec<PageSummary>, WorkspaceError>;
}

/// Notion REST API client.
pub struct NotionClient {
    http: Client,
    base_url: String,
    token: String,
}

impl NotionClient {
    /// Creates a client from workspace configuration.
    ///
    /// # Errors
    ///
    /// Returns [`WorkspaceError::Transport`] if the HTTP client cannot be built.
    pub fn new(config: &WorkspaceConfig) -> Result<Self, WorkspaceError> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build().map_err(|e| WorkspaceError::Transport {
            message: format!("failed to build HTTP client: {e}"),
        })?;

        Ok(Self {
            http,
            base_url: config.base_url.clone(),
            token: config.token.clone(),
        })
    }

    /// Sends one request and decodes the JSON response.
    async fn send(
        &self,
        method: Method,
        endpoint: &str,
        body: &Value,
    ) -> Result<Value, WorkspaceError> {
        let url = format!("{}/{endpoint}", self.base_url);
        debug!(%method, endpoint, "workspace request");

        let response = self
            .http
            .request(method, &url)
            .bearer_auth(&self.token)
            .header("Notion-Version", API_VERSION)
            .json(body)
            .send()
            .await
            .map_err(|e| WorkspaceError::Transport {
                message: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(WorkspaceError::Http {
                status: status.as_u16(),
                message: error_message(&text),
            });
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| WorkspaceError::Decode {
                message: e.to_string(),
            })
    }
}

impl std::fmt::Debug for NotionClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotionClient")
            .field("base_url", &self.base_url)
            .field("token", &"<redacted>")
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl WorkspaceApi for NotionClient {
    async fn create_page(
        &self,
        parent_page_id: &str,
        title: &str,
        children: &[Block],
    ) -> Result<PageHandle, WorkspaceError> {
        let body = create_page_body(parent_page_id, title, children);
        let response = self.send(Method::POST, "pages", &body).await?;
        parse_page_handle(&response)
    }

    async fn append_blocks(&self, page_id: &str, blocks: &[Block]) -> Result<(), WorkspaceError> {
        let body = json!({ "children": to_children(blocks) });
        self.send(Method::PATCH, &format!("blocks/{page_id}/children"), &body)
            .await
            .map(|_| ())
    }

    async fn search_pages(
        &self,
        query: &str,
        page_size: u32,
    ) -> Result<Vec<PageSummary>, WorkspaceError> {
        let body = json!({ "query": query, "page_size": page_size });
        let response = self.send(Method::POST, "search", &body).await?;
        Ok(parse_search_results(&response))
    }
}

/// Builds the request body for page creation.
#[must_use]
pub fn create_page_body(parent_page_id: &str, title: &str, children: &[Block]) -> Value {
    json!({
        "parent": { "page_id": parent_page_id },
        "properties": {
            "title": {
                "title": [{ "text": { "content": title } }]
            }
        },
        "children": to_children(children)
    })
}

/// Extracts the page handle from a create-page response.
///
/// # Errors
///
/// Returns [`WorkspaceError::Decode`] if `id` or `url` is missing.
pub fn parse_page_handle(response: &Value) -> Result<PageHandle, WorkspaceError> {
    let field = |name: &str| {
        response
            .get(name)
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| WorkspaceError::Decode {
                message: format!("page response has no '{name}'"),
            })
    };
    Ok(PageHandle {
        id: field("id")?,
        url: field("url")?,
    })
}

/// Collects page entries from a search response, skipping databases.
#[must_use]
pub fn parse_search_results(response: &Value) -> Vec<PageSummary> {
    response
        .get("results")
        .and_then(Value::as_array)
        .map(|results| {
            results
                .iter()
                .filter(|r| r.get("object").and_then(Value::as_str) == Some("page"))
                .filter_map(|page| {
                    let str_field =
                        |name: &str| page.get(name).and_then(Value::as_str).map(str::to_string);
                    Some(PageSummary {
                        id: str_field("id")?,
                        title: extract_page_title(page),
                        url: str_field("url").unwrap_or_default(),
                        created_time: str_field("created_time"),
                        last_edited_time: str_field("last_edited_time"),
                    })
                })
                .collect()
        })
        .unwrap_or_default()
}

/// Returns the first title property's text, or `Untitled`.
#[must_use]
pub fn extract_page_title(page: &Value) -> String {
    page.get("properties")
        .and_then(Value::as_object)
        .and_then(|props| {
            props.values().find_map(|prop| {
                if prop.get("type").and_then(Value::as_str) != Some("title") {
                    return None;
                }
                let first = prop.get("title")?.as_array()?.first()?;
                first
                    .get("plain_text")
                    .or_else(|| first.get("text").and_then(|t| t.get("content")))
                    .and_then(Value::as_str)
                    .map(str::to_string)
            })
        })
        .unwrap_or_else(|| "Untitled".to_string())
}

/// Pulls the provider's `message` out of an error body, falling back to
/// the raw body.
fn error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.get("message").and_then(Value::as_str).map(str::to_string))
        .unwrap_or_else(|| body.trim().to_string())
}
