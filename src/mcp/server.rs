//! Built-in document-publishing MCP server.
//!
//! Exposes the [`DocumentPublisher`] as MCP tools so the reasoning engine
//! can publish on its own initiative, with the same segmentation and
//! partial-failure policy as the orchestrator's publish path.

use std::sync::Arc;

use rmcp::handler::server::router::prompt::PromptRouter;
use rmcp::handler::server::router::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::{
    AnnotateAble, CallToolResult, Content, GetPromptRequestParams, GetPromptResult,
    Implementation, ListPromptsResult, ListResourcesResult, PaginatedRequestParams, PromptMessage,
    PromptMessageRole, ProtocolVersion, RawResource, ReadResourceRequestParams,
    ReadResourceResult, ResourceContents, ServerCapabilities, ServerInfo,
};
use rmcp::service::RequestContext;
use rmcp::{
    ErrorData as McpError, RoleServer, ServerHandler, prompt, prompt_handler, prompt_router, tool,
    tool_handler, tool_router,
};
use serde_json::{Value, json};
use tracing::info;

use super::params::{
    CreateAnalysisPageParams, CreateTableParams, DefaultPromptParams, SearchPagesParams,
};
use crate::error::PublishError;
use crate::publish::{
    DEFAULT_TABLE_TITLE, DocumentPublisher, NotionClient, PagePublisher, PublishRequest,
    WorkspaceConfig, table_blocks,
};

/// URI of the recent-pages resource.
pub const PAGES_RESOURCE_URI: &str = "workspace://pages";
/// Pages listed by the recent-pages resource.
const RECENT_PAGES: u32 = 20;
/// Default and maximum `search_pages` result counts.
const DEFAULT_PAGE_SIZE: u32 = 10;
const MAX_PAGE_SIZE: u32 = 100;

/// Opening assistant message of `default_prompt`.
pub const ASSISTANT_INTRO: &str = "You are a document workspace automation assistant. \
You can:
- create workspace pages from database analysis results
- turn query results into tables on an existing page
- search and list workspace pages
Store analysis results in a structured form so the team can share them.";

/// Document workspace MCP server.
#[derive(Clone)]
pub struct WorkspaceMcpServer {
    tool_router: ToolRouter<Self>,
    prompt_router: PromptRouter<Self>,
    publisher: Arc<DocumentPublisher>,
}

#[tool_router]
impl WorkspaceMcpServer {
    /// Publish analysis text as a new page.
    #[tool(
        name = "create_analysis_page",
        description = "Create a new workspace page holding analysis results. The page gets a heading with the title, and the text is stored as paragraphs of at most 2000 characters. Uses the configured parent page unless page_id is given. Returns JSON with the page id, URL, and how many blocks were written."
    )]
    async fn create_analysis_page(
        &self,
        Parameters(params): Parameters<CreateAnalysisPageParams>,
    ) -> Result<CallToolResult, McpError> {
        json_result(&self.publish_page(params).await?)
    }

    /// Append a text table to an existing page.
    #[tool(
        name = "create_table",
        description = "Append a table of rows to an existing page. Writes a heading, a bold header line with the column names, a divider, and one line per row. Columns come from the first row's keys."
    )]
    async fn create_table(
        &self,
        Parameters(params): Parameters<CreateTableParams>,
    ) -> Result<CallToolResult, McpError> {
        json_result(&self.append_table(params).await?)
    }

    /// Search workspace pages by title.
    #[tool(
        name = "search_pages",
        description = "Search workspace pages by title keyword. Returns id, title, url, and timestamps for each page. An empty query lists recent pages."
    )]
    async fn search_pages(
        &self,
        Parameters(params): Parameters<SearchPagesParams>,
    ) -> Result<CallToolResult, McpError> {
        json_result(&self.search(params).await?)
    }
}

#[prompt_router]
impl WorkspaceMcpServer {
    /// Introduces the workspace tools, then passes the user's message on.
    #[prompt(
        name = "default_prompt",
        description = "Start a conversation with the workspace assistant. Describes what the server can do, followed by your message."
    )]
    async fn default_prompt(
        &self,
        Parameters(params): Parameters<DefaultPromptParams>,
    ) -> Vec<PromptMessage> {
        vec![
            PromptMessage::new_text(PromptMessageRole::Assistant, ASSISTANT_INTRO.to_string()),
            PromptMessage::new_text(PromptMessageRole::User, params.message),
        ]
    }
}

#[tool_handler]
#[prompt_handler]
impl ServerHandler for WorkspaceMcpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2024_11_05,
            capabilities: ServerCapabilities::builder()
                .enable_tools()
                .enable_prompts()
                .enable_resources()
                .build(),
            server_info: Implementation {
                name: "querynote-workspace".to_string(),
                title: Some("querynote document workspace".to_string()),
                version: env!("CARGO_PKG_VERSION").to_string(),
                icons: None,
                website_url: None,
            },
            instructions: Some(
                "Publishes analysis results to the document workspace. Use \
                 `create_analysis_page` for text results, `create_table` for row data, \
                 and `search_pages` to find existing pages. The `default_prompt` prompt \
                 opens a conversation with an overview of these tools."
                    .to_string(),
            ),
        }
    }

    async fn list_resources(
        &self,
        _request: Option<PaginatedRequestParams>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListResourcesResult, McpError> {
        let mut raw = RawResource::new(PAGES_RESOURCE_URI, "Recent pages".to_string());
        raw.description = Some(format!("The {RECENT_PAGES} most recent workspace pages"));
        raw.mime_type = Some("application/json".to_string());

        Ok(ListResourcesResult {
            resources: vec![raw.no_annotation()],
            next_cursor: None,
            meta: None,
        })
    }

    async fn read_resource(
        &self,
        ReadResourceRequestParams { uri, .. }: ReadResourceRequestParams,
        _context: RequestContext<RoleServer>,
    ) -> Result<ReadResourceResult, McpError> {
        if uri != PAGES_RESOURCE_URI {
            return Err(McpError::resource_not_found(
                format!("Unknown resource: {uri}. Expected {PAGES_RESOURCE_URI}"),
                None,
            ));
        }

        let pages = self.recent_pages().await?;
        let content = serde_json::to_string_pretty(&pages)
            .map_err(|e| McpError::internal_error(format!("Serialization error: {e}"), None))?;

        Ok(ReadResourceResult {
            contents: vec![ResourceContents::text(content, uri)],
        })
    }
}

impl WorkspaceMcpServer {
    /// Creates a server publishing through `publisher`.
    #[must_use]
    pub fn new(publisher: Arc<DocumentPublisher>) -> Self {
        Self {
            tool_router: Self::tool_router(),
            prompt_router: Self::prompt_router(),
            publisher,
        }
    }

    /// Creates a server from workspace environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if the workspace configuration is incomplete or the
    /// HTTP client cannot be built.
    pub fn from_env() -> Result<Self, crate::error::Error> {
        let config = WorkspaceConfig::from_env()?;
        let client = NotionClient::new(&config).map_err(|e| {
            crate::error::CommandError::ExecutionFailed(format!("workspace client: {e}"))
        })?;
        let publisher = DocumentPublisher::new(Arc::new(client), config.parent_page_id);
        Ok(Self::new(Arc::new(publisher)))
    }

    pub(crate) async fn publish_page(
        &self,
        params: CreateAnalysisPageParams,
    ) -> Result<Value, McpError> {
        let mut request = PublishRequest::titled(params.title, params.analysis_data);
        if let Some(page_id) = params.page_id.filter(|p| !p.trim().is_empty()) {
            request = request.with_parent(page_id);
        }

        let outcome = self
            .publisher
            .publish(&request)
            .await
            .map_err(|e| match e {
                PublishError::InvalidInput { .. } => McpError::invalid_params(e.to_string(), None),
                PublishError::PageCreation(_) => McpError::internal_error(e.to_string(), None),
            })?;
        info!(page_id = %outcome.page.id, failed = outcome.failed, "analysis page published");

        Ok(json!({
            "success": outcome.is_complete(),
            "page_id": outcome.page.id,
            "url": outcome.page.url,
            "title": request.title,
            "blocks_total": outcome.blocks_total,
            "blocks_succeeded": outcome.succeeded,
            "blocks_failed": outcome.failed,
            "failures": outcome.failures,
        }))
    }

    pub(crate) async fn append_table(&self, params: CreateTableParams) -> Result<Value, McpError> {
        let title = params
            .table_title
            .unwrap_or_else(|| DEFAULT_TABLE_TITLE.to_string());
        let layout = table_blocks(&title, &params.rows)
            .map_err(|e| McpError::invalid_params(e.to_string(), None))?;

        let outcome = self
            .publisher
            .append_blocks(&params.page_id, &layout.blocks)
            .await;

        if outcome.succeeded == 0
            && let Some(first) = outcome.failures.first()
        {
            return Err(McpError::internal_error(
                format!("append-block: {}", first.message),
                None,
            ));
        }

        Ok(json!({
            "success": outcome.failures.is_empty(),
            "page_id": params.page_id,
            "table_title": title,
            "rows": layout.rows,
            "columns": layout.columns,
            "blocks_succeeded": outcome.succeeded,
            "blocks_failed": outcome.failed(),
        }))
    }

    pub(crate) async fn search(&self, params: SearchPagesParams) -> Result<Value, McpError> {
        let page_size = params
            .page_size
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE);
        let pages = self
            .publisher
            .api()
            .search_pages(&params.query, page_size)
            .await
            .map_err(|e| McpError::internal_error(format!("search failed: {e}"), None))?;

        Ok(json!({
            "query": params.query,
            "count": pages.len(),
            "pages": pages,
        }))
    }

    async fn recent_pages(&self) -> Result<Value, McpError> {
        self.search(SearchPagesParams {
            query: String::new(),
            page_size: Some(RECENT_PAGES),
        })
        .await
    }
}

fn json_result(value: &Value) -> Result<CallToolResult, McpError> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| McpError::internal_error(format!("Serialization error: {e}"), None))?;
    Ok(CallToolResult::success(vec![Content::text(json)]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::WorkspaceError;
    use crate::publish::publisher::tests::FakeWorkspace;

    use rmcp::model::PromptMessageContent;
    use serde_json::Map;

    fn server(ws: Arc<FakeWorkspace>) -> WorkspaceMcpServer {
        WorkspaceMcpServer::new(Arc::new(DocumentPublisher::new(ws, "root-page")))
    }

    #[test]
    fn test_server_info() {
        let info = server(Arc::new(FakeWorkspace::default())).get_info();
        assert_eq!(info.server_info.name, "querynote-workspace");
        assert!(info.capabilities.tools.is_some());
        assert!(info.capabilities.resources.is_some());
        assert!(info.capabilities.prompts.is_some());
    }

    #[test]
    fn test_default_prompt_is_listed() {
        let prompts = server(Arc::new(FakeWorkspace::default()))
            .prompt_router
            .list_all();
        assert_eq!(prompts.len(), 1);
        assert_eq!(prompts[0].name, "default_prompt");
        let args = prompts[0].arguments.clone().unwrap_or_default();
        assert_eq!(args.len(), 1);
        assert_eq!(args[0].name, "message");
        assert_eq!(args[0].required, Some(true));
    }

    #[tokio::test]
    async fn test_default_prompt_messages() {
        let messages = server(Arc::new(FakeWorkspace::default()))
            .default_prompt(Parameters(DefaultPromptParams {
                message: "Summarize last month's sales".to_string(),
            }))
            .await;

        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, PromptMessageRole::Assistant);
        assert_eq!(messages[1].role, PromptMessageRole::User);
        match &messages[1].content {
            PromptMessageContent::Text { text } => {
                assert_eq!(text, "Summarize last month's sales");
            }
            other => unreachable!("unexpected content: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_publish_page_reports_outcome() {
        let ws = Arc::new(FakeWorkspace::default());
        let value = server(Arc::clone(&ws))
            .publish_page(CreateAnalysisPageParams {
                title: "Top customers".to_string(),
                analysis_data: "a".repeat(2500),
                page_id: None,
            })
            .await
            .unwrap_or_else(|e| unreachable!("publish failed: {e:?}"));

        assert_eq!(value["success"], true);
        assert_eq!(value["page_id"], "page-1");
        assert_eq!(value["blocks_total"], 2);
        let created = ws.created.lock().map(|c| c.clone()).unwrap_or_default();
        assert_eq!(created[0].0, "root-page");
    }

    #[tokio::test]
    async fn test_publish_page_creation_failure() {
        let ws = Arc::new(FakeWorkspace {
            fail_create: Some(WorkspaceError::Http {
                status: 404,
                message: "Could not find page".to_string(),
            }),
            ..FakeWorkspace::default()
        });
        let err = server(ws)
            .publish_page(CreateAnalysisPageParams {
                title: "t".to_string(),
                analysis_data: "body".to_string(),
                page_id: Some("missing".to_string()),
            })
            .await
            .err();
        assert!(err.is_some_and(|e| e.message.contains("create-page")));
    }

    #[tokio::test]
    async fn test_append_table() {
        let ws = Arc::new(FakeWorkspace::default());
        let mut row = Map::new();
        row.insert("Artist".to_string(), Value::from("Iron Maiden"));
        row.insert("Albums".to_string(), Value::from(21));

        let value = server(Arc::clone(&ws))
            .append_table(CreateTableParams {
                page_id: "page-9".to_string(),
                rows: vec![row],
                table_title: None,
            })
            .await
            .unwrap_or_else(|e| unreachable!("append failed: {e:?}"));

        assert_eq!(value["table_title"], DEFAULT_TABLE_TITLE);
        assert_eq!(value["rows"], 1);
        assert_eq!(value["blocks_succeeded"], 4);
        assert_eq!(
            ws.landed_text(),
            format!("{DEFAULT_TABLE_TITLE}Albums | Artist21 | Iron Maiden")
        );
    }

    #[tokio::test]
    async fn test_append_table_rejects_empty_rows() {
        let err = server(Arc::new(FakeWorkspace::default()))
            .append_table(CreateTableParams {
                page_id: "p".to_string(),
                rows: Vec::new(),
                table_title: Some("t".to_string()),
            })
            .await
            .err();
        assert!(err.is_some());
    }

    #[tokio::test]
    async fn test_search_clamps_page_size() {
        let value = server(Arc::new(FakeWorkspace::default()))
            .search(SearchPagesParams {
                query: "sales".to_string(),
                page_size: Some(500),
            })
            .await
            .unwrap_or_else(|e| unreachable!("search failed: {e:?}"));
        assert_eq!(value["count"], 0);
        assert_eq!(value["query"], "sales");
    }
}
