//! Tool-provider gateway.
//!
//! Connects both providers, unions their manifests into one [`ToolSet`] and
//! routes each tool call to the provider that owns the tool. Connection is
//! all-or-nothing: if either provider fails, whatever did connect is closed
//! again and the caller learns which provider failed.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use super::ProviderKind;
use super::config::{GatewayConfig, ProviderSpec};
use crate::agent::executor::ToolExecutor;
use crate::agent::tool::{ToolCall, ToolDefinition, ToolResult, ToolSet};
use crate::error::GatewayError;

/// A tool as advertised by its provider.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderTool {
    /// Tool name, unique across both providers.
    pub name: String,
    /// Description shown to the model.
    pub description: String,
    /// JSON Schema of the tool's arguments.
    pub input_schema: Value,
}

impl From<ProviderTool> for ToolDefinition {
    fn from(tool: ProviderTool) -> Self {
        Self {
            name: tool.name,
            description: tool.description,
            parameters: tool.input_schema,
        }
    }
}

/// A live connection to one tool provider.
#[async_trait]
pub trait ToolProvider: Send + Sync {
    /// Which provider this is.
    fn kind(&self) -> ProviderKind;

    /// Reads the provider's tool manifest.
    async fn list_tools(&self) -> Result<Vec<ProviderTool>, GatewayError>;

    /// Invokes a tool and returns its text output.
    async fn call_tool(
        &self,
        name: &str,
        arguments: Map<String, Value>,
    ) -> Result<String, GatewayError>;

    /// Tears the connection down. Calling it twice is harmless.
    async fn close(&self);
}

/// Opens provider connections.
#[async_trait]
pub trait ProviderConnector: Send + Sync {
    /// Launches and initialises one provider.
    async fn connect(
        &self,
        kind: ProviderKind,
        spec: &ProviderSpec,
    ) -> Result<Box<dyn ToolProvider>, GatewayError>;
}

/// Both provider connections plus the merged tool pool.
pub struct ToolGateway {
    providers: Vec<Box<dyn ToolProvider>>,
    routes: HashMap<String, ProviderKind>,
    tools: Vec<(ProviderKind, ToolDefinition)>,
    closed: AtomicBool,
}

impl ToolGateway {
    /// Connects the query provider, then the publishing provider, and
    /// merges their manifests.
    ///
    /// # Errors
    ///
    /// Returns the first [`GatewayError`] encountered: a provider that
    /// cannot be reached, a manifest that cannot be read, or a tool name
    /// exposed by both providers. Any provider already connected is closed
    /// before returning.
    pub async fn connect(
        config: &GatewayConfig,
        connector: &dyn ProviderConnector,
    ) -> Result<Self, GatewayError> {
        let mut providers: Vec<Box<dyn ToolProvider>> = Vec::with_capacity(2);

        for kind in ProviderKind::ALL {
            let spec = match kind {
                ProviderKind::Query => &config.query,
                ProviderKind::Publishing => &config.publishing,
            };
            info!(provider = %kind, command = %spec.display_command(), "connecting tool provider");

            match connector.connect(kind, spec).await {
                Ok(provider) => providers.push(provider),
                Err(e) => {
                    warn!(provider = %kind, error = %e, "tool provider connection failed");
                    close_all(&providers).await;
                    return Err(e);
                }
            }
        }

        Self::from_providers(providers).await
    }

    /// Builds a gateway from already-connected providers.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Manifest`] or [`GatewayError::DuplicateTool`].
    /// Every provider is closed on failure.
    pub async fn from_providers(
        providers: Vec<Box<dyn ToolProvider>>,
    ) -> Result<Self, GatewayError> {
        let mut routes = HashMap::new();
        let mut tools = Vec::new();

        for provider in &providers {
            let kind = provider.kind();
            let manifest = match provider.list_tools().await {
                Ok(m) => m,
                Err(e) => {
                    close_all(&providers).await;
                    return Err(e);
                }
            };
            info!(provider = %kind, tool_count = manifest.len(), "tool manifest loaded");

            for tool in manifest {
                if routes.insert(tool.name.clone(), kind).is_some() {
                    close_all(&providers).await;
                    return Err(GatewayError::DuplicateTool { name: tool.name });
                }
                tools.push((kind, ToolDefinition::from(tool)));
            }
        }

        Ok(Self {
            providers,
            routes,
            tools,
            closed: AtomicBool::new(false),
        })
    }

    /// The merged tool pool offered to the reasoning engine.
    #[must_use]
    pub fn tool_set(&self) -> ToolSet {
        ToolSet::from_definitions(self.tools.iter().map(|(_, d)| d.clone()).collect())
    }

    /// Tools owned by one provider, in manifest order.
    pub fn tools_of(&self, kind: ProviderKind) -> impl Iterator<Item = &ToolDefinition> {
        self.tools
            .iter()
            .filter(move |(k, _)| *k == kind)
            .map(|(_, d)| d)
    }

    /// Returns the provider that owns `tool`.
    #[must_use]
    pub fn route(&self, tool: &str) -> Option<ProviderKind> {
        self.routes.get(tool).copied()
    }

    /// Calls a tool with JSON-encoded arguments. Empty arguments mean `{}`.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Closed`] after [`close`](Self::close),
    /// [`GatewayError::UnknownTool`], [`GatewayError::InvalidArguments`],
    /// or the provider's failure.
    pub async fn call(&self, tool: &str, arguments: &str) -> Result<String, GatewayError> {
        let kind = self.route(tool).ok_or_else(|| GatewayError::UnknownTool {
            name: tool.to_string(),
        })?;
        if self.closed.load(Ordering::SeqCst) {
            return Err(GatewayError::Closed { provider: kind });
        }

        let args = parse_arguments(tool, arguments)?;
        let provider = self
            .providers
            .iter()
            .find(|p| p.kind() == kind)
            .ok_or(GatewayError::Closed { provider: kind })?;

        debug!(provider = %kind, tool, "routing tool call");
        provider.call_tool(tool, args).await
    }

    /// Closes both provider connections.
    pub async fn close(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        close_all(&self.providers).await;
    }

    /// Returns `true` once [`close`](Self::close) has run.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

impl std::fmt::Debug for ToolGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolGateway")
            .field("tools", &self.routes.len())
            .field("closed", &self.is_closed())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl ToolExecutor for ToolGateway {
    async fn execute(&self, call: &ToolCall) -> ToolResult {
        match self.call(&call.name, &call.arguments).await {
            Ok(content) => ToolResult {
                tool_call_id: call.id.clone(),
                content,
                is_error: false,
            },
            Err(e) => {
                warn!(tool = call.name, error = %e, "tool call failed");
                ToolResult {
                    tool_call_id: call.id.clone(),
                    content: e.to_string(),
                    is_error: true,
                }
            }
        }
    }

    fn provider_of(&self, tool: &str) -> Option<ProviderKind> {
        self.route(tool)
    }
}

async fn close_all(providers: &[Box<dyn ToolProvider>]) {
    for provider in providers {
        info!(provider = %provider.kind(), "closing tool provider");
        provider.close().await;
    }
}

fn parse_arguments(tool: &str, arguments: &str) -> Result<Map<String, Value>, GatewayError> {
    if arguments.trim().is_empty() {
        return Ok(Map::new());
    }
    match serde_json::from_str::<Value>(arguments) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(Value::Null) => Ok(Map::new()),
        Ok(other) => Err(GatewayError::InvalidArguments {
            name: tool.to_string(),
            message: format!("expected a JSON object, got {other}"),
        }),
        Err(e) => Err(GatewayError::InvalidArguments {
            name: tool.to_string(),
            message: e.to_string(),
        }),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    use std::sync::{Arc, Mutex};

    use serde_json::json;

    /// Shared log of provider lifecycle events.
    pub(crate) type EventLog = Arc<Mutex<Vec<String>>>;

    pub(crate) struct FakeProvider {
        pub kind: ProviderKind,
        pub tools: Vec<&'static str>,
        pub events: EventLog,
        pub fail_manifest: bool,
    }

    impl FakeProvider {
        fn record(&self, event: String) {
            if let Ok(mut events) = self.events.lock() {
                events.push(event);
            }
        }
    }

    #[async_trait]
    impl ToolProvider for FakeProvider {
        fn kind(&self) -> ProviderKind {
            self.kind
        }

        async fn list_tools(&self) -> Result<Vec<ProviderTool>, GatewayError> {
            if self.fail_manifest {
                return Err(GatewayError::Manifest {
                    provider: self.kind,
                    message: "broken pipe".to_string(),
                });
            }
            Ok(self
                .tools
                .iter()
                .map(|name| ProviderTool {
                    name: (*name).to_string(),
                    description: format!("{name} tool"),
                    input_schema: json!({"type": "object", "properties": {}}),
                })
                .collect())
        }

        async fn call_tool(
            &self,
            name: &str,
            arguments: Map<String, Value>,
        ) -> Result<String, GatewayError> {
            self.record(format!("call {} {name}", self.kind));
            if name == "explode" {
                return Err(GatewayError::ToolCall {
                    provider: self.kind,
                    tool: name.to_string(),
                    message: "no such table: Foo".to_string(),
                });
            }
            Ok(Value::Object(arguments).to_string())
        }

        async fn close(&self) {
            self.record(format!("close {}", self.kind));
        }
    }

    /// Connector that hands out fake providers, failing on request.
    pub(crate) struct FakeConnector {
        pub events: EventLog,
        pub fail: Option<ProviderKind>,
        pub query_tools: Vec<&'static str>,
        pub publishing_tools: Vec<&'static str>,
        pub fail_manifest: Option<ProviderKind>,
    }

    impl FakeConnector {
        pub(crate) fn new() -> Self {
            Self {
                events: Arc::new(Mutex::new(Vec::new())),
                fail: None,
                query_tools: vec!["run_query", "list_tables"],
                publishing_tools: vec!["create_analysis_page", "search_pages"],
                fail_manifest: None,
            }
        }

        pub(crate) fn events(&self) -> Vec<String> {
            self.events.lock().map(|e| e.clone()).unwrap_or_default()
        }
    }

    #[async_trait]
    impl ProviderConnector for FakeConnector {
        async fn connect(
            &self,
            kind: ProviderKind,
            _spec: &ProviderSpec,
        ) -> Result<Box<dyn ToolProvider>, GatewayError> {
            if self.fail == Some(kind) {
                return Err(GatewayError::Connection {
                    provider: kind,
                    message: "spawn failed".to_string(),
                });
            }
            if let Ok(mut events) = self.events.lock() {
                events.push(format!("connect {kind}"));
            }
            let tools = match kind {
                ProviderKind::Query => self.query_tools.clone(),
                ProviderKind::Publishing => self.publishing_tools.clone(),
            };
            Ok(Box::new(FakeProvider {
                kind,
                tools,
                events: Arc::clone(&self.events),
                fail_manifest: self.fail_manifest == Some(kind),
            }))
        }
    }

    pub(crate) fn config() -> GatewayConfig {
        GatewayConfig {
            query: ProviderSpec::default_query(),
            publishing: ProviderSpec::new("querynote", ["serve-workspace"]),
        }
    }

    async fn connected(connector: &FakeConnector) -> ToolGateway {
        ToolGateway::connect(&config(), connector)
            .await
            .unwrap_or_else(|e| unreachable!("connect failed: {e}"))
    }

    #[tokio::test]
    async fn test_connect_merges_manifests() {
        let connector = FakeConnector::new();
        let gateway = connected(&connector).await;

        let set = gateway.tool_set();
        assert_eq!(set.len(), 4);
        assert_eq!(gateway.route("run_query"), Some(ProviderKind::Query));
        assert_eq!(
            gateway.route("create_analysis_page"),
            Some(ProviderKind::Publishing)
        );
        assert_eq!(gateway.tools_of(ProviderKind::Publishing).count(), 2);
        assert_eq!(connector.events(), vec!["connect query", "connect publishing"]);
    }

    #[tokio::test]
    async fn test_publishing_connect_failure_closes_query_provider() {
        let mut connector = FakeConnector::new();
        connector.fail = Some(ProviderKind::Publishing);

        let err = ToolGateway::connect(&config(), &connector).await.err();
        match err {
            Some(GatewayError::Connection { provider, .. }) => {
                assert_eq!(provider, ProviderKind::Publishing);
            }
            other => unreachable!("unexpected: {other:?}"),
        }
        assert_eq!(connector.events(), vec!["connect query", "close query"]);
    }

    #[tokio::test]
    async fn test_query_connect_failure_never_launches_publishing() {
        let mut connector = FakeConnector::new();
        connector.fail = Some(ProviderKind::Query);

        let err = ToolGateway::connect(&config(), &connector).await.err();
        assert!(matches!(
            err,
            Some(GatewayError::Connection {
                provider: ProviderKind::Query,
                ..
            })
        ));
        assert!(connector.events().is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_tool_rejected() {
        let mut connector = FakeConnector::new();
        connector.publishing_tools = vec!["run_query"];

        let err = ToolGateway::connect(&config(), &connector).await.err();
        assert!(matches!(err, Some(GatewayError::DuplicateTool { ref name }) if name == "run_query"));
        let events = connector.events();
        assert!(events.contains(&"close query".to_string()));
        assert!(events.contains(&"close publishing".to_string()));
    }

    #[tokio::test]
    async fn test_manifest_failure_closes_everything() {
        let mut connector = FakeConnector::new();
        connector.fail_manifest = Some(ProviderKind::Publishing);

        let err = ToolGateway::connect(&config(), &connector).await.err();
        assert!(matches!(err, Some(GatewayError::Manifest { .. })));
        assert_eq!(
            connector.events(),
            vec![
                "connect query",
                "connect publishing",
                "close query",
                "close publishing"
            ]
        );
    }

    #[tokio::test]
    async fn test_call_routes_to_owner() {
        let connector = FakeConnector::new();
        let gateway = connected(&connector).await;

        let out = gateway
            .call("search_pages", r#"{"query":"sales"}"#)
            .await
            .unwrap_or_else(|e| unreachable!("call failed: {e}"));
        assert_eq!(out, r#"{"query":"sales"}"#);
        assert!(connector.events().contains(&"call publishing search_pages".to_string()));
    }

    #[tokio::test]
    async fn test_empty_arguments_are_empty_object() {
        let connector = FakeConnector::new();
        let gateway = connected(&connector).await;
        let out = gateway
            .call("list_tables", "  ")
            .await
            .unwrap_or_else(|e| unreachable!("call failed: {e}"));
        assert_eq!(out, "{}");
    }

    #[tokio::test]
    async fn test_invalid_arguments() {
        let connector = FakeConnector::new();
        let gateway = connected(&connector).await;
        assert!(matches!(
            gateway.call("run_query", "[1,2]").await,
            Err(GatewayError::InvalidArguments { .. })
        ));
        assert!(matches!(
            gateway.call("run_query", "{not json").await,
            Err(GatewayError::InvalidArguments { .. })
        ));
    }

    #[tokio::test]
    async fn test_executor_turns_failures_into_error_results() {
        let mut connector = FakeConnector::new();
        connector.query_tools = vec!["explode"];
        let gateway = connected(&connector).await;

        let result = gateway
            .execute(&ToolCall {
                id: "call_1".to_string(),
                name: "explode".to_string(),
                arguments: "{}".to_string(),
            })
            .await;
        assert!(result.is_error);
        assert_eq!(result.tool_call_id, "call_1");
        assert!(result.content.contains("no such table"));

        let unknown = gateway
            .execute(&ToolCall {
                id: "call_2".to_string(),
                name: "nope".to_string(),
                arguments: String::new(),
            })
            .await;
        assert!(unknown.is_error);
        assert_eq!(gateway.provider_of("explode"), Some(ProviderKind::Query));
    }

    #[tokio::test]
    async fn test_close_is_idempotent_and_blocks_calls() {
        let connector = FakeConnector::new();
        let gateway = connected(&connector).await;

        gateway.close().await;
        gateway.close().await;

        let closes = connector
            .events()
            .iter()
            .filter(|e| e.starts_with("close"))
            .count();
        assert_eq!(closes, 2);
        assert!(matches!(
            gateway.call("run_query", "{}").await,
            Err(GatewayError::Closed {
                provider: ProviderKind::Query
            })
        ));
    }
}
