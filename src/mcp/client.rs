//! MCP client side: providers launched as child processes speaking MCP
//! over stdio.

use std::process::Stdio;

use async_trait::async_trait;
use rmcp::model::{CallToolRequestParams, CallToolResult, ClientInfo, Implementation};
use rmcp::service::{Peer, RunningService};
use rmcp::transport::child_process::TokioChildProcess;
use rmcp::{RoleClient, serve_client};
use serde_json::{Map, Value, json};
use tokio::process::Command;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::ProviderKind;
use super::config::ProviderSpec;
use super::gateway::{ProviderConnector, ProviderTool, ToolProvider};
use crate::error::GatewayError;

/// A connected MCP provider.
pub struct McpProvider {
    kind: ProviderKind,
    peer: Peer<RoleClient>,
    /// Owns the transport; dropping or cancelling it stops the child.
    service: Mutex<Option<RunningService<RoleClient, ClientInfo>>>,
}

impl McpProvider {
    /// Launches `spec` and performs the MCP handshake.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Connection`] if the process cannot be spawned
    /// or the handshake fails.
    pub async fn launch(kind: ProviderKind, spec: &ProviderSpec) -> Result<Self, GatewayError> {
        let connection_error = |message: String| GatewayError::Connection {
            provider: kind,
            message,
        };

        let mut cmd = Command::new(&spec.command);
        cmd.args(&spec.args);
        for (key, value) in &spec.env {
            cmd.env(key, value);
        }
        cmd.stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null());

        let transport = TokioChildProcess::new(cmd)
            .map_err(|e| connection_error(format!("failed to spawn '{}': {e}", spec.command)))?;

        let client_info = ClientInfo {
            client_info: Implementation {
                name: env!("CARGO_PKG_NAME").to_string(),
                title: Some("querynote".to_string()),
                version: env!("CARGO_PKG_VERSION").to_string(),
                icons: None,
                website_url: None,
            },
            ..Default::default()
        };

        let service = serve_client(client_info, transport)
            .await
            .map_err(|e| connection_error(format!("MCP handshake failed: {e}")))?;
        let peer = service.peer().clone();

        info!(provider = %kind, "tool provider connected");

        Ok(Self {
            kind,
            peer,
            service: Mutex::new(Some(service)),
        })
    }

    async fn ensure_open(&self) -> Result<(), GatewayError> {
        if self.service.lock().await.is_none() {
            return Err(GatewayError::Closed {
                provider: self.kind,
            });
        }
        Ok(())
    }
}

impl std::fmt::Debug for McpProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("McpProvider")
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl ToolProvider for McpProvider {
    fn kind(&self) -> ProviderKind {
        self.kind
    }

    async fn list_tools(&self) -> Result<Vec<ProviderTool>, GatewayError> {
        self.ensure_open().await?;
        let tools = self
            .peer
            .list_all_tools()
            .await
            .map_err(|e| GatewayError::Manifest {
                provider: self.kind,
                message: e.to_string(),
            })?;

        Ok(tools
            .into_iter()
            .map(|tool| ProviderTool {
                name: tool.name.to_string(),
                description: tool.description.as_deref().unwrap_or("").to_string(),
                input_schema: serde_json::to_value(tool.input_schema.as_ref())
                    .unwrap_or_else(|_| json!({"type": "object", "properties": {}})),
            })
            .collect())
    }

    async fn call_tool(
        &self,
        name: &str,
        arguments: Map<String, Value>,
    ) -> Result<String, GatewayError> {
        self.ensure_open().await?;
        debug!(provider = %self.kind, tool = name, "calling MCP tool");

        let result: CallToolResult = self
            .peer
            .call_tool(CallToolRequestParams {
                meta: None,
                name: name.to_string().into(),
                arguments: Some(arguments),
                task: None,
            })
            .await
            .map_err(|e| GatewayError::ToolCall {
                provider: self.kind,
                tool: name.to_string(),
                message: e.to_string(),
            })?;

        let text = result
            .content
            .iter()
            .filter_map(|c| c.as_text().map(|t| t.text.to_string()))
            .collect::<Vec<_>>()
            .join("\n");

        if result.is_error.unwrap_or(false) {
            return Err(GatewayError::ToolCall {
                provider: self.kind,
                tool: name.to_string(),
                message: text,
            });
        }

        if text.is_empty() {
            Ok("(empty result)".to_string())
        } else {
            Ok(text)
        }
    }

    async fn close(&self) {
        let Some(service) = self.service.lock().await.take() else {
            return;
        };
        match service.cancel().await {
            Ok(reason) => info!(provider = %self.kind, ?reason, "tool provider closed"),
            Err(e) => warn!(provider = %self.kind, error = %e, "tool provider shutdown failed"),
        }
    }
}

/// [`ProviderConnector`] that launches [`McpProvider`]s.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdioConnector;

#[async_trait]
impl ProviderConnector for StdioConnector {
    async fn connect(
        &self,
        kind: ProviderKind,
        spec: &ProviderSpec,
    ) -> Result<Box<dyn ToolProvider>, GatewayError> {
        let env_keys: Vec<&str> = spec.env.iter().map(|(k, _)| k.as_str()).collect();
        debug!(
            provider = %kind,
            command = %spec.command,
            args = ?spec.args,
            env_vars = ?env_keys,
            "spawning tool provider"
        );
        Ok(Box::new(McpProvider::launch(kind, spec).await?))
    }
}
