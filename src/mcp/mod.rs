//! Model Context Protocol plumbing.
//!
//! Two sides live here:
//!
//! - the client side: [`ToolGateway`] launches the query-execution and
//!   document-publishing providers as child processes, merges their tool
//!   manifests and routes the reasoning engine's tool calls;
//! - the server side: [`WorkspaceMcpServer`] exposes the document
//!   publisher as an MCP provider over stdio (`querynote serve-workspace`).
//!
//! ```text
//! ReasoningEngine
//!   ↓ ToolCall { name, arguments }
//! ToolGateway ── routing table ──┬── Query provider      (child process)
//!                                └── Publishing provider (child process)
//!                                       └── serve-workspace → DocumentPublisher
//! ```

pub mod client;
pub mod config;
pub mod gateway;
pub mod params;
pub mod server;
pub mod transport;

use std::fmt;

use serde::Serialize;

pub use client::{McpProvider, StdioConnector};
pub use config::{GatewayConfig, GatewayConfigBuilder, ProviderSpec};
pub use gateway::{ProviderConnector, ProviderTool, ToolGateway, ToolProvider};
pub use server::WorkspaceMcpServer;
pub use transport::serve_stdio;

/// The two tool providers a session depends on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// Runs queries against the relational database.
    Query,
    /// Creates and fills pages in the document workspace.
    Publishing,
}

impl ProviderKind {
    /// Both providers in connection order.
    pub const ALL: [Self; 2] = [Self::Query, Self::Publishing];

    /// Returns the lowercase name used in logs and messages.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Query => "query",
            Self::Publishing => "publishing",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
