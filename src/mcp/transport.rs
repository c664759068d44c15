//! MCP stdio transport for the built-in workspace server.

use rmcp::ServiceExt;
use rmcp::transport::io::stdio;

use super::server::WorkspaceMcpServer;

/// Starts the MCP server with stdio transport.
///
/// The server reads JSON-RPC messages from stdin and writes responses to
/// stdout, so nothing else may write to stdout while it runs.
///
/// # Errors
///
/// Returns an error if the server fails to start or encounters a runtime error.
pub async fn serve_stdio(server: WorkspaceMcpServer) -> anyhow::Result<()> {
    let service = server.serve(stdio()).await?;
    service.waiting().await?;
    Ok(())
}
