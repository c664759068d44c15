//! Tool executor seam between the agentic loop and whatever serves tools.
//!
//! The gateway implements this by routing to the MCP providers; tests use
//! scripted executors.

use async_trait::async_trait;

use super::tool::{ToolCall, ToolResult};
use crate::mcp::ProviderKind;

/// Maximum raw byte length of tool argument JSON from the LLM.
pub const MAX_TOOL_ARGS_LEN: usize = 100_000;

/// Executes tool calls requested by the model.
///
/// Implementations never fail the turn: any failure comes back as a
/// [`ToolResult`] with `is_error` set so the model can react to it.
#[async_trait]
pub trait ToolExecutor: Send + Sync {
    /// Runs one tool call.
    async fn execute(&self, call: &ToolCall) -> ToolResult;

    /// Returns the provider that owns `tool`, when known.
    fn provider_of(&self, _tool: &str) -> Option<ProviderKind> {
        None
    }
}

/// Rejects oversized argument payloads before they reach a provider.
#[must_use]
pub fn check_arguments(call: &ToolCall) -> Option<ToolResult> {
    (call.arguments.len() > MAX_TOOL_ARGS_LEN).then(|| ToolResult {
        tool_call_id: call.id.clone(),
        content: format!(
            "tool arguments too large ({} bytes, max {MAX_TOOL_ARGS_LEN})",
            call.arguments.len()
        ),
        is_error: true,
    })
}
