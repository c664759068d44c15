//! Tool type definitions for function-calling.
//!
//! Provides provider-agnostic types for tool definitions, calls, and results.
//! The tools themselves come from the MCP providers behind the gateway.

use serde::{Deserialize, Serialize};

use crate::mcp::ProviderKind;

/// A tool definition that can be sent to an LLM for function-calling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// Tool name (must match a route in the gateway).
    pub name: String,
    /// Human-readable description of what the tool does.
    pub description: String,
    /// JSON Schema object describing the tool's parameters.
    pub parameters: serde_json::Value,
}

/// A tool call requested by the LLM.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Unique identifier for this call (assigned by the provider).
    pub id: String,
    /// Name of the tool to invoke.
    pub name: String,
    /// JSON-encoded arguments for the tool.
    pub arguments: String,
}

/// The result of executing a tool call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolResult {
    /// ID of the tool call this result corresponds to.
    pub tool_call_id: String,
    /// Result content (provider output on success, error message on failure).
    pub content: String,
    /// Whether this result represents an error.
    pub is_error: bool,
}

/// Record of one tool call made while answering a turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToolInvocation {
    /// Tool name.
    pub name: String,
    /// Provider that served the call, if the tool was routable.
    pub provider: Option<ProviderKind>,
    /// Whether the call failed.
    pub is_error: bool,
}

/// The merged tool pool offered to the model.
#[derive(Debug, Clone, Default)]
pub struct ToolSet {
    definitions: Vec<ToolDefinition>,
}

impl ToolSet {
    /// Wraps a list of definitions.
    #[must_use]
    pub const fn from_definitions(definitions: Vec<ToolDefinition>) -> Self {
        Self { definitions }
    }

    /// Returns the tool definitions in this set.
    #[must_use]
    pub fn definitions(&self) -> &[ToolDefinition] {
        &self.definitions
    }

    /// Returns `true` if this set contains no tools.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    /// Returns the number of tools in this set.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.definitions.len()
    }

    /// Returns `true` if a tool with this name is in the set.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.definitions.iter().any(|d| d.name == name)
    }

    /// Tool names in order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.definitions.iter().map(|d| d.name.as_str())
    }

    /// Empty tool set (no tools available).
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn def(name: &str) -> ToolDefinition {
        ToolDefinition {
            name: name.to_string(),
            description: format!("{name} tool"),
            parameters: json!({"type": "object", "properties": {}}),
        }
    }

    #[test]
    fn test_tool_set() {
        let set = ToolSet::from_definitions(vec![def("run_query"), def("create_analysis_page")]);
        assert_eq!(set.len(), 2);
        assert!(set.contains("run_query"));
        assert!(!set.contains("grep"));
        assert_eq!(
            set.names().collect::<Vec<_>>(),
            vec!["run_query", "create_analysis_page"]
        );
    }

    #[test]
    fn test_none_is_empty() {
        assert!(ToolSet::none().is_empty());
    }

    #[test]
    fn test_definition_serializes() {
        let json = serde_json::to_value(def("list_tables")).unwrap_or_default();
        assert_eq!(json["name"], "list_tables");
        assert_eq!(json["parameters"]["type"], "object");
    }
}
