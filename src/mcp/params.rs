//! MCP tool parameter types for the built-in workspace server.
//!
//! Defines the input schemas for MCP tools using `schemars` for automatic
//! JSON Schema generation required by the MCP protocol.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Parameters for the `create_analysis_page` tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CreateAnalysisPageParams {
    /// Page title.
    pub title: String,

    /// Analysis text to store. Long text is split into paragraphs of at
    /// most 2000 characters.
    pub analysis_data: String,

    /// Parent page ID. Defaults to the configured parent page.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_id: Option<String>,
}

/// Parameters for the `create_table` tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CreateTableParams {
    /// Page to append the table to.
    pub page_id: String,

    /// Rows as objects; columns are taken from the first row's keys.
    pub rows: Vec<Map<String, Value>>,

    /// Heading shown above the table.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table_title: Option<String>,
}

/// Parameters for the `search_pages` tool.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct SearchPagesParams {
    /// Title keyword. Empty lists recent pages.
    #[serde(default)]
    pub query: String,

    /// Maximum results (1-100, default 10).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_size: Option<u32>,
}

/// Arguments for the `default_prompt` prompt.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct DefaultPromptParams {
    /// The user's request.
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_params_defaults() {
        let params: SearchPagesParams =
            serde_json::from_str("{}").unwrap_or_else(|_| unreachable!());
        assert!(params.query.is_empty());
        assert!(params.page_size.is_none());
    }

    #[test]
    fn test_table_params_rows() {
        let params: CreateTableParams = serde_json::from_str(
            r#"{"page_id":"p","rows":[{"Name":"AC/DC","Albums":2}]}"#,
        )
        .unwrap_or_else(|_| unreachable!());
        assert_eq!(params.rows.len(), 1);
        assert!(params.table_title.is_none());
    }

    #[test]
    fn test_schema_marks_required_fields() {
        let schema = serde_json::to_value(schemars::schema_for!(CreateAnalysisPageParams))
            .unwrap_or_default();
        let required = schema["required"].as_array().cloned().unwrap_or_default();
        assert!(required.contains(&Value::from("title")));
        assert!(required.contains(&Value::from("analysis_data")));
        assert!(!required.contains(&Value::from("page_id")));
    }
}
