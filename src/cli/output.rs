//! Output formatting for non-interactive commands.

use serde::Serialize;

use crate::mcp::ProviderKind;
use crate::publish::PublishOutcome;

/// How command results are rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Human-readable text.
    #[default]
    Text,
    /// Pretty-printed JSON.
    Json,
}

impl OutputFormat {
    /// Parses a format name, falling back to text for unknown values.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.to_ascii_lowercase().as_str() {
            "json" => Self::Json,
            _ => Self::Text,
        }
    }

    /// Serializes a value as pretty JSON with a trailing newline.
    #[must_use]
    pub fn to_json<T: Serialize>(self, value: &T) -> String {
        serde_json::to_string_pretty(value).map_or_else(
            |e| format!("{{\"error\": \"serialization failed: {e}\"}}\n"),
            |json| format!("{json}\n"),
        )
    }
}

/// One row of the `tools` listing.
#[derive(Debug, Clone, Serialize)]
pub struct ToolRow {
    /// Owning provider.
    pub provider: ProviderKind,
    /// Tool name.
    pub name: String,
    /// Tool description.
    pub description: String,
}

/// Renders the combined tool set grouped by provider.
#[must_use]
pub fn format_tools(rows: &[ToolRow], format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => format.to_json(&rows),
        OutputFormat::Text => {
            let mut output = String::new();
            for kind in ProviderKind::ALL {
                let tools: Vec<_> = rows.iter().filter(|r| r.provider == kind).collect();
                output.push_str(&format!("{kind} provider ({} tools)\n", tools.len()));
                for tool in tools {
                    let summary = tool.description.lines().next().unwrap_or_default();
                    output.push_str(&format!("  {:<28} {summary}\n", tool.name));
                }
            }
            output
        }
    }
}

/// Renders the result of a direct publish.
#[must_use]
pub fn format_publish(outcome: &PublishOutcome, format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => format.to_json(outcome),
        OutputFormat::Text => {
            let mut output = format!(
                "Published: {}\nBlocks: {}/{} appended\n",
                outcome.page.url, outcome.succeeded, outcome.blocks_total
            );
            for failure in &outcome.failures {
                output.push_str(&format!(
                    "append-block #{}: {}\n",
                    failure.index, failure.message
                ));
            }
            output
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::publish::{BlockFailure, PageHandle};

    fn rows() -> Vec<ToolRow> {
        vec![
            ToolRow {
                provider: ProviderKind::Query,
                name: "run_query".to_string(),
                description: "Run a read-only SQL query.\nMore detail.".to_string(),
            },
            ToolRow {
                provider: ProviderKind::Publishing,
                name: "create_analysis_page".to_string(),
                description: "Create a page.".to_string(),
            },
        ]
    }

    #[test]
    fn test_parse() {
        assert_eq!(OutputFormat::parse("JSON"), OutputFormat::Json);
        assert_eq!(OutputFormat::parse("text"), OutputFormat::Text);
        assert_eq!(OutputFormat::parse("yaml"), OutputFormat::Text);
    }

    #[test]
    fn test_format_tools_text() {
        let text = format_tools(&rows(), OutputFormat::Text);
        assert!(text.contains("query provider (1 tools)"));
        assert!(text.contains("run_query"));
        assert!(text.contains("Run a read-only SQL query."));
        assert!(!text.contains("More detail."));
        assert!(text.contains("publishing provider (1 tools)"));
    }

    #[test]
    fn test_format_tools_json() {
        let json = format_tools(&rows(), OutputFormat::Json);
        let value: serde_json::Value = serde_json::from_str(&json).unwrap_or_default();
        assert_eq!(value[0]["provider"], "query");
        assert_eq!(value[1]["name"], "create_analysis_page");
    }

    #[test]
    fn test_format_publish_with_failures() {
        let outcome = PublishOutcome {
            page: PageHandle {
                id: "p".to_string(),
                url: "https://www.notion.so/p".to_string(),
            },
            blocks_total: 5,
            succeeded: 4,
            failed: 1,
            failures: vec![BlockFailure {
                index: 2,
                status: Some(400),
                message: "HTTP 400: body failed validation".to_string(),
            }],
        };
        let text = format_publish(&outcome, OutputFormat::Text);
        assert!(text.contains("Blocks: 4/5 appended"));
        assert!(text.contains("append-block #2: HTTP 400"));
    }
}
