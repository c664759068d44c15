//! Tabular results rendered as page blocks.
//!
//! The layout is text-only: a section heading, a bold `col | col` header
//! line, a divider, then one paragraph per row.

use serde_json::{Map, Value};

use super::block::Block;
use crate::core::{MAX_BLOCK_CHARS, segment};
use crate::error::PublishError;

/// Heading used when the caller gives none.
pub const DEFAULT_TABLE_TITLE: &str = "Analysis Result Table";

/// Blocks for one table plus its shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableLayout {
    /// Blocks in page order.
    pub blocks: Vec<Block>,
    /// Column names, taken from the first row.
    pub columns: Vec<String>,
    /// Number of data rows.
    pub rows: usize,
}

/// Lays out `rows` as blocks.
///
/// Columns come from the first row's keys; later rows missing a column
/// render an empty cell. Row lines longer than a block are segmented.
///
/// # Errors
///
/// Returns [`PublishError::InvalidInput`] if `rows` is empty.
pub fn table_blocks(title: &str, rows: &[Map<String, Value>]) -> Result<TableLayout, PublishError> {
    let first = rows.first().ok_or_else(|| PublishError::InvalidInput {
        message: "table has no rows".to_string(),
    })?;
    let columns: Vec<String> = first.keys().cloned().collect();

    let mut blocks = vec![
        Block::Heading2(title.to_string()),
        Block::bold_paragraph(columns.join(" | ")),
        Block::Divider,
    ];

    for row in rows {
        let line = columns
            .iter()
            .map(|c| row.get(c).map(cell_text).unwrap_or_default())
            .collect::<Vec<_>>()
            .join(" | ");
        blocks.extend(segment(&line, MAX_BLOCK_CHARS).into_iter().map(Block::paragraph));
    }

    Ok(TableLayout {
        blocks,
        columns,
        rows: rows.len(),
    })
}

fn cell_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
