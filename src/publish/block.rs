//! Page block model.
//!
//! A small subset of the workspace's block types, enough to lay out an
//! analysis page: a title banner, section headings, paragraphs, dividers.

use serde_json::{Value, json};

/// A unit of page content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    /// Top-level heading.
    Heading1(String),
    /// Section heading.
    Heading2(String),
    /// Text paragraph.
    Paragraph {
        /// Paragraph text. At most
        /// [`MAX_BLOCK_CHARS`](crate::core::MAX_BLOCK_CHARS) characters.
        text: String,
        /// Render the whole run in bold.
        bold: bool,
    },
    /// Horizontal rule.
    Divider,
}

impl Block {
    /// Creates a plain paragraph.
    #[must_use]
    pub fn paragraph(text: impl Into<String>) -> Self {
        Self::Paragraph {
            text: text.into(),
            bold: false,
        }
    }

    /// Creates a bold paragraph.
    #[must_use]
    pub fn bold_paragraph(text: impl Into<String>) -> Self {
        Self::Paragraph {
            text: text.into(),
            bold: true,
        }
    }

    /// Returns the block's text, if it has any.
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        match self {
            Self::Heading1(t) | Self::Heading2(t) | Self::Paragraph { text: t, .. } => Some(t),
            Self::Divider => None,
        }
    }

    /// Renders the block as the workspace API's JSON object.
    #[must_use]
    pub fn to_json(&self) -> Value {
        match self {
            Self::Heading1(text) => json!({
                "object": "block",
                "type": "heading_1",
                "heading_1": { "rich_text": [rich_text(text, false)] }
            }),
            Self::Heading2(text) => json!({
                "object": "block",
                "type": "heading_2",
                "heading_2": { "rich_text": [rich_text(text, false)] }
            }),
            Self::Paragraph { text, bold } => json!({
                "object": "block",
                "type": "paragraph",
                "paragraph": { "rich_text": [rich_text(text, *bold)] }
            }),
            Self::Divider => json!({
                "object": "block",
                "type": "divider",
                "divider": {}
            }),
        }
    }
}

/// Builds one rich-text run.
fn rich_text(content: &str, bold: bool) -> Value {
    let mut run = json!({
        "type": "text",
        "text": { "content": content }
    });
    if bold {
        run["annotations"] = json!({ "bold": true });
    }
    run
}

/// Renders a slice of blocks as a JSON array.
#[must_use]
pub fn to_children(blocks: &[Block]) -> Value {
    Value::Array(blocks.iter().map(Block::to_json).collect())
}
