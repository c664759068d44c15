//! Document publishing.
//!
//! Converts text artifacts into workspace pages. [`DocumentPublisher`] is
//! used both by the conversation orchestrator's deterministic publish path
//! and by the built-in workspace MCP server.

pub mod block;
pub mod config;
pub mod notion;
pub mod publisher;
pub mod table;

pub use block::Block;
pub use config::{WorkspaceConfig, WorkspaceConfigBuilder};
pub use notion::{NotionClient, PageHandle, PageSummary, WorkspaceApi};
pub use publisher::{
    AppendOutcome, BlockFailure, DocumentPublisher, MAX_CHILDREN_PER_REQUEST, PagePublisher,
    PublishOutcome, PublishRequest,
};
pub use table::{DEFAULT_TABLE_TITLE, TableLayout, table_blocks};
