//! Document publisher.
//!
//! Turns a text artifact into a new workspace page:
//!
//! ```text
//! PublishRequest
//!   ├── create page (title + heading banner)   ── failure is fatal
//!   ├── segment body into ≤2000-char paragraphs
//!   └── append in batches of ≤100
//!         └── batch failed → append each block alone, record failures
//!   ↓
//! PublishOutcome { page, succeeded, failed, failures }
//! ```
//!
//! Nothing here retries an operation that already failed on its own.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Local};
use serde::Serialize;
use tracing::{debug, info, warn};

use super::block::Block;
use super::notion::{PageHandle, WorkspaceApi};
use crate::core::{MAX_BLOCK_CHARS, segment};
use crate::error::{PublishError, WorkspaceError};

/// Maximum children accepted by one append request.
pub const MAX_CHILDREN_PER_REQUEST: usize = 100;

/// A text artifact to publish as one page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishRequest {
    /// Page title.
    pub title: String,
    /// Body text.
    pub body: String,
    /// Parent page override. `None` uses the publisher's default parent.
    pub parent_page_id: Option<String>,
}

impl PublishRequest {
    /// Creates a request titled `"{label} - {YYYY-MM-DD HH:MM:SS}"`.
    #[must_use]
    pub fn new(label: &str, body: impl Into<String>, generated_at: DateTime<Local>) -> Self {
        Self::titled(
            format!("{label} - {}", generated_at.format("%Y-%m-%d %H:%M:%S")),
            body,
        )
    }

    /// Creates a request with an explicit title.
    #[must_use]
    pub fn titled(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
            parent_page_id: None,
        }
    }

    /// Publishes under the given parent page instead of the default.
    #[must_use]
    pub fn with_parent(mut self, parent_page_id: impl Into<String>) -> Self {
        self.parent_page_id = Some(parent_page_id.into());
        self
    }
}

/// A block that could not be appended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BlockFailure {
    /// Zero-based position of the block in the appended sequence.
    pub index: usize,
    /// HTTP status, when the API produced one.
    pub status: Option<u16>,
    /// Provider message.
    pub message: String,
}

impl BlockFailure {
    fn new(index: usize, error: &WorkspaceError) -> Self {
        Self {
            index,
            status: error.status(),
            message: error.to_string(),
        }
    }
}

/// Result of appending a sequence of blocks.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AppendOutcome {
    /// Blocks appended.
    pub succeeded: usize,
    /// Blocks that failed, in order.
    pub failures: Vec<BlockFailure>,
}

impl AppendOutcome {
    /// Number of failed blocks.
    #[must_use]
    pub fn failed(&self) -> usize {
        self.failures.len()
    }
}

/// Result of a publish operation. The page exists even when some blocks
/// failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PublishOutcome {
    /// The created page.
    pub page: PageHandle,
    /// Body blocks produced by segmentation.
    pub blocks_total: usize,
    /// Body blocks appended.
    pub succeeded: usize,
    /// Body blocks that failed.
    pub failed: usize,
    /// Per-block failure detail.
    pub failures: Vec<BlockFailure>,
}

impl PublishOutcome {
    /// Returns `true` if every body block landed.
    #[must_use]
    pub const fn is_complete(&self) -> bool {
        self.failed == 0
    }
}

/// Publishes text artifacts as pages.
#[async_trait]
pub trait PagePublisher: Send + Sync {
    /// Creates a page for the request and fills it.
    ///
    /// # Errors
    ///
    /// Returns [`PublishError::PageCreation`] if the page cannot be created.
    /// Block failures are reported in the outcome, not as errors.
    async fn publish(&self, request: &PublishRequest) -> Result<PublishOutcome, PublishError>;
}

/// [`PagePublisher`] backed by a [`WorkspaceApi`].
pub struct DocumentPublisher {
    api: Arc<dyn WorkspaceApi>,
    default_parent: String,
}

impl DocumentPublisher {
    /// Creates a publisher that writes under `default_parent`.
    pub fn new(api: Arc<dyn WorkspaceApi>, default_parent: impl Into<String>) -> Self {
        Self {
            api,
            default_parent: default_parent.into(),
        }
    }

    /// Returns the underlying workspace API.
    #[must_use]
    pub fn api(&self) -> &Arc<dyn WorkspaceApi> {
        &self.api
    }

    /// Appends blocks to an existing page.
    ///
    /// Blocks go out in batches of [`MAX_CHILDREN_PER_REQUEST`]. When a
    /// multi-block batch fails, each of its blocks is appended on its own
    /// and failures are recorded per block. A single-block batch that fails
    /// is recorded directly.
    pub async fn append_blocks(&self, page_id: &str, blocks: &[Block]) -> AppendOutcome {
        let mut outcome = AppendOutcome::default();

        for (batch_idx, batch) in blocks.chunks(MAX_CHILDREN_PER_REQUEST).enumerate() {
            let base = batch_idx * MAX_CHILDREN_PER_REQUEST;

            match self.api.append_blocks(page_id, batch).await {
                Ok(()) => {
                    debug!(batch = batch_idx, blocks = batch.len(), "batch appended");
                    outcome.succeeded += batch.len();
                }
                Err(e) if batch.len() == 1 => {
                    warn!(index = base, error = %e, "block append failed");
                    outcome.failures.push(BlockFailure::new(base, &e));
                }
                Err(e) => {
                    warn!(
                        batch = batch_idx,
                        blocks = batch.len(),
                        error = %e,
                        "batch append failed, appending blocks individually"
                    );
                    for (offset, block) in batch.iter().enumerate() {
                        match self
                            .api
                            .append_blocks(page_id, std::slice::from_ref(block))
                            .await
                        {
                            Ok(()) => outcome.succeeded += 1,
                            Err(e) => {
                                warn!(index = base + offset, error = %e, "block append failed");
                                outcome.failures.push(BlockFailure::new(base + offset, &e));
                            }
                        }
                    }
                }
            }
        }

        outcome
    }
}

impl std::fmt::Debug for DocumentPublisher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentPublisher")
            .field("default_parent", &self.default_parent)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl PagePublisher for DocumentPublisher {
    async fn publish(&self, request: &PublishRequest) -> Result<PublishOutcome, PublishError> {
        let parent = request
            .parent_page_id
            .as_deref()
            .unwrap_or(&self.default_parent);
        if parent.trim().is_empty() {
            return Err(PublishError::InvalidInput {
                message: "no parent page identifier".to_string(),
            });
        }
        let title_chars = request.title.chars().count();
        if title_chars > MAX_BLOCK_CHARS {
            return Err(PublishError::InvalidInput {
                message: format!(
                    "title is {title_chars} characters, the workspace accepts at most {MAX_BLOCK_CHARS}"
                ),
            });
        }

        let banner = [Block::Heading1(request.title.clone())];
        let page = self
            .api
            .create_page(parent, &request.title, &banner)
            .await
            .map_err(PublishError::PageCreation)?;
        info!(page_id = %page.id, url = %page.url, "page created");

        let blocks: Vec<Block> = segment(&request.body, MAX_BLOCK_CHARS)
            .into_iter()
            .map(Block::paragraph)
            .collect();
        let appended = self.append_blocks(&page.id, &blocks).await;

        info!(
            page_id = %page.id,
            blocks = blocks.len(),
            succeeded = appended.succeeded,
            failed = appended.failed(),
            "page populated"
        );

        Ok(PublishOutcome {
            page,
            blocks_total: blocks.len(),
            succeeded: appended.succeeded,
            failed: appended.failed(),
            failures: appended.failures,
        })
    }
}
