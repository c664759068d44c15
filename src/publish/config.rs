//! Document workspace configuration.
//!
//! Configuration is resolved in order: explicit values → environment variables → defaults.

use std::time::Duration;

use crate::error::ConfigError;

/// Default API base URL.
pub const DEFAULT_BASE_URL: &str = "https://api.notion.com/v1";
/// API version sent with every request.
pub const API_VERSION: &str = "2022-06-28";
/// Default label prefixed to published page titles.
pub const DEFAULT_PUBLISH_LABEL: &str = "Database Analysis Result";

/// Environment variable holding the workspace credential.
pub const TOKEN_ENV: &str = "NOTION_API_KEY";
/// Environment variable holding the parent page identifier.
pub const PARENT_PAGE_ENV: &str = "NOTION_PAGE_ID";

/// Configuration for the document workspace client.
#[derive(Clone)]
pub struct WorkspaceConfig {
    /// Integration token.
    pub token: String,
    /// Page under which new pages are created.
    pub parent_page_id: String,
    /// API base URL.
    pub base_url: String,
    /// Per-request timeout. `None` keeps the HTTP client's default.
    pub timeout: Option<Duration>,
    /// Label used for generated page titles.
    pub publish_label: String,
}

impl WorkspaceConfig {
    /// Creates a new builder for `WorkspaceConfig`.
    #[must_use]
    pub fn builder() -> WorkspaceConfigBuilder {
        WorkspaceConfigBuilder::default()
    }

    /// Creates configuration from environment variables with defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Missing`] if the token or parent page is unset.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::builder().from_env().build()
    }
}

impl std::fmt::Debug for WorkspaceConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkspaceConfig")
            .field("token", &"<redacted>")
            .field("parent_page_id", &self.parent_page_id)
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .field("publish_label", &self.publish_label)
            .finish()
    }
}

/// Builder for [`WorkspaceConfig`].
#[derive(Debug, Clone, Default)]
pub struct WorkspaceConfigBuilder {
    token: Option<String>,
    parent_page_id: Option<String>,
    base_url: Option<String>,
    timeout: Option<Duration>,
    publish_label: Option<String>,
}

impl WorkspaceConfigBuilder {
    /// Populates unset fields from environment variables.
    #[must_use]
    pub fn from_env(mut self) -> Self {
        if self.token.is_none() {
            self.token = std::env::var(TOKEN_ENV).ok();
        }
        if self.parent_page_id.is_none() {
            self.parent_page_id = std::env::var(PARENT_PAGE_ENV).ok();
        }
        if self.base_url.is_none() {
            self.base_url = std::env::var("QUERYNOTE_WORKSPACE_URL").ok();
        }
        if self.timeout.is_none() {
            self.timeout = std::env::var("QUERYNOTE_HTTP_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .map(Duration::from_secs);
        }
        if self.publish_label.is_none() {
            self.publish_label = std::env::var("QUERYNOTE_PUBLISH_LABEL").ok();
        }
        self
    }

    /// Sets the integration token.
    #[must_use]
    pub fn token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Sets the parent page identifier.
    #[must_use]
    pub fn parent_page_id(mut self, id: impl Into<String>) -> Self {
        self.parent_page_id = Some(id.into());
        self
    }

    /// Sets the API base URL.
    #[must_use]
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Sets the per-request timeout.
    #[must_use]
    pub const fn timeout(mut self, duration: Duration) -> Self {
        self.timeout = Some(duration);
        self
    }

    /// Sets the title label for published pages.
    #[must_use]
    pub fn publish_label(mut self, label: impl Into<String>) -> Self {
        self.publish_label = Some(label.into());
        self
    }

    /// Builds the [`WorkspaceConfig`].
    ///
    /// Blank values count as missing.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Missing`] if the token or parent page is unset.
    pub fn build(self) -> Result<WorkspaceConfig, ConfigError> {
        let token = non_blank(self.token).ok_or(ConfigError::Missing { name: TOKEN_ENV })?;
        let parent_page_id = non_blank(self.parent_page_id).ok_or(ConfigError::Missing {
            name: PARENT_PAGE_ENV,
        })?;

        Ok(WorkspaceConfig {
            token,
            parent_page_id,
            base_url: self
                .base_url
                .map_or_else(|| DEFAULT_BASE_URL.to_string(), |u| u.trim_end_matches('/').to_string()),
            timeout: self.timeout,
            publish_label: self
                .publish_label
                .unwrap_or_else(|| DEFAULT_PUBLISH_LABEL.to_string()),
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
