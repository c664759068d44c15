//! Tool-provider launch configuration.
//!
//! Configuration is resolved in order: explicit values → environment variables → defaults.

use std::path::PathBuf;

use crate::error::ConfigError;
use crate::publish::config::TOKEN_ENV;

/// Default command for the query-execution provider.
pub const DEFAULT_QUERY_COMMAND: &str = "python";
/// Default arguments for the query-execution provider.
pub const DEFAULT_QUERY_ARGS: &[&str] = &["../DB_MCP_Agent/agent_server.py"];

/// Subcommand that runs the built-in workspace provider.
pub const SERVE_WORKSPACE_SUBCOMMAND: &str = "serve-workspace";

/// How to launch one MCP provider as a child process.
#[derive(Clone, PartialEq, Eq)]
pub struct ProviderSpec {
    /// Executable.
    pub command: String,
    /// Arguments.
    pub args: Vec<String>,
    /// Extra environment variables for the child, on top of the inherited
    /// environment.
    pub env: Vec<(String, String)>,
}

impl ProviderSpec {
    /// Creates a spec with no extra environment.
    pub fn new<I, S>(command: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            command: command.into(),
            args: args.into_iter().map(Into::into).collect(),
            env: Vec::new(),
        }
    }

    /// Adds an environment variable for the child.
    #[must_use]
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    /// Default query-execution provider.
    #[must_use]
    pub fn default_query() -> Self {
        Self::new(DEFAULT_QUERY_COMMAND, DEFAULT_QUERY_ARGS.iter().copied())
    }

    /// This binary's own `serve-workspace` subcommand.
    #[must_use]
    pub fn builtin_workspace(exe: PathBuf) -> Self {
        Self::new(exe.to_string_lossy(), [SERVE_WORKSPACE_SUBCOMMAND])
    }

    /// The official Notion MCP server, launched through `npx`.
    #[must_use]
    pub fn official_notion(token: &str) -> Self {
        Self::new("npx", ["-y", "@notionhq/notion-mcp-server"]).with_env("NOTION_TOKEN", token)
    }

    /// Renders the command line for display.
    #[must_use]
    pub fn display_command(&self) -> String {
        std::iter::once(self.command.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl std::fmt::Debug for ProviderSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let env_keys: Vec<&str> = self.env.iter().map(|(k, _)| k.as_str()).collect();
        f.debug_struct("ProviderSpec")
            .field("command", &self.command)
            .field("args", &self.args)
            .field("env", &env_keys)
            .finish()
    }
}

/// Launch specs for both providers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayConfig {
    /// Query-execution provider.
    pub query: ProviderSpec,
    /// Document-publishing provider.
    pub publishing: ProviderSpec,
}

impl GatewayConfig {
    /// Creates a new builder for `GatewayConfig`.
    #[must_use]
    pub fn builder() -> GatewayConfigBuilder {
        GatewayConfigBuilder::default()
    }
}

/// Builder for [`GatewayConfig`].
#[derive(Debug, Clone, Default)]
pub struct GatewayConfigBuilder {
    query_command: Option<String>,
    query_args: Option<Vec<String>>,
    publishing: Option<ProviderSpec>,
    official_notion: bool,
}

impl GatewayConfigBuilder {
    /// Populates unset fields from environment variables.
    ///
    /// `QUERYNOTE_QUERY_SERVER_ARGS` is split on whitespace.
    #[must_use]
    pub fn from_env(mut self) -> Self {
        if self.query_command.is_none() {
            self.query_command = std::env::var("QUERYNOTE_QUERY_SERVER_CMD")
                .ok()
                .filter(|v| !v.trim().is_empty());
        }
        if self.query_args.is_none() {
            self.query_args = std::env::var("QUERYNOTE_QUERY_SERVER_ARGS")
                .ok()
                .map(|v| v.split_whitespace().map(str::to_string).collect());
        }
        self
    }

    /// Sets the query provider command.
    #[must_use]
    pub fn query_command(mut self, command: impl Into<String>) -> Self {
        self.query_command = Some(command.into());
        self
    }

    /// Sets the query provider arguments.
    #[must_use]
    pub fn query_args(mut self, args: Vec<String>) -> Self {
        self.query_args = Some(args);
        self
    }

    /// Sets the publishing provider explicitly.
    #[must_use]
    pub fn publishing(mut self, spec: ProviderSpec) -> Self {
        self.publishing = Some(spec);
        self
    }

    /// Uses the official Notion MCP server instead of the built-in one.
    #[must_use]
    pub const fn official_notion(mut self, enabled: bool) -> Self {
        self.official_notion = enabled;
        self
    }

    /// Builds the [`GatewayConfig`].
    ///
    /// When no publishing spec was set, the built-in `serve-workspace`
    /// provider is launched from the current executable, or the official
    /// Notion server if requested (which needs the workspace token).
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the current executable cannot be located
    /// or the workspace token is missing for the official server.
    pub fn build(self) -> Result<GatewayConfig, ConfigError> {
        let query = match (self.query_command, self.query_args) {
            (None, None) => ProviderSpec::default_query(),
            (Some(cmd), args) => ProviderSpec::new(cmd, args.unwrap_or_default()),
            (None, Some(args)) => ProviderSpec::new(DEFAULT_QUERY_COMMAND, args),
        };

        let publishing = match self.publishing {
            Some(spec) => spec,
            None if self.official_notion => {
                let token = std::env::var(TOKEN_ENV)
                    .ok()
                    .filter(|v| !v.trim().is_empty())
                    .ok_or(ConfigError::Missing { name: TOKEN_ENV })?;
                ProviderSpec::official_notion(&token)
            }
            None => {
                let exe = std::env::current_exe().map_err(|e| ConfigError::Invalid {
                    name: "publishing provider",
                    message: format!("cannot locate current executable: {e}"),
                })?;
                ProviderSpec::builtin_workspace(exe)
            }
        };

        Ok(GatewayConfig { query, publishing })
    }
}
