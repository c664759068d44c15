//! Error types for querynote.
//!
//! Each concern has its own error enum so callers can tell which stage of a
//! turn failed: connecting to a tool provider, reasoning, creating a page,
//! or appending blocks. [`Error`] wraps them all for the CLI layer.

use thiserror::Error;

use crate::mcp::ProviderKind;

/// Result alias using the crate-wide [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Crate-wide error type.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Tool-provider gateway error.
    #[error(transparent)]
    Gateway(#[from] GatewayError),

    /// Reasoning engine error.
    #[error(transparent)]
    Agent(#[from] AgentError),

    /// Document publishing error.
    #[error(transparent)]
    Publish(#[from] PublishError),

    /// CLI command error.
    #[error(transparent)]
    Command(#[from] CommandError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration errors. Always fatal at startup.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// A required setting is absent.
    #[error("missing required setting {name}")]
    Missing {
        /// Environment variable (or flag) name.
        name: &'static str,
    },

    /// A setting is present but unusable.
    #[error("invalid setting {name}: {message}")]
    Invalid {
        /// Environment variable (or flag) name.
        name: &'static str,
        /// What is wrong with it.
        message: String,
    },
}

/// Errors raised by the tool-provider gateway.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// A provider could not be launched or initialised.
    #[error("connect: {provider} provider unavailable: {message}")]
    Connection {
        /// Which provider failed.
        provider: ProviderKind,
        /// Underlying failure.
        message: String,
    },

    /// A provider connected but its tool manifest could not be read.
    #[error("connect: failed to list tools from {provider} provider: {message}")]
    Manifest {
        /// Which provider failed.
        provider: ProviderKind,
        /// Underlying failure.
        message: String,
    },

    /// Both providers expose a tool with the same name.
    #[error("connect: tool '{name}' is exposed by both providers")]
    DuplicateTool {
        /// Conflicting tool name.
        name: String,
    },

    /// No provider exposes the requested tool.
    #[error("unknown tool '{name}'")]
    UnknownTool {
        /// Requested tool name.
        name: String,
    },

    /// Tool arguments were not a JSON object.
    #[error("invalid arguments for tool '{name}': {message}")]
    InvalidArguments {
        /// Tool name.
        name: String,
        /// Parse failure.
        message: String,
    },

    /// The provider rejected or failed the call.
    #[error("{provider} provider failed tool '{tool}': {message}")]
    ToolCall {
        /// Which provider served the call.
        provider: ProviderKind,
        /// Tool name.
        tool: String,
        /// Provider message.
        message: String,
    },

    /// The provider connection has been closed.
    #[error("{provider} provider connection is closed")]
    Closed {
        /// Which provider.
        provider: ProviderKind,
    },
}

/// Errors raised while the reasoning engine handles a turn.
#[derive(Debug, Error)]
pub enum AgentError {
    /// The LLM API request failed.
    #[error("reason: API request failed: {message}")]
    ApiRequest {
        /// Error message.
        message: String,
        /// HTTP status, when known.
        status: Option<u16>,
    },

    /// The model kept requesting tools past the iteration limit.
    #[error("reason: tool loop exceeded {max_iterations} iterations")]
    ToolLoopExceeded {
        /// Configured limit.
        max_iterations: usize,
    },

    /// Unknown LLM provider name in configuration.
    #[error("reason: unsupported LLM provider '{name}'")]
    UnsupportedProvider {
        /// Provider name.
        name: String,
    },

    /// Orchestration-level failure.
    #[error("reason: {message}")]
    Orchestration {
        /// Error message.
        message: String,
    },
}

/// Errors from the document workspace API.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum WorkspaceError {
    /// The API answered with a non-success status.
    #[error("HTTP {status}: {message}")]
    Http {
        /// HTTP status code.
        status: u16,
        /// Provider message.
        message: String,
    },

    /// The request never produced a response.
    #[error("transport error: {message}")]
    Transport {
        /// Error message.
        message: String,
    },

    /// The response body could not be decoded.
    #[error("unexpected response: {message}")]
    Decode {
        /// Error message.
        message: String,
    },
}

impl WorkspaceError {
    /// Returns the HTTP status if the API produced one.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            Self::Transport { .. } | Self::Decode { .. } => None,
        }
    }
}

/// Fatal publishing errors. Block-level failures are not errors; see
/// [`BlockFailure`](crate::publish::BlockFailure).
#[derive(Debug, Error)]
pub enum PublishError {
    /// The page itself could not be created.
    #[error("create-page: {0}")]
    PageCreation(#[source] WorkspaceError),

    /// The request cannot be published as given.
    #[error("create-page: {message}")]
    InvalidInput {
        /// What is wrong.
        message: String,
    },
}

/// CLI command errors.
#[derive(Debug, Error)]
pub enum CommandError {
    /// Command execution failed.
    #[error("{0}")]
    ExecutionFailed(String),

    /// Could not read user input.
    #[error("input error: {0}")]
    Input(String),
}
