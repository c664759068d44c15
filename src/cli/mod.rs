//! CLI layer for querynote.
//!
//! Provides the command-line interface using clap: the interactive chat,
//! tool listing, direct publishing, the built-in workspace MCP server,
//! and prompt initialisation.

pub mod commands;
pub mod output;
pub mod parser;

pub use commands::execute;
pub use output::OutputFormat;
pub use parser::{ChatArgs, Cli, Commands, ProviderArgs};
