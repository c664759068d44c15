//! Command-line argument parsing.
//!
//! Defines the CLI structure using clap derive macros.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// querynote: ask questions about a database, publish the answers.
///
/// Connects a reasoning engine to a query-execution MCP server and a
/// document-publishing MCP server, and publishes answers to the document
/// workspace when the conversation asks for it.
#[derive(Parser, Debug)]
#[command(name = "querynote")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable debug logging on stderr.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format for non-interactive commands (text, json).
    #[arg(long, default_value = "text", global = true)]
    pub format: String,

    /// The subcommand to execute. Defaults to `chat`.
    #[command(subcommand)]
    pub command: Option<Commands>,
}

impl Cli {
    /// Returns the subcommand, defaulting to an interactive chat.
    #[must_use]
    pub fn resolved_command(&self) -> Commands {
        self.command.clone().unwrap_or_else(|| {
            Commands::Chat(ChatArgs {
                providers: ProviderArgs::default(),
                model: None,
                prompt_dir: None,
            })
        })
    }
}

/// Available CLI commands.
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Start an interactive conversation (default).
    ///
    /// Requires OPENAI_API_KEY, NOTION_API_KEY and NOTION_PAGE_ID.
    #[command(after_help = r#"Examples:
  querynote                                   # Chat with default providers
  querynote chat --official-notion            # Publish through the official Notion server
  querynote chat --query-cmd uv --query-args "run server.py"
  querynote -v chat --model gpt-5             # Debug logging, different model

Type "quit", "exit" or "종료" to leave. Mention saving, sending, uploading
or Notion in a question to publish its answer as a new page.
"#)]
    Chat(ChatArgs),

    /// Connect both providers and list the combined tool set.
    #[command(after_help = r#"Examples:
  querynote tools
  querynote --format json tools | jq '.[].name'
"#)]
    Tools(ProviderArgs),

    /// Publish a text file as a workspace page without the reasoning engine.
    #[command(after_help = r#"Examples:
  querynote publish report.md                    # Title: "Database Analysis Result - <now>"
  querynote publish report.md --title "Q3 sales"
  cat result.txt | querynote publish -           # Read from stdin
"#)]
    Publish {
        /// File to publish, or "-" for stdin.
        #[arg(default_value = "-")]
        file: PathBuf,

        /// Label prefixed to the generated title.
        #[arg(short, long)]
        title: Option<String>,

        /// Parent page override.
        #[arg(long)]
        parent: Option<String>,
    },

    /// Run the built-in document-publishing MCP server over stdio.
    ///
    /// Launched by `chat` and `tools` as the publishing provider.
    ServeWorkspace,

    /// Write the default prompt template to a directory for editing.
    InitPrompts {
        /// Target directory (default: ~/.config/querynote/prompts).
        #[arg(short, long)]
        dir: Option<PathBuf>,
    },
}

/// Arguments for `chat`.
#[derive(Args, Debug, Clone)]
pub struct ChatArgs {
    /// Tool provider selection.
    #[command(flatten)]
    pub providers: ProviderArgs,

    /// Model override.
    #[arg(long, env = "QUERYNOTE_MODEL")]
    pub model: Option<String>,

    /// Directory holding `analyst.md`.
    #[arg(long, env = "QUERYNOTE_PROMPT_DIR")]
    pub prompt_dir: Option<PathBuf>,
}

/// How to launch the two tool providers.
#[derive(Args, Debug, Clone, Default)]
pub struct ProviderArgs {
    /// Command that starts the query-execution MCP server.
    #[arg(long, env = "QUERYNOTE_QUERY_SERVER_CMD")]
    pub query_cmd: Option<String>,

    /// Arguments for the query server, separated by whitespace.
    #[arg(long, env = "QUERYNOTE_QUERY_SERVER_ARGS", allow_hyphen_values = true)]
    pub query_args: Option<String>,

    /// Use the official Notion MCP server (via npx) for publishing.
    #[arg(long)]
    pub official_notion: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(args).unwrap_or_else(|e| unreachable!("parse failed: {e}"))
    }

    #[test]
    fn test_cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_default_is_chat() {
        let cli = parse(&["querynote"]);
        assert!(cli.command.is_none());
        assert!(matches!(cli.resolved_command(), Commands::Chat(_)));
    }

    #[test]
    fn test_chat_flags() {
        let cli = parse(&[
            "querynote",
            "-v",
            "chat",
            "--official-notion",
            "--query-cmd",
            "uv",
            "--query-args",
            "run server.py",
        ]);
        assert!(cli.verbose);
        let Commands::Chat(args) = cli.resolved_command() else {
            unreachable!("expected chat");
        };
        assert!(args.providers.official_notion);
        assert_eq!(args.providers.query_cmd.as_deref(), Some("uv"));
        assert_eq!(args.providers.query_args.as_deref(), Some("run server.py"));
    }

    #[test]
    fn test_publish_defaults_to_stdin() {
        let cli = parse(&["querynote", "publish", "--title", "Q3"]);
        let Commands::Publish { file, title, parent } = cli.resolved_command() else {
            unreachable!("expected publish");
        };
        assert_eq!(file, PathBuf::from("-"));
        assert_eq!(title.as_deref(), Some("Q3"));
        assert!(parent.is_none());
    }

    #[test]
    fn test_serve_workspace() {
        let cli = parse(&["querynote", "serve-workspace"]);
        assert!(matches!(cli.resolved_command(), Commands::ServeWorkspace));
    }
}
