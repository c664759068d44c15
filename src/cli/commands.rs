//! CLI command implementations.
//!
//! Each command builds its configuration first, so a missing setting fails
//! before any provider process is launched, then bridges into async code
//! through a tokio runtime.

use std::io::{self, Read, Write};
use std::path::Path;
use std::sync::Arc;

use chrono::Local;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;

use crate::agent::{
    AgentConfig, AgentEngine, LineSource, LlmProvider, Orchestrator, PromptSet,
    build_system_prompt, create_provider,
};
use crate::cli::output::{OutputFormat, ToolRow, format_publish, format_tools};
use crate::cli::parser::{ChatArgs, Cli, Commands, ProviderArgs};
use crate::error::{CommandError, Result, WorkspaceError};
use crate::mcp::{
    GatewayConfig, ProviderKind, StdioConnector, ToolGateway, WorkspaceMcpServer, serve_stdio,
};
use crate::publish::{
    DocumentPublisher, NotionClient, PagePublisher, PublishRequest, WorkspaceConfig,
};

/// Executes the CLI command.
///
/// # Returns
///
/// Output to print on stdout. Interactive commands write as they go and
/// return an empty string.
///
/// # Errors
///
/// Returns an error if the command fails to execute.
pub fn execute(cli: &Cli) -> Result<String> {
    let format = OutputFormat::parse(&cli.format);

    match cli.resolved_command() {
        Commands::Chat(args) => cmd_chat(&args),
        Commands::Tools(args) => cmd_tools(&args, format),
        Commands::Publish {
            file,
            title,
            parent,
        } => cmd_publish(&file, title.as_deref(), parent.as_deref(), format),
        Commands::ServeWorkspace => cmd_serve_workspace(),
        Commands::InitPrompts { dir } => cmd_init_prompts(dir.as_deref(), format),
    }
}

/// Creates the tokio runtime used as the sync/async bridge.
fn runtime() -> Result<tokio::runtime::Runtime> {
    tokio::runtime::Runtime::new().map_err(|e| {
        CommandError::ExecutionFailed(format!("Failed to create async runtime: {e}")).into()
    })
}

fn workspace_client(config: &WorkspaceConfig) -> Result<NotionClient> {
    NotionClient::new(config).map_err(|e: WorkspaceError| {
        CommandError::ExecutionFailed(format!("workspace client: {e}")).into()
    })
}

/// Resolves provider launch specs: flags, then environment, then defaults.
fn gateway_config(args: &ProviderArgs) -> Result<GatewayConfig> {
    let mut builder = GatewayConfig::builder().official_notion(args.official_notion);
    if let Some(cmd) = &args.query_cmd {
        builder = builder.query_command(cmd.clone());
    }
    if let Some(query_args) = &args.query_args {
        builder = builder.query_args(query_args.split_whitespace().map(str::to_string).collect());
    }
    Ok(builder.from_env().build()?)
}

// ==================== Chat ====================

/// Line input backed by `rustyline`.
struct ReadlineInput {
    editor: DefaultEditor,
}

impl ReadlineInput {
    fn new() -> Result<Self> {
        let editor = DefaultEditor::new().map_err(|e| CommandError::Input(e.to_string()))?;
        Ok(Self { editor })
    }
}

impl LineSource for ReadlineInput {
    fn read_line(&mut self, prompt: &str) -> io::Result<Option<String>> {
        match self.editor.readline(prompt) {
            Ok(line) => {
                if !line.trim().is_empty() {
                    let _ = self.editor.add_history_entry(line.as_str());
                }
                Ok(Some(line))
            }
            // Ctrl-C abandons the current line only.
            Err(ReadlineError::Interrupted) => Ok(Some(String::new())),
            Err(ReadlineError::Eof) => Ok(None),
            Err(ReadlineError::Io(e)) => Err(e),
            Err(e) => Err(io::Error::other(e.to_string())),
        }
    }
}

fn cmd_chat(args: &ChatArgs) -> Result<String> {
    let mut builder = AgentConfig::builder();
    if let Some(model) = &args.model {
        builder = builder.model(model.clone());
    }
    if let Some(dir) = &args.prompt_dir {
        builder = builder.prompt_dir(dir.clone());
    }
    let agent_config = builder.from_env().build()?;
    let workspace = WorkspaceConfig::from_env()?;
    let gateway_config = gateway_config(&args.providers)?;

    let provider: Arc<dyn LlmProvider> = Arc::from(create_provider(&agent_config)?);
    let client = workspace_client(&workspace)?;

    let rt = runtime()?;
    rt.block_on(async move {
        let gateway = Arc::new(ToolGateway::connect(&gateway_config, &StdioConnector).await?);
        let result = converse(&gateway, provider, agent_config, &workspace, client).await;
        gateway.close().await;
        result
    })?;

    Ok(String::new())
}

/// Runs the conversation loop on stdin/stdout.
#[allow(clippy::future_not_send)]
async fn converse(
    gateway: &Arc<ToolGateway>,
    provider: Arc<dyn LlmProvider>,
    agent_config: AgentConfig,
    workspace: &WorkspaceConfig,
    client: NotionClient,
) -> Result<()> {
    let prompts = PromptSet::load(agent_config.prompt_dir.as_deref());
    let system_prompt = build_system_prompt(&prompts.analyst, Some(&workspace.parent_page_id));
    let tools = gateway.tool_set();
    let tool_count = tools.len();

    let engine = AgentEngine::new(
        provider,
        gateway.clone(),
        tools,
        agent_config,
        system_prompt,
    );
    let publisher = DocumentPublisher::new(Arc::new(client), workspace.parent_page_id.clone());
    let mut orchestrator = Orchestrator::new(
        Arc::new(engine),
        Arc::new(publisher),
        workspace.publish_label.clone(),
    );

    let mut stdout = io::stdout();
    writeln!(
        stdout,
        "querynote session {} ready with {tool_count} tools. Type 'quit' to leave.\n",
        orchestrator.session().id()
    )?;

    let mut input = ReadlineInput::new()?;
    orchestrator.run(&mut input, &mut stdout).await?;
    writeln!(stdout, "Goodbye.")?;
    Ok(())
}

// ==================== Tools ====================

fn cmd_tools(args: &ProviderArgs, format: OutputFormat) -> Result<String> {
    // The built-in publishing provider reads the workspace settings itself;
    // check them here so a missing one is reported before any launch.
    if !args.official_notion {
        WorkspaceConfig::from_env()?;
    }
    let gateway_config = gateway_config(args)?;

    let rt = runtime()?;
    rt.block_on(async {
        let gateway = ToolGateway::connect(&gateway_config, &StdioConnector).await?;
        let rows: Vec<ToolRow> = ProviderKind::ALL
            .into_iter()
            .flat_map(|kind| {
                gateway.tools_of(kind).map(move |d| ToolRow {
                    provider: kind,
                    name: d.name.clone(),
                    description: d.description.clone(),
                })
            })
            .collect();
        gateway.close().await;
        Ok::<_, crate::error::Error>(format_tools(&rows, format))
    })
}

// ==================== Publish ====================

/// Reads the artifact to publish from a file, or stdin for `-`.
fn read_body(file: &Path) -> Result<String> {
    if file.as_os_str() == "-" {
        let mut body = String::new();
        io::stdin().read_to_string(&mut body)?;
        return Ok(body);
    }
    std::fs::read_to_string(file).map_err(|e| {
        CommandError::ExecutionFailed(format!("cannot read {}: {e}", file.display())).into()
    })
}

fn cmd_publish(
    file: &Path,
    title: Option<&str>,
    parent: Option<&str>,
    format: OutputFormat,
) -> Result<String> {
    let workspace = WorkspaceConfig::from_env()?;
    let body = read_body(file)?;

    let label = title.unwrap_or(&workspace.publish_label);
    let mut request = PublishRequest::new(label, body, Local::now());
    if let Some(parent) = parent {
        request = request.with_parent(parent);
    }

    let publisher = DocumentPublisher::new(
        Arc::new(workspace_client(&workspace)?),
        workspace.parent_page_id.clone(),
    );
    let rt = runtime()?;
    let outcome = rt.block_on(publisher.publish(&request))?;

    Ok(format_publish(&outcome, format))
}

// ==================== Serve workspace ====================

/// Serves the document-publishing MCP server on stdio until the client
/// disconnects.
fn cmd_serve_workspace() -> Result<String> {
    let server = WorkspaceMcpServer::from_env()?;
    let rt = runtime()?;
    rt.block_on(serve_stdio(server))
        .map_err(|e| CommandError::ExecutionFailed(format!("MCP server error: {e}")))?;
    Ok(String::new())
}

// ==================== Init prompts ====================

fn cmd_init_prompts(dir: Option<&Path>, format: OutputFormat) -> Result<String> {
    let target_dir = dir
        .map(Path::to_path_buf)
        .or_else(PromptSet::default_dir)
        .ok_or_else(|| {
            CommandError::ExecutionFailed(
                "Could not determine home directory for default prompt path".to_string(),
            )
        })?;

    let written = PromptSet::write_defaults(&target_dir).map_err(|e| {
        CommandError::ExecutionFailed(format!("Failed to write prompt templates: {e}"))
    })?;

    match format {
        OutputFormat::Text => {
            if written.is_empty() {
                Ok(format!(
                    "Prompt template already exists in: {}\n",
                    target_dir.display()
                ))
            } else {
                let mut output = format!("Wrote prompt template(s) to: {}\n", target_dir.display());
                for path in &written {
                    output.push_str(&format!(
                        "  {}\n",
                        path.file_name()
                            .and_then(|n| n.to_str())
                            .unwrap_or("unknown")
                    ));
                }
                output.push_str("\nEdit analyst.md to customize the system prompt.\n");
                Ok(output)
            }
        }
        OutputFormat::Json => {
            let json = serde_json::json!({
                "directory": target_dir.to_string_lossy(),
                "written": written.iter().map(|p| p.to_string_lossy().into_owned()).collect::<Vec<_>>(),
                "count": written.len()
            });
            Ok(format.to_json(&json))
        }
    }
}
