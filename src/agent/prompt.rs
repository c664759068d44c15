//! System prompt for the analyst agent and the helpers that assemble it.
//!
//! The prompt can be customised by dropping `analyst.md` into the prompt
//! directory; `querynote init-prompts` writes the default there to start
//! from.

use std::fmt::Write;
use std::path::{Path, PathBuf};

/// System prompt for the analyst agent.
pub const ANALYST_SYSTEM_PROMPT: &str = r"You are a data analyst assistant. You answer questions about a relational database and, when asked, record results in the user's document workspace.

## Tools

You have two groups of tools:

- **Query tools** inspect the database schema and run read-only SQL. Use them for every factual question about the data. Look at the schema before writing a query you are unsure about.
- **Workspace tools** create pages, append tables, and search existing pages in the document workspace.

## Instructions

1. Work out which tables and columns answer the question. Inspect the schema when needed.
2. Run the smallest query that answers it. Prefer aggregates over dumping rows.
3. Answer in plain prose with the key figures. Include a short table when the result has several rows.
4. If a query fails, read the error, fix the SQL and try again. Do not invent numbers.
5. Use the workspace tools only when the user asks to save, send, upload, update, or add something to the workspace. A copy of your answer is published automatically in that case, so a separate page is only needed for extra structure such as a table.

## Rules

- Never modify data. Only run SELECT statements.
- Keep answers concise. State units and time ranges.
- Earlier turns of the conversation are context; follow-up questions may refer to them.";

/// Default prompt directory relative to the user's home.
const DEFAULT_PROMPT_DIR: &str = ".config/querynote/prompts";
/// Filename for the analyst prompt template.
const ANALYST_FILENAME: &str = "analyst.md";

/// The system prompts used by the reasoning engine.
///
/// Loaded from external template files when available, falling back to
/// compiled-in defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptSet {
    /// System prompt for the analyst agent.
    pub analyst: String,
}

impl PromptSet {
    /// Loads prompts from the given directory, falling back to compiled-in defaults.
    ///
    /// Resolution order for `prompt_dir`:
    /// 1. Explicit `prompt_dir` argument (from configuration or CLI)
    /// 2. `~/.config/querynote/prompts/`
    ///
    /// A missing or empty file uses the default.
    #[must_use]
    pub fn load(prompt_dir: Option<&Path>) -> Self {
        let resolved_dir = prompt_dir.map(PathBuf::from).or_else(Self::default_dir);

        let analyst = resolved_dir
            .map(|dir| dir.join(ANALYST_FILENAME))
            .and_then(|path| std::fs::read_to_string(path).ok())
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| ANALYST_SYSTEM_PROMPT.to_string());

        Self { analyst }
    }

    /// Returns compiled-in defaults without checking the filesystem.
    #[must_use]
    pub fn defaults() -> Self {
        Self {
            analyst: ANALYST_SYSTEM_PROMPT.to_string(),
        }
    }

    /// Writes the compiled-in default prompts to the given directory.
    ///
    /// Creates the directory if it does not exist. Existing files are
    /// **not** overwritten.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if directory creation or file writing fails.
    pub fn write_defaults(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
        std::fs::create_dir_all(dir)?;

        let mut written = Vec::new();
        let path = dir.join(ANALYST_FILENAME);
        if !path.exists() {
            std::fs::write(&path, ANALYST_SYSTEM_PROMPT)?;
            written.push(path);
        }

        Ok(written)
    }

    /// Returns the default prompt directory under the user's home.
    #[must_use]
    pub fn default_dir() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(DEFAULT_PROMPT_DIR))
    }
}

/// Builds the full system prompt, adding the default parent page when one
/// is configured.
#[must_use]
pub fn build_system_prompt(template: &str, parent_page_id: Option<&str>) -> String {
    let mut prompt = template.trim_end().to_string();
    if let Some(page_id) = parent_page_id.filter(|p| !p.trim().is_empty()) {
        let _ = write!(
            prompt,
            "\n\n## Workspace\n\nThe default parent page ID is `{page_id}`. Use it as the parent \
             when creating or updating pages unless the user names another page."
        );
    }
    prompt
}
