//! Conversation orchestrator.
//!
//! Drives one conversation turn by turn:
//!
//! ```text
//! Idle ─start─→ AwaitingInput ─utterance─→ Reasoning ─→ PublishCheck ─→ AwaitingInput
//!                     └─exit/EOF─→ Closed
//! ```
//!
//! Every answered turn is appended to the [`Session`]. When the utterance
//! carries a publish trigger, the turn's answer is handed to the
//! [`PagePublisher`] regardless of whether the engine already published
//! something through its own tools.

use std::io::Write;
use std::sync::Arc;

use chrono::Local;
use tracing::{debug, info, warn};

use super::engine::ReasoningEngine;
use super::session::{Session, Turn};
use crate::core::{matched_keywords, should_publish};
use crate::error::{AgentError, Error, PublishError};
use crate::mcp::ProviderKind;
use crate::publish::{PagePublisher, PublishOutcome, PublishRequest};

/// Inputs that end the conversation, compared case-insensitively.
pub const EXIT_COMMANDS: &[&str] = &["quit", "exit", "종료"];

/// Where the orchestrator is in its turn cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversationState {
    /// Created, tools not yet confirmed.
    Idle,
    /// Waiting for the next utterance.
    AwaitingInput,
    /// The engine is working on an utterance.
    Reasoning,
    /// Deciding whether to publish the turn.
    PublishCheck,
    /// Finished. No further input is accepted.
    Closed,
}

/// What happened to one line of input.
#[derive(Debug)]
pub enum TurnReport {
    /// An exit command closed the conversation.
    Exit,
    /// Blank input; nothing happened.
    Ignored,
    /// The engine answered and the turn was recorded.
    Responded {
        /// Outcome of the deterministic publish, if the trigger fired.
        publish: Option<Result<PublishOutcome, PublishError>>,
    },
    /// The engine failed. The session is unchanged.
    ReasoningFailed(AgentError),
}

/// Supplies lines of user input.
pub trait LineSource {
    /// Reads the next line. `Ok(None)` means end of input.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if input cannot be read.
    fn read_line(&mut self, prompt: &str) -> std::io::Result<Option<String>>;
}

/// Returns `true` for exit commands.
#[must_use]
pub fn is_exit_command(line: &str) -> bool {
    let line = line.trim();
    EXIT_COMMANDS.iter().any(|cmd| line.eq_ignore_ascii_case(cmd))
}

/// Runs a conversation against a reasoning engine and a publisher.
pub struct Orchestrator {
    engine: Arc<dyn ReasoningEngine>,
    publisher: Arc<dyn PagePublisher>,
    label: String,
    session: Session,
    state: ConversationState,
}

impl Orchestrator {
    /// Prompt shown before each utterance.
    pub const PROMPT: &'static str = "You> ";

    /// Creates an idle orchestrator with a fresh session.
    ///
    /// `label` prefixes the title of every page published on trigger.
    pub fn new(
        engine: Arc<dyn ReasoningEngine>,
        publisher: Arc<dyn PagePublisher>,
        label: impl Into<String>,
    ) -> Self {
        Self {
            engine,
            publisher,
            label: label.into(),
            session: Session::new(),
            state: ConversationState::Idle,
        }
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> ConversationState {
        self.state
    }

    /// The conversation so far.
    #[must_use]
    pub const fn session(&self) -> &Session {
        &self.session
    }

    /// Marks the toolset as ready and starts accepting input.
    pub fn start(&mut self) {
        if self.state == ConversationState::Idle {
            info!(session = self.session.id(), "conversation started");
            self.state = ConversationState::AwaitingInput;
        }
    }

    /// Closes the conversation. Idempotent.
    pub fn close(&mut self) {
        if self.state != ConversationState::Closed {
            info!(
                session = self.session.id(),
                turns = self.session.len(),
                "conversation closed"
            );
            self.state = ConversationState::Closed;
        }
    }

    /// Handles one line of input and writes user-visible output to `out`.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::Orchestration`] when called outside
    /// `AwaitingInput`, or an I/O error if `out` cannot be written.
    #[allow(clippy::future_not_send)]
    pub async fn handle_input(
        &mut self,
        line: &str,
        out: &mut dyn Write,
    ) -> Result<TurnReport, Error> {
        if self.state != ConversationState::AwaitingInput {
            return Err(AgentError::Orchestration {
                message: format!("cannot accept input in state {:?}", self.state),
            }
            .into());
        }

        let utterance = line.trim();
        if utterance.is_empty() {
            return Ok(TurnReport::Ignored);
        }
        if is_exit_command(utterance) {
            self.close();
            return Ok(TurnReport::Exit);
        }

        self.state = ConversationState::Reasoning;
        let report = self.answer(utterance, out).await;
        // Every turn ends in AwaitingInput, even when writing output failed.
        self.state = ConversationState::AwaitingInput;
        report
    }

    /// Reasons about one utterance, records the turn and publishes on trigger.
    #[allow(clippy::future_not_send)]
    async fn answer(&mut self, utterance: &str, out: &mut dyn Write) -> Result<TurnReport, Error> {
        let reply = match self.engine.respond(self.session.turns(), utterance).await {
            Ok(reply) => reply,
            Err(e) => {
                warn!(error = %e, "reasoning failed");
                writeln!(out, "\n{e}\n")?;
                return Ok(TurnReport::ReasoningFailed(e));
            }
        };

        if reply.used_provider(ProviderKind::Publishing) {
            info!("engine called publishing tools on its own");
        }
        if let Some(value) = reply.payload.as_json() {
            debug!(array = value.is_array(), "structured answer");
        }

        let text = reply.payload.to_publish_text();
        self.session.push(Turn::new(utterance, reply.payload));
        writeln!(out, "\n{text}\n")?;

        self.state = ConversationState::PublishCheck;
        let publish = if should_publish(utterance) {
            debug!(keywords = ?matched_keywords(utterance), "publish trigger fired");
            let request = PublishRequest::new(&self.label, text, Local::now());
            let result = self.publisher.publish(&request).await;
            write_publish_report(out, &result)?;
            Some(result)
        } else {
            None
        };

        Ok(TurnReport::Responded { publish })
    }

    /// Reads lines until an exit command or end of input, then closes.
    ///
    /// # Errors
    ///
    /// Returns an error if input cannot be read or output cannot be written.
    /// Reasoning and publishing failures are reported to `out` and do not
    /// end the loop.
    #[allow(clippy::future_not_send)]
    pub async fn run(
        &mut self,
        input: &mut dyn LineSource,
        out: &mut dyn Write,
    ) -> Result<(), Error> {
        self.start();
        let result = self.read_loop(input, out).await;
        self.close();
        result
    }

    #[allow(clippy::future_not_send)]
    async fn read_loop(
        &mut self,
        input: &mut dyn LineSource,
        out: &mut dyn Write,
    ) -> Result<(), Error> {
        while let Some(line) = input.read_line(Self::PROMPT)? {
            if matches!(self.handle_input(&line, out).await?, TurnReport::Exit) {
                break;
            }
        }
        Ok(())
    }
}

/// Writes the user-visible result of a publish attempt.
fn write_publish_report(
    out: &mut dyn Write,
    result: &Result<PublishOutcome, PublishError>,
) -> std::io::Result<()> {
    match result {
        Ok(outcome) if outcome.is_complete() => writeln!(
            out,
            "Published to workspace: {} ({} blocks)\n",
            outcome.page.url, outcome.blocks_total
        ),
        Ok(outcome) => {
            writeln!(
                out,
                "Published to workspace with gaps: {} ({}/{} blocks)",
                outcome.page.url, outcome.succeeded, outcome.blocks_total
            )?;
            for failure in &outcome.failures {
                writeln!(out, "  append-block #{}: {}", failure.index, failure.message)?;
            }
            writeln!(out)
        }
        Err(e) => writeln!(out, "Publishing failed: {e}\n"),
    }
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("label", &self.label)
            .field("session", &self.session.id())
            .field("turns", &self.session.len())
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}
