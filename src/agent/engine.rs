//! The reasoning engine behind each conversational turn.
//!
//! [`AgentEngine`] replays the session history to the model, offers it the
//! gateway's merged tool pool and runs the agentic loop until the model
//! produces an answer.

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use tracing::{debug, info};

use super::agentic_loop::agentic_loop;
use super::config::AgentConfig;
use super::executor::ToolExecutor;
use super::message::{
    ChatMessage, ChatRequest, TokenUsage, assistant_message, system_message, user_message,
};
use super::provider::LlmProvider;
use super::session::{ResponsePayload, Turn};
use super::tool::{ToolInvocation, ToolSet};
use crate::error::AgentError;

/// The engine's answer to one utterance.
#[derive(Debug, Clone)]
pub struct EngineReply {
    /// Final answer.
    pub payload: ResponsePayload,
    /// Tokens spent across the whole tool loop.
    pub usage: TokenUsage,
    /// Tools the engine called while answering, in order.
    pub tool_calls: Vec<ToolInvocation>,
}

impl EngineReply {
    /// Returns `true` if any call went to the given provider.
    #[must_use]
    pub fn used_provider(&self, kind: crate::mcp::ProviderKind) -> bool {
        self.tool_calls.iter().any(|c| c.provider == Some(kind))
    }
}

/// Answers utterances given the conversation so far.
///
/// The orchestrator only depends on this trait, so tests can script the
/// engine without a model.
#[async_trait]
pub trait ReasoningEngine: Send + Sync {
    /// Produces a reply to `utterance` with `history` as memory.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError`] if the model call fails or the tool loop
    /// does not converge.
    async fn respond(&self, history: &[Turn], utterance: &str)
    -> Result<EngineReply, AgentError>;
}

/// LLM-backed engine with tool access.
pub struct AgentEngine {
    provider: Arc<dyn LlmProvider>,
    executor: Arc<dyn ToolExecutor>,
    tools: ToolSet,
    config: AgentConfig,
    system_prompt: String,
}

impl AgentEngine {
    /// Creates an engine.
    ///
    /// `system_prompt` should already include any workspace hints, see
    /// [`super::prompt::build_system_prompt`].
    pub fn new(
        provider: Arc<dyn LlmProvider>,
        executor: Arc<dyn ToolExecutor>,
        tools: ToolSet,
        config: AgentConfig,
        system_prompt: impl Into<String>,
    ) -> Self {
        Self {
            provider,
            executor,
            tools,
            config,
            system_prompt: system_prompt.into(),
        }
    }

    /// Builds the message list: system prompt, replayed history, new utterance.
    fn build_messages(&self, history: &[Turn], utterance: &str) -> Vec<ChatMessage> {
        let mut messages = Vec::with_capacity(history.len() * 2 + 2);
        messages.push(system_message(&self.system_prompt));
        for turn in history {
            messages.push(user_message(&turn.utterance));
            messages.push(assistant_message(&turn.response.to_publish_text()));
        }
        messages.push(user_message(utterance));
        messages
    }
}

#[async_trait]
impl ReasoningEngine for AgentEngine {
    async fn respond(
        &self,
        history: &[Turn],
        utterance: &str,
    ) -> Result<EngineReply, AgentError> {
        if utterance.trim().is_empty() {
            return Err(AgentError::Orchestration {
                message: "utterance cannot be empty".to_string(),
            });
        }

        let start = Instant::now();
        let mut request = ChatRequest {
            model: self.config.model.clone(),
            messages: self.build_messages(history, utterance),
            temperature: self.config.temperature,
            max_tokens: Some(self.config.max_tokens),
            tools: self.tools.definitions().to_vec(),
        };
        debug!(
            history = history.len(),
            tools = self.tools.len(),
            model = %self.config.model,
            "invoking reasoning engine"
        );

        let outcome = agentic_loop(
            self.provider.as_ref(),
            &mut request,
            self.executor.as_ref(),
            self.config.max_tool_iterations,
        )
        .await?;

        info!(
            tool_calls = outcome.invocations.len(),
            total_tokens = outcome.usage.total_tokens,
            elapsed_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX),
            "reasoning complete"
        );

        Ok(EngineReply {
            payload: ResponsePayload::from_content(&outcome.response.content),
            usage: outcome.usage,
            tool_calls: outcome.invocations,
        })
    }
}

impl std::fmt::Debug for AgentEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentEngine")
            .field("provider", &self.provider.name())
            .field("tools", &self.tools.len())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
