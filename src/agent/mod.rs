//! Conversational agent.
//!
//! An LLM-backed reasoning engine with tool access, and the orchestrator
//! that runs it turn by turn, keeps the session, and publishes answers to
//! the document workspace when asked.
//!
//! # Architecture
//!
//! ```text
//! User utterance → Orchestrator
//!   ├── ReasoningEngine (AgentEngine)
//!   │   ├── replays Session history
//!   │   └── agentic loop ↔ ToolExecutor (ToolGateway → MCP providers)
//!   ├── append Turn to Session
//!   └── trigger? → PagePublisher (DocumentPublisher → workspace page)
//! ```

pub mod agentic_loop;
pub mod client;
pub mod config;
pub mod engine;
pub mod executor;
pub mod message;
pub mod orchestrator;
pub mod prompt;
pub mod provider;
pub mod providers;
pub mod session;
pub mod tool;

// Re-export key types
pub use agentic_loop::{LoopOutcome, agentic_loop};
pub use client::create_provider;
pub use config::AgentConfig;
pub use engine::{AgentEngine, EngineReply, ReasoningEngine};
pub use executor::ToolExecutor;
pub use message::{ChatMessage, ChatRequest, ChatResponse, Role, TokenUsage};
pub use orchestrator::{ConversationState, LineSource, Orchestrator, TurnReport};
pub use prompt::{PromptSet, build_system_prompt};
pub use provider::LlmProvider;
pub use session::{ResponsePayload, Session, Turn};
pub use tool::{ToolCall, ToolDefinition, ToolInvocation, ToolResult, ToolSet};
