//! Agentic tool-calling loop.
//!
//! Drives the LLM ↔ tool execution round-trip: sends a request to the model,
//! executes any tool calls in the response, appends results, and repeats
//! until the model produces a final text response or the iteration limit
//! is reached.

use tracing::{debug, warn};

use super::executor::{ToolExecutor, check_arguments};
use super::message::{
    ChatRequest, ChatResponse, TokenUsage, assistant_tool_calls_message, tool_message,
};
use super::provider::LlmProvider;
use super::tool::ToolInvocation;
use crate::error::AgentError;

/// What the loop produced for one turn.
#[derive(Debug, Clone)]
pub struct LoopOutcome {
    /// The model's final response.
    pub response: ChatResponse,
    /// Usage summed over every model call in the loop.
    pub usage: TokenUsage,
    /// Tool calls made along the way, in order.
    pub invocations: Vec<ToolInvocation>,
}

/// Runs an agentic loop: model → tool calls → tool results → model → …
///
/// Continues until the model responds without tool calls (i.e., it produces
/// a final text answer) or `max_iterations` is reached. Tool calls within
/// one response run one after another.
///
/// # Arguments
///
/// * `provider` - LLM provider to call.
/// * `request` - Initial chat request (mutated in-place with tool messages).
/// * `executor` - Dispatches tool calls.
/// * `max_iterations` - Safety limit on round-trips.
///
/// # Errors
///
/// Returns [`AgentError::ToolLoopExceeded`] if the model keeps requesting
/// tools beyond `max_iterations`. Propagates any provider errors.
pub async fn agentic_loop(
    provider: &dyn LlmProvider,
    request: &mut ChatRequest,
    executor: &dyn ToolExecutor,
    max_iterations: usize,
) -> Result<LoopOutcome, AgentError> {
    let mut usage = TokenUsage::default();
    let mut invocations = Vec::new();

    for iteration in 0..max_iterations {
        let response = provider.chat(request).await?;
        usage.accumulate(&response.usage);

        // If no tool calls, we have a final answer
        if response.tool_calls.is_empty() {
            if response.finish_reason.as_deref() == Some("length") {
                warn!(iteration, "final response truncated at the token limit");
            }
            debug!(
                iteration,
                finish_reason = response.finish_reason.as_deref().unwrap_or("unknown"),
                "agentic loop completed with final text response"
            );
            return Ok(LoopOutcome {
                response,
                usage,
                invocations,
            });
        }

        debug!(
            iteration,
            tool_count = response.tool_calls.len(),
            "executing tool calls"
        );

        // Append the assistant message with tool calls
        request
            .messages
            .push(assistant_tool_calls_message(response.tool_calls.clone()));

        // Execute each tool call and append results
        for call in &response.tool_calls {
            let result = match check_arguments(call) {
                Some(rejected) => rejected,
                None => executor.execute(call).await,
            };
            debug!(
                tool = call.name,
                call_id = call.id,
                is_error = result.is_error,
                "tool execution complete"
            );
            invocations.push(ToolInvocation {
                name: call.name.clone(),
                provider: executor.provider_of(&call.name),
                is_error: result.is_error,
            });
            request
                .messages
                .push(tool_message(&result.tool_call_id, &result.content));
        }
    }

    Err(AgentError::ToolLoopExceeded { max_iterations })
}

#[cfg(test)]
#[allow(clippy::panic)]
pub(crate) mod tests {
    use super::*;
    use crate::agent::message::{ChatRequest, system_message, user_message};
    use crate::agent::tool::{ToolCall, ToolResult};
    use crate::mcp::ProviderKind;

    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    /// Mock provider that returns tool calls on the first N calls,
    /// then a final text response.
    pub(crate) struct MockToolProvider {
        call_count: AtomicUsize,
        tool_rounds: usize,
        tool_name: &'static str,
    }

    impl MockToolProvider {
        pub(crate) fn new(tool_rounds: usize) -> Self {
            Self::calling(tool_rounds, "run_query")
        }

        pub(crate) fn calling(tool_rounds: usize, tool_name: &'static str) -> Self {
            Self {
                call_count: AtomicUsize::new(0),
                tool_rounds,
                tool_name,
            }
        }
    }

    #[async_trait]
    impl LlmProvider for MockToolProvider {
        fn name(&self) -> &'static str {
            "mock"
        }

        async fn chat(&self, _request: &ChatRequest) -> Result<ChatResponse, AgentError> {
            let count = self.call_count.fetch_add(1, Ordering::SeqCst);

            if count < self.tool_rounds {
                Ok(ChatResponse {
                    content: String::new(),
                    usage: TokenUsage {
                        prompt_tokens: 10,
                        completion_tokens: 2,
                        total_tokens: 12,
                    },
                    tool_calls: vec![ToolCall {
                        id: format!("call_{count}"),
                        name: self.tool_name.to_string(),
                        arguments: r#"{"sql":"SELECT 1"}"#.to_string(),
                    }],
                    finish_reason: Some("tool_calls".to_string()),
                })
            } else {
                Ok(ChatResponse {
                    content: "Final answer based on tool results.".to_string(),
                    usage: TokenUsage {
                        prompt_tokens: 100,
                        completion_tokens: 20,
                        total_tokens: 120,
                    },
                    tool_calls: Vec::new(),
                    finish_reason: Some("stop".to_string()),
                })
            }
        }
    }

    /// Executor that echoes call names and remembers them.
    #[derive(Default)]
    pub(crate) struct EchoExecutor {
        pub calls: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl ToolExecutor for EchoExecutor {
        async fn execute(&self, call: &ToolCall) -> ToolResult {
            if let Ok(mut calls) = self.calls.lock() {
                calls.push(call.name.clone());
            }
            ToolResult {
                tool_call_id: call.id.clone(),
                content: format!("{} ok", call.name),
                is_error: call.name == "broken",
            }
        }

        fn provider_of(&self, tool: &str) -> Option<ProviderKind> {
            match tool {
                "create_analysis_page" => Some(ProviderKind::Publishing),
                "run_query" | "broken" => Some(ProviderKind::Query),
                _ => None,
            }
        }
    }

    fn request() -> ChatRequest {
        ChatRequest {
            model: "test".to_string(),
            messages: vec![system_message("test"), user_message("query")],
            temperature: Some(0.0),
            max_tokens: Some(1024),
            tools: Vec::new(),
        }
    }

    #[tokio::test]
    async fn test_agentic_loop_single_tool_round() {
        let executor = EchoExecutor::default();
        let provider = MockToolProvider::new(1);
        let mut request = request();

        let outcome = agentic_loop(&provider, &mut request, &executor, 10)
            .await
            .unwrap_or_else(|e| panic!("agentic_loop failed: {e}"));

        assert_eq!(outcome.response.content, "Final answer based on tool results.");
        // system + user + assistant(tool_calls) + tool(result) = 4 messages
        assert_eq!(request.messages.len(), 4);
        assert_eq!(outcome.usage.total_tokens, 132);
        assert_eq!(
            outcome.invocations,
            vec![ToolInvocation {
                name: "run_query".to_string(),
                provider: Some(ProviderKind::Query),
                is_error: false,
            }]
        );
    }

    #[tokio::test]
    async fn test_agentic_loop_multiple_rounds() {
        let executor = EchoExecutor::default();
        let provider = MockToolProvider::new(3);
        let mut request = request();

        let outcome = agentic_loop(&provider, &mut request, &executor, 10)
            .await
            .unwrap_or_else(|e| panic!("agentic_loop failed: {e}"));

        // 2 initial + 3 rounds * 2 (assistant + tool) = 8 messages
        assert_eq!(request.messages.len(), 8);
        assert_eq!(outcome.invocations.len(), 3);
        assert_eq!(executor.calls.lock().map(|c| c.len()).unwrap_or(0), 3);
    }

    #[tokio::test]
    async fn test_agentic_loop_exceeds_max() {
        let executor = EchoExecutor::default();
        let provider = MockToolProvider::new(100);
        let mut request = request();

        let result = agentic_loop(&provider, &mut request, &executor, 2).await;
        assert!(
            matches!(result, Err(AgentError::ToolLoopExceeded { max_iterations: 2 })),
            "Expected ToolLoopExceeded"
        );
    }

    #[tokio::test]
    async fn test_agentic_loop_no_tools() {
        let executor = EchoExecutor::default();
        let provider = MockToolProvider::new(0);
        let mut request = request();

        let outcome = agentic_loop(&provider, &mut request, &executor, 10)
            .await
            .unwrap_or_else(|e| panic!("agentic_loop failed: {e}"));

        assert!(outcome.invocations.is_empty());
        assert_eq!(request.messages.len(), 2);
    }

    #[tokio::test]
    async fn test_tool_errors_are_fed_back() {
        let executor = EchoExecutor::default();
        let provider = MockToolProvider::calling(1, "broken");
        let mut request = request();

        let outcome = agentic_loop(&provider, &mut request, &executor, 10)
            .await
            .unwrap_or_else(|e| panic!("agentic_loop failed: {e}"));

        assert!(outcome.invocations[0].is_error);
        assert_eq!(request.messages[3].content, "broken ok");
    }

    /// Provider whose only answer was cut off at the token limit.
    struct TruncatingProvider;

    #[async_trait]
    impl LlmProvider for TruncatingProvider {
        fn name(&self) -> &'static str {
            "truncating"
        }

        async fn chat(&self, _request: &ChatRequest) -> Result<ChatResponse, AgentError> {
            Ok(ChatResponse {
                content: "Partial answ".to_string(),
                usage: TokenUsage::default(),
                tool_calls: Vec::new(),
                finish_reason: Some("length".to_string()),
            })
        }
    }

    #[tokio::test]
    async fn test_truncated_answer_is_still_returned() {
        let executor = EchoExecutor::default();
        let mut request = request();

        let outcome = agentic_loop(&TruncatingProvider, &mut request, &executor, 10)
            .await
            .unwrap_or_else(|e| panic!("agentic_loop failed: {e}"));

        assert_eq!(outcome.response.content, "Partial answ");
        assert_eq!(outcome.response.finish_reason.as_deref(), Some("length"));
    }
}
