use anyhow::{anyhow, Result};
use futures::stream::BoxStream;
use futures::{FutureExt, TryStreamExt};
use serde_json::Value;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use crate::errors::{AgentError, AgentResult, ConversationError};
use crate::models::message::{Message, ToolRequest};
use crate::models::role::Role;
use crate::persona::PersonaContext;
use crate::providers::base::Provider;
use crate::registry::ToolRegistry;

/// Model calls allowed in a single reply before it is considered stuck
pub const DEFAULT_MAX_TURNS: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ReplyState {
    AwaitingModel { turn: usize },
    Done,
}

/// Agent drives the tool calling loop between the model and the tool registry
pub struct Agent {
    provider: Arc<dyn Provider>,
    registry: ToolRegistry,
    max_turns: usize,
}

impl Agent {
    pub fn new(provider: Arc<dyn Provider>, registry: ToolRegistry) -> Self {
        Self {
            provider,
            registry,
            max_turns: DEFAULT_MAX_TURNS,
        }
    }

    pub fn with_max_turns(mut self, max_turns: usize) -> Self {
        self.max_turns = max_turns;
        self
    }

    /// Ask the model for the next message, unless the turn ceiling has been reached
    async fn next_turn(&self, turn: usize, system: &str, messages: &[Message]) -> Result<Message> {
        if turn >= self.max_turns {
            return Err(ConversationError::DidNotConverge {
                limit: self.max_turns,
            }
            .into());
        }

        tracing::debug!(turn, messages = messages.len(), "Awaiting model");
        let (response, usage) = self
            .provider
            .complete(system, messages, self.registry.tools())
            .await?;
        tracing::debug!(turn, total_tokens = ?usage.total_tokens, "Model replied");
        Ok(response)
    }

    /// Run a single tool request. Failures of any kind, including a panicking handler, become
    /// the result of this call only.
    async fn dispatch_tool_call(&self, request: &ToolRequest) -> AgentResult<Value> {
        let call = request.tool_call.clone()?;
        match AssertUnwindSafe(self.registry.dispatch(&call))
            .catch_unwind()
            .await
        {
            Ok(result) => result,
            Err(_) => Err(AgentError::ExecutionError(format!(
                "Tool {} panicked",
                call.name
            ))),
        }
    }

    /// Create a stream that yields each message as it's generated by the agent.
    /// This includes both the assistant's responses and one tool message per tool call.
    /// The stream ends after the first assistant message that requests no tools.
    pub fn reply<'a>(
        &'a self,
        system: &'a str,
        messages: &[Message],
    ) -> BoxStream<'a, Result<Message>> {
        let mut messages = messages.to_vec();

        Box::pin(async_stream::try_stream! {
            let mut state = ReplyState::AwaitingModel { turn: 0 };

            while let ReplyState::AwaitingModel { turn } = state {
                let response = self.next_turn(turn, system, &messages).await?;
                yield response.clone();

                if !response.has_tool_requests() {
                    state = ReplyState::Done;
                    continue;
                }

                messages.push(response.clone());
                for request in response.tool_requests() {
                    let result = self.dispatch_tool_call(request).await;
                    if let Err(e) = &result {
                        tracing::warn!(id = %request.id, "Tool call failed: {}", e);
                    }
                    let tool_message = Message::tool().with_tool_response(request.id.clone(), result);
                    messages.push(tool_message.clone());
                    yield tool_message;
                }

                state = ReplyState::AwaitingModel { turn: turn + 1 };
            }

            tracing::debug!("Reply complete");
        })
    }

    /// Answer `message` as the persona, given the earlier history of the conversation.
    /// Returns the text of the model's final answer.
    pub async fn chat(
        &self,
        persona: &PersonaContext,
        history: &[Message],
        message: &str,
    ) -> Result<String> {
        let system = persona.system_prompt()?;
        let mut messages = history.to_vec();
        messages.push(Message::user().with_text(message));

        let mut answer = None;
        let mut stream = self.reply(&system, &messages);
        while let Some(message) = stream.try_next().await? {
            if message.role == Role::Assistant {
                answer = Some(message);
            }
        }

        answer
            .map(|message| message.text())
            .ok_or_else(|| anyhow!("Conversation ended without an answer"))
    }
}
