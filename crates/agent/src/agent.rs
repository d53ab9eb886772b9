use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;

use sb_domain::config::LlmConfig;
use sb_domain::conversation::AgentMessage;
use sb_domain::error::{Error, Result};
use sb_domain::tool::Message;
use sb_domain::trace::TraceEvent;
use sb_woocommerce::ToolRegistry;

use crate::llm::{ChatRequest, LlmClient};
use crate::openai::OpenAiChat;

/// Answers a user message given the recent conversation.
#[async_trait]
pub trait Agent: Send + Sync {
    async fn respond(&self, message: &str, history: &[AgentMessage]) -> Result<String>;
}

/// Tool-calling agent over an OpenAI-compatible chat endpoint.
///
/// Each round sends the transcript so far; tool calls in the reply are run
/// through the [`ToolRegistry`] and their results appended before the next
/// round.  A reply with no tool calls ends the loop.
pub struct OpenAiAgent {
    llm: Arc<dyn LlmClient>,
    tools: ToolRegistry,
    instructions: String,
    temperature: f32,
    max_tool_rounds: u32,
}

impl OpenAiAgent {
    pub fn from_config(cfg: &LlmConfig, tools: ToolRegistry) -> Result<Self> {
        let llm = Arc::new(OpenAiChat::from_config(cfg)?);
        Ok(Self::with_client(llm, tools, cfg))
    }

    pub fn with_client(llm: Arc<dyn LlmClient>, tools: ToolRegistry, cfg: &LlmConfig) -> Self {
        Self {
            llm,
            tools,
            instructions: cfg.instructions.clone(),
            temperature: cfg.temperature,
            max_tool_rounds: cfg.max_tool_rounds,
        }
    }
}

#[async_trait]
impl Agent for OpenAiAgent {
    async fn respond(&self, message: &str, history: &[AgentMessage]) -> Result<String> {
        let start = Instant::now();

        let mut messages = Vec::with_capacity(history.len() + 2);
        messages.push(Message::system(&self.instructions));
        messages.extend(history.iter().map(Message::from));
        messages.push(Message::user(message));

        tracing::info!(history = history.len(), "running agent");

        let mut req = ChatRequest {
            messages,
            tools: self.tools.definitions().to_vec(),
            temperature: Some(self.temperature),
            model: None,
        };
        let mut tool_calls = 0usize;
        let mut model = self.llm.default_model().to_owned();

        for round in 0..=self.max_tool_rounds {
            let resp = self.llm.chat(&req).await?;
            model = resp.model.clone();

            if resp.tool_calls.is_empty() {
                if resp.content.trim().is_empty() {
                    return Err(Error::Agent("model returned an empty reply".into()));
                }
                TraceEvent::AgentCall {
                    model,
                    rounds: round + 1,
                    tool_calls,
                    duration_ms: start.elapsed().as_millis() as u64,
                }
                .emit();
                return Ok(resp.content);
            }

            if round == self.max_tool_rounds {
                break;
            }

            for call in &resp.tool_calls {
                tracing::debug!(tool = %call.tool_name, call_id = %call.call_id, "tool call");
            }
            req.messages
                .push(Message::assistant_tool_calls(resp.tool_calls.clone()));
            for call in resp.tool_calls {
                let output = self.tools.dispatch(&call.tool_name, &call.arguments).await;
                req.messages
                    .push(Message::tool_result(call.call_id, output.to_string()));
                tool_calls += 1;
            }
        }

        TraceEvent::AgentCall {
            model,
            rounds: self.max_tool_rounds + 1,
            tool_calls,
            duration_ms: start.elapsed().as_millis() as u64,
        }
        .emit();
        Err(Error::Agent(format!(
            "no final answer after {} tool rounds",
            self.max_tool_rounds
        )))
    }
}
