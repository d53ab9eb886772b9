//! The downstream agent: an LLM that answers store questions by calling
//! the shop tools.

pub mod agent;
pub mod llm;
pub mod openai;

pub use agent::{Agent, OpenAiAgent};
pub use llm::{ChatRequest, ChatResponse, LlmClient};
pub use openai::OpenAiChat;
