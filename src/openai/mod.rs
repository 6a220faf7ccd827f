pub mod fake;
pub mod real;

use anyhow::Result;
use async_openai::types::{
    ChatCompletionRequestMessage, CreateChatCompletionResponse,
};
use async_trait::async_trait;

/// A request as seen by a client, kept by the fake client for assertions
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub model_name: String,
    pub messages: Vec<ChatCompletionRequestMessage>,
}

/// A trait that abstracts the chat-completion backend
///
/// Implemented by [`real::RealOpenAIClient`] for OpenAI-compatible APIs and
/// by [`fake::FakeOpenAIClient`] for tests.
#[async_trait]
pub trait OpenAIClientTrait: Send + Sync {
    /// Creates a chat completion by sending messages to the language model
    ///
    /// # Arguments
    /// * `model` - The model identifier (e.g., "gpt-4o-mini")
    /// * `messages` - A sequence of messages using OpenAI types
    async fn chat_completion(
        &self,
        model: String,
        messages: Vec<ChatCompletionRequestMessage>,
    ) -> Result<CreateChatCompletionResponse, anyhow::Error>;
}
