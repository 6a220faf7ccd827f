use anyhow::Result;
use async_openai::types::{
    ChatChoice, ChatCompletionRequestMessage, ChatCompletionResponseMessage,
    CompletionUsage, CreateChatCompletionResponse, FinishReason, Role,
};
use async_trait::async_trait;
use std::sync::Mutex;

use crate::openai::{OpenAIClientTrait, RecordedRequest};

/// A fake chat-completion client for tests
///
/// Replies are returned in the order they were queued; once the queue is
/// empty a fixed default reply is returned. Every request is recorded so
/// tests can inspect the model name and the messages that were sent.
///
/// # Example
///
/// ```
/// use havi::openai::OpenAIClientTrait;
/// use havi::openai::fake::FakeOpenAIClient;
/// use async_openai::types::{ChatCompletionRequestMessage, ChatCompletionRequestUserMessageArgs};
///
/// #[tokio::main]
/// async fn main() -> anyhow::Result<()> {
///     let client = FakeOpenAIClient::new().with_response("Logged it!");
///
///     let user_msg = ChatCompletionRequestUserMessageArgs::default()
///         .content("4oz bottle at 3pm")
///         .build()?;
///     let messages = vec![ChatCompletionRequestMessage::User(user_msg)];
///
///     let response = client.chat_completion("gpt-4o-mini".to_string(), messages).await?;
///     let content = response.choices.first()
///         .and_then(|choice| choice.message.content.as_ref())
///         .map(String::from)
///         .unwrap_or_default();
///
///     assert_eq!(content, "Logged it!");
///     Ok(())
/// }
/// ```
pub struct FakeOpenAIClient {
    responses: Mutex<Vec<Option<String>>>,
    fail_with: Option<String>,
    pub requests: Mutex<Vec<RecordedRequest>>,
}

impl Default for FakeOpenAIClient {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeOpenAIClient {
    pub fn new() -> Self {
        Self {
            responses: Mutex::new(vec![]),
            fail_with: None,
            requests: Mutex::new(vec![]),
        }
    }

    /// Add a response to be returned by the fake client
    pub fn with_response(self, response: &str) -> Self {
        self.responses
            .lock()
            .unwrap()
            .push(Some(response.to_string()));
        self
    }

    /// Configure the client to return a response with None content
    pub fn with_none_content_response(self) -> Self {
        self.responses.lock().unwrap().push(None);
        self
    }

    /// Make every call fail with the given message
    pub fn with_error(mut self, message: &str) -> Self {
        self.fail_with = Some(message.to_string());
        self
    }
}

#[async_trait]
impl OpenAIClientTrait for FakeOpenAIClient {
    #[allow(deprecated)]
    async fn chat_completion(
        &self,
        model: String,
        messages: Vec<ChatCompletionRequestMessage>,
    ) -> Result<CreateChatCompletionResponse, anyhow::Error> {
        self.requests.lock().unwrap().push(RecordedRequest {
            model_name: model.clone(),
            messages,
        });

        if let Some(message) = &self.fail_with {
            return Err(anyhow::anyhow!("{}", message));
        }

        let content = {
            let mut responses = self.responses.lock().unwrap();
            if responses.is_empty() {
                Some("Fake default response".to_string())
            } else {
                responses.remove(0)
            }
        };

        let message = ChatCompletionResponseMessage {
            role: Role::Assistant,
            content,
            #[allow(deprecated)]
            function_call: None,
            tool_calls: None,
            #[allow(deprecated)]
            refusal: None,
            audio: None,
        };

        let chat_choice = ChatChoice {
            index: 0,
            message,
            finish_reason: Some(FinishReason::Stop),
            logprobs: None,
        };

        let usage = CompletionUsage {
            prompt_tokens: 0,
            completion_tokens: 0,
            total_tokens: 0,
            prompt_tokens_details: None,
            completion_tokens_details: None,
        };

        Ok(CreateChatCompletionResponse {
            id: "fake_id".to_string(),
            object: "chat.completion".to_string(),
            created: 0,
            model,
            system_fingerprint: Some("fake-fingerprint".to_string()),
            service_tier: None,
            choices: vec![chat_choice],
            usage: Some(usage),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_openai::types::ChatCompletionRequestSystemMessageArgs;

    #[tokio::test]
    async fn test_responses_in_order_then_default() -> Result<()> {
        let client = FakeOpenAIClient::new()
            .with_response("First response")
            .with_response("Second response");

        let system_msg = ChatCompletionRequestSystemMessageArgs::default()
            .content("You are Havi")
            .build()?;

        let first = client
            .chat_completion(
                "gpt-4o-mini".to_string(),
                vec![ChatCompletionRequestMessage::System(system_msg)],
            )
            .await?;
        assert_eq!(
            first.choices[0].message.content,
            Some("First response".to_string())
        );

        let second = client
            .chat_completion("gpt-4o-mini".to_string(), vec![])
            .await?;
        assert_eq!(
            second.choices[0].message.content,
            Some("Second response".to_string())
        );

        let third = client
            .chat_completion("gpt-4o-mini".to_string(), vec![])
            .await?;
        assert_eq!(
            third.choices[0].message.content,
            Some("Fake default response".to_string())
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_request_tracking() {
        let client = FakeOpenAIClient::new();
        let system_msg = ChatCompletionRequestSystemMessageArgs::default()
            .content("prompt")
            .build()
            .unwrap();

        let _ = client
            .chat_completion(
                "gpt-4o".to_string(),
                vec![ChatCompletionRequestMessage::System(system_msg)],
            )
            .await
            .unwrap();

        let requests = client.requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].model_name, "gpt-4o");
        assert_eq!(requests[0].messages.len(), 1);
    }

    #[tokio::test]
    async fn test_none_content_and_errors() {
        let client = FakeOpenAIClient::new().with_none_content_response();
        let response = client
            .chat_completion("gpt-4o".to_string(), vec![])
            .await
            .unwrap();
        assert_eq!(response.choices[0].message.content, None);

        let failing = FakeOpenAIClient::new().with_error("rate limited");
        let err = failing
            .chat_completion("gpt-4o".to_string(), vec![])
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "rate limited");
        assert_eq!(failing.requests.lock().unwrap().len(), 1);
    }
}
