use crate::model_request::{ChatMessage, ModelRequest, Role};
use crate::openai::OpenAIClientTrait;
use anyhow::Result;
use async_openai::types::{
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
    ChatCompletionRequestUserMessageArgs,
};
use std::sync::Arc;
use tracing::{info, instrument, warn};

fn to_openai_message(
    message: &ChatMessage,
) -> Result<ChatCompletionRequestMessage> {
    let converted = match message.role {
        Role::System => ChatCompletionRequestMessage::System(
            ChatCompletionRequestSystemMessageArgs::default()
                .content(message.content.as_str())
                .build()
                .map_err(|e| {
                    anyhow::anyhow!("Failed to build system message: {}", e)
                })?,
        ),
        Role::User => ChatCompletionRequestMessage::User(
            ChatCompletionRequestUserMessageArgs::default()
                .content(message.content.as_str())
                .build()
                .map_err(|e| {
                    anyhow::anyhow!("Failed to build user message: {}", e)
                })?,
        ),
    };
    Ok(converted)
}

pub fn to_openai_messages(
    request: &ModelRequest,
) -> Result<Vec<ChatCompletionRequestMessage>> {
    request.messages.iter().map(to_openai_message).collect()
}

/// Send a built request to the model and return the reply text.
#[instrument(skip(client, request), err)]
pub async fn ask_havi(
    client: Arc<dyn OpenAIClientTrait>,
    model: &str,
    request: &ModelRequest,
) -> Result<String> {
    let messages = to_openai_messages(request)?;

    let start_time = std::time::Instant::now();
    let response = client.chat_completion(model.to_string(), messages).await?;
    info!(
        "Chat completion from {} took {:?}",
        model,
        start_time.elapsed()
    );

    let choice = response
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| anyhow::anyhow!("No choices in model response"))?;

    match choice.message.content {
        Some(content) => Ok(content),
        None => {
            warn!("Model {} returned a choice without content", model);
            Err(anyhow::anyhow!("Model response had no content"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model_request::{build_havi_model_request_at, ModelRequestInput};
    use crate::openai::fake::FakeOpenAIClient;
    use crate::prompts::HAVI_SYSTEM_PROMPT;
    use async_openai::types::{
        ChatCompletionRequestSystemMessageContent,
        ChatCompletionRequestUserMessageContent,
    };
    use chrono::NaiveDate;

    fn request(message: &str) -> ModelRequest {
        let input = ModelRequestInput {
            user_message: message.to_string(),
            feedback_summary: Some("Prefers bullet points".to_string()),
            ..Default::default()
        };
        build_havi_model_request_at(
            &input,
            NaiveDate::from_ymd_opt(2024, 6, 10).unwrap(),
            chrono_tz::UTC,
        )
    }

    #[test]
    fn test_messages_convert_in_order() {
        let messages = to_openai_messages(&request("Hi")).unwrap();
        assert_eq!(messages.len(), 2);

        match &messages[0] {
            ChatCompletionRequestMessage::System(system) => match &system
                .content
            {
                ChatCompletionRequestSystemMessageContent::Text(text) => {
                    assert!(text.starts_with(HAVI_SYSTEM_PROMPT));
                    assert!(text
                        .ends_with("Feedback summary: Prefers bullet points"));
                }
                other => panic!("unexpected system content: {:?}", other),
            },
            other => panic!("expected system message, got {:?}", other),
        }

        match &messages[1] {
            ChatCompletionRequestMessage::User(user) => match &user.content {
                ChatCompletionRequestUserMessageContent::Text(text) => {
                    assert_eq!(text, "Hi")
                }
                other => panic!("unexpected user content: {:?}", other),
            },
            other => panic!("expected user message, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_ask_havi_returns_reply() {
        let fake = Arc::new(
            FakeOpenAIClient::new().with_response("Logged the 4oz bottle."),
        );

        let reply = ask_havi(fake.clone(), "gpt-4o-mini", &request("4oz"))
            .await
            .unwrap();
        assert_eq!(reply, "Logged the 4oz bottle.");

        let requests = fake.requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].model_name, "gpt-4o-mini");
        assert_eq!(requests[0].messages.len(), 2);
    }

    #[tokio::test]
    async fn test_ask_havi_missing_content_is_error() {
        let fake = Arc::new(FakeOpenAIClient::new().with_none_content_response());
        let result = ask_havi(fake, "gpt-4o-mini", &request("hi")).await;
        assert_eq!(
            result.unwrap_err().to_string(),
            "Model response had no content"
        );
    }

    #[tokio::test]
    async fn test_ask_havi_propagates_client_error() {
        let fake = Arc::new(FakeOpenAIClient::new().with_error("upstream down"));
        let result = ask_havi(fake, "gpt-4o-mini", &request("hi")).await;
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("upstream down"));
    }
}
