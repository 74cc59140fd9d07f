//! services/api/src/adapters/cards_llm.rs
//!
//! This module contains the adapter for the card-generating LLM.
//! It implements the `CardGenerationService` port from the `core` crate
//! against any OpenAI-compatible chat-completion endpoint.

use async_openai::{
    config::OpenAIConfig,
    error::OpenAIError,
    types::chat::{
        ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
        CreateChatCompletionRequestArgs,
    },
    Client,
};
use async_trait::async_trait;
use flashdecks_core::{
    domain::{GenerateCardsRequest, GeneratedCard},
    parse::parse_generated_cards,
    ports::{CardGenerationService, GenerationError, GenerationResult},
    prompt::build_prompt,
};
use tracing::debug;

const SYSTEM_INSTRUCTIONS: &str = "You are a flashcard generation assistant.";

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements `CardGenerationService` using an OpenAI-compatible LLM.
#[derive(Clone)]
pub struct OpenAiCardsAdapter {
    client: Client<OpenAIConfig>,
    model: String,
}

impl OpenAiCardsAdapter {
    /// Creates a new `OpenAiCardsAdapter`.
    pub fn new(client: Client<OpenAIConfig>, model: String) -> Self {
        Self { client, model }
    }
}

/// Maps a provider-side message onto the generation error taxonomy.
///
/// The upstream API only hands back strings for most failure modes, so this
/// is a best-effort substring classification; anything unrecognized stays a
/// generic provider error carrying the original message.
fn classify_provider_message(provider: &str, message: &str) -> GenerationError {
    let lower = message.to_lowercase();
    if lower.contains("api key") || lower.contains("invalid_api_key") {
        GenerationError::InvalidCredentials(provider.to_string())
    } else if lower.contains("quota") || lower.contains("rate limit") {
        GenerationError::QuotaExceeded
    } else {
        GenerationError::Provider(message.to_string())
    }
}

fn classify_openai_error(provider: &str, err: OpenAIError) -> GenerationError {
    match err {
        OpenAIError::ApiError(api) => classify_provider_message(provider, &api.message),
        OpenAIError::JSONDeserialize(e, _) => GenerationError::MalformedResponse(e.to_string()),
        other => classify_provider_message(provider, &other.to_string()),
    }
}

//=========================================================================================
// `CardGenerationService` Trait Implementation
//=========================================================================================

#[async_trait]
impl CardGenerationService for OpenAiCardsAdapter {
    /// Generates flashcards from the deck context by prompting the chat model
    /// and parsing its JSON response.
    async fn generate_cards(
        &self,
        request: &GenerateCardsRequest,
    ) -> GenerationResult<Vec<GeneratedCard>> {
        let prompt = build_prompt(request);
        debug!(model = %self.model, count = request.count, "sending card-generation prompt");

        let messages = vec![
            ChatCompletionRequestSystemMessageArgs::default()
                .content(SYSTEM_INSTRUCTIONS)
                .build()
                .map_err(|e| GenerationError::Provider(e.to_string()))?
                .into(),
            ChatCompletionRequestUserMessageArgs::default()
                .content(prompt)
                .build()
                .map_err(|e| GenerationError::Provider(e.to_string()))?
                .into(),
        ];

        let chat_request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .n(1)
            .build()
            .map_err(|e| GenerationError::Provider(e.to_string()))?;

        // Call the API and manually map the error, which respects the orphan rule.
        let response = self
            .client
            .chat()
            .create(chat_request)
            .await
            .map_err(|e: OpenAIError| classify_openai_error(self.provider_name(), e))?;

        let content = response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| {
                GenerationError::MalformedResponse(
                    "model response contained no text content".to_string(),
                )
            })?;

        parse_generated_cards(&content, request.count)
    }

    fn provider_name(&self) -> &str {
        "OpenAI"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_key_messages_classify_as_invalid_credentials() {
        let err = classify_provider_message("OpenAI", "Incorrect API key provided: sk-...");
        assert!(matches!(err, GenerationError::InvalidCredentials(p) if p == "OpenAI"));
    }

    #[test]
    fn quota_and_rate_limit_messages_classify_as_quota_exceeded() {
        for message in [
            "You exceeded your current quota, please check your plan",
            "Rate limit reached for gpt-4o-mini",
        ] {
            let err = classify_provider_message("OpenAI", message);
            assert!(matches!(err, GenerationError::QuotaExceeded));
        }
    }

    #[test]
    fn unrecognized_messages_stay_generic_and_keep_the_text() {
        let err = classify_provider_message("OpenAI", "The model is overloaded");
        match err {
            GenerationError::Provider(msg) => assert_eq!(msg, "The model is overloaded"),
            other => panic!("unexpected classification: {other:?}"),
        }
    }
}
