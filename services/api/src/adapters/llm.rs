//! services/api/src/adapters/llm.rs
//!
//! Provider selection for the card-generation port. One concrete backend
//! (any OpenAI-compatible endpoint) is implemented; the other provider names
//! resolve to a stub that fails every call with a "not yet implemented"
//! generation error.

use std::sync::Arc;

use async_openai::{config::OpenAIConfig, Client};
use async_trait::async_trait;
use flashdecks_core::{
    domain::{GenerateCardsRequest, GeneratedCard},
    ports::{CardGenerationService, GenerationError, GenerationResult},
};

use crate::adapters::cards_llm::OpenAiCardsAdapter;
use crate::config::Config;
use crate::error::ApiError;

//=========================================================================================
// Stub Providers
//=========================================================================================

/// A placeholder backend for providers that are recognized but not wired up.
pub struct StubCardGenerator {
    provider: String,
}

impl StubCardGenerator {
    pub fn new(provider: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
        }
    }
}

#[async_trait]
impl CardGenerationService for StubCardGenerator {
    async fn generate_cards(
        &self,
        _request: &GenerateCardsRequest,
    ) -> GenerationResult<Vec<GeneratedCard>> {
        Err(GenerationError::Provider(format!(
            "The {} provider is not yet implemented. Set LLM_PROVIDER=openai.",
            self.provider
        )))
    }

    fn provider_name(&self) -> &str {
        &self.provider
    }
}

//=========================================================================================
// Provider Factory
//=========================================================================================

/// Builds the configured card-generation backend.
///
/// `openai` requires `OPENAI_API_KEY` (and honors `OPENAI_API_BASE` for
/// compatible gateways). `gemini` and `claude` are accepted names that fail
/// at call time; anything else is a configuration error.
pub fn build_card_generator(config: &Config) -> Result<Arc<dyn CardGenerationService>, ApiError> {
    match config.llm_provider.as_str() {
        "openai" => {
            let api_key = config.openai_api_key.as_ref().ok_or_else(|| {
                ApiError::Internal(
                    "OPENAI_API_KEY is required when LLM_PROVIDER=openai".to_string(),
                )
            })?;

            let mut openai_config = OpenAIConfig::new().with_api_key(api_key);
            if let Some(api_base) = &config.openai_api_base {
                openai_config = openai_config.with_api_base(api_base);
            }

            Ok(Arc::new(OpenAiCardsAdapter::new(
                Client::with_config(openai_config),
                config.cards_model.clone(),
            )))
        }
        "gemini" | "claude" => Ok(Arc::new(StubCardGenerator::new(
            config.llm_provider.clone(),
        ))),
        other => Err(ApiError::Internal(format!(
            "Unknown LLM provider: {}. Supported providers: openai, gemini, claude.",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> GenerateCardsRequest {
        GenerateCardsRequest {
            deck_title: "Test".to_string(),
            deck_description: String::new(),
            existing_cards: Vec::new(),
            count: 1,
            language: "en".to_string(),
        }
    }

    #[tokio::test]
    async fn stub_provider_fails_with_not_implemented() {
        let stub = StubCardGenerator::new("gemini");
        let result = stub.generate_cards(&request()).await;
        match result {
            Err(GenerationError::Provider(msg)) => {
                assert!(msg.contains("gemini"));
                assert!(msg.contains("not yet implemented"));
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn stub_reports_its_provider_name() {
        assert_eq!(StubCardGenerator::new("claude").provider_name(), "claude");
    }
}
