//! crates/flashdecks_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of specific external implementations like databases or LLM
//! providers.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::{Card, Deck, GenerateCardsRequest, GeneratedCard, User, UserCredentials};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., database, network).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    /// The storage layer rejected an insert because a value declared unique
    /// already exists.
    #[error("Unique constraint violated: {0}")]
    UniqueViolation(String),
    /// Every allocation attempt produced a colliding public ID. With a 62^10
    /// ID space this indicates a systemic fault, not bad luck, so it is
    /// propagated as an unrecoverable error.
    #[error("Could not allocate a unique public ID after {attempts} attempts")]
    IdSpaceExhausted { attempts: u32 },
    #[error("Unauthorized")]
    Unauthorized,
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Card-Generation Errors
//=========================================================================================

/// A classified failure of one AI card-generation call.
///
/// Parsing and validation failures are returned as values of this type; they
/// never panic past the pipeline boundary. The caller decides whether and how
/// to offer the user a retry.
#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error("Invalid API key. Please check your {0} API configuration.")]
    InvalidCredentials(String),
    #[error("API quota exceeded. Please try again later.")]
    QuotaExceeded,
    /// The model's response could not be parsed into a card list.
    #[error("Failed to parse AI response: {0}")]
    MalformedResponse(String),
    /// The response parsed, but every candidate card failed validation.
    #[error("No valid cards were generated. Please try again.")]
    NoValidCards,
    /// Any other provider-side failure, carrying the underlying message.
    #[error("Generation error: {0}")]
    Provider(String),
}

/// A convenience type alias for `Result<T, GenerationError>`.
pub type GenerationResult<T> = Result<T, GenerationError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

#[async_trait]
pub trait DatabaseService: Send + Sync {
    // --- Users and Auth ---
    async fn create_user_with_email(
        &self,
        email: &str,
        hashed_password: &str,
    ) -> PortResult<User>;

    async fn get_user_by_email(&self, email: &str) -> PortResult<UserCredentials>;

    async fn create_auth_session(
        &self,
        session_id: &str,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> PortResult<()>;

    async fn validate_auth_session(&self, session_id: &str) -> PortResult<Uuid>;

    async fn delete_auth_session(&self, session_id: &str) -> PortResult<()>;

    // --- Deck Management ---
    /// Lists the user's decks, most recently updated first.
    async fn list_decks(&self, user_id: Uuid) -> PortResult<Vec<Deck>>;

    /// Fetches a deck only if it is owned by `user_id`.
    async fn get_deck(&self, deck_id: i32, user_id: Uuid) -> PortResult<Deck>;

    async fn create_deck(
        &self,
        user_id: Uuid,
        title: &str,
        description: &str,
    ) -> PortResult<Deck>;

    async fn update_deck(
        &self,
        deck_id: i32,
        title: &str,
        description: &str,
    ) -> PortResult<Deck>;

    async fn delete_deck(&self, deck_id: i32) -> PortResult<()>;

    /// Case-insensitive substring search over the user's deck titles and
    /// descriptions.
    async fn search_decks(&self, user_id: Uuid, term: &str) -> PortResult<Vec<Deck>>;

    // --- Card Management ---
    /// Lists a deck's cards in insertion order.
    async fn list_cards(&self, deck_id: i32) -> PortResult<Vec<Card>>;

    async fn get_card(&self, card_id: i32) -> PortResult<Card>;

    /// Inserts a card under a freshly allocated public ID, retrying on
    /// collision. Fails with [`PortError::IdSpaceExhausted`] if the attempt
    /// bound is hit.
    async fn create_card(&self, deck_id: i32, front: &str, back: &str) -> PortResult<Card>;

    /// Inserts a batch of cards in one statement. Candidate public IDs are
    /// mutually distinct within the batch; the whole batch is regenerated and
    /// retried on a storage-level collision.
    async fn create_cards(
        &self,
        deck_id: i32,
        cards: &[GeneratedCard],
    ) -> PortResult<Vec<Card>>;

    async fn update_card(&self, card_id: i32, front: &str, back: &str) -> PortResult<Card>;

    async fn delete_card(&self, card_id: i32) -> PortResult<()>;
}

#[async_trait]
pub trait CardGenerationService: Send + Sync {
    /// Generates flashcards from the deck context in `request`.
    ///
    /// Returns at most `request.count` cards; fewer is possible and it is the
    /// caller's responsibility to judge sufficiency. All failures come back
    /// as a classified [`GenerationError`] value.
    async fn generate_cards(
        &self,
        request: &GenerateCardsRequest,
    ) -> GenerationResult<Vec<GeneratedCard>>;

    /// The human-readable name of the backing provider.
    fn provider_name(&self) -> &str;
}
