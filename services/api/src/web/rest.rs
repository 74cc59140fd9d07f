//! services/api/src/web/rest.rs
//!
//! Contains the Axum handlers for the REST API endpoints and the master
//! definition for the OpenAPI specification.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    Extension,
};
use chrono::{DateTime, Utc};
use flashdecks_core::domain::{Card, Deck, ExistingCard, GenerateCardsRequest, GeneratedCard};
use flashdecks_core::ports::{GenerationError, PortError};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::error;
use utoipa::{IntoParams, OpenApi, ToSchema};

use crate::web::state::AppState;

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        list_decks_handler,
        create_deck_handler,
        get_deck_handler,
        update_deck_handler,
        delete_deck_handler,
        create_card_handler,
        save_cards_handler,
        update_card_handler,
        delete_card_handler,
        generate_cards_handler,
    ),
    components(
        schemas(
            DeckResponse,
            DeckDetailResponse,
            CardResponse,
            DeckPayload,
            CardPayload,
            SaveCardsRequest,
            GenerateCardsPayload,
            GeneratedCardResponse,
            GenerateCardsResponse,
        )
    ),
    tags(
        (name = "Flashdecks API", description = "API endpoints for decks, cards, and AI card generation.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// Validation Rules
//=========================================================================================

const MAX_TITLE_CHARS: usize = 255;
const MAX_DESCRIPTION_CHARS: usize = 2000;
const MAX_CARD_SIDE_CHARS: usize = 5000;
const MIN_GENERATE_COUNT: u32 = 1;
const MAX_GENERATE_COUNT: u32 = 50;
const MAX_BATCH_CARDS: usize = 50;

const SUPPORTED_LANGUAGES: &[&str] =
    &["en", "fr", "es", "de", "it", "pt", "ja", "zh", "ko", "ru"];

fn validate_deck_payload(payload: &DeckPayload) -> Result<(), String> {
    let title = payload.title.trim();
    if title.is_empty() {
        return Err("Title is required".to_string());
    }
    if title.chars().count() > MAX_TITLE_CHARS {
        return Err(format!("Title must be at most {} characters", MAX_TITLE_CHARS));
    }
    if let Some(description) = &payload.description {
        if description.chars().count() > MAX_DESCRIPTION_CHARS {
            return Err(format!(
                "Description must be at most {} characters",
                MAX_DESCRIPTION_CHARS
            ));
        }
    }
    Ok(())
}

fn validate_card_side(field: &str, value: &str) -> Result<(), String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(format!("{} text is required", field));
    }
    if trimmed.chars().count() > MAX_CARD_SIDE_CHARS {
        return Err(format!(
            "{} must be at most {} characters",
            field, MAX_CARD_SIDE_CHARS
        ));
    }
    Ok(())
}

fn validate_generate_payload(payload: &GenerateCardsPayload) -> Result<(), String> {
    if !(MIN_GENERATE_COUNT..=MAX_GENERATE_COUNT).contains(&payload.count) {
        return Err(format!(
            "Count must be between {} and {}",
            MIN_GENERATE_COUNT, MAX_GENERATE_COUNT
        ));
    }
    if !SUPPORTED_LANGUAGES.contains(&payload.language.as_str()) {
        return Err(format!("Unsupported language: {}", payload.language));
    }
    Ok(())
}

//=========================================================================================
// API Response and Payload Structs
//=========================================================================================

#[derive(Deserialize, ToSchema)]
pub struct DeckPayload {
    pub title: String,
    pub description: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct CardPayload {
    pub front: String,
    pub back: String,
}

/// Persists cards the user accepted from a generation preview.
#[derive(Deserialize, ToSchema)]
pub struct SaveCardsRequest {
    pub cards: Vec<CardPayload>,
}

#[derive(Deserialize, ToSchema)]
pub struct GenerateCardsPayload {
    pub count: u32,
    pub language: String,
}

#[derive(Deserialize, IntoParams)]
pub struct ListDecksParams {
    /// Substring to match against deck titles and descriptions.
    pub search: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct DeckResponse {
    pub id: i32,
    pub title: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Serialize, ToSchema)]
pub struct DeckDetailResponse {
    pub id: i32,
    pub title: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub cards: Vec<CardResponse>,
}

#[derive(Serialize, ToSchema)]
pub struct CardResponse {
    pub id: i32,
    pub deck_id: i32,
    pub public_id: String,
    pub front: String,
    pub back: String,
}

#[derive(Serialize, ToSchema)]
pub struct GeneratedCardResponse {
    pub front: String,
    pub back: String,
}

/// Generated cards are returned for preview only; nothing is persisted until
/// the client calls the batch save endpoint.
#[derive(Serialize, ToSchema)]
pub struct GenerateCardsResponse {
    pub cards: Vec<GeneratedCardResponse>,
    pub message: String,
}

fn deck_response(deck: Deck) -> DeckResponse {
    DeckResponse {
        id: deck.id,
        title: deck.title,
        description: deck.description,
        created_at: deck.created_at,
        updated_at: deck.updated_at,
    }
}

fn card_response(card: Card) -> CardResponse {
    CardResponse {
        id: card.id,
        deck_id: card.deck_id,
        public_id: card.public_id,
        front: card.front,
        back: card.back,
    }
}

//=========================================================================================
// Error Mapping
//=========================================================================================

fn port_error_response(e: PortError) -> (StatusCode, String) {
    match e {
        PortError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
        PortError::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized".to_string()),
        PortError::UniqueViolation(msg) => (StatusCode::CONFLICT, msg),
        other => {
            error!("Port operation failed: {:?}", other);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            )
        }
    }
}

fn generation_error_response(e: GenerationError) -> (StatusCode, String) {
    let status = match e {
        GenerationError::QuotaExceeded => StatusCode::TOO_MANY_REQUESTS,
        _ => StatusCode::BAD_GATEWAY,
    };
    (status, e.to_string())
}

//=========================================================================================
// Deck Handlers
//=========================================================================================

/// List the caller's decks, most recently updated first.
#[utoipa::path(
    get,
    path = "/decks",
    params(ListDecksParams),
    responses(
        (status = 200, description = "The caller's decks", body = [DeckResponse]),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn list_decks_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<uuid::Uuid>,
    Query(params): Query<ListDecksParams>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let decks = match params.search.as_deref().map(str::trim) {
        Some(term) if !term.is_empty() => state.db.search_decks(user_id, term).await,
        _ => state.db.list_decks(user_id).await,
    }
    .map_err(port_error_response)?;

    Ok(Json(
        decks.into_iter().map(deck_response).collect::<Vec<_>>(),
    ))
}

/// Create a new deck.
#[utoipa::path(
    post,
    path = "/decks",
    request_body = DeckPayload,
    responses(
        (status = 201, description = "Deck created", body = DeckResponse),
        (status = 400, description = "Invalid payload"),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn create_deck_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<uuid::Uuid>,
    Json(payload): Json<DeckPayload>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    validate_deck_payload(&payload).map_err(|msg| (StatusCode::BAD_REQUEST, msg))?;

    let deck = state
        .db
        .create_deck(
            user_id,
            payload.title.trim(),
            payload.description.as_deref().unwrap_or("").trim(),
        )
        .await
        .map_err(port_error_response)?;

    Ok((StatusCode::CREATED, Json(deck_response(deck))))
}

/// Fetch one deck together with all of its cards.
#[utoipa::path(
    get,
    path = "/decks/{deck_id}",
    params(("deck_id" = i32, Path, description = "The deck ID")),
    responses(
        (status = 200, description = "The deck and its cards", body = DeckDetailResponse),
        (status = 404, description = "Deck not found or not owned by the caller")
    )
)]
pub async fn get_deck_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<uuid::Uuid>,
    Path(deck_id): Path<i32>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let deck = state
        .db
        .get_deck(deck_id, user_id)
        .await
        .map_err(port_error_response)?;
    let cards = state
        .db
        .list_cards(deck_id)
        .await
        .map_err(port_error_response)?;

    Ok(Json(DeckDetailResponse {
        id: deck.id,
        title: deck.title,
        description: deck.description,
        created_at: deck.created_at,
        updated_at: deck.updated_at,
        cards: cards.into_iter().map(card_response).collect(),
    }))
}

/// Update a deck's title and description.
#[utoipa::path(
    put,
    path = "/decks/{deck_id}",
    params(("deck_id" = i32, Path, description = "The deck ID")),
    request_body = DeckPayload,
    responses(
        (status = 200, description = "Deck updated", body = DeckResponse),
        (status = 400, description = "Invalid payload"),
        (status = 404, description = "Deck not found or not owned by the caller")
    )
)]
pub async fn update_deck_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<uuid::Uuid>,
    Path(deck_id): Path<i32>,
    Json(payload): Json<DeckPayload>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    validate_deck_payload(&payload).map_err(|msg| (StatusCode::BAD_REQUEST, msg))?;

    // Ownership check before the update touches anything.
    state
        .db
        .get_deck(deck_id, user_id)
        .await
        .map_err(port_error_response)?;

    let deck = state
        .db
        .update_deck(
            deck_id,
            payload.title.trim(),
            payload.description.as_deref().unwrap_or("").trim(),
        )
        .await
        .map_err(port_error_response)?;

    Ok(Json(deck_response(deck)))
}

/// Delete a deck and, via cascade, all of its cards.
#[utoipa::path(
    delete,
    path = "/decks/{deck_id}",
    params(("deck_id" = i32, Path, description = "The deck ID")),
    responses(
        (status = 204, description = "Deck deleted"),
        (status = 404, description = "Deck not found or not owned by the caller")
    )
)]
pub async fn delete_deck_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<uuid::Uuid>,
    Path(deck_id): Path<i32>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    state
        .db
        .get_deck(deck_id, user_id)
        .await
        .map_err(port_error_response)?;
    state
        .db
        .delete_deck(deck_id)
        .await
        .map_err(port_error_response)?;

    Ok(StatusCode::NO_CONTENT)
}

//=========================================================================================
// Card Handlers
//=========================================================================================

/// Add a single card to a deck.
#[utoipa::path(
    post,
    path = "/decks/{deck_id}/cards",
    params(("deck_id" = i32, Path, description = "The deck ID")),
    request_body = CardPayload,
    responses(
        (status = 201, description = "Card created", body = CardResponse),
        (status = 400, description = "Invalid payload"),
        (status = 404, description = "Deck not found or not owned by the caller")
    )
)]
pub async fn create_card_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<uuid::Uuid>,
    Path(deck_id): Path<i32>,
    Json(payload): Json<CardPayload>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    validate_card_side("Front", &payload.front).map_err(|msg| (StatusCode::BAD_REQUEST, msg))?;
    validate_card_side("Back", &payload.back).map_err(|msg| (StatusCode::BAD_REQUEST, msg))?;

    state
        .db
        .get_deck(deck_id, user_id)
        .await
        .map_err(port_error_response)?;

    let card = state
        .db
        .create_card(deck_id, payload.front.trim(), payload.back.trim())
        .await
        .map_err(port_error_response)?;

    Ok((StatusCode::CREATED, Json(card_response(card))))
}

/// Persist a batch of cards, typically ones accepted from a generation preview.
#[utoipa::path(
    post,
    path = "/decks/{deck_id}/cards/batch",
    params(("deck_id" = i32, Path, description = "The deck ID")),
    request_body = SaveCardsRequest,
    responses(
        (status = 201, description = "Cards created", body = [CardResponse]),
        (status = 400, description = "Invalid payload"),
        (status = 404, description = "Deck not found or not owned by the caller")
    )
)]
pub async fn save_cards_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<uuid::Uuid>,
    Path(deck_id): Path<i32>,
    Json(payload): Json<SaveCardsRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    if payload.cards.is_empty() {
        return Err((StatusCode::BAD_REQUEST, "No cards to save".to_string()));
    }
    if payload.cards.len() > MAX_BATCH_CARDS {
        return Err((
            StatusCode::BAD_REQUEST,
            format!("At most {} cards can be saved at once", MAX_BATCH_CARDS),
        ));
    }
    for card in &payload.cards {
        validate_card_side("Front", &card.front).map_err(|msg| (StatusCode::BAD_REQUEST, msg))?;
        validate_card_side("Back", &card.back).map_err(|msg| (StatusCode::BAD_REQUEST, msg))?;
    }

    state
        .db
        .get_deck(deck_id, user_id)
        .await
        .map_err(port_error_response)?;

    let cards: Vec<GeneratedCard> = payload
        .cards
        .iter()
        .map(|c| GeneratedCard {
            front: c.front.trim().to_string(),
            back: c.back.trim().to_string(),
        })
        .collect();

    let created = state
        .db
        .create_cards(deck_id, &cards)
        .await
        .map_err(port_error_response)?;

    Ok((
        StatusCode::CREATED,
        Json(created.into_iter().map(card_response).collect::<Vec<_>>()),
    ))
}

/// Update a card's front and back text.
#[utoipa::path(
    put,
    path = "/cards/{card_id}",
    params(("card_id" = i32, Path, description = "The card's internal ID")),
    request_body = CardPayload,
    responses(
        (status = 200, description = "Card updated", body = CardResponse),
        (status = 400, description = "Invalid payload"),
        (status = 404, description = "Card not found or not owned by the caller")
    )
)]
pub async fn update_card_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<uuid::Uuid>,
    Path(card_id): Path<i32>,
    Json(payload): Json<CardPayload>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    validate_card_side("Front", &payload.front).map_err(|msg| (StatusCode::BAD_REQUEST, msg))?;
    validate_card_side("Back", &payload.back).map_err(|msg| (StatusCode::BAD_REQUEST, msg))?;

    // Cards are only reachable through a deck the caller owns.
    let card = state
        .db
        .get_card(card_id)
        .await
        .map_err(port_error_response)?;
    state
        .db
        .get_deck(card.deck_id, user_id)
        .await
        .map_err(port_error_response)?;

    let updated = state
        .db
        .update_card(card_id, payload.front.trim(), payload.back.trim())
        .await
        .map_err(port_error_response)?;

    Ok(Json(card_response(updated)))
}

/// Delete a card.
#[utoipa::path(
    delete,
    path = "/cards/{card_id}",
    params(("card_id" = i32, Path, description = "The card's internal ID")),
    responses(
        (status = 204, description = "Card deleted"),
        (status = 404, description = "Card not found or not owned by the caller")
    )
)]
pub async fn delete_card_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<uuid::Uuid>,
    Path(card_id): Path<i32>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let card = state
        .db
        .get_card(card_id)
        .await
        .map_err(port_error_response)?;
    state
        .db
        .get_deck(card.deck_id, user_id)
        .await
        .map_err(port_error_response)?;
    state
        .db
        .delete_card(card_id)
        .await
        .map_err(port_error_response)?;

    Ok(StatusCode::NO_CONTENT)
}

//=========================================================================================
// AI Generation Handler
//=========================================================================================

/// Generate flashcards for a deck using the configured AI provider.
///
/// The generated cards are returned for preview and editing; they are not
/// saved until the client submits them to the batch save endpoint.
#[utoipa::path(
    post,
    path = "/decks/{deck_id}/generate",
    params(("deck_id" = i32, Path, description = "The deck ID")),
    request_body = GenerateCardsPayload,
    responses(
        (status = 200, description = "Cards generated", body = GenerateCardsResponse),
        (status = 400, description = "Invalid payload"),
        (status = 404, description = "Deck not found or not owned by the caller"),
        (status = 429, description = "Provider quota exceeded"),
        (status = 502, description = "Provider failure or unusable response")
    )
)]
pub async fn generate_cards_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<uuid::Uuid>,
    Path(deck_id): Path<i32>,
    Json(payload): Json<GenerateCardsPayload>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    // 1. Validate input
    validate_generate_payload(&payload).map_err(|msg| (StatusCode::BAD_REQUEST, msg))?;

    // 2. Verify deck ownership
    let deck = state
        .db
        .get_deck(deck_id, user_id)
        .await
        .map_err(port_error_response)?;

    // 3. Gather existing cards as context for duplicate avoidance
    let existing = state
        .db
        .list_cards(deck_id)
        .await
        .map_err(port_error_response)?;

    let request = GenerateCardsRequest {
        deck_title: deck.title,
        deck_description: deck.description,
        existing_cards: existing
            .into_iter()
            .map(|card| ExistingCard {
                front: card.front,
                back: card.back,
            })
            .collect(),
        count: payload.count as usize,
        language: payload.language,
    };

    // 4. Invoke the generation port; failures come back as classified values
    let cards = state
        .card_generator
        .generate_cards(&request)
        .await
        .map_err(|e| {
            error!(
                provider = state.card_generator.provider_name(),
                "Card generation failed: {}", e
            );
            generation_error_response(e)
        })?;

    let message = format!("Generated {} cards", cards.len());
    Ok(Json(GenerateCardsResponse {
        cards: cards
            .into_iter()
            .map(|c| GeneratedCardResponse {
                front: c.front,
                back: c.back,
            })
            .collect(),
        message,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn deck_payload(title: &str, description: Option<&str>) -> DeckPayload {
        DeckPayload {
            title: title.to_string(),
            description: description.map(str::to_string),
        }
    }

    #[test]
    fn deck_title_must_be_present_and_bounded() {
        assert!(validate_deck_payload(&deck_payload("History", None)).is_ok());
        assert!(validate_deck_payload(&deck_payload("", None)).is_err());
        assert!(validate_deck_payload(&deck_payload("   ", None)).is_err());
        assert!(validate_deck_payload(&deck_payload(&"x".repeat(255), None)).is_ok());
        assert!(validate_deck_payload(&deck_payload(&"x".repeat(256), None)).is_err());
    }

    #[test]
    fn deck_description_is_optional_but_bounded() {
        assert!(validate_deck_payload(&deck_payload("T", Some(""))).is_ok());
        assert!(validate_deck_payload(&deck_payload("T", Some(&"d".repeat(2000)))).is_ok());
        assert!(validate_deck_payload(&deck_payload("T", Some(&"d".repeat(2001)))).is_err());
    }

    #[test]
    fn card_sides_must_be_present_and_bounded() {
        assert!(validate_card_side("Front", "Dog").is_ok());
        assert!(validate_card_side("Front", "  ").is_err());
        assert!(validate_card_side("Back", &"x".repeat(5000)).is_ok());
        assert!(validate_card_side("Back", &"x".repeat(5001)).is_err());
    }

    #[test]
    fn card_side_limit_counts_characters_not_bytes() {
        // 5000 multibyte characters are within the limit even though the
        // byte length is far larger.
        let side = "é".repeat(5000);
        assert!(validate_card_side("Front", &side).is_ok());
    }

    #[test]
    fn generate_count_must_be_between_one_and_fifty() {
        let payload = |count, language: &str| GenerateCardsPayload {
            count,
            language: language.to_string(),
        };
        assert!(validate_generate_payload(&payload(1, "en")).is_ok());
        assert!(validate_generate_payload(&payload(50, "en")).is_ok());
        assert!(validate_generate_payload(&payload(0, "en")).is_err());
        assert!(validate_generate_payload(&payload(51, "en")).is_err());
    }

    #[test]
    fn generate_language_must_be_supported() {
        let payload = |language: &str| GenerateCardsPayload {
            count: 5,
            language: language.to_string(),
        };
        for language in SUPPORTED_LANGUAGES {
            assert!(validate_generate_payload(&payload(language)).is_ok());
        }
        assert!(validate_generate_payload(&payload("tlh")).is_err());
        assert!(validate_generate_payload(&payload("")).is_err());
    }

    #[test]
    fn quota_errors_map_to_429_and_the_rest_to_502() {
        let (status, _) = generation_error_response(GenerationError::QuotaExceeded);
        assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);

        for err in [
            GenerationError::InvalidCredentials("OpenAI".to_string()),
            GenerationError::MalformedResponse("bad json".to_string()),
            GenerationError::NoValidCards,
            GenerationError::Provider("boom".to_string()),
        ] {
            let (status, message) = generation_error_response(err);
            assert_eq!(status, StatusCode::BAD_GATEWAY);
            assert!(!message.is_empty());
        }
    }

    #[test]
    fn parse_and_no_valid_cards_failures_carry_distinct_messages() {
        let (_, parse_msg) = generation_error_response(GenerationError::MalformedResponse(
            "expected value".to_string(),
        ));
        let (_, empty_msg) = generation_error_response(GenerationError::NoValidCards);
        assert_ne!(parse_msg, empty_msg);
        assert!(parse_msg.contains("parse"));
        assert!(empty_msg.contains("No valid cards"));
    }
}
