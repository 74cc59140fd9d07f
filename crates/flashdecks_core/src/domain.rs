//! crates/flashdecks_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! These structs are independent of any database or serialization format.

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// A registered user account.
#[derive(Debug, Clone)]
pub struct User {
    pub user_id: Uuid,
    pub email: String,
}

// Only used internally for login/signup - contains sensitive data
#[derive(Debug, Clone)]
pub struct UserCredentials {
    pub user_id: Uuid,
    pub email: String,
    pub hashed_password: String,
}

// Represents a browser login session (auth cookie)
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub id: String,
    pub user_id: Uuid,
    pub expires_at: DateTime<Utc>,
}

/// A deck of flashcards, owned by exactly one user.
#[derive(Debug, Clone)]
pub struct Deck {
    pub id: i32,
    pub user_id: Uuid,
    pub title: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A single flashcard.
///
/// `id` is the internal sequential key assigned by storage. `public_id` is
/// the externally visible identifier: fixed-length, unique across all cards,
/// and immutable once assigned.
#[derive(Debug, Clone)]
pub struct Card {
    pub id: i32,
    pub deck_id: i32,
    pub public_id: String,
    pub front: String,
    pub back: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A front/back pair produced by the AI pipeline.
///
/// Carries no identity of its own: it only exists in memory until the caller
/// discards it or persists it as a [`Card`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedCard {
    pub front: String,
    pub back: String,
}

/// An existing card handed to the generator as context.
#[derive(Debug, Clone)]
pub struct ExistingCard {
    pub front: String,
    pub back: String,
}

/// The ephemeral input bundle driving one AI card-generation call.
/// Consumed once per call and not retained.
#[derive(Debug, Clone)]
pub struct GenerateCardsRequest {
    pub deck_title: String,
    pub deck_description: String,
    pub existing_cards: Vec<ExistingCard>,
    pub count: usize,
    pub language: String,
}
