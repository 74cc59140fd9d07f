//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, which is the concrete implementation
//! of the `DatabaseService` port from the `core` crate. It handles all interactions
//! with the PostgreSQL database using `sqlx`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use flashdecks_core::domain::{Card, Deck, GeneratedCard, User, UserCredentials};
use flashdecks_core::id_alloc;
use flashdecks_core::ports::{DatabaseService, PortError, PortResult};
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the `DatabaseService` port.
#[derive(Clone)]
pub struct DbAdapter {
    pool: PgPool,
}

impl DbAdapter {
    /// Creates a new `DbAdapter`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await
    }
}

/// Maps a `sqlx` error to a `PortError`, telling a uniqueness violation apart
/// from every other failure. Postgres reports unique-constraint violations as
/// SQLSTATE 23505.
fn map_db_err(e: sqlx::Error) -> PortError {
    match &e {
        sqlx::Error::Database(db) => {
            let is_unique = db.code().as_deref() == Some("23505")
                || db.message().to_lowercase().contains("duplicate key value");
            if is_unique {
                PortError::UniqueViolation(db.message().to_string())
            } else {
                PortError::Unexpected(e.to_string())
            }
        }
        _ => PortError::Unexpected(e.to_string()),
    }
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

#[derive(FromRow)]
struct UserRecord {
    user_id: Uuid,
    email: String,
}
impl UserRecord {
    fn into_domain(self) -> User {
        User {
            user_id: self.user_id,
            email: self.email,
        }
    }
}

#[derive(FromRow)]
struct UserCredentialsRecord {
    user_id: Uuid,
    email: String,
    hashed_password: String,
}
impl UserCredentialsRecord {
    fn into_domain(self) -> UserCredentials {
        UserCredentials {
            user_id: self.user_id,
            email: self.email,
            hashed_password: self.hashed_password,
        }
    }
}

#[derive(FromRow)]
struct DeckRecord {
    id: i32,
    user_id: Uuid,
    title: String,
    description: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}
impl DeckRecord {
    fn into_domain(self) -> Deck {
        Deck {
            id: self.id,
            user_id: self.user_id,
            title: self.title,
            description: self.description,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(FromRow)]
struct CardRecord {
    id: i32,
    deck_id: i32,
    public_id: String,
    front: String,
    back: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}
impl CardRecord {
    fn into_domain(self) -> Card {
        Card {
            id: self.id,
            deck_id: self.deck_id,
            public_id: self.public_id,
            front: self.front,
            back: self.back,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

const CARD_COLUMNS: &str = "id, deck_id, public_id, front, back, created_at, updated_at";
const DECK_COLUMNS: &str = "id, user_id, title, description, created_at, updated_at";

//=========================================================================================
// `DatabaseService` Trait Implementation
//=========================================================================================

#[async_trait]
impl DatabaseService for DbAdapter {
    async fn create_user_with_email(
        &self,
        email: &str,
        hashed_password: &str,
    ) -> PortResult<User> {
        let record = sqlx::query_as::<_, UserRecord>(
            "INSERT INTO users (user_id, email, hashed_password) VALUES ($1, $2, $3) \
             RETURNING user_id, email",
        )
        .bind(Uuid::new_v4())
        .bind(email)
        .bind(hashed_password)
        .fetch_one(&self.pool)
        .await
        .map_err(map_db_err)?;

        Ok(record.into_domain())
    }

    async fn get_user_by_email(&self, email: &str) -> PortResult<UserCredentials> {
        let record = sqlx::query_as::<_, UserCredentialsRecord>(
            "SELECT user_id, email, hashed_password FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_err)?
        .ok_or_else(|| PortError::NotFound(format!("User {} not found", email)))?;

        Ok(record.into_domain())
    }

    async fn create_auth_session(
        &self,
        session_id: &str,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> PortResult<()> {
        sqlx::query("INSERT INTO auth_sessions (id, user_id, expires_at) VALUES ($1, $2, $3)")
            .bind(session_id)
            .bind(user_id)
            .bind(expires_at)
            .execute(&self.pool)
            .await
            .map_err(map_db_err)?;
        Ok(())
    }

    async fn validate_auth_session(&self, session_id: &str) -> PortResult<Uuid> {
        let user_id: Option<Uuid> = sqlx::query_scalar(
            "SELECT user_id FROM auth_sessions WHERE id = $1 AND expires_at > NOW()",
        )
        .bind(session_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_err)?;

        user_id.ok_or(PortError::Unauthorized)
    }

    async fn delete_auth_session(&self, session_id: &str) -> PortResult<()> {
        sqlx::query("DELETE FROM auth_sessions WHERE id = $1")
            .bind(session_id)
            .execute(&self.pool)
            .await
            .map_err(map_db_err)?;
        Ok(())
    }

    async fn list_decks(&self, user_id: Uuid) -> PortResult<Vec<Deck>> {
        let records = sqlx::query_as::<_, DeckRecord>(&format!(
            "SELECT {DECK_COLUMNS} FROM decks WHERE user_id = $1 ORDER BY updated_at DESC"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_err)?;

        Ok(records.into_iter().map(DeckRecord::into_domain).collect())
    }

    async fn get_deck(&self, deck_id: i32, user_id: Uuid) -> PortResult<Deck> {
        let record = sqlx::query_as::<_, DeckRecord>(&format!(
            "SELECT {DECK_COLUMNS} FROM decks WHERE id = $1 AND user_id = $2"
        ))
        .bind(deck_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_err)?
        .ok_or_else(|| PortError::NotFound(format!("Deck {} not found", deck_id)))?;

        Ok(record.into_domain())
    }

    async fn create_deck(
        &self,
        user_id: Uuid,
        title: &str,
        description: &str,
    ) -> PortResult<Deck> {
        let record = sqlx::query_as::<_, DeckRecord>(&format!(
            "INSERT INTO decks (user_id, title, description) VALUES ($1, $2, $3) \
             RETURNING {DECK_COLUMNS}"
        ))
        .bind(user_id)
        .bind(title)
        .bind(description)
        .fetch_one(&self.pool)
        .await
        .map_err(map_db_err)?;

        Ok(record.into_domain())
    }

    async fn update_deck(
        &self,
        deck_id: i32,
        title: &str,
        description: &str,
    ) -> PortResult<Deck> {
        let record = sqlx::query_as::<_, DeckRecord>(&format!(
            "UPDATE decks SET title = $1, description = $2, updated_at = NOW() \
             WHERE id = $3 RETURNING {DECK_COLUMNS}"
        ))
        .bind(title)
        .bind(description)
        .bind(deck_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_err)?
        .ok_or_else(|| PortError::NotFound(format!("Deck {} not found", deck_id)))?;

        Ok(record.into_domain())
    }

    async fn delete_deck(&self, deck_id: i32) -> PortResult<()> {
        sqlx::query("DELETE FROM decks WHERE id = $1")
            .bind(deck_id)
            .execute(&self.pool)
            .await
            .map_err(map_db_err)?;
        Ok(())
    }

    async fn search_decks(&self, user_id: Uuid, term: &str) -> PortResult<Vec<Deck>> {
        let pattern = format!("%{}%", term);
        let records = sqlx::query_as::<_, DeckRecord>(&format!(
            "SELECT {DECK_COLUMNS} FROM decks \
             WHERE user_id = $1 AND (title ILIKE $2 OR description ILIKE $2) \
             ORDER BY updated_at DESC"
        ))
        .bind(user_id)
        .bind(pattern)
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_err)?;

        Ok(records.into_iter().map(DeckRecord::into_domain).collect())
    }

    async fn list_cards(&self, deck_id: i32) -> PortResult<Vec<Card>> {
        let records = sqlx::query_as::<_, CardRecord>(&format!(
            "SELECT {CARD_COLUMNS} FROM cards WHERE deck_id = $1 ORDER BY id ASC"
        ))
        .bind(deck_id)
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_err)?;

        Ok(records.into_iter().map(CardRecord::into_domain).collect())
    }

    async fn get_card(&self, card_id: i32) -> PortResult<Card> {
        let record = sqlx::query_as::<_, CardRecord>(&format!(
            "SELECT {CARD_COLUMNS} FROM cards WHERE id = $1"
        ))
        .bind(card_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_err)?
        .ok_or_else(|| PortError::NotFound(format!("Card {} not found", card_id)))?;

        Ok(record.into_domain())
    }

    async fn create_card(&self, deck_id: i32, front: &str, back: &str) -> PortResult<Card> {
        // The public_id column is UNIQUE; the core retry loop draws a fresh
        // candidate whenever the insert reports a collision.
        id_alloc::insert_with_unique_id(|public_id| async move {
            let record = sqlx::query_as::<_, CardRecord>(&format!(
                "INSERT INTO cards (deck_id, public_id, front, back) VALUES ($1, $2, $3, $4) \
                 RETURNING {CARD_COLUMNS}"
            ))
            .bind(deck_id)
            .bind(public_id)
            .bind(front)
            .bind(back)
            .fetch_one(&self.pool)
            .await
            .map_err(map_db_err)?;

            Ok(record.into_domain())
        })
        .await
    }

    async fn create_cards(
        &self,
        deck_id: i32,
        cards: &[GeneratedCard],
    ) -> PortResult<Vec<Card>> {
        if cards.is_empty() {
            return Ok(Vec::new());
        }

        id_alloc::insert_batch_with_unique_ids(cards.len(), |public_ids| async move {
            let mut builder = QueryBuilder::<Postgres>::new(
                "INSERT INTO cards (deck_id, public_id, front, back) ",
            );
            builder.push_values(
                cards.iter().zip(public_ids),
                |mut row, (card, public_id)| {
                    row.push_bind(deck_id)
                        .push_bind(public_id)
                        .push_bind(&card.front)
                        .push_bind(&card.back);
                },
            );
            builder.push(format!(" RETURNING {CARD_COLUMNS}"));

            let records: Vec<CardRecord> = builder
                .build_query_as()
                .fetch_all(&self.pool)
                .await
                .map_err(map_db_err)?;

            Ok(records.into_iter().map(CardRecord::into_domain).collect())
        })
        .await
    }

    async fn update_card(&self, card_id: i32, front: &str, back: &str) -> PortResult<Card> {
        let record = sqlx::query_as::<_, CardRecord>(&format!(
            "UPDATE cards SET front = $1, back = $2, updated_at = NOW() \
             WHERE id = $3 RETURNING {CARD_COLUMNS}"
        ))
        .bind(front)
        .bind(back)
        .bind(card_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_err)?
        .ok_or_else(|| PortError::NotFound(format!("Card {} not found", card_id)))?;

        Ok(record.into_domain())
    }

    async fn delete_card(&self, card_id: i32) -> PortResult<()> {
        sqlx::query("DELETE FROM cards WHERE id = $1")
            .bind(card_id)
            .execute(&self.pool)
            .await
            .map_err(map_db_err)?;
        Ok(())
    }
}
