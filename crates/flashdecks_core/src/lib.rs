pub mod domain;
pub mod id_alloc;
pub mod parse;
pub mod ports;
pub mod prompt;
pub mod public_id;

pub use domain::{
    AuthSession, Card, Deck, ExistingCard, GenerateCardsRequest, GeneratedCard, User,
    UserCredentials,
};
pub use ports::{
    CardGenerationService, DatabaseService, GenerationError, GenerationResult, PortError,
    PortResult,
};
