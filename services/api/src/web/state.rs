//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use std::sync::Arc;

use flashdecks_core::ports::{CardGenerationService, DatabaseService};

use crate::config::Config;

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<dyn DatabaseService>,
    pub config: Arc<Config>,
    pub card_generator: Arc<dyn CardGenerationService>,
}
