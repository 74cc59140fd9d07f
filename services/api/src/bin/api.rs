//! services/api/src/bin/api.rs

use api_lib::{
    adapters::{build_card_generator, DbAdapter},
    config::Config,
    error::ApiError,
    web::{
        auth::{login_handler, logout_handler, signup_handler},
        middleware::require_auth,
        rest::{
            create_card_handler, create_deck_handler, delete_card_handler, delete_deck_handler,
            generate_cards_handler, get_deck_handler, list_decks_handler, save_cards_handler,
            update_card_handler, update_deck_handler,
        },
        state::AppState,
    },
};
use axum::{
    http::{
        header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
        HeaderValue, Method,
    },
    middleware as axum_middleware,
    routing::{get, post, put},
    Router,
};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Arc::new(Config::from_env()?);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("Configuration loaded. Starting server...");

    // --- 2. Connect to Database & Run Migrations ---
    info!("Connecting to database...");
    let db_pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.database_url)
        .await?;
    let db_adapter = Arc::new(DbAdapter::new(db_pool.clone()));
    info!("Running database migrations...");
    db_adapter.run_migrations().await?;
    info!("Database migrations complete.");

    // --- 3. Initialize the Card-Generation Backend ---
    let card_generator = build_card_generator(&config)?;
    info!(
        "Card generation backed by the {} provider",
        card_generator.provider_name()
    );

    // --- 4. Build the Shared AppState ---
    let app_state = Arc::new(AppState {
        db: db_adapter,
        config: config.clone(),
        card_generator,
    });

    let cors = CorsLayer::new()
        .allow_origin(
            config
                .frontend_origin
                .parse::<HeaderValue>()
                .map_err(|e| ApiError::Internal(format!("Invalid FRONTEND_ORIGIN: {}", e)))?,
        )
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE, ACCEPT]);

    // --- 5. Create the Web Router ---
    // Public routes (no auth required)
    let public_routes = Router::new()
        .route("/auth/signup", post(signup_handler))
        .route("/auth/login", post(login_handler))
        .route("/auth/logout", post(logout_handler));

    // Protected routes (auth required)
    let protected_routes = Router::new()
        .route("/decks", get(list_decks_handler).post(create_deck_handler))
        .route(
            "/decks/{deck_id}",
            get(get_deck_handler)
                .put(update_deck_handler)
                .delete(delete_deck_handler),
        )
        .route("/decks/{deck_id}/cards", post(create_card_handler))
        .route("/decks/{deck_id}/cards/batch", post(save_cards_handler))
        .route("/decks/{deck_id}/generate", post(generate_cards_handler))
        .route(
            "/cards/{card_id}",
            put(update_card_handler).delete(delete_card_handler),
        )
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            require_auth,
        ));

    let app = Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(cors)
        .with_state(app_state);

    // --- 6. Start the Server ---
    info!("Starting server on {}", config.bind_address);
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
