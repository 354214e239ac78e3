pub mod auth;
pub mod categories;
pub mod config;
pub mod constants;
pub mod database;
pub mod error;
pub mod models;
pub mod query;
pub mod seed;
pub mod service;
pub mod store;
pub mod transactions;
pub mod utils;

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use time::Duration;
use tower_http::trace::TraceLayer;
use tower_sessions::{Expiry, MemoryStore, SessionManagerLayer, cookie::Key};

// Re-export types at crate root for convenient importing
pub use crate::database::Db;
pub use crate::error::Error;
pub use crate::service::TransactionService;
pub use crate::store::{LibsqlStore, TransactionStore};

use crate::constants::{SESSION_EXPIRY_DAYS, SESSION_NAME};

/// Application state shared across all request handlers
#[derive(Clone)]
pub struct AppState {
    /// Database holding users, categories and transactions
    pub db: Db,
    /// Transaction service backed by the same database
    pub service: TransactionService,
}

impl AppState {
    pub fn new(db: Db) -> Self {
        let store: Arc<dyn TransactionStore> = Arc::new(LibsqlStore::new(db.clone()));
        Self {
            db,
            service: TransactionService::new(store),
        }
    }
}

/// Builds the API router with its session layer.
pub fn build_router(
    app_state: AppState,
    session_secret: &str,
    secure_cookies: bool,
) -> anyhow::Result<Router> {
    let session_key = Key::try_from(session_secret.as_bytes())
        .map_err(|e| anyhow::anyhow!("Invalid session secret: {}", e))?;

    // Sessions live in memory and are lost on restart.
    let session_layer = SessionManagerLayer::new(MemoryStore::default())
        .with_secure(secure_cookies)
        .with_name(SESSION_NAME)
        .with_expiry(Expiry::OnInactivity(Duration::days(SESSION_EXPIRY_DAYS)))
        .with_signed(session_key);

    let router = Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/logout", post(auth::logout))
        .route("/auth/me", get(auth::me).delete(auth::delete_account))
        .route(
            "/transactions",
            get(transactions::get_transactions).post(transactions::create_transaction),
        )
        .route(
            "/transactions/{id}",
            get(transactions::get_transaction)
                .put(transactions::update_transaction)
                .delete(transactions::delete_transaction),
        )
        .route(
            "/categories",
            get(categories::get_categories).post(categories::create_category),
        )
        .route("/categories/{id}", get(categories::get_category))
        .layer(session_layer)
        .layer(TraceLayer::new_for_http())
        .with_state(app_state);

    Ok(router)
}
