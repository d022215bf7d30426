//! # liftlog_api
//!
//! HTTP API library for LiftLog.

pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use liftlog_core::auth::password::PasswordCodec;
use liftlog_core::auth::tokens::{PgTokenStore, TokenStore};
use liftlog_core::auth::users::{PgUserStore, UserStore};
use liftlog_core::memory::{MemoryTokenStore, MemoryUserStore, MemoryWorkoutStore};
use liftlog_core::workouts::{PgWorkoutStore, WorkoutStore};
use sqlx::PgPool;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::ApiConfig;
use crate::handlers::{health, tokens, users, workouts};

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserStore>,
    pub tokens: Arc<dyn TokenStore>,
    pub workouts: Arc<dyn WorkoutStore>,
    /// Used to check login passwords; stores hash with their own copy.
    pub codec: PasswordCodec,
    /// API configuration.
    pub config: ApiConfig,
}

impl AppState {
    /// State backed by PostgreSQL.
    pub fn postgres(pool: PgPool, config: ApiConfig) -> Self {
        let codec = PasswordCodec::new(config.bcrypt_cost);
        let tokens: Arc<dyn TokenStore> = Arc::new(PgTokenStore::new(pool.clone()));
        Self {
            users: Arc::new(PgUserStore::new(pool.clone(), codec, tokens.clone())),
            workouts: Arc::new(PgWorkoutStore::new(pool, config.entry_policy)),
            tokens,
            codec,
            config,
        }
    }

    /// State backed by in-process maps. Nothing survives a restart.
    pub fn in_memory(config: ApiConfig) -> Self {
        let codec = PasswordCodec::new(config.bcrypt_cost);
        let tokens: Arc<dyn TokenStore> = Arc::new(MemoryTokenStore::new());
        Self {
            users: Arc::new(MemoryUserStore::new(codec, tokens.clone())),
            workouts: Arc::new(MemoryWorkoutStore::new(config.entry_policy)),
            tokens,
            codec,
            config,
        }
    }
}

/// Run embedded database migrations.
///
/// Delegates to `liftlog_core::migrate::migrate()` which owns the migration files.
pub async fn migrate(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    liftlog_core::migrate::migrate(pool).await
}

/// Builds the Axum router with all routes and shared state.
///
/// Every route runs behind [`middleware::auth::authenticate`]; handlers decide
/// whether an anonymous caller is acceptable.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health::health))
        .route("/users", post(users::register_handler))
        .route(
            "/users/me",
            get(users::me_handler).patch(users::update_me_handler),
        )
        .route(
            "/tokens/authentication",
            post(tokens::login_handler).delete(tokens::logout_handler),
        )
        .route("/workouts", post(workouts::create_workout_handler))
        .route(
            "/workouts/{id}",
            get(workouts::get_workout_handler)
                .put(workouts::update_workout_handler)
                .delete(workouts::delete_workout_handler),
        )
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::auth::authenticate,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
