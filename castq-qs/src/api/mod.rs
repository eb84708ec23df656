//! REST API for the queue service

pub mod handlers;

use crate::enqueue::EnqueueService;
use crate::preferences::PreferencesStore;
use axum::{
    routing::{delete, get, post, put},
    Router,
};
use sqlx::{Pool, Sqlite};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Shared application context passed to all handlers
#[derive(Clone)]
pub struct AppContext {
    pub db_pool: Pool<Sqlite>,
    pub preferences: Arc<PreferencesStore>,
    pub enqueue: Arc<EnqueueService>,
}

impl AppContext {
    pub fn new(db_pool: Pool<Sqlite>) -> Self {
        let preferences = Arc::new(PreferencesStore::new(db_pool.clone()));
        let enqueue = Arc::new(EnqueueService::new(db_pool.clone(), preferences.clone()));
        Self {
            db_pool,
            preferences,
            enqueue,
        }
    }
}

/// Create the API router
pub fn create_router(ctx: AppContext) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/enqueue_locations", get(handlers::list_enqueue_locations))
        // Per-feed preferences
        .route(
            "/feeds/:feed_id/preferences",
            get(handlers::get_feed_preferences)
                .post(handlers::create_feed_preferences)
                .delete(handlers::delete_feed_preferences),
        )
        .route(
            "/feeds/:feed_id/preferences/flush",
            post(handlers::flush_feed_preferences),
        )
        .route(
            "/feeds/:feed_id/enqueue_location",
            get(handlers::get_feed_enqueue_location).put(handlers::set_feed_enqueue_location),
        )
        // Global settings
        .route("/settings/all", get(handlers::get_all_settings))
        .route(
            "/settings/enqueue_location",
            get(handlers::get_global_enqueue_location).put(handlers::set_global_enqueue_location),
        )
        // Queue
        .route("/queue", get(handlers::get_queue).delete(handlers::clear_queue))
        .route("/queue/enqueue", post(handlers::enqueue_item))
        .route("/queue/current", put(handlers::set_currently_playing))
        .route("/queue/:item_id", delete(handlers::remove_from_queue))
        .with_state(ctx)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
