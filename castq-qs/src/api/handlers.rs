//! HTTP request handlers

use crate::api::AppContext;
use crate::db::{self, QueueEntry};
use crate::enqueue::EnqueueOutcome;
use crate::error::Error;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use castq_common::db::Setting;
use castq_common::{resolve_effective, EffectiveEnqueueLocation, EnqueueLocation, FeedPreferences};
use serde::{Deserialize, Serialize};
use tracing::{error, warn};

type HandlerError = (StatusCode, Json<StatusResponse>);

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    status: String,
    module: String,
    version: String,
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    status: String,
}

#[derive(Debug, Serialize)]
pub struct EnqueueLocationInfo {
    name: &'static str,
    label: &'static str,
    code: i64,
}

#[derive(Debug, Serialize)]
pub struct FeedEnqueueLocationResponse {
    feed_id: i64,
    enqueue_location: EnqueueLocation,
    label: &'static str,
    /// `None` only when the global default could not be read
    effective: Option<EffectiveEnqueueLocation>,
    /// False when the value is held in memory only
    persisted: bool,
}

/// `null` or a missing field selects GLOBAL
#[derive(Debug, Deserialize)]
pub struct FeedEnqueueLocationRequest {
    #[serde(default)]
    enqueue_location: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct GlobalEnqueueLocationResponse {
    enqueue_location: EffectiveEnqueueLocation,
    label: &'static str,
}

#[derive(Debug, Deserialize)]
pub struct GlobalEnqueueLocationRequest {
    enqueue_location: String,
}

#[derive(Debug, Serialize)]
pub struct QueueResponse {
    queue: Vec<QueueEntry>,
    currently_playing: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct EnqueueRequest {
    feed_id: i64,
    item_id: i64,
}

#[derive(Debug, Deserialize)]
pub struct CurrentItemRequest {
    #[serde(default)]
    item_id: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct SettingsResponse {
    settings: Vec<Setting>,
}

fn error_response(e: Error) -> HandlerError {
    let status = match &e {
        Error::NotFound(_) => StatusCode::NOT_FOUND,
        Error::BadRequest(_) => StatusCode::BAD_REQUEST,
        Error::Persistence { .. } => StatusCode::SERVICE_UNAVAILABLE,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };

    if status.is_server_error() {
        error!("Request failed: {}", e);
    } else {
        warn!("Request rejected: {}", e);
    }

    (
        status,
        Json(StatusResponse {
            status: format!("error: {}", e),
        }),
    )
}

fn ok_status() -> Json<StatusResponse> {
    Json(StatusResponse {
        status: "ok".to_string(),
    })
}

// ============================================================================
// Health & Reference Data
// ============================================================================

/// GET /health
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        module: "castq-qs".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// GET /enqueue_locations
///
/// Every strategy a feed can select, in display order.
pub async fn list_enqueue_locations() -> Json<Vec<EnqueueLocationInfo>> {
    Json(
        EnqueueLocation::entries()
            .map(|(name, label, code)| EnqueueLocationInfo { name, label, code })
            .collect(),
    )
}

// ============================================================================
// Feed Preferences
// ============================================================================

/// GET /feeds/:feed_id/preferences
pub async fn get_feed_preferences(
    State(ctx): State<AppContext>,
    Path(feed_id): Path<i64>,
) -> Result<Json<FeedPreferences>, HandlerError> {
    ctx.preferences
        .load(feed_id)
        .await
        .map(Json)
        .map_err(error_response)
}

/// POST /feeds/:feed_id/preferences
///
/// Creates default preferences when a feed is subscribed.
pub async fn create_feed_preferences(
    State(ctx): State<AppContext>,
    Path(feed_id): Path<i64>,
) -> Result<(StatusCode, Json<FeedPreferences>), HandlerError> {
    ctx.preferences
        .create_for_feed(feed_id)
        .await
        .map(|prefs| (StatusCode::CREATED, Json(prefs)))
        .map_err(error_response)
}

/// DELETE /feeds/:feed_id/preferences
pub async fn delete_feed_preferences(
    State(ctx): State<AppContext>,
    Path(feed_id): Path<i64>,
) -> Result<Json<StatusResponse>, HandlerError> {
    match ctx.preferences.remove(feed_id).await {
        Ok(true) => Ok(ok_status()),
        Ok(false) => Err(error_response(Error::NotFound(format!(
            "No preferences for feed {}",
            feed_id
        )))),
        Err(e) => Err(error_response(e)),
    }
}

/// POST /feeds/:feed_id/preferences/flush
///
/// Retries writing preferences left in memory by a failed save.
pub async fn flush_feed_preferences(
    State(ctx): State<AppContext>,
    Path(feed_id): Path<i64>,
) -> Result<Json<StatusResponse>, HandlerError> {
    ctx.preferences
        .flush(feed_id)
        .await
        .map(|_| ok_status())
        .map_err(error_response)
}

/// GET /feeds/:feed_id/enqueue_location
pub async fn get_feed_enqueue_location(
    State(ctx): State<AppContext>,
    Path(feed_id): Path<i64>,
) -> Result<Json<FeedEnqueueLocationResponse>, HandlerError> {
    let prefs = ctx.preferences.load(feed_id).await.map_err(error_response)?;
    let global_default = ctx
        .preferences
        .global_enqueue_location()
        .await
        .map_err(error_response)?;

    Ok(Json(feed_location_response(&prefs, Some(global_default))))
}

/// PUT /feeds/:feed_id/enqueue_location
///
/// Unknown names select GLOBAL. When the new value cannot be saved the response
/// is 503 and reports the value now held in memory.
pub async fn set_feed_enqueue_location(
    State(ctx): State<AppContext>,
    Path(feed_id): Path<i64>,
    Json(req): Json<FeedEnqueueLocationRequest>,
) -> Result<(StatusCode, Json<FeedEnqueueLocationResponse>), HandlerError> {
    let location = EnqueueLocation::from_name(req.enqueue_location.as_deref());

    match ctx
        .preferences
        .set_enqueue_location(feed_id, Some(location))
        .await
    {
        Ok(prefs) => {
            let global_default = ctx
                .preferences
                .global_enqueue_location()
                .await
                .map_err(error_response)?;
            Ok((
                StatusCode::OK,
                Json(feed_location_response(&prefs, Some(global_default))),
            ))
        }
        Err(e @ Error::Persistence { .. }) => {
            error!("{}", e);
            let Some(prefs) = ctx.preferences.cached(feed_id).await else {
                return Err(error_response(e));
            };
            let global_default = match ctx.preferences.global_enqueue_location().await {
                Ok(global_default) => Some(global_default),
                Err(global_err) => {
                    warn!("Global enqueue location unavailable: {}", global_err);
                    None
                }
            };
            Ok((
                StatusCode::SERVICE_UNAVAILABLE,
                Json(feed_location_response(&prefs, global_default)),
            ))
        }
        Err(e) => Err(error_response(e)),
    }
}

fn feed_location_response(
    prefs: &FeedPreferences,
    global_default: Option<EffectiveEnqueueLocation>,
) -> FeedEnqueueLocationResponse {
    let location = prefs.enqueue_location();

    FeedEnqueueLocationResponse {
        feed_id: prefs.feed_id(),
        enqueue_location: location,
        label: location.display_label(),
        effective: global_default.map(|global_default| resolve_effective(prefs, global_default)),
        persisted: !prefs.is_dirty(),
    }
}

// ============================================================================
// Global Settings
// ============================================================================

/// GET /settings/all
pub async fn get_all_settings(
    State(ctx): State<AppContext>,
) -> Result<Json<SettingsResponse>, HandlerError> {
    db::get_all_settings(&ctx.db_pool)
        .await
        .map(|settings| Json(SettingsResponse { settings }))
        .map_err(error_response)
}

/// GET /settings/enqueue_location
pub async fn get_global_enqueue_location(
    State(ctx): State<AppContext>,
) -> Result<Json<GlobalEnqueueLocationResponse>, HandlerError> {
    let location = ctx
        .preferences
        .global_enqueue_location()
        .await
        .map_err(error_response)?;

    Ok(Json(GlobalEnqueueLocationResponse {
        enqueue_location: location,
        label: location.display_label(),
    }))
}

/// PUT /settings/enqueue_location
///
/// The global default must be a concrete strategy; GLOBAL is rejected.
pub async fn set_global_enqueue_location(
    State(ctx): State<AppContext>,
    Json(req): Json<GlobalEnqueueLocationRequest>,
) -> Result<Json<GlobalEnqueueLocationResponse>, HandlerError> {
    let requested = EnqueueLocation::from_name(Some(&req.enqueue_location));
    let location = EffectiveEnqueueLocation::try_from(requested).map_err(|_| {
        error_response(Error::BadRequest(format!(
            "'{}' is not a valid global enqueue location",
            req.enqueue_location
        )))
    })?;

    ctx.preferences
        .set_global_enqueue_location(location)
        .await
        .map_err(error_response)?;

    Ok(Json(GlobalEnqueueLocationResponse {
        enqueue_location: location,
        label: location.display_label(),
    }))
}

// ============================================================================
// Queue
// ============================================================================

/// GET /queue
pub async fn get_queue(
    State(ctx): State<AppContext>,
) -> Result<Json<QueueResponse>, HandlerError> {
    let queue = db::get_queue(&ctx.db_pool).await.map_err(error_response)?;
    let currently_playing = db::get_current_item(&ctx.db_pool)
        .await
        .map_err(error_response)?;

    Ok(Json(QueueResponse {
        queue,
        currently_playing,
    }))
}

/// POST /queue/enqueue
pub async fn enqueue_item(
    State(ctx): State<AppContext>,
    Json(req): Json<EnqueueRequest>,
) -> Result<Json<EnqueueOutcome>, HandlerError> {
    ctx.enqueue
        .enqueue(req.feed_id, req.item_id)
        .await
        .map(Json)
        .map_err(error_response)
}

/// PUT /queue/current
pub async fn set_currently_playing(
    State(ctx): State<AppContext>,
    Json(req): Json<CurrentItemRequest>,
) -> Result<Json<StatusResponse>, HandlerError> {
    ctx.enqueue
        .set_currently_playing(req.item_id)
        .await
        .map(|_| ok_status())
        .map_err(error_response)
}

/// DELETE /queue/:item_id
pub async fn remove_from_queue(
    State(ctx): State<AppContext>,
    Path(item_id): Path<i64>,
) -> Result<Json<StatusResponse>, HandlerError> {
    ctx.enqueue
        .dequeue(item_id)
        .await
        .map(|_| ok_status())
        .map_err(error_response)
}

/// DELETE /queue
pub async fn clear_queue(
    State(ctx): State<AppContext>,
) -> Result<Json<StatusResponse>, HandlerError> {
    ctx.enqueue
        .clear()
        .await
        .map(|_| ok_status())
        .map_err(error_response)
}
