//! Integration tests for the castq Queue Service API
//!
//! Drives the router with `oneshot` against a database in a temporary folder.

use axum::body::Body;
use axum::http::StatusCode;
use castq_common::db::{create_feed_preferences_table, init_database};
use castq_common::EffectiveEnqueueLocation;
use castq_qs::api::{create_router, AppContext};
use http::{Method, Request};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

struct TestServer {
    app: axum::Router,
    ctx: AppContext,
    _dir: TempDir,
}

async fn setup_test_server() -> TestServer {
    let dir = TempDir::new().unwrap();
    let pool = init_database(&dir.path().join("castq.db"), EffectiveEnqueueLocation::Back)
        .await
        .expect("Failed to initialize database");

    let ctx = AppContext::new(pool);
    TestServer {
        app: create_router(ctx.clone()),
        ctx,
        _dir: dir,
    }
}

/// Send one request and decode the JSON body, if any
async fn make_request(
    app: &axum::Router,
    method: Method,
    path: &str,
    body: Option<Value>,
) -> (StatusCode, Option<Value>) {
    let builder = Request::builder().method(method).uri(path);

    let request = match body {
        Some(json_body) => builder
            .header("content-type", "application/json")
            .body(Body::from(json_body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();

    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json_body = if bytes.is_empty() {
        None
    } else {
        Some(serde_json::from_slice(&bytes).unwrap())
    };

    (status, json_body)
}

async fn subscribe(app: &axum::Router, feed_id: i64) {
    let (status, _) = make_request(
        app,
        Method::POST,
        &format!("/feeds/{}/preferences", feed_id),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn test_health() {
    let server = setup_test_server().await;
    let (status, body) = make_request(&server.app, Method::GET, "/health", None).await;

    assert_eq!(status, StatusCode::OK);
    let body = body.unwrap();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["module"], "castq-qs");
}

#[tokio::test]
async fn test_enqueue_locations_in_display_order() {
    let server = setup_test_server().await;
    let (status, body) = make_request(&server.app, Method::GET, "/enqueue_locations", None).await;

    assert_eq!(status, StatusCode::OK);
    let body = body.unwrap();
    let names: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|entry| entry["name"].as_str().unwrap())
        .collect();
    assert_eq!(
        names,
        vec!["GLOBAL", "BACK", "FRONT", "AFTER_CURRENTLY_PLAYING", "RANDOM"]
    );
    assert_eq!(body[2]["code"], 2);
    assert_eq!(body[0]["label"], "Use global setting");
}

#[tokio::test]
async fn test_new_feed_defers_to_global() {
    let server = setup_test_server().await;
    subscribe(&server.app, 1).await;

    let (status, body) =
        make_request(&server.app, Method::GET, "/feeds/1/enqueue_location", None).await;

    assert_eq!(status, StatusCode::OK);
    let body = body.unwrap();
    assert_eq!(body["enqueue_location"], "GLOBAL");
    assert_eq!(body["effective"], "BACK");
    assert_eq!(body["persisted"], true);
}

#[tokio::test]
async fn test_set_feed_enqueue_location() {
    let server = setup_test_server().await;
    subscribe(&server.app, 1).await;

    let (status, body) = make_request(
        &server.app,
        Method::PUT,
        "/feeds/1/enqueue_location",
        Some(json!({ "enqueue_location": "FRONT" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let body = body.unwrap();
    assert_eq!(body["enqueue_location"], "FRONT");
    assert_eq!(body["label"], "Front");
    assert_eq!(body["effective"], "FRONT");

    let code: i64 =
        sqlx::query_scalar("SELECT enqueue_location FROM feed_preferences WHERE feed_id = 1")
            .fetch_one(&server.ctx.db_pool)
            .await
            .unwrap();
    assert_eq!(code, 2);
}

#[tokio::test]
async fn test_unknown_or_null_feed_location_selects_global() {
    let server = setup_test_server().await;
    subscribe(&server.app, 1).await;

    for body in [
        json!({ "enqueue_location": "SIDEWAYS" }),
        json!({ "enqueue_location": null }),
        json!({}),
    ] {
        make_request(
            &server.app,
            Method::PUT,
            "/feeds/1/enqueue_location",
            Some(json!({ "enqueue_location": "RANDOM" })),
        )
        .await;

        let (status, response) = make_request(
            &server.app,
            Method::PUT,
            "/feeds/1/enqueue_location",
            Some(body.clone()),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "body {}", body);
        assert_eq!(response.unwrap()["enqueue_location"], "GLOBAL", "body {}", body);
    }
}

#[tokio::test]
async fn test_unknown_feed_is_not_found() {
    let server = setup_test_server().await;

    let (status, _) =
        make_request(&server.app, Method::GET, "/feeds/77/enqueue_location", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = make_request(
        &server.app,
        Method::PUT,
        "/feeds/77/enqueue_location",
        Some(json!({ "enqueue_location": "BACK" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_global_enqueue_location() {
    let server = setup_test_server().await;

    let (status, body) =
        make_request(&server.app, Method::GET, "/settings/enqueue_location", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.unwrap()["enqueue_location"], "BACK");

    let (status, body) = make_request(
        &server.app,
        Method::PUT,
        "/settings/enqueue_location",
        Some(json!({ "enqueue_location": "AFTER_CURRENTLY_PLAYING" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.unwrap()["label"], "After current episode");

    // A feed on GLOBAL follows the new default
    subscribe(&server.app, 1).await;
    let (_, body) =
        make_request(&server.app, Method::GET, "/feeds/1/enqueue_location", None).await;
    assert_eq!(body.unwrap()["effective"], "AFTER_CURRENTLY_PLAYING");
}

#[tokio::test]
async fn test_global_enqueue_location_rejects_global_and_unknown() {
    let server = setup_test_server().await;

    for value in ["GLOBAL", "SIDEWAYS"] {
        let (status, _) = make_request(
            &server.app,
            Method::PUT,
            "/settings/enqueue_location",
            Some(json!({ "enqueue_location": value })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "value {}", value);
    }

    let (_, body) =
        make_request(&server.app, Method::GET, "/settings/enqueue_location", None).await;
    assert_eq!(body.unwrap()["enqueue_location"], "BACK");
}

#[tokio::test]
async fn test_persistence_failure_reports_memory_value() {
    let server = setup_test_server().await;
    subscribe(&server.app, 1).await;

    sqlx::query("DROP TABLE feed_preferences")
        .execute(&server.ctx.db_pool)
        .await
        .unwrap();

    let (status, body) = make_request(
        &server.app,
        Method::PUT,
        "/feeds/1/enqueue_location",
        Some(json!({ "enqueue_location": "FRONT" })),
    )
    .await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    let body = body.unwrap();
    assert_eq!(body["enqueue_location"], "FRONT");
    assert_eq!(body["persisted"], false);

    // Storage back: a flush writes the held value
    create_feed_preferences_table(&server.ctx.db_pool)
        .await
        .unwrap();
    let (status, _) =
        make_request(&server.app, Method::POST, "/feeds/1/preferences/flush", None).await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) =
        make_request(&server.app, Method::GET, "/feeds/1/enqueue_location", None).await;
    assert_eq!(body.unwrap()["persisted"], true);
}

#[tokio::test]
async fn test_persistence_failure_reply_needs_no_database() {
    let server = setup_test_server().await;
    subscribe(&server.app, 1).await;

    for table in ["feed_preferences", "settings"] {
        sqlx::query(&format!("DROP TABLE {}", table))
            .execute(&server.ctx.db_pool)
            .await
            .unwrap();
    }

    let (status, body) = make_request(
        &server.app,
        Method::PUT,
        "/feeds/1/enqueue_location",
        Some(json!({ "enqueue_location": "FRONT" })),
    )
    .await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    let body = body.unwrap();
    assert_eq!(body["feed_id"], 1);
    assert_eq!(body["enqueue_location"], "FRONT");
    assert_eq!(body["persisted"], false);
    assert!(body["effective"].is_null());
}

#[tokio::test]
async fn test_feed_password_never_returned() {
    let server = setup_test_server().await;
    subscribe(&server.app, 3).await;

    sqlx::query("UPDATE feed_preferences SET username = 'listener', password = 'hunter2' WHERE feed_id = 3")
        .execute(&server.ctx.db_pool)
        .await
        .unwrap();

    // Fresh context so the credentials are read from the database
    let app = create_router(AppContext::new(server.ctx.db_pool.clone()));
    let (status, body) = make_request(&app, Method::GET, "/feeds/3/preferences", None).await;
    assert_eq!(status, StatusCode::OK);
    let body = body.unwrap();
    assert_eq!(body["username"], "listener");
    assert!(body.get("password").is_none());

    let (status, body) = make_request(&app, Method::POST, "/feeds/3/preferences", None).await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(body.unwrap().get("password").is_none());
}

#[tokio::test]
async fn test_enqueue_front_through_api() {
    let server = setup_test_server().await;
    subscribe(&server.app, 1).await;
    subscribe(&server.app, 2).await;

    for item_id in [10, 11] {
        let (status, _) = make_request(
            &server.app,
            Method::POST,
            "/queue/enqueue",
            Some(json!({ "feed_id": 2, "item_id": item_id })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    make_request(
        &server.app,
        Method::PUT,
        "/feeds/1/enqueue_location",
        Some(json!({ "enqueue_location": "FRONT" })),
    )
    .await;

    let (status, body) = make_request(
        &server.app,
        Method::POST,
        "/queue/enqueue",
        Some(json!({ "feed_id": 1, "item_id": 12 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let body = body.unwrap();
    assert_eq!(body["position"], 0);
    assert_eq!(body["strategy"], "FRONT");
    assert_eq!(body["already_queued"], false);

    let (_, body) = make_request(&server.app, Method::GET, "/queue", None).await;
    let items: Vec<i64> = body.unwrap()["queue"]
        .as_array()
        .unwrap()
        .iter()
        .map(|entry| entry["item_id"].as_i64().unwrap())
        .collect();
    assert_eq!(items, vec![12, 10, 11]);
}

#[tokio::test]
async fn test_current_item_and_removal() {
    let server = setup_test_server().await;
    subscribe(&server.app, 1).await;

    for item_id in [10, 11] {
        make_request(
            &server.app,
            Method::POST,
            "/queue/enqueue",
            Some(json!({ "feed_id": 1, "item_id": item_id })),
        )
        .await;
    }

    let (status, _) = make_request(
        &server.app,
        Method::PUT,
        "/queue/current",
        Some(json!({ "item_id": 10 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = make_request(&server.app, Method::GET, "/queue", None).await;
    assert_eq!(body.unwrap()["currently_playing"], 10);

    let (status, _) = make_request(&server.app, Method::DELETE, "/queue/10", None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = make_request(&server.app, Method::DELETE, "/queue/10", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = make_request(&server.app, Method::DELETE, "/queue", None).await;
    assert_eq!(status, StatusCode::OK);
    let (_, body) = make_request(&server.app, Method::GET, "/queue", None).await;
    assert!(body.unwrap()["queue"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_unsubscribe() {
    let server = setup_test_server().await;
    subscribe(&server.app, 5).await;

    let (status, body) =
        make_request(&server.app, Method::GET, "/feeds/5/preferences", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.unwrap()["feed_id"], 5);

    let (status, _) =
        make_request(&server.app, Method::DELETE, "/feeds/5/preferences", None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) =
        make_request(&server.app, Method::DELETE, "/feeds/5/preferences", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
