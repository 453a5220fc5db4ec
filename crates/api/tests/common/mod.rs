//! Shared fixtures for API integration tests.
//!
//! Builds the real router over the in-memory stores and a manual clock,
//! so requests go through the same middleware stack production uses.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Method, Request, Response};
use axum::Router;
use campusdesk_api::config::ServerConfig;
use campusdesk_api::router::build_app_router;
use campusdesk_api::state::AppState;
use campusdesk_core::actor::Actor;
use campusdesk_core::clock::ManualClock;
use campusdesk_core::sla::{Category, CategoryStatus};
use campusdesk_core::status::{ActorRole, Priority};
use campusdesk_core::types::DbId;
use campusdesk_engine::{
    EngineConfig, InMemoryCategoryDirectory, InMemoryTicketStore, TicketService,
};
use campusdesk_events::EventBus;
use chrono::{TimeZone, Utc};
use http_body_util::BodyExt;
use tower::ServiceExt;

pub const NETWORK: DbId = 1;
pub const RETIRED: DbId = 3;

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        shutdown_timeout_secs: 30,
        database_url: "postgres://unused".to_string(),
        engine: EngineConfig {
            repository_timeout: Duration::from_secs(5),
            ..EngineConfig::default()
        },
    }
}

pub fn student() -> Actor {
    Actor::user(100, "Mika Laine", ActorRole::Student)
}

pub fn other_student() -> Actor {
    Actor::user(101, "Jo Varga", ActorRole::Student)
}

pub fn staff() -> Actor {
    Actor::user(200, "Robin Ortiz", ActorRole::Staff)
}

fn categories() -> InMemoryCategoryDirectory {
    let category = |id, code: &str, status| Category {
        id,
        code: code.into(),
        name: format!("{code} desk"),
        department_id: Some(10),
        sla_resolve_hours: 24,
        default_priority: Priority::Medium,
        status,
    };
    InMemoryCategoryDirectory::new([
        category(NETWORK, "NET", CategoryStatus::Active),
        category(RETIRED, "OLD", CategoryStatus::Inactive),
    ])
}

pub struct TestApp {
    pub router: Router,
    pub clock: Arc<ManualClock>,
    pub bus: Arc<EventBus>,
}

impl TestApp {
    pub fn advance_hours(&self, hours: i64) {
        self.clock.advance(chrono::Duration::hours(hours));
    }
}

/// Build the full application router over in-memory stores.
pub fn build_test_app() -> TestApp {
    let config = test_config();
    let clock = Arc::new(ManualClock::new(
        Utc.with_ymd_and_hms(2026, 9, 1, 8, 0, 0).unwrap(),
    ));
    let bus = Arc::new(EventBus::default());
    let service = Arc::new(TicketService::new(
        Arc::new(InMemoryTicketStore::default()),
        Arc::new(categories()),
        clock.clone(),
        bus.clone(),
        &config.engine,
    ));

    let state = AppState {
        service,
        config: Arc::new(config.clone()),
        pool: None,
    };

    TestApp {
        router: build_app_router(state, &config),
        clock,
        bus,
    }
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

fn request(method: Method, uri: &str, actor: Option<&Actor>, body: Option<serde_json::Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(actor) = actor {
        builder = builder
            .header("x-actor-id", actor.user_id.unwrap_or_default().to_string())
            .header("x-actor-role", actor.role.as_str())
            .header("x-actor-name", actor.name.as_str());
    }
    match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

/// Send a GET request without actor headers.
pub async fn get(app: Router, uri: &str) -> Response<Body> {
    app.oneshot(request(Method::GET, uri, None, None))
        .await
        .unwrap()
}

pub async fn get_as(app: Router, uri: &str, actor: &Actor) -> Response<Body> {
    app.oneshot(request(Method::GET, uri, Some(actor), None))
        .await
        .unwrap()
}

/// Send a POST request with a JSON body and no actor headers.
pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    app.oneshot(request(Method::POST, uri, None, Some(body)))
        .await
        .unwrap()
}

pub async fn post_json_as(
    app: Router,
    uri: &str,
    actor: &Actor,
    body: serde_json::Value,
) -> Response<Body> {
    app.oneshot(request(Method::POST, uri, Some(actor), Some(body)))
        .await
        .unwrap()
}

/// Send a POST request with no body at all.
pub async fn post_empty_as(app: Router, uri: &str, actor: &Actor) -> Response<Body> {
    app.oneshot(request(Method::POST, uri, Some(actor), None))
        .await
        .unwrap()
}

/// Collect a response body and parse it as JSON.
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
