#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context as _, Result};
use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use chrono::Utc;
use serde_json::Value;
use tokio::time::Instant;
use tower::ServiceExt;
use tracing::Span;

use restaurant_api::auth::{Claims, ROLE_ADMIN, ROLE_USER};
use restaurant_api::database::schema;
use restaurant_api::handlers::{self, ApiDeps};
use restaurant_api::middleware::Metrics;
use restaurant_api::server::{self, ShutdownEvents};
use restaurant_api::testing::{self, MemoryStore};
use restaurant_api::web::AppService;

pub const BUILD: &str = "test";

/// The API wired to a seeded in-memory store, with tokens for both seed users.
pub struct TestApp {
    pub service: AppService,
    pub store: Arc<MemoryStore>,
    pub metrics: Arc<Metrics>,
    pub events: ShutdownEvents,
    pub admin_token: String,
    pub user_token: String,
}

pub async fn spawn_app() -> Result<TestApp> {
    let store = Arc::new(MemoryStore::new());
    schema::seed(store.as_ref(), Utc::now(), Instant::now() + Duration::from_secs(30))
        .await
        .context("seeding memory store")?;

    let authenticator = Arc::new(testing::authenticator());
    let metrics = Arc::new(Metrics::default());
    let (shutdown, events) = server::channel();

    let app = handlers::api(ApiDeps {
        build: BUILD.to_string(),
        shutdown,
        log: Span::none(),
        db: Arc::clone(&store),
        authenticator: Arc::clone(&authenticator),
        metrics: Arc::clone(&metrics),
        request_timeout: Duration::from_secs(5),
        token_ttl: chrono::Duration::hours(1),
    });

    let admin = Claims::new(
        schema::ADMIN_ID.to_string(),
        vec![ROLE_ADMIN.to_string(), ROLE_USER.to_string()],
        Utc::now(),
        chrono::Duration::hours(1),
    );
    let user = Claims::new(
        schema::USER_ID.to_string(),
        vec![ROLE_USER.to_string()],
        Utc::now(),
        chrono::Duration::hours(1),
    );

    Ok(TestApp {
        service: app.into_service(),
        store,
        metrics,
        events,
        admin_token: authenticator.generate_token(&admin)?,
        user_token: authenticator.generate_token(&user)?,
    })
}

impl TestApp {
    /// Send a request and return the status with the JSON body, `Value::Null`
    /// when the body is empty.
    pub async fn send(&self, method: Method, path: &str, token: Option<&str>, body: Option<Value>) -> Result<(StatusCode, Value)> {
        let mut builder = Request::builder().method(method).uri(path);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let body = match body {
            Some(json) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(serde_json::to_vec(&json)?)
            }
            None => Body::empty(),
        };

        self.send_request(builder.body(body)?).await
    }

    pub async fn send_request(&self, req: Request<Body>) -> Result<(StatusCode, Value)> {
        let response = self.service.clone().oneshot(req).await?;
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), 1 << 20).await?;

        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).with_context(|| format!("non-JSON body: {}", String::from_utf8_lossy(&bytes)))?
        };
        Ok((status, json))
    }

    pub async fn get(&self, path: &str, token: Option<&str>) -> Result<(StatusCode, Value)> {
        self.send(Method::GET, path, token, None).await
    }

    pub async fn post(&self, path: &str, token: Option<&str>, body: Value) -> Result<(StatusCode, Value)> {
        self.send(Method::POST, path, token, Some(body)).await
    }
}

/// Field names of a validation error body, sorted since order is not part of
/// the contract.
pub fn field_names(body: &Value) -> Vec<String> {
    let mut names: Vec<String> = body["fields"]
        .as_array()
        .map(|fields| {
            fields
                .iter()
                .filter_map(|f| f["field"].as_str().map(String::from))
                .collect()
        })
        .unwrap_or_default();
    names.sort();
    names
}
