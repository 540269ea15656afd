//! HTTP server for Roster.
//!
//! Mounts the JSON API from [`roster_api`] under `/api`, behind HTTP Basic
//! auth, with request tracing.

pub mod auth;
pub mod error;
pub mod probe;

pub use error::Error;

use std::{path::PathBuf, sync::Arc};

use axum::{Router, middleware, routing::get};
use roster_api::{ApiState, api_router};
use roster_core::{jobs::JobQueue, probe::Prober, store::ContactStore};
use serde::Deserialize;
use tower_http::trace::TraceLayer;

use auth::{AuthConfig, require_auth};

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml`.
#[derive(Deserialize, Clone)]
pub struct ServerConfig {
  pub host:               String,
  pub port:               u16,
  /// Public base URL, used for links in contact menus.
  pub base_url:           String,
  pub store_path:         PathBuf,
  /// Discovery service endpoint; without one nothing new is discovered.
  #[serde(default)]
  pub probe_url:          Option<String>,
  pub auth_username:      String,
  pub auth_password_hash: String,
}

impl ServerConfig {
  pub fn auth(&self) -> AuthConfig {
    AuthConfig {
      username:      self.auth_username.clone(),
      password_hash: self.auth_password_hash.clone(),
    }
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the full application router.
pub fn app<S, P>(store: Arc<S>, prober: Arc<P>, config: &ServerConfig) -> Router
where
  S: ContactStore + JobQueue + 'static,
  P: Prober + 'static,
{
  let api = api_router(ApiState::new(store, prober, &config.base_url))
    .layer(middleware::from_fn_with_state(Arc::new(config.auth()), require_auth));

  Router::new()
    .route("/health", get(|| async { "ok" }))
    .nest("/api", api)
    .layer(TraceLayer::new_for_http())
}

// ─── Integration tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use super::*;

  use argon2::{Argon2, PasswordHasher, password_hash::SaltString};
  use axum::{
    body::Body,
    http::{Request, StatusCode, header},
  };
  use base64::Engine as _;
  use base64::engine::general_purpose::STANDARD as B64;
  use rand_core::OsRng;
  use roster_core::probe::StaticProber;
  use roster_store_sqlite::SqliteStore;
  use tower::ServiceExt as _;

  async fn make_app(password: &str) -> Router {
    let store = SqliteStore::open_in_memory().await.unwrap();
    let salt  = SaltString::generate(&mut OsRng);
    let hash  = Argon2::default()
      .hash_password(password.as_bytes(), &salt)
      .unwrap()
      .to_string();

    let config = ServerConfig {
      host:               "127.0.0.1".to_string(),
      port:               8080,
      base_url:           "http://localhost:8080".to_string(),
      store_path:         PathBuf::from(":memory:"),
      probe_url:          None,
      auth_username:      "user".to_string(),
      auth_password_hash: hash,
    };
    app(Arc::new(store), Arc::new(StaticProber::new()), &config)
  }

  fn auth_header(user: &str, pass: &str) -> String {
    format!("Basic {}", B64.encode(format!("{user}:{pass}")))
  }

  async fn get_status(app: Router, uri: &str, auth: Option<&str>) -> axum::response::Response {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(auth) = auth {
      builder = builder.header(header::AUTHORIZATION, auth);
    }
    app.oneshot(builder.body(Body::empty()).unwrap()).await.unwrap()
  }

  #[tokio::test]
  async fn health_skips_auth() {
    let resp = get_status(make_app("secret").await, "/health", None).await;
    assert_eq!(resp.status(), StatusCode::OK);
  }

  #[tokio::test]
  async fn api_requires_credentials() {
    let resp = get_status(make_app("secret").await, "/api/contacts/1", None).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let challenge = resp.headers().get(header::WWW_AUTHENTICATE).unwrap();
    assert_eq!(challenge, "Basic realm=\"roster\"");
  }

  #[tokio::test]
  async fn api_rejects_wrong_password() {
    let auth = auth_header("user", "wrong");
    let resp = get_status(make_app("secret").await, "/api/contacts/1", Some(&auth)).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
  }

  #[tokio::test]
  async fn authenticated_requests_reach_the_api() {
    let auth = auth_header("user", "secret");
    let resp = get_status(make_app("secret").await, "/api/contacts/1", Some(&auth)).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
  }
}
