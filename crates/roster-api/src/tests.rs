//! Router tests against an in-memory store.

use std::sync::Arc;

use axum::{
  body::Body,
  http::{Request, StatusCode, header},
};
use chrono::Utc;
use roster_core::{
  contact::{NewContact, OwnerId},
  network::NetworkKind,
  probe::{ProbeResult, StaticProber},
  store::ContactStore as _,
};
use roster_store_sqlite::SqliteStore;
use serde_json::Value;
use tower::ServiceExt as _;

use crate::{ApiState, api_router};

const ALICE_URL: &str = "https://example.com/profile/alice";

fn alice() -> ProbeResult {
  ProbeResult {
    url: ALICE_URL.into(),
    addr: "alice@example.com".into(),
    name: "Alice".into(),
    network: NetworkKind::Dfrn,
    ..ProbeResult::default()
  }
}

async fn state() -> ApiState<SqliteStore, StaticProber> {
  let store = SqliteStore::open_in_memory().await.unwrap();
  let prober = StaticProber::new().with("alice@example.com", alice());
  ApiState::new(Arc::new(store), Arc::new(prober), "https://roster.test/")
}

async fn call(
  state: ApiState<SqliteStore, StaticProber>,
  method: &str,
  uri: &str,
  body: Option<&str>,
) -> (StatusCode, Value) {
  let mut builder = Request::builder().method(method).uri(uri);
  if body.is_some() {
    builder = builder.header(header::CONTENT_TYPE, "application/json");
  }
  let req = builder
    .body(body.map_or_else(Body::empty, |b| Body::from(b.to_owned())))
    .unwrap();

  let resp = api_router(state).oneshot(req).await.unwrap();
  let status = resp.status();
  let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
  let json = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap() };
  (status, json)
}

#[tokio::test]
async fn resolve_then_fetch_contact() {
  let state = state().await;

  let (status, body) = call(
    state.clone(),
    "POST",
    "/resolve",
    Some(r#"{"reference":"alice@example.com"}"#),
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  let id = body["contact"].as_i64().unwrap();

  let (status, contact) = call(state.clone(), "GET", &format!("/contacts/{id}"), None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(contact["nurl"], "http://example.com/profile/alice");
  assert_eq!(contact["network"], "dfrn");
  assert_eq!(state.prober.calls(), 1);
}

#[tokio::test]
async fn unresolvable_reference_is_404() {
  let state = state().await;
  let (status, body) = call(
    state.clone(),
    "POST",
    "/resolve",
    Some(r#"{"reference":"nobody@nowhere.test"}"#),
  )
  .await;
  assert_eq!(status, StatusCode::NOT_FOUND);
  assert!(body["error"].as_str().unwrap().contains("nobody@nowhere.test"));

  let (status, _) = call(state, "POST", "/resolve", Some(r#"{"reference":"  "}"#)).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn missing_contact_is_404() {
  let (status, _) = call(state().await, "GET", "/contacts/42", None).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn contact_lifecycle_over_http() {
  let state = state().await;
  let owner = OwnerId(2);
  let id = state
    .store
    .insert_contact(&NewContact::from_probe(owner, &alice(), Utc::now()))
    .await
    .unwrap();

  let (status, body) = call(state.clone(), "POST", &format!("/contacts/{id}/unreachable"), None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["outcome"], "timer_started");

  let (_, body) = call(state.clone(), "POST", &format!("/contacts/{id}/reachable"), None).await;
  assert_eq!(body["cleared"], true);

  let (_, menu) = call(state.clone(), "GET", &format!("/contacts/{id}/menu?viewer=2"), None).await;
  assert_eq!(menu[1]["link"], format!("https://roster.test/redir/{id}?url=profile"));

  let (status, body) = call(state.clone(), "DELETE", &format!("/contacts/{id}"), None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["outcome"], "deleted");

  let (status, _) = call(state, "GET", &format!("/contacts/{id}"), None).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn terminate_requires_a_self_record() {
  let state = state().await;
  let owner = OwnerId(2);
  let id = state
    .store
    .insert_contact(&NewContact::from_probe(owner, &alice(), Utc::now()))
    .await
    .unwrap();

  let (status, _) = call(state.clone(), "POST", &format!("/contacts/{id}/terminate"), None).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);

  let me = ProbeResult { url: "https://roster.test/profile/me".into(), ..alice() };
  let mut input = NewContact::from_probe(owner, &me, Utc::now());
  input.is_self = true;
  state.store.insert_contact(&input).await.unwrap();

  let (status, body) = call(state.clone(), "POST", &format!("/contacts/{id}/terminate"), None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["queued"], true);
  assert_eq!(state.store.pending_jobs().await.unwrap().len(), 1);
}

#[tokio::test]
async fn details_use_defaults_when_nothing_is_stored() {
  let (status, body) = call(
    state().await,
    "GET",
    "/details?url=https://other.test/u/1&owner=2&name=Someone&network=stat",
    None,
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["name"], "Someone");
  assert_eq!(body["network"], "stat");
  assert_eq!(body["source"]["kind"], "defaults");
}

#[tokio::test]
async fn details_by_address_fall_back_to_the_shared_cache() {
  let state = state().await;
  state
    .store
    .insert_contact(&NewContact::from_probe(OwnerId::PUBLIC, &alice(), Utc::now()))
    .await
    .unwrap();

  let (status, body) =
    call(state, "GET", "/details/by-addr?addr=alice@example.com&owner=2", None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["name"], "Alice");
  assert_eq!(body["source"]["kind"], "public");
}

#[tokio::test]
async fn account_removal() {
  let state = state().await;
  let (status, _) = call(state.clone(), "DELETE", "/accounts/0", None).await;
  assert_eq!(status, StatusCode::NOT_FOUND);

  let account = state.store.create_account("carol", "https://roster.test/profile/carol").await.unwrap();
  let (status, body) = call(state.clone(), "DELETE", &format!("/accounts/{}", account.uid), None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["removed"], true);
  assert!(state.store.is_nickname_reserved("carol").await.unwrap());
}

#[tokio::test]
async fn ungrouped_total_and_page() {
  let state = state().await;
  state
    .store
    .insert_contact(&NewContact::from_probe(OwnerId(2), &alice(), Utc::now()))
    .await
    .unwrap();

  let (_, body) = call(state.clone(), "GET", "/accounts/2/ungrouped", None).await;
  assert_eq!(body["total"], 1);
  assert_eq!(body["contacts"].as_array().unwrap().len(), 0);

  let (_, body) = call(state, "GET", "/accounts/2/ungrouped?count=10", None).await;
  assert_eq!(body["contacts"][0]["name"], "Alice");
}

#[tokio::test]
async fn random_profile_is_404_on_an_empty_directory() {
  let (status, _) = call(state().await, "GET", "/directory/random", None).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
}
