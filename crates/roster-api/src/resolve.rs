//! Handlers for resolution and details lookup.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/resolve` | Body: `{"reference":"alice@example.com","owner":0}` |
//! | `GET`  | `/details` | `?url=&owner=` plus optional `name`, `photo`, `network` defaults |
//! | `GET`  | `/details/by-addr` | `?addr=&owner=` |

use axum::{
  Json,
  extract::{Query, State},
};
use roster_core::{
  clock::SystemClock,
  contact::{ContactId, OwnerId},
  details::{ContactDetails, DetailDefaults, DetailsLookup},
  jobs::{DeferredAvatars, JobQueue},
  network::NetworkKind,
  probe::Prober,
  resolver::Resolver,
  store::ContactStore,
};
use serde::{Deserialize, Serialize};

use crate::{ApiState, error::ApiError};

fn default_true() -> bool { true }

// ─── Resolve ─────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ResolveBody {
  pub reference:     String,
  #[serde(default)]
  pub owner:         OwnerId,
  #[serde(default = "default_true")]
  pub allow_refresh: bool,
}

#[derive(Debug, Serialize)]
pub struct Resolved {
  pub contact: ContactId,
}

/// `POST /resolve`
pub async fn resolve_one<S, P>(
  State(state): State<ApiState<S, P>>,
  Json(body): Json<ResolveBody>,
) -> Result<Json<Resolved>, ApiError>
where
  S: ContactStore + JobQueue,
  P: Prober,
{
  if body.reference.trim().is_empty() {
    return Err(ApiError::BadRequest("reference must not be empty".into()));
  }

  let avatars = DeferredAvatars(&*state.store);
  let mut resolver = Resolver::new(&*state.store, &*state.prober, &avatars, SystemClock);
  let contact = resolver
    .resolve(&body.reference, body.owner, body.allow_refresh)
    .await?
    .ok_or_else(|| ApiError::NotFound(format!("could not resolve {}", body.reference)))?;

  Ok(Json(Resolved { contact }))
}

// ─── Details ─────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct DetailsParams {
  pub url:     String,
  #[serde(default)]
  pub owner:   OwnerId,
  pub name:    Option<String>,
  pub photo:   Option<String>,
  /// Network code, e.g. `dfrn`.
  pub network: Option<String>,
}

/// `GET /details?url=<url>[&owner=<uid>]`
pub async fn details_by_url<S, P>(
  State(state): State<ApiState<S, P>>,
  Query(params): Query<DetailsParams>,
) -> Result<Json<ContactDetails>, ApiError>
where
  S: ContactStore + JobQueue,
  P: Prober,
{
  let defaults = DetailDefaults {
    photo:   params.photo,
    name:    params.name,
    network: params.network.as_deref().map(NetworkKind::from_code),
  };

  let mut lookup = DetailsLookup::new(&*state.store, &*state.prober, &*state.store, SystemClock);
  let details = lookup
    .by_url(&params.url, params.owner, defaults)
    .await?
    .ok_or_else(|| ApiError::NotFound(format!("no details for {}", params.url)))?;
  Ok(Json(details))
}

#[derive(Debug, Deserialize)]
pub struct AddrParams {
  pub addr:  String,
  #[serde(default)]
  pub owner: OwnerId,
}

/// `GET /details/by-addr?addr=<user@host>[&owner=<uid>]`
pub async fn details_by_addr<S, P>(
  State(state): State<ApiState<S, P>>,
  Query(params): Query<AddrParams>,
) -> Result<Json<ContactDetails>, ApiError>
where
  S: ContactStore + JobQueue,
  P: Prober,
{
  let mut lookup = DetailsLookup::new(&*state.store, &*state.prober, &*state.store, SystemClock);
  let details = lookup
    .by_addr(&params.addr, params.owner)
    .await?
    .ok_or_else(|| ApiError::NotFound(format!("no details for {}", params.addr)))?;
  Ok(Json(details))
}
