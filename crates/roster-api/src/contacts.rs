//! Handlers for `/contacts/{id}` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/contacts/{id}` | 404 if not found |
//! | `DELETE` | `/contacts/{id}` | Deletes or archives, per the owner's setting |
//! | `GET`    | `/contacts/{id}/menu` | `?viewer=<uid>` |
//! | `POST`   | `/contacts/{id}/unreachable` | Advances the decay timer |
//! | `POST`   | `/contacts/{id}/reachable` | Clears the decay timer |
//! | `POST`   | `/contacts/{id}/terminate` | Queues a protocol unfollow |

use axum::{
  Json,
  extract::{Path, Query, State},
};
use chrono::Utc;
use roster_core::{
  contact::{Contact, ContactId, OwnerId},
  jobs::JobQueue,
  liveness::{DecayOutcome, mark_reachable, mark_unreachable},
  presentation::{MenuEntry, photo_menu},
  probe::Prober,
  removal::{ContactRemoval, remove_contact, terminate_friendship},
  store::ContactStore,
};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::{ApiState, error::ApiError};

async fn load<S: ContactStore>(store: &S, id: i64) -> Result<Contact, ApiError> {
  store
    .get_contact(ContactId(id))
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("contact {id} not found")))
}

// ─── Get one ─────────────────────────────────────────────────────────────────

/// `GET /contacts/{id}`
pub async fn get_one<S, P>(
  State(state): State<ApiState<S, P>>,
  Path(id): Path<i64>,
) -> Result<Json<Contact>, ApiError>
where
  S: ContactStore + JobQueue,
  P: Prober,
{
  Ok(Json(load(&*state.store, id).await?))
}

// ─── Remove ──────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct Removed {
  pub outcome: ContactRemoval,
}

/// `DELETE /contacts/{id}`
pub async fn remove<S, P>(
  State(state): State<ApiState<S, P>>,
  Path(id): Path<i64>,
) -> Result<Json<Removed>, ApiError>
where
  S: ContactStore + JobQueue,
  P: Prober,
{
  let outcome = remove_contact(&*state.store, &*state.store, ContactId(id)).await?;
  Ok(Json(Removed { outcome }))
}

// ─── Menu ────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct MenuParams {
  #[serde(default)]
  pub viewer: OwnerId,
}

/// `GET /contacts/{id}/menu[?viewer=<uid>]`
pub async fn menu<S, P>(
  State(state): State<ApiState<S, P>>,
  Path(id): Path<i64>,
  Query(params): Query<MenuParams>,
) -> Result<Json<Vec<MenuEntry>>, ApiError>
where
  S: ContactStore + JobQueue,
  P: Prober,
{
  let contact = load(&*state.store, id).await?;
  let entries = photo_menu(&*state.store, &contact, params.viewer, &state.base_url).await?;
  Ok(Json(entries))
}

// ─── Liveness ────────────────────────────────────────────────────────────────

/// `POST /contacts/{id}/unreachable`
pub async fn unreachable<S, P>(
  State(state): State<ApiState<S, P>>,
  Path(id): Path<i64>,
) -> Result<Json<DecayOutcome>, ApiError>
where
  S: ContactStore + JobQueue,
  P: Prober,
{
  let contact = load(&*state.store, id).await?;
  Ok(Json(mark_unreachable(&*state.store, &contact, Utc::now()).await?))
}

/// `POST /contacts/{id}/reachable`
pub async fn reachable<S, P>(
  State(state): State<ApiState<S, P>>,
  Path(id): Path<i64>,
) -> Result<Json<Value>, ApiError>
where
  S: ContactStore + JobQueue,
  P: Prober,
{
  let contact = load(&*state.store, id).await?;
  let cleared = mark_reachable(&*state.store, &contact).await?;
  Ok(Json(json!({ "cleared": cleared })))
}

// ─── Terminate ───────────────────────────────────────────────────────────────

/// `POST /contacts/{id}/terminate`
pub async fn terminate<S, P>(
  State(state): State<ApiState<S, P>>,
  Path(id): Path<i64>,
) -> Result<Json<Value>, ApiError>
where
  S: ContactStore + JobQueue,
  P: Prober,
{
  let contact = load(&*state.store, id).await?;
  let me = state
    .store
    .self_contact(contact.owner)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::BadRequest(format!("owner {} has no self record", contact.owner)))?;

  let queued = terminate_friendship(&*state.store, contact.owner, &me, &contact).await;
  Ok(Json(json!({ "queued": queued })))
}
