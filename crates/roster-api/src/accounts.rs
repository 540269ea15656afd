//! Handlers for `/accounts/{uid}` endpoints.

use axum::{
  Json,
  extract::{Path, Query, State},
};
use chrono::Utc;
use roster_core::{
  contact::{Contact, OwnerId},
  jobs::JobQueue,
  probe::Prober,
  removal::remove_account,
  store::ContactStore,
};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::{ApiState, error::ApiError};

/// `DELETE /accounts/{uid}`: flags the account removed and notifies peers.
pub async fn remove<S, P>(
  State(state): State<ApiState<S, P>>,
  Path(uid): Path<i64>,
) -> Result<Json<Value>, ApiError>
where
  S: ContactStore + JobQueue,
  P: Prober,
{
  let removed = remove_account(&*state.store, &*state.store, OwnerId(uid), Utc::now()).await?;
  if !removed {
    return Err(ApiError::NotFound(format!("account {uid} not found")));
  }
  Ok(Json(json!({ "removed": true })))
}

#[derive(Debug, Deserialize)]
pub struct PageParams {
  #[serde(default)]
  pub start: usize,
  /// Page size; 0 returns only the total.
  #[serde(default)]
  pub count: usize,
}

#[derive(Debug, Serialize)]
pub struct Ungrouped {
  pub total:    u64,
  pub contacts: Vec<Contact>,
}

/// `GET /accounts/{uid}/ungrouped[?start=&count=]`
pub async fn ungrouped<S, P>(
  State(state): State<ApiState<S, P>>,
  Path(uid): Path<i64>,
  Query(page): Query<PageParams>,
) -> Result<Json<Ungrouped>, ApiError>
where
  S: ContactStore + JobQueue,
  P: Prober,
{
  let owner = OwnerId(uid);
  let total = state.store.count_ungrouped(owner).await.map_err(ApiError::store)?;
  let contacts = if page.count == 0 {
    Vec::new()
  } else {
    state
      .store
      .list_ungrouped(owner, page.start, page.count)
      .await
      .map_err(ApiError::store)?
  };
  Ok(Json(Ungrouped { total, contacts }))
}
