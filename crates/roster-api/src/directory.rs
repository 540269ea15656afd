//! `GET /directory/random`: a random recently active native profile.

use axum::{Json, extract::State};
use chrono::Utc;
use roster_core::{
  jobs::JobQueue, presentation::random_profile, probe::Prober, store::ContactStore,
};
use serde_json::{Value, json};

use crate::{ApiState, error::ApiError};

pub async fn random<S, P>(State(state): State<ApiState<S, P>>) -> Result<Json<Value>, ApiError>
where
  S: ContactStore + JobQueue,
  P: Prober,
{
  let url = random_profile(&*state.store, Utc::now())
    .await?
    .ok_or_else(|| ApiError::NotFound("no recent profiles".into()))?;
  Ok(Json(json!({ "url": url })))
}
