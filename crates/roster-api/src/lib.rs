//! JSON REST API for Roster.
//!
//! Exposes an axum [`Router`] backed by any store that is both a
//! [`ContactStore`] and a [`JobQueue`], plus a discovery [`Prober`]. Auth,
//! TLS, and transport concerns are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", roster_api::api_router(ApiState::new(store, prober, base_url)))
//! ```

pub mod accounts;
pub mod contacts;
pub mod directory;
pub mod error;
pub mod resolve;

use std::sync::Arc;

use axum::{
  Router,
  routing::{delete, get, post},
};
use roster_core::{jobs::JobQueue, probe::Prober, store::ContactStore};

pub use error::ApiError;

/// State shared by every handler.
pub struct ApiState<S, P> {
  pub store:    Arc<S>,
  pub prober:   Arc<P>,
  /// Public base URL of this server, used to build menu links.
  pub base_url: Arc<str>,
}

impl<S, P> ApiState<S, P> {
  pub fn new(store: Arc<S>, prober: Arc<P>, base_url: &str) -> Self {
    Self { store, prober, base_url: base_url.trim_end_matches('/').into() }
  }
}

// Derived `Clone` would require `S: Clone` and `P: Clone`.
impl<S, P> Clone for ApiState<S, P> {
  fn clone(&self) -> Self {
    Self {
      store:    Arc::clone(&self.store),
      prober:   Arc::clone(&self.prober),
      base_url: Arc::clone(&self.base_url),
    }
  }
}

/// Build a fully-materialised API router.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S, P>(state: ApiState<S, P>) -> Router<()>
where
  S: ContactStore + JobQueue + 'static,
  P: Prober + 'static,
{
  Router::new()
    // Resolution and details
    .route("/resolve", post(resolve::resolve_one::<S, P>))
    .route("/details", get(resolve::details_by_url::<S, P>))
    .route("/details/by-addr", get(resolve::details_by_addr::<S, P>))
    // Contacts
    .route(
      "/contacts/{id}",
      get(contacts::get_one::<S, P>).delete(contacts::remove::<S, P>),
    )
    .route("/contacts/{id}/menu", get(contacts::menu::<S, P>))
    .route("/contacts/{id}/unreachable", post(contacts::unreachable::<S, P>))
    .route("/contacts/{id}/reachable", post(contacts::reachable::<S, P>))
    .route("/contacts/{id}/terminate", post(contacts::terminate::<S, P>))
    // Accounts
    .route("/accounts/{uid}", delete(accounts::remove::<S, P>))
    .route("/accounts/{uid}/ungrouped", get(accounts::ungrouped::<S, P>))
    // Directory
    .route("/directory/random", get(directory::random::<S, P>))
    .with_state(state)
}

#[cfg(test)]
mod tests;
