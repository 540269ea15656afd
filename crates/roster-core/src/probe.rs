//! The discovery collaborator.
//!
//! Discovery itself (webfinger, salmon, profile scraping) lives outside this
//! crate. Roster only relies on the black-box contract: a reference goes in,
//! a [`ProbeResult`] comes out, or nothing does.

use std::{
  collections::HashMap,
  future::Future,
  sync::atomic::{AtomicUsize, Ordering},
};

use serde::{Deserialize, Serialize};

use crate::{contact::GlobalContact, network::NetworkKind};

/// Everything discovery learned about a remote identity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeResult {
  pub url:      String,
  pub addr:     String,
  pub alias:    String,
  pub name:     String,
  pub nick:     String,
  pub photo:    String,
  pub keywords: String,
  pub location: String,
  pub about:    String,
  pub network:  NetworkKind,
  pub pubkey:   String,
  pub notify:   String,
  pub poll:     String,
  pub request:  String,
  pub confirm:  String,
  pub poco:     String,
  pub priority: i64,
  pub batch:    String,
}

impl ProbeResult {
  /// Overlay the identity fields of a directory entry, as done when
  /// discovery classified the identity as an unsupported network.
  pub fn merge_global(&mut self, global: &GlobalContact) {
    self.name = global.name.clone();
    self.nick = global.nick.clone();
    self.url = global.url.clone();
    self.photo = global.photo.clone();
    self.addr = global.addr.clone();
    self.alias = global.alias.clone();
    self.network = global.network;
  }
}

/// Remote profile discovery.
pub trait Prober: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Probe a profile URL or `user@host` address. `Ok(None)` means discovery
  /// found nothing.
  fn probe<'a>(
    &'a self,
    reference: &'a str,
  ) -> impl Future<Output = Result<Option<ProbeResult>, Self::Error>> + Send + 'a;
}

// ─── StaticProber ────────────────────────────────────────────────────────────

/// Serves discovery results from a fixed table, counting every call.
///
/// Useful for tests and for embedding with a fixed set of known profiles.
#[derive(Debug, Default)]
pub struct StaticProber {
  entries: HashMap<String, ProbeResult>,
  calls:   AtomicUsize,
}

impl StaticProber {
  pub fn new() -> Self { Self::default() }

  /// Builder form of [`StaticProber::insert`].
  pub fn with(mut self, reference: impl Into<String>, result: ProbeResult) -> Self {
    self.insert(reference, result);
    self
  }

  pub fn insert(&mut self, reference: impl Into<String>, result: ProbeResult) {
    self.entries.insert(reference.into(), result);
  }

  /// Number of probes served so far, hits and misses alike.
  pub fn calls(&self) -> usize { self.calls.load(Ordering::SeqCst) }
}

impl Prober for StaticProber {
  type Error = std::convert::Infallible;

  async fn probe(&self, reference: &str) -> Result<Option<ProbeResult>, Self::Error> {
    self.calls.fetch_add(1, Ordering::SeqCst);
    Ok(self.entries.get(reference).cloned())
  }
}
