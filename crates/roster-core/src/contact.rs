//! Contact records: remote identities as known to one local owner.
//!
//! Owner id 0 marks the shared (public) cache; every other owner id is a
//! per-account shadow copy of the same identity.

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::{account::AccountType, network::NetworkKind, probe::ProbeResult};

// ─── Identifiers ─────────────────────────────────────────────────────────────

/// Row id of a contact record.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct ContactId(pub i64);

/// The local account owning a contact; [`OwnerId::PUBLIC`] for the shared
/// cache.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  PartialOrd,
  Ord,
  Default,
  Serialize,
  Deserialize,
)]
#[serde(transparent)]
pub struct OwnerId(pub i64);

impl OwnerId {
  pub const PUBLIC: Self = Self(0);

  pub fn is_public(self) -> bool { self == Self::PUBLIC }
}

/// Row id of a global directory record.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct GlobalContactId(pub i64);

impl fmt::Display for ContactId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { self.0.fmt(f) }
}

impl fmt::Display for OwnerId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { self.0.fmt(f) }
}

impl fmt::Display for GlobalContactId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { self.0.fmt(f) }
}

// ─── Relationship ────────────────────────────────────────────────────────────

/// Which way content flows between the owner and the contact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Relation {
  #[default]
  None,
  /// The contact follows the owner.
  Follower,
  /// The owner follows the contact.
  Sharing,
  Friend,
}

impl Relation {
  pub fn code(self) -> i64 {
    match self {
      Self::None => 0,
      Self::Follower => 1,
      Self::Sharing => 2,
      Self::Friend => 3,
    }
  }

  pub fn from_code(code: i64) -> Self {
    match code {
      1 => Self::Follower,
      2 => Self::Sharing,
      3 => Self::Friend,
      _ => Self::None,
    }
  }
}

// ─── Contact ─────────────────────────────────────────────────────────────────

/// A full contact row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contact {
  pub id:           ContactId,
  pub owner:        OwnerId,
  pub created:      DateTime<Utc>,
  /// Canonical profile URL.
  pub url:          String,
  /// Normalised form of `url`; see [`crate::normalise::normalise_url`].
  pub nurl:         String,
  /// `user@host` style handle.
  pub addr:         String,
  pub alias:        String,
  pub name:         String,
  pub nick:         String,
  pub photo:        String,
  pub thumb:        String,
  pub micro:        String,
  pub keywords:     String,
  pub location:     String,
  pub about:        String,
  pub gender:       String,
  pub xmpp:         String,
  pub network:      NetworkKind,
  pub pubkey:       String,
  pub notify:       String,
  pub poll:         String,
  pub request:      String,
  pub confirm:      String,
  pub poco:         String,
  pub priority:     i64,
  pub batch:        String,
  pub rel:          Relation,
  pub name_date:    DateTime<Utc>,
  pub uri_date:     DateTime<Utc>,
  /// Last refresh from discovery; drives the staleness window.
  pub avatar_date:  DateTime<Utc>,
  /// Start of the unreachability countdown, if running.
  pub term_date:    Option<DateTime<Utc>>,
  pub archived:     bool,
  pub writable:     bool,
  pub blocked:      bool,
  pub readonly:     bool,
  pub pending:      bool,
  /// The owner's own record.
  pub is_self:      bool,
  pub account_type: AccountType,
  pub birthday:     Option<NaiveDate>,
}

/// The two columns the resolver needs to decide whether to refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContactStamp {
  pub id:          ContactId,
  pub avatar_date: DateTime<Utc>,
}

// ─── NewContact ──────────────────────────────────────────────────────────────

/// Input to [`crate::store::ContactStore::insert_contact`].
#[derive(Debug, Clone)]
pub struct NewContact {
  pub owner:    OwnerId,
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
  pub rel:      Relation,
  pub is_self:  bool,
  /// Used for `created` and all three freshness dates.
  pub now:      DateTime<Utc>,
}

impl NewContact {
  /// A sharing relationship built from a discovery result.
  pub fn from_probe(owner: OwnerId, data: &ProbeResult, now: DateTime<Utc>) -> Self {
    Self {
      owner,
      url: data.url.clone(),
      addr: data.addr.clone(),
      alias: data.alias.clone(),
      name: data.name.clone(),
      nick: data.nick.clone(),
      photo: data.photo.clone(),
      keywords: data.keywords.clone(),
      location: data.location.clone(),
      about: data.about.clone(),
      network: data.network,
      pubkey: data.pubkey.clone(),
      notify: data.notify.clone(),
      poll: data.poll.clone(),
      request: data.request.clone(),
      confirm: data.confirm.clone(),
      poco: data.poco.clone(),
      priority: data.priority,
      batch: data.batch.clone(),
      rel: Relation::Sharing,
      is_self: false,
      now,
    }
  }
}

// ─── ContactUpdate ───────────────────────────────────────────────────────────

/// A partial update; `None` leaves the column untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContactUpdate {
  pub addr:        Option<String>,
  pub alias:       Option<String>,
  pub name:        Option<String>,
  pub nick:        Option<String>,
  pub photo:       Option<String>,
  pub keywords:    Option<String>,
  pub location:    Option<String>,
  pub about:       Option<String>,
  pub gender:      Option<String>,
  pub name_date:   Option<DateTime<Utc>>,
  pub uri_date:    Option<DateTime<Utc>>,
  pub avatar_date: Option<DateTime<Utc>>,
}

impl ContactUpdate {
  pub fn is_empty(&self) -> bool { *self == Self::default() }
}

// ─── Global directory ────────────────────────────────────────────────────────

/// An owner-less directory entry harvested from posts and peers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlobalContact {
  pub id:           GlobalContactId,
  pub url:          String,
  pub nurl:         String,
  pub addr:         String,
  pub alias:        String,
  pub name:         String,
  pub nick:         String,
  pub photo:        String,
  pub network:      NetworkKind,
  pub keywords:     String,
  pub location:     String,
  pub about:        String,
  pub gender:       String,
  pub account_type: AccountType,
  pub birthday:     Option<NaiveDate>,
  pub updated:      Option<DateTime<Utc>>,
  pub last_contact: Option<DateTime<Utc>>,
  pub last_failure: Option<DateTime<Utc>>,
}

/// Input for writing a directory entry.
#[derive(Debug, Clone, Default)]
pub struct NewGlobalContact {
  pub url:          String,
  pub addr:         String,
  pub alias:        String,
  pub name:         String,
  pub nick:         String,
  pub photo:        String,
  pub network:      NetworkKind,
  pub keywords:     String,
  pub location:     String,
  pub about:        String,
  pub gender:       String,
  pub community:    bool,
  pub contact_type: Option<i64>,
  pub birthday:     Option<NaiveDate>,
  pub updated:      Option<DateTime<Utc>>,
  pub last_contact: Option<DateTime<Utc>>,
  pub last_failure: Option<DateTime<Utc>>,
}
