//! The `ContactStore` trait.
//!
//! The trait is implemented by storage backends (e.g. `roster-store-sqlite`).
//! The resolver, liveness tracker and removal operations depend on this
//! abstraction, not on any concrete backend.
//!
//! Lookups scoped by owner take an [`OwnerId`]; pass [`OwnerId::PUBLIC`] for
//! the shared cache.

use std::future::Future;

use chrono::{DateTime, Utc};

use crate::{
  account::Account,
  contact::{
    Contact, ContactId, ContactStamp, ContactUpdate, GlobalContact, NewContact,
    OwnerId,
  },
  network::NetworkKind,
};

/// Abstraction over a Roster storage backend.
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes (e.g. tokio with `axum`).
pub trait ContactStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Resolver lookups ──────────────────────────────────────────────────

  fn find_by_nurl<'a>(
    &'a self,
    nurl: &'a str,
    owner: OwnerId,
  ) -> impl Future<Output = Result<Option<ContactStamp>, Self::Error>> + Send + 'a;

  fn find_by_addr<'a>(
    &'a self,
    addr: &'a str,
    owner: OwnerId,
  ) -> impl Future<Output = Result<Option<ContactStamp>, Self::Error>> + Send + 'a;

  /// First record whose alias equals any of `aliases`.
  fn find_by_alias<'a>(
    &'a self,
    aliases: &'a [String],
    owner: OwnerId,
  ) -> impl Future<Output = Result<Option<ContactStamp>, Self::Error>> + Send + 'a;

  // ── Contacts ──────────────────────────────────────────────────────────

  fn get_contact(
    &self,
    id: ContactId,
  ) -> impl Future<Output = Result<Option<Contact>, Self::Error>> + Send + '_;

  /// The owner's own record, if any.
  fn self_contact(
    &self,
    owner: OwnerId,
  ) -> impl Future<Output = Result<Option<Contact>, Self::Error>> + Send + '_;

  fn contacts_by_nurl<'a>(
    &'a self,
    nurl: &'a str,
    owner: OwnerId,
  ) -> impl Future<Output = Result<Vec<Contact>, Self::Error>> + Send + 'a;

  fn contacts_by_alias<'a>(
    &'a self,
    aliases: &'a [String],
    owner: OwnerId,
  ) -> impl Future<Output = Result<Vec<Contact>, Self::Error>> + Send + 'a;

  fn contacts_by_addr<'a>(
    &'a self,
    addr: &'a str,
    owner: OwnerId,
  ) -> impl Future<Output = Result<Vec<Contact>, Self::Error>> + Send + 'a;

  /// The owner's record for `nurl` on a specific network.
  fn find_by_nurl_and_network<'a>(
    &'a self,
    nurl: &'a str,
    network: NetworkKind,
    owner: OwnerId,
  ) -> impl Future<Output = Result<Option<Contact>, Self::Error>> + Send + 'a;

  /// Insert a new record and return its id.
  fn insert_contact<'a>(
    &'a self,
    input: &'a NewContact,
  ) -> impl Future<Output = Result<ContactId, Self::Error>> + Send + 'a;

  /// Up to `limit` ids for (`nurl`, `owner`), lowest first.
  fn contact_ids_by_nurl<'a>(
    &'a self,
    nurl: &'a str,
    owner: OwnerId,
    limit: usize,
  ) -> impl Future<Output = Result<Vec<ContactId>, Self::Error>> + Send + 'a;

  /// Delete every non-self shared record for `nurl` except `keep`.
  /// Returns the number of rows removed.
  fn delete_public_duplicates<'a>(
    &'a self,
    nurl: &'a str,
    keep: ContactId,
  ) -> impl Future<Output = Result<usize, Self::Error>> + Send + 'a;

  fn update_contact<'a>(
    &'a self,
    id: ContactId,
    update: &'a ContactUpdate,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  /// Returns whether a row was deleted.
  fn delete_contact(
    &self,
    id: ContactId,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Archive a removed contact in place: archived, network `none`,
  /// unwritable.
  fn archive_removed_contact(
    &self,
    id: ContactId,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  // ── Liveness ──────────────────────────────────────────────────────────

  /// Set or clear (`None`) the decay timer of one record.
  fn set_term_date(
    &self,
    id: ContactId,
    at: Option<DateTime<Utc>>,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Start the decay timer on every `nurl` record whose timer is not running.
  fn start_term_dates_by_nurl<'a>(
    &'a self,
    nurl: &'a str,
    at: DateTime<Utc>,
  ) -> impl Future<Output = Result<usize, Self::Error>> + Send + 'a;

  fn clear_term_dates_by_nurl<'a>(
    &'a self,
    nurl: &'a str,
  ) -> impl Future<Output = Result<usize, Self::Error>> + Send + 'a;

  fn archive_contact(
    &self,
    id: ContactId,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  fn archive_by_nurl<'a>(
    &'a self,
    nurl: &'a str,
  ) -> impl Future<Output = Result<usize, Self::Error>> + Send + 'a;

  // ── Global directory ──────────────────────────────────────────────────

  fn global_contacts_by_nurl<'a>(
    &'a self,
    nurl: &'a str,
  ) -> impl Future<Output = Result<Vec<GlobalContact>, Self::Error>> + Send + 'a;

  fn global_contacts_by_addr<'a>(
    &'a self,
    addr: &'a str,
  ) -> impl Future<Output = Result<Vec<GlobalContact>, Self::Error>> + Send + 'a;

  /// URL of a random directory entry on `network` that was updated after
  /// `updated_after` and whose last contact is not older than its last
  /// failure.
  fn random_global_profile(
    &self,
    network: NetworkKind,
    updated_after: DateTime<Utc>,
  ) -> impl Future<Output = Result<Option<String>, Self::Error>> + Send + '_;

  // ── Accounts ──────────────────────────────────────────────────────────

  fn get_account(
    &self,
    uid: OwnerId,
  ) -> impl Future<Output = Result<Option<Account>, Self::Error>> + Send + '_;

  /// Record a nickname that may never be registered again.
  fn reserve_nickname<'a>(
    &'a self,
    nickname: &'a str,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  /// Flag the account removed; the actual purge happens in a later sweep
  /// once `expires_on` has passed.
  fn mark_account_removed(
    &self,
    uid: OwnerId,
    expires_on: DateTime<Utc>,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// A per-account setting value, if set.
  fn owner_setting<'a>(
    &'a self,
    owner: OwnerId,
    category: &'a str,
    key: &'a str,
  ) -> impl Future<Output = Result<Option<String>, Self::Error>> + Send + 'a;

  // ── Groups ────────────────────────────────────────────────────────────

  /// Number of the owner's non-self contacts that belong to no group.
  fn count_ungrouped(
    &self,
    owner: OwnerId,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + '_;

  /// A page of the owner's ungrouped, non-self, unblocked, non-pending
  /// contacts.
  fn list_ungrouped(
    &self,
    owner: OwnerId,
    start: usize,
    count: usize,
  ) -> impl Future<Output = Result<Vec<Contact>, Self::Error>> + Send + '_;
}
