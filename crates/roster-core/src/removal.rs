//! Account and contact removal, and friendship termination.
//!
//! These are destructive operations. Confirming the requester's intent and
//! authorisation is the caller's job.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::{
  Error, Result,
  contact::{Contact, ContactId, OwnerId},
  jobs::{Job, JobQueue, NotifierCommand, Priority, dispatch},
  network::NetworkKind,
  store::ContactStore,
};

/// Per-account switch: archive removed contacts instead of deleting them.
pub const ARCHIVE_REMOVED_SETTING: (&str, &str) = ("system", "archive_removed_contacts");

/// Flag an account removed and notify peers and the directory.
///
/// The account row and its data are purged later by a scheduled sweep once
/// `now` has passed. Returns `false` for the shared owner, unknown accounts
/// and accounts already removed.
pub async fn remove_account<S, Q>(
  store: &S,
  queue: &Q,
  uid: OwnerId,
  now: DateTime<Utc>,
) -> Result<bool>
where
  S: ContactStore,
  Q: JobQueue,
{
  if uid.is_public() {
    return Ok(false);
  }
  let Some(account) = store.get_account(uid).await.map_err(Error::store)? else {
    return Ok(false);
  };
  if account.removed {
    return Ok(false);
  }

  tracing::info!(%uid, nickname = %account.nickname, "removing account");

  store.reserve_nickname(&account.nickname).await.map_err(Error::store)?;
  store.mark_account_removed(uid, now).await.map_err(Error::store)?;

  dispatch(queue, Priority::High, Job::Notifier {
    command: NotifierCommand::RemoveMe,
    owner:   uid,
  })
  .await;
  dispatch(queue, Priority::Low, Job::DirectoryUpdate { url: account.url }).await;

  Ok(true)
}

/// What [`remove_contact`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ContactRemoval {
  /// Unknown, self or shared record; nothing changed.
  Skipped,
  Archived,
  Deleted,
}

/// Remove one of an account's contacts.
pub async fn remove_contact<S, Q>(store: &S, queue: &Q, id: ContactId) -> Result<ContactRemoval>
where
  S: ContactStore,
  Q: JobQueue,
{
  let Some(contact) = store.get_contact(id).await.map_err(Error::store)? else {
    return Ok(ContactRemoval::Skipped);
  };
  if contact.is_self || contact.owner.is_public() {
    return Ok(ContactRemoval::Skipped);
  }

  let (category, key) = ARCHIVE_REMOVED_SETTING;
  let archive = store
    .owner_setting(contact.owner, category, key)
    .await
    .map_err(Error::store)?
    .is_some_and(|v| is_enabled(&v));

  if archive {
    store.archive_removed_contact(id).await.map_err(Error::store)?;
    return Ok(ContactRemoval::Archived);
  }

  store.delete_contact(id).await.map_err(Error::store)?;
  dispatch(queue, Priority::Low, Job::RemoveContact { contact: id }).await;
  Ok(ContactRemoval::Deleted)
}

/// Tell `contact` that `owner` no longer follows them, over the contact's
/// own protocol. Local state is untouched. Returns whether a notification
/// was queued.
pub async fn terminate_friendship<Q: JobQueue>(
  queue: &Q,
  owner: OwnerId,
  self_contact: &Contact,
  contact: &Contact,
) -> bool {
  let endpoint = match contact.network {
    NetworkKind::OStatus if contact.notify.is_empty() => return false,
    NetworkKind::OStatus => Some(contact.notify.clone()),
    NetworkKind::Diaspora | NetworkKind::Dfrn => None,
    _ => return false,
  };

  dispatch(queue, Priority::High, Job::Unfollow {
    protocol: contact.network,
    owner,
    self_contact: self_contact.id,
    contact: contact.id,
    endpoint,
  })
  .await;
  true
}

/// Settings are stored as text; empty and `"0"` mean off.
fn is_enabled(value: &str) -> bool { !value.is_empty() && value != "0" }
