//! Decay of unreachable contacts.
//!
//! When delivery to a contact keeps failing, a countdown starts. If the
//! contact is still unreachable once the grace period is over, it is archived:
//! kept for a possible reactivation but excluded from outbound delivery. Both
//! the timer and the archive flag are propagated to every record sharing the
//! contact's normalised URL.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::{
  Error, Result,
  contact::Contact,
  normalise::normalise_url,
  store::ContactStore,
};

/// Grace period between the first failure and archival.
pub const ARCHIVE_AFTER_DAYS: i64 = 32;

/// What [`mark_unreachable`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum DecayOutcome {
  /// The contact was already archived; nothing changed.
  AlreadyArchived,
  TimerStarted,
  /// The timer is running but the grace period is not over.
  Pending { since: DateTime<Utc> },
  Archived,
}

pub async fn mark_unreachable<S: ContactStore>(
  store: &S,
  contact: &Contact,
  now: DateTime<Utc>,
) -> Result<DecayOutcome> {
  if contact.archived {
    return Ok(DecayOutcome::AlreadyArchived);
  }
  let nurl = (!contact.url.is_empty()).then(|| normalise_url(&contact.url));

  match contact.term_date {
    None => {
      store.set_term_date(contact.id, Some(now)).await.map_err(Error::store)?;
      if let Some(nurl) = &nurl {
        store.start_term_dates_by_nurl(nurl, now).await.map_err(Error::store)?;
      }
      tracing::debug!(contact = %contact.id, "started decay timer");
      Ok(DecayOutcome::TimerStarted)
    }
    Some(since) if now > since + Duration::days(ARCHIVE_AFTER_DAYS) => {
      store.archive_contact(contact.id).await.map_err(Error::store)?;
      if let Some(nurl) = &nurl {
        store.archive_by_nurl(nurl).await.map_err(Error::store)?;
      }
      tracing::info!(contact = %contact.id, url = %contact.url, %since, "archived unreachable contact");
      Ok(DecayOutcome::Archived)
    }
    Some(since) => Ok(DecayOutcome::Pending { since }),
  }
}

/// Stop the decay timer. The stored record is consulted rather than the
/// caller's copy; returns whether a running timer was cleared.
pub async fn mark_reachable<S: ContactStore>(store: &S, contact: &Contact) -> Result<bool> {
  let running = store
    .get_contact(contact.id)
    .await
    .map_err(Error::store)?
    .and_then(|stored| stored.term_date);
  if running.is_none() {
    return Ok(false);
  }

  store.set_term_date(contact.id, None).await.map_err(Error::store)?;
  if !contact.url.is_empty() {
    store
      .clear_term_dates_by_nurl(&normalise_url(&contact.url))
      .await
      .map_err(Error::store)?;
  }
  tracing::info!(contact = %contact.id, "contact reachable again");
  Ok(true)
}
