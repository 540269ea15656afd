//! Contact resolution: remote reference in, stable local contact id out.
//!
//! A reference is a profile URL or a `user@host` address. The resolver
//! looks for an existing record (normalised URL, then address, then alias),
//! returns it straight away while it is fresh, and otherwise consults the
//! discovery collaborator to create or refresh the record.
//!
//! A [`Resolver`] is meant to live for one request. Its memo cache is never
//! invalidated, so repeated calls inside that request always see the first
//! resolution.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};

use crate::{
  Error, Result,
  clock::Clock,
  contact::{
    ContactId, ContactStamp, ContactUpdate, GlobalContact, NewContact, OwnerId,
  },
  jobs::AvatarCache,
  normalise::{alias_variants, normalise_url},
  probe::{ProbeResult, Prober},
  store::ContactStore,
};

/// Records older than this are refreshed from discovery.
pub const REFRESH_AFTER_DAYS: i64 = 7;

// ─── Memo cache ──────────────────────────────────────────────────────────────

/// Request-scoped memo of resolutions, keyed by (reference, owner).
/// Failed resolutions are remembered too.
#[derive(Debug, Default)]
pub struct ResolutionCache {
  entries: HashMap<(String, OwnerId), Option<ContactId>>,
}

impl ResolutionCache {
  pub fn get(&self, reference: &str, owner: OwnerId) -> Option<Option<ContactId>> {
    self.entries.get(&(reference.to_owned(), owner)).copied()
  }

  pub fn insert(&mut self, reference: &str, owner: OwnerId, id: Option<ContactId>) {
    self.entries.insert((reference.to_owned(), owner), id);
  }

  pub fn len(&self) -> usize { self.entries.len() }

  pub fn is_empty(&self) -> bool { self.entries.is_empty() }
}

// ─── Resolver ────────────────────────────────────────────────────────────────

pub struct Resolver<'a, S, P, A, C> {
  store:   &'a S,
  prober:  &'a P,
  avatars: &'a A,
  clock:   C,
  cache:   ResolutionCache,
}

impl<'a, S, P, A, C> Resolver<'a, S, P, A, C>
where
  S: ContactStore,
  P: Prober,
  A: AvatarCache,
  C: Clock,
{
  pub fn new(store: &'a S, prober: &'a P, avatars: &'a A, clock: C) -> Self {
    Self { store, prober, avatars, clock, cache: ResolutionCache::default() }
  }

  pub fn cache(&self) -> &ResolutionCache { &self.cache }

  /// Resolve `reference` to a contact id for `owner`.
  ///
  /// Returns `Ok(None)` when the reference is empty, when discovery finds
  /// nothing, or when the identity is on an unsupported network and `owner`
  /// is not the shared cache. With `allow_refresh` false an existing record
  /// is returned without consulting discovery however old it is.
  pub async fn resolve(
    &mut self,
    reference: &str,
    owner: OwnerId,
    allow_refresh: bool,
  ) -> Result<Option<ContactId>> {
    if reference.is_empty() {
      return Ok(None);
    }
    if let Some(hit) = self.cache.get(reference, owner) {
      return Ok(hit);
    }

    let resolved = self.resolve_uncached(reference, owner, allow_refresh).await?;
    self.cache.insert(reference, owner, resolved);
    Ok(resolved)
  }

  async fn resolve_uncached(
    &self,
    reference: &str,
    owner: OwnerId,
    allow_refresh: bool,
  ) -> Result<Option<ContactId>> {
    tracing::debug!(reference, %owner, "resolving contact");
    let now = self.clock.now();

    let existing = self.lookup(reference, owner).await?;
    match existing {
      Some(stamp) if !allow_refresh || !is_stale(stamp.avatar_date, now) => {
        return Ok(Some(stamp.id));
      }
      None if !owner.is_public() => return Ok(None),
      _ => {}
    }

    let mut data = match self.prober.probe(reference).await {
      Ok(Some(data)) => data,
      Ok(None) => {
        tracing::debug!(reference, "discovery found nothing");
        return Ok(None);
      }
      Err(e) => {
        tracing::warn!(reference, error = %e, "discovery failed");
        return Ok(None);
      }
    };

    if !data.network.is_supported() {
      if !owner.is_public() {
        return Ok(None);
      }
      match self.directory_entry(&normalise_url(reference)).await? {
        Some(global) => data.merge_global(&global),
        None => return Ok(None),
      }
    }
    if data.url.is_empty() {
      return Ok(None);
    }

    let id = match existing {
      Some(stamp) => stamp.id,
      None => match self.insert(&data, owner, now).await? {
        Some(id) => id,
        None => return Ok(None),
      },
    };

    if !data.photo.is_empty()
      && let Err(e) = self.avatars.cache_avatar(&data.photo, owner, id).await
    {
      tracing::warn!(contact = %id, error = %e, "failed to cache avatar");
    }

    self.refresh(id, &data, now).await?;
    Ok(Some(id))
  }

  /// Normalised URL, then address, then alias.
  async fn lookup(&self, reference: &str, owner: OwnerId) -> Result<Option<ContactStamp>> {
    let nurl = normalise_url(reference);
    if let Some(stamp) =
      self.store.find_by_nurl(&nurl, owner).await.map_err(Error::store)?
    {
      return Ok(Some(stamp));
    }
    if let Some(stamp) =
      self.store.find_by_addr(reference, owner).await.map_err(Error::store)?
    {
      return Ok(Some(stamp));
    }
    let aliases = alias_variants(reference);
    self.store.find_by_alias(&aliases, owner).await.map_err(Error::store)
  }

  async fn directory_entry(&self, nurl: &str) -> Result<Option<GlobalContact>> {
    Ok(
      self
        .store
        .global_contacts_by_nurl(nurl)
        .await
        .map_err(Error::store)?
        .into_iter()
        .next(),
    )
  }

  /// Insert a record for `data` and return the surviving id for its
  /// normalised URL. Concurrent resolvers may have inserted the same
  /// identity; for the shared cache every duplicate but the lowest id is
  /// removed.
  async fn insert(
    &self,
    data: &ProbeResult,
    owner: OwnerId,
    now: DateTime<Utc>,
  ) -> Result<Option<ContactId>> {
    let input = NewContact::from_probe(owner, data, now);
    self.store.insert_contact(&input).await.map_err(Error::store)?;

    let nurl = normalise_url(&data.url);
    let ids = self
      .store
      .contact_ids_by_nurl(&nurl, owner, 2)
      .await
      .map_err(Error::store)?;
    let Some(&id) = ids.first() else {
      return Ok(None);
    };

    // Fill in what discovery could not tell us from the directory.
    if let Some(global) = self.directory_entry(&nurl).await? {
      let update = ContactUpdate {
        keywords: data.keywords.is_empty().then(|| global.keywords.clone()),
        location: data.location.is_empty().then(|| global.location.clone()),
        about: data.about.is_empty().then(|| global.about.clone()),
        gender: Some(global.gender.clone()),
        ..ContactUpdate::default()
      };
      self.store.update_contact(id, &update).await.map_err(Error::store)?;
    }

    if ids.len() > 1 && owner.is_public() {
      let removed = self
        .store
        .delete_public_duplicates(&nurl, id)
        .await
        .map_err(Error::store)?;
      tracing::debug!(%nurl, keep = %id, removed, "removed duplicate shared contacts");
    }

    Ok(Some(id))
  }

  /// Copy fresh discovery data onto the record. Empty values never
  /// overwrite stored ones.
  async fn refresh(&self, id: ContactId, data: &ProbeResult, now: DateTime<Utc>) -> Result<()> {
    let Some(current) = self.store.get_contact(id).await.map_err(Error::store)? else {
      return Ok(());
    };

    let mut update = ContactUpdate {
      addr: changed(&data.addr, &current.addr),
      alias: changed(&data.alias, &current.alias),
      name: changed(&data.name, &current.name),
      nick: changed(&data.nick, &current.nick),
      photo: changed(&data.photo, &current.photo),
      keywords: changed(&data.keywords, &current.keywords),
      location: changed(&data.location, &current.location),
      about: changed(&data.about, &current.about),
      avatar_date: Some(now),
      ..ContactUpdate::default()
    };
    if update.addr.is_some() || update.alias.is_some() {
      update.uri_date = Some(now);
    }
    if update.name.is_some() || update.nick.is_some() {
      update.name_date = Some(now);
    }

    self.store.update_contact(id, &update).await.map_err(Error::store)
  }
}

fn is_stale(avatar_date: DateTime<Utc>, now: DateTime<Utc>) -> bool {
  avatar_date < now - Duration::days(REFRESH_AFTER_DAYS)
}

/// `Some(new)` when `new` is non-empty and differs from `old`.
fn changed(new: &str, old: &str) -> Option<String> {
  (!new.is_empty() && new != old).then(|| new.to_owned())
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone as _;

  use super::*;

  #[test]
  fn staleness_window_is_seven_days() {
    let now = Utc.with_ymd_and_hms(2026, 3, 10, 12, 0, 0).unwrap();
    assert!(!is_stale(now - Duration::days(6), now));
    assert!(!is_stale(now - Duration::days(7), now));
    assert!(is_stale(now - Duration::days(7) - Duration::seconds(1), now));
  }

  #[test]
  fn empty_values_never_overwrite() {
    assert_eq!(changed("", "Alice"), None);
    assert_eq!(changed("Alice", "Alice"), None);
    assert_eq!(changed("Alicia", "Alice"), Some("Alicia".to_owned()));
  }

  #[test]
  fn cache_remembers_failures() {
    let mut cache = ResolutionCache::default();
    cache.insert("bob@example.net", OwnerId(3), None);
    assert_eq!(cache.get("bob@example.net", OwnerId(3)), Some(None));
    assert_eq!(cache.get("bob@example.net", OwnerId::PUBLIC), None);
    assert_eq!(cache.len(), 1);
  }
}
