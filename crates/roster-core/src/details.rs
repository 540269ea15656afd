//! Display details for a profile link or address.
//!
//! Looks in several places, most specific first: the owner's contacts, the
//! shared cache, then the global directory. Results are memoised for the
//! lifetime of a [`DetailsLookup`].

use std::collections::HashMap;

use chrono::{Datelike as _, NaiveDate};
use serde::Serialize;

use crate::{
  Error, Result,
  account::AccountType,
  clock::Clock,
  contact::{Contact, ContactId, GlobalContact, GlobalContactId, OwnerId},
  jobs::{Job, JobQueue, Priority, dispatch},
  network::NetworkKind,
  normalise::{alias_variants, normalise_url},
  probe::Prober,
  store::ContactStore,
};

/// Where a set of details came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum DetailsSource {
  /// One of the owner's contacts.
  Contact(ContactId),
  /// The shared cache.
  Public(ContactId),
  Directory(GlobalContactId),
  /// Nothing stored; built from caller defaults.
  Defaults,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContactDetails {
  pub source:            DetailsSource,
  pub url:               String,
  pub nurl:              String,
  pub alias:             String,
  pub network:           NetworkKind,
  pub name:              String,
  pub nick:              String,
  pub addr:              String,
  pub location:          String,
  pub about:             String,
  pub xmpp:              String,
  pub keywords:          String,
  pub gender:            String,
  pub photo:             String,
  pub thumb:             String,
  pub micro:             String,
  pub account_type:      AccountType,
  pub birthday:          Option<NaiveDate>,
  /// Next occurrence of `birthday`, today included.
  pub upcoming_birthday: Option<NaiveDate>,
  pub is_self:           bool,
}

impl ContactDetails {
  fn from_contact(contact: Contact, public: bool) -> Self {
    let source = if public {
      DetailsSource::Public(contact.id)
    } else {
      DetailsSource::Contact(contact.id)
    };
    Self {
      source,
      url: contact.url,
      nurl: contact.nurl,
      alias: contact.alias,
      network: contact.network,
      name: contact.name,
      nick: contact.nick,
      addr: contact.addr,
      location: contact.location,
      about: contact.about,
      xmpp: contact.xmpp,
      keywords: contact.keywords,
      gender: contact.gender,
      photo: contact.photo,
      thumb: contact.thumb,
      micro: contact.micro,
      account_type: contact.account_type,
      birthday: contact.birthday,
      upcoming_birthday: None,
      is_self: !public && contact.is_self,
    }
  }

  fn from_global(global: GlobalContact) -> Self {
    Self {
      source: DetailsSource::Directory(global.id),
      thumb: global.photo.clone(),
      micro: global.photo.clone(),
      url: global.url,
      nurl: global.nurl,
      alias: global.alias,
      network: global.network,
      name: global.name,
      nick: global.nick,
      addr: global.addr,
      location: global.location,
      about: global.about,
      xmpp: String::new(),
      keywords: global.keywords,
      gender: global.gender,
      photo: global.photo,
      account_type: global.account_type,
      birthday: global.birthday,
      upcoming_birthday: None,
      is_self: false,
    }
  }
}

/// Fallback values used when stored details are missing.
#[derive(Debug, Clone, Default)]
pub struct DetailDefaults {
  pub photo:   Option<String>,
  pub name:    Option<String>,
  pub network: Option<NetworkKind>,
}

impl DetailDefaults {
  pub fn is_empty(&self) -> bool {
    self.photo.is_none() && self.name.is_none() && self.network.is_none()
  }

  fn into_details(self, url: &str) -> ContactDetails {
    ContactDetails {
      source:            DetailsSource::Defaults,
      url:               url.to_owned(),
      nurl:              normalise_url(url),
      alias:             String::new(),
      network:           self.network.unwrap_or_default(),
      name:              self.name.unwrap_or_default(),
      nick:              String::new(),
      addr:              String::new(),
      location:          String::new(),
      about:             String::new(),
      xmpp:              String::new(),
      keywords:          String::new(),
      gender:            String::new(),
      photo:             self.photo.unwrap_or_default(),
      thumb:             String::new(),
      micro:             String::new(),
      account_type:      AccountType::Person,
      birthday:          None,
      upcoming_birthday: None,
      is_self:           false,
    }
  }
}

// ─── Lookup ──────────────────────────────────────────────────────────────────

pub struct DetailsLookup<'a, S, P, Q, C> {
  store:  &'a S,
  prober: &'a P,
  queue:  &'a Q,
  clock:  C,
  cache:  HashMap<(String, OwnerId), Option<ContactDetails>>,
}

impl<'a, S, P, Q, C> DetailsLookup<'a, S, P, Q, C>
where
  S: ContactStore,
  P: Prober,
  Q: JobQueue,
  C: Clock,
{
  pub fn new(store: &'a S, prober: &'a P, queue: &'a Q, clock: C) -> Self {
    Self { store, prober, queue, clock, cache: HashMap::new() }
  }

  /// Details for a profile link as seen by `owner`.
  pub async fn by_url(
    &mut self,
    url: &str,
    owner: OwnerId,
    defaults: DetailDefaults,
  ) -> Result<Option<ContactDetails>> {
    if url.is_empty() {
      return Ok((!defaults.is_empty()).then(|| defaults.into_details(url)));
    }
    let key = (url.to_owned(), owner);
    if let Some(hit) = self.cache.get(&key) {
      return Ok(hit.clone());
    }

    let rows = self.rows_by_url(url, owner).await?;
    let details = match pick(rows) {
      Some(found) => Some(self.finish(found, Some(defaults)).await),
      None if defaults.is_empty() => None,
      None => Some(self.finish(defaults.into_details(url), None).await),
    };

    self.cache.insert(key, details.clone());
    Ok(details)
  }

  /// Details for a `user@host` address; probes when nothing is stored.
  pub async fn by_addr(&mut self, addr: &str, owner: OwnerId) -> Result<Option<ContactDetails>> {
    if addr.is_empty() {
      return Ok(None);
    }

    let mut rows: Vec<ContactDetails> = self
      .store
      .contacts_by_addr(addr, owner)
      .await
      .map_err(Error::store)?
      .into_iter()
      .map(|c| ContactDetails::from_contact(c, false))
      .collect();
    if rows.is_empty() {
      rows = self.public_rows_by_addr(addr).await?;
    }
    if let Some(found) = rows.into_iter().next() {
      return Ok(Some(self.finish(found, None).await));
    }

    let url = match self.prober.probe(addr).await {
      Ok(Some(data)) => data.url,
      Ok(None) => return Ok(None),
      Err(e) => {
        tracing::warn!(addr, error = %e, "discovery failed");
        return Ok(None);
      }
    };
    self.by_url(&url, owner, DetailDefaults::default()).await
  }

  async fn rows_by_url(&self, url: &str, owner: OwnerId) -> Result<Vec<ContactDetails>> {
    let nurl = normalise_url(url);
    let aliases = alias_variants(url);

    for (scope, public) in [(owner, false), (OwnerId::PUBLIC, true)] {
      let mut contacts =
        self.store.contacts_by_nurl(&nurl, scope).await.map_err(Error::store)?;
      if contacts.is_empty() {
        contacts = self
          .store
          .contacts_by_alias(&aliases, scope)
          .await
          .map_err(Error::store)?;
      }
      if !contacts.is_empty() {
        return Ok(
          contacts
            .into_iter()
            .map(|c| ContactDetails::from_contact(c, public))
            .collect(),
        );
      }
    }

    Ok(
      self
        .store
        .global_contacts_by_nurl(&nurl)
        .await
        .map_err(Error::store)?
        .into_iter()
        .map(ContactDetails::from_global)
        .collect(),
    )
  }

  async fn public_rows_by_addr(&self, addr: &str) -> Result<Vec<ContactDetails>> {
    let public = self
      .store
      .contacts_by_addr(addr, OwnerId::PUBLIC)
      .await
      .map_err(Error::store)?;
    if !public.is_empty() {
      return Ok(
        public
          .into_iter()
          .map(|c| ContactDetails::from_contact(c, true))
          .collect(),
      );
    }
    Ok(
      self
        .store
        .global_contacts_by_addr(addr)
        .await
        .map_err(Error::store)?
        .into_iter()
        .map(ContactDetails::from_global)
        .collect(),
    )
  }

  /// Derived fields, defaults and privacy rules.
  async fn finish(
    &self,
    mut details: ContactDetails,
    defaults: Option<DetailDefaults>,
  ) -> ContactDetails {
    let today = self.clock.now().date_naive();
    details.upcoming_birthday =
      details.birthday.map(|bd| upcoming_birthday(bd, today));

    if let Some(defaults) = defaults {
      if details.photo.is_empty()
        && let Some(photo) = defaults.photo
      {
        details.photo = photo;
      }
      if details.name.is_empty()
        && let Some(name) = defaults.name
      {
        details.name = name;
      }
      if details.network == NetworkKind::Phantom
        && let Some(network) = defaults.network
      {
        details.network = network;
      }
    }
    if details.thumb.is_empty() {
      details.thumb = details.photo.clone();
    }
    if details.micro.is_empty() {
      details.micro = details.thumb.clone();
    }

    if let DetailsSource::Directory(gid) = details.source
      && (details.addr.is_empty() || details.name.is_empty())
      && details.network.is_federated()
    {
      dispatch(self.queue, Priority::Low, Job::UpdateGlobalContact { gcontact: gid }).await;
    }

    // Diaspora profile details are only shown to connected owners.
    if !matches!(details.source, DetailsSource::Contact(_))
      && details.network == NetworkKind::Diaspora
    {
      details.location.clear();
      details.about.clear();
      details.gender.clear();
      details.birthday = None;
      details.upcoming_birthday = None;
    }

    details
  }
}

/// With several matches, connector records lose to native ones.
fn pick(rows: Vec<ContactDetails>) -> Option<ContactDetails> {
  if rows.len() > 1 && rows.iter().any(|r| !r.network.is_connector()) {
    return rows.into_iter().find(|r| !r.network.is_connector());
  }
  rows.into_iter().next()
}

/// The next occurrence of `birthday` on or after `today`. A Feb 29 birthday
/// falls on Feb 28 in common years.
pub fn upcoming_birthday(birthday: NaiveDate, today: NaiveDate) -> NaiveDate {
  let this_year = anniversary(birthday, today.year());
  if this_year < today {
    anniversary(birthday, today.year() + 1)
  } else {
    this_year
  }
}

fn anniversary(birthday: NaiveDate, year: i32) -> NaiveDate {
  NaiveDate::from_ymd_opt(year, birthday.month(), birthday.day())
    .or_else(|| NaiveDate::from_ymd_opt(year, birthday.month(), birthday.day() - 1))
    .unwrap_or(birthday)
}

#[cfg(test)]
mod tests {
  use super::*;

  fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
  }

  #[test]
  fn birthday_later_this_year() {
    assert_eq!(
      upcoming_birthday(date(1980, 11, 2), date(2026, 10, 19)),
      date(2026, 11, 2)
    );
  }

  #[test]
  fn birthday_today_counts_as_upcoming() {
    assert_eq!(
      upcoming_birthday(date(1990, 10, 19), date(2026, 10, 19)),
      date(2026, 10, 19)
    );
  }

  #[test]
  fn birthday_already_passed_rolls_over() {
    assert_eq!(
      upcoming_birthday(date(1975, 1, 5), date(2026, 10, 19)),
      date(2027, 1, 5)
    );
  }

  #[test]
  fn leap_day_birthday_in_common_year() {
    assert_eq!(
      upcoming_birthday(date(2000, 2, 29), date(2026, 1, 1)),
      date(2026, 2, 28)
    );
  }
}
