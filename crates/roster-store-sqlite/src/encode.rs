//! Encoding and decoding helpers between Rust domain types and the plain
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as RFC 3339 strings with fixed microsecond precision
//! so that they also compare correctly as text. Dates are `YYYY-MM-DD`.
//! Enumerations are stored as their codes.

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use roster_core::{
  account::{Account, AccountType},
  contact::{Contact, ContactId, GlobalContact, GlobalContactId, OwnerId, Relation},
  network::NetworkKind,
};

use crate::{Error, Result};

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

fn decode_opt_dt(s: Option<String>) -> Result<Option<DateTime<Utc>>> {
  s.as_deref().filter(|s| !s.is_empty()).map(decode_dt).transpose()
}

// ─── NaiveDate ───────────────────────────────────────────────────────────────

pub fn encode_date(d: NaiveDate) -> String { d.format("%Y-%m-%d").to_string() }

/// Dates at or before this placeholder mean "unknown".
const UNKNOWN_DATE: &str = "0001-01-01";

pub fn decode_date(s: Option<String>) -> Result<Option<NaiveDate>> {
  let Some(s) = s.filter(|s| s.as_str() > UNKNOWN_DATE) else {
    return Ok(None);
  };
  NaiveDate::parse_from_str(&s, "%Y-%m-%d")
    .map(Some)
    .map_err(|e| Error::DateParse(format!("{s:?}: {e}")))
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Column list matching [`RawContact::from_row`].
pub const CONTACT_COLUMNS: &str = "
  id, uid, created, url, nurl, addr, alias, name, nick, photo, thumb, micro,
  keywords, location, about, gender, xmpp, network, pubkey, notify, poll,
  request, confirm, poco, priority, batch, rel, name_date, uri_date,
  avatar_date, term_date, archive, writable, blocked, readonly, pending,
  self, forum, prv, contact_type, bd";

/// Raw values read directly from a `contact` row.
pub struct RawContact {
  pub id:           i64,
  pub uid:          i64,
  pub created:      String,
  pub url:          String,
  pub nurl:         String,
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
  pub network:      String,
  pub pubkey:       String,
  pub notify:       String,
  pub poll:         String,
  pub request:      String,
  pub confirm:      String,
  pub poco:         String,
  pub priority:     i64,
  pub batch:        String,
  pub rel:          i64,
  pub name_date:    String,
  pub uri_date:     String,
  pub avatar_date:  String,
  pub term_date:    Option<String>,
  pub archive:      bool,
  pub writable:     bool,
  pub blocked:      bool,
  pub readonly:     bool,
  pub pending:      bool,
  pub is_self:      bool,
  pub forum:        bool,
  pub prv:          bool,
  pub contact_type: Option<i64>,
  pub bd:           Option<String>,
}

impl RawContact {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:           row.get(0)?,
      uid:          row.get(1)?,
      created:      row.get(2)?,
      url:          row.get(3)?,
      nurl:         row.get(4)?,
      addr:         row.get(5)?,
      alias:        row.get(6)?,
      name:         row.get(7)?,
      nick:         row.get(8)?,
      photo:        row.get(9)?,
      thumb:        row.get(10)?,
      micro:        row.get(11)?,
      keywords:     row.get(12)?,
      location:     row.get(13)?,
      about:        row.get(14)?,
      gender:       row.get(15)?,
      xmpp:         row.get(16)?,
      network:      row.get(17)?,
      pubkey:       row.get(18)?,
      notify:       row.get(19)?,
      poll:         row.get(20)?,
      request:      row.get(21)?,
      confirm:      row.get(22)?,
      poco:         row.get(23)?,
      priority:     row.get(24)?,
      batch:        row.get(25)?,
      rel:          row.get(26)?,
      name_date:    row.get(27)?,
      uri_date:     row.get(28)?,
      avatar_date:  row.get(29)?,
      term_date:    row.get(30)?,
      archive:      row.get(31)?,
      writable:     row.get(32)?,
      blocked:      row.get(33)?,
      readonly:     row.get(34)?,
      pending:      row.get(35)?,
      is_self:      row.get(36)?,
      forum:        row.get(37)?,
      prv:          row.get(38)?,
      contact_type: row.get(39)?,
      bd:           row.get(40)?,
    })
  }

  pub fn into_contact(self) -> Result<Contact> {
    Ok(Contact {
      id:           ContactId(self.id),
      owner:        OwnerId(self.uid),
      created:      decode_dt(&self.created)?,
      url:          self.url,
      nurl:         self.nurl,
      addr:         self.addr,
      alias:        self.alias,
      name:         self.name,
      nick:         self.nick,
      photo:        self.photo,
      thumb:        self.thumb,
      micro:        self.micro,
      keywords:     self.keywords,
      location:     self.location,
      about:        self.about,
      gender:       self.gender,
      xmpp:         self.xmpp,
      network:      NetworkKind::from_code(&self.network),
      pubkey:       self.pubkey,
      notify:       self.notify,
      poll:         self.poll,
      request:      self.request,
      confirm:      self.confirm,
      poco:         self.poco,
      priority:     self.priority,
      batch:        self.batch,
      rel:          Relation::from_code(self.rel),
      name_date:    decode_dt(&self.name_date)?,
      uri_date:     decode_dt(&self.uri_date)?,
      avatar_date:  decode_dt(&self.avatar_date)?,
      term_date:    decode_opt_dt(self.term_date)?,
      archived:     self.archive,
      writable:     self.writable,
      blocked:      self.blocked,
      readonly:     self.readonly,
      pending:      self.pending,
      is_self:      self.is_self,
      account_type: AccountType::classify(self.contact_type, self.forum || self.prv),
      birthday:     decode_date(self.bd)?,
    })
  }
}

/// Column list matching [`RawGlobalContact::from_row`].
pub const GCONTACT_COLUMNS: &str = "
  id, url, nurl, addr, alias, name, nick, photo, network, keywords, location,
  about, gender, community, contact_type, birthday, updated, last_contact,
  last_failure";

/// Raw values read directly from a `gcontact` row.
pub struct RawGlobalContact {
  pub id:           i64,
  pub url:          String,
  pub nurl:         String,
  pub addr:         String,
  pub alias:        String,
  pub name:         String,
  pub nick:         String,
  pub photo:        String,
  pub network:      String,
  pub keywords:     String,
  pub location:     String,
  pub about:        String,
  pub gender:       String,
  pub community:    bool,
  pub contact_type: Option<i64>,
  pub birthday:     Option<String>,
  pub updated:      Option<String>,
  pub last_contact: Option<String>,
  pub last_failure: Option<String>,
}

impl RawGlobalContact {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:           row.get(0)?,
      url:          row.get(1)?,
      nurl:         row.get(2)?,
      addr:         row.get(3)?,
      alias:        row.get(4)?,
      name:         row.get(5)?,
      nick:         row.get(6)?,
      photo:        row.get(7)?,
      network:      row.get(8)?,
      keywords:     row.get(9)?,
      location:     row.get(10)?,
      about:        row.get(11)?,
      gender:       row.get(12)?,
      community:    row.get(13)?,
      contact_type: row.get(14)?,
      birthday:     row.get(15)?,
      updated:      row.get(16)?,
      last_contact: row.get(17)?,
      last_failure: row.get(18)?,
    })
  }

  pub fn into_global(self) -> Result<GlobalContact> {
    Ok(GlobalContact {
      id:           GlobalContactId(self.id),
      url:          self.url,
      nurl:         self.nurl,
      addr:         self.addr,
      alias:        self.alias,
      name:         self.name,
      nick:         self.nick,
      photo:        self.photo,
      network:      NetworkKind::from_code(&self.network),
      keywords:     self.keywords,
      location:     self.location,
      about:        self.about,
      gender:       self.gender,
      account_type: AccountType::classify(self.contact_type, self.community),
      birthday:     decode_date(self.birthday)?,
      updated:      decode_opt_dt(self.updated)?,
      last_contact: decode_opt_dt(self.last_contact)?,
      last_failure: decode_opt_dt(self.last_failure)?,
    })
  }
}

/// Raw values read directly from a `user` row.
pub struct RawAccount {
  pub uid:        i64,
  pub nickname:   String,
  pub url:        String,
  pub removed:    bool,
  pub expires_on: Option<String>,
}

impl RawAccount {
  pub fn into_account(self) -> Result<Account> {
    Ok(Account {
      uid:        OwnerId(self.uid),
      nickname:   self.nickname,
      url:        self.url,
      removed:    self.removed,
      expires_on: decode_opt_dt(self.expires_on)?,
    })
  }
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone as _;

  use super::*;

  #[test]
  fn timestamps_sort_as_text() {
    let earlier = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
    let later = earlier + chrono::Duration::milliseconds(1500);
    assert!(encode_dt(earlier) < encode_dt(later));
    assert_eq!(decode_dt(&encode_dt(later)).unwrap(), later);
  }

  #[test]
  fn placeholder_birthdays_are_unknown() {
    assert_eq!(decode_date(Some("0001-01-01".into())).unwrap(), None);
    assert_eq!(decode_date(Some(String::new())).unwrap(), None);
    assert_eq!(decode_date(None).unwrap(), None);
    assert_eq!(
      decode_date(Some("1984-06-30".into())).unwrap(),
      NaiveDate::from_ymd_opt(1984, 6, 30)
    );
  }
}
