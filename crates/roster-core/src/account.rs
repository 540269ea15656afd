//! Account classification and local account records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::contact::OwnerId;

/// What kind of actor a contact or account is.
///
/// Computed once when a record is read; the stored `contact-type` wins over
/// the legacy forum/private-group flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountType {
  #[default]
  Person,
  Organisation,
  News,
  /// A forum or private group.
  Community,
}

impl AccountType {
  /// Classify from the stored `contact-type` code and the community flags.
  pub fn classify(contact_type: Option<i64>, community: bool) -> Self {
    match contact_type {
      Some(code) => Self::from_code(code),
      None if community => Self::Community,
      None => Self::Person,
    }
  }

  pub fn from_code(code: i64) -> Self {
    match code {
      1 => Self::Organisation,
      2 => Self::News,
      3 => Self::Community,
      _ => Self::Person,
    }
  }

  pub fn code(self) -> i64 {
    match self {
      Self::Person => 0,
      Self::Organisation => 1,
      Self::News => 2,
      Self::Community => 3,
    }
  }

  /// Display label; persons carry no label.
  pub fn label(self) -> &'static str {
    match self {
      Self::Organisation => "Organisation",
      Self::News => "News",
      Self::Community => "Forum",
      Self::Person => "",
    }
  }
}

/// A local account as far as removal is concerned.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
  pub uid:        OwnerId,
  /// Unique; reserved against re-registration once the account is removed.
  pub nickname:   String,
  /// The account's public profile URL.
  pub url:        String,
  pub removed:    bool,
  pub expires_on: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn explicit_type_overrides_flags() {
    assert_eq!(AccountType::classify(Some(0), true), AccountType::Person);
    assert_eq!(AccountType::classify(Some(2), false), AccountType::News);
  }

  #[test]
  fn flags_apply_without_explicit_type() {
    assert_eq!(AccountType::classify(None, true), AccountType::Community);
    assert_eq!(AccountType::classify(None, false), AccountType::Person);
  }

  #[test]
  fn labels() {
    assert_eq!(AccountType::Community.label(), "Forum");
    assert_eq!(AccountType::Organisation.label(), "Organisation");
    assert_eq!(AccountType::Person.label(), "");
  }
}
