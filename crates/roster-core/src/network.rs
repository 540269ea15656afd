//! Network kinds: which federation protocol a remote identity speaks.
//!
//! The set is closed. Everything the rest of the crate needs to know about a
//! network is answered by the capability methods on [`NetworkKind`] rather
//! than by comparing protocol strings at the call site.

use std::str::FromStr as _;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use strum::{Display, EnumIter, EnumString};

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, EnumString, EnumIter,
)]
pub enum NetworkKind {
  /// The server's native protocol.
  #[strum(serialize = "dfrn")]
  Dfrn,
  #[strum(serialize = "dspr")]
  Diaspora,
  #[strum(serialize = "stat")]
  OStatus,
  #[strum(serialize = "pump")]
  PumpIo,
  /// Connector-imported StatusNet timelines.
  #[strum(serialize = "stac")]
  StatusNet,
  #[strum(serialize = "feed")]
  Feed,
  #[strum(serialize = "mail")]
  Mail,
  /// Discovery could not classify the identity.
  #[default]
  #[strum(serialize = "unkn")]
  Phantom,
  /// Contacts that were archived on removal.
  #[strum(serialize = "none")]
  None,
}

impl NetworkKind {
  /// The code stored in the `network` column.
  /// Must match the `strum(serialize = ...)` attributes above.
  pub fn code(self) -> &'static str {
    match self {
      Self::Dfrn => "dfrn",
      Self::Diaspora => "dspr",
      Self::OStatus => "stat",
      Self::PumpIo => "pump",
      Self::StatusNet => "stac",
      Self::Feed => "feed",
      Self::Mail => "mail",
      Self::Phantom => "unkn",
      Self::None => "none",
    }
  }

  /// Decode a stored code; anything unrecognised is [`NetworkKind::Phantom`].
  pub fn from_code(code: &str) -> Self {
    Self::from_str(code).unwrap_or_default()
  }

  /// Per-account contacts are only created for these networks.
  pub fn is_supported(self) -> bool {
    matches!(self, Self::Dfrn | Self::Diaspora | Self::OStatus | Self::PumpIo)
  }

  /// Networks whose directory entries are worth refreshing in the background.
  pub fn is_federated(self) -> bool {
    matches!(self, Self::Dfrn | Self::Diaspora | Self::OStatus)
  }

  /// Connector networks lose to any native record describing the same
  /// identity.
  pub fn is_connector(self) -> bool { matches!(self, Self::StatusNet) }

  /// Networks that support private messages.
  pub fn supports_private_mail(self) -> bool {
    matches!(self, Self::Dfrn | Self::Diaspora)
  }
}

impl Serialize for NetworkKind {
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(self.code())
  }
}

impl<'de> Deserialize<'de> for NetworkKind {
  fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
    let code = String::deserialize(deserializer)?;
    Ok(Self::from_code(&code))
  }
}
