//! Presentation helpers: contact menus, location strings, directory picks.

use chrono::{DateTime, Months, Utc};
use serde::Serialize;

use crate::{
  Error, Result,
  contact::{Contact, OwnerId},
  network::NetworkKind,
  store::ContactStore,
};

// ─── Location ────────────────────────────────────────────────────────────────

/// "Locality, Region, Country", skipping empty parts and a region that
/// repeats the locality.
pub fn formatted_location(locality: &str, region: &str, country: &str) -> String {
  let mut parts: Vec<&str> = Vec::with_capacity(3);
  if !locality.is_empty() {
    parts.push(locality);
  }
  if !region.is_empty() && region != locality {
    parts.push(region);
  }
  if !country.is_empty() {
    parts.push(country);
  }
  parts.join(", ")
}

// ─── Photo menu ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MenuItem {
  Status,
  Profile,
  Photos,
  Network,
  Edit,
  Drop,
  Pm,
  Poke,
  Follow,
}

impl MenuItem {
  pub fn label(self) -> &'static str {
    match self {
      Self::Status => "View Status",
      Self::Profile => "View Profile",
      Self::Photos => "View Photos",
      Self::Network => "Network Posts",
      Self::Edit => "View Contact",
      Self::Drop => "Drop Contact",
      Self::Pm => "Send PM",
      Self::Poke => "Poke",
      Self::Follow => "Connect/Follow",
    }
  }

  /// Whether the link is opened in a new tab.
  pub fn new_tab(self) -> bool {
    matches!(self, Self::Status | Self::Profile | Self::Photos | Self::Follow)
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MenuEntry {
  pub item:    MenuItem,
  pub label:   &'static str,
  pub link:    String,
  pub new_tab: bool,
}

impl MenuEntry {
  fn new(item: MenuItem, link: String) -> Self {
    Self { item, label: item.label(), link, new_tab: item.new_tab() }
  }
}

/// The menu shown next to a contact's photo for `viewer`.
///
/// Contacts owned by somebody else are swapped for the viewer's own record
/// of the same identity when there is one; otherwise the viewer gets a
/// profile link and, when signed in, a follow link. Anonymous viewers only
/// ever get the profile link.
pub async fn photo_menu<S: ContactStore>(
  store: &S,
  contact: &Contact,
  viewer: OwnerId,
  base_url: &str,
) -> Result<Vec<MenuEntry>> {
  if viewer.is_public() {
    return Ok(vec![MenuEntry::new(MenuItem::Profile, contact.url.clone())]);
  }
  if contact.owner == viewer {
    return Ok(owned_menu(contact, base_url));
  }

  let own = store
    .find_by_nurl_and_network(&contact.nurl, contact.network, viewer)
    .await
    .map_err(Error::store)?;
  Ok(match own {
    Some(own) => owned_menu(&own, base_url),
    None => vec![
      MenuEntry::new(MenuItem::Profile, contact.url.clone()),
      MenuEntry::new(MenuItem::Follow, format!("follow/?url={}", contact.url)),
    ],
  })
}

fn owned_menu(contact: &Contact, base_url: &str) -> Vec<MenuEntry> {
  let id = contact.id;
  let native = contact.network == NetworkKind::Dfrn;

  let mut profile = if native {
    format!("{base_url}/redir/{id}")
  } else {
    contact.url.clone()
  };
  if profile == "mailbox" {
    profile.clear();
  }

  let (status, photos) = if native {
    let links = (format!("{profile}?url=status"), format!("{profile}?url=photos"));
    profile.push_str("?url=profile");
    links
  } else {
    (String::new(), String::new())
  };

  let pm = if contact.network.supports_private_mail() {
    format!("{base_url}/message/new/{id}")
  } else {
    String::new()
  };
  let poke = if native {
    format!("{base_url}/poke/?f=&c={id}")
  } else {
    String::new()
  };

  [
    (MenuItem::Status, status),
    (MenuItem::Profile, profile),
    (MenuItem::Photos, photos),
    (MenuItem::Network, format!("{base_url}/contacts/{id}/posts")),
    (MenuItem::Edit, format!("{base_url}/contacts/{id}")),
    (MenuItem::Drop, format!("{base_url}/contacts/{id}/drop?confirm=1")),
    (MenuItem::Pm, pm),
    (MenuItem::Poke, poke),
  ]
  .into_iter()
  .filter(|(_, link)| !link.is_empty())
  .map(|(item, link)| MenuEntry::new(item, link))
  .collect()
}

// ─── Directory ───────────────────────────────────────────────────────────────

/// A random, recently active native profile from the directory, as the
/// parent path of its profile URL.
pub async fn random_profile<S: ContactStore>(
  store: &S,
  now: DateTime<Utc>,
) -> Result<Option<String>> {
  let cutoff = now.checked_sub_months(Months::new(1)).unwrap_or(now);
  let url = store
    .random_global_profile(NetworkKind::Dfrn, cutoff)
    .await
    .map_err(Error::store)?;
  Ok(url.map(|u| parent_path(&u).to_owned()))
}

fn parent_path(url: &str) -> &str {
  match url.trim_end_matches('/').rsplit_once('/') {
    Some((parent, _)) if !parent.ends_with('/') => parent,
    _ => url,
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn location_joins_parts() {
    assert_eq!(
      formatted_location("Lyon", "Rhône", "France"),
      "Lyon, Rhône, France"
    );
  }

  #[test]
  fn location_skips_repeated_region() {
    assert_eq!(
      formatted_location("Berlin", "Berlin", "Germany"),
      "Berlin, Germany"
    );
  }

  #[test]
  fn location_with_missing_parts() {
    assert_eq!(formatted_location("", "Ontario", ""), "Ontario");
    assert_eq!(formatted_location("", "", "Peru"), "Peru");
    assert_eq!(formatted_location("", "", ""), "");
  }

  #[test]
  fn parent_of_profile_url() {
    assert_eq!(
      parent_path("https://social.example/profile/dana"),
      "https://social.example/profile"
    );
    assert_eq!(parent_path("https://social.example"), "https://social.example");
  }
}
