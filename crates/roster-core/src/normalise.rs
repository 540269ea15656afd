//! Profile URL normalisation.
//!
//! The normalised form is the scheme-insensitive dedup key stored in the
//! `nurl` column of contact and directory records.

/// Canonicalise a profile URL: `https:` becomes `http:`, a leading `www.`
/// host label is dropped and trailing slashes are trimmed.
pub fn normalise_url(url: &str) -> String {
  url
    .replace("https:", "http:")
    .replace("//www.", "//")
    .trim_end_matches('/')
    .to_owned()
}

/// The alias spellings a reference is matched against: the literal
/// reference, its normalised form, and its `https://` variant.
pub fn alias_variants(reference: &str) -> [String; 3] {
  [
    reference.to_owned(),
    normalise_url(reference),
    reference.replace("http://", "https://"),
  ]
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn https_and_http_normalise_identically() {
    assert_eq!(
      normalise_url("https://example.com/alice"),
      normalise_url("http://example.com/alice"),
    );
  }

  #[test]
  fn strips_www_and_trailing_slashes() {
    assert_eq!(
      normalise_url("https://www.example.com/profile/bob//"),
      "http://example.com/profile/bob"
    );
  }

  #[test]
  fn address_handles_pass_through() {
    assert_eq!(normalise_url("alice@example.com"), "alice@example.com");
  }

  #[test]
  fn alias_variants_cover_both_schemes() {
    let [literal, normalised, secure] =
      alias_variants("http://social.example/u/carol");
    assert_eq!(literal, "http://social.example/u/carol");
    assert_eq!(normalised, "http://social.example/u/carol");
    assert_eq!(secure, "https://social.example/u/carol");
  }
}
