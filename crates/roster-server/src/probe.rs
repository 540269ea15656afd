//! [`HttpProber`]: discovery through an external probe service.
//!
//! The service answers `GET {endpoint}?uri=<reference>` with a JSON
//! [`ProbeResult`], or 404 when it cannot discover anything.

use std::time::Duration;

use reqwest::{Client, StatusCode};
use roster_core::probe::{ProbeResult, Prober};

use crate::error::Error;

/// Cheap to clone: the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct HttpProber {
  client:   Client,
  endpoint: Option<String>,
}

impl HttpProber {
  /// With no endpoint every probe comes back empty.
  pub fn new(endpoint: Option<String>) -> Result<Self, Error> {
    let client = Client::builder().timeout(Duration::from_secs(20)).build()?;
    Ok(Self { client, endpoint })
  }
}

impl Prober for HttpProber {
  type Error = Error;

  async fn probe(&self, reference: &str) -> Result<Option<ProbeResult>, Error> {
    let Some(endpoint) = &self.endpoint else {
      tracing::debug!(reference, "no discovery endpoint configured");
      return Ok(None);
    };

    let resp = self
      .client
      .get(endpoint)
      .query(&[("uri", reference)])
      .send()
      .await?;
    if resp.status() == StatusCode::NOT_FOUND {
      return Ok(None);
    }
    let data = resp.error_for_status()?.json::<ProbeResult>().await?;
    Ok(Some(data))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[tokio::test]
  async fn unconfigured_prober_finds_nothing() {
    let prober = HttpProber::new(None).unwrap();
    assert_eq!(prober.probe("alice@example.com").await.unwrap(), None);
  }
}
