//! Background work handed to an external job runner.
//!
//! Every job is fire-and-forget: callers enqueue it and move on. A failed
//! enqueue is logged, never surfaced to the operation that triggered it.

use std::future::Future;

use serde::{Deserialize, Serialize};

use crate::{
  Result,
  contact::{ContactId, GlobalContactId, OwnerId},
  network::NetworkKind,
};

/// Scheduling priority understood by the job runner. Lower codes run first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
  High,
  Medium,
  Low,
}

impl Priority {
  pub fn code(self) -> i64 {
    match self {
      Self::High => 20,
      Self::Medium => 40,
      Self::Low => 50,
    }
  }

  pub fn from_code(code: i64) -> Self {
    match code {
      ..=20 => Self::High,
      21..=40 => Self::Medium,
      _ => Self::Low,
    }
  }
}

/// Commands for the delivery notifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotifierCommand {
  /// Tell every peer that the account is gone.
  RemoveMe,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "job", rename_all = "snake_case")]
pub enum Job {
  Notifier {
    command: NotifierCommand,
    owner:   OwnerId,
  },
  /// Push a profile change to the global directory.
  DirectoryUpdate { url: String },
  /// Purge everything that still references a deleted contact.
  RemoveContact { contact: ContactId },
  /// Re-probe a directory entry that lacks an address or name.
  UpdateGlobalContact { gcontact: GlobalContactId },
  /// Fetch and scale a contact's avatar.
  CacheAvatar {
    photo:   String,
    owner:   OwnerId,
    contact: ContactId,
  },
  /// Deliver a protocol-specific unfollow.
  Unfollow {
    protocol:     NetworkKind,
    owner:        OwnerId,
    self_contact: ContactId,
    contact:      ContactId,
    /// Delivery endpoint, for protocols that address one directly.
    endpoint:     Option<String>,
  },
}

impl Job {
  /// Short name stored alongside the payload for the runner's dispatch.
  pub fn name(&self) -> &'static str {
    match self {
      Self::Notifier { .. } => "notifier",
      Self::DirectoryUpdate { .. } => "directory",
      Self::RemoveContact { .. } => "remove_contact",
      Self::UpdateGlobalContact { .. } => "update_gcontact",
      Self::CacheAvatar { .. } => "cache_avatar",
      Self::Unfollow { .. } => "unfollow",
    }
  }

  /// Serialise the full tagged job for the queue's payload column.
  pub fn payload(&self) -> Result<serde_json::Value> {
    Ok(serde_json::to_value(self)?)
  }

  pub fn from_payload(payload: serde_json::Value) -> Result<Self> {
    Ok(serde_json::from_value(payload)?)
  }
}

/// The external job runner's intake.
pub trait JobQueue: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  fn enqueue(
    &self,
    priority: Priority,
    job: Job,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;
}

/// Enqueue and forget. Failures are logged.
pub async fn dispatch<Q: JobQueue>(queue: &Q, priority: Priority, job: Job) {
  let name = job.name();
  if let Err(e) = queue.enqueue(priority, job).await {
    tracing::warn!(job = name, error = %e, "failed to enqueue background job");
  }
}

// ─── Avatars ─────────────────────────────────────────────────────────────────

/// Avatar image caching.
pub trait AvatarCache: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  fn cache_avatar<'a>(
    &'a self,
    photo: &'a str,
    owner: OwnerId,
    contact: ContactId,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;
}

/// Caches avatars by handing a [`Job::CacheAvatar`] to the job queue.
#[derive(Debug)]
pub struct DeferredAvatars<'q, Q>(pub &'q Q);

impl<Q: JobQueue> AvatarCache for DeferredAvatars<'_, Q> {
  type Error = Q::Error;

  async fn cache_avatar(
    &self,
    photo: &str,
    owner: OwnerId,
    contact: ContactId,
  ) -> Result<(), Self::Error> {
    let job = Job::CacheAvatar { photo: photo.to_owned(), owner, contact };
    self.0.enqueue(Priority::Low, job).await
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn payload_is_tagged_by_job_kind() {
    let job = Job::RemoveContact { contact: ContactId(7) };
    let payload = job.payload().unwrap();
    assert_eq!(payload["job"], "remove_contact");
    assert_eq!(payload["contact"], 7);
    assert_eq!(Job::from_payload(payload).unwrap(), job);
  }

  #[test]
  fn priority_codes() {
    for p in [Priority::High, Priority::Medium, Priority::Low] {
      assert_eq!(Priority::from_code(p.code()), p);
    }
  }
}
