//! The `workerqueue` table as a [`JobQueue`].

use chrono::{DateTime, Utc};
use roster_core::jobs::{Job, JobQueue, Priority};
use uuid::Uuid;

use crate::{
  Result,
  encode::{decode_dt, encode_dt},
  store::SqliteStore,
};

/// A job waiting in the queue.
#[derive(Debug, Clone, PartialEq)]
pub struct QueuedJob {
  pub job_id:   Uuid,
  pub priority: Priority,
  pub job:      Job,
  pub created:  DateTime<Utc>,
}

impl JobQueue for SqliteStore {
  type Error = crate::Error;

  async fn enqueue(&self, priority: Priority, job: Job) -> Result<()> {
    let job_id = Uuid::new_v4().to_string();
    let command = job.name();
    let payload = serde_json::to_string(&job.payload()?)?;
    let created = encode_dt(Utc::now());

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO workerqueue (job_id, command, payload, priority, created)
           VALUES (?1, ?2, ?3, ?4, ?5)",
          rusqlite::params![job_id, command, payload, priority.code(), created],
        )?;
        Ok(())
      })
      .await?;

    tracing::debug!(job = command, priority = priority.code(), "job queued");
    Ok(())
  }
}

impl SqliteStore {
  /// Jobs not yet taken by the runner, most urgent first, then oldest first.
  pub async fn pending_jobs(&self) -> Result<Vec<QueuedJob>> {
    let rows: Vec<(String, i64, String, String)> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT job_id, priority, payload, created FROM workerqueue
           WHERE done = 0 ORDER BY priority, created, rowid",
        )?;
        let rows = stmt
          .query_map([], |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)))?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    rows
      .into_iter()
      .map(|(job_id, priority, payload, created)| {
        Ok(QueuedJob {
          job_id:   job_id.parse()?,
          priority: Priority::from_code(priority),
          job:      Job::from_payload(serde_json::from_str(&payload)?)?,
          created:  decode_dt(&created)?,
        })
      })
      .collect()
  }

  /// Mark a job as taken. Returns `false` if it was unknown or already done.
  pub async fn complete_job(&self, job_id: Uuid) -> Result<bool> {
    let job_id = job_id.to_string();
    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE workerqueue SET done = 1 WHERE job_id = ?1 AND done = 0",
          rusqlite::params![job_id],
        )?)
      })
      .await?;
    Ok(changed > 0)
  }
}
