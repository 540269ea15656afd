//! SQLite backend for the Roster contact cache.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime. Besides [`ContactStore`] the store
//! implements [`JobQueue`] by persisting jobs to a `workerqueue` table that an
//! external runner drains.
//!
//! [`ContactStore`]: roster_core::store::ContactStore
//! [`JobQueue`]: roster_core::jobs::JobQueue

mod encode;
mod queue;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use queue::QueuedJob;
pub use store::SqliteStore;
