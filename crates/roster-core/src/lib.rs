//! Core types and trait definitions for the Roster contact cache.
//!
//! This crate is deliberately free of HTTP and database dependencies. It holds
//! the domain model, the collaborator traits (storage, discovery, background
//! jobs, avatar caching) and the policies built on top of them: resolution,
//! liveness tracking, removal and presentation.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod account;
pub mod clock;
pub mod contact;
pub mod details;
pub mod error;
pub mod jobs;
pub mod liveness;
pub mod network;
pub mod normalise;
pub mod presentation;
pub mod probe;
pub mod removal;
pub mod resolver;
pub mod store;

pub use error::{Error, Result};
