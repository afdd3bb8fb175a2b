//! SQLite backend for the rescue tracker.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime, and publishes a
//! [`ChangeEvent`](rescue_core::change::ChangeEvent) for every committed
//! write.

mod encode;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteStore;

#[cfg(test)]
mod tests;
