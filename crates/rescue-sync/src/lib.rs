//! Client-side reactive store for the rescue tracker.
//!
//! A [`Store`] holds one observable [`Collection`] per record kind. It is
//! populated from snapshots, mutated optimistically after successful writes,
//! and kept in step with the backend's push feed by [`reconcile::apply`].
//!
//! All mutations are idempotent: `add` is an upsert, and `update`/`remove`
//! are no-ops for ids the store does not hold. Replaying or reordering push
//! events therefore never corrupts the store.

pub mod collection;
pub mod reconcile;
pub mod store;

pub use collection::{Collection, StoreEvent, SubscriptionId};
pub use reconcile::{ReconcileError, Scope};
pub use store::{Store, Stored};
