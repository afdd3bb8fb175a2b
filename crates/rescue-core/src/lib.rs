//! Entity types, validation, and the change-event model shared by the
//! server and the terminal client.
//!
//! Nothing here talks HTTP or SQL; [`store::RecordStore`] is the seam the
//! backends plug into.

pub mod change;
pub mod entity;
pub mod error;
pub mod feed;
pub mod profile;
pub mod store;
pub mod table;
pub mod validate;

pub use error::{Error, ErrorClass, Result};
pub use table::Table;

/// A loosely-typed JSON object: create payloads and partial updates.
pub type Fields = serde_json::Map<String, serde_json::Value>;
