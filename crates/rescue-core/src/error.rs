//! Error types for `rescue-core`.

use thiserror::Error;
use uuid::Uuid;

use crate::Table;

#[derive(Debug, Error)]
pub enum Error {
  #[error("{} required for {table}", list_fields(fields))]
  MissingFields {
    table:  Table,
    fields: Vec<&'static str>,
  },

  #[error("invalid {table} record: {message}")]
  InvalidRecord { table: Table, message: String },

  #[error("dog not found: {0}")]
  UnknownDog(Uuid),

  #[error("payload must be a JSON object")]
  NotAnObject,

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

fn list_fields(fields: &[&'static str]) -> String {
  match fields {
    [] => "nothing is".to_owned(),
    [one] => format!("{one} is"),
    [a, b] => format!("{a} and {b} are"),
    [init @ .., last] => format!("{}, and {last} are", init.join(", ")),
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

// ─── Classification ──────────────────────────────────────────────────────────

/// Coarse failure category, used by the HTTP layer to pick a status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
  /// The caller sent something unusable (400).
  Validation,
  /// The write conflicts with existing data (409).
  Conflict,
  /// Anything else; the message is passed through (500).
  Internal,
}

/// Implemented by every store error so callers can map failures without
/// knowing the concrete backend.
pub trait Classify {
  fn class(&self) -> ErrorClass;
}

impl Classify for Error {
  fn class(&self) -> ErrorClass {
    match self {
      Error::MissingFields { .. }
      | Error::InvalidRecord { .. }
      | Error::UnknownDog(_)
      | Error::NotAnObject => ErrorClass::Validation,
      Error::Serialization(_) => ErrorClass::Internal,
    }
  }
}
