//! Error type for `rescue-store-sqlite`.

use rescue_core::{ErrorClass, error::Classify};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum Error {
  #[error(transparent)]
  Core(#[from] rescue_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  /// Refused to delete a dog that still owns child records.
  #[error("dog {dog_id} still has {count} record(s); delete them first")]
  DogHasRecords { dog_id: Uuid, count: u64 },
}

impl Classify for Error {
  fn class(&self) -> ErrorClass {
    match self {
      Error::Core(e) => e.class(),
      Error::DogHasRecords { .. } => ErrorClass::Conflict,
      Error::Database(_)
      | Error::Json(_)
      | Error::Uuid(_) => ErrorClass::Internal,
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
