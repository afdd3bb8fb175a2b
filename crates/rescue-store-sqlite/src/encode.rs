//! Encoding helpers between domain records and the text columns stored in
//! SQLite.
//!
//! Timestamps in indexed columns use a fixed-width RFC 3339 form (microsecond
//! precision, `Z` suffix) so lexical order equals chronological order. UUIDs
//! are hyphenated lowercase strings.

use chrono::{DateTime, SecondsFormat, Utc};
use rescue_core::entity::Entity;
use uuid::Uuid;

use crate::Result;

// ─── Uuid ────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

// ─── Records ─────────────────────────────────────────────────────────────────

/// Column values for one `records` row.
pub struct RawRecord {
  pub id:         String,
  pub kind:       &'static str,
  pub dog_id:     Option<String>,
  pub sort_at:    String,
  pub created_at: String,
  pub body:       String,
}

impl RawRecord {
  pub fn encode<T: Entity>(record: &T) -> Result<Self> {
    Ok(Self {
      id:         encode_uuid(record.id()),
      kind:       T::TABLE.name(),
      dog_id:     record.dog_id().map(encode_uuid),
      sort_at:    encode_dt(record.sort_at()),
      created_at: encode_dt(record.created_at()),
      body:       serde_json::to_string(record)?,
    })
  }
}

pub fn decode_body<T: Entity>(body: &str) -> Result<T> {
  Ok(serde_json::from_str(body)?)
}
