//! SQL schema for the rescue SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE ... IF NOT EXISTS`.
///
/// All seven tables share one physical table: `kind` holds the logical table
/// name and `body` the record as JSON. `dog_id` is NULL exactly for dogs.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS records (
    id          TEXT PRIMARY KEY,
    kind        TEXT NOT NULL,   -- logical table name, e.g. 'activities'
    dog_id      TEXT REFERENCES records(id),
    sort_at     TEXT NOT NULL,   -- fixed-width RFC 3339 UTC; list ordering key
    created_at  TEXT NOT NULL,   -- server-assigned
    body        TEXT NOT NULL,   -- full record as JSON
    CHECK ((kind = 'dogs') = (dog_id IS NULL))
);

CREATE INDEX IF NOT EXISTS records_kind_dog_idx ON records(kind, dog_id, sort_at);

PRAGMA user_version = 1;
";
