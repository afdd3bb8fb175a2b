//! [`SqliteStore`] — the SQLite implementation of [`RecordStore`].

use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::OptionalExtension as _;
use tokio::sync::broadcast;
use tracing::debug;
use uuid::Uuid;

use rescue_core::{
  Fields, Table,
  change::ChangeEvent,
  entity::{Activity, ChildEntity, Dog, Entity, new_record, patch_record},
  feed::ChangeFeed,
  profile::WalkCount,
  store::RecordStore,
  table::SortOrder,
};

use crate::{
  Error, Result,
  encode::{RawRecord, decode_body, decode_uuid, encode_dt, encode_uuid},
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A rescue record store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection and the change feed are both
/// reference-counted, so every clone publishes to the same subscribers.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
  feed: ChangeFeed,
}

/// What a write transaction found once it held the lock.
enum Outcome {
  Done,
  Missing,
  UnknownDog,
  /// Dog deletion refused; carries the number of child records.
  Blocked(u64),
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    Self::with_connection(conn).await
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    Self::with_connection(conn).await
  }

  async fn with_connection(conn: tokio_rusqlite::Connection) -> Result<Self> {
    let store = Self {
      conn,
      feed: ChangeFeed::new(),
    };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// The feed this store publishes to.
  pub fn feed(&self) -> &ChangeFeed { &self.feed }

  fn publish(&self, event: rescue_core::Result<ChangeEvent>) -> Result<()> {
    self.feed.publish(event?);
    Ok(())
  }

  /// Fetch record bodies of one kind, optionally restricted to a dog.
  async fn select_bodies(
    &self,
    table: Table,
    dog_id: Option<Uuid>,
  ) -> Result<Vec<String>> {
    let direction = match table.list_order() {
      SortOrder::Ascending => "ASC",
      SortOrder::Descending => "DESC",
    };
    let sql = format!(
      "SELECT body FROM records
       WHERE kind = ?1 AND (?2 IS NULL OR dog_id = ?2)
       ORDER BY sort_at {direction}, rowid {direction}"
    );
    let kind = table.name();
    let dog_str = dog_id.map(encode_uuid);

    let bodies = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params![kind, dog_str], |row| row.get(0))?
          .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(rows)
      })
      .await?;
    Ok(bodies)
  }
}

/// `true` when a dog with `id` exists.
fn dog_exists(conn: &rusqlite::Connection, id: &str) -> rusqlite::Result<bool> {
  Ok(
    conn
      .query_row(
        "SELECT 1 FROM records WHERE id = ?1 AND kind = 'dogs'",
        rusqlite::params![id],
        |_| Ok(true),
      )
      .optional()?
      .unwrap_or(false),
  )
}

// ─── RecordStore impl ────────────────────────────────────────────────────────

impl RecordStore for SqliteStore {
  type Error = Error;

  // ── Dogs ──────────────────────────────────────────────────────────────────

  async fn list_dogs(&self) -> Result<Vec<Dog>> {
    self
      .select_bodies(Table::Dogs, None)
      .await?
      .iter()
      .map(|body| decode_body(body))
      .collect()
  }

  // ── Any table ─────────────────────────────────────────────────────────────

  async fn list<T: ChildEntity>(&self, dog_id: Uuid) -> Result<Vec<T>> {
    self
      .select_bodies(T::TABLE, Some(dog_id))
      .await?
      .iter()
      .map(|body| decode_body(body))
      .collect()
  }

  async fn get<T: Entity>(&self, id: Uuid) -> Result<Option<T>> {
    let id_str = encode_uuid(id);
    let kind = T::TABLE.name();

    let body: Option<String> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT body FROM records WHERE id = ?1 AND kind = ?2",
              rusqlite::params![id_str, kind],
              |row| row.get(0),
            )
            .optional()?,
        )
      })
      .await?;

    body.as_deref().map(decode_body).transpose()
  }

  async fn create<T: Entity>(&self, fields: Fields) -> Result<T> {
    let record: T = new_record(fields, Uuid::new_v4(), Utc::now())?;
    let raw = RawRecord::encode(&record)?;

    let outcome = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        if let Some(dog_id) = &raw.dog_id {
          if !dog_exists(&tx, dog_id)? {
            return Ok(Outcome::UnknownDog);
          }
        }
        tx.execute(
          "INSERT INTO records (id, kind, dog_id, sort_at, created_at, body)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
          rusqlite::params![
            raw.id,
            raw.kind,
            raw.dog_id,
            raw.sort_at,
            raw.created_at,
            raw.body
          ],
        )?;
        tx.commit()?;
        Ok(Outcome::Done)
      })
      .await?;

    if let Outcome::UnknownDog = outcome {
      let dog_id = record.dog_id().unwrap_or_default();
      return Err(rescue_core::Error::UnknownDog(dog_id).into());
    }

    debug!(table = %T::TABLE, id = %record.id(), "created record");
    self.publish(ChangeEvent::inserted(&record))?;
    Ok(record)
  }

  async fn update<T: Entity>(&self, id: Uuid, patch: Fields) -> Result<Option<T>> {
    let Some(current) = self.get::<T>(id).await? else {
      return Ok(None);
    };
    let updated = patch_record(&current, patch, Utc::now())?;
    let raw = RawRecord::encode(&updated)?;
    let moved = updated.dog_id() != current.dog_id();

    let outcome = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        if let (true, Some(dog_id)) = (moved, &raw.dog_id) {
          if !dog_exists(&tx, dog_id)? {
            return Ok(Outcome::UnknownDog);
          }
        }
        let changed = tx.execute(
          "UPDATE records SET dog_id = ?1, sort_at = ?2, body = ?3
           WHERE id = ?4 AND kind = ?5",
          rusqlite::params![raw.dog_id, raw.sort_at, raw.body, raw.id, raw.kind],
        )?;
        tx.commit()?;
        Ok(if changed == 0 { Outcome::Missing } else { Outcome::Done })
      })
      .await?;

    match outcome {
      Outcome::Done => {}
      Outcome::UnknownDog => {
        let dog_id = updated.dog_id().unwrap_or_default();
        return Err(rescue_core::Error::UnknownDog(dog_id).into());
      }
      // Deleted between the read and the write.
      Outcome::Missing | Outcome::Blocked(_) => return Ok(None),
    }

    debug!(table = %T::TABLE, %id, "updated record");
    self.publish(ChangeEvent::updated(&current, &updated))?;
    Ok(Some(updated))
  }

  async fn delete<T: Entity>(&self, id: Uuid) -> Result<Option<T>> {
    let id_str = encode_uuid(id);
    let kind = T::TABLE.name();

    let (outcome, body): (Outcome, Option<String>) = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let body: Option<String> = tx
          .query_row(
            "SELECT body FROM records WHERE id = ?1 AND kind = ?2",
            rusqlite::params![id_str, kind],
            |row| row.get(0),
          )
          .optional()?;
        if body.is_none() {
          return Ok((Outcome::Missing, None));
        }

        let children: i64 = tx.query_row(
          "SELECT COUNT(*) FROM records WHERE dog_id = ?1",
          rusqlite::params![id_str],
          |row| row.get(0),
        )?;
        if children > 0 {
          return Ok((Outcome::Blocked(children as u64), None));
        }

        tx.execute("DELETE FROM records WHERE id = ?1", rusqlite::params![id_str])?;
        tx.commit()?;
        Ok((Outcome::Done, body))
      })
      .await?;

    let body = match (outcome, body) {
      (Outcome::Done, Some(body)) => body,
      (Outcome::Blocked(count), _) => {
        return Err(Error::DogHasRecords { dog_id: id, count });
      }
      _ => return Ok(None),
    };

    let record: T = decode_body(&body)?;
    debug!(table = %T::TABLE, %id, "deleted record");
    self.publish(ChangeEvent::deleted(&record))?;
    Ok(Some(record))
  }

  // ── Analytics ─────────────────────────────────────────────────────────────

  async fn walk_counts(&self) -> Result<Vec<WalkCount>> {
    let rows: Vec<(String, i64)> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT dog_id, COUNT(*) FROM records
           WHERE kind = 'activities'
             AND json_extract(body, '$.activity_type') = 'Walk'
           GROUP BY dog_id
           ORDER BY COUNT(*) DESC, dog_id ASC",
        )?;
        let rows = stmt
          .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    rows
      .into_iter()
      .map(|(dog_id, walks)| {
        Ok(WalkCount {
          dog_id: decode_uuid(&dog_id)?,
          walks:  walks as u64,
        })
      })
      .collect()
  }

  async fn recent_activities(&self, since: DateTime<Utc>) -> Result<Vec<Activity>> {
    let since = encode_dt(since);
    let bodies: Vec<String> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT body FROM records
           WHERE kind = 'activities' AND sort_at >= ?1
           ORDER BY sort_at DESC, rowid DESC",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![since], |row| row.get(0))?
          .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(rows)
      })
      .await?;
    debug!(count = bodies.len(), "recent activities");
    bodies.iter().map(|body| decode_body(body)).collect()
  }

  // ── Change feed ───────────────────────────────────────────────────────────

  fn changes(&self) -> broadcast::Receiver<ChangeEvent> { self.feed.subscribe() }
}
