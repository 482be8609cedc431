//! Character store trait and SQLite implementation.

use rusqlite::{params, Connection, OptionalExtension};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use thiserror::Error;
use tracing::debug;

use crate::model::CharacterId;

use super::record::CharacterRecord;

#[derive(Debug, Error)]
pub enum StoreError {
  #[error("cache database error: {0}")]
  Sqlite(#[from] rusqlite::Error),

  #[error("failed to create cache directory {}: {source}", path.display())]
  Io {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("cache lock poisoned")]
  Poisoned,
}

/// Local table of characters keyed by id.
///
/// Calls may block on disk I/O; the repository invokes them inline from async
/// code the same way it would await a DAO.
pub trait CharacterStore: Send + Sync {
  /// Every cached character.
  fn all(&self) -> Result<Vec<CharacterRecord>, StoreError>;

  /// A single character, `None` when it has never been cached.
  fn by_id(&self, id: CharacterId) -> Result<Option<CharacterRecord>, StoreError>;

  /// Characters whose favorite flag is set.
  fn favorites(&self) -> Result<Vec<CharacterRecord>, StoreError>;

  /// Insert or replace many characters in one transaction.
  fn upsert_all(&self, records: &[CharacterRecord]) -> Result<(), StoreError>;

  /// Insert or replace a single character.
  fn upsert(&self, record: &CharacterRecord) -> Result<(), StoreError>;

  /// Set the favorite flag without touching any other column.
  fn set_favorite(&self, id: CharacterId, is_favorite: bool) -> Result<(), StoreError>;

  /// Drop every cached character.
  fn clear(&self) -> Result<(), StoreError>;
}

/// Schema for the character cache.
const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS characters (
    id INTEGER PRIMARY KEY NOT NULL,
    name TEXT NOT NULL,
    image TEXT NOT NULL,
    created TEXT NOT NULL,
    episode TEXT NOT NULL,
    gender TEXT NOT NULL,
    location_name TEXT NOT NULL,
    location_url TEXT NOT NULL,
    origin_name TEXT NOT NULL,
    origin_url TEXT NOT NULL,
    species TEXT NOT NULL,
    status TEXT NOT NULL,
    type TEXT NOT NULL,
    url TEXT NOT NULL,
    is_favorite INTEGER NOT NULL DEFAULT 0
);

CREATE INDEX IF NOT EXISTS idx_characters_favorite ON characters(is_favorite);
"#;

const SELECT_COLUMNS: &str = "SELECT id, name, image, created, episode, gender, \
   location_name, location_url, origin_name, origin_url, species, status, type, url, is_favorite \
   FROM characters";

// is_favorite is not in the update list, so a refresh keeps the local flag.
// New rows start at 0.
const UPSERT: &str = "INSERT INTO characters (id, name, image, created, episode, gender, \
   location_name, location_url, origin_name, origin_url, species, status, type, url) \
   VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14) \
   ON CONFLICT(id) DO UPDATE SET \
     name = excluded.name, image = excluded.image, created = excluded.created, \
     episode = excluded.episode, gender = excluded.gender, \
     location_name = excluded.location_name, location_url = excluded.location_url, \
     origin_name = excluded.origin_name, origin_url = excluded.origin_url, \
     species = excluded.species, status = excluded.status, type = excluded.type, \
     url = excluded.url";

/// SQLite-backed character store.
pub struct SqliteStore {
  conn: Mutex<Connection>,
}

impl SqliteStore {
  /// Open or create the cache database at `path`.
  pub fn open(path: &Path) -> Result<Self, StoreError> {
    // Ensure parent directory exists
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent).map_err(|source| StoreError::Io {
        path: parent.to_path_buf(),
        source,
      })?;
    }

    debug!(path = %path.display(), "opening character cache");
    Self::from_connection(Connection::open(path)?)
  }

  /// Fresh store that lives only as long as the value.
  #[cfg(test)]
  pub fn in_memory() -> Result<Self, StoreError> {
    Self::from_connection(Connection::open_in_memory()?)
  }

  fn from_connection(conn: Connection) -> Result<Self, StoreError> {
    conn.execute_batch(SCHEMA)?;
    Ok(Self {
      conn: Mutex::new(conn),
    })
  }

  fn conn(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
    self.conn.lock().map_err(|_| StoreError::Poisoned)
  }

  fn query_records(
    conn: &Connection,
    sql: &str,
    params: impl rusqlite::Params,
  ) -> Result<Vec<CharacterRecord>, StoreError> {
    let mut stmt = conn.prepare(sql)?;
    let records = stmt
      .query_map(params, CharacterRecord::from_row)?
      .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(records)
  }

  fn upsert_with(conn: &Connection, record: &CharacterRecord) -> rusqlite::Result<usize> {
    conn.execute(
      UPSERT,
      params![
        record.id,
        record.name,
        record.image,
        record.created,
        record.episode,
        record.gender,
        record.location_name,
        record.location_url,
        record.origin_name,
        record.origin_url,
        record.species,
        record.status,
        record.character_type,
        record.url,
      ],
    )
  }
}

impl CharacterStore for SqliteStore {
  fn all(&self) -> Result<Vec<CharacterRecord>, StoreError> {
    let conn = self.conn()?;
    Self::query_records(&conn, &format!("{} ORDER BY id", SELECT_COLUMNS), [])
  }

  fn by_id(&self, id: CharacterId) -> Result<Option<CharacterRecord>, StoreError> {
    let conn = self.conn()?;
    let record = conn
      .query_row(
        &format!("{} WHERE id = ?1", SELECT_COLUMNS),
        params![id],
        CharacterRecord::from_row,
      )
      .optional()?;
    Ok(record)
  }

  fn favorites(&self) -> Result<Vec<CharacterRecord>, StoreError> {
    let conn = self.conn()?;
    Self::query_records(
      &conn,
      &format!("{} WHERE is_favorite = 1 ORDER BY id", SELECT_COLUMNS),
      [],
    )
  }

  fn upsert_all(&self, records: &[CharacterRecord]) -> Result<(), StoreError> {
    let mut conn = self.conn()?;
    let tx = conn.transaction()?;
    for record in records {
      Self::upsert_with(&tx, record)?;
    }
    tx.commit()?;
    Ok(())
  }

  fn upsert(&self, record: &CharacterRecord) -> Result<(), StoreError> {
    let conn = self.conn()?;
    Self::upsert_with(&conn, record)?;
    Ok(())
  }

  fn set_favorite(&self, id: CharacterId, is_favorite: bool) -> Result<(), StoreError> {
    let conn = self.conn()?;
    let updated = conn.execute(
      "UPDATE characters SET is_favorite = ?1 WHERE id = ?2",
      params![is_favorite, id],
    )?;
    if updated == 0 {
      debug!(id, "favorite change for uncached character ignored");
    }
    Ok(())
  }

  fn clear(&self) -> Result<(), StoreError> {
    let conn = self.conn()?;
    conn.execute("DELETE FROM characters", [])?;
    Ok(())
  }
}
