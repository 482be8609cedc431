//! Local character cache.
//!
//! The cache is the only source of truth for favorite status:
//! - one row per character id, replaced on every successful fetch
//! - the favorite flag survives replacement and changes only via `set_favorite`
//! - nothing is evicted during normal use

mod record;
mod storage;

pub use record::CharacterRecord;
pub use storage::{CharacterStore, SqliteStore, StoreError};
