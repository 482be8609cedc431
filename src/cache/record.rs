//! Persisted shape of a character row.

use rusqlite::Row;

use crate::model::{Character, CharacterId, LocationRef};

/// Episode urls never contain a comma, so a plain comma join round-trips.
const EPISODE_DELIMITER: &str = ",";

/// One row of the `characters` table.
///
/// Locations are flattened to `<role>_name` / `<role>_url` columns and the
/// episode list is stored as a single delimited string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CharacterRecord {
  pub id: CharacterId,
  pub name: String,
  pub image: String,
  pub created: String,
  pub episode: String,
  pub gender: String,
  pub location_name: String,
  pub location_url: String,
  pub origin_name: String,
  pub origin_url: String,
  pub species: String,
  pub status: String,
  pub character_type: String,
  pub url: String,
  pub is_favorite: bool,
}

impl CharacterRecord {
  pub fn join_episodes(episodes: &[String]) -> String {
    episodes.join(EPISODE_DELIMITER)
  }

  pub fn split_episodes(joined: &str) -> Vec<String> {
    if joined.is_empty() {
      return Vec::new();
    }
    joined.split(EPISODE_DELIMITER).map(String::from).collect()
  }

  pub(super) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id: row.get("id")?,
      name: row.get("name")?,
      image: row.get("image")?,
      created: row.get("created")?,
      episode: row.get("episode")?,
      gender: row.get("gender")?,
      location_name: row.get("location_name")?,
      location_url: row.get("location_url")?,
      origin_name: row.get("origin_name")?,
      origin_url: row.get("origin_url")?,
      species: row.get("species")?,
      status: row.get("status")?,
      character_type: row.get("type")?,
      url: row.get("url")?,
      is_favorite: row.get("is_favorite")?,
    })
  }
}

impl From<CharacterRecord> for Character {
  fn from(r: CharacterRecord) -> Self {
    Character {
      id: r.id,
      episode: CharacterRecord::split_episodes(&r.episode),
      name: r.name,
      image: r.image,
      created: r.created,
      gender: r.gender,
      origin: LocationRef {
        name: r.origin_name,
        url: r.origin_url,
      },
      location: LocationRef {
        name: r.location_name,
        url: r.location_url,
      },
      species: r.species,
      status: r.status,
      character_type: r.character_type,
      url: r.url,
      is_favorite: r.is_favorite,
    }
  }
}

impl From<&Character> for CharacterRecord {
  fn from(c: &Character) -> Self {
    CharacterRecord {
      id: c.id,
      name: c.name.clone(),
      image: c.image.clone(),
      created: c.created.clone(),
      episode: CharacterRecord::join_episodes(&c.episode),
      gender: c.gender.clone(),
      location_name: c.location.name.clone(),
      location_url: c.location.url.clone(),
      origin_name: c.origin.name.clone(),
      origin_url: c.origin.url.clone(),
      species: c.species.clone(),
      status: c.status.clone(),
      character_type: c.character_type.clone(),
      url: c.url.clone(),
      is_favorite: c.is_favorite,
    }
  }
}
