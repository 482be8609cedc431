//! Serde-deserializable types matching Rick and Morty API responses.
//!
//! These types are separate from domain types so the wire format can drift
//! without touching the rest of the application. Decoding is lenient: unknown
//! fields are ignored, missing fields take their default and explicit `null`
//! values are coerced to the default as well.

use serde::{Deserialize, Deserializer};

use crate::cache::CharacterRecord;
use crate::model::{Character, CharacterId, LocationRef};

/// Treat an explicit `null` the same as a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
  D: Deserializer<'de>,
  T: Default + Deserialize<'de>,
{
  Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

// ============================================================================
// Character endpoint types
// ============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ApiLocation {
  #[serde(deserialize_with = "null_as_default")]
  pub name: String,
  #[serde(deserialize_with = "null_as_default")]
  pub url: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ApiCharacter {
  #[serde(deserialize_with = "null_as_default")]
  pub id: CharacterId,
  #[serde(deserialize_with = "null_as_default")]
  pub name: String,
  #[serde(deserialize_with = "null_as_default")]
  pub status: String,
  #[serde(deserialize_with = "null_as_default")]
  pub species: String,
  #[serde(rename = "type", deserialize_with = "null_as_default")]
  pub character_type: String,
  #[serde(deserialize_with = "null_as_default")]
  pub gender: String,
  #[serde(deserialize_with = "null_as_default")]
  pub origin: ApiLocation,
  #[serde(deserialize_with = "null_as_default")]
  pub location: ApiLocation,
  #[serde(deserialize_with = "null_as_default")]
  pub image: String,
  #[serde(deserialize_with = "null_as_default")]
  pub episode: Vec<String>,
  #[serde(deserialize_with = "null_as_default")]
  pub url: String,
  #[serde(deserialize_with = "null_as_default")]
  pub created: String,
}

// ============================================================================
// Collection endpoint envelope
// ============================================================================

/// Pagination metadata. Only the first page is ever consumed.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PageInfo {
  #[serde(deserialize_with = "null_as_default")]
  pub count: u32,
  #[serde(deserialize_with = "null_as_default")]
  pub pages: u32,
  pub next: Option<String>,
  pub prev: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CharactersPage {
  #[serde(deserialize_with = "null_as_default")]
  pub info: PageInfo,
  #[serde(deserialize_with = "null_as_default")]
  pub results: Vec<ApiCharacter>,
}

// ============================================================================
// Conversions to domain and persisted types
// ============================================================================

impl From<ApiLocation> for LocationRef {
  fn from(location: ApiLocation) -> Self {
    LocationRef {
      name: location.name,
      url: location.url,
    }
  }
}

impl From<ApiCharacter> for Character {
  fn from(c: ApiCharacter) -> Self {
    Character {
      id: c.id,
      name: c.name,
      image: c.image,
      created: c.created,
      episode: c.episode,
      gender: c.gender,
      origin: c.origin.into(),
      location: c.location.into(),
      species: c.species,
      status: c.status,
      character_type: c.character_type,
      url: c.url,
      is_favorite: false,
    }
  }
}

impl From<&ApiCharacter> for CharacterRecord {
  fn from(c: &ApiCharacter) -> Self {
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
      is_favorite: false,
    }
  }
}
