/// Upstream-assigned character identifier
pub type CharacterId = u32;

/// A named place a character is associated with (origin or last known location)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocationRef {
  pub name: String,
  pub url: String,
}

/// Character as seen by the rest of the application
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Character {
  pub id: CharacterId,
  pub name: String,
  pub image: String,
  /// Creation timestamp as sent by the API, kept verbatim
  pub created: String,
  pub episode: Vec<String>,
  pub gender: String,
  pub origin: LocationRef,
  pub location: LocationRef,
  pub species: String,
  pub status: String,
  pub character_type: String,
  pub url: String,
  /// Local-only state, never sent by the API
  pub is_favorite: bool,
}
