//! Text rendering of characters for the terminal.

use std::fmt::Write;

use crate::model::{Character, CharacterId};
use crate::query::QueryState;

/// Row in a character list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CharacterListItem {
  pub id: CharacterId,
  pub name: String,
  pub is_favorite: bool,
}

impl From<&Character> for CharacterListItem {
  fn from(c: &Character) -> Self {
    Self {
      id: c.id,
      name: c.name.clone(),
      is_favorite: c.is_favorite,
    }
  }
}

/// Detail card for a single character
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CharacterDetail {
  pub id: CharacterId,
  pub name: String,
  pub image: String,
  pub status: String,
  pub gender: String,
  pub species: String,
  pub origin: String,
  pub location: String,
  pub episodes: usize,
  pub is_favorite: bool,
}

impl From<&Character> for CharacterDetail {
  fn from(c: &Character) -> Self {
    Self {
      id: c.id,
      name: c.name.clone(),
      image: c.image.clone(),
      status: c.status.clone(),
      gender: c.gender.clone(),
      species: c.species.clone(),
      origin: c.origin.name.clone(),
      location: c.location.name.clone(),
      episodes: c.episode.len(),
      is_favorite: c.is_favorite,
    }
  }
}

fn favorite_marker(is_favorite: bool) -> &'static str {
  if is_favorite {
    "★"
  } else {
    " "
  }
}

/// Blank values from the API render as "unknown".
fn or_unknown(value: &str) -> &str {
  if value.is_empty() {
    "unknown"
  } else {
    value
  }
}

pub fn character_list(characters: &[Character], empty_message: &str) -> String {
  if characters.is_empty() {
    return format!("{}\n", empty_message);
  }

  let width = characters
    .iter()
    .map(|c| c.id.to_string().len())
    .max()
    .unwrap_or(1);

  let mut out = String::new();
  for item in characters.iter().map(CharacterListItem::from) {
    let _ = writeln!(
      out,
      "{} {:>width$}  {}",
      favorite_marker(item.is_favorite),
      item.id,
      item.name,
      width = width
    );
  }
  out
}

pub fn character_detail(character: &Character) -> String {
  let detail = CharacterDetail::from(character);
  let mut out = String::new();
  let _ = writeln!(
    out,
    "{} #{} {}",
    favorite_marker(detail.is_favorite),
    detail.id,
    detail.name
  );
  let rows = [
    ("Status", detail.status.as_str()),
    ("Species", detail.species.as_str()),
    ("Gender", detail.gender.as_str()),
    ("Origin", detail.origin.as_str()),
    ("Location", detail.location.as_str()),
    ("Image", detail.image.as_str()),
  ];
  for (label, value) in rows {
    let _ = writeln!(out, "  {:<9} {}", format!("{}:", label), or_unknown(value));
  }
  let _ = writeln!(out, "  {:<9} {}", "Episodes:", detail.episodes);
  out
}

/// Render a settled query: loading indicator, error indicator, or the data.
pub fn query_state<T>(state: &QueryState<T>, render: impl Fn(&T) -> String) -> String {
  match state {
    QueryState::Idle => String::new(),
    QueryState::Loading => "Loading...\n".to_string(),
    QueryState::Success(data) => render(data),
    QueryState::Error(e) => format!("Error: {}\n", e),
  }
}
