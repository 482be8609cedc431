//! Application-level operations invoked by the CLI.
//!
//! Each use case is a thin call into the repository that logs failures so the
//! presentation layer only has to render the outcome.

use std::sync::Arc;
use tracing::{info, warn};

use crate::model::{Character, CharacterId};
use crate::repository::{CharacterRepository, RepositoryError};

pub type Outcome<T> = Result<T, RepositoryError>;

#[derive(Clone)]
pub struct UseCases {
  repository: Arc<dyn CharacterRepository>,
}

impl UseCases {
  pub fn new(repository: Arc<dyn CharacterRepository>) -> Self {
    Self { repository }
  }

  pub async fn get_all_characters(&self, force_refresh: bool) -> Outcome<Vec<Character>> {
    self
      .repository
      .fetch_all_characters(force_refresh)
      .await
      .inspect_err(|e| warn!(force_refresh, error = %e, "failed to fetch characters"))
  }

  pub async fn get_character(&self, id: CharacterId) -> Outcome<Character> {
    self
      .repository
      .fetch_character(id)
      .await
      .inspect_err(|e| match e {
        RepositoryError::Transport(t) if t.is_not_found() => info!(id, "no such character"),
        _ => warn!(id, error = %e, "failed to fetch character"),
      })
  }

  pub async fn get_favorite_characters(&self) -> Outcome<Vec<Character>> {
    self
      .repository
      .fetch_favorite_characters()
      .await
      .inspect_err(|e| warn!(error = %e, "failed to read favorites"))
  }

  pub async fn save_favorite(&self, id: CharacterId) -> Outcome<()> {
    info!(id, "marking favorite");
    self
      .repository
      .mark_favorite(id)
      .await
      .inspect_err(|e| warn!(id, error = %e, "failed to mark favorite"))
  }

  pub async fn remove_favorite(&self, id: CharacterId) -> Outcome<()> {
    info!(id, "removing favorite");
    self
      .repository
      .unmark_favorite(id)
      .await
      .inspect_err(|e| warn!(id, error = %e, "failed to remove favorite"))
  }

  /// Flip the favorite flag of a loaded character and return its new state.
  pub async fn toggle_favorite(&self, character: &Character) -> Outcome<Character> {
    if character.is_favorite {
      self.remove_favorite(character.id).await?;
    } else {
      self.save_favorite(character.id).await?;
    }
    Ok(Character {
      is_favorite: !character.is_favorite,
      ..character.clone()
    })
  }

  /// Set the favorite flag of a character by id.
  ///
  /// The character is read through the cache first, so an id that was never
  /// listed gets a row before the flag is written.
  pub async fn set_favorite(&self, id: CharacterId, is_favorite: bool) -> Outcome<Character> {
    let character = self.get_character(id).await?;
    if character.is_favorite == is_favorite {
      return Ok(character);
    }
    self.toggle_favorite(&character).await
  }

  pub async fn clear_cache(&self) -> Outcome<()> {
    info!("clearing character cache");
    self
      .repository
      .clear_cache()
      .await
      .inspect_err(|e| warn!(error = %e, "failed to clear cache"))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::api::TransportError;
  use crate::repository::tests::{api_character, repository, FakeApi};

  fn use_cases(api: &FakeApi) -> UseCases {
    UseCases::new(Arc::new(repository(api)))
  }

  #[tokio::test]
  async fn test_get_all_characters_passes_refresh_flag() {
    let api = FakeApi::with_characters(vec![api_character(1, "Rick Sanchez")]);
    let use_cases = use_cases(&api);

    use_cases.get_all_characters(false).await.unwrap();
    use_cases.get_all_characters(false).await.unwrap();
    assert_eq!(api.calls(), 1);

    use_cases.get_all_characters(true).await.unwrap();
    assert_eq!(api.calls(), 2);
  }

  #[tokio::test]
  async fn test_failure_is_returned_unchanged() {
    let api = FakeApi::default();
    api.fail_with(500);
    let use_cases = use_cases(&api);

    let err = use_cases.get_all_characters(false).await.unwrap_err();
    assert!(matches!(
      err,
      RepositoryError::Transport(TransportError::Server { status: 500, .. })
    ));
  }

  #[tokio::test]
  async fn test_toggle_favorite_round_trip() {
    let api = FakeApi::with_characters(vec![api_character(1, "Rick Sanchez")]);
    let use_cases = use_cases(&api);

    let rick = use_cases.get_character(1).await.unwrap();
    assert!(!rick.is_favorite);

    let rick = use_cases.toggle_favorite(&rick).await.unwrap();
    assert!(rick.is_favorite);
    assert!(use_cases.get_character(1).await.unwrap().is_favorite);
    assert_eq!(use_cases.get_favorite_characters().await.unwrap().len(), 1);

    let rick = use_cases.toggle_favorite(&rick).await.unwrap();
    assert!(!rick.is_favorite);
    assert!(use_cases.get_favorite_characters().await.unwrap().is_empty());
  }

  #[tokio::test]
  async fn test_save_and_remove_favorite() {
    let api = FakeApi::with_characters(vec![
      api_character(1, "Rick Sanchez"),
      api_character(2, "Morty Smith"),
    ]);
    let use_cases = use_cases(&api);
    use_cases.get_all_characters(false).await.unwrap();

    use_cases.save_favorite(1).await.unwrap();
    use_cases.save_favorite(2).await.unwrap();
    use_cases.remove_favorite(1).await.unwrap();

    let favorites = use_cases.get_favorite_characters().await.unwrap();
    assert_eq!(favorites.len(), 1);
    assert_eq!(favorites[0].name, "Morty Smith");
  }

  #[tokio::test]
  async fn test_set_favorite_on_uncached_id_fetches_then_saves() {
    let api = FakeApi::with_characters(vec![api_character(5, "Jerry Smith")]);
    let use_cases = use_cases(&api);

    let jerry = use_cases.set_favorite(5, true).await.unwrap();

    assert!(jerry.is_favorite);
    assert_eq!(api.calls(), 1);
    let favorites = use_cases.get_favorite_characters().await.unwrap();
    assert_eq!(favorites.len(), 1);
    assert_eq!(favorites[0].name, "Jerry Smith");

    let jerry = use_cases.set_favorite(5, false).await.unwrap();
    assert!(!jerry.is_favorite);
    assert!(use_cases.get_favorite_characters().await.unwrap().is_empty());
    assert_eq!(api.calls(), 1);
  }

  #[tokio::test]
  async fn test_set_favorite_is_idempotent() {
    let api = FakeApi::with_characters(vec![api_character(1, "Rick Sanchez")]);
    let use_cases = use_cases(&api);

    use_cases.set_favorite(1, true).await.unwrap();
    let rick = use_cases.set_favorite(1, true).await.unwrap();

    assert!(rick.is_favorite);
    assert_eq!(use_cases.get_favorite_characters().await.unwrap().len(), 1);
  }

  #[tokio::test]
  async fn test_set_favorite_on_unknown_id_fails() {
    let api = FakeApi::default();
    let use_cases = use_cases(&api);

    let err = use_cases.set_favorite(404, true).await.unwrap_err();
    assert!(matches!(err, RepositoryError::Transport(ref e) if e.is_not_found()));
    assert!(use_cases.get_favorite_characters().await.unwrap().is_empty());
  }
}
