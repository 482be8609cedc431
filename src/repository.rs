//! Cache-first character repository.
//!
//! The local store is consulted before the network:
//! - the full list is served from cache unless a refresh is forced or the
//!   cache is empty
//! - a single character is fetched only on a cache miss
//! - every successful fetch is written back before it is returned
//! - favorites live only in the cache

use async_trait::async_trait;
use std::collections::HashSet;
use thiserror::Error;
use tracing::{debug, info};

use crate::api::{CharacterApi, TransportError};
use crate::cache::{CharacterRecord, CharacterStore, StoreError};
use crate::model::{Character, CharacterId};

/// Failure of a repository operation, carrying the original cause.
#[derive(Debug, Error)]
pub enum RepositoryError {
  #[error(transparent)]
  Transport(#[from] TransportError),

  #[error(transparent)]
  Store(#[from] StoreError),
}

/// Single access point for character data.
#[async_trait]
pub trait CharacterRepository: Send + Sync {
  async fn fetch_all_characters(
    &self,
    force_refresh: bool,
  ) -> Result<Vec<Character>, RepositoryError>;

  async fn fetch_character(&self, id: CharacterId) -> Result<Character, RepositoryError>;

  async fn fetch_favorite_characters(&self) -> Result<Vec<Character>, RepositoryError>;

  async fn mark_favorite(&self, id: CharacterId) -> Result<(), RepositoryError>;

  async fn unmark_favorite(&self, id: CharacterId) -> Result<(), RepositoryError>;

  /// Drop every cached character, favorites included.
  async fn clear_cache(&self) -> Result<(), RepositoryError>;
}

/// Repository backed by a character store and the remote API.
///
/// There is no coordination between concurrent callers: two callers racing on
/// an empty cache both hit the network and both upsert the same rows.
pub struct CachedCharacterRepository<A: CharacterApi, S: CharacterStore> {
  api: A,
  store: S,
}

impl<A: CharacterApi, S: CharacterStore> CachedCharacterRepository<A, S> {
  pub fn new(api: A, store: S) -> Self {
    Self { api, store }
  }

  fn favorite_ids(&self) -> Result<HashSet<CharacterId>, StoreError> {
    Ok(self.store.favorites()?.into_iter().map(|r| r.id).collect())
  }
}

#[async_trait]
impl<A: CharacterApi, S: CharacterStore> CharacterRepository for CachedCharacterRepository<A, S> {
  async fn fetch_all_characters(
    &self,
    force_refresh: bool,
  ) -> Result<Vec<Character>, RepositoryError> {
    let cached = self.store.all()?;

    // An empty cache is never a valid answer, whatever the caller asked for.
    if !force_refresh && !cached.is_empty() {
      debug!(count = cached.len(), "serving characters from cache");
      return Ok(cached.into_iter().map(Character::from).collect());
    }

    info!(force_refresh, cached = cached.len(), "fetching characters from API");
    let page = self.api.fetch_characters().await?;
    debug!(
      total = page.info.count,
      pages = page.info.pages,
      next = ?page.info.next,
      prev = ?page.info.prev,
      "fetched first character page"
    );

    let records: Vec<CharacterRecord> = page.results.iter().map(CharacterRecord::from).collect();
    self.store.upsert_all(&records)?;

    let favorites = self.favorite_ids()?;
    let characters = page
      .results
      .into_iter()
      .map(|c| {
        let mut character = Character::from(c);
        character.is_favorite = favorites.contains(&character.id);
        character
      })
      .collect::<Vec<_>>();

    debug!(count = characters.len(), "cached fetched characters");
    Ok(characters)
  }

  async fn fetch_character(&self, id: CharacterId) -> Result<Character, RepositoryError> {
    if let Some(cached) = self.store.by_id(id)? {
      debug!(id, "serving character from cache");
      return Ok(cached.into());
    }

    info!(id, "character not cached, fetching from API");
    let fetched = self.api.fetch_character(id).await?;
    self.store.upsert(&CharacterRecord::from(&fetched))?;

    Ok(fetched.into())
  }

  async fn fetch_favorite_characters(&self) -> Result<Vec<Character>, RepositoryError> {
    let favorites = self.store.favorites()?;
    Ok(favorites.into_iter().map(Character::from).collect())
  }

  async fn mark_favorite(&self, id: CharacterId) -> Result<(), RepositoryError> {
    self.store.set_favorite(id, true)?;
    Ok(())
  }

  async fn unmark_favorite(&self, id: CharacterId) -> Result<(), RepositoryError> {
    self.store.set_favorite(id, false)?;
    Ok(())
  }

  async fn clear_cache(&self) -> Result<(), RepositoryError> {
    self.store.clear()?;
    Ok(())
  }
}

#[cfg(test)]
pub(crate) mod tests {
  use super::*;
  use crate::api::{ApiCharacter, ApiLocation, CharactersPage, PageInfo};
  use crate::cache::SqliteStore;
  use std::sync::atomic::{AtomicUsize, Ordering};
  use std::sync::{Arc, Mutex};

  pub(crate) fn api_character(id: CharacterId, name: &str) -> ApiCharacter {
    ApiCharacter {
      id,
      name: name.to_string(),
      status: "Alive".into(),
      species: "Human".into(),
      character_type: String::new(),
      gender: "Male".into(),
      origin: ApiLocation {
        name: "Earth (C-137)".into(),
        url: "https://rickandmortyapi.com/api/location/1".into(),
      },
      location: ApiLocation {
        name: "Citadel of Ricks".into(),
        url: "https://rickandmortyapi.com/api/location/3".into(),
      },
      image: format!("https://rickandmortyapi.com/api/character/avatar/{}.jpeg", id),
      episode: vec![
        "https://rickandmortyapi.com/api/episode/1".into(),
        "https://rickandmortyapi.com/api/episode/2".into(),
      ],
      url: format!("https://rickandmortyapi.com/api/character/{}", id),
      created: "2017-11-04T18:48:46.250Z".into(),
    }
  }

  /// In-process API that records how often it was called.
  #[derive(Clone, Default)]
  pub(crate) struct FakeApi {
    characters: Arc<Mutex<Vec<ApiCharacter>>>,
    fail_with: Arc<Mutex<Option<u16>>>,
    calls: Arc<AtomicUsize>,
  }

  impl FakeApi {
    pub(crate) fn with_characters(characters: Vec<ApiCharacter>) -> Self {
      let api = Self::default();
      api.set_characters(characters);
      api
    }

    pub(crate) fn set_characters(&self, characters: Vec<ApiCharacter>) {
      *self.characters.lock().unwrap() = characters;
    }

    pub(crate) fn fail_with(&self, status: u16) {
      *self.fail_with.lock().unwrap() = Some(status);
    }

    pub(crate) fn calls(&self) -> usize {
      self.calls.load(Ordering::SeqCst)
    }

    fn check_failure(&self, url: &str) -> Result<(), TransportError> {
      match *self.fail_with.lock().unwrap() {
        Some(status) => Err(TransportError::from_status(status, url, "fake failure".into())),
        None => Ok(()),
      }
    }
  }

  #[async_trait]
  impl CharacterApi for FakeApi {
    async fn fetch_characters(&self) -> Result<CharactersPage, TransportError> {
      self.calls.fetch_add(1, Ordering::SeqCst);
      self.check_failure("fake://character")?;
      let results = self.characters.lock().unwrap().clone();
      Ok(CharactersPage {
        info: PageInfo {
          count: results.len() as u32,
          pages: 1,
          next: None,
          prev: None,
        },
        results,
      })
    }

    async fn fetch_character(&self, id: CharacterId) -> Result<ApiCharacter, TransportError> {
      self.calls.fetch_add(1, Ordering::SeqCst);
      let url = format!("fake://character/{}", id);
      self.check_failure(&url)?;
      self
        .characters
        .lock()
        .unwrap()
        .iter()
        .find(|c| c.id == id)
        .cloned()
        .ok_or_else(|| TransportError::from_status(404, &url, "Character not found".into()))
    }
  }

  pub(crate) fn repository(api: &FakeApi) -> CachedCharacterRepository<FakeApi, SqliteStore> {
    CachedCharacterRepository::new(api.clone(), SqliteStore::in_memory().unwrap())
  }

  #[tokio::test]
  async fn test_empty_cache_fetches_from_api() {
    let api = FakeApi::with_characters(vec![api_character(1, "Rick Sanchez")]);
    let repo = repository(&api);

    let characters = repo.fetch_all_characters(false).await.unwrap();

    assert_eq!(api.calls(), 1);
    assert_eq!(characters.len(), 1);
    assert_eq!(characters[0].name, "Rick Sanchez");
    assert!(!characters[0].is_favorite);

    let cached = repo.store.all().unwrap();
    assert_eq!(cached.len(), 1);
    assert_eq!(cached[0].name, "Rick Sanchez");
  }

  #[tokio::test]
  async fn test_non_empty_cache_skips_api() {
    let api = FakeApi::default();
    let repo = repository(&api);
    repo
      .store
      .upsert(&CharacterRecord::from(&api_character(1, "Rick Sanchez")))
      .unwrap();

    let characters = repo.fetch_all_characters(false).await.unwrap();

    assert_eq!(api.calls(), 0);
    assert_eq!(characters.len(), 1);
    assert_eq!(characters[0].name, "Rick Sanchez");
    assert!(!characters[0].is_favorite);
  }

  #[tokio::test]
  async fn test_force_refresh_always_hits_api_and_replaces_cache() {
    let api = FakeApi::with_characters(vec![api_character(1, "Rick Sanchez")]);
    let repo = repository(&api);
    repo.fetch_all_characters(false).await.unwrap();

    api.set_characters(vec![
      api_character(1, "Pickle Rick"),
      api_character(2, "Morty Smith"),
    ]);
    let characters = repo.fetch_all_characters(true).await.unwrap();

    assert_eq!(api.calls(), 2);
    assert_eq!(characters.len(), 2);
    assert_eq!(characters[0].name, "Pickle Rick");

    let cached = repo.fetch_all_characters(false).await.unwrap();
    assert_eq!(api.calls(), 2);
    assert_eq!(cached, characters);
  }

  #[tokio::test]
  async fn test_empty_api_result_does_not_satisfy_next_call() {
    let api = FakeApi::default();
    let repo = repository(&api);

    assert!(repo.fetch_all_characters(false).await.unwrap().is_empty());
    assert!(repo.fetch_all_characters(false).await.unwrap().is_empty());
    assert_eq!(api.calls(), 2);
  }

  #[tokio::test]
  async fn test_failed_refresh_leaves_cache_untouched() {
    let api = FakeApi::with_characters(vec![api_character(1, "Rick Sanchez")]);
    let repo = repository(&api);
    repo.fetch_all_characters(false).await.unwrap();

    api.set_characters(vec![api_character(1, "Evil Morty")]);
    api.fail_with(503);
    let err = repo.fetch_all_characters(true).await.unwrap_err();

    assert!(matches!(
      err,
      RepositoryError::Transport(TransportError::Server { status: 503, .. })
    ));
    let cached = repo.store.all().unwrap();
    assert_eq!(cached.len(), 1);
    assert_eq!(cached[0].name, "Rick Sanchez");
  }

  #[tokio::test]
  async fn test_fetch_character_reads_through_cache() {
    let api = FakeApi::with_characters(vec![api_character(3, "Summer Smith")]);
    let repo = repository(&api);

    let first = repo.fetch_character(3).await.unwrap();
    let second = repo.fetch_character(3).await.unwrap();

    assert_eq!(api.calls(), 1);
    assert_eq!(first, second);
    assert_eq!(first.name, "Summer Smith");
    assert!(repo.store.by_id(3).unwrap().is_some());
  }

  #[tokio::test]
  async fn test_fetch_character_uses_list_cache() {
    let api = FakeApi::with_characters(vec![api_character(1, "Rick Sanchez")]);
    let repo = repository(&api);
    repo.fetch_all_characters(false).await.unwrap();

    let rick = repo.fetch_character(1).await.unwrap();
    assert_eq!(rick.name, "Rick Sanchez");
    assert_eq!(api.calls(), 1);
  }

  #[tokio::test]
  async fn test_fetch_unknown_character_fails_with_not_found() {
    let api = FakeApi::default();
    let repo = repository(&api);

    let err = repo.fetch_character(9999).await.unwrap_err();
    match err {
      RepositoryError::Transport(e) => assert!(e.is_not_found()),
      other => panic!("unexpected error: {other}"),
    }
    assert!(repo.store.all().unwrap().is_empty());
  }

  #[tokio::test]
  async fn test_mark_and_unmark_favorite() {
    let api = FakeApi::with_characters(vec![
      api_character(1, "Rick Sanchez"),
      api_character(2, "Morty Smith"),
    ]);
    let repo = repository(&api);
    repo.fetch_all_characters(false).await.unwrap();

    repo.mark_favorite(2).await.unwrap();
    let favorites = repo.fetch_favorite_characters().await.unwrap();
    assert_eq!(favorites.len(), 1);
    assert_eq!(favorites[0].id, 2);
    assert!(favorites[0].is_favorite);

    repo.unmark_favorite(2).await.unwrap();
    assert!(repo.fetch_favorite_characters().await.unwrap().is_empty());
    assert_eq!(api.calls(), 1);
  }

  #[tokio::test]
  async fn test_favorite_survives_forced_refresh() {
    let api = FakeApi::with_characters(vec![api_character(1, "Rick Sanchez")]);
    let repo = repository(&api);
    repo.fetch_all_characters(false).await.unwrap();
    repo.mark_favorite(1).await.unwrap();

    let refreshed = repo.fetch_all_characters(true).await.unwrap();

    assert!(refreshed[0].is_favorite);
    assert_eq!(repo.fetch_favorite_characters().await.unwrap().len(), 1);
  }

  #[tokio::test]
  async fn test_clear_cache_forces_next_fetch() {
    let api = FakeApi::with_characters(vec![api_character(1, "Rick Sanchez")]);
    let repo = repository(&api);
    repo.fetch_all_characters(false).await.unwrap();

    repo.clear_cache().await.unwrap();
    repo.fetch_all_characters(false).await.unwrap();

    assert_eq!(api.calls(), 2);
  }
}
