use std::time::Duration;

use async_trait::async_trait;
use color_eyre::{eyre::eyre, Result};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::config::ApiConfig;
use crate::model::CharacterId;

use super::error::TransportError;
use super::types::{ApiCharacter, CharactersPage};

/// Read-only access to the character endpoints.
#[async_trait]
pub trait CharacterApi: Send + Sync {
  /// GET `{base}/character`, first page only
  async fn fetch_characters(&self) -> Result<CharactersPage, TransportError>;

  /// GET `{base}/character/{id}`
  async fn fetch_character(&self, id: CharacterId) -> Result<ApiCharacter, TransportError>;
}

/// Rick and Morty API client
#[derive(Clone)]
pub struct RickAndMortyClient {
  http: reqwest::Client,
  base_url: Url,
}

impl RickAndMortyClient {
  pub fn new(config: &ApiConfig) -> Result<Self> {
    let base_url = parse_base_url(&config.base_url)
      .map_err(|e| eyre!("Invalid API base url {}: {}", config.base_url, e))?;

    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

    let http = reqwest::Client::builder()
      .default_headers(headers)
      .user_agent(concat!("mortdex/", env!("CARGO_PKG_VERSION")))
      .timeout(Duration::from_secs(config.request_timeout_secs))
      .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
      .read_timeout(Duration::from_secs(config.read_timeout_secs))
      .build()
      .map_err(|e| eyre!("Failed to create HTTP client: {}", e))?;

    Ok(Self { http, base_url })
  }

  /// Issue a GET relative to the base url and decode the JSON body.
  async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, TransportError> {
    let url = self.base_url.join(path)?;
    let url_str = url.to_string();
    debug!(url = %url_str, "GET");

    let response = self
      .http
      .get(url)
      .send()
      .await
      .map_err(|source| TransportError::Request {
        url: url_str.clone(),
        source,
      })?;

    let status = response.status();
    let body = response
      .text()
      .await
      .map_err(|source| TransportError::Request {
        url: url_str.clone(),
        source,
      })?;

    if !status.is_success() {
      return Err(TransportError::from_status(status.as_u16(), &url_str, body));
    }

    serde_json::from_str(&body).map_err(|source| TransportError::Decode {
      url: url_str,
      source,
    })
  }
}

#[async_trait]
impl CharacterApi for RickAndMortyClient {
  async fn fetch_characters(&self) -> Result<CharactersPage, TransportError> {
    self.get_json("character").await
  }

  async fn fetch_character(&self, id: CharacterId) -> Result<ApiCharacter, TransportError> {
    self.get_json(&format!("character/{}", id)).await
  }
}

/// Parse the configured base url, making sure relative joins append to it.
fn parse_base_url(raw: &str) -> Result<Url, url::ParseError> {
  let mut url = Url::parse(raw)?;
  if !url.path().ends_with('/') {
    let path = format!("{}/", url.path());
    url.set_path(&path);
  }
  Ok(url)
}
