//! Classified transport failures.
//!
//! Non-2xx responses are split by status class so callers can tell a missing
//! character (4xx) from an upstream outage (5xx). Everything that goes wrong
//! before a status is available lands in `Request`, and a body that does not
//! decode lands in `Decode`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransportError {
  /// 3xx that was not followed
  #[error("unexpected redirect {status} from {url}")]
  Redirect { status: u16, url: String },

  /// 4xx, e.g. 404 for an unknown character id
  #[error("request to {url} rejected with {status}: {body}")]
  Client {
    status: u16,
    url: String,
    body: String,
  },

  /// 5xx
  #[error("server error {status} from {url}: {body}")]
  Server {
    status: u16,
    url: String,
    body: String,
  },

  /// Any other non-success status
  #[error("unexpected status {status} from {url}")]
  UnexpectedStatus { status: u16, url: String },

  /// Connection, timeout or body read failure
  #[error("request to {url} failed: {source}")]
  Request {
    url: String,
    #[source]
    source: reqwest::Error,
  },

  #[error("failed to decode response from {url}: {source}")]
  Decode {
    url: String,
    #[source]
    source: serde_json::Error,
  },

  #[error("invalid API url: {0}")]
  InvalidUrl(#[from] url::ParseError),
}

impl TransportError {
  /// Classify a non-success HTTP status.
  pub fn from_status(status: u16, url: &str, body: String) -> Self {
    let url = url.to_string();
    match status {
      300..=399 => Self::Redirect { status, url },
      400..=499 => Self::Client { status, url, body },
      500..=599 => Self::Server { status, url, body },
      _ => Self::UnexpectedStatus { status, url },
    }
  }

  /// HTTP status carried by the error, if the server answered at all.
  pub fn status(&self) -> Option<u16> {
    match self {
      Self::Redirect { status, .. }
      | Self::Client { status, .. }
      | Self::Server { status, .. }
      | Self::UnexpectedStatus { status, .. } => Some(*status),
      Self::Request { source, .. } => source.status().map(|s| s.as_u16()),
      Self::Decode { .. } | Self::InvalidUrl(_) => None,
    }
  }

  pub fn is_not_found(&self) -> bool {
    self.status() == Some(404)
  }
}
