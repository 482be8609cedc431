//! Async query abstraction for screen state.
//!
//! A `Query<T>` owns a fetcher closure and the loading/success/error state of
//! the last run. Loading starts only when the consumer calls `activate()`;
//! later activations are no-ops, and `refetch()` forces a reload.
//!
//! # Example
//!
//! ```ignore
//! let use_cases = use_cases.clone();
//! let mut query = Query::new(move || {
//!     let use_cases = use_cases.clone();
//!     async move {
//!         use_cases
//!             .get_all_characters(false)
//!             .await
//!             .map_err(|e| e.to_string())
//!     }
//! });
//!
//! query.activate();
//! query.settle().await;
//!
//! match query.state() {
//!     QueryState::Loading => render_spinner(),
//!     QueryState::Success(data) => render_data(data),
//!     QueryState::Error(e) => render_error(e),
//!     QueryState::Idle => {}
//! }
//! ```

use std::future::Future;
use std::pin::Pin;
use tokio::sync::mpsc;

/// The state of a query
#[derive(Debug, Clone)]
pub enum QueryState<T> {
  /// Query has not been activated
  Idle,
  /// Query is currently fetching data
  Loading,
  /// Query completed successfully
  Success(T),
  /// Query failed; any previous data is gone
  Error(String),
}

impl<T> QueryState<T> {
  pub fn data(&self) -> Option<&T> {
    match self {
      QueryState::Success(data) => Some(data),
      _ => None,
    }
  }

  pub fn error(&self) -> Option<&str> {
    match self {
      QueryState::Error(e) => Some(e),
      _ => None,
    }
  }
}

/// A boxed future that returns a Result<T, String>
type BoxFuture<T> = Pin<Box<dyn Future<Output = Result<T, String>> + Send>>;

/// A factory function that creates futures for fetching data
type FetcherFn<T> = Box<dyn Fn() -> BoxFuture<T> + Send + Sync>;

pub struct Query<T> {
  state: QueryState<T>,
  fetcher: FetcherFn<T>,
  receiver: Option<mpsc::UnboundedReceiver<Result<T, String>>>,
  activated: bool,
}

impl<T> Query<T> {
  pub fn state(&self) -> &QueryState<T> {
    &self.state
  }

  pub fn data(&self) -> Option<&T> {
    self.state.data()
  }

  pub fn error(&self) -> Option<&str> {
    self.state.error()
  }
}

impl<T: Send + 'static> Query<T> {
  /// Create an idle query around `fetcher`, which runs once per load.
  pub fn new<F, Fut>(fetcher: F) -> Self
  where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, String>> + Send + 'static,
  {
    Self {
      state: QueryState::Idle,
      fetcher: Box::new(move || Box::pin(fetcher())),
      receiver: None,
      activated: false,
    }
  }

  /// Start the initial load the first time the query gets a consumer.
  ///
  /// Returns `true` if this call started loading.
  pub fn activate(&mut self) -> bool {
    if self.activated {
      return false;
    }
    self.activated = true;
    self.start_fetch();
    true
  }

  /// Force a reload, dropping any fetch still in flight.
  pub fn refetch(&mut self) {
    self.activated = true;
    self.receiver = None;
    self.start_fetch();
  }

  /// Apply a finished fetch without blocking.
  ///
  /// Returns `true` if the state changed.
  pub fn poll(&mut self) -> bool {
    let receiver = match &mut self.receiver {
      Some(rx) => rx,
      None => return false,
    };

    match receiver.try_recv() {
      Ok(result) => self.apply(Some(result)),
      Err(mpsc::error::TryRecvError::Empty) => false,
      Err(mpsc::error::TryRecvError::Disconnected) => self.apply(None),
    }
  }

  /// Wait for the in-flight fetch, if any, and apply its result.
  pub async fn settle(&mut self) -> bool {
    let result = match &mut self.receiver {
      Some(rx) => rx.recv().await,
      None => return false,
    };
    self.apply(result)
  }

  fn apply(&mut self, result: Option<Result<T, String>>) -> bool {
    self.receiver = None;
    self.state = match result {
      Some(Ok(data)) => QueryState::Success(data),
      Some(Err(error)) => QueryState::Error(error),
      // Sender dropped without sending
      None => QueryState::Error("Query was cancelled".to_string()),
    };
    true
  }

  fn start_fetch(&mut self) {
    let (tx, rx) = mpsc::unbounded_channel();
    self.receiver = Some(rx);
    self.state = QueryState::Loading;

    let future = (self.fetcher)();
    tokio::spawn(async move {
      // Receiver may have been dropped by a refetch
      let _ = tx.send(future.await);
    });
  }
}

impl<T: std::fmt::Debug> std::fmt::Debug for Query<T> {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Query")
      .field("state", &self.state)
      .field("activated", &self.activated)
      .finish_non_exhaustive()
  }
}
