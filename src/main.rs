mod api;
mod cache;
mod config;
mod logging;
mod model;
mod query;
mod render;
mod repository;
mod use_cases;

use clap::{Parser, Subcommand};
use color_eyre::{eyre::eyre, Result};
use std::future::Future;
use std::io::IsTerminal;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{error, info};

use api::RickAndMortyClient;
use cache::SqliteStore;
use config::Config;
use model::CharacterId;
use query::Query;
use repository::CachedCharacterRepository;
use use_cases::{Outcome, UseCases};

#[derive(Parser, Debug)]
#[command(name = "mortdex")]
#[command(about = "Browse Rick and Morty characters, cached for offline use")]
#[command(version)]
struct Args {
  /// Path to config file (default: $XDG_CONFIG_HOME/mortdex/config.yaml)
  #[arg(short, long, global = true)]
  config: Option<PathBuf>,

  /// API base url, e.g. https://rickandmortyapi.com/api/
  #[arg(long, global = true)]
  base_url: Option<String>,

  /// Cache database file
  #[arg(long, global = true)]
  database: Option<PathBuf>,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// List characters, from the cache when it has any
  #[command(alias = "ls")]
  List {
    /// Fetch from the API even if the cache is populated
    #[arg(short, long)]
    refresh: bool,
  },
  /// Show one character
  Show { id: CharacterId },
  /// List favorite characters
  #[command(alias = "favs")]
  Favorites,
  /// Mark a character as favorite
  Favorite { id: CharacterId },
  /// Remove a character from favorites
  Unfavorite { id: CharacterId },
  /// Flip the favorite flag of a character
  Toggle { id: CharacterId },
  /// Delete every cached character, favorites included
  ClearCache,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
  color_eyre::install()?;

  let args = Args::parse();

  let mut config = Config::load(args.config.as_deref())?;
  if let Some(base_url) = args.base_url {
    config.api.base_url = base_url;
  }
  if let Some(database) = args.database {
    config.database_path = Some(database);
  }

  let _log_guard = logging::init(&config)?;

  let use_cases = build(&config)?;
  run(args.command, use_cases).await
}

/// Wire the HTTP client and cache into the repository behind the use cases.
fn build(config: &Config) -> Result<UseCases> {
  let api = RickAndMortyClient::new(&config.api)?;

  let database_path = config.database_path()?;
  let store = SqliteStore::open(&database_path)
    .map_err(|e| eyre!("Failed to open cache {}: {}", database_path.display(), e))?;
  info!(base_url = %config.api.base_url, database = %database_path.display(), "starting");

  let repository = CachedCharacterRepository::new(api, store);
  Ok(UseCases::new(Arc::new(repository)))
}

async fn run(command: Command, use_cases: UseCases) -> Result<ExitCode> {
  match command {
    Command::List { refresh } => {
      // The first load is cache-first; a refetch forces the network
      let force = Arc::new(AtomicBool::new(false));
      let flag = force.clone();
      let mut query = build_query(use_cases, move |uc| {
        let force_refresh = flag.load(Ordering::SeqCst);
        async move { uc.get_all_characters(force_refresh).await }
      });
      if refresh {
        force.store(true, Ordering::SeqCst);
        query.refetch();
      } else {
        query.activate();
      }
      wait(&mut query).await;
      Ok(present(&query, |characters| {
        render::character_list(characters, "No characters found")
      }))
    }
    Command::Show { id } => {
      let mut query = build_query(use_cases, move |uc| async move { uc.get_character(id).await });
      query.activate();
      wait(&mut query).await;
      Ok(present(&query, render::character_detail))
    }
    Command::Favorites => {
      let mut query =
        build_query(use_cases, |uc| async move { uc.get_favorite_characters().await });
      query.activate();
      wait(&mut query).await;
      Ok(present(&query, |characters| {
        render::character_list(characters, "No favorites yet")
      }))
    }
    Command::Favorite { id } => {
      let character = use_cases.set_favorite(id, true).await?;
      println!("Added #{} {} to favorites", character.id, character.name);
      Ok(ExitCode::SUCCESS)
    }
    Command::Unfavorite { id } => {
      let character = use_cases.set_favorite(id, false).await?;
      println!("Removed #{} {} from favorites", character.id, character.name);
      Ok(ExitCode::SUCCESS)
    }
    Command::Toggle { id } => {
      let character = use_cases.get_character(id).await?;
      let character = use_cases.toggle_favorite(&character).await?;
      print!("{}", render::character_detail(&character));
      Ok(ExitCode::SUCCESS)
    }
    Command::ClearCache => {
      use_cases.clear_cache().await?;
      println!("Cache cleared");
      Ok(ExitCode::SUCCESS)
    }
  }
}

/// Wrap a use case in an idle query.
fn build_query<T, F, Fut>(use_cases: UseCases, op: F) -> Query<T>
where
  T: Send + 'static,
  F: Fn(UseCases) -> Fut + Send + Sync + 'static,
  Fut: Future<Output = Outcome<T>> + Send + 'static,
{
  Query::new(move || {
    let fut = op(use_cases.clone());
    async move { fut.await.map_err(|e| e.to_string()) }
  })
}

/// Wait for a started query, announcing the wait on an interactive stderr.
async fn wait<T: Send + 'static>(query: &mut Query<T>) {
  if !query.poll() && std::io::stderr().is_terminal() {
    eprint!("{}", render::query_state(query.state(), |_| String::new()));
  }
  query.settle().await;
}

/// Print a settled query. Errors go to stderr and fail the process.
fn present<T>(query: &Query<T>, view: impl Fn(&T) -> String) -> ExitCode {
  if let Some(message) = query.error() {
    error!(error = message, "command failed");
    eprint!("{}", render::query_state(query.state(), view));
    return ExitCode::FAILURE;
  }
  if let Some(data) = query.data() {
    print!("{}", view(data));
  }
  ExitCode::SUCCESS
}
