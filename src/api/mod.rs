//! Rick and Morty REST API access.
//!
//! The client only knows how to issue requests and decode wire records; it
//! never touches the local cache.

mod client;
mod error;
mod types;

pub use client::{CharacterApi, RickAndMortyClient};
pub use error::TransportError;

// Wire types are only named outside this module by test doubles.
#[cfg(test)]
pub use types::{ApiCharacter, ApiLocation, CharactersPage, PageInfo};
