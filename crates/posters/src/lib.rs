//! Poster lookup against the TMDB metadata service.
//!
//! This crate resolves a movie id to a displayable poster URL. It handles:
//! - Building authenticated requests to the TMDB `/movie/{id}` endpoint
//! - A bounded per-request timeout
//! - Falling back to placeholder images when there is no poster or the
//!   request fails
//!
//! Poster resolution never fails from the caller's point of view: the
//! [`PosterResolver`] trait returns a URL string in every case and failures
//! are logged here.

use async_trait::async_trait;

pub mod error;
pub mod tmdb;

pub use error::PosterError;
pub use tmdb::{TmdbClient, TmdbConfig};

/// Base URL for poster images at the w500 size
pub const IMAGE_BASE_URL: &str = "https://image.tmdb.org/t/p/w500";

/// Shown when TMDB has no poster for the movie
pub const NO_POSTER_URL: &str = "https://via.placeholder.com/500x750?text=No+Poster";

/// Shown when the poster lookup itself failed
pub const ERROR_POSTER_URL: &str = "https://via.placeholder.com/500x750?text=Error";

/// Anything that can turn a movie id into a poster URL.
///
/// Implementations must always return a usable URL and never panic; the
/// recommendation query relies on this to degrade per movie instead of
/// failing the whole result.
#[async_trait]
pub trait PosterResolver: Send + Sync {
    async fn resolve_poster(&self, movie_id: u32) -> String;
}

/// Resolver that never touches the network and always answers
/// [`NO_POSTER_URL`]; for offline runs
#[derive(Debug, Clone, Copy, Default)]
pub struct PlaceholderResolver;

#[async_trait]
impl PosterResolver for PlaceholderResolver {
    async fn resolve_poster(&self, _movie_id: u32) -> String {
        NO_POSTER_URL.to_string()
    }
}

/// Full image URL for a TMDB `poster_path` such as `/kqjL17yufvn9OVLyXYpvtyrFfak.jpg`
pub fn poster_url(poster_path: &str) -> String {
    format!("{}/{}", IMAGE_BASE_URL, poster_path.trim_start_matches('/'))
}
