use thiserror::Error;

/// Errors from a single TMDB lookup
///
/// These never reach recommendation callers; [`crate::PosterResolver`]
/// turns them into a placeholder URL.
#[derive(Error, Debug)]
pub enum PosterError {
    /// Request could not be built, sent, or timed out.
    ///
    /// The URL is stripped before storing so the API key can't leak into logs.
    #[error("Request failed: {0}")]
    Http(reqwest::Error),

    #[error("TMDB returned status {status} for movie {movie_id}")]
    Status { movie_id: u32, status: u16 },

    #[error("Invalid response for movie {movie_id}: {source}")]
    Decode {
        movie_id: u32,
        #[source]
        source: serde_json::Error,
    },
}

impl From<reqwest::Error> for PosterError {
    fn from(e: reqwest::Error) -> Self {
        PosterError::Http(e.without_url())
    }
}
