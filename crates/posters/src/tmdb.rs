//! TMDB client for poster lookups.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, error, warn};

use crate::{ERROR_POSTER_URL, NO_POSTER_URL, PosterError, PosterResolver, poster_url};

/// Settings for talking to TMDB
#[derive(Clone)]
pub struct TmdbConfig {
    pub api_key: String,
    /// API root, without a trailing `/movie`
    pub api_url: String,
    /// Language tag sent with every request
    pub language: String,
    /// Upper bound for one whole request, connect included
    pub timeout: Duration,
}

impl TmdbConfig {
    pub const DEFAULT_API_URL: &'static str = "https://api.themoviedb.org/3";
    pub const DEFAULT_LANGUAGE: &'static str = "en-US";
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            api_url: Self::DEFAULT_API_URL.to_string(),
            language: Self::DEFAULT_LANGUAGE.to_string(),
            timeout: Self::DEFAULT_TIMEOUT,
        }
    }

    /// Point at a different API root (default: `https://api.themoviedb.org/3`)
    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }

    /// Configure the response language (default: `en-US`)
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    /// Configure the request timeout (default: 5s)
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

// Keep the key out of debug output
impl fmt::Debug for TmdbConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TmdbConfig")
            .field("api_key", &"<redacted>")
            .field("api_url", &self.api_url)
            .field("language", &self.language)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// The slice of TMDB's movie details we care about
#[derive(Debug, Deserialize)]
struct MovieDetails {
    poster_path: Option<String>,
}

/// Poster resolver backed by the TMDB `/movie/{id}` endpoint
#[derive(Debug, Clone)]
pub struct TmdbClient {
    http: Client,
    config: TmdbConfig,
}

impl TmdbClient {
    pub fn new(config: TmdbConfig) -> Result<Self, PosterError> {
        let http = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { http, config })
    }

    /// Look up the poster path of one movie.
    ///
    /// `Ok(None)` means TMDB answered but has no poster (missing, null or
    /// empty `poster_path`). Non-2xx statuses, transport failures, timeouts
    /// and undecodable bodies are errors.
    pub async fn fetch_poster_path(&self, movie_id: u32) -> Result<Option<String>, PosterError> {
        let url = format!(
            "{}/movie/{}",
            self.config.api_url.trim_end_matches('/'),
            movie_id
        );
        debug!("Fetching poster for movie {}", movie_id);

        let response = self
            .http
            .get(&url)
            .query(&[
                ("api_key", self.config.api_key.as_str()),
                ("language", self.config.language.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            warn!("TMDB returned {} for movie {}", status, movie_id);
            return Err(PosterError::Status {
                movie_id,
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await?;
        let details: MovieDetails = serde_json::from_slice(&body)
            .map_err(|source| PosterError::Decode { movie_id, source })?;

        Ok(details.poster_path.filter(|path| !path.trim().is_empty()))
    }
}

#[async_trait]
impl PosterResolver for TmdbClient {
    async fn resolve_poster(&self, movie_id: u32) -> String {
        match self.fetch_poster_path(movie_id).await {
            Ok(Some(path)) => poster_url(&path),
            Ok(None) => NO_POSTER_URL.to_string(),
            Err(e) => {
                error!(movie_id, error = %e, "Error fetching poster");
                ERROR_POSTER_URL.to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::{Path, Query};
    use axum::http::StatusCode;
    use axum::response::{IntoResponse, Response};
    use axum::routing::get;
    use axum::{Json, Router};
    use serde_json::json;
    use std::collections::HashMap;
    use tokio::net::TcpListener;

    // ============================================================================
    // Mock TMDB Service
    // ============================================================================

    /// Canned answers keyed by movie id
    async fn movie_details(
        Path(id): Path<u32>,
        Query(params): Query<HashMap<String, String>>,
    ) -> Response {
        if params.get("api_key").map(String::as_str) != Some("test-key") {
            return StatusCode::UNAUTHORIZED.into_response();
        }
        if params.get("language").map(String::as_str) != Some("en-US") {
            return StatusCode::BAD_REQUEST.into_response();
        }

        match id {
            1 => Json(json!({ "id": 1, "poster_path": "/one.jpg" })).into_response(),
            2 => Json(json!({ "id": 2, "poster_path": null })).into_response(),
            3 => Json(json!({ "id": 3, "title": "No poster field" })).into_response(),
            4 => (StatusCode::NOT_FOUND, Json(json!({ "status_code": 34 }))).into_response(),
            5 => "<html>definitely not json</html>".into_response(),
            6 => {
                tokio::time::sleep(Duration::from_secs(2)).await;
                Json(json!({ "poster_path": "/slow.jpg" })).into_response()
            }
            7 => Json(json!({ "poster_path": "" })).into_response(),
            _ => StatusCode::NOT_FOUND.into_response(),
        }
    }

    /// Start a mock TMDB API on a random port
    async fn start_mock_tmdb() -> (String, tokio::task::JoinHandle<()>) {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind mock TMDB");
        let addr = listener.local_addr().expect("Failed to get local address");

        let app = Router::new().route("/3/movie/:id", get(movie_details));
        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.expect("Mock TMDB failed");
        });

        (format!("http://{}/3", addr), handle)
    }

    fn client_for(api_url: &str) -> TmdbClient {
        let config = TmdbConfig::new("test-key")
            .with_api_url(api_url)
            .with_timeout(Duration::from_millis(300));
        TmdbClient::new(config).expect("Failed to build client")
    }

    // ============================================================================
    // Tests
    // ============================================================================

    #[test]
    fn test_config_defaults_and_redaction() {
        let config = TmdbConfig::new("secret");
        assert_eq!(config.api_url, "https://api.themoviedb.org/3");
        assert_eq!(config.language, "en-US");
        assert_eq!(config.timeout, Duration::from_secs(5));

        let debug = format!("{:?}", config);
        assert!(!debug.contains("secret"));
    }

    #[tokio::test]
    async fn test_resolves_poster_url() {
        let (addr, handle) = start_mock_tmdb().await;
        let client = client_for(&addr);

        assert_eq!(
            client.resolve_poster(1).await,
            "https://image.tmdb.org/t/p/w500/one.jpg"
        );

        handle.abort();
    }

    #[tokio::test]
    async fn test_missing_poster_uses_no_poster_placeholder() {
        let (addr, handle) = start_mock_tmdb().await;
        let client = client_for(&addr);

        assert_eq!(client.resolve_poster(2).await, NO_POSTER_URL);
        assert_eq!(client.resolve_poster(3).await, NO_POSTER_URL);
        assert_eq!(client.resolve_poster(7).await, NO_POSTER_URL);

        handle.abort();
    }

    #[tokio::test]
    async fn test_failures_use_error_placeholder() {
        let (addr, handle) = start_mock_tmdb().await;
        let client = client_for(&addr);

        // 404, malformed body, timeout
        for movie_id in [4, 5, 6] {
            let url = client.resolve_poster(movie_id).await;
            assert_eq!(url, ERROR_POSTER_URL, "movie {}", movie_id);
        }

        handle.abort();
    }

    #[tokio::test]
    async fn test_fetch_poster_path_reports_error_kinds() {
        let (addr, handle) = start_mock_tmdb().await;
        let client = client_for(&addr);

        assert!(matches!(
            client.fetch_poster_path(4).await,
            Err(PosterError::Status { movie_id: 4, status: 404 })
        ));
        assert!(matches!(
            client.fetch_poster_path(5).await,
            Err(PosterError::Decode { movie_id: 5, .. })
        ));
        assert!(matches!(
            client.fetch_poster_path(6).await,
            Err(PosterError::Http(_))
        ));
        assert_eq!(client.fetch_poster_path(2).await.unwrap(), None);

        handle.abort();
    }

    #[tokio::test]
    async fn test_sends_api_key_and_language() {
        let (addr, handle) = start_mock_tmdb().await;

        let wrong_key = TmdbClient::new(TmdbConfig::new("other-key").with_api_url(&addr)).unwrap();
        assert!(matches!(
            wrong_key.fetch_poster_path(1).await,
            Err(PosterError::Status { status: 401, .. })
        ));

        let wrong_language = TmdbClient::new(
            TmdbConfig::new("test-key")
                .with_api_url(format!("{}/", addr))
                .with_language("fr-FR"),
        )
        .unwrap();
        assert!(matches!(
            wrong_language.fetch_poster_path(1).await,
            Err(PosterError::Status { status: 400, .. })
        ));

        handle.abort();
    }

    #[tokio::test]
    async fn test_unreachable_service_uses_error_placeholder() {
        // Grab a free port, then close it so nothing is listening
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = client_for(&format!("http://{}/3", addr));
        let url = client.resolve_poster(1).await;
        assert_eq!(url, ERROR_POSTER_URL);
        assert!(!url.is_empty());
    }
}
