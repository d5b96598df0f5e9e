//! # Recommendation Orchestrator
//!
//! Answers "which movies are most like this title?":
//! 1. Look up the title's catalog row
//! 2. Rank every other row by precomputed similarity (pure, no I/O)
//! 3. Resolve a poster URL for each ranked movie, in parallel
//! 4. Return names and posters in ranking order
//!
//! Poster lookups go through the [`PosterResolver`] trait, which never fails,
//! so the only error a query can produce is an unknown title.

use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use thiserror::Error;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, error, info};

use data_loader::{MovieId, SimilarityStore};
use posters::{ERROR_POSTER_URL, PosterResolver};
use sources::{DEFAULT_LIMIT, SimilaritySource};

/// Errors a recommendation query can return
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RecommendError {
    /// No catalog entry has exactly this title (case-sensitive)
    #[error("Movie '{0}' not found in catalog")]
    TitleNotFound(String),
}

/// A ranked movie before any poster lookup
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedMovie {
    pub row: usize,
    pub movie_id: MovieId,
    pub title: String,
    pub score: f64,
}

/// Final recommendation returned to the user
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MovieRecommendation {
    pub movie_id: MovieId,
    pub title: String,
    pub score: f64,
    pub poster_url: String,
}

/// Result of one query, best match first
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recommendations {
    /// The title that was asked about
    pub query: String,
    pub items: Vec<MovieRecommendation>,
}

impl Recommendations {
    /// Recommended titles in ranking order
    pub fn names(&self) -> Vec<&str> {
        self.items.iter().map(|item| item.title.as_str()).collect()
    }

    /// Poster URLs, parallel to [`Recommendations::names`]
    pub fn poster_urls(&self) -> Vec<&str> {
        self.items.iter().map(|item| item.poster_url.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Main orchestrator that ties the store, the ranking and the posters together
#[derive(Clone)]
pub struct RecommendationOrchestrator {
    store: Arc<SimilarityStore>,
    source: SimilaritySource,
    resolver: Arc<dyn PosterResolver>,
    limit: usize,
    max_concurrent_fetches: usize,
}

impl RecommendationOrchestrator {
    /// Poster requests allowed in flight at once unless configured otherwise
    pub const DEFAULT_CONCURRENCY: usize = 8;

    /// Create an orchestrator over a loaded store.
    ///
    /// # Arguments
    /// * `store` - Shared, read-only catalog and similarity matrix
    /// * `resolver` - Where poster URLs come from (TMDB in production)
    pub fn new(store: Arc<SimilarityStore>, resolver: Arc<dyn PosterResolver>) -> Self {
        let source = SimilaritySource::new(store.clone());
        Self {
            store,
            source,
            resolver,
            limit: DEFAULT_LIMIT,
            max_concurrent_fetches: Self::DEFAULT_CONCURRENCY,
        }
    }

    /// Configure how many movies a query returns (default: 29)
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    /// Configure how many poster requests may run at once (default: 8, min: 1)
    pub fn with_max_concurrent_fetches(mut self, max: usize) -> Self {
        self.max_concurrent_fetches = max.max(1);
        self
    }

    pub fn store(&self) -> &Arc<SimilarityStore> {
        &self.store
    }

    /// Rank the movies most similar to `title` without touching the network.
    ///
    /// Deterministic: the same title against the same store always yields the
    /// same order.
    pub fn rank(&self, title: &str) -> Result<Vec<RankedMovie>, RecommendError> {
        let row = self
            .store
            .find_title(title)
            .ok_or_else(|| RecommendError::TitleNotFound(title.to_string()))?;

        let ranked = self
            .source
            .get_candidates(row, self.limit)
            .into_iter()
            .filter_map(|candidate| {
                let movie = self.store.movie(candidate.row)?;
                Some(RankedMovie {
                    row: candidate.row,
                    movie_id: movie.id,
                    title: movie.title.clone(),
                    score: candidate.score,
                })
            })
            .collect();

        Ok(ranked)
    }

    /// Main entry point: recommendations with posters for `title`.
    ///
    /// Issues one poster request per recommended movie on every call; nothing
    /// is cached between queries.
    pub async fn recommend(&self, title: &str) -> Result<Recommendations, RecommendError> {
        let start_time = Instant::now();

        let ranked = self.rank(title)?;
        info!("Ranked {} movies similar to '{}'", ranked.len(), title);

        let poster_urls = self.resolve_posters(&ranked).await;

        let items = ranked
            .into_iter()
            .zip(poster_urls)
            .map(|(movie, poster_url)| MovieRecommendation {
                movie_id: movie.movie_id,
                title: movie.title,
                score: movie.score,
                poster_url,
            })
            .collect();

        info!(
            "Total time to recommend for '{}': {:.2?}",
            title,
            start_time.elapsed()
        );

        Ok(Recommendations {
            query: title.to_string(),
            items,
        })
    }

    /// Fetch one poster per movie with bounded parallelism.
    ///
    /// The returned URLs line up with `ranked` whatever order the requests
    /// finish in. Dropping the query aborts any lookups still running.
    async fn resolve_posters(&self, ranked: &[RankedMovie]) -> Vec<String> {
        let semaphore = Arc::new(Semaphore::new(self.max_concurrent_fetches));
        debug!(
            "Resolving {} posters, at most {} at a time",
            ranked.len(),
            self.max_concurrent_fetches
        );

        let mut tasks = JoinSet::new();
        for (index, movie) in ranked.iter().enumerate() {
            let resolver = self.resolver.clone();
            let semaphore = semaphore.clone();
            let movie_id = movie.movie_id;
            tasks.spawn(async move {
                let _permit = semaphore.acquire_owned().await.ok();
                (index, resolver.resolve_poster(movie_id).await)
            });
        }

        // A slot only stays on the error placeholder if its task died
        let mut urls = vec![ERROR_POSTER_URL.to_string(); ranked.len()];
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, url)) => urls[index] = url,
                Err(e) => error!(error = %e, "Poster task failed"),
            }
        }
        urls
    }
}
