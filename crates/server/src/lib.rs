//! Server crate for the movie recommender.
//!
//! This crate contains the orchestrator that answers a recommendation query
//! by ranking the catalog and resolving posters.

pub mod orchestrator;

pub use orchestrator::{
    MovieRecommendation, RankedMovie, RecommendError, RecommendationOrchestrator,
    Recommendations,
};
