//! Item-item movie recommendation over a precomputed similarity snapshot.
//!
//! This crate provides:
//! - Filter trait and implementations for candidate filtering
//! - FilterPipeline for composing filters
//! - RecommendationQuery / EngineConfig for request parameters and bounds
//! - RecommendationEngine, which scans a similarity row and ranks the result
//!
//! ## Example Usage
//! ```ignore
//! use recommender::{EngineConfig, RecommendationEngine};
//! use data_loader::Genre;
//!
//! let engine = RecommendationEngine::new(snapshot, EngineConfig::default());
//!
//! let query = engine
//!     .query(862)
//!     .with_limit(5)
//!     .with_genres([Genre::Animation]);
//!
//! for rec in engine.recommend(&query)? {
//!     println!("{} {:.5}", rec.movie_id, rec.similarity_score);
//! }
//! ```

pub mod error;
pub mod traits;
pub mod filters;
pub mod filter_pipeline;
pub mod query;
pub mod engine;

// Re-export main types
pub use error::{RecommendError, Result};
pub use traits::Filter;
pub use filter_pipeline::FilterPipeline;
pub use query::{parse_genres, EngineConfig, RawQuery, RecommendationQuery};
pub use engine::{Recommendation, RecommendationEngine};
