//! Errors raised by a recommendation request.
//!
//! None of these are retried: the engine is a pure function of the snapshot
//! and the query, so a retry reproduces the same outcome.

use data_loader::MovieId;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RecommendError {
    /// The reference movie isn't in the snapshot. Signed so ids too large
    /// for [`MovieId`] are reported as given.
    #[error("Movie ID {movie_id} not found in the dataset.")]
    NotFound { movie_id: i64 },

    /// The movie exists but no candidate passed the filters
    #[error("No recommendations found for movie ID {movie_id}.")]
    EmptyResult { movie_id: MovieId },

    /// A parameter is out of bounds or outside the allowed vocabulary
    #[error("{0}")]
    Validation(String),
}

pub type Result<T> = std::result::Result<T, RecommendError>;
