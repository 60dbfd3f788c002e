//! Recommendation request parameters and their validation.
//!
//! Validation runs before the engine touches the snapshot, so every
//! out-of-bounds number or unknown genre surfaces as
//! [`RecommendError::Validation`] and never as a scan result. Values past
//! the top of their type are not out of bounds: a huge rating threshold
//! saturates, and a huge id is simply not in the snapshot.

use crate::error::{RecommendError, Result};
use crate::filter_pipeline::FilterPipeline;
use crate::filters::{GenreFilter, MinRatingCountFilter, TagFilter};
use data_loader::parser::normalize_term;
use data_loader::{Genre, MovieId};
use std::collections::BTreeSet;
use std::fmt::Display;
use std::str::FromStr;

/// Bounds and defaults applied to every request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    /// Result size when the caller doesn't ask for one
    pub default_limit: usize,
    /// Largest result size a caller may ask for
    pub max_limit: usize,
    /// Rating-count threshold when the caller doesn't give one
    pub default_min_rating_count: u32,
    /// Smallest rating-count threshold a caller may give
    pub min_rating_floor: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_limit: 10,
            max_limit: 20,
            default_min_rating_count: 50,
            min_rating_floor: 1,
        }
    }
}

/// Untyped request values as a transport parses them.
///
/// Numbers are signed so negative inputs reach validation instead of
/// failing somewhere in parsing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawQuery {
    pub movie_id: i64,
    pub limit: Option<i64>,
    pub min_rating_count: Option<i64>,
    pub genres: Option<Vec<String>>,
    pub tags: Option<Vec<String>>,
}

/// A typed recommendation request.
#[derive(Debug, Clone, PartialEq)]
pub struct RecommendationQuery {
    pub movie_id: MovieId,
    pub limit: usize,
    pub min_rating_count: u32,
    /// `None` means no genre filtering
    pub genres: Option<BTreeSet<Genre>>,
    /// Normalized tags; `None` means no tag filtering
    pub tags: Option<BTreeSet<String>>,
}

impl RecommendationQuery {
    /// Query with the default limit and rating threshold
    pub fn new(movie_id: MovieId) -> Self {
        Self::with_defaults(movie_id, &EngineConfig::default())
    }

    /// Query with the defaults of a specific engine configuration
    pub fn with_defaults(movie_id: MovieId, config: &EngineConfig) -> Self {
        Self {
            movie_id,
            limit: config.default_limit,
            min_rating_count: config.default_min_rating_count,
            genres: None,
            tags: None,
        }
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    pub fn with_min_rating_count(mut self, min_rating_count: u32) -> Self {
        self.min_rating_count = min_rating_count;
        self
    }

    pub fn with_genres(mut self, genres: impl IntoIterator<Item = Genre>) -> Self {
        self.genres = Some(genres.into_iter().collect());
        self
    }

    /// Tags are trimmed and lowercased; blank ones are dropped
    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.tags = Some(normalize_tags(tags));
        self
    }

    /// Convert and validate raw transport values.
    ///
    /// A `min_rating_count` too large for `u32` saturates, since no movie
    /// could reach it anyway. A positive `movie_id` too large for
    /// [`MovieId`] can't be in any snapshot and yields `NotFound`, but only
    /// once every other parameter has passed validation.
    pub fn try_from_raw(raw: RawQuery, config: &EngineConfig) -> Result<Self> {
        if raw.movie_id < 1 {
            return Err(RecommendError::Validation(format!(
                "tmdbId must be at least 1, got {}",
                raw.movie_id
            )));
        }
        let movie_id = MovieId::try_from(raw.movie_id).ok();

        let mut query = Self::with_defaults(movie_id.unwrap_or(MovieId::MAX), config);

        if let Some(limit) = raw.limit {
            query.limit = usize::try_from(limit).map_err(|_| limit_error(config, limit))?;
        }
        if let Some(min_count) = raw.min_rating_count {
            if min_count < 0 {
                return Err(min_rating_error(config, min_count));
            }
            query.min_rating_count = u32::try_from(min_count).unwrap_or(u32::MAX);
        }
        if let Some(genres) = raw.genres {
            query.genres = Some(parse_genres(genres)?);
        }
        if let Some(tags) = raw.tags {
            query = query.with_tags(tags);
        }

        query.validate(config)?;

        match movie_id {
            Some(_) => Ok(query),
            None => Err(RecommendError::NotFound {
                movie_id: raw.movie_id,
            }),
        }
    }

    /// Check every parameter against its declared bound
    pub fn validate(&self, config: &EngineConfig) -> Result<()> {
        if self.movie_id < 1 {
            return Err(RecommendError::Validation(format!(
                "tmdbId must be at least 1, got {}",
                self.movie_id
            )));
        }
        if self.limit < 1 || self.limit > config.max_limit {
            return Err(limit_error(config, self.limit));
        }
        if self.min_rating_count < config.min_rating_floor {
            return Err(min_rating_error(config, self.min_rating_count));
        }
        if self.genres.as_ref().is_some_and(|g| g.is_empty()) {
            return Err(RecommendError::Validation(
                "genres must contain at least one genre".to_string(),
            ));
        }
        if self.tags.as_ref().is_some_and(|t| t.is_empty()) {
            return Err(RecommendError::Validation(
                "tags must contain at least one non-blank tag".to_string(),
            ));
        }
        Ok(())
    }

    /// The filters this query asks for, cheapest first
    pub fn filter_pipeline(&self) -> FilterPipeline {
        let mut pipeline =
            FilterPipeline::new().add_filter(MinRatingCountFilter::new(self.min_rating_count));

        if let Some(genres) = &self.genres {
            pipeline = pipeline.add_filter(GenreFilter::new(genres.clone()));
        }
        if let Some(tags) = &self.tags {
            pipeline = pipeline.add_filter(TagFilter::new(tags));
        }
        pipeline
    }
}

/// Parse caller-supplied genre names against the fixed vocabulary
pub fn parse_genres<I, S>(values: I) -> Result<BTreeSet<Genre>>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    values
        .into_iter()
        .map(|value| {
            Genre::from_str(value.as_ref()).map_err(|_| {
                RecommendError::Validation(format!(
                    "Genre must be one of: {}. Got '{}'.",
                    Genre::vocabulary(),
                    value.as_ref()
                ))
            })
        })
        .collect()
}

fn normalize_tags<I, S>(tags: I) -> BTreeSet<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    tags.into_iter()
        .map(|t| normalize_term(t.as_ref()))
        .filter(|t| !t.is_empty())
        .collect()
}

fn limit_error(config: &EngineConfig, got: impl Display) -> RecommendError {
    RecommendError::Validation(format!(
        "limit must be between 1 and {}, got {}",
        config.max_limit, got
    ))
}

fn min_rating_error(config: &EngineConfig, got: impl Display) -> RecommendError {
    RecommendError::Validation(format!(
        "minRatingCount must be at least {}, got {}",
        config.min_rating_floor, got
    ))
}
