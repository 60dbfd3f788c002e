//! # Recommendation Engine
//!
//! Answers "which movies are most similar to this one" from the snapshot:
//! 1. Validate the query
//! 2. Resolve the external id to a matrix row
//! 3. Drop the source movie from its own row (by row index)
//! 4. Order the remaining candidates by similarity, descending
//! 5. Scan in that order through the filter pipeline, stopping at `limit`
//! 6. Re-rank accepted candidates by (similarity, average rating)
//! 7. Project to (tmdbId, similarity score)
//!
//! The engine holds no mutable state. Each call reads the shared snapshot
//! and nothing else, so any number of calls may run concurrently.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, instrument};

use data_loader::{ModelSnapshot, MovieId, RowIndex};

use crate::error::{RecommendError, Result};
use crate::filter_pipeline::FilterPipeline;
use crate::query::{EngineConfig, RecommendationQuery};

/// One recommended movie
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Recommendation {
    pub movie_id: MovieId,
    /// Full-precision similarity to the source movie
    pub similarity_score: f64,
}

/// A candidate that passed the filters, with what the final ranking needs
#[derive(Debug, Clone, Copy)]
struct AcceptedCandidate {
    row: RowIndex,
    score: f64,
    average_rating: f32,
}

/// Item-item recommendation over a shared, immutable snapshot.
///
/// Cloning is cheap (the snapshot is behind an `Arc`).
#[derive(Clone)]
pub struct RecommendationEngine {
    snapshot: Arc<ModelSnapshot>,
    config: EngineConfig,
}

impl RecommendationEngine {
    /// Create an engine over a loaded snapshot
    pub fn new(snapshot: Arc<ModelSnapshot>, config: EngineConfig) -> Self {
        Self { snapshot, config }
    }

    pub fn snapshot(&self) -> &Arc<ModelSnapshot> {
        &self.snapshot
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// A query for `movie_id` carrying this engine's defaults
    pub fn query(&self, movie_id: MovieId) -> RecommendationQuery {
        RecommendationQuery::with_defaults(movie_id, &self.config)
    }

    /// Main entry point: the top `query.limit` movies most similar to
    /// `query.movie_id` that pass the query's filters.
    ///
    /// # Errors
    /// * `Validation` - a parameter is out of bounds (checked before any scan)
    /// * `NotFound` - the movie isn't in the snapshot
    /// * `EmptyResult` - no candidate passed the filters
    #[instrument(skip(self, query), fields(movie_id = query.movie_id, limit = query.limit))]
    pub fn recommend(&self, query: &RecommendationQuery) -> Result<Vec<Recommendation>> {
        let start_time = Instant::now();

        query.validate(&self.config)?;

        let source_row = self
            .snapshot
            .index()
            .resolve(query.movie_id)
            .ok_or(RecommendError::NotFound {
                movie_id: i64::from(query.movie_id),
            })?;

        let scan_order = self.scan_order(source_row);
        let pipeline = query.filter_pipeline();
        let accepted = self.collect_candidates(&scan_order, &pipeline, query.limit);

        if accepted.is_empty() {
            debug!("No candidate passed the filters");
            return Err(RecommendError::EmptyResult {
                movie_id: query.movie_id,
            });
        }

        let recommendations = self.rank_and_project(accepted);

        debug!(
            "Returning {} recommendations in {:.2?}",
            recommendations.len(),
            start_time.elapsed()
        );
        Ok(recommendations)
    }

    /// Every other movie in the source row, most similar first.
    ///
    /// The source is removed by row index, not by position: its self-score
    /// can tie with another movie's, and either could sort first.
    fn scan_order(&self, source_row: RowIndex) -> Vec<(RowIndex, f64)> {
        let mut candidates: Vec<(RowIndex, f64)> = self
            .snapshot
            .matrix()
            .row(source_row)
            .filter(|&(row, _)| row != source_row)
            .collect();

        // Stable, so equal scores keep row order and the scan is deterministic
        candidates.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
        candidates
    }

    /// Walk the scan order, keeping candidates the pipeline accepts, until
    /// `limit` are kept
    fn collect_candidates(
        &self,
        scan_order: &[(RowIndex, f64)],
        pipeline: &FilterPipeline,
        limit: usize,
    ) -> Vec<AcceptedCandidate> {
        let catalog = self.snapshot.catalog();
        let mut accepted = Vec::with_capacity(limit);
        let mut rejections: BTreeMap<&str, usize> = BTreeMap::new();
        let mut scanned = 0usize;

        for &(row, score) in scan_order {
            if accepted.len() >= limit {
                break;
            }
            scanned += 1;

            let record = catalog.get(row);
            match pipeline.first_rejection(record) {
                Some(filter) => *rejections.entry(filter).or_insert(0) += 1,
                None => accepted.push(AcceptedCandidate {
                    row,
                    score,
                    average_rating: record.average_rating,
                }),
            }
        }

        debug!(
            scanned,
            accepted = accepted.len(),
            candidates = scan_order.len(),
            ?rejections,
            "Candidate scan finished"
        );
        accepted
    }

    /// Order by similarity, then average rating (both descending), and
    /// drop everything but the id and the score
    fn rank_and_project(&self, mut accepted: Vec<AcceptedCandidate>) -> Vec<Recommendation> {
        accepted.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(Ordering::Equal)
                .then_with(|| {
                    b.average_rating
                        .partial_cmp(&a.average_rating)
                        .unwrap_or(Ordering::Equal)
                })
        });

        let index = self.snapshot.index();
        accepted
            .into_iter()
            .map(|candidate| Recommendation {
                movie_id: index.external_id(candidate.row),
                similarity_score: candidate.score,
            })
            .collect()
    }
}
