//! ModelSnapshot building and validation.
//!
//! Turns a raw [`ModelArtifact`] into the typed snapshot:
//! - normalize every movie's genres and tags (in parallel)
//! - flatten the matrix into one row-major buffer
//! - build the bidirectional id index
//! - check that the three structures agree with each other
//!
//! Anything inconsistent is rejected here, at startup, so the request path
//! can index rows without checking them.

use crate::error::{DataLoadError, Result};
use crate::parser::{self, ModelArtifact, RawMovie};
use crate::types::*;
use rayon::prelude::*;
use std::collections::HashMap;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Largest |s[i][j] - s[j][i]| tolerated before warning about asymmetry
const SYMMETRY_TOLERANCE: f64 = 1e-9;

impl ModelSnapshot {
    /// Load and validate a snapshot from an artifact file.
    ///
    /// This is the only way the server and CLI obtain a snapshot. Any error
    /// is fatal for the caller: there is no partially loaded snapshot.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        info!("Loading similarity snapshot from {:?}", path);
        let start = Instant::now();

        let artifact = parser::parse_artifact(path)?;
        debug!(
            "Parsed artifact: {} movies, {} matrix rows, {} ids in {:.2?}",
            artifact.movies.len(),
            artifact.similarity.len(),
            artifact.tmdb_id_to_index.len(),
            start.elapsed()
        );

        let snapshot = Self::from_artifact(artifact)?;

        let (movies, dim) = snapshot.counts();
        info!(
            "Snapshot loaded and validated: {} movies, {}x{} matrix in {:.2?}",
            movies,
            dim,
            dim,
            start.elapsed()
        );
        Ok(snapshot)
    }

    /// Build a snapshot from an already deserialized artifact
    pub fn from_artifact(artifact: ModelArtifact) -> Result<Self> {
        let ModelArtifact {
            movies,
            similarity,
            tmdb_id_to_index,
        } = artifact;

        let dim = movies.len();
        if similarity.len() != dim {
            return Err(DataLoadError::ShapeMismatch {
                rows: similarity.len(),
                records: dim,
            });
        }
        if let Some(row) = similarity.par_iter().position_first(|r| r.len() != dim) {
            return Err(DataLoadError::NotSquare {
                row,
                len: similarity[row].len(),
                expected: dim,
            });
        }

        let records: Vec<MovieRecord> = movies
            .into_par_iter()
            .enumerate()
            .map(|(row, raw)| build_record(row, raw))
            .collect();

        let scores: Vec<f64> = similarity.into_iter().flatten().collect();
        let index = build_identifier_index(&tmdb_id_to_index, dim)?;

        let snapshot = ModelSnapshot {
            catalog: MetadataCatalog { records },
            matrix: SimilarityMatrix { dim, scores },
            index,
        };
        snapshot.validate()?;
        snapshot.check_symmetry();

        Ok(snapshot)
    }

    /// Validate snapshot integrity
    ///
    /// Check that:
    /// - the matrix is square and matches the catalog length
    /// - every score is finite (scan ordering relies on a total order)
    /// - every row has exactly one external id, and the catalog agrees with it
    pub fn validate(&self) -> Result<()> {
        let dim = self.matrix.dim;
        if self.catalog.len() != dim {
            return Err(DataLoadError::ShapeMismatch {
                rows: dim,
                records: self.catalog.len(),
            });
        }
        if self.matrix.scores.len() != dim * dim {
            return Err(DataLoadError::ValidationError(format!(
                "matrix buffer holds {} scores, expected {}",
                self.matrix.scores.len(),
                dim * dim
            )));
        }

        if let Some(pos) = self.matrix.scores.par_iter().position_first(|s| !s.is_finite()) {
            return Err(DataLoadError::InvalidValue {
                field: format!("similarity[{}][{}]", pos / dim, pos % dim),
                value: self.matrix.scores[pos].to_string(),
            });
        }

        if self.index.len() != dim || self.index.by_id.len() != dim {
            return Err(DataLoadError::ValidationError(format!(
                "id index covers {} rows, expected {}",
                self.index.len(),
                dim
            )));
        }

        for (row, record) in self.catalog.iter().enumerate() {
            let indexed = self.index.external_id(row);
            if record.row_index != row || record.movie_id != indexed {
                return Err(DataLoadError::ValidationError(format!(
                    "row {} holds tmdbId {} but the id index maps it to {}",
                    row, record.movie_id, indexed
                )));
            }
        }

        Ok(())
    }

    /// Warn if the matrix is not symmetric.
    ///
    /// Pipelines computing similarities in floating point can leave tiny
    /// asymmetries, so this is reported rather than rejected.
    fn check_symmetry(&self) {
        let dim = self.matrix.dim;
        let scores = &self.matrix.scores;
        let max_delta = (0..dim)
            .into_par_iter()
            .map(|i| {
                ((i + 1)..dim)
                    .map(|j| (scores[i * dim + j] - scores[j * dim + i]).abs())
                    .fold(0.0_f64, f64::max)
            })
            .reduce(|| 0.0_f64, f64::max);

        if max_delta > SYMMETRY_TOLERANCE {
            warn!(
                "Similarity matrix is not symmetric (max |s[i][j] - s[j][i]| = {:e})",
                max_delta
            );
        }
    }
}

/// Build one catalog record, normalizing its multi-valued fields
fn build_record(row: RowIndex, raw: RawMovie) -> MovieRecord {
    MovieRecord {
        row_index: row,
        movie_id: raw.tmdb_id,
        title: raw.title,
        genres: raw
            .genres
            .as_deref()
            .map(parser::normalize_genres)
            .unwrap_or_default(),
        tags: raw
            .tags
            .as_deref()
            .map(parser::normalize_tags)
            .unwrap_or_default(),
        rating_count: raw.rating_count,
        average_rating: raw.average_rating,
    }
}

/// Build the bidirectional index, rejecting anything that isn't a bijection
/// between ids and `0..dim`
fn build_identifier_index(
    mapping: &HashMap<MovieId, RowIndex>,
    dim: usize,
) -> Result<IdentifierIndex> {
    // Sorted so the first reported problem is deterministic
    let mut entries: Vec<(MovieId, RowIndex)> = mapping.iter().map(|(&id, &row)| (id, row)).collect();
    entries.sort_unstable();

    let mut ids: Vec<Option<MovieId>> = vec![None; dim];
    for (id, row) in entries {
        if id == 0 {
            return Err(DataLoadError::InvalidValue {
                field: "tmdbId".to_string(),
                value: id.to_string(),
            });
        }
        let slot = ids.get_mut(row).ok_or_else(|| DataLoadError::MissingReference {
            entity: "Row".to_string(),
            id: row as u64,
        })?;
        if let Some(existing) = slot {
            return Err(DataLoadError::ValidationError(format!(
                "row {} is mapped by both tmdbId {} and tmdbId {}",
                row, existing, id
            )));
        }
        *slot = Some(id);
    }

    let ids = ids
        .into_iter()
        .enumerate()
        .map(|(row, id)| {
            id.ok_or_else(|| DataLoadError::ValidationError(format!("row {} has no tmdbId", row)))
        })
        .collect::<Result<Vec<MovieId>>>()?;

    let by_id = mapping.clone();
    Ok(IdentifierIndex { by_id, ids })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn raw_movie(tmdb_id: MovieId, genres: &str) -> RawMovie {
        RawMovie {
            tmdb_id,
            title: Some(format!("Movie {}", tmdb_id)),
            genres: Some(genres.to_string()),
            tags: Some("Classic  Cult".to_string()),
            rating_count: 100,
            average_rating: 4.0,
        }
    }

    fn small_artifact() -> ModelArtifact {
        ModelArtifact {
            movies: vec![
                raw_movie(10, "Action|Adventure"),
                raw_movie(20, "Drama"),
                raw_movie(30, "Comedy|Romance"),
            ],
            similarity: vec![
                vec![1.0, 0.8, 0.1],
                vec![0.8, 1.0, 0.4],
                vec![0.1, 0.4, 1.0],
            ],
            tmdb_id_to_index: [(10, 0), (20, 1), (30, 2)].into_iter().collect(),
        }
    }

    #[test]
    fn test_from_artifact_builds_consistent_snapshot() {
        let snapshot = ModelSnapshot::from_artifact(small_artifact()).unwrap();

        assert_eq!(snapshot.counts(), (3, 3));
        assert_eq!(snapshot.index().resolve(20), Some(1));
        assert_eq!(snapshot.index().resolve(99), None);
        assert_eq!(snapshot.index().external_id(2), 30);
        assert_eq!(snapshot.matrix().score(1, 2), 0.4);

        let record = snapshot.catalog().get(0);
        assert_eq!(record.movie_id, 10);
        assert!(record.genres.contains("action"));
        assert!(record.tags.contains("cult"));
    }

    #[test]
    fn test_row_includes_self_pair() {
        let snapshot = ModelSnapshot::from_artifact(small_artifact()).unwrap();
        let row: Vec<_> = snapshot.matrix().row(1).collect();
        assert_eq!(row, vec![(0, 0.8), (1, 1.0), (2, 0.4)]);
    }

    #[test]
    fn test_rejects_row_count_mismatch() {
        let mut artifact = small_artifact();
        artifact.similarity.pop();
        let err = ModelSnapshot::from_artifact(artifact).unwrap_err();
        assert!(matches!(err, DataLoadError::ShapeMismatch { rows: 2, records: 3 }));
    }

    #[test]
    fn test_rejects_ragged_matrix() {
        let mut artifact = small_artifact();
        artifact.similarity[2].push(0.0);
        let err = ModelSnapshot::from_artifact(artifact).unwrap_err();
        assert!(matches!(err, DataLoadError::NotSquare { row: 2, len: 4, expected: 3 }));
    }

    #[test]
    fn test_rejects_nan_score() {
        let mut artifact = small_artifact();
        artifact.similarity[1][2] = f64::NAN;
        let err = ModelSnapshot::from_artifact(artifact).unwrap_err();
        match err {
            DataLoadError::InvalidValue { field, .. } => assert_eq!(field, "similarity[1][2]"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_rejects_duplicate_row_mapping() {
        let mut artifact = small_artifact();
        artifact.tmdb_id_to_index.insert(40, 1);
        let err = ModelSnapshot::from_artifact(artifact).unwrap_err();
        assert!(matches!(err, DataLoadError::ValidationError(_)));
    }

    #[test]
    fn test_rejects_out_of_range_row() {
        let mut artifact = small_artifact();
        artifact.tmdb_id_to_index.insert(30, 7);
        let err = ModelSnapshot::from_artifact(artifact).unwrap_err();
        assert!(matches!(err, DataLoadError::MissingReference { id: 7, .. }));
    }

    #[test]
    fn test_rejects_unmapped_row() {
        let mut artifact = small_artifact();
        artifact.tmdb_id_to_index.remove(&20);
        let err = ModelSnapshot::from_artifact(artifact).unwrap_err();
        assert!(err.to_string().contains("row 1 has no tmdbId"));
    }

    #[test]
    fn test_rejects_catalog_id_disagreement() {
        let mut artifact = small_artifact();
        artifact.movies[0].tmdb_id = 11;
        let err = ModelSnapshot::from_artifact(artifact).unwrap_err();
        assert!(matches!(err, DataLoadError::ValidationError(_)));
    }

    #[test]
    fn test_empty_artifact_is_valid() {
        let snapshot = ModelSnapshot::from_artifact(ModelArtifact::default()).unwrap();
        assert_eq!(snapshot.counts(), (0, 0));
    }

    #[test]
    fn test_load_from_file_round_trip() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        let json = serde_json::to_string(&small_artifact()).unwrap();
        file.write_all(json.as_bytes()).unwrap();

        let snapshot = ModelSnapshot::load_from_file(file.path()).unwrap();
        assert_eq!(snapshot.counts(), (3, 3));
        assert_eq!(snapshot.index().resolve(30), Some(2));
    }

    #[test]
    fn test_load_from_file_rejects_corrupt_artifact() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"not json at all").unwrap();

        let err = ModelSnapshot::load_from_file(file.path()).unwrap_err();
        assert!(matches!(err, DataLoadError::ParseError { .. }));
    }
}
