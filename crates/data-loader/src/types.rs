//! Core domain types for the similarity snapshot.
//!
//! The snapshot is three parallel structures addressed by the same row
//! position: the metadata catalog, the dense similarity matrix, and the
//! external-id index. All of them are immutable once built.

use crate::error::{DataLoadError, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::str::FromStr;

// =============================================================================
// Type Aliases
// =============================================================================

/// External movie identifier (the TMDB id callers use)
pub type MovieId = u32;

/// Position of a movie in the similarity matrix and the catalog
pub type RowIndex = usize;

// =============================================================================
// Genre vocabulary
// =============================================================================

/// The fixed genre vocabulary accepted in genre filters.
///
/// Catalog genre sets are free-form normalized strings; this enum only
/// constrains what a caller may ask for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Genre {
    Action,
    Adventure,
    Animation,
    Children,
    Comedy,
    Crime,
    Documentary,
    Drama,
    Fantasy,
    FilmNoir,
    Horror,
    Musical,
    Mystery,
    Romance,
    SciFi,
    Thriller,
    War,
    Western,
}

impl Genre {
    /// Every allowed genre, in vocabulary order
    pub const ALL: [Genre; 18] = [
        Genre::Action,
        Genre::Adventure,
        Genre::Animation,
        Genre::Children,
        Genre::Comedy,
        Genre::Crime,
        Genre::Documentary,
        Genre::Drama,
        Genre::Fantasy,
        Genre::FilmNoir,
        Genre::Horror,
        Genre::Musical,
        Genre::Mystery,
        Genre::Romance,
        Genre::SciFi,
        Genre::Thriller,
        Genre::War,
        Genre::Western,
    ];

    /// Canonical lowercase spelling, as it appears in normalized catalog sets
    pub fn as_str(&self) -> &'static str {
        match self {
            Genre::Action => "action",
            Genre::Adventure => "adventure",
            Genre::Animation => "animation",
            Genre::Children => "children's",
            Genre::Comedy => "comedy",
            Genre::Crime => "crime",
            Genre::Documentary => "documentary",
            Genre::Drama => "drama",
            Genre::Fantasy => "fantasy",
            Genre::FilmNoir => "film-noir",
            Genre::Horror => "horror",
            Genre::Musical => "musical",
            Genre::Mystery => "mystery",
            Genre::Romance => "romance",
            Genre::SciFi => "sci-fi",
            Genre::Thriller => "thriller",
            Genre::War => "war",
            Genre::Western => "western",
        }
    }

    /// Comma-separated list of the vocabulary, for error messages
    pub fn vocabulary() -> String {
        Genre::ALL
            .iter()
            .map(|g| g.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for Genre {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Genre {
    type Err = DataLoadError;

    /// Case-insensitive, whitespace-trimmed lookup in the vocabulary
    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_lowercase();
        Genre::ALL
            .iter()
            .copied()
            .find(|g| g.as_str() == wanted)
            .ok_or_else(|| DataLoadError::InvalidValue {
                field: "genre".to_string(),
                value: s.to_string(),
            })
    }
}

// =============================================================================
// Movie metadata
// =============================================================================

/// Per-row metadata for one movie.
///
/// `genres` and `tags` are already trimmed, lowercased and split, so
/// request-time filtering is plain set membership.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovieRecord {
    pub row_index: RowIndex,
    pub movie_id: MovieId,
    pub title: Option<String>,
    pub genres: BTreeSet<String>,
    pub tags: BTreeSet<String>,
    pub rating_count: u32,
    pub average_rating: f32,
}

impl MovieRecord {
    /// True if any of `wanted` is one of this movie's genres
    pub fn has_any_genre<'a>(&self, mut wanted: impl Iterator<Item = &'a str>) -> bool {
        wanted.any(|g| self.genres.contains(g))
    }

    /// True if any of `wanted` is one of this movie's tags
    pub fn has_any_tag<'a>(&self, mut wanted: impl Iterator<Item = &'a str>) -> bool {
        wanted.any(|t| self.tags.contains(t))
    }
}

/// Row-addressed metadata for every movie in the snapshot
#[derive(Debug, Clone, Default)]
pub struct MetadataCatalog {
    pub(crate) records: Vec<MovieRecord>,
}

impl MetadataCatalog {
    /// Metadata for a row.
    ///
    /// Rows come from the engine's own scan of the matrix, which has the
    /// same length as the catalog, so this indexes directly.
    pub fn get(&self, row: RowIndex) -> &MovieRecord {
        &self.records[row]
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &MovieRecord> {
        self.records.iter()
    }

    /// Movies whose title contains `needle`, case-insensitively
    pub fn find_by_title(&self, needle: &str) -> Vec<&MovieRecord> {
        let needle = needle.trim().to_lowercase();
        self.records
            .iter()
            .filter(|r| {
                r.title
                    .as_deref()
                    .is_some_and(|t| t.to_lowercase().contains(&needle))
            })
            .collect()
    }
}

// =============================================================================
// Identifier index
// =============================================================================

/// Bidirectional mapping between external ids and row positions
#[derive(Debug, Clone, Default)]
pub struct IdentifierIndex {
    pub(crate) by_id: HashMap<MovieId, RowIndex>,
    /// `ids[row]` is the external id of that row
    pub(crate) ids: Vec<MovieId>,
}

impl IdentifierIndex {
    /// Row for an external id, `None` if the movie isn't in the snapshot
    pub fn resolve(&self, id: MovieId) -> Option<RowIndex> {
        self.by_id.get(&id).copied()
    }

    /// External id for a row
    pub fn external_id(&self, row: RowIndex) -> MovieId {
        self.ids[row]
    }

    pub fn contains(&self, id: MovieId) -> bool {
        self.by_id.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// All external ids in row order
    pub fn ids(&self) -> &[MovieId] {
        &self.ids
    }
}

// =============================================================================
// Similarity matrix
// =============================================================================

/// Dense, square, row-major matrix of similarity scores
#[derive(Clone, Default)]
pub struct SimilarityMatrix {
    pub(crate) dim: usize,
    pub(crate) scores: Vec<f64>,
}

impl SimilarityMatrix {
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Raw scores of one row, indexed by the other movie's row
    pub fn row_scores(&self, row: RowIndex) -> &[f64] {
        let start = row * self.dim;
        &self.scores[start..start + self.dim]
    }

    /// `(other_row, score)` pairs for a row, self pair included
    pub fn row(&self, row: RowIndex) -> impl Iterator<Item = (RowIndex, f64)> + '_ {
        self.row_scores(row).iter().copied().enumerate()
    }

    pub fn score(&self, i: RowIndex, j: RowIndex) -> f64 {
        self.scores[i * self.dim + j]
    }
}

// The matrix can hold tens of millions of scores; only the shape is useful in logs
impl fmt::Debug for SimilarityMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SimilarityMatrix")
            .field("dim", &self.dim)
            .finish()
    }
}

// =============================================================================
// ModelSnapshot - the loaded artifact
// =============================================================================

/// Everything the engine reads: catalog, matrix and index, consistent with
/// each other and never mutated after load.
///
/// Share it behind an `Arc`; replacing a snapshot means swapping the `Arc`,
/// so a request always sees one consistent triple.
#[derive(Debug, Default)]
pub struct ModelSnapshot {
    pub(crate) catalog: MetadataCatalog,
    pub(crate) matrix: SimilarityMatrix,
    pub(crate) index: IdentifierIndex,
}

impl ModelSnapshot {
    pub fn catalog(&self) -> &MetadataCatalog {
        &self.catalog
    }

    pub fn matrix(&self) -> &SimilarityMatrix {
        &self.matrix
    }

    pub fn index(&self) -> &IdentifierIndex {
        &self.index
    }

    /// Get counts for debugging/validation: (movies, matrix dimension)
    pub fn counts(&self) -> (usize, usize) {
        (self.catalog.len(), self.matrix.dim())
    }
}
