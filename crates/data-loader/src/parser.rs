//! Parser for the precomputed similarity artifact.
//!
//! The artifact is one JSON document produced by the offline pipeline:
//! - `movies`: one metadata object per matrix row
//! - `similarity`: the dense matrix, one array per row
//! - `tmdbIdToIndex`: external id -> row
//!
//! Genre and tag strings arrive as raw multi-valued fields
//! (`"Action|Comedy"`, `"pixar fun"`); they are split and normalized here,
//! once, so nothing downstream repeats the string work per request.

use crate::error::{DataLoadError, Result};
use crate::types::{MovieId, RowIndex};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Separator between genres in the raw `genres` field
pub const GENRE_SEPARATOR: char = '|';

/// One movie as the pipeline wrote it
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawMovie {
    pub tmdb_id: MovieId,
    #[serde(default)]
    pub title: Option<String>,
    /// Pipe-separated genres, absent for movies without genre data
    #[serde(default)]
    pub genres: Option<String>,
    /// Whitespace-separated tags
    #[serde(default)]
    pub tags: Option<String>,
    pub rating_count: u32,
    pub average_rating: f32,
}

/// The whole serialized artifact, before validation
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub movies: Vec<RawMovie>,
    pub similarity: Vec<Vec<f64>>,
    #[serde(rename = "tmdbIdToIndex")]
    pub tmdb_id_to_index: HashMap<MovieId, RowIndex>,
}

/// Read and deserialize an artifact file
pub fn parse_artifact(path: &Path) -> Result<ModelArtifact> {
    let file = File::open(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => DataLoadError::FileNotFound {
            path: path.display().to_string(),
        },
        _ => DataLoadError::IoError(e),
    })?;

    serde_json::from_reader(BufReader::new(file)).map_err(|e| DataLoadError::ParseError {
        file: path.display().to_string(),
        reason: e.to_string(),
    })
}

/// Deserialize an artifact held in memory
pub fn parse_artifact_str(content: &str) -> Result<ModelArtifact> {
    serde_json::from_str(content).map_err(|e| DataLoadError::ParseError {
        file: "<memory>".to_string(),
        reason: e.to_string(),
    })
}

/// Split a pipe-separated genre field into a normalized set
///
/// Example: " Action|Sci-Fi |" -> {"action", "sci-fi"}
pub fn normalize_genres(raw: &str) -> BTreeSet<String> {
    normalize(raw.split(GENRE_SEPARATOR))
}

/// Split a whitespace-separated tag field into a normalized set
///
/// Example: "Pixar  FUN" -> {"fun", "pixar"}
pub fn normalize_tags(raw: &str) -> BTreeSet<String> {
    normalize(raw.split_whitespace())
}

/// Trim and lowercase a single filter value the same way catalog values are
pub fn normalize_term(raw: &str) -> String {
    raw.trim().to_lowercase()
}

fn normalize<'a>(parts: impl Iterator<Item = &'a str>) -> BTreeSet<String> {
    parts
        .map(normalize_term)
        .filter(|s| !s.is_empty())
        .collect()
}
