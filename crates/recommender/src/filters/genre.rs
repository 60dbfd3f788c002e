//! Filter to keep only movies in at least one requested genre.

use crate::traits::Filter;
use data_loader::{Genre, MovieRecord};
use std::collections::BTreeSet;

/// Keeps candidates whose genre set intersects the requested genres.
///
/// Requested genres come from the fixed vocabulary; they are compared with
/// the catalog's normalized strings through their canonical spelling.
pub struct GenreFilter {
    genres: BTreeSet<Genre>,
}

impl GenreFilter {
    /// Create a new GenreFilter.
    ///
    /// # Arguments
    /// * `genres` - The genres a candidate may match (any one is enough)
    pub fn new(genres: BTreeSet<Genre>) -> Self {
        Self { genres }
    }
}

impl Filter for GenreFilter {
    fn name(&self) -> &str {
        "GenreFilter"
    }

    fn accepts(&self, record: &MovieRecord) -> bool {
        record.has_any_genre(self.genres.iter().map(Genre::as_str))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use data_loader::parser::normalize_genres;

    fn record_with_genres(genres: &str) -> MovieRecord {
        MovieRecord {
            row_index: 0,
            movie_id: 1,
            title: None,
            genres: normalize_genres(genres),
            tags: BTreeSet::new(),
            rating_count: 100,
            average_rating: 4.0,
        }
    }

    #[test]
    fn test_genre_filter() {
        let filter = GenreFilter::new([Genre::Action, Genre::SciFi].into_iter().collect());

        assert!(filter.accepts(&record_with_genres("Action|Adventure")));
        assert!(filter.accepts(&record_with_genres("Sci-Fi")));
        assert!(!filter.accepts(&record_with_genres("Drama|Romance")));
        assert!(!filter.accepts(&record_with_genres("")));
    }

    #[test]
    fn test_genre_filter_matches_canonical_spelling() {
        let filter = GenreFilter::new([Genre::Children].into_iter().collect());

        assert!(filter.accepts(&record_with_genres("Animation|Children's")));
        assert!(!filter.accepts(&record_with_genres("Animation|Comedy")));
    }
}
