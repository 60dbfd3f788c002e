//! Filter to ensure a minimum popularity threshold.
//!
//! Movies with only a handful of ratings have unreliable averages and tend
//! to be obscure; this keeps them out of the results.

use crate::traits::Filter;
use data_loader::MovieRecord;

/// Rejects candidates with fewer than `min_count` ratings.
pub struct MinRatingCountFilter {
    min_count: u32,
}

impl MinRatingCountFilter {
    /// Create a new MinRatingCountFilter.
    ///
    /// # Arguments
    /// * `min_count` - Minimum number of ratings (typically 50)
    pub fn new(min_count: u32) -> Self {
        Self { min_count }
    }
}

impl Filter for MinRatingCountFilter {
    fn name(&self) -> &str {
        "MinRatingCountFilter"
    }

    fn accepts(&self, record: &MovieRecord) -> bool {
        record.rating_count >= self.min_count
    }
}
