//! The FilterPipeline composes multiple filters.
//!
//! A candidate is accepted only if every filter accepts it. Filters are
//! evaluated in insertion order and evaluation stops at the first
//! rejection, so cheap filters should be added first.

use crate::traits::Filter;
use data_loader::MovieRecord;

/// Chains multiple filters together using the builder pattern.
///
/// ## Usage
/// ```ignore
/// let pipeline = FilterPipeline::new()
///     .add_filter(MinRatingCountFilter::new(50))
///     .add_filter(GenreFilter::new(genres));
///
/// if pipeline.accepts(record) { ... }
/// ```
pub struct FilterPipeline {
    filters: Vec<Box<dyn Filter>>,
}

impl FilterPipeline {
    /// Create a new empty FilterPipeline.
    pub fn new() -> Self {
        Self {
            filters: Vec::new(),
        }
    }

    /// Add a filter to the pipeline (builder pattern).
    pub fn add_filter(mut self, filter: impl Filter + 'static) -> Self {
        self.filters.push(Box::new(filter));
        self
    }

    /// Whether every filter accepts `record`
    pub fn accepts(&self, record: &MovieRecord) -> bool {
        self.first_rejection(record).is_none()
    }

    /// Name of the first filter rejecting `record`, `None` if all accept
    pub fn first_rejection(&self, record: &MovieRecord) -> Option<&str> {
        self.filters
            .iter()
            .find(|filter| !filter.accepts(record))
            .map(|filter| filter.name())
    }

    /// Names of the filters, in evaluation order
    pub fn filter_names(&self) -> Vec<&str> {
        self.filters.iter().map(|f| f.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }
}

impl Default for FilterPipeline {
    fn default() -> Self {
        Self::new()
    }
}
