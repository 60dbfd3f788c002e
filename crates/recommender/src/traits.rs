//! Core traits for candidate filtering.
//!
//! Filters are per-candidate predicates rather than whole-list transforms:
//! the engine scans the similarity row lazily and stops as soon as enough
//! candidates are accepted, so it needs a verdict one movie at a time.

use data_loader::MovieRecord;

/// A predicate over catalog records.
///
/// `Send + Sync` so one pipeline can be evaluated by concurrent requests.
pub trait Filter: Send + Sync {
    /// Returns the name of this filter (for logging/debugging)
    fn name(&self) -> &str;

    /// Whether `record` may appear in the result
    fn accepts(&self, record: &MovieRecord) -> bool;
}
