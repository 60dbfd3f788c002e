//! Filter implementations for the candidate scan.
//!
//! This module contains all the concrete filters that can be composed
//! into a FilterPipeline.

pub mod genre;
pub mod min_rating_count;
pub mod tag;

// Re-export for convenience
pub use genre::GenreFilter;
pub use min_rating_count::MinRatingCountFilter;
pub use tag::TagFilter;
