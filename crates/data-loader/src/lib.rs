//! # Data Loader Crate
//!
//! This crate loads the precomputed item-item similarity artifact into an
//! immutable in-memory snapshot.
//!
//! ## Main Components
//!
//! - **types**: Snapshot types (MovieRecord, MetadataCatalog, IdentifierIndex,
//!   SimilarityMatrix, ModelSnapshot) and the Genre vocabulary
//! - **parser**: Deserialize the JSON artifact and normalize genre/tag fields
//! - **index**: Build the typed snapshot and validate its integrity
//! - **error**: Error types for snapshot loading
//!
//! ## Example Usage
//!
//! ```ignore
//! use data_loader::ModelSnapshot;
//! use std::path::Path;
//!
//! let snapshot = ModelSnapshot::load_from_file(Path::new("app/models/recommendation_model.json"))?;
//!
//! let row = snapshot.index().resolve(862).unwrap();
//! let movie = snapshot.catalog().get(row);
//! let scores: Vec<_> = snapshot.matrix().row(row).collect();
//!
//! println!("{:?} has {} neighbours", movie.title, scores.len() - 1);
//! ```

// Public modules
pub mod error;
pub mod types;
pub mod parser;
pub mod index;

// Re-export commonly used types for convenience
pub use error::{DataLoadError, Result};
pub use parser::{ModelArtifact, RawMovie};
pub use types::{
    // Type aliases
    MovieId,
    RowIndex,
    // Core types
    MovieRecord,
    MetadataCatalog,
    IdentifierIndex,
    SimilarityMatrix,
    ModelSnapshot,
    // Enums
    Genre,
};
