//! HTTP transport for the movie similarity recommender.
//!
//! Parses requests into engine queries, runs them against the shared
//! snapshot and maps engine errors to status codes.

pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod state;

pub use config::Config;
pub use error::{AppError, AppResult};
pub use routes::create_router;
pub use state::AppState;
