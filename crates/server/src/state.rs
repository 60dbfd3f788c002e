use recommender::RecommendationEngine;

/// Shared application state.
///
/// The engine reads an immutable snapshot, so handlers share it without
/// any lock.
#[derive(Clone)]
pub struct AppState {
    pub engine: RecommendationEngine,
}

impl AppState {
    pub fn new(engine: RecommendationEngine) -> Self {
        Self { engine }
    }
}
