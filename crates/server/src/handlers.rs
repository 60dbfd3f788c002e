use std::num::IntErrorKind;
use std::sync::Arc;

use axum::{
    extract::{Query, State},
    Extension, Json,
};
use serde::{Serialize, Serializer};
use tracing::info;

use data_loader::MovieId;
use recommender::{RawQuery, Recommendation, RecommendationQuery};

use crate::error::{AppError, AppResult};
use crate::middleware::request_id::RequestId;
use crate::state::AppState;

// Request/Response types

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub message: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationResponse {
    pub tmdb_id: MovieId,
    #[serde(serialize_with = "serialize_5_digits")]
    pub similarity_score: f64,
}

impl From<Recommendation> for RecommendationResponse {
    fn from(rec: Recommendation) -> Self {
        Self {
            tmdb_id: rec.movie_id,
            similarity_score: rec.similarity_score,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct GetRecommendationsResponse {
    pub recommendations: Vec<RecommendationResponse>,
}

/// Scores are compared at full precision; only the wire value is rounded
fn serialize_5_digits<S: Serializer>(score: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64((score * 1e5).round() / 1e5)
}

// Handlers

/// Health check endpoint
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        message: "Application is running. HTTP request received.".to_string(),
    })
}

/// Get movie recommendations similar to `tmdbId`
pub async fn get_recommendations(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    Query(params): Query<Vec<(String, String)>>,
) -> AppResult<Json<GetRecommendationsResponse>> {
    let raw = parse_recommend_params(params)?;
    let query = RecommendationQuery::try_from_raw(raw, state.engine.config())?;

    info!(
        request_id = %request_id,
        movie_id = query.movie_id,
        limit = query.limit,
        min_rating_count = query.min_rating_count,
        "Processing recommendation request"
    );

    // The scan is CPU-bound; keep it off the async workers
    let engine = state.engine.clone();
    let recommendations = tokio::task::spawn_blocking(move || engine.recommend(&query))
        .await
        .map_err(|e| AppError::Internal(format!("recommendation task failed: {}", e)))??;

    info!(
        request_id = %request_id,
        count = recommendations.len(),
        "Recommendations computed"
    );

    Ok(Json(GetRecommendationsResponse {
        recommendations: recommendations.into_iter().map(Into::into).collect(),
    }))
}

/// Turn raw query pairs into a [`RawQuery`].
///
/// `genres` and `tags` may be repeated and may hold comma-separated
/// values; scalar parameters keep their last occurrence. Unknown
/// parameters are rejected.
pub fn parse_recommend_params(params: Vec<(String, String)>) -> AppResult<RawQuery> {
    let mut movie_id = None;
    let mut raw = RawQuery::default();

    for (key, value) in params {
        match key.as_str() {
            "tmdbId" | "tmdb_id" => movie_id = Some(parse_integer(&key, &value)?),
            "limit" => raw.limit = Some(parse_integer(&key, &value)?),
            "minRatingCount" | "min_rating_count" => {
                raw.min_rating_count = Some(parse_integer(&key, &value)?)
            }
            "genres" => raw.genres.get_or_insert_with(Vec::new).extend(split_list(&value)),
            "tags" => raw.tags.get_or_insert_with(Vec::new).extend(split_list(&value)),
            _ => {
                return Err(AppError::InvalidInput(format!(
                    "Unknown query parameter '{}'",
                    key
                )))
            }
        }
    }

    raw.movie_id = movie_id
        .ok_or_else(|| AppError::InvalidInput("tmdbId is required".to_string()))?;
    Ok(raw)
}

/// Parse a whole number, saturating at the `i64` bounds so oversized
/// values are judged by the engine rather than rejected as malformed
fn parse_integer(key: &str, value: &str) -> AppResult<i64> {
    match value.trim().parse::<i64>() {
        Ok(n) => Ok(n),
        Err(e) => match e.kind() {
            IntErrorKind::PosOverflow => Ok(i64::MAX),
            IntErrorKind::NegOverflow => Ok(i64::MIN),
            _ => Err(AppError::InvalidInput(format!(
                "{} must be an integer, got '{}'",
                key, value
            ))),
        },
    }
}

fn split_list(value: &str) -> impl Iterator<Item = String> + '_ {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}
