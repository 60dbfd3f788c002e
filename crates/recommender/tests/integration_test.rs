//! Integration tests for the recommendation engine.
//!
//! These tests build small snapshots through the public artifact API and
//! check the engine end to end: scenarios with known answers, plus result
//! invariants over every movie of a larger synthetic catalog.

use data_loader::{Genre, ModelArtifact, ModelSnapshot, MovieId, RawMovie};
use recommender::{
    parse_genres, EngineConfig, RecommendError, Recommendation, RecommendationEngine,
    RecommendationQuery,
};
use std::collections::HashSet;
use std::sync::Arc;

fn raw_movie(tmdb_id: MovieId, genres: &str, tags: &str, rating_count: u32, average_rating: f32) -> RawMovie {
    RawMovie {
        tmdb_id,
        title: Some(format!("Movie {}", tmdb_id)),
        genres: Some(genres.to_string()),
        tags: Some(tags.to_string()),
        rating_count,
        average_rating,
    }
}

fn build_engine(movies: Vec<RawMovie>, similarity: Vec<Vec<f64>>) -> RecommendationEngine {
    let tmdb_id_to_index = movies
        .iter()
        .enumerate()
        .map(|(row, m)| (m.tmdb_id, row))
        .collect();
    let snapshot = ModelSnapshot::from_artifact(ModelArtifact {
        movies,
        similarity,
        tmdb_id_to_index,
    })
    .unwrap();
    RecommendationEngine::new(Arc::new(snapshot), EngineConfig::default())
}

/// Four movies; movie 100 is the reference. Movie 300 is more similar than
/// 400 but has too few ratings.
fn four_movie_engine() -> RecommendationEngine {
    build_engine(
        vec![
            raw_movie(100, "Action|Adventure", "heist", 500, 4.0),
            raw_movie(200, "Action", "heist twist", 100, 3.8),
            raw_movie(300, "Drama", "slow", 10, 4.5),
            raw_movie(400, "Comedy|Action", "buddy", 75, 3.1),
        ],
        vec![
            vec![1.0, 0.9, 0.5, 0.2],
            vec![0.9, 1.0, 0.3, 0.4],
            vec![0.5, 0.3, 1.0, 0.6],
            vec![0.2, 0.4, 0.6, 1.0],
        ],
    )
}

/// Thirty movies with plenty of score ties, for invariant checks
fn synthetic_engine() -> RecommendationEngine {
    const N: usize = 30;
    let genre_pool = ["Action|Thriller", "Drama", "Comedy|Romance", "Horror", "Sci-Fi|Action", "Animation|Children's"];
    let tag_pool = ["dark gritty", "feel-good", "twist", "classic cult", "space", ""];

    let movies = (0..N)
        .map(|i| {
            raw_movie(
                1000 + i as MovieId,
                genre_pool[i % genre_pool.len()],
                tag_pool[(i * 7) % tag_pool.len()],
                ((i * 37) % 200) as u32,
                1.0 + (i % 9) as f32 * 0.5,
            )
        })
        .collect();

    let similarity = (0..N)
        .map(|i| {
            (0..N)
                .map(|j| if i == j { 1.0 } else { ((i + j + (i * j) % 5) % 11) as f64 / 10.0 })
                .collect()
        })
        .collect();

    build_engine(movies, similarity)
}

fn ids(recommendations: &[Recommendation]) -> Vec<MovieId> {
    recommendations.iter().map(|r| r.movie_id).collect()
}

// ============================================================================
// Scenarios
// ============================================================================

#[test]
fn test_filter_skips_higher_scored_excluded_candidate() {
    let engine = four_movie_engine();

    let query = engine.query(100).with_limit(2).with_min_rating_count(50);
    let recommendations = engine.recommend(&query).unwrap();

    assert_eq!(
        recommendations,
        vec![
            Recommendation { movie_id: 200, similarity_score: 0.9 },
            Recommendation { movie_id: 400, similarity_score: 0.2 },
        ]
    );
}

#[test]
fn test_unmatched_genre_is_empty_result() {
    let engine = four_movie_engine();

    let query = engine.query(100).with_genres([Genre::Horror]);
    assert_eq!(
        engine.recommend(&query),
        Err(RecommendError::EmptyResult { movie_id: 100 })
    );
}

#[test]
fn test_equal_similarity_prefers_higher_rating() {
    // B (row 1) precedes A (row 2) in scan order; A is rated higher
    let engine = build_engine(
        vec![
            raw_movie(1, "Drama", "", 100, 4.0),
            raw_movie(2, "Drama", "", 100, 3.9),
            raw_movie(3, "Drama", "", 100, 4.2),
        ],
        vec![
            vec![1.0, 0.7, 0.7],
            vec![0.7, 1.0, 0.2],
            vec![0.7, 0.2, 1.0],
        ],
    );

    let recommendations = engine.recommend(&engine.query(1)).unwrap();
    assert_eq!(ids(&recommendations), vec![3, 2]);
}

#[test]
fn test_self_score_tie_keeps_the_other_movie() {
    // Movie 20's self-similarity ties with its similarity to movie 10
    let engine = build_engine(
        vec![
            raw_movie(10, "Drama", "", 100, 4.0),
            raw_movie(20, "Drama", "", 100, 4.0),
            raw_movie(30, "Drama", "", 100, 4.0),
        ],
        vec![
            vec![1.0, 1.0, 0.3],
            vec![1.0, 1.0, 0.5],
            vec![0.3, 0.5, 1.0],
        ],
    );

    let recommendations = engine.recommend(&engine.query(20)).unwrap();
    assert_eq!(ids(&recommendations), vec![10, 30]);
}

#[test]
fn test_tag_filter_is_case_insensitive() {
    let engine = four_movie_engine();

    let query = engine.query(100).with_min_rating_count(1).with_tags([" TWIST "]);
    let recommendations = engine.recommend(&query).unwrap();
    assert_eq!(ids(&recommendations), vec![200]);
}

#[test]
fn test_genre_and_tag_filters_combine() {
    let engine = four_movie_engine();

    let query = engine
        .query(100)
        .with_min_rating_count(1)
        .with_genres([Genre::Action])
        .with_tags(["buddy", "slow"]);
    let recommendations = engine.recommend(&query).unwrap();
    assert_eq!(ids(&recommendations), vec![400]);
}

#[test]
fn test_unknown_movie_is_not_found() {
    let engine = four_movie_engine();

    assert_eq!(
        engine.recommend(&engine.query(999)),
        Err(RecommendError::NotFound { movie_id: 999 })
    );
}

#[test]
fn test_invalid_parameters_are_validation_errors() {
    let engine = four_movie_engine();

    let zero_limit = engine.query(100).with_limit(0);
    assert!(matches!(engine.recommend(&zero_limit), Err(RecommendError::Validation(_))));

    let over_limit = engine.query(100).with_limit(21);
    assert!(matches!(engine.recommend(&over_limit), Err(RecommendError::Validation(_))));

    assert!(matches!(parse_genres(["horror", "gothic"]), Err(RecommendError::Validation(_))));
}

#[test]
fn test_custom_engine_config_bounds() {
    let engine = four_movie_engine();
    let config = EngineConfig {
        default_limit: 1,
        max_limit: 2,
        default_min_rating_count: 1,
        min_rating_floor: 0,
    };
    let engine = RecommendationEngine::new(engine.snapshot().clone(), config);

    let recommendations = engine.recommend(&engine.query(100)).unwrap();
    assert_eq!(ids(&recommendations), vec![200]);

    let too_many = engine.query(100).with_limit(3);
    assert!(matches!(engine.recommend(&too_many), Err(RecommendError::Validation(_))));
}

// ============================================================================
// Invariants over every movie
// ============================================================================

fn queries_for(movie_id: MovieId) -> Vec<RecommendationQuery> {
    vec![
        RecommendationQuery::new(movie_id),
        RecommendationQuery::new(movie_id).with_limit(20).with_min_rating_count(1),
        RecommendationQuery::new(movie_id).with_limit(3).with_min_rating_count(100),
        RecommendationQuery::new(movie_id)
            .with_min_rating_count(1)
            .with_genres([Genre::Action, Genre::Horror]),
        RecommendationQuery::new(movie_id)
            .with_limit(5)
            .with_min_rating_count(20)
            .with_tags(["twist", "space"]),
        RecommendationQuery::new(movie_id)
            .with_min_rating_count(1)
            .with_genres([Genre::Drama, Genre::Children])
            .with_tags(["feel-good", "dark"]),
    ]
}

#[test]
fn test_result_invariants_hold_for_every_movie() {
    let engine = synthetic_engine();
    let snapshot = engine.snapshot().clone();
    let catalog = snapshot.catalog();
    let index = snapshot.index();

    for &movie_id in index.ids() {
        let source_row = index.resolve(movie_id).unwrap();

        for query in queries_for(movie_id) {
            let pipeline = query.filter_pipeline();
            let recommendations = match engine.recommend(&query) {
                Ok(recs) => recs,
                Err(RecommendError::EmptyResult { .. }) => {
                    // Only legitimate when nothing else passes the filters
                    assert!(catalog
                        .iter()
                        .filter(|r| r.row_index != source_row)
                        .all(|r| !pipeline.accepts(r)));
                    continue;
                }
                Err(other) => panic!("unexpected error for {movie_id}: {other}"),
            };

            assert!(!recommendations.is_empty());
            assert!(recommendations.len() <= query.limit);

            let returned: HashSet<MovieId> = ids(&recommendations).into_iter().collect();
            assert_eq!(returned.len(), recommendations.len(), "no duplicates");
            assert!(!returned.contains(&movie_id), "source never recommended");

            for rec in &recommendations {
                let record = catalog.get(index.resolve(rec.movie_id).unwrap());
                assert!(record.rating_count >= query.min_rating_count);
                if let Some(genres) = &query.genres {
                    assert!(genres.iter().any(|g| record.genres.contains(g.as_str())));
                }
                if let Some(tags) = &query.tags {
                    assert!(tags.iter().any(|t| record.tags.contains(t)));
                }
                assert_eq!(
                    rec.similarity_score,
                    snapshot.matrix().score(source_row, record.row_index)
                );
            }

            for pair in recommendations.windows(2) {
                let a = catalog.get(index.resolve(pair[0].movie_id).unwrap());
                let b = catalog.get(index.resolve(pair[1].movie_id).unwrap());
                assert!(
                    pair[0].similarity_score > pair[1].similarity_score
                        || (pair[0].similarity_score == pair[1].similarity_score
                            && a.average_rating >= b.average_rating),
                    "results must be ordered by (score desc, rating desc)"
                );
            }

            // Nothing that passes the filters and was left out beats what was returned
            let weakest = recommendations
                .iter()
                .map(|r| r.similarity_score)
                .fold(f64::INFINITY, f64::min);
            for record in catalog.iter() {
                if record.row_index == source_row || returned.contains(&record.movie_id) {
                    continue;
                }
                if pipeline.accepts(record) {
                    assert!(snapshot.matrix().score(source_row, record.row_index) <= weakest);
                }
            }
        }
    }
}

#[test]
fn test_results_are_deterministic() {
    let engine = synthetic_engine();
    let query = RecommendationQuery::new(1004).with_limit(20).with_min_rating_count(1);

    let first = engine.recommend(&query).unwrap();
    for _ in 0..5 {
        assert_eq!(engine.recommend(&query).unwrap(), first);
    }
}

#[test]
fn test_concurrent_calls_share_one_snapshot() {
    let engine = synthetic_engine();
    let expected: Vec<_> = (0..30)
        .map(|i| engine.recommend(&RecommendationQuery::new(1000 + i).with_min_rating_count(1)))
        .collect();

    std::thread::scope(|scope| {
        for _ in 0..4 {
            let engine = engine.clone();
            let expected = &expected;
            scope.spawn(move || {
                for (i, want) in expected.iter().enumerate() {
                    let query = RecommendationQuery::new(1000 + i as MovieId).with_min_rating_count(1);
                    assert_eq!(&engine.recommend(&query), want);
                }
            });
        }
    });
}
