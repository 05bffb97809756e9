pub mod candidates;
pub mod health;
pub mod jd;
pub mod jd_ai;
pub mod scores;

use axum::{
    routing::{get, post, put},
    Router,
};

use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Candidates
        .route(
            "/api/v1/candidates/upload-cv",
            post(candidates::handle_upload_cv),
        )
        .route("/api/v1/candidates", get(candidates::handle_list_candidates))
        .route(
            "/api/v1/candidates/:id",
            get(candidates::handle_get_candidate).delete(candidates::handle_delete_candidate),
        )
        // Job descriptions
        .route(
            "/api/v1/job-descriptions",
            get(jd::handle_list_jds).post(jd::handle_create_jd),
        )
        .route(
            "/api/v1/job-descriptions/:id",
            get(jd::handle_get_jd)
                .put(jd::handle_update_jd)
                .delete(jd::handle_delete_jd),
        )
        .route(
            "/api/v1/job-descriptions/:id/activate",
            put(jd::handle_activate_jd),
        )
        // Scoring
        .route("/api/v1/scoring/score-all", post(scores::handle_score_all))
        .route("/api/v1/scoring/scores", get(scores::handle_list_scores))
        // JD AI
        .route("/api/v1/jd-ai/analyze", post(jd_ai::handle_analyze))
        .route(
            "/api/v1/jd-ai/analyze-stream",
            post(jd_ai::handle_analyze_stream),
        )
        .route("/api/v1/jd-ai/rewrite", post(jd_ai::handle_rewrite))
        .route(
            "/api/v1/jd-ai/rewrite-stream",
            post(jd_ai::handle_rewrite_stream),
        )
        .route("/api/v1/jd-ai/generate", post(jd_ai::handle_generate))
        .with_state(state)
}
