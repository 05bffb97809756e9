//! Scoring endpoints: run the scoring agent over candidates and persist
//! results.

use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

use crate::agents;
use crate::agents::outputs::CandidateScoreOutput;
use crate::agents::prompts;
use crate::errors::AppError;
use crate::models::candidate::CandidateRow;
use crate::models::score::{ScoreRow, ScoreWithCandidateRow};
use crate::routes::jd::{fetch_active_jd, fetch_jd};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ScoreAllRequest {
    #[serde(default)]
    pub additional_instructions: String,
}

#[derive(Debug, Serialize)]
pub struct ScoreAllResponse {
    pub jd_id: Uuid,
    pub scores: Vec<ScoreRow>,
    /// Candidates whose scoring call failed this run; they keep any prior score.
    pub failed: Vec<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct ScoresQuery {
    pub jd_id: Option<Uuid>,
}

/// POST /api/v1/scoring/score-all
///
/// Scores every candidate against the active JD. One failing candidate does
/// not abort the run; failures are reported alongside the successes.
pub async fn handle_score_all(
    State(state): State<AppState>,
    Json(req): Json<ScoreAllRequest>,
) -> Result<Json<ScoreAllResponse>, AppError> {
    let jd = fetch_active_jd(&state).await?;

    let candidates: Vec<CandidateRow> =
        sqlx::query_as("SELECT * FROM candidates ORDER BY created_at")
            .fetch_all(&state.db)
            .await?;

    let scorer = agents::candidate_scorer(state.llm.clone());
    let mut scores = Vec::new();
    let mut failed = Vec::new();

    for candidate in &candidates {
        let input = prompts::score_input(
            &candidate.name,
            &candidate.bio,
            &jd.description,
            &jd.skills,
            &req.additional_instructions,
        );

        let output: CandidateScoreOutput = match scorer.complete(&input).await {
            Ok(record) => record.parse().map_err(anyhow::Error::from)?,
            Err(e) => {
                warn!(
                    "Scoring failed for candidate {}: {}",
                    candidate.id, e.message
                );
                failed.push(candidate.id);
                continue;
            }
        };

        // One score per (candidate, jd): re-scoring replaces the old row.
        sqlx::query("DELETE FROM scores WHERE candidate_id = $1 AND jd_id = $2")
            .bind(candidate.id)
            .bind(jd.id)
            .execute(&state.db)
            .await?;

        let row: ScoreRow = sqlx::query_as(
            r#"
            INSERT INTO scores (id, candidate_id, jd_id, score, reason, scored_at)
            VALUES ($1, $2, $3, $4, $5, now())
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(candidate.id)
        .bind(jd.id)
        .bind(output.overall_score as i32)
        .bind(&output.reason)
        .fetch_one(&state.db)
        .await?;

        scores.push(row);
    }

    Ok(Json(ScoreAllResponse {
        jd_id: jd.id,
        scores,
        failed,
    }))
}

/// GET /api/v1/scoring/scores?jd_id=...
///
/// Lists scores for the given JD, or the active JD when none is given.
pub async fn handle_list_scores(
    State(state): State<AppState>,
    Query(params): Query<ScoresQuery>,
) -> Result<Json<Vec<ScoreWithCandidateRow>>, AppError> {
    let jd = match params.jd_id {
        Some(id) => fetch_jd(&state, id).await?,
        None => fetch_active_jd(&state).await?,
    };

    let rows: Vec<ScoreWithCandidateRow> = sqlx::query_as(
        r#"
        SELECT s.id, s.candidate_id, c.name AS candidate_name,
               s.jd_id, s.score, s.reason, s.scored_at
        FROM scores s
        JOIN candidates c ON c.id = s.candidate_id
        WHERE s.jd_id = $1
        ORDER BY s.score DESC
        "#,
    )
    .bind(jd.id)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(rows))
}
