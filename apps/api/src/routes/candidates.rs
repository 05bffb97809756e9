//! Candidate endpoints: CV upload (extract → profile → summary → insert) and
//! listing.

use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::agents;
use crate::agents::outputs::{CandidateProfile, CandidateSummary};
use crate::agents::prompts;
use crate::errors::AppError;
use crate::models::candidate::CandidateRow;
use crate::pdf::extract_cv_text;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct UploadCvResponse {
    pub candidates: Vec<CandidateRow>,
}

/// POST /api/v1/candidates/upload-cv
///
/// Accepts one or more PDF files as multipart form data. For each file:
/// extract text, run the CV-extraction agent, summarize, insert a candidate.
pub async fn handle_upload_cv(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadCvResponse>, AppError> {
    let mut candidates = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Invalid multipart payload: {e}")))?
    {
        let file_name = field.file_name().unwrap_or("cv.pdf").to_string();
        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::Validation(format!("Failed to read upload: {e}")))?;

        info!("Processing CV upload: {} ({} bytes)", file_name, data.len());
        let cv_text = extract_cv_text(&data)?;

        let reader = agents::cv_reader(state.llm.clone());
        let profile_record = reader.complete(&prompts::cv_input(&cv_text)).await?;
        let profile: CandidateProfile = profile_record.parse().map_err(anyhow::Error::from)?;

        let summarizer = agents::candidate_summarizer(state.llm.clone());
        let summary_record = summarizer
            .complete(&prompts::summary_input(&profile_record.to_json()))
            .await?;
        let summary: CandidateSummary = summary_record.parse().map_err(anyhow::Error::from)?;

        let name = if profile.personal_info.name.trim().is_empty() {
            file_name.trim_end_matches(".pdf").to_string()
        } else {
            profile.personal_info.name.clone()
        };
        let skills = if summary.key_skills.is_empty() {
            profile
                .skills
                .iter()
                .map(|s| s.name.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        } else {
            summary.key_skills.join(", ")
        };

        let row: CandidateRow = sqlx::query_as(
            r#"
            INSERT INTO candidates (id, name, email, bio, skills, profile, cv_text, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, now())
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&name)
        .bind(&profile.personal_info.email)
        .bind(&summary.summary)
        .bind(&skills)
        .bind(profile_record.to_json())
        .bind(&cv_text)
        .fetch_one(&state.db)
        .await?;

        candidates.push(row);
    }

    if candidates.is_empty() {
        return Err(AppError::Validation("No files uploaded".to_string()));
    }

    Ok(Json(UploadCvResponse { candidates }))
}

/// GET /api/v1/candidates
pub async fn handle_list_candidates(
    State(state): State<AppState>,
) -> Result<Json<Vec<CandidateRow>>, AppError> {
    let rows: Vec<CandidateRow> =
        sqlx::query_as("SELECT * FROM candidates ORDER BY created_at DESC")
            .fetch_all(&state.db)
            .await?;
    Ok(Json(rows))
}

/// GET /api/v1/candidates/:id
pub async fn handle_get_candidate(
    State(state): State<AppState>,
    Path(candidate_id): Path<Uuid>,
) -> Result<Json<CandidateRow>, AppError> {
    let row: Option<CandidateRow> = sqlx::query_as("SELECT * FROM candidates WHERE id = $1")
        .bind(candidate_id)
        .fetch_optional(&state.db)
        .await?;

    row.map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Candidate {candidate_id} not found")))
}

/// DELETE /api/v1/candidates/:id
pub async fn handle_delete_candidate(
    State(state): State<AppState>,
    Path(candidate_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    let result = sqlx::query("DELETE FROM candidates WHERE id = $1")
        .bind(candidate_id)
        .execute(&state.db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound(format!(
            "Candidate {candidate_id} not found"
        )));
    }
    Ok(StatusCode::NO_CONTENT)
}
