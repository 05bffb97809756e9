//! Job-description CRUD. A single JD is "active" at a time; scoring runs
//! against the active one.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::jd::JobDescriptionRow;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateJdRequest {
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub skills: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateJdRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub skills: Option<String>,
}

/// GET /api/v1/job-descriptions
pub async fn handle_list_jds(
    State(state): State<AppState>,
) -> Result<Json<Vec<JobDescriptionRow>>, AppError> {
    let rows: Vec<JobDescriptionRow> =
        sqlx::query_as("SELECT * FROM job_descriptions ORDER BY created_at DESC")
            .fetch_all(&state.db)
            .await?;
    Ok(Json(rows))
}

/// POST /api/v1/job-descriptions
pub async fn handle_create_jd(
    State(state): State<AppState>,
    Json(req): Json<CreateJdRequest>,
) -> Result<(StatusCode, Json<JobDescriptionRow>), AppError> {
    if req.title.trim().is_empty() {
        return Err(AppError::Validation("title cannot be empty".to_string()));
    }
    if req.description.trim().is_empty() {
        return Err(AppError::Validation(
            "description cannot be empty".to_string(),
        ));
    }

    let row: JobDescriptionRow = sqlx::query_as(
        r#"
        INSERT INTO job_descriptions (id, title, description, skills, is_active, created_at, updated_at)
        VALUES ($1, $2, $3, $4, false, now(), now())
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(&req.title)
    .bind(&req.description)
    .bind(&req.skills)
    .fetch_one(&state.db)
    .await?;

    Ok((StatusCode::CREATED, Json(row)))
}

/// GET /api/v1/job-descriptions/:id
pub async fn handle_get_jd(
    State(state): State<AppState>,
    Path(jd_id): Path<Uuid>,
) -> Result<Json<JobDescriptionRow>, AppError> {
    fetch_jd(&state, jd_id).await.map(Json)
}

/// PUT /api/v1/job-descriptions/:id
pub async fn handle_update_jd(
    State(state): State<AppState>,
    Path(jd_id): Path<Uuid>,
    Json(req): Json<UpdateJdRequest>,
) -> Result<Json<JobDescriptionRow>, AppError> {
    let existing = fetch_jd(&state, jd_id).await?;

    let row: JobDescriptionRow = sqlx::query_as(
        r#"
        UPDATE job_descriptions
        SET title = $1, description = $2, skills = $3, updated_at = now()
        WHERE id = $4
        RETURNING *
        "#,
    )
    .bind(req.title.unwrap_or(existing.title))
    .bind(req.description.unwrap_or(existing.description))
    .bind(req.skills.unwrap_or(existing.skills))
    .bind(jd_id)
    .fetch_one(&state.db)
    .await?;

    Ok(Json(row))
}

/// DELETE /api/v1/job-descriptions/:id
pub async fn handle_delete_jd(
    State(state): State<AppState>,
    Path(jd_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    let result = sqlx::query("DELETE FROM job_descriptions WHERE id = $1")
        .bind(jd_id)
        .execute(&state.db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound(format!("JD {jd_id} not found")));
    }
    Ok(StatusCode::NO_CONTENT)
}

/// PUT /api/v1/job-descriptions/:id/activate
///
/// Deactivates every other JD and activates this one, atomically.
pub async fn handle_activate_jd(
    State(state): State<AppState>,
    Path(jd_id): Path<Uuid>,
) -> Result<Json<JobDescriptionRow>, AppError> {
    let mut tx = state.db.begin().await?;

    sqlx::query("UPDATE job_descriptions SET is_active = false WHERE is_active = true")
        .execute(&mut *tx)
        .await?;

    let row: Option<JobDescriptionRow> = sqlx::query_as(
        "UPDATE job_descriptions SET is_active = true, updated_at = now() WHERE id = $1 RETURNING *",
    )
    .bind(jd_id)
    .fetch_optional(&mut *tx)
    .await?;

    let row = row.ok_or_else(|| AppError::NotFound(format!("JD {jd_id} not found")))?;
    tx.commit().await?;

    Ok(Json(row))
}

pub(crate) async fn fetch_jd(state: &AppState, jd_id: Uuid) -> Result<JobDescriptionRow, AppError> {
    let row: Option<JobDescriptionRow> = sqlx::query_as("SELECT * FROM job_descriptions WHERE id = $1")
        .bind(jd_id)
        .fetch_optional(&state.db)
        .await?;
    row.ok_or_else(|| AppError::NotFound(format!("JD {jd_id} not found")))
}

pub(crate) async fn fetch_active_jd(state: &AppState) -> Result<JobDescriptionRow, AppError> {
    let row: Option<JobDescriptionRow> =
        sqlx::query_as("SELECT * FROM job_descriptions WHERE is_active = true LIMIT 1")
            .fetch_optional(&state.db)
            .await?;
    row.ok_or_else(|| AppError::NotFound("No active job description".to_string()))
}
