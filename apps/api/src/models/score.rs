use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ScoreRow {
    pub id: Uuid,
    pub candidate_id: Uuid,
    pub jd_id: Uuid,
    pub score: i32,
    pub reason: String,
    pub scored_at: DateTime<Utc>,
}

/// Score row joined with the candidate's name for listing.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ScoreWithCandidateRow {
    pub id: Uuid,
    pub candidate_id: Uuid,
    pub candidate_name: String,
    pub jd_id: Uuid,
    pub score: i32,
    pub reason: String,
    pub scored_at: DateTime<Utc>,
}
