use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CandidateRow {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    /// AI-generated professional summary.
    pub bio: String,
    pub skills: String,
    /// Structured profile extracted from the CV.
    pub profile: Option<Value>,
    /// Raw text extracted from the uploaded CV.
    pub cv_text: Option<String>,
    pub created_at: DateTime<Utc>,
}
