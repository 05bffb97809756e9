//! Typed views of agent output shapes.
//!
//! Shape validation is shallow (presence, type, range); these structs give
//! handlers typed access via `ResolvedRecord::parse`. Inner fields of
//! object-array elements are lenient (`serde(default)`) because the shape
//! layer deliberately does not validate them.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImprovementSuggestion {
    #[serde(default)]
    pub section: String,
    #[serde(default)]
    pub original: String,
    #[serde(default)]
    pub improved: String,
    #[serde(default)]
    pub reason: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JdAnalysis {
    pub thinking: Option<String>,
    pub overall_score: i64,
    pub key_recommendations: Vec<String>,
    pub improvements: Vec<ImprovementSuggestion>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JdRewrite {
    pub thinking: Option<String>,
    pub rewritten_jd: String,
    pub key_changes: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JdGenerate {
    pub thinking: Option<String>,
    pub job_description: String,
    pub title: String,
    pub key_highlights: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateScoreOutput {
    pub thinking: Option<String>,
    pub overall_score: i64,
    pub reason: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PersonalInfo {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub job_title: String,
    #[serde(default)]
    pub dob: String,
    #[serde(default)]
    pub address: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Education {
    #[serde(default)]
    pub university: String,
    #[serde(default)]
    pub major: String,
    #[serde(default)]
    pub start_date: String,
    #[serde(default)]
    pub end_date: String,
    #[serde(default)]
    pub descriptions: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorkExperience {
    #[serde(default)]
    pub company: String,
    #[serde(default)]
    pub position: String,
    #[serde(default)]
    pub start_date: String,
    #[serde(default)]
    pub end_date: String,
    #[serde(default)]
    pub descriptions: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SkillEntry {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub levels: i64,
    #[serde(default)]
    pub descriptions: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateProfile {
    pub personal_info: PersonalInfo,
    pub education: Vec<Education>,
    pub work_experience: Vec<WorkExperience>,
    pub skills: Vec<SkillEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateSummary {
    pub thinking: Option<String>,
    pub summary: String,
    pub key_skills: Vec<String>,
    pub highlights: Vec<String>,
}
