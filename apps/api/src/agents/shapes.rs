//! Output shape declarations, one per agent kind. Defined once, immutable.

use crate::structured::{FieldKind, OutputShape};

fn percent() -> FieldKind {
    FieldKind::Integer {
        min: Some(0),
        max: Some(100),
    }
}

/// JD analysis: quality score plus actionable recommendations.
pub fn jd_analysis() -> OutputShape {
    OutputShape::new("jd_analysis")
        .field("thinking", FieldKind::OptionalString)
        .field("overall_score", percent())
        .field("key_recommendations", FieldKind::StringArray)
        .field("improvements", FieldKind::ObjectArray)
}

/// JD rewrite: full rewritten text plus a change summary.
pub fn jd_rewrite() -> OutputShape {
    OutputShape::new("jd_rewrite")
        .field("thinking", FieldKind::OptionalString)
        .field("rewritten_jd", FieldKind::String)
        .field("key_changes", FieldKind::StringArray)
}

/// JD generation from structured requirements.
pub fn jd_generate() -> OutputShape {
    OutputShape::new("jd_generate")
        .field("thinking", FieldKind::OptionalString)
        .field("job_description", FieldKind::String)
        .field("title", FieldKind::String)
        .field("key_highlights", FieldKind::StringArray)
}

/// Candidate-vs-JD match score. Candidate identity is attached by the
/// caller, not echoed through the model.
pub fn candidate_score() -> OutputShape {
    OutputShape::new("candidate_score")
        .field("thinking", FieldKind::OptionalString)
        .field("overall_score", percent())
        .field("reason", FieldKind::String)
}

/// Structured profile extracted from raw CV text.
pub fn cv_profile() -> OutputShape {
    OutputShape::new("cv_profile")
        .field("personal_info", FieldKind::Object)
        .field("education", FieldKind::ObjectArray)
        .field("work_experience", FieldKind::ObjectArray)
        .field("skills", FieldKind::ObjectArray)
}

/// Professional summary of an extracted candidate profile.
pub fn candidate_summary() -> OutputShape {
    OutputShape::new("candidate_summary")
        .field("thinking", FieldKind::OptionalString)
        .field("summary", FieldKind::String)
        .field("key_skills", FieldKind::StringArray)
        .field("highlights", FieldKind::StringArray)
}
