//! System prompts and per-call input builders for every agent kind.
//!
//! Every prompt that expects structured output spells out the exact JSON
//! object it wants; the JSON-mode hint alone is not enough for smaller models.

use serde::Deserialize;

/// Response language for user-facing agent output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    Vi,
}

impl Language {
    fn instruction(&self) -> &'static str {
        match self {
            Language::En => "IMPORTANT: Write the ENTIRE response in English.",
            Language::Vi => {
                "IMPORTANT: Write the ENTIRE response in Vietnamese (Tiếng Việt). \
                 All analysis, thinking, recommendations, and improvements must be in Vietnamese."
            }
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// System prompts
// ────────────────────────────────────────────────────────────────────────────

pub const JD_ANALYSIS_SYSTEM: &str = "\
You are an expert HR and recruitment specialist focused on analyzing and evaluating job descriptions.

Your task is to:
1. Evaluate the quality and effectiveness of job descriptions
2. Identify strengths and weaknesses
3. Provide actionable recommendations for improvement
4. Score the overall quality

When analyzing a JD, focus on:
- Clarity and conciseness
- Inclusive language and bias-free content
- Realistic requirements and expectations
- Clear description of responsibilities
- Attraction factors (benefits, culture, growth)
- Proper structure and formatting

IMPORTANT: Always respond with a single valid JSON object following the exact structure provided. \
Include a \"thinking\" field with your internal reasoning process.";

pub const JD_REWRITE_SYSTEM: &str = "\
You are an expert HR and recruitment specialist. Your task is to analyze and improve job \
descriptions to make them more attractive to candidates while maintaining accuracy.

When rewriting a JD, focus on:
1. Clarity and conciseness
2. Highlighting benefits and growth opportunities
3. Using inclusive language
4. Proper formatting and structure
5. Emphasizing company culture and values

IMPORTANT: Always respond with a single valid JSON object following the exact structure provided. \
Include a \"thinking\" field with your internal reasoning process.";

pub const CANDIDATE_SCORE_SYSTEM: &str = "\
You are an expert HR recruiter. Your task is to score a candidate against a job description, \
from 0 to 100, and explain the score. Be objective, but recognize potential and transferable skills.

IMPORTANT: Always respond with a single valid JSON object following the exact structure provided.";

pub const CV_READER_SYSTEM: &str = "\
You are an expert in reading and extracting information from CVs and resumes. \
Extract the following from the provided CV content:
- personal_info (name, email, phone, job_title, dob, address)
- education (university, major, start_date, end_date, descriptions)
- work_experience (company, position, start_date, end_date, descriptions)
- skills (name, levels, descriptions)

Dates use yyyy, yyyy-mm, or yyyy-mm-dd. Use an empty string for anything the CV does not state.

IMPORTANT: Respond with a single valid JSON object with keys in snake_case.";

pub const CANDIDATE_SUMMARY_SYSTEM: &str = "\
You are an expert at creating concise, professional candidate summaries. \
Highlight key achievements, qualifications, and skills.

IMPORTANT: Always respond with a single valid JSON object following the exact structure provided.";

// ────────────────────────────────────────────────────────────────────────────
// Per-call input builders
// ────────────────────────────────────────────────────────────────────────────

pub fn analysis_input(jd_text: &str, language: Language) -> String {
    format!(
        r#"{lang}

Analyze and evaluate this job description.

JOB DESCRIPTION:
{jd_text}

You MUST respond with a valid JSON object following this exact structure:
{{
    "thinking": "Your detailed reasoning process here",
    "overall_score": 75,
    "key_recommendations": ["recommendation 1", "recommendation 2"],
    "improvements": [
        {{
            "section": "Section name",
            "original": "Original text",
            "improved": "Improved text",
            "reason": "Why this is better"
        }}
    ]
}}

IMPORTANT: Return ONLY valid JSON, no other text before or after."#,
        lang = language.instruction(),
    )
}

pub fn rewrite_input(jd_text: &str, focus_areas: &[String], language: Language) -> String {
    let focus = if focus_areas.is_empty() {
        "overall quality".to_string()
    } else {
        focus_areas.join(", ")
    };
    format!(
        r#"{lang}

Rewrite this job description focusing on {focus}.

ORIGINAL JD:
{jd_text}

You MUST respond with a valid JSON object following this exact structure:
{{
    "thinking": "Your reasoning about improvements",
    "rewritten_jd": "Complete rewritten job description here",
    "key_changes": ["change 1", "change 2", "change 3"]
}}

IMPORTANT: Return ONLY valid JSON, no other text before or after."#,
        lang = language.instruction(),
    )
}

/// Requirements for generating a JD from scratch.
#[derive(Debug, Clone, Deserialize)]
pub struct JdRequirements {
    pub position: String,
    pub experience_years: u32,
    pub required_skills: String,
    pub salary_range: String,
    #[serde(default = "default_job_type")]
    pub job_type: String,
    #[serde(default = "default_location")]
    pub location: String,
}

fn default_job_type() -> String {
    "Full-time".to_string()
}

fn default_location() -> String {
    "Not specified".to_string()
}

pub fn generate_input(requirements: &JdRequirements, language: Language) -> String {
    format!(
        r#"{lang}

Generate a complete job description based on these requirements:

Position: {position}
Experience: {experience_years} years
Skills: {required_skills}
Salary Range: {salary_range}
Job Type: {job_type}
Location: {location}

You MUST respond with a valid JSON object following this exact structure:
{{
    "thinking": "Your reasoning",
    "job_description": "Complete job description text",
    "title": "Job title",
    "key_highlights": ["highlight 1", "highlight 2"]
}}

IMPORTANT: Return ONLY valid JSON, no other text before or after."#,
        lang = language.instruction(),
        position = requirements.position,
        experience_years = requirements.experience_years,
        required_skills = requirements.required_skills,
        salary_range = requirements.salary_range,
        job_type = requirements.job_type,
        location = requirements.location,
    )
}

pub fn score_input(
    candidate_name: &str,
    candidate_bio: &str,
    jd_text: &str,
    required_skills: &str,
    additional_instructions: &str,
) -> String {
    format!(
        r#"Score this candidate against the job description.

CANDIDATE:
Name: {candidate_name}
Bio: {candidate_bio}

JOB DESCRIPTION:
{jd_text}

REQUIRED SKILLS:
{required_skills}

ADDITIONAL INSTRUCTIONS:
{additional_instructions}

You MUST respond with a valid JSON object following this exact structure:
{{
    "thinking": "Your reasoning",
    "overall_score": 70,
    "reason": "Explanation for the score"
}}

IMPORTANT: Return ONLY valid JSON, no other text before or after."#,
    )
}

pub fn cv_input(cv_text: &str) -> String {
    format!("Extract information from this CV content:\n\n{cv_text}")
}

pub fn summary_input(profile_json: &serde_json::Value) -> String {
    format!(
        r#"Create a professional summary for this candidate profile:

{profile}

You MUST respond with a valid JSON object following this exact structure:
{{
    "thinking": "Your reasoning",
    "summary": "Concise professional summary (2-3 sentences)",
    "key_skills": ["skill 1", "skill 2"],
    "highlights": ["notable achievement or experience"]
}}

IMPORTANT: Return ONLY valid JSON, no other text before or after."#,
        profile = serde_json::to_string_pretty(profile_json).unwrap_or_default(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_language_instruction_switches() {
        assert!(Language::En.instruction().contains("English"));
        assert!(Language::Vi.instruction().contains("Tiếng Việt"));
    }

    #[test]
    fn test_language_deserializes_lowercase() {
        let lang: Language = serde_json::from_str("\"vi\"").unwrap();
        assert_eq!(lang, Language::Vi);
        let lang: Language = serde_json::from_str("\"en\"").unwrap();
        assert_eq!(lang, Language::En);
    }

    #[test]
    fn test_analysis_input_embeds_jd_and_structure() {
        let input = analysis_input("We need a dev.", Language::En);
        assert!(input.contains("We need a dev."));
        assert!(input.contains("\"overall_score\""));
        assert!(input.contains("Return ONLY valid JSON"));
    }

    #[test]
    fn test_rewrite_input_defaults_focus() {
        let input = rewrite_input("JD text", &[], Language::En);
        assert!(input.contains("focusing on overall quality"));

        let focused = rewrite_input(
            "JD text",
            &["clarity".to_string(), "tone".to_string()],
            Language::En,
        );
        assert!(focused.contains("focusing on clarity, tone"));
    }

    #[test]
    fn test_requirements_defaults() {
        let req: JdRequirements = serde_json::from_str(
            r#"{"position": "Backend Engineer", "experience_years": 3,
                "required_skills": "Rust", "salary_range": "Negotiable"}"#,
        )
        .unwrap();
        assert_eq!(req.job_type, "Full-time");
        assert_eq!(req.location, "Not specified");
    }
}
