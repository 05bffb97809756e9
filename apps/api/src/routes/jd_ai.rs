//! JD AI endpoints: analyze / rewrite / generate, one-shot and streaming.
//!
//! Streaming endpoints relay the agent's event sequence as server-sent
//! events with a three-kind taxonomy: `thinking` for each delta, then exactly
//! one `final` or `error`. Failures are always relayed with the raw model
//! output attached, never dropped.

use std::convert::Infallible;

use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::Json;
use futures::stream::Stream;
use futures::StreamExt;
use serde::Deserialize;
use serde_json::json;

use crate::agents;
use crate::agents::outputs::{JdAnalysis, JdGenerate, JdRewrite};
use crate::agents::prompts::{self, JdRequirements, Language};
use crate::errors::AppError;
use crate::state::AppState;
use crate::structured::SessionEvent;

/// Cap on improvement suggestions returned to the client.
const MAX_IMPROVEMENTS: usize = 5;

// ────────────────────────────────────────────────────────────────────────────
// Request types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct AnalyzeJdRequest {
    pub jd_text: String,
    #[serde(default)]
    pub language: Language,
}

#[derive(Debug, Deserialize)]
pub struct RewriteJdRequest {
    pub jd_text: String,
    #[serde(default)]
    pub focus_areas: Vec<String>,
    #[serde(default)]
    pub language: Language,
}

#[derive(Debug, Deserialize)]
pub struct GenerateJdRequest {
    #[serde(flatten)]
    pub requirements: JdRequirements,
    #[serde(default)]
    pub language: Language,
}

fn require_jd_text(jd_text: &str) -> Result<(), AppError> {
    if jd_text.trim().is_empty() {
        return Err(AppError::Validation("jd_text cannot be empty".to_string()));
    }
    Ok(())
}

// ────────────────────────────────────────────────────────────────────────────
// One-shot handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/jd-ai/analyze
pub async fn handle_analyze(
    State(state): State<AppState>,
    Json(req): Json<AnalyzeJdRequest>,
) -> Result<Json<JdAnalysis>, AppError> {
    require_jd_text(&req.jd_text)?;

    let session = agents::jd_analysis(state.llm.clone());
    let record = session
        .complete(&prompts::analysis_input(&req.jd_text, req.language))
        .await?;

    let mut analysis: JdAnalysis = record.parse().map_err(anyhow::Error::from)?;
    analysis.improvements.truncate(MAX_IMPROVEMENTS);
    Ok(Json(analysis))
}

/// POST /api/v1/jd-ai/rewrite
pub async fn handle_rewrite(
    State(state): State<AppState>,
    Json(req): Json<RewriteJdRequest>,
) -> Result<Json<JdRewrite>, AppError> {
    require_jd_text(&req.jd_text)?;

    let session = agents::jd_rewriter(state.llm.clone());
    let record = session
        .complete(&prompts::rewrite_input(
            &req.jd_text,
            &req.focus_areas,
            req.language,
        ))
        .await?;

    let rewrite: JdRewrite = record.parse().map_err(anyhow::Error::from)?;
    Ok(Json(rewrite))
}

/// POST /api/v1/jd-ai/generate
pub async fn handle_generate(
    State(state): State<AppState>,
    Json(req): Json<GenerateJdRequest>,
) -> Result<Json<JdGenerate>, AppError> {
    if req.requirements.position.trim().is_empty() {
        return Err(AppError::Validation("position cannot be empty".to_string()));
    }

    let session = agents::jd_generator(state.llm.clone());
    let record = session
        .complete(&prompts::generate_input(&req.requirements, req.language))
        .await?;

    let generated: JdGenerate = record.parse().map_err(anyhow::Error::from)?;
    Ok(Json(generated))
}

// ────────────────────────────────────────────────────────────────────────────
// Streaming handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/jd-ai/analyze-stream
pub async fn handle_analyze_stream(
    State(state): State<AppState>,
    Json(req): Json<AnalyzeJdRequest>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, AppError> {
    require_jd_text(&req.jd_text)?;

    let session = agents::jd_analysis(state.llm.clone());
    let events = session
        .stream_complete(&prompts::analysis_input(&req.jd_text, req.language))
        .await;

    Ok(relay_sse(events))
}

/// POST /api/v1/jd-ai/rewrite-stream
pub async fn handle_rewrite_stream(
    State(state): State<AppState>,
    Json(req): Json<RewriteJdRequest>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, AppError> {
    require_jd_text(&req.jd_text)?;

    let session = agents::jd_rewriter(state.llm.clone());
    let events = session
        .stream_complete(&prompts::rewrite_input(
            &req.jd_text,
            &req.focus_areas,
            req.language,
        ))
        .await;

    Ok(relay_sse(events))
}

fn relay_sse(
    events: impl Stream<Item = SessionEvent> + Send + 'static,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let stream = events.map(|event| Ok(Event::default().data(relay_payload(&event).to_string())));
    Sse::new(stream).keep_alive(KeepAlive::default())
}

/// Maps one session event onto the wire taxonomy consumed by the frontend.
fn relay_payload(event: &SessionEvent) -> serde_json::Value {
    match event {
        SessionEvent::Progress(p) => json!({
            "type": "thinking",
            "content": p.delta,
            "accumulated": p.accumulated,
        }),
        SessionEvent::Resolved(record) => json!({
            "type": "final",
            "data": record.to_json(),
        }),
        SessionEvent::Failed(record) => json!({
            "type": "error",
            "error": record.message,
            "raw_content": record.raw_buffer,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::structured::accumulator::ProgressEvent;
    use crate::structured::{ErrorKind, ErrorRecord, ResolvedRecord};

    #[test]
    fn test_progress_payload() {
        let event = SessionEvent::Progress(ProgressEvent {
            delta: "{\"over".to_string(),
            accumulated: "{\"over".to_string(),
        });
        let payload = relay_payload(&event);
        assert_eq!(payload["type"], "thinking");
        assert_eq!(payload["content"], "{\"over");
        assert_eq!(payload["accumulated"], "{\"over");
    }

    #[test]
    fn test_final_payload_carries_record_fields() {
        let mut fields = serde_json::Map::new();
        fields.insert("overall_score".to_string(), json!(80));
        let event = SessionEvent::Resolved(ResolvedRecord {
            shape: "jd_analysis",
            fields,
        });
        let payload = relay_payload(&event);
        assert_eq!(payload["type"], "final");
        assert_eq!(payload["data"]["overall_score"], 80);
    }

    #[test]
    fn test_error_payload_attaches_raw_content() {
        let event = SessionEvent::Failed(ErrorRecord {
            kind: ErrorKind::Decode,
            message: "expected value".to_string(),
            raw_buffer: "sorry, no JSON".to_string(),
        });
        let payload = relay_payload(&event);
        assert_eq!(payload["type"], "error");
        assert_eq!(payload["error"], "expected value");
        assert_eq!(payload["raw_content"], "sorry, no JSON");
    }
}
