//! OpenAI-compatible chat-completions client (Groq by default).
//!
//! Covers Groq, OpenRouter and OpenAI itself via the configurable base URL —
//! they share the same wire format. JSON mode maps to
//! `response_format: {"type": "json_object"}`. Streaming responses arrive as
//! server-sent `data:` lines terminated by a `[DONE]` sentinel.

use std::collections::VecDeque;

use futures::stream::BoxStream;
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::llm::{ChatCompletionPort, ChatOptions, Delta, DeltaStream, Message, TransportError};

pub const DEFAULT_BASE_URL: &str = "https://api.groq.com/openai/v1";
/// Default model, matching what the hosted deployments run.
pub const DEFAULT_MODEL: &str = "llama-3.3-70b-versatile";
const MAX_TOKENS: u32 = 4096;
const MAX_RETRIES: u32 = 3;

/// Chat-completion client for any OpenAI-compatible endpoint.
#[derive(Clone)]
pub struct GroqClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl GroqClient {
    pub fn new(api_key: String, base_url: String, model: String) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(std::time::Duration::from_secs(120))
                .build()
                .expect("Failed to build HTTP client"),
            api_key,
            base_url,
            model,
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }

    fn build_request<'a>(
        &'a self,
        messages: &'a [Message],
        options: ChatOptions,
        stream: bool,
    ) -> ChatRequest<'a> {
        ChatRequest {
            model: &self.model,
            messages: messages
                .iter()
                .map(|m| WireMessage {
                    role: m.role.as_str(),
                    content: &m.content,
                })
                .collect(),
            temperature: options.temperature,
            max_tokens: MAX_TOKENS,
            stream,
            response_format: options.json_mode.then_some(ResponseFormat {
                format_type: "json_object",
            }),
        }
    }
}

#[async_trait::async_trait]
impl ChatCompletionPort for GroqClient {
    /// Makes a non-streaming call, returning the full response text.
    /// Retries on 429 (rate limit) and 5xx errors with exponential backoff.
    async fn send(
        &self,
        messages: &[Message],
        options: ChatOptions,
    ) -> Result<String, TransportError> {
        let request_body = self.build_request(messages, options, false);

        let mut last_error: Option<TransportError> = None;

        for attempt in 0..MAX_RETRIES {
            if attempt > 0 {
                // Exponential backoff: 1s, 2s, 4s
                let delay = std::time::Duration::from_millis(1000 * (1 << (attempt - 1)));
                warn!(
                    "LLM call attempt {} failed, retrying after {}ms...",
                    attempt,
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
            }

            let response = self
                .client
                .post(self.endpoint())
                .bearer_auth(&self.api_key)
                .header("content-type", "application/json")
                .json(&request_body)
                .send()
                .await;

            let response = match response {
                Ok(r) => r,
                Err(e) => {
                    last_error = Some(TransportError::Http(e));
                    continue;
                }
            };

            let status = response.status();

            if status.as_u16() == 429 || status.is_server_error() {
                let body = response.text().await.unwrap_or_default();
                warn!("LLM API returned {}: {}", status, body);
                last_error = Some(TransportError::Api {
                    status: status.as_u16(),
                    message: body,
                });
                continue;
            }

            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(TransportError::Api {
                    status: status.as_u16(),
                    message: extract_error_message(&body),
                });
            }

            let completion: ChatResponse = response
                .json()
                .await
                .map_err(TransportError::Http)?;

            let text = completion
                .choices
                .into_iter()
                .next()
                .and_then(|c| c.message.content)
                .ok_or(TransportError::EmptyContent)?;

            debug!("LLM call succeeded ({} chars)", text.len());
            return Ok(text);
        }

        Err(last_error.unwrap_or(TransportError::RateLimited {
            retries: MAX_RETRIES,
        }))
    }

    /// Opens a streaming call and returns the delta sequence.
    /// Streams are never retried; a failed connection surfaces immediately.
    async fn stream(
        &self,
        messages: &[Message],
        options: ChatOptions,
    ) -> Result<DeltaStream, TransportError> {
        let request_body = self.build_request(messages, options, true);

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .header("content-type", "application/json")
            .header("accept", "text/event-stream")
            .json(&request_body)
            .send()
            .await
            .map_err(TransportError::Http)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TransportError::Api {
                status: status.as_u16(),
                message: extract_error_message(&body),
            });
        }

        let source = response
            .bytes_stream()
            .map(|chunk| chunk.map(|b| b.to_vec()).map_err(TransportError::Http))
            .boxed();

        Ok(sse_delta_stream(source))
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Wire types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Debug, Serialize)]
struct WireMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format_type: &'static str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ResponseChoice>,
}

#[derive(Debug, Deserialize)]
struct ResponseChoice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StreamChunk {
    choices: Vec<StreamChoice>,
}

#[derive(Debug, Deserialize)]
struct StreamChoice {
    delta: StreamDelta,
}

#[derive(Debug, Deserialize)]
struct StreamDelta {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

fn extract_error_message(body: &str) -> String {
    serde_json::from_str::<ApiError>(body)
        .map(|e| e.error.message)
        .unwrap_or_else(|_| body.to_string())
}

// ────────────────────────────────────────────────────────────────────────────
// SSE framing
// ────────────────────────────────────────────────────────────────────────────

enum SseLine {
    Delta(String),
    Done,
    Skip,
}

/// Classifies one SSE line. Non-`data:` lines (events, comments, blanks) and
/// chunks without text content (role preambles, finish markers) are skipped.
fn parse_sse_line(line: &str) -> SseLine {
    let Some(payload) = line.strip_prefix("data:") else {
        return SseLine::Skip;
    };
    let payload = payload.trim();
    if payload.is_empty() {
        return SseLine::Skip;
    }
    if payload == "[DONE]" {
        return SseLine::Done;
    }
    let Ok(chunk) = serde_json::from_str::<StreamChunk>(payload) else {
        return SseLine::Skip;
    };
    match chunk.choices.into_iter().next().and_then(|c| c.delta.content) {
        Some(text) => SseLine::Delta(text),
        None => SseLine::Skip,
    }
}

struct SseState {
    source: BoxStream<'static, Result<Vec<u8>, TransportError>>,
    line_buf: String,
    pending: VecDeque<Result<Delta, TransportError>>,
    finished: bool,
}

/// Reassembles SSE `data:` lines from arbitrary byte-chunk boundaries and
/// yields one `Delta` per content-bearing line, stopping at `[DONE]`.
fn sse_delta_stream(source: BoxStream<'static, Result<Vec<u8>, TransportError>>) -> DeltaStream {
    let state = SseState {
        source,
        line_buf: String::new(),
        pending: VecDeque::new(),
        finished: false,
    };

    futures::stream::unfold(state, |mut st| async move {
        loop {
            if let Some(item) = st.pending.pop_front() {
                return Some((item, st));
            }
            if st.finished {
                return None;
            }

            match st.source.next().await {
                Some(Ok(chunk)) => {
                    st.line_buf.push_str(&String::from_utf8_lossy(&chunk));
                    while let Some(pos) = st.line_buf.find('\n') {
                        let line: String = st.line_buf.drain(..=pos).collect();
                        match parse_sse_line(line.trim()) {
                            SseLine::Delta(text) => st.pending.push_back(Ok(Delta { text })),
                            SseLine::Done => {
                                st.finished = true;
                                st.line_buf.clear();
                                break;
                            }
                            SseLine::Skip => {}
                        }
                    }
                }
                Some(Err(e)) => {
                    st.finished = true;
                    st.pending.push_back(Err(e));
                }
                None => {
                    // Stream ended without [DONE]; a final unterminated line
                    // may still hold a delta.
                    st.finished = true;
                    let rest = std::mem::take(&mut st.line_buf);
                    if let SseLine::Delta(text) = parse_sse_line(rest.trim()) {
                        st.pending.push_back(Ok(Delta { text }));
                    }
                }
            }
        }
    })
    .boxed()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunked(parts: &[&str]) -> BoxStream<'static, Result<Vec<u8>, TransportError>> {
        let owned: Vec<Result<Vec<u8>, TransportError>> = parts
            .iter()
            .map(|p| Ok(p.as_bytes().to_vec()))
            .collect();
        futures::stream::iter(owned).boxed()
    }

    async fn collect_texts(stream: DeltaStream) -> Vec<String> {
        stream
            .map(|r| r.expect("delta").text)
            .collect::<Vec<_>>()
            .await
    }

    #[test]
    fn test_parse_sse_line_delta() {
        let line = r#"data: {"choices":[{"delta":{"content":"Hi"}}]}"#;
        match parse_sse_line(line) {
            SseLine::Delta(text) => assert_eq!(text, "Hi"),
            _ => panic!("expected delta"),
        }
    }

    #[test]
    fn test_parse_sse_line_done_and_skips() {
        assert!(matches!(parse_sse_line("data: [DONE]"), SseLine::Done));
        assert!(matches!(parse_sse_line(""), SseLine::Skip));
        assert!(matches!(parse_sse_line("event: ping"), SseLine::Skip));
        // Role preamble chunk has no content
        let preamble = r#"data: {"choices":[{"delta":{"role":"assistant"}}]}"#;
        assert!(matches!(parse_sse_line(preamble), SseLine::Skip));
    }

    #[tokio::test]
    async fn test_sse_stream_reassembles_split_lines() {
        // One data line split across three network chunks
        let stream = sse_delta_stream(chunked(&[
            "data: {\"choices\":[{\"del",
            "ta\":{\"content\":\"hel",
            "lo\"}}]}\n\ndata: [DONE]\n",
        ]));
        assert_eq!(collect_texts(stream).await, vec!["hello"]);
    }

    #[tokio::test]
    async fn test_sse_stream_yields_deltas_in_order() {
        let stream = sse_delta_stream(chunked(&[
            "data: {\"choices\":[{\"delta\":{\"content\":\"a\"}}]}\n",
            "data: {\"choices\":[{\"delta\":{\"content\":\"b\"}}]}\ndata: {\"choices\":[{\"delta\":{\"content\":\"c\"}}]}\n",
            "data: [DONE]\n",
        ]));
        assert_eq!(collect_texts(stream).await, vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn test_sse_stream_stops_after_done() {
        let stream = sse_delta_stream(chunked(&[
            "data: {\"choices\":[{\"delta\":{\"content\":\"x\"}}]}\n",
            "data: [DONE]\n",
            "data: {\"choices\":[{\"delta\":{\"content\":\"ignored\"}}]}\n",
        ]));
        assert_eq!(collect_texts(stream).await, vec!["x"]);
    }

    #[tokio::test]
    async fn test_sse_stream_surfaces_transport_error() {
        let items: Vec<Result<Vec<u8>, TransportError>> = vec![
            Ok(b"data: {\"choices\":[{\"delta\":{\"content\":\"a\"}}]}\n".to_vec()),
            Err(TransportError::StreamClosed("connection reset".to_string())),
        ];
        let stream = sse_delta_stream(futures::stream::iter(items).boxed());
        let collected: Vec<Result<Delta, TransportError>> = stream.collect().await;
        assert_eq!(collected.len(), 2);
        assert_eq!(collected[0].as_ref().unwrap().text, "a");
        assert!(collected[1].is_err());
    }

    #[tokio::test]
    async fn test_sse_stream_handles_missing_done() {
        let stream = sse_delta_stream(chunked(&[
            "data: {\"choices\":[{\"delta\":{\"content\":\"tail\"}}]}",
        ]));
        assert_eq!(collect_texts(stream).await, vec!["tail"]);
    }

    #[test]
    fn test_extract_error_message_parses_api_shape() {
        let body = r#"{"error":{"message":"invalid api key"}}"#;
        assert_eq!(extract_error_message(body), "invalid api key");
        assert_eq!(extract_error_message("plain text"), "plain text");
    }
}
