//! Agent session — binds fixed instructions and an output shape to the LLM
//! port, exposing a one-shot call and a live progress-emitting call.
//!
//! One parameterized session replaces per-agent subclassing: every agent in
//! the system is just a `{system prompt, shape}` pair over the same machinery.

use std::sync::Arc;

use futures::stream::BoxStream;
use futures::StreamExt;
use tracing::{debug, warn};

use crate::llm::{ChatCompletionPort, ChatOptions, DeltaStream, Message};
use crate::structured::accumulator::{ProgressEvent, StreamAccumulator};
use crate::structured::resolver::{resolve, ErrorRecord, ResolvedRecord};
use crate::structured::shape::OutputShape;

/// One item in a streaming call's event sequence. Zero or more `Progress`
/// events strictly precede exactly one terminal `Resolved` or `Failed`.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    Progress(ProgressEvent),
    Resolved(ResolvedRecord),
    Failed(ErrorRecord),
}

impl SessionEvent {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, SessionEvent::Progress(_))
    }
}

/// An agent bound to fixed instructions and a declared output shape.
/// Sessions are cheap to construct and hold no per-call state; every call
/// gets a fresh accumulation buffer.
pub struct AgentSession {
    pub name: &'static str,
    system_prompt: String,
    shape: OutputShape,
    port: Arc<dyn ChatCompletionPort>,
    temperature: f32,
}

impl AgentSession {
    pub fn new(
        name: &'static str,
        system_prompt: impl Into<String>,
        shape: OutputShape,
        port: Arc<dyn ChatCompletionPort>,
    ) -> Self {
        Self {
            name,
            system_prompt: system_prompt.into(),
            shape,
            port,
            temperature: 0.0,
        }
    }

    fn build_messages(&self, user_input: &str) -> Vec<Message> {
        vec![
            Message::system(self.system_prompt.clone()),
            Message::user(user_input),
        ]
    }

    fn options(&self) -> ChatOptions {
        ChatOptions {
            json_mode: true,
            temperature: self.temperature,
        }
    }

    /// One-shot call: accumulate-then-resolve without incremental feedback.
    pub async fn complete(&self, user_input: &str) -> Result<ResolvedRecord, ErrorRecord> {
        debug!(agent = self.name, "one-shot structured call");
        let messages = self.build_messages(user_input);

        let text = self
            .port
            .send(&messages, self.options())
            .await
            .map_err(|e| {
                warn!(agent = self.name, error = %e, "LLM call failed");
                ErrorRecord::transport(&e, String::new())
            })?;

        resolve(&text, &self.shape)
    }

    /// Streaming call: yields one `Progress` per delta, then exactly one
    /// terminal event. Each call owns a fresh state machine; dropping the
    /// returned stream stops delta consumption.
    pub async fn stream_complete(&self, user_input: &str) -> BoxStream<'static, SessionEvent> {
        debug!(agent = self.name, "streaming structured call");
        let messages = self.build_messages(user_input);

        match self.port.stream(&messages, self.options()).await {
            Ok(deltas) => run_stream(deltas, self.shape.clone()),
            Err(e) => {
                warn!(agent = self.name, error = %e, "failed to open stream");
                let failed = SessionEvent::Failed(ErrorRecord::transport(&e, String::new()));
                futures::stream::once(async move { failed }).boxed()
            }
        }
    }
}

enum RunState {
    Streaming {
        deltas: DeltaStream,
        accumulator: StreamAccumulator,
        shape: OutputShape,
    },
    Done,
}

/// Drives the delta stream through the accumulator and resolves the final
/// buffer once the stream ends. A mid-stream transport error terminates the
/// call immediately; no record is ever produced from a truncated stream.
fn run_stream(deltas: DeltaStream, shape: OutputShape) -> BoxStream<'static, SessionEvent> {
    let state = RunState::Streaming {
        deltas,
        accumulator: StreamAccumulator::new(),
        shape,
    };

    futures::stream::unfold(state, |state| async move {
        match state {
            RunState::Streaming {
                mut deltas,
                mut accumulator,
                shape,
            } => match deltas.next().await {
                Some(Ok(delta)) => {
                    let progress = accumulator.push(&delta.text);
                    Some((
                        SessionEvent::Progress(progress),
                        RunState::Streaming {
                            deltas,
                            accumulator,
                            shape,
                        },
                    ))
                }
                Some(Err(e)) => {
                    warn!(error = %e, "transport error mid-stream");
                    let record = ErrorRecord::transport(&e, accumulator.into_buffer());
                    Some((SessionEvent::Failed(record), RunState::Done))
                }
                None => {
                    let buffer = accumulator.into_buffer();
                    let event = match resolve(&buffer, &shape) {
                        Ok(record) => SessionEvent::Resolved(record),
                        Err(error) => SessionEvent::Failed(error),
                    };
                    Some((event, RunState::Done))
                }
            },
            RunState::Done => None,
        }
    })
    .boxed()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{Delta, TransportError};
    use crate::structured::resolver::ErrorKind;
    use crate::structured::shape::FieldKind;
    use async_trait::async_trait;

    #[derive(Clone)]
    enum ScriptItem {
        Text(&'static str),
        Fail(&'static str),
    }

    /// Port that replays a fixed delta script; `send` returns the
    /// concatenation of the text items.
    struct ScriptedPort {
        script: Vec<ScriptItem>,
    }

    impl ScriptedPort {
        fn new(script: Vec<ScriptItem>) -> Arc<Self> {
            Arc::new(Self { script })
        }
    }

    #[async_trait]
    impl ChatCompletionPort for ScriptedPort {
        async fn send(
            &self,
            _messages: &[Message],
            _options: ChatOptions,
        ) -> Result<String, TransportError> {
            let mut text = String::new();
            for item in &self.script {
                match item {
                    ScriptItem::Text(t) => text.push_str(t),
                    ScriptItem::Fail(msg) => {
                        return Err(TransportError::StreamClosed(msg.to_string()))
                    }
                }
            }
            Ok(text)
        }

        async fn stream(
            &self,
            _messages: &[Message],
            _options: ChatOptions,
        ) -> Result<DeltaStream, TransportError> {
            let items: Vec<Result<Delta, TransportError>> = self
                .script
                .clone()
                .into_iter()
                .map(|item| match item {
                    ScriptItem::Text(t) => Ok(Delta {
                        text: t.to_string(),
                    }),
                    ScriptItem::Fail(msg) => {
                        Err(TransportError::StreamClosed(msg.to_string()))
                    }
                })
                .collect();
            Ok(futures::stream::iter(items).boxed())
        }
    }

    fn rewrite_shape() -> OutputShape {
        OutputShape::new("jd_rewrite")
            .field("thinking", FieldKind::OptionalString)
            .field("rewritten_jd", FieldKind::String)
            .field("key_changes", FieldKind::StringArray)
    }

    fn session(script: Vec<ScriptItem>) -> AgentSession {
        AgentSession::new(
            "test_agent",
            "You rewrite job descriptions.",
            rewrite_shape(),
            ScriptedPort::new(script),
        )
    }

    const CHUNKS: [&str; 4] = [
        "{\"rewritten_jd\": ",
        "\"Better JD\", ",
        "\"key_changes\": [\"clearer title\"]",
        "}",
    ];

    #[tokio::test]
    async fn test_streaming_happy_path() {
        let s = session(CHUNKS.iter().copied().map(ScriptItem::Text).collect());
        let events: Vec<SessionEvent> = s.stream_complete("rewrite this").await.collect().await;

        assert_eq!(events.len(), CHUNKS.len() + 1);
        for (i, event) in events.iter().take(CHUNKS.len()).enumerate() {
            match event {
                SessionEvent::Progress(p) => {
                    assert_eq!(p.delta, CHUNKS[i]);
                    assert_eq!(p.accumulated, CHUNKS[..=i].concat());
                }
                other => panic!("expected progress, got {other:?}"),
            }
        }
        match events.last().unwrap() {
            SessionEvent::Resolved(record) => {
                assert_eq!(record.fields["rewritten_jd"], "Better JD");
                assert_eq!(record.fields["key_changes"][0], "clearer title");
            }
            other => panic!("expected resolved, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_exactly_one_terminal_event_and_it_is_last() {
        let s = session(CHUNKS.iter().copied().map(ScriptItem::Text).collect());
        let events: Vec<SessionEvent> = s.stream_complete("go").await.collect().await;

        let terminal_positions: Vec<usize> = events
            .iter()
            .enumerate()
            .filter(|(_, e)| e.is_terminal())
            .map(|(i, _)| i)
            .collect();
        assert_eq!(terminal_positions, vec![events.len() - 1]);
    }

    #[tokio::test]
    async fn test_independent_calls_share_no_state() {
        let s = session(CHUNKS.iter().copied().map(ScriptItem::Text).collect());
        let first: Vec<SessionEvent> = s.stream_complete("go").await.collect().await;
        let second: Vec<SessionEvent> = s.stream_complete("go").await.collect().await;

        // Identical scripts yield identical, independent event sequences:
        // buffers did not leak from the first call into the second.
        assert_eq!(first, second);
        assert_eq!(first.len(), CHUNKS.len() + 1);
    }

    #[tokio::test]
    async fn test_mid_stream_transport_error_is_terminal_and_distinct() {
        let s = session(vec![
            ScriptItem::Text("{\"rewritten"),
            ScriptItem::Fail("connection reset"),
        ]);
        let events: Vec<SessionEvent> = s.stream_complete("go").await.collect().await;

        assert_eq!(events.len(), 2);
        assert!(matches!(events[0], SessionEvent::Progress(_)));
        match &events[1] {
            SessionEvent::Failed(record) => {
                // A dropped stream is a transport failure, never a decode one.
                assert_eq!(record.kind, ErrorKind::Transport);
                assert_eq!(record.raw_buffer, "{\"rewritten");
                assert!(record.message.contains("connection reset"));
            }
            other => panic!("expected failure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_unparseable_stream_yields_decode_failure_with_full_buffer() {
        let s = session(vec![
            ScriptItem::Text("sorry, I cannot "),
            ScriptItem::Text("help with that"),
        ]);
        let events: Vec<SessionEvent> = s.stream_complete("go").await.collect().await;

        match events.last().unwrap() {
            SessionEvent::Failed(record) => {
                assert_eq!(record.kind, ErrorKind::Decode);
                assert_eq!(record.raw_buffer, "sorry, I cannot help with that");
            }
            other => panic!("expected decode failure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_validation_failure_is_terminal() {
        let s = session(vec![ScriptItem::Text(
            "{\"rewritten_jd\": \"ok\", \"key_changes\": \"not an array\"}",
        )]);
        let events: Vec<SessionEvent> = s.stream_complete("go").await.collect().await;

        match events.last().unwrap() {
            SessionEvent::Failed(record) => {
                assert_eq!(record.kind, ErrorKind::Validation);
                assert!(record.message.contains("key_changes"));
            }
            other => panic!("expected validation failure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_empty_stream_resolves_to_decode_failure() {
        let s = session(vec![]);
        let events: Vec<SessionEvent> = s.stream_complete("go").await.collect().await;

        assert_eq!(events.len(), 1);
        match &events[0] {
            SessionEvent::Failed(record) => assert_eq!(record.kind, ErrorKind::Decode),
            other => panic!("expected decode failure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_one_shot_complete() {
        let s = session(CHUNKS.iter().copied().map(ScriptItem::Text).collect());
        let record = s.complete("go").await.unwrap();
        assert_eq!(record.fields["rewritten_jd"], "Better JD");
        assert_eq!(record.fields["thinking"], serde_json::Value::Null);
    }

    #[tokio::test]
    async fn test_one_shot_transport_error() {
        let s = session(vec![ScriptItem::Fail("boom")]);
        let err = s.complete("go").await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Transport);
    }

    #[tokio::test]
    async fn test_terminal_text_equals_final_buffer() {
        let s = session(CHUNKS.iter().copied().map(ScriptItem::Text).collect());
        let events: Vec<SessionEvent> = s.stream_complete("go").await.collect().await;

        let last_progress = events
            .iter()
            .filter_map(|e| match e {
                SessionEvent::Progress(p) => Some(p.accumulated.clone()),
                _ => None,
            })
            .last()
            .unwrap();
        assert_eq!(last_progress, CHUNKS.concat());

        // The terminal record was resolved from exactly that buffer.
        match events.last().unwrap() {
            SessionEvent::Resolved(record) => {
                let reparsed = resolve(&last_progress, &rewrite_shape()).unwrap();
                assert_eq!(*record, reparsed);
            }
            other => panic!("expected resolved, got {other:?}"),
        }
    }
}
