//! Agent catalogue — each agent is an `AgentSession` configured with a system
//! prompt and an output shape. No per-agent types beyond that.

use std::sync::Arc;

use crate::llm::ChatCompletionPort;
use crate::structured::AgentSession;

pub mod outputs;
pub mod prompts;
pub mod shapes;

pub fn jd_analysis(port: Arc<dyn ChatCompletionPort>) -> AgentSession {
    AgentSession::new(
        "jd_analysis",
        prompts::JD_ANALYSIS_SYSTEM,
        shapes::jd_analysis(),
        port,
    )
}

pub fn jd_rewriter(port: Arc<dyn ChatCompletionPort>) -> AgentSession {
    AgentSession::new(
        "jd_rewriter",
        prompts::JD_REWRITE_SYSTEM,
        shapes::jd_rewrite(),
        port,
    )
}

pub fn jd_generator(port: Arc<dyn ChatCompletionPort>) -> AgentSession {
    AgentSession::new(
        "jd_generator",
        prompts::JD_REWRITE_SYSTEM,
        shapes::jd_generate(),
        port,
    )
}

pub fn candidate_scorer(port: Arc<dyn ChatCompletionPort>) -> AgentSession {
    AgentSession::new(
        "candidate_scorer",
        prompts::CANDIDATE_SCORE_SYSTEM,
        shapes::candidate_score(),
        port,
    )
}

pub fn cv_reader(port: Arc<dyn ChatCompletionPort>) -> AgentSession {
    AgentSession::new("cv_reader", prompts::CV_READER_SYSTEM, shapes::cv_profile(), port)
}

pub fn candidate_summarizer(port: Arc<dyn ChatCompletionPort>) -> AgentSession {
    AgentSession::new(
        "candidate_summarizer",
        prompts::CANDIDATE_SUMMARY_SYSTEM,
        shapes::candidate_summary(),
        port,
    )
}
