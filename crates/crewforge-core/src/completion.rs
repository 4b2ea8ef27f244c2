//! LLM completion client boundary.
//!
//! Every LLM-driven component (analyzer, question generator, consultant,
//! name generation) goes through this trait, keeping the workflow testable
//! with scripted clients and the provider swappable.

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Per-call options for a completion request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompletionOptions {
    /// The agent/persona on whose behalf the call is made
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_id: Option<String>,
    /// Sampling temperature
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    /// Generation cap in tokens
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

/// Token accounting for one completion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub input: u32,
    pub output: u32,
    pub total: u32,
}

/// The result of one completion call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Completion {
    /// Generated text
    pub content: String,
    /// Token accounting reported by the provider
    pub tokens_used: TokenUsage,
    /// Provider identifier (e.g. "anthropic")
    pub provider: String,
    /// Model identifier
    pub model: String,
    /// Why generation stopped (e.g. "end_turn", "max_tokens")
    pub finish_reason: String,
}

/// An LLM completion capability.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Generates a completion for `prompt`.
    async fn generate(&self, prompt: &str, options: CompletionOptions) -> Result<Completion>;
}
