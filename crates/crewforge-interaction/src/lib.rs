//! Interaction layer for Crewforge.
//!
//! Provider-facing completion clients implementing the domain's
//! [`CompletionClient`](crewforge_core::completion::CompletionClient) trait.

pub mod claude_client;

pub use claude_client::ClaudeCompletionClient;
