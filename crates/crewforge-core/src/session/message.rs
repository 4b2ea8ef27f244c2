//! Interview transcript message types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Identifies which side of the interview produced a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Speaker {
    /// The persona conducting the interview.
    Interviewer,
    /// The human describing the worker they need.
    Requester,
}

/// A single entry in the interview transcript.
///
/// The transcript is append-only: messages are never mutated or removed,
/// and timestamps are non-decreasing in transcript order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterviewMessage {
    /// Unique message identifier (UUID format)
    pub id: String,
    /// Who produced the message
    pub speaker: Speaker,
    /// The message text
    pub message: String,
    /// When the message was appended
    pub timestamp: DateTime<Utc>,
    /// Free-form per-message annotations (e.g. the state a question targeted)
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub metadata: HashMap<String, String>,
}

impl InterviewMessage {
    /// Creates a message stamped with the current time.
    pub fn new(speaker: Speaker, message: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            speaker,
            message: message.into(),
            timestamp: Utc::now(),
            metadata: HashMap::new(),
        }
    }

    /// Attaches a metadata entry.
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}
