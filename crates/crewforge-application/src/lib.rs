//! Application layer for Crewforge.
//!
//! This crate implements the interview workflow engine: the session store,
//! the analysis/aggregation/question components, consultant synthesis, name
//! negotiation, and the orchestrator that coordinates them over the domain
//! and infrastructure layers.

pub mod aggregator;
pub mod analyzer;
pub mod classifier;
pub mod consultant;
pub mod engine;
pub mod names;
pub mod question;
pub mod session_store;
pub mod workflow;

pub use aggregator::ProfileAggregator;
pub use analyzer::{ResponseAnalysis, ResponseAnalyzer};
pub use classifier::{KeywordClassifier, Topic, TopicClassifier};
pub use consultant::{Consultant, ConsultantReport};
pub use engine::InterviewEngine;
pub use names::{NameGenerator, NameOption};
pub use question::QuestionGenerator;
pub use session_store::SessionStore;
pub use workflow::{RespondOutcome, StartedInterview, WorkflowOrchestrator};
