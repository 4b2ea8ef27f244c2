//! Interview session domain: aggregate model, transcript messages, the
//! interview state machine, and the persistence trait.

pub mod message;
pub mod model;
pub mod repository;
pub mod state;

pub use message::{InterviewMessage, Speaker};
pub use model::{AgentDraft, InterviewSession, InterviewStatus, NameSelectionState};
pub use repository::InterviewRepository;
pub use state::{InterviewState, StateMachine, StateSpec};
