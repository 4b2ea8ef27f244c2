//! Domain layer for Crewforge.
//!
//! Pure models and policies for the interview workflow engine: the session
//! aggregate and its state machine, the candidate profile with its merge
//! semantics, teams and workers, the persistence traits, and the completion
//! client boundary. No IO happens in this crate beyond config file loading.

pub mod completion;
pub mod config;
pub mod error;
pub mod persona;
pub mod profile;
pub mod session;
pub mod team;

// Re-export common error type
pub use error::{CrewforgeError, Result};
