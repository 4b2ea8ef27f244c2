//! Infrastructure layer for Crewforge.
//!
//! File-backed implementations of the domain's persistence traits: the
//! per-organization JSON interview mirror, the team/worker roster, and
//! platform path resolution.

pub mod json_interview_repository;
pub mod paths;
pub mod roster;

pub use json_interview_repository::JsonDirInterviewRepository;
pub use paths::CrewforgePaths;
pub use roster::FileTeamRoster;
