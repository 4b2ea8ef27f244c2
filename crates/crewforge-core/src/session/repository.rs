//! Interview repository trait.
//!
//! Defines the interface for session persistence. The durable copy is an
//! eventually-consistent mirror keyed by `(organization_id, session_id)`;
//! the in-memory session store remains the instantaneous source of truth.

use super::model::InterviewSession;
use crate::error::Result;
use async_trait::async_trait;

/// An abstract repository for persisting interview sessions.
///
/// Implementations must provide idempotent full-overwrite `save` semantics:
/// saving the same session twice leaves the same durable state as saving it
/// once. The durable copy is only read back at process restart.
#[async_trait]
pub trait InterviewRepository: Send + Sync {
    /// Persists the full session, overwriting any previous copy.
    async fn save(&self, session: &InterviewSession) -> Result<()>;

    /// Finds a session by organization and id.
    ///
    /// Returns `Ok(None)` when no durable copy exists.
    async fn find_by_id(
        &self,
        organization_id: &str,
        session_id: &str,
    ) -> Result<Option<InterviewSession>>;

    /// Lists every stored session for an organization.
    async fn list_by_org(&self, organization_id: &str) -> Result<Vec<InterviewSession>>;
}
