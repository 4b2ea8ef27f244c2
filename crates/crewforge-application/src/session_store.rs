//! The authoritative in-process session registry.
//!
//! Every component reads and mutates sessions only through this store. Each
//! mutation applies to the in-memory copy, bumps `updated_at`, and fires a
//! non-blocking persistence task. Persistence failures are logged and
//! counted, never surfaced to the caller: the in-memory copy is the
//! instantaneous source of truth and the durable mirror is eventually
//! consistent, read back only at process restart.

use chrono::Utc;
use crewforge_core::error::{CrewforgeError, Result};
use crewforge_core::profile::ProfilePatch;
use crewforge_core::session::{
    InterviewMessage, InterviewRepository, InterviewSession, InterviewState, InterviewStatus,
    Speaker, StateMachine,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

/// In-process registry of interview sessions with fire-and-forget
/// persistence.
pub struct SessionStore {
    organization_id: String,
    sessions: Arc<RwLock<HashMap<String, InterviewSession>>>,
    repository: Arc<dyn InterviewRepository>,
    persistence_attempts: Arc<AtomicU64>,
    persistence_failures: Arc<AtomicU64>,
}

impl SessionStore {
    /// Creates an empty store for one organization.
    pub fn new(organization_id: impl Into<String>, repository: Arc<dyn InterviewRepository>) -> Self {
        Self {
            organization_id: organization_id.into(),
            sessions: Arc::new(RwLock::new(HashMap::new())),
            repository,
            persistence_attempts: Arc::new(AtomicU64::new(0)),
            persistence_failures: Arc::new(AtomicU64::new(0)),
        }
    }

    /// The organization this store serves.
    pub fn organization_id(&self) -> &str {
        &self.organization_id
    }

    /// Number of persistence tasks that have run to completion.
    pub fn persistence_attempts(&self) -> u64 {
        self.persistence_attempts.load(Ordering::SeqCst)
    }

    /// Number of persistence tasks that failed. Failures are logged only;
    /// this counter is the observable channel for tests and monitoring.
    pub fn persistence_failures(&self) -> u64 {
        self.persistence_failures.load(Ordering::SeqCst)
    }

    /// Loads the organization's durable sessions into memory at startup.
    ///
    /// In-memory sessions win on id collision: the durable mirror is only
    /// eventually consistent.
    pub async fn rehydrate(&self) -> Result<usize> {
        let stored = self.repository.list_by_org(&self.organization_id).await?;
        let mut sessions = self.sessions.write().await;
        let mut loaded = 0;
        for session in stored {
            if !sessions.contains_key(&session.id) {
                sessions.insert(session.id.clone(), session);
                loaded += 1;
            }
        }
        tracing::info!(
            target: "persistence",
            organization_id = %self.organization_id,
            loaded,
            "Rehydrated interview sessions"
        );
        Ok(loaded)
    }

    /// Creates a session in the `Greet` state with an empty profile.
    pub async fn create_session(
        &self,
        team_id: impl Into<String>,
        interviewer_id: impl Into<String>,
    ) -> InterviewSession {
        let session = InterviewSession::new(&self.organization_id, team_id, interviewer_id);
        {
            let mut sessions = self.sessions.write().await;
            sessions.insert(session.id.clone(), session.clone());
        }
        self.persist(session.clone());
        session
    }

    /// Returns a snapshot of a session.
    pub async fn get_session(&self, session_id: &str) -> Result<InterviewSession> {
        let sessions = self.sessions.read().await;
        sessions
            .get(session_id)
            .cloned()
            .ok_or_else(|| CrewforgeError::not_found("session", session_id))
    }

    /// Snapshots every session for one team.
    pub async fn list_by_team(&self, team_id: &str) -> Vec<InterviewSession> {
        let sessions = self.sessions.read().await;
        let mut result: Vec<_> = sessions
            .values()
            .filter(|s| s.team_id == team_id)
            .cloned()
            .collect();
        result.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        result
    }

    /// Appends a message to the transcript and returns it.
    pub async fn add_message(
        &self,
        session_id: &str,
        speaker: Speaker,
        text: impl Into<String>,
        metadata: Option<HashMap<String, String>>,
    ) -> Result<InterviewMessage> {
        let mut message = InterviewMessage::new(speaker, text);
        for (key, value) in metadata.into_iter().flatten() {
            message = message.with_metadata(key, value);
        }
        let appended = message.clone();
        self.mutate(session_id, move |session| {
            // Timestamps in the transcript are non-decreasing.
            if let Some(last) = session.transcript.last() {
                if message.timestamp < last.timestamp {
                    message.timestamp = last.timestamp;
                }
            }
            session.transcript.push(message);
        })
        .await?;
        Ok(appended)
    }

    /// Moves the session to `new_state`, resetting the exchange counter and
    /// extending the state history.
    pub async fn update_state(&self, session_id: &str, new_state: InterviewState) -> Result<()> {
        self.mutate(session_id, move |session| {
            tracing::debug!(
                target: "workflow",
                session_id = %session.id,
                from = %session.current_state,
                to = %new_state,
                "State transition"
            );
            session.current_state = new_state;
            session.state_history.push(new_state);
            session.exchanges_in_current_state = 0;
        })
        .await
    }

    /// Records one accepted turn in the current state: increments the
    /// exchange counter and appends the state's topic to `topics_covered`.
    /// Skipped entirely for `follow_up`, which has no fixed topic.
    pub async fn record_exchange(&self, session_id: &str) -> Result<()> {
        self.mutate(session_id, |session| {
            if session.current_state == InterviewState::FollowUp {
                return;
            }
            session.exchanges_in_current_state += 1;
            if let Some(topic) = StateMachine::topic(session.current_state) {
                session.topics_covered.push(topic.to_string());
            }
        })
        .await
    }

    /// Merges a profile patch into the candidate profile.
    pub async fn update_profile(&self, session_id: &str, patch: &ProfilePatch) -> Result<()> {
        let patch = patch.clone();
        self.mutate(session_id, move |session| {
            session.candidate_profile.merge(&patch);
        })
        .await
    }

    /// Marks the session completed and stamps `completed_at`.
    pub async fn complete_session(&self, session_id: &str) -> Result<()> {
        self.mutate(session_id, |session| {
            session.status = InterviewStatus::Completed;
            session.completed_at = Some(Utc::now());
        })
        .await
    }

    /// Cancels the session. Termination is a status value, not a removal.
    pub async fn cancel_session(&self, session_id: &str, reason: Option<&str>) -> Result<()> {
        let reason = reason.map(str::to_string);
        self.mutate(session_id, move |session| {
            tracing::info!(
                target: "workflow",
                session_id = %session.id,
                reason = reason.as_deref().unwrap_or("-"),
                "Session cancelled"
            );
            session.status = InterviewStatus::Cancelled;
        })
        .await
    }

    /// Reopens a cancelled session in its previous state.
    ///
    /// Completed sessions are not resumable.
    pub async fn resume_session(&self, session_id: &str) -> Result<()> {
        self.try_mutate(session_id, |session| {
            match session.status {
                InterviewStatus::Cancelled => {
                    session.status = if session.agent_draft.is_some() {
                        InterviewStatus::PendingReview
                    } else {
                        InterviewStatus::Active
                    };
                    Ok(())
                }
                InterviewStatus::Completed => Err(CrewforgeError::invalid_transition(
                    session.current_state.to_string(),
                    "resume completed session",
                )),
                _ => Ok(()),
            }
        })
        .await
    }

    /// Applies an arbitrary mutation to a session (draft and sub-workflow
    /// state used by the orchestrator), with the store's persistence
    /// contract.
    pub async fn mutate<F>(&self, session_id: &str, f: F) -> Result<()>
    where
        F: FnOnce(&mut InterviewSession),
    {
        self.try_mutate(session_id, |session| {
            f(session);
            Ok(())
        })
        .await
    }

    /// Like [`mutate`](Self::mutate), but the closure may refuse the change.
    /// Nothing is persisted when it does.
    pub async fn try_mutate<F>(&self, session_id: &str, f: F) -> Result<()>
    where
        F: FnOnce(&mut InterviewSession) -> Result<()>,
    {
        let snapshot = {
            let mut sessions = self.sessions.write().await;
            let session = sessions
                .get_mut(session_id)
                .ok_or_else(|| CrewforgeError::not_found("session", session_id))?;
            f(session)?;
            session.updated_at = Utc::now();
            session.clone()
        };
        self.persist(snapshot);
        Ok(())
    }

    /// Fires the non-blocking persistence task for a session snapshot.
    fn persist(&self, snapshot: InterviewSession) {
        let repository = Arc::clone(&self.repository);
        let attempts = Arc::clone(&self.persistence_attempts);
        let failures = Arc::clone(&self.persistence_failures);
        tokio::spawn(async move {
            let result = repository.save(&snapshot).await;
            attempts.fetch_add(1, Ordering::SeqCst);
            if let Err(err) = result {
                failures.fetch_add(1, Ordering::SeqCst);
                tracing::warn!(
                    target: "persistence",
                    session_id = %snapshot.id,
                    "Failed to persist interview session: {err}"
                );
            }
        });
    }
}
