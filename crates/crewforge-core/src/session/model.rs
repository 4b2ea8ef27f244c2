//! Interview session domain model.
//!
//! The session is the aggregate root of an interview: transcript, evolving
//! candidate profile, state-machine bookkeeping, and the draft produced by
//! the consultant. It is owned exclusively by the session store; everything
//! else reads and mutates it through that store.

use super::message::InterviewMessage;
use super::state::InterviewState;
use crate::profile::CandidateProfile;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle status of a session. Termination is a status value, never a
/// removal: sessions are not deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterviewStatus {
    /// The interview loop is running.
    Active,
    /// A draft exists and is moving through the approval sub-flow.
    PendingReview,
    /// The worker was materialized.
    Completed,
    /// Explicitly cancelled; short-circuits all states.
    Cancelled,
}

/// The draft worker assembled by the consultant step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentDraft {
    /// Snapshot of the profile at synthesis time
    pub profile: CandidateProfile,
    /// The synthesized system prompt
    pub draft_prompt: String,
    /// Name candidates presented to the requester
    pub suggested_names: Vec<String>,
    /// The confirmed name, once assigned
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub final_name: Option<String>,
    /// Optional gender assigned alongside the final name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
}

/// State of an in-progress name negotiation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NameSelectionState {
    /// The options presented, in presentation order
    pub options: Vec<String>,
    /// The accepted choice, if the requester has picked one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected: Option<String>,
}

/// A conversational interview session, from greeting to worker activation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterviewSession {
    /// Unique session identifier (UUID format)
    pub id: String,
    /// Placeholder identity for the worker-to-be, minted at creation and
    /// stable thereafter
    pub candidate_id: String,
    /// Owning organization
    pub organization_id: String,
    /// Team the new worker will join
    pub team_id: String,
    /// The persona conducting the interview
    pub interviewer_id: String,
    /// Lifecycle status
    pub status: InterviewStatus,
    /// The interview state driving all branching
    pub current_state: InterviewState,
    /// When in `follow_up`, the state that triggered the clarification
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub follow_up_origin: Option<InterviewState>,
    /// Append-only transcript, timestamps non-decreasing
    #[serde(default)]
    pub transcript: Vec<InterviewMessage>,
    /// The evolving candidate profile
    #[serde(default)]
    pub candidate_profile: CandidateProfile,
    /// Every state assumed, in order, including the current one
    #[serde(default)]
    pub state_history: Vec<InterviewState>,
    /// Accepted requester turns since the last transition
    #[serde(default)]
    pub exchanges_in_current_state: u32,
    /// Multiset of topic tags already satisfied
    #[serde(default)]
    pub topics_covered: Vec<String>,
    /// Populated once the consultant step runs
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_draft: Option<AgentDraft>,
    /// Name negotiation bookkeeping
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name_selection: Option<NameSelectionState>,
    /// Trial-conversation transcript from the review phase
    #[serde(default)]
    pub test_conversation_history: Vec<InterviewMessage>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last mutation timestamp
    pub updated_at: DateTime<Utc>,
    /// Set when the session reaches `Completed`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl InterviewSession {
    /// Creates a fresh session in the `Greet` state with an empty profile.
    pub fn new(
        organization_id: impl Into<String>,
        team_id: impl Into<String>,
        interviewer_id: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            candidate_id: uuid::Uuid::new_v4().to_string(),
            organization_id: organization_id.into(),
            team_id: team_id.into(),
            interviewer_id: interviewer_id.into(),
            status: InterviewStatus::Active,
            current_state: InterviewState::Greet,
            follow_up_origin: None,
            transcript: Vec::new(),
            candidate_profile: CandidateProfile::default(),
            state_history: vec![InterviewState::Greet],
            exchanges_in_current_state: 0,
            topics_covered: Vec::new(),
            agent_draft: None,
            name_selection: None,
            test_conversation_history: Vec::new(),
            created_at: now,
            updated_at: now,
            completed_at: None,
        }
    }

    /// Whether the session still accepts interview operations.
    pub fn is_active(&self) -> bool {
        matches!(
            self.status,
            InterviewStatus::Active | InterviewStatus::PendingReview
        )
    }

    /// Whether the session-level wall-clock timeout has elapsed.
    pub fn is_timed_out(&self, timeout_minutes: i64, now: DateTime<Utc>) -> bool {
        now - self.created_at > chrono::Duration::minutes(timeout_minutes)
    }

    /// Number of questions the interviewer has asked so far.
    pub fn question_count(&self) -> usize {
        self.transcript
            .iter()
            .filter(|m| m.speaker == super::message::Speaker::Interviewer)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::message::Speaker;
    use chrono::Duration;

    #[test]
    fn test_new_session_defaults() {
        let session = InterviewSession::new("org-1", "team-1", "hr-1");
        assert_eq!(session.status, InterviewStatus::Active);
        assert_eq!(session.current_state, InterviewState::Greet);
        assert_eq!(session.state_history, vec![InterviewState::Greet]);
        assert_eq!(session.exchanges_in_current_state, 0);
        assert!(session.transcript.is_empty());
        assert_ne!(session.id, session.candidate_id);
    }

    #[test]
    fn test_timeout() {
        let session = InterviewSession::new("org-1", "team-1", "hr-1");
        let now = session.created_at;
        assert!(!session.is_timed_out(30, now + Duration::minutes(29)));
        assert!(session.is_timed_out(30, now + Duration::minutes(31)));
    }

    #[test]
    fn test_question_count_ignores_requester_messages() {
        let mut session = InterviewSession::new("org-1", "team-1", "hr-1");
        session
            .transcript
            .push(InterviewMessage::new(Speaker::Interviewer, "Hello!"));
        session
            .transcript
            .push(InterviewMessage::new(Speaker::Requester, "Hi"));
        assert_eq!(session.question_count(), 1);
    }

    #[test]
    fn test_json_round_trip_preserves_dates() {
        let session = InterviewSession::new("org-1", "team-1", "hr-1");
        let json = serde_json::to_string(&session).unwrap();
        let restored: InterviewSession = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, session);
        assert_eq!(restored.created_at, session.created_at);
    }
}
