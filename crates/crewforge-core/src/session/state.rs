//! Interview state machine.
//!
//! Pure policy: given the current state and counters, decides whether to
//! transition, to where, and whether the state accepts free-text input at
//! all. The workflow layer drives it; no IO happens here.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter};

/// The stage the interview conversation is currently in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumIter)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum InterviewState {
    /// Opening exchange; a single greeting turn.
    Greet,
    /// Establish what role the new worker fills.
    AskRole,
    /// Establish areas of expertise.
    AskExpertise,
    /// Establish working preferences (communication, hours, autonomy).
    AskPreferences,
    /// Side-state for clarifying an unclear answer; always returns control
    /// to the state that triggered it.
    FollowUp,
    /// Synthesis gateway: the consultant turns the transcript into a draft.
    ConsultHr,
    /// The requester picks one of the suggested names.
    NameSelection,
    /// Draft assembled; awaiting review. Driven by approval operations only.
    Finalize,
    /// The generated system prompt is under review.
    ReviewPrompt,
    /// Trial conversation against the drafted worker.
    TestConversation,
    /// Final name/gender assignment before activation.
    AssignDetails,
    /// Terminal state; the worker has been materialized.
    Complete,
}

/// Static policy for one state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateSpec {
    /// Accepted requester turns before the state force-advances.
    pub max_exchanges: u32,
    /// Where the state advances to, if anywhere.
    pub next_state: Option<InterviewState>,
    /// Topic tag recorded in `topics_covered` per accepted turn.
    pub topic: Option<&'static str>,
    /// Blocked states accept no free-text input; they are driven
    /// exclusively by dedicated approval/detail operations.
    pub is_blocked: bool,
}

/// Pure transition policy over [`InterviewState`].
pub struct StateMachine;

impl StateMachine {
    /// Returns the policy entry for a state.
    pub fn spec(state: InterviewState) -> StateSpec {
        use InterviewState::*;
        match state {
            Greet => StateSpec {
                max_exchanges: 1,
                next_state: Some(AskRole),
                topic: Some("greeting"),
                is_blocked: false,
            },
            AskRole => StateSpec {
                max_exchanges: 2,
                next_state: Some(AskExpertise),
                topic: Some("role"),
                is_blocked: false,
            },
            AskExpertise => StateSpec {
                max_exchanges: 2,
                next_state: Some(AskPreferences),
                topic: Some("expertise"),
                is_blocked: false,
            },
            AskPreferences => StateSpec {
                max_exchanges: 3,
                next_state: Some(ConsultHr),
                topic: Some("preferences"),
                is_blocked: false,
            },
            // No fixed topic: the clarifying turn belongs to the state that
            // triggered the follow-up and must not advance its counters.
            FollowUp => StateSpec {
                max_exchanges: 1,
                next_state: None,
                topic: None,
                is_blocked: false,
            },
            ConsultHr => StateSpec {
                max_exchanges: 0,
                next_state: Some(NameSelection),
                topic: None,
                is_blocked: true,
            },
            NameSelection => StateSpec {
                max_exchanges: 1,
                next_state: Some(Finalize),
                topic: Some("name"),
                is_blocked: false,
            },
            Finalize => StateSpec {
                max_exchanges: 0,
                next_state: Some(ReviewPrompt),
                topic: None,
                is_blocked: true,
            },
            ReviewPrompt => StateSpec {
                max_exchanges: 0,
                next_state: Some(TestConversation),
                topic: None,
                is_blocked: true,
            },
            TestConversation => StateSpec {
                max_exchanges: 10,
                next_state: Some(AssignDetails),
                topic: Some("test"),
                is_blocked: false,
            },
            AssignDetails => StateSpec {
                max_exchanges: 0,
                next_state: Some(Complete),
                topic: None,
                is_blocked: true,
            },
            Complete => StateSpec {
                max_exchanges: 0,
                next_state: None,
                topic: None,
                is_blocked: true,
            },
        }
    }

    /// Whether the state accepts free-text `respond` input.
    pub fn accepts_input(state: InterviewState) -> bool {
        !Self::spec(state).is_blocked
    }

    /// Whether the state is blocked (approval-operation driven).
    pub fn is_blocked(state: InterviewState) -> bool {
        Self::spec(state).is_blocked
    }

    /// The topic tag a state records per accepted turn.
    pub fn topic(state: InterviewState) -> Option<&'static str> {
        Self::spec(state).topic
    }

    /// The state this one advances to, if any.
    pub fn next_state(state: InterviewState) -> Option<InterviewState> {
        Self::spec(state).next_state
    }

    /// Whether the interview has reached a terminal state.
    pub fn is_terminal(state: InterviewState) -> bool {
        state == InterviewState::Complete
    }

    /// Decides whether the session should leave `state`.
    ///
    /// Transitions when the state has consumed its exchange budget, or when
    /// its topic has already been satisfied `max_exchanges` times in
    /// `topics_covered`. The second clause is the loop-breaker against
    /// asking a satisfied topic indefinitely after repeated unclear answers.
    pub fn should_transition(
        state: InterviewState,
        exchanges_in_current_state: u32,
        topics_covered: &[String],
    ) -> bool {
        let spec = Self::spec(state);
        if spec.next_state.is_none() {
            return false;
        }
        if exchanges_in_current_state >= spec.max_exchanges {
            return true;
        }
        if let Some(topic) = spec.topic {
            let satisfied = topics_covered.iter().filter(|t| t.as_str() == topic).count();
            if satisfied as u32 >= spec.max_exchanges {
                return true;
            }
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn test_intended_state_order() {
        use InterviewState::*;
        let mut state = Greet;
        let mut visited = vec![state];
        while let Some(next) = StateMachine::next_state(state) {
            state = next;
            visited.push(state);
        }
        assert_eq!(
            visited,
            vec![
                Greet,
                AskRole,
                AskExpertise,
                AskPreferences,
                ConsultHr,
                NameSelection,
                Finalize,
                ReviewPrompt,
                TestConversation,
                AssignDetails,
                Complete,
            ]
        );
    }

    #[test]
    fn test_blocked_states_reject_input() {
        use InterviewState::*;
        for state in [ConsultHr, Finalize, ReviewPrompt, AssignDetails, Complete] {
            assert!(StateMachine::is_blocked(state), "{state} should be blocked");
            assert!(!StateMachine::accepts_input(state));
        }
        for state in [Greet, AskRole, AskExpertise, AskPreferences, FollowUp, TestConversation] {
            assert!(StateMachine::accepts_input(state), "{state} should accept input");
        }
    }

    #[test]
    fn test_transition_on_exchange_budget() {
        assert!(!StateMachine::should_transition(
            InterviewState::AskRole,
            1,
            &[]
        ));
        assert!(StateMachine::should_transition(
            InterviewState::AskRole,
            2,
            &[]
        ));
    }

    #[test]
    fn test_transition_on_satisfied_topic() {
        // The loop-breaker: role already covered twice in earlier turns.
        let topics = vec!["role".to_string(), "role".to_string()];
        assert!(StateMachine::should_transition(
            InterviewState::AskRole,
            0,
            &topics
        ));
    }

    #[test]
    fn test_follow_up_never_transitions() {
        assert!(!StateMachine::should_transition(
            InterviewState::FollowUp,
            5,
            &[]
        ));
        assert_eq!(StateMachine::next_state(InterviewState::FollowUp), None);
    }

    #[test]
    fn test_complete_is_terminal() {
        assert!(StateMachine::is_terminal(InterviewState::Complete));
        for state in InterviewState::iter().filter(|s| *s != InterviewState::Complete) {
            assert!(!StateMachine::is_terminal(state));
        }
    }

    #[test]
    fn test_snake_case_display() {
        assert_eq!(InterviewState::AskRole.to_string(), "ask_role");
        assert_eq!(InterviewState::NameSelection.to_string(), "name_selection");
    }
}
