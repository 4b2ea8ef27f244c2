//! Workflow orchestration.
//!
//! Composes the session store, analyzer, aggregator, question generator,
//! consultant, and name negotiation into the end-to-end sequence:
//! start -> (ask -> respond -> analyze -> transition) loop -> consult ->
//! review/test/approval sub-flow -> detail assignment -> worker
//! materialization. The interview state machine stays pure in the core
//! crate; this module is the only place the two state machines meet, via
//! [`WorkflowOrchestrator::advance`].

use crate::aggregator::ProfileAggregator;
use crate::analyzer::{ResponseAnalysis, ResponseAnalyzer};
use crate::consultant::Consultant;
use crate::names::{
    is_acceptable_name, parse_name_selection, present_options, NameGenerator, NameOption,
    NAME_OPTION_COUNT,
};
use crate::question::QuestionGenerator;
use crate::session_store::SessionStore;
use chrono::Utc;
use crewforge_core::completion::{CompletionClient, CompletionOptions};
use crewforge_core::config::InterviewConfig;
use crewforge_core::error::{CrewforgeError, Result};
use crewforge_core::persona::InterviewerPersona;
use crewforge_core::profile::ProfilePatch;
use crewforge_core::session::{
    AgentDraft, InterviewSession, InterviewState, InterviewStatus, NameSelectionState, Speaker,
    StateMachine,
};
use crewforge_core::team::{Agent, AgentRank, AgentRegistry, TeamRepository};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Result of starting an interview.
#[derive(Debug, Clone)]
pub struct StartedInterview {
    pub session_id: String,
    pub greeting: String,
    pub first_question: String,
}

/// Result of one requester turn.
#[derive(Debug, Clone)]
pub struct RespondOutcome {
    /// The interviewer's next utterance, when there is one
    pub next_question: Option<String>,
    /// True once the question loop has ended and the draft phase has begun
    pub complete: bool,
}

/// End-to-end orchestrator for interview sessions.
pub struct WorkflowOrchestrator {
    store: Arc<SessionStore>,
    analyzer: ResponseAnalyzer,
    aggregator: ProfileAggregator,
    questions: QuestionGenerator,
    consultant: Consultant,
    names: NameGenerator,
    client: Arc<dyn CompletionClient>,
    teams: Arc<dyn TeamRepository>,
    agents: Arc<dyn AgentRegistry>,
    personas: Vec<InterviewerPersona>,
    config: InterviewConfig,
    /// Per-session turn locks: concurrent `respond` calls against one
    /// session queue instead of racing. Distinct sessions stay independent.
    turn_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl WorkflowOrchestrator {
    pub fn new(
        store: Arc<SessionStore>,
        client: Arc<dyn CompletionClient>,
        teams: Arc<dyn TeamRepository>,
        agents: Arc<dyn AgentRegistry>,
        personas: Vec<InterviewerPersona>,
        config: InterviewConfig,
    ) -> Self {
        Self {
            analyzer: ResponseAnalyzer::new(client.clone(), config.clone()),
            aggregator: ProfileAggregator::default(),
            questions: QuestionGenerator::new(client.clone(), config.clone()),
            consultant: Consultant::new(client.clone(), config.clone()),
            names: NameGenerator::new(client.clone(), agents.clone(), config.clone()),
            store,
            client,
            teams,
            agents,
            personas,
            config,
            turn_locks: Mutex::new(HashMap::new()),
        }
    }

    /// Starts a new interview: creates the session, emits the greeting,
    /// forces the state to `ask_role`, and requests the first question.
    pub async fn start_interview(
        &self,
        team_id: &str,
        interviewer_id: &str,
    ) -> Result<StartedInterview> {
        self.teams
            .find_by_id(team_id)?
            .ok_or_else(|| CrewforgeError::not_found("team", team_id))?;
        let persona = self.persona(interviewer_id)?.clone();

        let session = self.store.create_session(team_id, interviewer_id).await;
        let greeting = QuestionGenerator::greeting(&persona);
        self.store
            .add_message(
                &session.id,
                Speaker::Interviewer,
                greeting.clone(),
                state_tag(InterviewState::Greet),
            )
            .await?;
        self.store
            .update_state(&session.id, InterviewState::AskRole)
            .await?;

        let session = self.store.get_session(&session.id).await?;
        let first_question = match self.questions.next_question(&session, &persona).await? {
            Some(question) => question,
            // The model has nothing sensible to ask on an empty transcript;
            // fall back to the stage's canonical opener.
            None => "To begin: what should this new team member do for you?".to_string(),
        };

        Ok(StartedInterview {
            session_id: session.id,
            greeting,
            first_question,
        })
    }

    /// Processes one free-text requester turn.
    pub async fn process_candidate_response(
        &self,
        session_id: &str,
        text: &str,
    ) -> Result<RespondOutcome> {
        let lock = self.turn_lock(session_id).await;
        let _guard = lock.lock().await;

        let session = self.store.get_session(session_id).await?;
        self.check_accepts_input(&session).await?;

        match session.current_state {
            InterviewState::NameSelection => self.handle_name_selection(session, text).await,
            InterviewState::TestConversation => self.handle_test_message(session, text).await,
            _ => self.handle_interview_turn(session, text).await,
        }
    }

    /// Runs consultation and opens the name-selection phase.
    ///
    /// Failure leaves the session in `consult_hr` with status `active`, so
    /// the caller can retry without losing the interview.
    pub async fn finalize_interview(&self, session_id: &str) -> Result<String> {
        let session = self.store.get_session(session_id).await?;
        if !session.is_active() {
            return Err(CrewforgeError::invalid_transition(
                session.current_state.to_string(),
                "finalize",
            ));
        }
        if session.current_state != InterviewState::ConsultHr {
            self.store
                .update_state(session_id, InterviewState::ConsultHr)
                .await?;
        }
        let session = self.store.get_session(session_id).await?;

        let interviewer = self.persona(&session.interviewer_id)?;
        let specialist = self.specialist(interviewer);
        let report = self.consultant.synthesize(&session, specialist).await?;

        self.store
            .update_profile(
                session_id,
                &ProfilePatch {
                    system_prompt: Some(report.system_prompt.clone()),
                    ..Default::default()
                },
            )
            .await?;

        let role = session
            .candidate_profile
            .role
            .clone()
            .unwrap_or_else(|| "team member".to_string());
        let names = self
            .names
            .generate(
                &session.team_id,
                &role,
                &report.suggested_names,
                NAME_OPTION_COUNT,
            )
            .await;

        let profile_snapshot = {
            let session = self.store.get_session(session_id).await?;
            session.candidate_profile
        };
        let draft = AgentDraft {
            profile: profile_snapshot,
            draft_prompt: report.system_prompt,
            suggested_names: names.clone(),
            final_name: None,
            gender: None,
        };
        let selection = NameSelectionState {
            options: names.clone(),
            selected: None,
        };
        self.store
            .mutate(session_id, move |session| {
                session.agent_draft = Some(draft);
                session.name_selection = Some(selection);
            })
            .await?;
        self.store
            .update_state(session_id, InterviewState::NameSelection)
            .await?;

        let options = name_options(&names, &role);
        let presentation = present_options(&options);
        self.store
            .add_message(session_id, Speaker::Interviewer, presentation.clone(), None)
            .await?;

        Ok(presentation)
    }

    /// Advances the approval sub-flow one step.
    ///
    /// `finalize -> review_prompt -> test_conversation -> assign_details`;
    /// each step is an explicit caller approval.
    pub async fn approve_agent(&self, session_id: &str) -> Result<InterviewState> {
        let session = self.store.get_session(session_id).await?;
        if session.status != InterviewStatus::PendingReview {
            return Err(CrewforgeError::invalid_transition(
                session.current_state.to_string(),
                "approve",
            ));
        }

        let (next, note) = match session.current_state {
            InterviewState::Finalize => {
                let prompt = session
                    .agent_draft
                    .as_ref()
                    .map(|d| d.draft_prompt.clone())
                    .unwrap_or_default();
                (
                    InterviewState::ReviewPrompt,
                    format!("Here is the system prompt I drafted:\n\n{prompt}\n\nApprove it to start a trial conversation."),
                )
            }
            InterviewState::ReviewPrompt => (
                InterviewState::TestConversation,
                "Prompt approved. You can now talk to the candidate directly to try them out.".to_string(),
            ),
            InterviewState::TestConversation => (
                InterviewState::AssignDetails,
                "Trial finished. Assign the final name (and optionally a gender) to activate the new team member.".to_string(),
            ),
            state => {
                return Err(CrewforgeError::invalid_transition(
                    state.to_string(),
                    "approve",
                ))
            }
        };

        self.store.update_state(session_id, next).await?;
        self.store
            .add_message(session_id, Speaker::Interviewer, note, None)
            .await?;
        Ok(next)
    }

    /// Rejects the current draft and reopens consultation.
    ///
    /// The profile and transcript survive; only the draft is discarded.
    pub async fn reject_agent(&self, session_id: &str, reason: Option<&str>) -> Result<()> {
        let session = self.store.get_session(session_id).await?;
        match session.current_state {
            InterviewState::Finalize
            | InterviewState::ReviewPrompt
            | InterviewState::TestConversation => {}
            state => {
                return Err(CrewforgeError::invalid_transition(
                    state.to_string(),
                    "reject",
                ))
            }
        }

        tracing::info!(
            target: "workflow",
            session_id,
            reason = reason.unwrap_or("-"),
            "Draft rejected, reopening consultation"
        );
        self.store
            .mutate(session_id, |session| {
                session.agent_draft = None;
                session.name_selection = None;
                session.test_conversation_history.clear();
                session.status = InterviewStatus::Active;
            })
            .await?;
        self.store
            .update_state(session_id, InterviewState::ConsultHr)
            .await
    }

    /// Assigns the final name and gender, materializes the worker, and
    /// completes the session.
    pub async fn set_agent_details(
        &self,
        session_id: &str,
        name: &str,
        gender: Option<&str>,
    ) -> Result<Agent> {
        let session = self.store.get_session(session_id).await?;
        if session.current_state != InterviewState::AssignDetails {
            return Err(CrewforgeError::invalid_transition(
                session.current_state.to_string(),
                "set_agent_details",
            ));
        }

        let name = name.trim();
        if !is_acceptable_name(name, self.config.max_name_length) {
            return Err(CrewforgeError::InvalidSelection(format!(
                "'{name}' is not an acceptable name"
            )));
        }
        let taken = self.agents.names_in_team(&session.team_id)?;
        if taken.iter().any(|t| t.eq_ignore_ascii_case(name)) {
            return Err(CrewforgeError::InvalidSelection(format!(
                "the name '{name}' is already taken in this team"
            )));
        }

        let draft = session
            .agent_draft
            .as_ref()
            .ok_or_else(|| CrewforgeError::internal("assign_details reached without a draft"))?;

        let role = draft
            .profile
            .role
            .clone()
            .unwrap_or_else(|| "worker".to_string());
        let rank = AgentRank::from_role(&role);
        let agent = Agent {
            id: session.candidate_id.clone(),
            team_id: session.team_id.clone(),
            name: name.to_string(),
            role,
            rank,
            system_prompt: draft.draft_prompt.clone(),
            token_allocation: rank.token_allocation(),
            gender: gender.map(str::to_string),
            created_at: Utc::now(),
        };
        self.agents.append(agent.clone())?;

        let final_name = name.to_string();
        let final_gender = gender.map(str::to_string);
        self.store
            .mutate(session_id, move |session| {
                if let Some(draft) = session.agent_draft.as_mut() {
                    draft.final_name = Some(final_name.clone());
                    draft.gender = final_gender;
                }
                session.candidate_profile.suggested_name = Some(final_name);
            })
            .await?;
        self.store
            .update_state(session_id, InterviewState::Complete)
            .await?;
        self.store.complete_session(session_id).await?;

        tracing::info!(
            target: "workflow",
            session_id,
            agent_id = %agent.id,
            name = %agent.name,
            "Materialized new worker"
        );
        Ok(agent)
    }

    /// Name candidates from the current draft.
    pub async fn get_name_suggestions(&self, session_id: &str) -> Result<Vec<String>> {
        let session = self.store.get_session(session_id).await?;
        session
            .agent_draft
            .map(|draft| draft.suggested_names)
            .ok_or_else(|| {
                CrewforgeError::invalid_transition(
                    session.current_state.to_string(),
                    "get_name_suggestions",
                )
            })
    }

    /// Cancels an interview. No further questions are asked afterwards.
    pub async fn cancel_interview(&self, session_id: &str, reason: Option<&str>) -> Result<()> {
        self.store.cancel_session(session_id, reason).await
    }

    /// Reopens a cancelled interview in the state it was left in.
    pub async fn resume_interview(&self, session_id: &str) -> Result<()> {
        self.store.resume_session(session_id).await
    }

    /// Snapshot of a session.
    pub async fn get_session(&self, session_id: &str) -> Result<InterviewSession> {
        self.store.get_session(session_id).await
    }

    /// All sessions for a team, most recently updated first.
    pub async fn list_by_team(&self, team_id: &str) -> Vec<InterviewSession> {
        self.store.list_by_team(team_id).await
    }

    // ========================================================================
    // Turn handling
    // ========================================================================

    async fn handle_interview_turn(
        &self,
        session: InterviewSession,
        text: &str,
    ) -> Result<RespondOutcome> {
        let persona = self.persona(&session.interviewer_id)?.clone();
        self.store
            .add_message(&session.id, Speaker::Requester, text, None)
            .await?;

        let analysis = self.analyzer.analyze(&session, text).await;
        let patch = self
            .aggregator
            .patch_for(session.current_state, &analysis.key_info, text);
        if !patch.is_empty() {
            self.store.update_profile(&session.id, &patch).await?;
        }

        if session.current_state == InterviewState::FollowUp {
            // The clarified answer counts as progress in the origin state.
            let origin = session
                .follow_up_origin
                .unwrap_or(InterviewState::AskRole);
            self.store.update_state(&session.id, origin).await?;
            self.store
                .mutate(&session.id, |session| {
                    session.follow_up_origin = None;
                })
                .await?;
            self.store.record_exchange(&session.id).await?;
        } else if self.analyzer.needs_follow_up(&analysis) {
            // Topic counters stay untouched: the turn did not satisfy the
            // topic, it triggered a clarification.
            return self.enter_follow_up(&session, &persona, &analysis).await;
        } else {
            self.store.record_exchange(&session.id).await?;
        }

        let session = self.store.get_session(&session.id).await?;
        let session = self.advance(session, &analysis).await?;

        if session.current_state == InterviewState::ConsultHr {
            let presentation = self.finalize_interview(&session.id).await?;
            return Ok(RespondOutcome {
                next_question: Some(presentation),
                complete: true,
            });
        }

        match self.questions.next_question(&session, &persona).await? {
            Some(question) => {
                self.store
                    .add_message(
                        &session.id,
                        Speaker::Interviewer,
                        question.clone(),
                        state_tag(session.current_state),
                    )
                    .await?;
                Ok(RespondOutcome {
                    next_question: Some(question),
                    complete: false,
                })
            }
            None => {
                // Sentinel or transcript cap: the question loop is over.
                let presentation = self.finalize_interview(&session.id).await?;
                Ok(RespondOutcome {
                    next_question: Some(presentation),
                    complete: true,
                })
            }
        }
    }

    async fn enter_follow_up(
        &self,
        session: &InterviewSession,
        persona: &InterviewerPersona,
        analysis: &ResponseAnalysis,
    ) -> Result<RespondOutcome> {
        let origin = session.current_state;
        self.store
            .mutate(&session.id, move |session| {
                session.follow_up_origin = Some(origin);
            })
            .await?;
        self.store
            .update_state(&session.id, InterviewState::FollowUp)
            .await?;

        let reason = if analysis.follow_up_reason.is_empty() {
            "the answer was too vague to act on"
        } else {
            analysis.follow_up_reason.as_str()
        };
        let session = self.store.get_session(&session.id).await?;
        let question = self
            .questions
            .clarifying_question(&session, persona, reason)
            .await?;
        self.store
            .add_message(
                &session.id,
                Speaker::Interviewer,
                question.clone(),
                state_tag(session.current_state),
            )
            .await?;

        Ok(RespondOutcome {
            next_question: Some(question),
            complete: false,
        })
    }

    /// The single bridge between the interview state machine and the
    /// workflow: applies the transition rule, then the workflow's priority
    /// order for choosing the destination.
    async fn advance(
        &self,
        session: InterviewSession,
        _analysis: &ResponseAnalysis,
    ) -> Result<InterviewSession> {
        if !StateMachine::should_transition(
            session.current_state,
            session.exchanges_in_current_state,
            &session.topics_covered,
        ) {
            return Ok(session);
        }

        let next = self.compute_next_state(&session);
        if next != session.current_state {
            self.store.update_state(&session.id, next).await?;
        }
        self.store.get_session(&session.id).await
    }

    /// Priority order for the next stage: role, then expertise, then
    /// preferences, then consultation once the transcript is long enough.
    fn compute_next_state(&self, session: &InterviewSession) -> InterviewState {
        let profile = &session.candidate_profile;
        if profile.role.is_none() {
            InterviewState::AskRole
        } else if profile.expertise.is_empty() {
            InterviewState::AskExpertise
        } else if !profile.has_any_preference() {
            InterviewState::AskPreferences
        } else if session.transcript.len() >= self.config.min_questions * 2 {
            InterviewState::ConsultHr
        } else {
            StateMachine::next_state(session.current_state).unwrap_or(InterviewState::ConsultHr)
        }
    }

    async fn handle_name_selection(
        &self,
        session: InterviewSession,
        text: &str,
    ) -> Result<RespondOutcome> {
        let stored = session
            .name_selection
            .as_ref()
            .ok_or_else(|| CrewforgeError::internal("name_selection state without options"))?;
        let role = session
            .candidate_profile
            .role
            .clone()
            .unwrap_or_else(|| "team member".to_string());
        let options = name_options(&stored.options, &role);

        // Invalid input is rejected before any mutation happens.
        let Some(name) = parse_name_selection(text, &options) else {
            return Err(CrewforgeError::InvalidSelection(format!(
                "'{}' matches none of the offered names",
                text.trim()
            )));
        };

        self.store
            .add_message(&session.id, Speaker::Requester, text, None)
            .await?;
        self.store.record_exchange(&session.id).await?;

        let chosen = name.clone();
        self.store
            .mutate(&session.id, move |session| {
                if let Some(selection) = session.name_selection.as_mut() {
                    selection.selected = Some(chosen.clone());
                }
                if let Some(draft) = session.agent_draft.as_mut() {
                    draft.final_name = Some(chosen.clone());
                }
                session.candidate_profile.suggested_name = Some(chosen);
                session.status = InterviewStatus::PendingReview;
            })
            .await?;
        self.store
            .update_state(&session.id, InterviewState::Finalize)
            .await?;

        let confirmation = format!(
            "{name} it is. The draft is assembled - approve it to review the system prompt."
        );
        self.store
            .add_message(&session.id, Speaker::Interviewer, confirmation.clone(), None)
            .await?;

        Ok(RespondOutcome {
            next_question: Some(confirmation),
            complete: true,
        })
    }

    async fn handle_test_message(
        &self,
        session: InterviewSession,
        text: &str,
    ) -> Result<RespondOutcome> {
        let draft = session
            .agent_draft
            .as_ref()
            .ok_or_else(|| CrewforgeError::internal("test_conversation without a draft"))?;

        let history = session
            .test_conversation_history
            .iter()
            .map(|m| {
                let label = match m.speaker {
                    Speaker::Interviewer => "Candidate",
                    Speaker::Requester => "Requester",
                };
                format!("{label}: {}", m.message)
            })
            .collect::<Vec<_>>()
            .join("\n");

        let prompt = format!(
            "{system}\n\nYou are in a trial conversation with the requester who defined you.\n\
Conversation so far:\n{history}\nRequester: {text}\n\nReply in character, briefly.",
            system = draft.draft_prompt,
        );
        let completion = self
            .client
            .generate(
                &prompt,
                CompletionOptions {
                    agent_id: Some(session.candidate_id.clone()),
                    temperature: Some(self.config.generation_temperature),
                    max_tokens: Some(512),
                },
            )
            .await?;
        let reply = completion.content.trim().to_string();

        let user_text = text.to_string();
        let reply_for_history = reply.clone();
        self.store
            .mutate(&session.id, move |session| {
                session
                    .test_conversation_history
                    .push(crewforge_core::session::InterviewMessage::new(
                        Speaker::Requester,
                        user_text,
                    ));
                session
                    .test_conversation_history
                    .push(crewforge_core::session::InterviewMessage::new(
                        Speaker::Interviewer,
                        reply_for_history,
                    ));
            })
            .await?;
        self.store.record_exchange(&session.id).await?;

        let session = self.store.get_session(&session.id).await?;
        if StateMachine::should_transition(
            session.current_state,
            session.exchanges_in_current_state,
            &session.topics_covered,
        ) {
            self.store
                .update_state(&session.id, InterviewState::AssignDetails)
                .await?;
        }

        Ok(RespondOutcome {
            next_question: Some(reply),
            complete: true,
        })
    }

    // ========================================================================
    // Guards and lookups
    // ========================================================================

    async fn check_accepts_input(&self, session: &InterviewSession) -> Result<()> {
        if !session.is_active() {
            return Err(CrewforgeError::invalid_transition(
                session.current_state.to_string(),
                format!("respond (session is {:?})", session.status).to_lowercase(),
            ));
        }

        if session.status == InterviewStatus::Active
            && session.is_timed_out(self.config.session_timeout_minutes, Utc::now())
        {
            self.store
                .cancel_session(&session.id, Some("session timed out"))
                .await?;
            return Err(CrewforgeError::invalid_transition(
                session.current_state.to_string(),
                "respond (session timed out)",
            ));
        }

        if !StateMachine::accepts_input(session.current_state) {
            return Err(CrewforgeError::invalid_transition(
                session.current_state.to_string(),
                "respond",
            ));
        }
        Ok(())
    }

    fn persona(&self, interviewer_id: &str) -> Result<&InterviewerPersona> {
        self.personas
            .iter()
            .find(|p| p.id == interviewer_id)
            .ok_or_else(|| CrewforgeError::not_found("interviewer", interviewer_id))
    }

    /// The persona allowed to run synthesis: the interviewer when they are
    /// a specialist, otherwise any available specialist.
    fn specialist(&self, interviewer: &InterviewerPersona) -> Option<&InterviewerPersona> {
        if interviewer.hr_specialist {
            return self.personas.iter().find(|p| p.id == interviewer.id);
        }
        self.personas.iter().find(|p| p.hr_specialist)
    }

    async fn turn_lock(&self, session_id: &str) -> Arc<Mutex<()>> {
        let mut locks = self.turn_locks.lock().await;
        locks
            .entry(session_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }
}

/// Metadata tagging an interviewer message with the stage it targets.
fn state_tag(state: InterviewState) -> Option<HashMap<String, String>> {
    Some(HashMap::from([("state".to_string(), state.to_string())]))
}

fn name_options(names: &[String], role: &str) -> Vec<NameOption> {
    names
        .iter()
        .map(|name| NameOption {
            name: name.clone(),
            rationale: format!("fits a {role}"),
        })
        .collect()
}
