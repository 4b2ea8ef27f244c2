//! Question generation.
//!
//! Produces the next interviewer utterance from the current state,
//! transcript, and profile-so-far. Recognizes the model's completion
//! sentinel and enforces a transcript hard cap so progress never depends on
//! model behavior.

use crewforge_core::completion::{CompletionClient, CompletionOptions};
use crewforge_core::config::InterviewConfig;
use crewforge_core::error::Result;
use crewforge_core::persona::InterviewerPersona;
use crewforge_core::session::{InterviewSession, Speaker, StateMachine};
use rand::seq::SliceRandom;
use std::sync::Arc;

/// Literal token the model emits when it judges the interview complete.
pub const COMPLETION_SENTINEL: &str = "INTERVIEW_COMPLETE";

/// LLM-backed generator for interviewer questions.
pub struct QuestionGenerator {
    client: Arc<dyn CompletionClient>,
    config: InterviewConfig,
}

impl QuestionGenerator {
    pub fn new(client: Arc<dyn CompletionClient>, config: InterviewConfig) -> Self {
        Self { client, config }
    }

    /// Opening line for a fresh session. Template-based: the first turn
    /// must not depend on LLM availability.
    pub fn greeting(persona: &InterviewerPersona) -> String {
        let templates = [
            format!(
                "Hi! I'm {}, {}. I'll ask a few questions to understand the team member you need. To start: what should this new team member do for you?",
                persona.name, persona.role
            ),
            format!(
                "Hello, {} here ({}). Let's define your new team member together. First off, what kind of work should they take on?",
                persona.name, persona.role
            ),
        ];
        templates
            .choose(&mut rand::thread_rng())
            .cloned()
            .unwrap_or_else(|| templates[0].clone())
    }

    /// Generates the next question, or `None` when the interview should
    /// move to consultation.
    ///
    /// Returns `None` without calling the model when the transcript exceeds
    /// the hard cap, and when the model emits the completion sentinel.
    /// Generation failures propagate: questions have no silent fallback.
    pub async fn next_question(
        &self,
        session: &InterviewSession,
        persona: &InterviewerPersona,
    ) -> Result<Option<String>> {
        if session.transcript.len() >= self.config.transcript_hard_cap() {
            tracing::debug!(
                target: "workflow",
                session_id = %session.id,
                "Transcript hard cap reached, ending question loop"
            );
            return Ok(None);
        }

        let prompt = self.build_prompt(session, persona);
        let options = CompletionOptions {
            agent_id: Some(session.interviewer_id.clone()),
            temperature: Some(self.config.generation_temperature),
            max_tokens: Some(512),
        };

        let completion = self.client.generate(&prompt, options).await?;
        let content = completion.content.trim();

        if content.contains(COMPLETION_SENTINEL) {
            return Ok(None);
        }

        Ok(Some(content.to_string()))
    }

    /// Targeted clarifying question for the follow-up side-state.
    pub async fn clarifying_question(
        &self,
        session: &InterviewSession,
        persona: &InterviewerPersona,
        reason: &str,
    ) -> Result<String> {
        let last_answer = session
            .transcript
            .iter()
            .rev()
            .find(|m| m.speaker == Speaker::Requester)
            .map(|m| m.message.as_str())
            .unwrap_or("");

        let prompt = format!(
            "{conditioning}\n\nThe requester's last answer was unclear.\n\
Answer: {last_answer}\n\
What is unclear: {reason}\n\n\
Ask exactly one short clarifying question, in character, and nothing else. \
Never write the requester's side of the conversation and never include timestamps.",
            conditioning = persona_conditioning(persona),
        );

        let options = CompletionOptions {
            agent_id: Some(session.interviewer_id.clone()),
            temperature: Some(self.config.generation_temperature),
            max_tokens: Some(256),
        };

        let completion = self.client.generate(&prompt, options).await?;
        Ok(completion.content.trim().to_string())
    }

    fn build_prompt(&self, session: &InterviewSession, persona: &InterviewerPersona) -> String {
        let profile_json = serde_json::to_string_pretty(&session.candidate_profile)
            .unwrap_or_else(|_| "{}".to_string());

        format!(
            "{conditioning}\n\n\
You are interviewing a requester to define a new autonomous team member.\n\
Current interview stage: {state}{topic}.\n\
Questions asked so far: {asked}.\n\n\
Conversation so far:\n{transcript}\n\n\
What is already known about the candidate:\n{profile_json}\n\n\
Rules:\n\
- Ask exactly ONE question, phrased for the current stage.\n\
- Do not repeat a topic that is already answered above.\n\
- Never write the requester's side of the conversation.\n\
- Never include timestamps or speaker labels in your output.\n\
- When role, expertise and preferences are all covered and you have asked \
at least {min} questions, output exactly {sentinel} and nothing else.",
            conditioning = persona_conditioning(persona),
            state = session.current_state,
            asked = session.question_count(),
            min = self.config.min_questions,
            topic = StateMachine::topic(session.current_state)
                .map(|t| format!(" (topic: {t})"))
                .unwrap_or_default(),
            transcript = format_transcript(session),
            sentinel = COMPLETION_SENTINEL,
        )
    }
}

/// Formats the transcript for prompt embedding, without timestamps.
pub(crate) fn format_transcript(session: &InterviewSession) -> String {
    if session.transcript.is_empty() {
        return "(no messages yet)".to_string();
    }
    session
        .transcript
        .iter()
        .map(|m| {
            let label = match m.speaker {
                Speaker::Interviewer => "Interviewer",
                Speaker::Requester => "Requester",
            };
            format!("{label}: {}", m.message)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub(crate) fn persona_conditioning(persona: &InterviewerPersona) -> String {
    format!(
        "You are {name}, {role}. {background} Communication style: {style}",
        name = persona.name,
        role = persona.role,
        background = persona.background,
        style = persona.communication_style,
    )
}
