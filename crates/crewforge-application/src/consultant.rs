//! Consultant synthesis.
//!
//! Runs once per interview, turning the full transcript and profile into a
//! system prompt, name candidates, and review feedback. Unlike the
//! analyzer, a missing or empty system prompt is a hard failure: silently
//! producing a broken worker is worse than making the caller retry.

use crate::analyzer::extract_json_object;
use crate::question::{format_transcript, persona_conditioning};
use crewforge_core::completion::{CompletionClient, CompletionOptions};
use crewforge_core::config::InterviewConfig;
use crewforge_core::error::{CrewforgeError, Result};
use crewforge_core::persona::InterviewerPersona;
use crewforge_core::profile::CandidateProfile;
use crewforge_core::session::InterviewSession;
use serde::Deserialize;
use std::sync::Arc;

/// Fixed fallback list used when the model omits name suggestions.
const FALLBACK_SUGGESTED_NAMES: [&str; 3] = ["Nova", "Sage", "Wren"];

/// The consultant's synthesis output.
#[derive(Debug, Clone, PartialEq)]
pub struct ConsultantReport {
    /// The system prompt the new worker will run with
    pub system_prompt: String,
    /// Candidate names, normally three
    pub suggested_names: Vec<String>,
    /// Review feedback on the interview outcome
    pub feedback: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReportWire {
    #[serde(default)]
    system_prompt: String,
    #[serde(default)]
    suggested_names: Vec<String>,
    #[serde(default)]
    feedback: String,
}

/// Synthesizes the final worker definition from a completed interview.
pub struct Consultant {
    client: Arc<dyn CompletionClient>,
    config: InterviewConfig,
}

impl Consultant {
    pub fn new(client: Arc<dyn CompletionClient>, config: InterviewConfig) -> Self {
        Self { client, config }
    }

    /// Runs synthesis.
    ///
    /// With a specialist persona the model authors the report; a malformed
    /// response or empty system prompt is a `Synthesis` error and the
    /// session stays retryable. Without a specialist the template path
    /// produces a serviceable report with no LLM call at all, so the system
    /// never wholly blocks on specialist availability.
    pub async fn synthesize(
        &self,
        session: &InterviewSession,
        specialist: Option<&InterviewerPersona>,
    ) -> Result<ConsultantReport> {
        let Some(specialist) = specialist else {
            tracing::info!(
                target: "workflow",
                session_id = %session.id,
                "No specialist persona available, using template synthesis"
            );
            return Ok(template_report(&session.candidate_profile));
        };

        let prompt = self.build_prompt(session, specialist);
        let completion = self
            .client
            .generate(
                &prompt,
                CompletionOptions {
                    agent_id: Some(specialist.id.clone()),
                    temperature: Some(self.config.generation_temperature),
                    max_tokens: Some(1024),
                },
            )
            .await
            .map_err(|err| CrewforgeError::synthesis(format!("consultant call failed: {err}")))?;

        let json = extract_json_object(&completion.content).ok_or_else(|| {
            CrewforgeError::synthesis("consultant response contained no JSON object")
        })?;

        let wire: ReportWire = serde_json::from_str(&json)
            .map_err(|err| CrewforgeError::synthesis(format!("malformed consultant JSON: {err}")))?;

        if wire.system_prompt.trim().is_empty() {
            return Err(CrewforgeError::synthesis(
                "consultant produced no system prompt",
            ));
        }

        let suggested_names = if wire.suggested_names.is_empty() {
            FALLBACK_SUGGESTED_NAMES.iter().map(|s| s.to_string()).collect()
        } else {
            wire.suggested_names
        };

        Ok(ConsultantReport {
            system_prompt: wire.system_prompt.trim().to_string(),
            suggested_names,
            feedback: wire.feedback,
        })
    }

    fn build_prompt(&self, session: &InterviewSession, specialist: &InterviewerPersona) -> String {
        let profile_json = serde_json::to_string_pretty(&session.candidate_profile)
            .unwrap_or_else(|_| "{}".to_string());

        format!(
            "{conditioning}\n\n\
An interview defining a new autonomous team member has concluded. \
Synthesize the final definition.\n\n\
Full transcript:\n{transcript}\n\n\
Aggregated profile:\n{profile_json}\n\n\
Respond with ONLY a JSON object matching exactly:\n\
{{\n  \"systemPrompt\": \"the complete system prompt the new team member will operate under\",\n\
  \"suggestedNames\": [\"three\", \"name\", \"candidates\"],\n\
  \"feedback\": \"a short review of how well-specified this role is\"\n}}",
            conditioning = persona_conditioning(specialist),
            transcript = format_transcript(session),
        )
    }
}

/// Template-based synthesis requiring no LLM call.
fn template_report(profile: &CandidateProfile) -> ConsultantReport {
    let role = profile.role.as_deref().unwrap_or("team member");
    let mut prompt = format!("You are an autonomous {role}.");

    if !profile.expertise.is_empty() {
        prompt.push_str(&format!(
            " Your areas of expertise: {}.",
            profile.expertise.join(", ")
        ));
    }
    if let Some(style) = &profile.preferences.communication_style {
        prompt.push_str(&format!(" Communication style: {style}."));
    }
    if let Some(hours) = &profile.preferences.working_hours {
        prompt.push_str(&format!(" Working hours: {hours}."));
    }
    if let Some(autonomy) = &profile.preferences.autonomy_level {
        prompt.push_str(&format!(" Autonomy: {autonomy}."));
    }
    if !profile.personality.traits.is_empty() {
        prompt.push_str(&format!(
            " Personality: {}.",
            profile.personality.traits.join(", ")
        ));
    }
    prompt.push_str(" Stay within your role and ask for clarification when a request falls outside it.");

    ConsultantReport {
        system_prompt: prompt,
        suggested_names: FALLBACK_SUGGESTED_NAMES.iter().map(|s| s.to_string()).collect(),
        feedback: "Synthesized from the aggregated profile without specialist review.".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use crewforge_core::completion::{Completion, TokenUsage};
    use crewforge_core::persona::default_presets;
    use crewforge_core::profile::ProfilePatch;

    struct ScriptedClient(String);

    #[async_trait]
    impl CompletionClient for ScriptedClient {
        async fn generate(&self, _prompt: &str, _options: CompletionOptions) -> Result<Completion> {
            Ok(Completion {
                content: self.0.clone(),
                tokens_used: TokenUsage::default(),
                provider: "test".to_string(),
                model: "test".to_string(),
                finish_reason: "end_turn".to_string(),
            })
        }
    }

    fn consultant(content: &str) -> Consultant {
        Consultant::new(
            Arc::new(ScriptedClient(content.to_string())),
            InterviewConfig::default(),
        )
    }

    fn specialist() -> InterviewerPersona {
        default_presets().into_iter().find(|p| p.hr_specialist).unwrap()
    }

    fn session() -> InterviewSession {
        let mut session = InterviewSession::new("org-1", "team-1", "hr-1");
        session.candidate_profile.merge(&ProfilePatch {
            role: Some("backend developer".to_string()),
            expertise: vec!["Rust".to_string()],
            communication_style: Some("concise".to_string()),
            ..Default::default()
        });
        session
    }

    #[tokio::test]
    async fn test_valid_report() {
        let consultant = consultant(
            r#"{"systemPrompt": "You are a Rust backend developer.",
                "suggestedNames": ["Ada", "Grace", "Linus"],
                "feedback": "Well specified."}"#,
        );

        let report = consultant
            .synthesize(&session(), Some(&specialist()))
            .await
            .unwrap();
        assert_eq!(report.system_prompt, "You are a Rust backend developer.");
        assert_eq!(report.suggested_names.len(), 3);
        assert_eq!(report.feedback, "Well specified.");
    }

    #[tokio::test]
    async fn test_empty_system_prompt_is_hard_failure() {
        let consultant = consultant(r#"{"systemPrompt": "", "suggestedNames": ["A"]}"#);
        let err = consultant
            .synthesize(&session(), Some(&specialist()))
            .await
            .unwrap_err();
        assert!(err.is_synthesis());
    }

    #[tokio::test]
    async fn test_malformed_json_is_hard_failure() {
        let consultant = consultant("I could not produce JSON, sorry.");
        let err = consultant
            .synthesize(&session(), Some(&specialist()))
            .await
            .unwrap_err();
        assert!(err.is_synthesis());
    }

    #[tokio::test]
    async fn test_missing_names_degrade_to_fallback() {
        let consultant = consultant(r#"{"systemPrompt": "You are a worker."}"#);
        let report = consultant
            .synthesize(&session(), Some(&specialist()))
            .await
            .unwrap();
        assert_eq!(report.suggested_names, vec!["Nova", "Sage", "Wren"]);
    }

    #[tokio::test]
    async fn test_no_specialist_uses_template() {
        let consultant = consultant("this client must not matter");
        let report = consultant.synthesize(&session(), None).await.unwrap();
        assert!(report.system_prompt.contains("backend developer"));
        assert!(report.system_prompt.contains("Rust"));
        assert_eq!(report.suggested_names.len(), 3);
    }
}
