//! Engine assembly.
//!
//! Wires the concrete completion client, durable stores, personas, and
//! configuration into a ready [`WorkflowOrchestrator`]. Consumers that bring
//! their own trait implementations can construct the orchestrator directly;
//! this module is the default deployment shape.

use crate::session_store::SessionStore;
use crate::workflow::WorkflowOrchestrator;
use crewforge_core::completion::CompletionClient;
use crewforge_core::config::InterviewConfig;
use crewforge_core::error::{CrewforgeError, Result};
use crewforge_core::persona::default_presets;
use crewforge_core::session::InterviewRepository;
use crewforge_core::team::{AgentRegistry, TeamRepository};
use crewforge_infrastructure::{CrewforgePaths, FileTeamRoster, JsonDirInterviewRepository};
use crewforge_interaction::ClaudeCompletionClient;
use std::sync::Arc;

/// A fully wired interview workflow engine for one organization.
pub struct InterviewEngine {
    pub orchestrator: WorkflowOrchestrator,
    pub store: Arc<SessionStore>,
    pub roster: Arc<FileTeamRoster>,
}

impl InterviewEngine {
    /// Assembles the default deployment: Claude client from the
    /// environment, configuration and roster under the crewforge config
    /// directory, per-organization JSON interview mirrors, and the preset
    /// personas. Rehydrates the organization's sessions before returning.
    pub async fn bootstrap(organization_id: &str) -> Result<Self> {
        let config_dir =
            CrewforgePaths::config_dir().map_err(|e| CrewforgeError::config(e.to_string()))?;
        let config_file =
            CrewforgePaths::config_file().map_err(|e| CrewforgeError::config(e.to_string()))?;
        let roster_file =
            CrewforgePaths::roster_file().map_err(|e| CrewforgeError::config(e.to_string()))?;

        let config = InterviewConfig::load_from(config_file)?;
        let client = Arc::new(ClaudeCompletionClient::try_from_env()?);
        let repository = Arc::new(JsonDirInterviewRepository::new(config_dir.join("orgs")).await?);
        let roster = Arc::new(FileTeamRoster::load(roster_file)?);

        Self::assemble(organization_id, client, repository, roster, config).await
    }

    /// Assembles an engine from explicit parts.
    pub async fn assemble(
        organization_id: &str,
        client: Arc<dyn CompletionClient>,
        repository: Arc<dyn InterviewRepository>,
        roster: Arc<FileTeamRoster>,
        config: InterviewConfig,
    ) -> Result<Self> {
        config.validate()?;

        let store = Arc::new(SessionStore::new(organization_id, repository));
        let rehydrated = store.rehydrate().await?;
        tracing::info!(
            target: "workflow",
            organization_id,
            rehydrated,
            "Interview engine assembled"
        );

        let orchestrator = WorkflowOrchestrator::new(
            store.clone(),
            client,
            roster.clone() as Arc<dyn TeamRepository>,
            roster.clone() as Arc<dyn AgentRegistry>,
            default_presets(),
            config,
        );

        Ok(Self {
            orchestrator,
            store,
            roster,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use crewforge_core::completion::{Completion, CompletionOptions, TokenUsage};
    use crewforge_core::team::Team;
    use std::time::Duration;

    struct EchoClient;

    #[async_trait]
    impl CompletionClient for EchoClient {
        async fn generate(&self, _prompt: &str, _options: CompletionOptions) -> Result<Completion> {
            Ok(Completion {
                content: "What should they work on?".to_string(),
                tokens_used: TokenUsage::default(),
                provider: "test".to_string(),
                model: "test".to_string(),
                finish_reason: "end_turn".to_string(),
            })
        }
    }

    #[tokio::test]
    async fn test_assemble_wires_file_backed_engine() {
        let temp_dir = tempfile::tempdir().unwrap();
        let repository = Arc::new(
            JsonDirInterviewRepository::new(temp_dir.path().join("orgs"))
                .await
                .unwrap(),
        );
        let roster = Arc::new(FileTeamRoster::in_memory());
        roster
            .add_team(Team {
                id: "team-1".to_string(),
                organization_id: "org-1".to_string(),
                name: "Platform".to_string(),
            })
            .unwrap();

        let engine = InterviewEngine::assemble(
            "org-1",
            Arc::new(EchoClient),
            repository,
            roster,
            InterviewConfig::default(),
        )
        .await
        .unwrap();
        assert_eq!(engine.store.organization_id(), "org-1");

        let started = engine
            .orchestrator
            .start_interview("team-1", &crewforge_core::persona::default_presets()[0].id)
            .await
            .unwrap();
        let session = engine.store.get_session(&started.session_id).await.unwrap();
        assert_eq!(session.transcript.len(), 1);

        // The durable mirror catches up shortly after the mutation.
        let path = temp_dir
            .path()
            .join("orgs")
            .join("org-1")
            .join("interviews")
            .join(format!("{}.json", started.session_id));
        for _ in 0..100 {
            if path.exists() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        assert!(path.exists());
    }

    #[tokio::test]
    async fn test_assemble_rejects_invalid_config() {
        let temp_dir = tempfile::tempdir().unwrap();
        let repository = Arc::new(
            JsonDirInterviewRepository::new(temp_dir.path())
                .await
                .unwrap(),
        );
        let config = InterviewConfig {
            min_questions: 20,
            max_questions: 10,
            ..Default::default()
        };

        let err = InterviewEngine::assemble(
            "org-1",
            Arc::new(EchoClient),
            repository,
            Arc::new(FileTeamRoster::in_memory()),
            config,
        )
        .await
        .err()
        .unwrap();
        assert!(matches!(err, CrewforgeError::Config(_)));
    }
}
