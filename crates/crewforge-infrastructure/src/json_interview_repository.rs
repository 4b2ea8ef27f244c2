//! JSON-directory InterviewRepository implementation.
//!
//! One JSON file per session under `base_dir/<org-id>/interviews/`. Writes
//! are atomic (tmp file + rename), saves are idempotent full overwrites, and
//! listing tolerates corrupt files so one bad mirror cannot block restart
//! rehydration.

use async_trait::async_trait;
use crewforge_core::error::{CrewforgeError, Result};
use crewforge_core::session::{InterviewRepository, InterviewSession};
use std::path::{Path, PathBuf};
use tokio::fs;

/// File-backed session repository.
///
/// Directory structure:
/// ```text
/// base_dir/
/// └── <org-id>/
///     └── interviews/
///         ├── <session-id-1>.json
///         └── <session-id-2>.json
/// ```
pub struct JsonDirInterviewRepository {
    base_dir: PathBuf,
}

impl JsonDirInterviewRepository {
    /// Creates a repository rooted at `base_dir`, creating it if needed.
    pub async fn new(base_dir: impl AsRef<Path>) -> Result<Self> {
        let base_dir = base_dir.as_ref().to_path_buf();
        fs::create_dir_all(&base_dir).await?;
        Ok(Self { base_dir })
    }

    fn interviews_dir(&self, organization_id: &str) -> PathBuf {
        self.base_dir.join(organization_id).join("interviews")
    }

    fn session_path(&self, organization_id: &str, session_id: &str) -> PathBuf {
        self.interviews_dir(organization_id)
            .join(format!("{session_id}.json"))
    }

    /// Writes `content` to `path` atomically via a sibling tmp file.
    async fn write_atomic(path: &Path, content: &str) -> Result<()> {
        let tmp_path = path.with_extension("json.tmp");
        fs::write(&tmp_path, content).await?;
        fs::rename(&tmp_path, path).await?;
        Ok(())
    }
}

#[async_trait]
impl InterviewRepository for JsonDirInterviewRepository {
    async fn save(&self, session: &InterviewSession) -> Result<()> {
        let dir = self.interviews_dir(&session.organization_id);
        fs::create_dir_all(&dir).await?;

        let path = self.session_path(&session.organization_id, &session.id);
        let content = serde_json::to_string_pretty(session)?;
        Self::write_atomic(&path, &content).await?;

        tracing::debug!(
            target: "persistence",
            session_id = %session.id,
            "Saved interview mirror"
        );
        Ok(())
    }

    async fn find_by_id(
        &self,
        organization_id: &str,
        session_id: &str,
    ) -> Result<Option<InterviewSession>> {
        let path = self.session_path(organization_id, session_id);
        let content = match fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };

        let session = serde_json::from_str(&content)?;
        Ok(Some(session))
    }

    async fn list_by_org(&self, organization_id: &str) -> Result<Vec<InterviewSession>> {
        let dir = self.interviews_dir(organization_id);
        let mut entries = match fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(err.into()),
        };

        let mut sessions = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| CrewforgeError::data_access(e.to_string()))?
        {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let content = match fs::read_to_string(&path).await {
                Ok(content) => content,
                Err(err) => {
                    tracing::warn!(
                        target: "persistence",
                        path = %path.display(),
                        "Failed to read interview mirror: {err}"
                    );
                    continue;
                }
            };
            match serde_json::from_str::<InterviewSession>(&content) {
                Ok(session) => sessions.push(session),
                Err(err) => {
                    // One corrupt mirror must not block rehydration.
                    tracing::warn!(
                        target: "persistence",
                        path = %path.display(),
                        "Skipping corrupt interview mirror: {err}"
                    );
                }
            }
        }

        // Most recently updated first.
        sessions.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(sessions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crewforge_core::session::{InterviewMessage, Speaker};
    use tempfile::TempDir;

    fn create_test_session(org: &str) -> InterviewSession {
        let mut session = InterviewSession::new(org, "team-1", "hr-1");
        session
            .transcript
            .push(InterviewMessage::new(Speaker::Interviewer, "Hello!"));
        session
    }

    #[tokio::test]
    async fn test_save_and_find_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let repository = JsonDirInterviewRepository::new(temp_dir.path()).await.unwrap();

        let session = create_test_session("org-1");
        repository.save(&session).await.unwrap();

        let loaded = repository.find_by_id("org-1", &session.id).await.unwrap();
        // Dates come back as date values, not strings, so full equality holds.
        assert_eq!(loaded, Some(session));
    }

    #[tokio::test]
    async fn test_save_is_idempotent_overwrite() {
        let temp_dir = TempDir::new().unwrap();
        let repository = JsonDirInterviewRepository::new(temp_dir.path()).await.unwrap();

        let mut session = create_test_session("org-1");
        repository.save(&session).await.unwrap();
        session
            .transcript
            .push(InterviewMessage::new(Speaker::Requester, "Hi"));
        repository.save(&session).await.unwrap();

        let loaded = repository
            .find_by_id("org-1", &session.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(loaded.transcript.len(), 2);

        let listed = repository.list_by_org("org-1").await.unwrap();
        assert_eq!(listed.len(), 1);
    }

    #[tokio::test]
    async fn test_find_nonexistent_returns_none() {
        let temp_dir = TempDir::new().unwrap();
        let repository = JsonDirInterviewRepository::new(temp_dir.path()).await.unwrap();

        let loaded = repository.find_by_id("org-1", "missing").await.unwrap();
        assert!(loaded.is_none());
    }

    #[tokio::test]
    async fn test_list_skips_corrupt_files() {
        let temp_dir = TempDir::new().unwrap();
        let repository = JsonDirInterviewRepository::new(temp_dir.path()).await.unwrap();

        repository.save(&create_test_session("org-1")).await.unwrap();

        let corrupt = temp_dir
            .path()
            .join("org-1")
            .join("interviews")
            .join("broken.json");
        std::fs::write(&corrupt, "{ not json").unwrap();

        let listed = repository.list_by_org("org-1").await.unwrap();
        assert_eq!(listed.len(), 1);
    }

    #[tokio::test]
    async fn test_list_empty_org() {
        let temp_dir = TempDir::new().unwrap();
        let repository = JsonDirInterviewRepository::new(temp_dir.path()).await.unwrap();
        assert!(repository.list_by_org("nobody").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_orgs_are_isolated() {
        let temp_dir = TempDir::new().unwrap();
        let repository = JsonDirInterviewRepository::new(temp_dir.path()).await.unwrap();

        repository.save(&create_test_session("org-a")).await.unwrap();
        repository.save(&create_test_session("org-b")).await.unwrap();

        assert_eq!(repository.list_by_org("org-a").await.unwrap().len(), 1);
        assert_eq!(repository.list_by_org("org-b").await.unwrap().len(), 1);
    }
}
