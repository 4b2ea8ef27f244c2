//! Team and worker roster backed by an optional JSON snapshot file.
//!
//! Implements both registry traits over one in-memory snapshot. When a file
//! path is configured, every append rewrites the full snapshot (the roster
//! is small; snapshot semantics keep the file trivially consistent).

use crewforge_core::error::{CrewforgeError, Result};
use crewforge_core::team::{Agent, AgentRegistry, Team, TeamRepository};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::RwLock;

/// Serialized roster shape.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct RosterSnapshot {
    #[serde(default)]
    teams: Vec<Team>,
    #[serde(default)]
    agents: Vec<Agent>,
}

/// In-memory roster with optional file persistence.
pub struct FileTeamRoster {
    snapshot: RwLock<RosterSnapshot>,
    path: Option<PathBuf>,
}

impl FileTeamRoster {
    /// Creates an empty in-memory roster (no file backing).
    pub fn in_memory() -> Self {
        Self {
            snapshot: RwLock::new(RosterSnapshot::default()),
            path: None,
        }
    }

    /// Loads a roster from `path`, starting empty if the file is missing.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let snapshot = if path.exists() {
            let content = std::fs::read_to_string(&path)?;
            serde_json::from_str(&content)?
        } else {
            RosterSnapshot::default()
        };
        Ok(Self {
            snapshot: RwLock::new(snapshot),
            path: Some(path),
        })
    }

    /// Registers a team.
    pub fn add_team(&self, team: Team) -> Result<()> {
        {
            let mut snapshot = self
                .snapshot
                .write()
                .map_err(|e| CrewforgeError::internal(e.to_string()))?;
            snapshot.teams.retain(|t| t.id != team.id);
            snapshot.teams.push(team);
        }
        self.flush()
    }

    fn flush(&self) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let snapshot = self
            .snapshot
            .read()
            .map_err(|e| CrewforgeError::internal(e.to_string()))?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(&*snapshot)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

impl TeamRepository for FileTeamRoster {
    fn find_by_id(&self, team_id: &str) -> Result<Option<Team>> {
        let snapshot = self
            .snapshot
            .read()
            .map_err(|e| CrewforgeError::internal(e.to_string()))?;
        Ok(snapshot.teams.iter().find(|t| t.id == team_id).cloned())
    }
}

impl AgentRegistry for FileTeamRoster {
    fn find_by_id(&self, agent_id: &str) -> Result<Option<Agent>> {
        let snapshot = self
            .snapshot
            .read()
            .map_err(|e| CrewforgeError::internal(e.to_string()))?;
        Ok(snapshot.agents.iter().find(|a| a.id == agent_id).cloned())
    }

    fn names_in_team(&self, team_id: &str) -> Result<Vec<String>> {
        let snapshot = self
            .snapshot
            .read()
            .map_err(|e| CrewforgeError::internal(e.to_string()))?;
        Ok(snapshot
            .agents
            .iter()
            .filter(|a| a.team_id == team_id)
            .map(|a| a.name.clone())
            .collect())
    }

    fn append(&self, agent: Agent) -> Result<()> {
        {
            let mut snapshot = self
                .snapshot
                .write()
                .map_err(|e| CrewforgeError::internal(e.to_string()))?;
            snapshot.agents.push(agent);
        }
        self.flush()
    }
}
