//! Team and worker (agent) domain models and registry traits.

use crate::error::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A team that finalized workers join.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Team {
    /// Unique team identifier (UUID format)
    pub id: String,
    /// Owning organization
    pub organization_id: String,
    /// Display name
    pub name: String,
}

/// Seniority rank of a worker, driving its default token allocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentRank {
    Director,
    Manager,
    Worker,
}

impl AgentRank {
    /// Default per-task token allocation for the rank.
    pub fn token_allocation(self) -> u32 {
        match self {
            AgentRank::Director => 200_000,
            AgentRank::Manager => 120_000,
            AgentRank::Worker => 80_000,
        }
    }

    /// Derives the rank from a role description.
    ///
    /// Director and manager keywords win over the default worker rank.
    pub fn from_role(role: &str) -> Self {
        let lower = role.to_lowercase();
        if lower.contains("director") || lower.contains("chief") || lower.contains("head of") {
            AgentRank::Director
        } else if lower.contains("manager") || lower.contains("lead") {
            AgentRank::Manager
        } else {
            AgentRank::Worker
        }
    }
}

/// An autonomous worker, either pre-existing or materialized from an
/// interview.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Agent {
    /// Unique agent identifier (UUID format)
    pub id: String,
    /// Owning team
    pub team_id: String,
    /// Display name, unique within the team
    pub name: String,
    /// Role description
    pub role: String,
    /// Rank derived from the role
    pub rank: AgentRank,
    /// The system prompt the worker runs with
    pub system_prompt: String,
    /// Per-task token allocation
    pub token_allocation: u32,
    /// Optional gender recorded at detail assignment
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    /// When the worker was materialized
    pub created_at: DateTime<Utc>,
}

/// Read access to the team registry, for validation.
pub trait TeamRepository: Send + Sync {
    /// Finds a team by id.
    fn find_by_id(&self, team_id: &str) -> Result<Option<Team>>;
}

/// The worker registry: existing-name queries and materialization.
pub trait AgentRegistry: Send + Sync {
    /// Finds an agent by id.
    fn find_by_id(&self, agent_id: &str) -> Result<Option<Agent>>;

    /// Names already taken within a team, for collision avoidance.
    fn names_in_team(&self, team_id: &str) -> Result<Vec<String>>;

    /// Appends a finalized worker to the registry.
    fn append(&self, agent: Agent) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rank_from_role() {
        assert_eq!(AgentRank::from_role("Engineering Director"), AgentRank::Director);
        assert_eq!(AgentRank::from_role("project manager"), AgentRank::Manager);
        assert_eq!(AgentRank::from_role("Tech Lead"), AgentRank::Manager);
        assert_eq!(AgentRank::from_role("backend developer"), AgentRank::Worker);
    }

    #[test]
    fn test_token_allocation_ordering() {
        assert!(
            AgentRank::Director.token_allocation() > AgentRank::Manager.token_allocation()
        );
        assert!(AgentRank::Manager.token_allocation() > AgentRank::Worker.token_allocation());
    }
}
