//! Name negotiation and generation.
//!
//! Presents exactly three name options, parses the requester's selection
//! (ordinal or literal), and generates candidate names with team-scoped
//! collision avoidance. On LLM failure the deterministic role-keyed pool
//! with numeric-suffix disambiguation guarantees uniqueness.

use crewforge_core::completion::{CompletionClient, CompletionOptions};
use crewforge_core::config::InterviewConfig;
use crewforge_core::error::Result;
use crewforge_core::team::AgentRegistry;
use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::Arc;

/// How many options the negotiator presents.
pub const NAME_OPTION_COUNT: usize = 3;

/// One presented name with its rationale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameOption {
    pub name: String,
    pub rationale: String,
}

/// Parses the requester's selection against the presented options.
///
/// Accepts a 1-based ordinal ("2") or a case-insensitive literal match
/// against an option name. Anything else returns `None` and must cause no
/// mutation.
pub fn parse_name_selection(input: &str, options: &[NameOption]) -> Option<String> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(ordinal) = trimmed.parse::<usize>() {
        if (1..=options.len()).contains(&ordinal) {
            return Some(options[ordinal - 1].name.clone());
        }
        return None;
    }

    options
        .iter()
        .find(|option| option.name.eq_ignore_ascii_case(trimmed))
        .map(|option| option.name.clone())
}

/// Formats the options for presentation to the requester.
pub fn present_options(options: &[NameOption]) -> String {
    let mut lines = vec![
        "Here are my name suggestions for your new team member:".to_string(),
    ];
    for (index, option) in options.iter().enumerate() {
        lines.push(format!("{}. {} - {}", index + 1, option.name, option.rationale));
    }
    lines.push("Reply with a number (1-3) or the name itself.".to_string());
    lines.join("\n")
}

static NAME_CHARSET: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z][A-Za-z '\-]*$").expect("valid name charset regex"));

/// Whether a candidate name passes the restrictive charset filter:
/// letters, spaces, hyphens, apostrophes, at most `max_length` characters.
pub fn is_acceptable_name(name: &str, max_length: usize) -> bool {
    let trimmed = name.trim();
    !trimmed.is_empty() && trimmed.len() <= max_length && NAME_CHARSET.is_match(trimmed)
}

/// Deterministic role-keyed fallback pools.
static FALLBACK_POOLS: Lazy<Vec<(&'static str, &'static [&'static str])>> = Lazy::new(|| {
    vec![
        ("develop", &["Ada", "Linus", "Grace", "Dennis"] as &[&str]),
        ("engineer", &["Ada", "Linus", "Grace", "Dennis"]),
        ("design", &["Iris", "Milo", "Vera"]),
        ("manag", &["Morgan", "Avery", "Blake"]),
        ("research", &["Marie", "Alan", "Rosalind"]),
        ("writ", &["Harper", "Sylvia", "Ernest"]),
    ]
});

static DEFAULT_POOL: &[&str] = &["Alex", "Sam", "Riley", "Jordan", "Casey", "Quinn"];

/// Picks the fallback pool for a role description.
fn pool_for_role(role: &str) -> &'static [&'static str] {
    let lower = role.to_lowercase();
    FALLBACK_POOLS
        .iter()
        .find(|(key, _)| lower.contains(key))
        .map(|(_, pool)| *pool)
        .unwrap_or(DEFAULT_POOL)
}

/// Deterministic fallback names for a role, unique against `taken`.
///
/// Walks the role's pool in order and disambiguates with numeric suffixes
/// ("Ada-2", "Ada-3", ...) on exhaustion, so uniqueness holds even under
/// repeated LLM failure.
pub fn fallback_names(role: &str, taken: &[String], count: usize) -> Vec<String> {
    let pool = pool_for_role(role);
    let mut result = Vec::with_capacity(count);
    let is_taken = |name: &str, result: &[String]| {
        taken.iter().any(|t| t.eq_ignore_ascii_case(name))
            || result.iter().any(|t: &String| t.eq_ignore_ascii_case(name))
    };

    for base in pool {
        if result.len() == count {
            break;
        }
        if !is_taken(base, &result) {
            result.push(base.to_string());
        }
    }

    let mut suffix = 2u32;
    while result.len() < count {
        for base in pool {
            if result.len() == count {
                break;
            }
            let candidate = format!("{base}-{suffix}");
            if !is_taken(&candidate, &result) {
                result.push(candidate);
            }
        }
        suffix += 1;
    }

    result
}

/// LLM-backed name generator with deterministic fallback.
pub struct NameGenerator {
    client: Arc<dyn CompletionClient>,
    registry: Arc<dyn AgentRegistry>,
    config: InterviewConfig,
}

impl NameGenerator {
    pub fn new(
        client: Arc<dyn CompletionClient>,
        registry: Arc<dyn AgentRegistry>,
        config: InterviewConfig,
    ) -> Self {
        Self {
            client,
            registry,
            config,
        }
    }

    /// Produces `count` unique names for a role within a team.
    ///
    /// Candidate sources, in order: `seed` names (e.g. from the consultant),
    /// then an LLM call, then the deterministic pool. Every candidate is
    /// charset-filtered and checked against the team's existing names.
    /// Never fails: name generation always has the deterministic floor.
    pub async fn generate(
        &self,
        team_id: &str,
        role: &str,
        seed: &[String],
        count: usize,
    ) -> Vec<String> {
        let taken = match self.registry.names_in_team(team_id) {
            Ok(names) => names,
            Err(err) => {
                tracing::warn!(
                    target: "workflow",
                    team_id,
                    "Failed to load existing names, assuming none: {err}"
                );
                Vec::new()
            }
        };

        let mut result: Vec<String> = Vec::with_capacity(count);
        let consider = |candidates: &[String], result: &mut Vec<String>| {
            for candidate in candidates {
                if result.len() == count {
                    return;
                }
                let candidate = candidate.trim();
                if !is_acceptable_name(candidate, self.config.max_name_length) {
                    continue;
                }
                let clashes = taken.iter().any(|t| t.eq_ignore_ascii_case(candidate))
                    || result.iter().any(|t| t.eq_ignore_ascii_case(candidate));
                if !clashes {
                    result.push(candidate.to_string());
                }
            }
        };

        consider(seed, &mut result);

        if result.len() < count {
            match self.ask_model(role, &taken, count).await {
                Ok(candidates) => consider(&candidates, &mut result),
                Err(err) => {
                    tracing::warn!(
                        target: "workflow",
                        "Name generation call failed, using fallback pool: {err}"
                    );
                }
            }
        }

        if result.len() < count {
            let mut all_taken = taken.clone();
            all_taken.extend(result.iter().cloned());
            let fill = fallback_names(role, &all_taken, count - result.len());
            result.extend(fill);
        }

        result
    }

    async fn ask_model(&self, role: &str, taken: &[String], count: usize) -> Result<Vec<String>> {
        let prompt = format!(
            "Suggest {count} distinct first names for a new team member whose role is \
\"{role}\". Avoid these already-used names: {taken}. \
Output one name per line, nothing else.",
            taken = if taken.is_empty() {
                "(none)".to_string()
            } else {
                taken.join(", ")
            },
        );

        let completion = self
            .client
            .generate(
                &prompt,
                CompletionOptions {
                    agent_id: None,
                    temperature: Some(self.config.generation_temperature),
                    max_tokens: Some(128),
                },
            )
            .await?;

        Ok(completion
            .content
            .lines()
            .map(|line| line.trim_matches(|c: char| !c.is_alphabetic() && c != '\'' && c != '-'))
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use crewforge_core::completion::{Completion, TokenUsage};
    use crewforge_core::error::CrewforgeError;
    use crewforge_core::team::Agent;

    fn options() -> Vec<NameOption> {
        vec![
            NameOption {
                name: "Ada".to_string(),
                rationale: "classic engineering name".to_string(),
            },
            NameOption {
                name: "Grace".to_string(),
                rationale: "pioneer of the field".to_string(),
            },
            NameOption {
                name: "Linus".to_string(),
                rationale: "systems heritage".to_string(),
            },
        ]
    }

    #[test]
    fn test_ordinal_selection() {
        assert_eq!(parse_name_selection("2", &options()).as_deref(), Some("Grace"));
        assert_eq!(parse_name_selection(" 1 ", &options()).as_deref(), Some("Ada"));
    }

    #[test]
    fn test_literal_selection_case_insensitive() {
        assert_eq!(parse_name_selection("grace", &options()).as_deref(), Some("Grace"));
        assert_eq!(parse_name_selection("LINUS", &options()).as_deref(), Some("Linus"));
    }

    #[test]
    fn test_invalid_selection_rejected() {
        assert_eq!(parse_name_selection("nonexistent", &options()), None);
        assert_eq!(parse_name_selection("4", &options()), None);
        assert_eq!(parse_name_selection("0", &options()), None);
        assert_eq!(parse_name_selection("", &options()), None);
    }

    #[test]
    fn test_charset_filter() {
        assert!(is_acceptable_name("Mary-Jane O'Neil", 50));
        assert!(!is_acceptable_name("R2D2", 50));
        assert!(!is_acceptable_name("", 50));
        assert!(!is_acceptable_name("-leading", 50));
        assert!(!is_acceptable_name(&"a".repeat(51), 50));
    }

    #[test]
    fn test_fallback_pool_is_role_keyed() {
        let names = fallback_names("backend developer", &[], 3);
        assert_eq!(names, vec!["Ada", "Linus", "Grace"]);

        let names = fallback_names("gardener", &[], 2);
        assert_eq!(names, vec!["Alex", "Sam"]);
    }

    #[test]
    fn test_fallback_suffixes_on_exhaustion() {
        let taken: Vec<String> = ["Ada", "Linus", "Grace", "Dennis"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let names = fallback_names("developer", &taken, 2);
        assert_eq!(names, vec!["Ada-2", "Linus-2"]);
    }

    struct FailingClient;

    #[async_trait]
    impl CompletionClient for FailingClient {
        async fn generate(&self, _prompt: &str, _options: CompletionOptions) -> Result<Completion> {
            Err(CrewforgeError::generation("api down"))
        }
    }

    struct LineClient(String);

    #[async_trait]
    impl CompletionClient for LineClient {
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

    struct StaticRegistry(Vec<String>);

    impl AgentRegistry for StaticRegistry {
        fn find_by_id(&self, _agent_id: &str) -> Result<Option<Agent>> {
            Ok(None)
        }

        fn names_in_team(&self, _team_id: &str) -> Result<Vec<String>> {
            Ok(self.0.clone())
        }

        fn append(&self, _agent: Agent) -> Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_generation_survives_llm_failure() {
        let generator = NameGenerator::new(
            Arc::new(FailingClient),
            Arc::new(StaticRegistry(vec!["Ada".to_string()])),
            InterviewConfig::default(),
        );

        let names = generator.generate("team-1", "developer", &[], 3).await;
        assert_eq!(names.len(), 3);
        assert!(!names.iter().any(|n| n.eq_ignore_ascii_case("Ada")));
    }

    #[tokio::test]
    async fn test_model_names_are_filtered_and_deduped() {
        let generator = NameGenerator::new(
            Arc::new(LineClient("Nova\nR2D2\nNova\nVega".to_string())),
            Arc::new(StaticRegistry(Vec::new())),
            InterviewConfig::default(),
        );

        let names = generator.generate("team-1", "developer", &[], 3).await;
        assert_eq!(names[0], "Nova");
        assert_eq!(names[1], "Vega");
        assert_eq!(names.len(), 3);
        assert!(!names.contains(&"R2D2".to_string()));
    }

    #[tokio::test]
    async fn test_seed_names_take_priority() {
        let generator = NameGenerator::new(
            Arc::new(FailingClient),
            Arc::new(StaticRegistry(Vec::new())),
            InterviewConfig::default(),
        );

        let seed = vec!["Juniper".to_string(), "bad!name".to_string()];
        let names = generator.generate("team-1", "developer", &seed, 3).await;
        assert_eq!(names[0], "Juniper");
        assert_eq!(names.len(), 3);
    }
}
