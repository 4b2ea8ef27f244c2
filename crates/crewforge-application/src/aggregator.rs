//! Profile aggregation.
//!
//! Routes facts extracted by the analyzer into the candidate profile based
//! on the interview state. The merge itself lives on the profile model;
//! this component only decides which slot each fact belongs to.

use crate::classifier::{Topic, TopicClassifier};
use crewforge_core::profile::ProfilePatch;
use crewforge_core::session::InterviewState;

/// Builds profile patches from analyzed responses.
pub struct ProfileAggregator {
    classifier: Box<dyn TopicClassifier>,
}

impl ProfileAggregator {
    pub fn new(classifier: Box<dyn TopicClassifier>) -> Self {
        Self { classifier }
    }

    /// Builds a patch for the facts of one accepted turn.
    ///
    /// Routing by state: role states seed the role (first unclassified fact
    /// included), the expertise state treats every fact as expertise, the
    /// preference state routes per preference keyword, and `follow_up`
    /// routes best-effort across all slots. Personality traits come from
    /// the raw text regardless of state.
    pub fn patch_for(
        &self,
        state: InterviewState,
        key_info: &[String],
        raw_text: &str,
    ) -> ProfilePatch {
        let mut patch = ProfilePatch::default();

        match state {
            InterviewState::Greet | InterviewState::AskRole => {
                for fact in key_info {
                    match self.classifier.classify(fact) {
                        Some(Topic::Role) | None if patch.role.is_none() => {
                            patch.role = Some(fact.clone());
                        }
                        Some(Topic::Expertise) => patch.expertise.push(fact.clone()),
                        _ => {}
                    }
                }
            }
            InterviewState::AskExpertise => {
                patch.expertise.extend(key_info.iter().cloned());
            }
            InterviewState::AskPreferences => {
                for fact in key_info {
                    self.route_preference(&mut patch, fact);
                }
            }
            _ => {
                // Follow-up (and any late-arriving facts): best effort
                // across every slot.
                for fact in key_info {
                    match self.classifier.classify(fact) {
                        Some(Topic::Role) => {
                            if patch.role.is_none() {
                                patch.role = Some(fact.clone());
                            }
                        }
                        Some(Topic::Expertise) | None => patch.expertise.push(fact.clone()),
                        Some(_) => self.route_preference(&mut patch, fact),
                    }
                }
            }
        }

        patch.traits = self.classifier.personality_traits(raw_text);
        patch
    }

    fn route_preference(&self, patch: &mut ProfilePatch, fact: &str) {
        match self.classifier.classify(fact) {
            Some(Topic::CommunicationStyle) => {
                if patch.communication_style.is_none() {
                    patch.communication_style = Some(fact.to_string());
                }
            }
            Some(Topic::WorkingHours) => {
                if patch.working_hours.is_none() {
                    patch.working_hours = Some(fact.to_string());
                }
            }
            Some(Topic::Autonomy) => {
                if patch.autonomy_level.is_none() {
                    patch.autonomy_level = Some(fact.to_string());
                }
            }
            // Unscoped preference statements default to communication style.
            _ => {
                if patch.communication_style.is_none() {
                    patch.communication_style = Some(fact.to_string());
                }
            }
        }
    }
}

impl Default for ProfileAggregator {
    fn default() -> Self {
        Self::new(Box::new(crate::classifier::KeywordClassifier))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crewforge_core::profile::CandidateProfile;

    fn facts(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_role_state_seeds_role() {
        let aggregator = ProfileAggregator::default();
        let patch = aggregator.patch_for(
            InterviewState::AskRole,
            &facts(&["senior backend developer", "experience with payment systems"]),
            "we need a senior backend developer",
        );
        assert_eq!(patch.role.as_deref(), Some("senior backend developer"));
        assert_eq!(patch.expertise, facts(&["experience with payment systems"]));
    }

    #[test]
    fn test_expertise_state_takes_all_facts() {
        let aggregator = ProfileAggregator::default();
        let patch = aggregator.patch_for(
            InterviewState::AskExpertise,
            &facts(&["Rust", "PostgreSQL", "Kubernetes"]),
            "rust, postgres and k8s",
        );
        assert_eq!(patch.expertise.len(), 3);
        assert!(patch.role.is_none());
    }

    #[test]
    fn test_preferences_route_per_keyword() {
        let aggregator = ProfileAggregator::default();
        let patch = aggregator.patch_for(
            InterviewState::AskPreferences,
            &facts(&[
                "concise written updates",
                "available during morning hours",
                "works independently",
            ]),
            "...",
        );
        assert_eq!(
            patch.communication_style.as_deref(),
            Some("concise written updates")
        );
        assert_eq!(
            patch.working_hours.as_deref(),
            Some("available during morning hours")
        );
        assert_eq!(patch.autonomy_level.as_deref(), Some("works independently"));
    }

    #[test]
    fn test_follow_up_routes_best_effort() {
        let aggregator = ProfileAggregator::default();
        let patch = aggregator.patch_for(
            InterviewState::FollowUp,
            &facts(&["a data engineer", "proficient in Python", "prefers concise messages"]),
            "...",
        );
        assert_eq!(patch.role.as_deref(), Some("a data engineer"));
        assert_eq!(patch.expertise, facts(&["proficient in Python"]));
        assert_eq!(
            patch.communication_style.as_deref(),
            Some("prefers concise messages")
        );
    }

    #[test]
    fn test_traits_extracted_from_raw_text() {
        let aggregator = ProfileAggregator::default();
        let patch = aggregator.patch_for(
            InterviewState::AskExpertise,
            &facts(&["Rust"]),
            "someone analytical and patient, expert in Rust",
        );
        assert_eq!(patch.traits, facts(&["analytical", "patient"]));
    }

    #[test]
    fn test_patch_merges_idempotently_into_profile() {
        let aggregator = ProfileAggregator::default();
        let patch = aggregator.patch_for(
            InterviewState::AskRole,
            &facts(&["backend developer"]),
            "a pragmatic backend developer",
        );

        let mut profile = CandidateProfile::default();
        profile.merge(&patch);
        let once = profile.clone();
        profile.merge(&patch);
        assert_eq!(profile, once);
    }
}
