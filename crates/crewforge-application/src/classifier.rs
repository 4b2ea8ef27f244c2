//! Topic classification for extracted facts.
//!
//! The keyword heuristic is deliberately behind a trait so it can be swapped
//! for a real classifier without touching the aggregator's merge logic.

use once_cell::sync::Lazy;

/// The profile slot a piece of text belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Topic {
    Role,
    Expertise,
    CommunicationStyle,
    WorkingHours,
    Autonomy,
}

/// Pluggable text-to-topic classifier.
pub trait TopicClassifier: Send + Sync {
    /// Classifies a fact into a profile slot, or `None` when nothing
    /// matches.
    fn classify(&self, text: &str) -> Option<Topic>;

    /// Personality traits mentioned in the text, from a fixed vocabulary.
    /// Extracted independently of the interview state.
    fn personality_traits(&self, text: &str) -> Vec<String>;
}

static ROLE_KEYWORDS: Lazy<Vec<&'static str>> = Lazy::new(|| {
    vec![
        "developer",
        "engineer",
        "manager",
        "director",
        "designer",
        "analyst",
        "architect",
        "researcher",
        "writer",
        "marketer",
        "consultant",
        "specialist",
        "assistant",
        "tester",
        "lead",
    ]
});

static COMMUNICATION_KEYWORDS: Lazy<Vec<&'static str>> = Lazy::new(|| {
    vec![
        "communicat",
        "concise",
        "detailed",
        "formal",
        "casual",
        "brief",
        "verbose",
        "report",
        "update",
        "async",
        "meeting",
        "tone",
    ]
});

static HOURS_KEYWORDS: Lazy<Vec<&'static str>> = Lazy::new(|| {
    vec![
        "hour",
        "schedule",
        "timezone",
        "time zone",
        "morning",
        "evening",
        "night",
        "weekend",
        "availab",
        "full-time",
        "part-time",
        "around the clock",
    ]
});

static AUTONOMY_KEYWORDS: Lazy<Vec<&'static str>> = Lazy::new(|| {
    vec![
        "autonom",
        "independen",
        "supervis",
        "approval",
        "check in",
        "check-in",
        "hands-off",
        "hands off",
        "decision",
        "own the",
        "self-directed",
    ]
});

static EXPERTISE_KEYWORDS: Lazy<Vec<&'static str>> = Lazy::new(|| {
    vec![
        "experience",
        "skill",
        "expert",
        "knows",
        "familiar",
        "proficien",
        "background in",
        "specializ",
    ]
});

/// Fixed personality vocabulary matched case-insensitively.
static TRAIT_VOCABULARY: Lazy<Vec<&'static str>> = Lazy::new(|| {
    vec![
        "analytical",
        "creative",
        "pragmatic",
        "meticulous",
        "empathetic",
        "proactive",
        "collaborative",
        "decisive",
        "curious",
        "patient",
        "rigorous",
        "friendly",
        "calm",
        "energetic",
        "thorough",
        "diplomatic",
    ]
});

/// Keyword-list classifier, the default heuristic.
#[derive(Default)]
pub struct KeywordClassifier;

impl KeywordClassifier {
    fn contains_any(text: &str, keywords: &[&str]) -> bool {
        keywords.iter().any(|k| text.contains(k))
    }
}

impl TopicClassifier for KeywordClassifier {
    fn classify(&self, text: &str) -> Option<Topic> {
        let lower = text.to_lowercase();
        // Preference keywords are scoped per preference and checked before
        // the broader role list, so "communicates like a manager" routes to
        // communication rather than role.
        if Self::contains_any(&lower, &COMMUNICATION_KEYWORDS) {
            return Some(Topic::CommunicationStyle);
        }
        if Self::contains_any(&lower, &HOURS_KEYWORDS) {
            return Some(Topic::WorkingHours);
        }
        if Self::contains_any(&lower, &AUTONOMY_KEYWORDS) {
            return Some(Topic::Autonomy);
        }
        if Self::contains_any(&lower, &ROLE_KEYWORDS) {
            return Some(Topic::Role);
        }
        if Self::contains_any(&lower, &EXPERTISE_KEYWORDS) {
            return Some(Topic::Expertise);
        }
        None
    }

    fn personality_traits(&self, text: &str) -> Vec<String> {
        let lower = text.to_lowercase();
        TRAIT_VOCABULARY
            .iter()
            .filter(|t| lower.contains(*t))
            .map(|t| t.to_string())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_classification() {
        let classifier = KeywordClassifier;
        assert_eq!(
            classifier.classify("We need a senior backend developer"),
            Some(Topic::Role)
        );
    }

    #[test]
    fn test_preference_keywords_scoped_per_preference() {
        let classifier = KeywordClassifier;
        assert_eq!(
            classifier.classify("Should send concise written updates"),
            Some(Topic::CommunicationStyle)
        );
        assert_eq!(
            classifier.classify("Available during European morning hours"),
            Some(Topic::WorkingHours)
        );
        assert_eq!(
            classifier.classify("Works independently without approval gates"),
            Some(Topic::Autonomy)
        );
    }

    #[test]
    fn test_unclassifiable_text() {
        let classifier = KeywordClassifier;
        assert_eq!(classifier.classify("the weather is nice"), None);
    }

    #[test]
    fn test_personality_extraction_is_state_independent() {
        let classifier = KeywordClassifier;
        let traits = classifier.personality_traits("Someone analytical, patient and Friendly");
        assert_eq!(traits, vec!["analytical", "patient", "friendly"]);
    }
}
