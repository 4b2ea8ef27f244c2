//! Candidate profile model and merge semantics.
//!
//! The profile is built incrementally from free text over the interview.
//! Merge rules: list-valued fields are deduplicated sets, scalar fields are
//! first-writer-wins, and nothing is ever cleared once populated.

use serde::{Deserialize, Serialize};

/// Working preferences of the candidate worker.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preferences {
    /// Preferred communication style (e.g. "concise", "detailed")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub communication_style: Option<String>,
    /// Expected working hours description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub working_hours: Option<String>,
    /// How much autonomy the worker should exercise
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub autonomy_level: Option<String>,
}

/// Personality shape of the candidate worker.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Personality {
    /// Trait vocabulary entries attributed to the candidate
    #[serde(default)]
    pub traits: Vec<String>,
    /// Overall tone
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tone: Option<String>,
}

/// The evolving definition of the worker-to-be.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateProfile {
    /// Role the worker fills (e.g. "backend developer")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    /// Areas of expertise, deduplicated
    #[serde(default)]
    pub expertise: Vec<String>,
    /// Working preferences
    #[serde(default)]
    pub preferences: Preferences,
    /// Personality traits and tone
    #[serde(default)]
    pub personality: Personality,
    /// The synthesized system prompt, set by the consultant
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,
    /// The name chosen during name selection
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggested_name: Option<String>,
}

/// A partial update produced from one analyzed response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfilePatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub expertise: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub communication_style: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub working_hours: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub autonomy_level: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub traits: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggested_name: Option<String>,
}

impl ProfilePatch {
    /// Whether this patch carries no information at all.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

impl CandidateProfile {
    /// Merges a patch into the profile.
    ///
    /// Idempotent: applying the same patch twice yields the same profile as
    /// applying it once. Scalars already populated are left untouched;
    /// expertise and traits merge with set semantics preserving first-seen
    /// order.
    pub fn merge(&mut self, patch: &ProfilePatch) {
        merge_scalar(&mut self.role, &patch.role);
        merge_set(&mut self.expertise, &patch.expertise);
        merge_scalar(
            &mut self.preferences.communication_style,
            &patch.communication_style,
        );
        merge_scalar(&mut self.preferences.working_hours, &patch.working_hours);
        merge_scalar(&mut self.preferences.autonomy_level, &patch.autonomy_level);
        merge_set(&mut self.personality.traits, &patch.traits);
        merge_scalar(&mut self.personality.tone, &patch.tone);
        merge_scalar(&mut self.system_prompt, &patch.system_prompt);
        merge_scalar(&mut self.suggested_name, &patch.suggested_name);
    }

    /// Whether the interview has gathered enough to consult: a role, at
    /// least one expertise item, and at least one preference.
    pub fn is_sufficient(&self) -> bool {
        self.role.is_some() && !self.expertise.is_empty() && self.has_any_preference()
    }

    /// Whether any preference field is populated.
    pub fn has_any_preference(&self) -> bool {
        self.preferences.communication_style.is_some()
            || self.preferences.working_hours.is_some()
            || self.preferences.autonomy_level.is_some()
    }
}

/// First writer wins: a populated scalar is never overwritten.
fn merge_scalar(slot: &mut Option<String>, incoming: &Option<String>) {
    if slot.is_none() {
        if let Some(value) = incoming {
            let trimmed = value.trim();
            if !trimmed.is_empty() {
                *slot = Some(trimmed.to_string());
            }
        }
    }
}

/// Set-merge preserving first-seen order; comparison is case-insensitive.
fn merge_set(slot: &mut Vec<String>, incoming: &[String]) {
    for value in incoming {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            continue;
        }
        let exists = slot
            .iter()
            .any(|existing| existing.eq_ignore_ascii_case(trimmed));
        if !exists {
            slot.push(trimmed.to_string());
        }
    }
}
