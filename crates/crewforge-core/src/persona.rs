//! Interviewer persona model and presets.
//!
//! Personas define the voice conducting the interview. The HR-specialist
//! flag gates the consultant's LLM path: without a specialist available the
//! consultant falls back to template-based synthesis.

use serde::{Deserialize, Serialize};

/// Represents the source of a persona (system-provided or user-created).
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PersonaSource {
    /// System-provided default personas
    System,
    /// User-created custom personas
    #[default]
    User,
}

/// A persona conducting interviews on behalf of the organization.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct InterviewerPersona {
    /// Unique identifier (UUID format)
    pub id: String,
    /// Display name of the persona
    pub name: String,
    /// Role or title describing the persona's function
    pub role: String,
    /// Background description
    pub background: String,
    /// Communication style characteristics
    pub communication_style: String,
    /// Whether this persona can run the consultant synthesis step
    #[serde(default)]
    pub hr_specialist: bool,
    /// Source of the persona (System or User)
    #[serde(default)]
    pub source: PersonaSource,
}

/// UUID for the Harper preset (deterministic UUID v5 from "Harper")
const HARPER_UUID: &str = "5b1e8f2c-9a4d-5c7e-8f3b-2d6a9e4c1f7b";

/// UUID for the Rowan preset (deterministic UUID v5 from "Rowan")
const ROWAN_UUID: &str = "3f7c2a9e-6b1d-5e8f-9c4a-7d2b5f8e3a1c";

/// Returns the system-defined interviewer personas.
///
/// - **Harper**: HR specialist; conducts interviews and runs synthesis.
/// - **Rowan**: recruiting coordinator; conducts interviews only, so a
///   deployment carrying only Rowan exercises the template fallback.
pub fn default_presets() -> Vec<InterviewerPersona> {
    vec![
        InterviewerPersona {
            id: HARPER_UUID.to_string(),
            name: "Harper".to_string(),
            role: "HR Specialist".to_string(),
            background: "Seasoned talent partner who turns vague staffing wishes into precise role definitions, probing for scope, expertise, and working style.".to_string(),
            communication_style: "Warm and structured. Asks exactly one focused question at a time and mirrors the requester's vocabulary.".to_string(),
            hr_specialist: true,
            source: PersonaSource::System,
        },
        InterviewerPersona {
            id: ROWAN_UUID.to_string(),
            name: "Rowan".to_string(),
            role: "Recruiting Coordinator".to_string(),
            background: "Keeps interviews moving and on-topic, handing synthesis off to a specialist when one is available.".to_string(),
            communication_style: "Brisk and friendly. Keeps questions short and concrete.".to_string(),
            hr_specialist: false,
            source: PersonaSource::System,
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets_are_distinct() {
        let presets = default_presets();
        assert_eq!(presets.len(), 2);
        assert_ne!(presets[0].id, presets[1].id);
    }

    #[test]
    fn test_exactly_one_specialist_preset() {
        let specialists: Vec<_> = default_presets()
            .into_iter()
            .filter(|p| p.hr_specialist)
            .collect();
        assert_eq!(specialists.len(), 1);
        assert_eq!(specialists[0].name, "Harper");
    }
}
