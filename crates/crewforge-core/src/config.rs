//! Engine configuration.
//!
//! Tuning knobs for the interview workflow. Values are compiled-in defaults
//! that can be overridden from a `config.toml` under the app config directory.

use crate::error::{CrewforgeError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Tuning parameters for the interview workflow engine.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct InterviewConfig {
    /// Clarity score below which a follow-up question is asked (1-10 scale).
    #[serde(default = "default_follow_up_threshold")]
    pub follow_up_threshold: u8,
    /// Minimum number of interviewer questions before the interview may
    /// be considered complete.
    #[serde(default = "default_min_questions")]
    pub min_questions: usize,
    /// Upper bound on interviewer questions. The transcript hard cap is
    /// `2 * max_questions` entries.
    #[serde(default = "default_max_questions")]
    pub max_questions: usize,
    /// Wall-clock session timeout in minutes, measured from creation.
    #[serde(default = "default_session_timeout_minutes")]
    pub session_timeout_minutes: i64,
    /// Maximum accepted length for generated worker names.
    #[serde(default = "default_max_name_length")]
    pub max_name_length: usize,
    /// Sampling temperature for analysis calls.
    #[serde(default = "default_analysis_temperature")]
    pub analysis_temperature: f32,
    /// Sampling temperature for question/synthesis calls.
    #[serde(default = "default_generation_temperature")]
    pub generation_temperature: f32,
}

fn default_follow_up_threshold() -> u8 {
    6
}

fn default_min_questions() -> usize {
    4
}

fn default_max_questions() -> usize {
    12
}

fn default_session_timeout_minutes() -> i64 {
    30
}

fn default_max_name_length() -> usize {
    50
}

fn default_analysis_temperature() -> f32 {
    0.2
}

fn default_generation_temperature() -> f32 {
    0.7
}

impl Default for InterviewConfig {
    fn default() -> Self {
        Self {
            follow_up_threshold: default_follow_up_threshold(),
            min_questions: default_min_questions(),
            max_questions: default_max_questions(),
            session_timeout_minutes: default_session_timeout_minutes(),
            max_name_length: default_max_name_length(),
            analysis_temperature: default_analysis_temperature(),
            generation_temperature: default_generation_temperature(),
        }
    }
}

impl InterviewConfig {
    /// Loads configuration from a TOML file.
    ///
    /// A missing file is not an error: defaults are returned so the engine
    /// can run without any configuration present.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks internal consistency of the configuration values.
    pub fn validate(&self) -> Result<()> {
        if self.follow_up_threshold == 0 || self.follow_up_threshold > 10 {
            return Err(CrewforgeError::config(
                "follow_up_threshold must be within 1..=10",
            ));
        }
        if self.min_questions > self.max_questions {
            return Err(CrewforgeError::config(
                "min_questions must not exceed max_questions",
            ));
        }
        if self.session_timeout_minutes <= 0 {
            return Err(CrewforgeError::config(
                "session_timeout_minutes must be positive",
            ));
        }
        Ok(())
    }

    /// The hard cap on transcript length, independent of model behavior.
    pub fn transcript_hard_cap(&self) -> usize {
        self.max_questions * 2
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = InterviewConfig::default();
        assert_eq!(config.follow_up_threshold, 6);
        assert_eq!(config.max_questions, 12);
        assert_eq!(config.transcript_hard_cap(), 24);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_missing_file_returns_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = InterviewConfig::load_from(dir.path().join("config.toml")).unwrap();
        assert_eq!(config, InterviewConfig::default());
    }

    #[test]
    fn test_load_partial_file_keeps_defaults_for_rest() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "follow_up_threshold = 8\n").unwrap();

        let config = InterviewConfig::load_from(&path).unwrap();
        assert_eq!(config.follow_up_threshold, 8);
        assert_eq!(config.max_questions, 12);
    }

    #[test]
    fn test_validate_rejects_inverted_question_bounds() {
        let config = InterviewConfig {
            min_questions: 20,
            max_questions: 10,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
