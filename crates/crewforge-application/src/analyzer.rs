//! Response analysis.
//!
//! Extracts structured signals from the requester's latest message via an
//! LLM call with a strict JSON contract. Analysis failure must never block
//! the interview: any parse or schema violation degrades to a neutral
//! default instead of erroring (the deliberate asymmetry with the
//! consultant, whose failures are surfaced).

use crewforge_core::completion::{CompletionClient, CompletionOptions};
use crewforge_core::config::InterviewConfig;
use crewforge_core::session::InterviewSession;
use serde::Deserialize;
use std::sync::Arc;

/// Structured signals extracted from one requester response.
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseAnalysis {
    /// Key facts extracted from the message
    pub key_info: Vec<String>,
    /// How specific/actionable the response was, 1-10
    pub clarity_score: u8,
    /// The model explicitly asked for a follow-up
    pub needs_follow_up: bool,
    /// Why a follow-up is needed, when flagged
    pub follow_up_reason: String,
}

impl ResponseAnalysis {
    /// The canonical neutral default: progress without extracted facts.
    pub fn neutral() -> Self {
        Self {
            key_info: Vec::new(),
            clarity_score: 5,
            needs_follow_up: false,
            follow_up_reason: String::new(),
        }
    }
}

/// Wire shape of the analysis contract. Tolerant of missing fields; every
/// violation beyond that falls back to [`ResponseAnalysis::neutral`].
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AnalysisWire {
    #[serde(default)]
    key_info: Vec<String>,
    #[serde(default)]
    clarity_score: Option<f64>,
    #[serde(default)]
    needs_follow_up: bool,
    #[serde(default)]
    follow_up_reason: String,
}

/// LLM-backed analyzer for requester responses.
pub struct ResponseAnalyzer {
    client: Arc<dyn CompletionClient>,
    config: InterviewConfig,
}

impl ResponseAnalyzer {
    pub fn new(client: Arc<dyn CompletionClient>, config: InterviewConfig) -> Self {
        Self { client, config }
    }

    /// Analyzes the requester's latest message.
    ///
    /// Never errors: LLM failure or malformed output yields the neutral
    /// default so the workflow always makes progress.
    pub async fn analyze(&self, session: &InterviewSession, text: &str) -> ResponseAnalysis {
        let prompt = self.build_prompt(session, text);
        let options = CompletionOptions {
            agent_id: Some(session.interviewer_id.clone()),
            temperature: Some(self.config.analysis_temperature),
            max_tokens: Some(512),
        };

        let content = match self.client.generate(&prompt, options).await {
            Ok(completion) => completion.content,
            Err(err) => {
                tracing::warn!(
                    target: "workflow",
                    session_id = %session.id,
                    "Analysis call failed, using neutral default: {err}"
                );
                return ResponseAnalysis::neutral();
            }
        };

        parse_analysis(&content)
    }

    /// Whether the analysis calls for a clarifying follow-up question.
    ///
    /// True when clarity is below the threshold, the model explicitly
    /// flagged it, or fewer than two facts came out of a middling answer.
    pub fn needs_follow_up(&self, analysis: &ResponseAnalysis) -> bool {
        analysis.clarity_score < self.config.follow_up_threshold
            || analysis.needs_follow_up
            || (analysis.key_info.len() < 2 && analysis.clarity_score < 8)
    }

    fn build_prompt(&self, session: &InterviewSession, text: &str) -> String {
        format!(
            "You are analyzing one answer given during an interview that defines \
a new team member. The interview is currently covering: {state}.\n\n\
Requester's answer:\n{text}\n\n\
Respond with ONLY a JSON object, no prose, matching exactly:\n\
{{\n  \"keyInfo\": [\"each concrete fact extracted from the answer\"],\n\
  \"clarityScore\": 1-10,\n\
  \"needsFollowUp\": true/false,\n\
  \"followUpReason\": \"why a clarification is needed, or empty\"\n}}",
            state = session.current_state,
            text = text
        )
    }
}

/// Parses the analysis contract defensively.
///
/// Accepts fenced or inline JSON; anything unusable becomes the neutral
/// default.
pub(crate) fn parse_analysis(content: &str) -> ResponseAnalysis {
    let Some(json) = extract_json_object(content) else {
        tracing::debug!(target: "workflow", "No JSON object in analysis output");
        return ResponseAnalysis::neutral();
    };

    let wire: AnalysisWire = match serde_json::from_str(&json) {
        Ok(wire) => wire,
        Err(err) => {
            tracing::debug!(target: "workflow", "Malformed analysis JSON: {err}");
            return ResponseAnalysis::neutral();
        }
    };

    let clarity_score = match wire.clarity_score {
        Some(score) if score.is_finite() => (score.round() as i64).clamp(1, 10) as u8,
        _ => 5,
    };

    ResponseAnalysis {
        key_info: wire
            .key_info
            .into_iter()
            .map(|fact| fact.trim().to_string())
            .filter(|fact| !fact.is_empty())
            .collect(),
        clarity_score,
        needs_follow_up: wire.needs_follow_up,
        follow_up_reason: wire.follow_up_reason,
    }
}

/// Pulls the first balanced JSON object out of model output, tolerating
/// code fences and surrounding prose.
pub(crate) fn extract_json_object(content: &str) -> Option<String> {
    let trimmed = content.trim();
    let body = if let Some(start) = trimmed.find("```") {
        let after = &trimmed[start + 3..];
        let after = after.strip_prefix("json").unwrap_or(after);
        match after.find("```") {
            Some(end) => &after[..end],
            None => after,
        }
    } else {
        trimmed
    };

    let start = body.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    for (offset, ch) in body[start..].char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match ch {
            '\\' if in_string => escaped = true,
            '"' => in_string = !in_string,
            '{' if !in_string => depth += 1,
            '}' if !in_string => {
                depth -= 1;
                if depth == 0 {
                    return Some(body[start..start + offset + 1].to_string());
                }
            }
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use crewforge_core::completion::{Completion, TokenUsage};
    use crewforge_core::error::{CrewforgeError, Result};

    struct ScriptedClient {
        response: Result<String>,
    }

    #[async_trait]
    impl CompletionClient for ScriptedClient {
        async fn generate(&self, _prompt: &str, _options: CompletionOptions) -> Result<Completion> {
            let content = self.response.clone()?;
            Ok(Completion {
                content,
                tokens_used: TokenUsage::default(),
                provider: "test".to_string(),
                model: "test".to_string(),
                finish_reason: "end_turn".to_string(),
            })
        }
    }

    fn analyzer(response: Result<String>) -> ResponseAnalyzer {
        ResponseAnalyzer::new(
            Arc::new(ScriptedClient { response }),
            InterviewConfig::default(),
        )
    }

    fn session() -> InterviewSession {
        InterviewSession::new("org-1", "team-1", "hr-1")
    }

    #[tokio::test]
    async fn test_parses_valid_contract() {
        let json = r#"{"keyInfo": ["needs a rust developer", "backend services"],
                       "clarityScore": 8, "needsFollowUp": false, "followUpReason": ""}"#;
        let analyzer = analyzer(Ok(json.to_string()));

        let analysis = analyzer.analyze(&session(), "a rust backend dev").await;
        assert_eq!(analysis.key_info.len(), 2);
        assert_eq!(analysis.clarity_score, 8);
        assert!(!analyzer.needs_follow_up(&analysis));
    }

    #[tokio::test]
    async fn test_fenced_json_is_accepted() {
        let content = "Here is the analysis:\n```json\n{\"keyInfo\": [\"x\", \"y\"], \"clarityScore\": 9}\n```";
        let analyzer = analyzer(Ok(content.to_string()));
        let analysis = analyzer.analyze(&session(), "whatever").await;
        assert_eq!(analysis.clarity_score, 9);
        assert_eq!(analysis.key_info, vec!["x", "y"]);
    }

    #[tokio::test]
    async fn test_malformed_json_degrades_to_neutral() {
        let analyzer = analyzer(Ok("not json at all".to_string()));
        let analysis = analyzer.analyze(&session(), "whatever").await;
        assert_eq!(analysis, ResponseAnalysis::neutral());
    }

    #[tokio::test]
    async fn test_llm_failure_degrades_to_neutral() {
        let analyzer = analyzer(Err(CrewforgeError::generation("boom")));
        let analysis = analyzer.analyze(&session(), "whatever").await;
        assert_eq!(analysis, ResponseAnalysis::neutral());
    }

    #[test]
    fn test_clarity_is_clamped() {
        let analysis = parse_analysis(r#"{"clarityScore": 42}"#);
        assert_eq!(analysis.clarity_score, 10);
        let analysis = parse_analysis(r#"{"clarityScore": -3}"#);
        assert_eq!(analysis.clarity_score, 1);
    }

    #[test]
    fn test_follow_up_heuristic() {
        let analyzer = analyzer(Ok(String::new()));

        // Below threshold.
        let low_clarity = ResponseAnalysis {
            clarity_score: 3,
            key_info: vec!["a".into(), "b".into()],
            ..ResponseAnalysis::neutral()
        };
        assert!(analyzer.needs_follow_up(&low_clarity));

        // Explicit flag wins regardless of clarity.
        let flagged = ResponseAnalysis {
            clarity_score: 9,
            key_info: vec!["a".into(), "b".into()],
            needs_follow_up: true,
            ..ResponseAnalysis::neutral()
        };
        assert!(analyzer.needs_follow_up(&flagged));

        // Few facts with middling clarity.
        let sparse = ResponseAnalysis {
            clarity_score: 7,
            key_info: vec!["a".into()],
            ..ResponseAnalysis::neutral()
        };
        assert!(analyzer.needs_follow_up(&sparse));

        // Clear and rich enough.
        let good = ResponseAnalysis {
            clarity_score: 8,
            key_info: vec!["a".into(), "b".into()],
            ..ResponseAnalysis::neutral()
        };
        assert!(!analyzer.needs_follow_up(&good));
    }
}
