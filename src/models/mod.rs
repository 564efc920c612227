// TrueLens Data Models
// Plain data shared by the scorer, the gateway path and the renderers

use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

// ============ Sentence Scores ============

/// AI/human probability pair for one sentence.
///
/// Only the AI side is ever supplied; the human side is derived from it so the
/// pair always sums to one.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SentenceScore {
    ai_probability: f64,
    human_probability: f64,
}

impl SentenceScore {
    pub fn from_ai(ai_probability: f64) -> Self {
        Self {
            ai_probability,
            human_probability: 1.0 - ai_probability,
        }
    }

    pub fn ai(&self) -> f64 {
        self.ai_probability
    }

    pub fn human(&self) -> f64 {
        self.human_probability
    }

    pub fn classification(&self) -> Classification {
        Classification::from_probability(self.ai_probability)
    }
}

/// Lower bound (inclusive) of the AI band.
pub const AI_THRESHOLD: f64 = 0.62;
/// Upper bound (inclusive) of the human band.
pub const HUMAN_THRESHOLD: f64 = 0.40;

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Classification {
    Ai,
    Human,
    Mixed,
}

impl Classification {
    pub fn from_probability(ai_probability: f64) -> Self {
        if ai_probability >= AI_THRESHOLD {
            Self::Ai
        } else if ai_probability <= HUMAN_THRESHOLD {
            Self::Human
        } else {
            Self::Mixed
        }
    }

    /// Parse the label used by the remote verdict schema. Matching is exact:
    /// anything that is not `ai` or `human` counts as mixed, including `"AI"`.
    pub fn from_label(label: &str) -> Self {
        match label {
            "ai" => Self::Ai,
            "human" => Self::Human,
            _ => Self::Mixed,
        }
    }

    pub fn display_label(&self) -> &'static str {
        match self {
            Self::Ai => "AI Generated",
            Self::Human => "Human Written",
            Self::Mixed => "Uncertain",
        }
    }
}

// ============ Document Verdict ============

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassificationCounts {
    pub ai: usize,
    pub human: usize,
    pub mixed: usize,
}

impl ClassificationCounts {
    pub fn total(&self) -> usize {
        self.ai + self.human + self.mixed
    }
}

/// Share of sentences per class. `mixed` is the residual `100 - ai - human`
/// and may drift by a point from the true share, including going negative.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BreakdownPercents {
    pub ai: i32,
    pub human: i32,
    pub mixed: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentVerdict {
    pub ai_percent: i32,
    pub human_percent: i32,
    pub sentence_count: usize,
    pub counts: ClassificationCounts,
    pub breakdown: BreakdownPercents,
}

impl DocumentVerdict {
    /// Replace the overall percentage, keeping the human side complementary.
    pub fn with_overall(mut self, ai_percent: i32) -> Self {
        self.ai_percent = ai_percent;
        self.human_percent = 100 - ai_percent;
        self
    }
}

// ============ Remote Verdict Schemas ============

/// Models send `null` for fields they have nothing to say about; read it as absent.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct RemoteSentence {
    #[serde(default, deserialize_with = "null_as_default")]
    pub text: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub classification: String,
    #[serde(default)]
    pub confidence: Option<f64>,
}

/// JSON object the text system prompt asks the model for.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct RemoteTextVerdict {
    #[serde(default)]
    pub ai_probability: Option<f64>,
    #[serde(default)]
    pub human_probability: Option<f64>,
    #[serde(default)]
    pub verdict: Option<String>,
    #[serde(default)]
    pub reasoning: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub sentences: Vec<RemoteSentence>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageAttribute {
    pub name: String,
    pub score: f64,
}

/// JSON object the image system prompt asks the model for.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct RemoteImageVerdict {
    #[serde(default)]
    pub authenticity_score: Option<f64>,
    #[serde(default)]
    pub verdict: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub reasoning: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub attributes: Vec<ImageAttribute>,
}

/// Body posted to the proxy route.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayRequest {
    pub system_prompt: String,
    pub user_prompt: String,
}

// ============ Analysis Results ============

#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisSource {
    Gateway,
    Fallback,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoredSentence {
    pub text: String,
    #[serde(flatten)]
    pub score: SentenceScore,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SentenceBreakdown {
    pub index: usize,
    pub preview: String,
    pub classification: Classification,
    pub label: String,
    pub ai_percent: i32,
    pub confidence: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextAnalysis {
    pub request_id: Uuid,
    pub source: AnalysisSource,
    pub verdict: DocumentVerdict,
    pub label: String,
    pub sentences: Vec<ScoredSentence>,
    pub breakdown: Vec<SentenceBreakdown>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageAnalysis {
    pub request_id: Uuid,
    pub source: AnalysisSource,
    pub authenticity_score: i32,
    pub label: String,
    pub description: String,
    pub attributes: Vec<ImageAttribute>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<String>,
    /// Set when a demo override rewrote the score.
    #[serde(default)]
    pub overridden: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_score_is_complementary() {
        for p in [0.0, 0.03, 0.28, 0.4, 0.5, 0.62, 0.72, 0.97, 1.0] {
            let s = SentenceScore::from_ai(p);
            assert_eq!(s.human(), 1.0 - p);
            if p >= 0.5 {
                // 1 - p is exact here (Sterbenz), so the sum is exactly one
                assert_eq!(s.ai() + s.human(), 1.0);
            } else {
                // 1 - p may round below 0.5; the sum can be off by an ulp
                assert!((s.ai() + s.human() - 1.0).abs() <= f64::EPSILON);
            }
        }
    }

    #[test]
    fn test_classification_thresholds() {
        assert_eq!(Classification::from_probability(0.62), Classification::Ai);
        assert_eq!(Classification::from_probability(0.61), Classification::Mixed);
        assert_eq!(Classification::from_probability(0.41), Classification::Mixed);
        assert_eq!(Classification::from_probability(0.40), Classification::Human);
        assert_eq!(Classification::from_probability(0.0), Classification::Human);
        assert_eq!(Classification::from_probability(1.0), Classification::Ai);
    }

    #[test]
    fn test_from_label() {
        assert_eq!(Classification::from_label("ai"), Classification::Ai);
        assert_eq!(Classification::from_label("human"), Classification::Human);
        assert_eq!(Classification::from_label("AI"), Classification::Mixed);
        assert_eq!(Classification::from_label(" human "), Classification::Mixed);
        assert_eq!(Classification::from_label("mixed"), Classification::Mixed);
        assert_eq!(Classification::from_label("unsure"), Classification::Mixed);
    }

    #[test]
    fn test_remote_text_verdict_tolerates_missing_fields() {
        let parsed: RemoteTextVerdict = serde_json::from_str(r#"{"ai_probability": 72}"#).unwrap();
        assert_eq!(parsed.ai_probability, Some(72.0));
        assert!(parsed.sentences.is_empty());
        assert!(parsed.reasoning.is_none());
    }

    #[test]
    fn test_remote_verdicts_read_null_as_absent() {
        let text: RemoteTextVerdict =
            serde_json::from_str(r#"{"ai_probability": 72, "reasoning": null, "sentences": null}"#).unwrap();
        assert_eq!(text.ai_probability, Some(72.0));
        assert!(text.sentences.is_empty());

        let sentence: RemoteSentence =
            serde_json::from_str(r#"{"text": null, "classification": null, "confidence": null}"#).unwrap();
        assert_eq!(sentence.text, "");
        assert_eq!(Classification::from_label(&sentence.classification), Classification::Mixed);
        assert!(sentence.confidence.is_none());

        let image: RemoteImageVerdict =
            serde_json::from_str(r#"{"authenticity_score": 81, "attributes": null}"#).unwrap();
        assert_eq!(image.authenticity_score, Some(81.0));
        assert!(image.attributes.is_empty());
    }

    #[test]
    fn test_gateway_request_uses_camel_case() {
        let req = GatewayRequest {
            system_prompt: "sys".to_string(),
            user_prompt: "user".to_string(),
        };
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["systemPrompt"], "sys");
        assert_eq!(json["userPrompt"], "user");
    }
}
