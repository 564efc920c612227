// Verdict labels and breakdown rows handed to whatever renders the result

use crate::models::{Classification, ScoredSentence, SentenceBreakdown};
use crate::services::text_processor::preview;

const TEXT_AI_LABEL_MIN: i32 = 65;
const TEXT_PARTIAL_LABEL_MIN: i32 = 40;
const IMAGE_HIGH_MIN: i32 = 75;
const IMAGE_MEDIUM_MIN: i32 = 45;

pub fn text_verdict_label(ai_percent: i32) -> &'static str {
    if ai_percent >= TEXT_AI_LABEL_MIN {
        "Likely AI Generated"
    } else if ai_percent >= TEXT_PARTIAL_LABEL_MIN {
        "Partially AI Generated"
    } else {
        "Likely Human Written"
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum AuthenticityBand {
    High,
    Medium,
    Low,
}

impl AuthenticityBand {
    pub fn from_score(score: i32) -> Self {
        if score >= IMAGE_HIGH_MIN {
            Self::High
        } else if score >= IMAGE_MEDIUM_MIN {
            Self::Medium
        } else {
            Self::Low
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::High => "High Authenticity",
            Self::Medium => "Medium Authenticity",
            Self::Low => "Low Authenticity",
        }
    }

    pub fn default_description(&self) -> &'static str {
        match self {
            Self::High => "This image exhibits strong markers of authenticity. No significant AI-generation signatures detected.",
            Self::Medium => "Some indicators of possible manipulation detected. Manual review recommended.",
            Self::Low => "Strong AI-generation or manipulation signatures found. This image may not be authentic.",
        }
    }
}

/// Confidence shown next to a sentence: the winning side's probability, or for
/// mixed sentences how close the score sits to an even split.
pub fn sentence_confidence(sentence: &ScoredSentence) -> i32 {
    let ai = sentence.score.ai();
    let pct = match sentence.score.classification() {
        Classification::Ai => ai,
        Classification::Human => sentence.score.human(),
        Classification::Mixed => 1.0 - (ai - 0.5).abs() * 2.0,
    };
    (pct * 100.0).round() as i32
}

pub fn breakdown_rows(sentences: &[ScoredSentence]) -> Vec<SentenceBreakdown> {
    sentences
        .iter()
        .enumerate()
        .map(|(i, s)| {
            let classification = s.score.classification();
            SentenceBreakdown {
                index: i + 1,
                preview: preview(&s.text),
                classification,
                label: classification.display_label().to_string(),
                ai_percent: (s.score.ai() * 100.0).round() as i32,
                confidence: sentence_confidence(s),
            }
        })
        .collect()
}
