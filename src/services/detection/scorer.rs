// Heuristic Sentence Scorer
// Local fallback used when the gateway gives us nothing usable.
//
// Pattern hits plus a word-count nudge give an AI share; a small random jitter
// separates sentences with identical ratios and the result is kept off 0 and 1.

use crate::models::{ScoredSentence, SentenceScore};
use crate::services::text_processor::word_count;
use rand::Rng;
use serde::Serialize;

use super::patterns::{ai_patterns, count_matches, human_patterns};

/// Word counts in this inclusive range read as uniform, model-like sentences.
const AI_LENGTH_RANGE: (usize, usize) = (18, 32);
const AI_LENGTH_BONUS: f64 = 0.5;
/// Very short or very long sentences lean human.
const HUMAN_SHORT_BELOW: usize = 8;
const HUMAN_LONG_ABOVE: usize = 45;
const HUMAN_LENGTH_BONUS: f64 = 0.3;

/// No-signal prior: uniform in `[0.28, 0.72]`.
const PRIOR_FLOOR: f64 = 0.28;
const PRIOR_SPAN: f64 = 0.44;
/// Total width of the centered jitter, i.e. `[-0.06, 0.06]`.
const NOISE_SPAN: f64 = 0.12;
const CLAMP_MIN: f64 = 0.03;
const CLAMP_MAX: f64 = 0.97;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignalCounts {
    pub ai_pattern_hits: usize,
    pub human_pattern_hits: usize,
    pub words: usize,
    /// Pattern hits plus the length bonus.
    pub ai_hits: f64,
    pub human_hits: f64,
}

impl SignalCounts {
    pub fn total(&self) -> f64 {
        self.ai_hits + self.human_hits
    }
}

/// Hit counts for one sentence, before any randomness.
pub fn count_signals(sentence: &str) -> SignalCounts {
    let ai_pattern_hits = count_matches(ai_patterns(), sentence);
    let human_pattern_hits = count_matches(human_patterns(), sentence);
    let words = word_count(sentence);

    let mut ai_hits = ai_pattern_hits as f64;
    let mut human_hits = human_pattern_hits as f64;
    if (AI_LENGTH_RANGE.0..=AI_LENGTH_RANGE.1).contains(&words) {
        ai_hits += AI_LENGTH_BONUS;
    }
    if words < HUMAN_SHORT_BELOW || words > HUMAN_LONG_ABOVE {
        human_hits += HUMAN_LENGTH_BONUS;
    }

    SignalCounts {
        ai_pattern_hits,
        human_pattern_hits,
        words,
        ai_hits,
        human_hits,
    }
}

/// Score one sentence. Draws once from `rng` on either path.
pub fn score_sentence<R: Rng + ?Sized>(sentence: &str, rng: &mut R) -> SentenceScore {
    let signals = count_signals(sentence);
    let total = signals.total();

    if total == 0.0 {
        let p = PRIOR_FLOOR + rng.gen::<f64>() * PRIOR_SPAN;
        return SentenceScore::from_ai(p);
    }

    let raw = signals.ai_hits / total;
    let noise = (rng.gen::<f64>() - 0.5) * NOISE_SPAN;
    SentenceScore::from_ai((raw + noise).clamp(CLAMP_MIN, CLAMP_MAX))
}

pub fn score_sentences<R: Rng + ?Sized>(sentences: &[String], rng: &mut R) -> Vec<ScoredSentence> {
    sentences
        .iter()
        .map(|s| ScoredSentence {
            text: s.clone(),
            score: score_sentence(s, rng),
        })
        .collect()
}
