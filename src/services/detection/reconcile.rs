// Remote Verdict Reconciliation
// Maps the gateway's per-sentence labels back onto SentenceScore so the same
// aggregation runs for both paths.

use crate::models::{Classification, RemoteSentence, ScoredSentence, SentenceScore};

/// `confidence` is a 0-100 figure; it is clamped so the score stays in `[0, 1]`.
/// A missing confidence carries no information and maps to an even split.
pub fn score_from_remote(classification: &str, confidence: Option<f64>) -> SentenceScore {
    let Some(confidence) = confidence.filter(|c| c.is_finite()) else {
        return SentenceScore::from_ai(0.5);
    };
    let c = confidence.clamp(0.0, 100.0) / 100.0;
    match Classification::from_label(classification) {
        Classification::Ai => SentenceScore::from_ai(c),
        Classification::Human => SentenceScore::from_ai(1.0 - c),
        Classification::Mixed => SentenceScore::from_ai(0.5),
    }
}

pub fn reconcile_sentences(sentences: &[RemoteSentence]) -> Vec<ScoredSentence> {
    sentences
        .iter()
        .map(|s| ScoredSentence {
            text: s.text.clone(),
            score: score_from_remote(&s.classification, s.confidence),
        })
        .collect()
}
