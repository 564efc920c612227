// Detection Module
// Local heuristic and the glue that lets remote verdicts share it:
// - patterns: fixed AI/human signal tables
// - scorer: per-sentence heuristic with injected randomness
// - aggregation: document verdict from sentence scores
// - reconcile: remote per-sentence labels -> sentence scores
// - labels: verdict labels and breakdown rows for renderers

pub mod patterns;
pub mod scorer;
pub mod aggregation;
pub mod reconcile;
pub mod labels;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DetectionError {
    #[error("no sentences to aggregate")]
    EmptyInput,
    #[error("input too short: {actual} characters, need at least {min}")]
    InputTooShort { min: usize, actual: usize },
    #[error("input has no sentences longer than three characters")]
    NoSentences,
    #[error("invalid image input: {0}")]
    InvalidImage(String),
}

pub use aggregation::{aggregate, classify};
pub use labels::{breakdown_rows, text_verdict_label, AuthenticityBand};
pub use reconcile::{reconcile_sentences, score_from_remote};
pub use scorer::{count_signals, score_sentence, score_sentences, SignalCounts};
