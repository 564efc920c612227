// Aggregation Logic
// Folds per-sentence scores into a document verdict

use crate::models::{
    BreakdownPercents, Classification, ClassificationCounts, DocumentVerdict, SentenceScore,
};

use super::DetectionError;

/// Three-way label for an AI probability.
pub fn classify(ai_probability: f64) -> Classification {
    Classification::from_probability(ai_probability)
}

/// Mean AI probability as a rounded percentage, plus per-class counts.
///
/// Callers validate input length upstream; an empty slice is an error rather
/// than a 0% verdict.
pub fn aggregate(scores: &[SentenceScore]) -> Result<DocumentVerdict, DetectionError> {
    if scores.is_empty() {
        return Err(DetectionError::EmptyInput);
    }

    let total = scores.len();
    let mean_ai = scores.iter().map(|s| s.ai()).sum::<f64>() / total as f64;
    let ai_percent = (mean_ai * 100.0).round() as i32;

    let mut counts = ClassificationCounts::default();
    for score in scores {
        match classify(score.ai()) {
            Classification::Ai => counts.ai += 1,
            Classification::Human => counts.human += 1,
            Classification::Mixed => counts.mixed += 1,
        }
    }

    Ok(DocumentVerdict {
        ai_percent,
        human_percent: 100 - ai_percent,
        sentence_count: total,
        counts,
        breakdown: breakdown_percents(&counts, total),
    })
}

/// AI and human shares are rounded independently; mixed takes the remainder.
fn breakdown_percents(counts: &ClassificationCounts, total: usize) -> BreakdownPercents {
    let share = |n: usize| (n as f64 / total as f64 * 100.0).round() as i32;
    let ai = share(counts.ai);
    let human = share(counts.human);
    BreakdownPercents {
        ai,
        human,
        mixed: 100 - ai - human,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scores(values: &[f64]) -> Vec<SentenceScore> {
        values.iter().map(|&p| SentenceScore::from_ai(p)).collect()
    }

    #[test]
    fn test_aggregate_empty() {
        assert!(matches!(aggregate(&[]), Err(DetectionError::EmptyInput)));
    }

    #[test]
    fn test_aggregate_even_split() {
        let verdict = aggregate(&scores(&[0.9, 0.1])).unwrap();
        assert_eq!(verdict.ai_percent, 50);
        assert_eq!(verdict.human_percent, 50);
        assert_eq!(verdict.counts.ai, 1);
        assert_eq!(verdict.counts.human, 1);
        assert_eq!(verdict.counts.mixed, 0);
        assert_eq!(verdict.breakdown, BreakdownPercents { ai: 50, human: 50, mixed: 0 });
    }

    #[test]
    fn test_counts_sum_to_sentence_total() {
        let verdict = aggregate(&scores(&[0.7, 0.5, 0.3, 0.62, 0.4, 0.41])).unwrap();
        assert_eq!(verdict.sentence_count, 6);
        assert_eq!(verdict.counts.total(), 6);
        assert_eq!(verdict.counts, ClassificationCounts { ai: 2, human: 2, mixed: 2 });
    }

    #[test]
    fn test_mixed_percent_is_a_residual() {
        // 3/8 = 37.5 -> 38 and 5/8 = 62.5 -> 63, leaving -1 for mixed
        let verdict = aggregate(&scores(&[0.9, 0.9, 0.9, 0.1, 0.1, 0.1, 0.1, 0.1])).unwrap();
        assert_eq!(verdict.breakdown, BreakdownPercents { ai: 38, human: 63, mixed: -1 });

        // thirds: 33 + 33 leaves 34
        let verdict = aggregate(&scores(&[0.9, 0.1, 0.5])).unwrap();
        assert_eq!(verdict.breakdown, BreakdownPercents { ai: 33, human: 33, mixed: 34 });
    }

    #[test]
    fn test_with_overall_keeps_complement() {
        let verdict = aggregate(&scores(&[0.9, 0.1])).unwrap().with_overall(81);
        assert_eq!(verdict.ai_percent, 81);
        assert_eq!(verdict.human_percent, 19);
        assert_eq!(verdict.counts.total(), 2);
    }
}
