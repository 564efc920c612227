// Signal Pattern Tables
// Fixed phrase tables for the local heuristic. Each pattern counts at most once
// per sentence, no matter how often it occurs.

use regex::Regex;
use std::sync::OnceLock;

/// Formal, hedging and transition-heavy phrasing.
const AI_PATTERNS: &[&str] = &[
    r"(?i)\bit is (important|essential|crucial|worth noting|noteworthy)\b",
    r"(?i)\bfurthermore\b",
    r"(?i)\bin conclusion\b",
    r"(?i)\bin summary\b",
    r"(?i)\bcomprehensive (understanding|approach|framework|analysis)\b",
    r"(?i)\bstakeholders\b",
    r"(?i)\bfundamentally\b",
    r"(?i)\bunprecedented\b",
    r"(?i)\bencompass(ing)?\b",
    r"(?i)\bimplications\b",
    r"(?i)\blandscape\b",
    r"(?i)\bleverage\b",
    r"(?i)\bmitigate\b",
    r"(?i)\bproactive(ly)?\b",
    r"(?i)\bsynerg",
    r"(?i)\bhave yielded\b",
    r"(?i)\bmust be carefully\b",
    r"(?i)\boptimal(ly)?\b",
    r"(?i)\brobust\b",
    r"(?i)\bdelve\b",
    r"(?i)\btailored\b",
    r"(?i)\bseamless(ly)?\b",
    r"(?i)\bin today's (world|society|landscape)\b",
    r"(?i)\bit is (clear|evident|apparent) that\b",
    r"(?i)\bplays? a (crucial|vital|key|important) role\b",
];

/// Contractions, first-person verbs, fillers and chat shorthand.
/// `'t\b` is the only case-sensitive entry.
const HUMAN_PATTERNS: &[&str] = &[
    r"(?i)\bI (remember|think|feel|can't|don't|was|tried|ll|mean|guess)\b",
    r"(?i)\bhonestly\b",
    r"(?i)\bkind of\b",
    r"(?i)right\?",
    r"(?i)\bweird\b",
    r"(?i)\bmaybe\b",
    r"(?i)\bactually\b",
    r"(?i)like,",
    r"(?i)\bgonna\b",
    r"(?i)\bbasically\b",
    r"'t\b",
    r"(?i)\bI'll\b",
    r"(?i)\bwe've\b",
    r"(?i)\bdoesn't\b",
    r"(?i)\bcan't\b",
    r"(?i)\bI'm\b",
    r"(?i)\bI'd\b",
    r"(?i)\btbh\b",
    r"(?i)\bngl\b",
    r"(?i)\bsorta\b",
    r"(?i)\bkinda\b",
    r"(?i)\byou know\b",
    r"(?i)\bI mean\b",
];

fn compile(patterns: &[&str]) -> Vec<Regex> {
    patterns
        .iter()
        .map(|p| Regex::new(p).expect("signal pattern"))
        .collect()
}

pub fn ai_patterns() -> &'static [Regex] {
    static TABLE: OnceLock<Vec<Regex>> = OnceLock::new();
    TABLE.get_or_init(|| compile(AI_PATTERNS))
}

pub fn human_patterns() -> &'static [Regex] {
    static TABLE: OnceLock<Vec<Regex>> = OnceLock::new();
    TABLE.get_or_init(|| compile(HUMAN_PATTERNS))
}

/// Number of patterns in `table` that match anywhere in `text`.
pub fn count_matches(table: &[Regex], text: &str) -> usize {
    table.iter().filter(|re| re.is_match(text)).count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tables_compile() {
        assert_eq!(ai_patterns().len(), 25);
        assert_eq!(human_patterns().len(), 23);
    }

    #[test]
    fn test_one_count_per_pattern() {
        let text = "Furthermore, furthermore, FURTHERMORE.";
        assert_eq!(count_matches(ai_patterns(), text), 1);
    }

    #[test]
    fn test_ai_markers() {
        let text = "It is crucial to leverage a robust, seamless framework.";
        // it is crucial, leverage, robust, seamless
        assert_eq!(count_matches(ai_patterns(), text), 4);
        assert_eq!(count_matches(ai_patterns(), "Trade plays a vital role here."), 1);
        assert_eq!(count_matches(ai_patterns(), "Synergies abound."), 1);
    }

    #[test]
    fn test_human_markers() {
        let text = "I'm gonna be honest, tbh I mean it.";
        // "I mean" hits both the first-person verb table entry and its own entry
        // I'm, gonna, tbh, I <verb>, I mean
        assert_eq!(count_matches(human_patterns(), text), 5);
    }

    #[test]
    fn test_contraction_pattern_is_case_sensitive() {
        assert_eq!(count_matches(human_patterns(), "WON'T"), 0);
        assert!(count_matches(human_patterns(), "won't") >= 1);
    }

    #[test]
    fn test_plain_text_has_no_hits() {
        let text = "The committee met on Tuesday.";
        assert_eq!(count_matches(ai_patterns(), text), 0);
        assert_eq!(count_matches(human_patterns(), text), 0);
    }
}
