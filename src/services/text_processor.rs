// Text Processing Service
// Sentence tokenizing, word counts and prompt shaping

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// Fragments at or below this many characters are not sentences.
const MIN_SENTENCE_CHARS: usize = 3;
const PREVIEW_MAX_CHARS: usize = 60;
const PREVIEW_CUT_CHARS: usize = 57;

fn sentence_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"[^.!?]+[.!?]+["']?|[^.!?]+$"#).expect("sentence regex")
    })
}

/// Split text into sentences on `.`, `!` and `?` runs (optionally followed by a
/// closing quote). A trailing remainder without terminal punctuation becomes
/// the last sentence. Trimmed fragments of three characters or fewer are dropped.
pub fn tokenize(text: &str) -> Vec<String> {
    sentence_re()
        .find_iter(text)
        .map(|m| m.as_str().trim())
        .filter(|s| s.chars().count() > MIN_SENTENCE_CHARS)
        .map(|s| s.to_string())
        .collect()
}

/// Whitespace-delimited word count.
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputStats {
    pub words: usize,
    pub sentences: usize,
}

impl InputStats {
    pub fn of(text: &str) -> Self {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Self::default();
        }
        Self {
            words: word_count(trimmed),
            sentences: tokenize(trimmed).len(),
        }
    }

    /// e.g. `"12 words · 1 sentence"`
    pub fn summary(&self) -> String {
        format!(
            "{} word{} · {} sentence{}",
            self.words,
            if self.words != 1 { "s" } else { "" },
            self.sentences,
            if self.sentences != 1 { "s" } else { "" }
        )
    }
}

/// Cap text at `max_chars` characters, marking the cut with `...`.
pub fn truncate_for_prompt(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max_chars).collect();
    out.push_str("...");
    out
}

/// Short form of a sentence for tables.
pub fn preview(text: &str) -> String {
    if text.chars().count() <= PREVIEW_MAX_CHARS {
        return text.to_string();
    }
    let mut out: String = text.chars().take(PREVIEW_CUT_CHARS).collect();
    out.push('…');
    out
}
