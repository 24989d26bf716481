//! Query analysis: structural features that bias channel weighting
//!
//! Pure heuristics over the raw string; false positives only skew weights,
//! they never block retrieval.

use serde::{Deserialize, Serialize};

/// Tokens that suggest the query is code-shaped
const CODE_MARKERS: &[&str] = &["def ", "fn ", "()", "::", "->", "=>", "):"];

/// Question-word prefixes (matched against the first token, lowercased)
const QUESTION_WORDS: &[&str] = &["who", "what", "when", "where", "why", "how", "which"];

/// Structural features of a query; derived, read-only, recomputed per query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryAnalysis {
    /// Whitespace-tokenized word count
    pub word_count: usize,
    /// word_count <= 3
    pub is_short: bool,
    /// word_count > 10
    pub is_long: bool,
    /// Contains code-like markers
    pub is_technical: bool,
    /// Starts with a question word
    pub is_question: bool,
}

/// Analyze a raw query string. Infallible: the empty string yields
/// word_count = 0 and is_short = true.
pub fn analyze(text: &str) -> QueryAnalysis {
    let word_count = text.split_whitespace().count();

    QueryAnalysis {
        word_count,
        is_short: word_count <= 3,
        is_long: word_count > 10,
        is_technical: has_code_markers(text),
        is_question: starts_with_question_word(text),
    }
}

fn has_code_markers(text: &str) -> bool {
    if CODE_MARKERS.iter().any(|marker| text.contains(marker)) {
        return true;
    }

    // Call-shaped fragments like `foo(bar)`
    if text.contains('(') && text.contains(')') {
        return true;
    }

    // Indentation-style lines in multi-line queries
    text.lines()
        .any(|line| line.starts_with("    ") || line.starts_with('\t'))
}

fn starts_with_question_word(text: &str) -> bool {
    match text.split_whitespace().next() {
        Some(first) => {
            let first = first.to_lowercase();
            QUESTION_WORDS.iter().any(|word| first.starts_with(word))
        }
        None => false,
    }
}
