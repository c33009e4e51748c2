//! Tokenisation and set similarity shared by graph building and ranking.

use regex::Regex;
use std::collections::BTreeSet;
use std::sync::LazyLock;

pub type TokenSet = BTreeSet<String>;

// English plus the common Italian articles and prepositions.
const STOPWORDS: &[&str] = &[
    "and", "or", "the", "a", "an", "for", "of", "in", "on", "to", "with", "by", "from", "at", "is",
    "are", "be", "di", "la", "il", "lo", "le", "i", "gli", "un", "una", "uno", "degli", "delle",
    "dei", "del", "della", "dell",
];

static WORD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[a-zA-ZÀ-ÖØ-öø-ÿ0-9]+").expect("word pattern is valid"));

fn naive_stem(word: &str) -> &str {
    if word.len() > 3 && word.ends_with('s') {
        &word[..word.len() - 1]
    } else {
        word
    }
}

pub fn tokenize(text: &str) -> TokenSet {
    let lowered = text.to_lowercase();
    WORD_RE
        .find_iter(&lowered)
        .map(|m| m.as_str())
        .filter(|w| w.chars().count() >= 2 && !STOPWORDS.contains(w))
        .map(|w| naive_stem(w).to_string())
        .collect()
}

/// Tokens describing a course: name, description and explicit keywords.
pub fn course_tokens(name: &str, description: &str, keywords: &[String]) -> TokenSet {
    let mut tokens = tokenize(&format!("{} {}", name, description));
    for keyword in keywords {
        tokens.extend(tokenize(keyword));
    }
    tokens
}

/// Jaccard similarity in [0, 1]; zero when either side is empty.
pub fn jaccard(a: &TokenSet, b: &TokenSet) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let inter = a.intersection(b).count();
    if inter == 0 {
        return 0.0;
    }
    let union = a.len() + b.len() - inter;
    inter as f64 / union as f64
}

pub fn shared_tokens(a: &TokenSet, b: &TokenSet) -> Vec<String> {
    a.intersection(b).cloned().collect()
}

/// Case- and whitespace-insensitive comparison key.
pub fn normalize_label(raw: &str) -> String {
    raw.trim().to_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_drops_stopwords_and_stems() {
        let tokens = tokenize("Introduction to the Algorithms and Data Structures");
        assert!(tokens.contains("algorithm"));
        assert!(tokens.contains("structure"));
        assert!(tokens.contains("data"));
        assert!(!tokens.contains("the"));
        assert!(!tokens.contains("to"));
    }

    #[test]
    fn test_tokenize_keeps_accented_words() {
        let tokens = tokenize("Sicurezza delle reti e università");
        assert!(tokens.contains("sicurezza"));
        assert!(tokens.contains("università"));
        assert!(!tokens.contains("delle"));
    }

    #[test]
    fn test_short_words_are_not_stemmed() {
        let tokens = tokenize("gas bus x");
        assert!(tokens.contains("gas"));
        assert!(tokens.contains("bus"));
        assert!(!tokens.contains("x"));
    }

    #[test]
    fn test_jaccard() {
        let a = tokenize("machine learning systems");
        let b = tokenize("learning systems design");
        assert!((jaccard(&a, &b) - 0.5).abs() < 1e-12);
        assert_eq!(jaccard(&a, &TokenSet::new()), 0.0);
        assert_eq!(shared_tokens(&a, &b), vec!["learning", "system"]);
    }
}
