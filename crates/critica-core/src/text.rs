//! Shared text helpers: boundary-safe term matching, sentence splitting and
//! context snippets.

use once_cell::sync::Lazy;
use regex::Regex;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

static SENTENCE_SPLIT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[.!?]+(?:\s+|$)").expect("valid sentence regex"));

/// Build a case-insensitive whole-word matcher for a set of terms.
///
/// `\b` is Unicode-aware, so `todos` never matches inside `métodos`.
/// Longer alternatives come first so `todos` wins over `todo`, and spaces in
/// multi-word phrases match any run of whitespace.
pub fn term_regex<S: AsRef<str>>(terms: &[S]) -> Regex {
    let mut escaped: Vec<String> = terms
        .iter()
        .map(|t| t.as_ref().trim())
        .filter(|t| !t.is_empty())
        .map(|t| regex::escape(t).replace(' ', r"\s+"))
        .collect();
    escaped.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
    escaped.dedup();

    if escaped.is_empty() {
        // Matches nothing.
        return Regex::new(r"\b\B").expect("valid empty regex");
    }

    let pattern = format!(r"(?i)\b(?:{})\b", escaped.join("|"));
    Regex::new(&pattern).expect("escaped terms always form a valid regex")
}

/// Count whitespace-separated words.
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Split text into trimmed, non-empty sentences.
pub fn split_sentences(text: &str) -> Vec<String> {
    SENTENCE_SPLIT_RE
        .split(text)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Lowercase and strip diacritics (`Reflexión` -> `reflexion`).
pub fn fold(text: &str) -> String {
    text.nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect::<String>()
        .to_lowercase()
}

/// Snippet of `radius` bytes on either side of a match, snapped to char
/// boundaries, newlines flattened.
pub fn context_around(text: &str, start: usize, end: usize, radius: usize) -> String {
    let ctx_start = snap_to_char_boundary(text, start.saturating_sub(radius), false);
    let ctx_end = snap_to_char_boundary(text, end.saturating_add(radius), true);

    let snippet = text[ctx_start..ctx_end].replace('\n', " ");
    let prefix = if ctx_start > 0 { "..." } else { "" };
    let suffix = if ctx_end < text.len() { "..." } else { "" };
    format!("{prefix}{}{suffix}", snippet.trim())
}

/// Snap a byte offset to a valid char boundary.
/// If `forward` is true, snap forward; otherwise snap backward.
fn snap_to_char_boundary(text: &str, pos: usize, forward: bool) -> usize {
    if pos >= text.len() {
        return text.len();
    }
    let mut p = pos;
    if forward {
        while p < text.len() && !text.is_char_boundary(p) {
            p += 1;
        }
    } else {
        while p > 0 && !text.is_char_boundary(p) {
            p -= 1;
        }
    }
    p
}

/// Truncate to at most `max_chars` characters.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn term_regex_respects_word_boundaries() {
        let re = term_regex(&["todos", "cada"]);
        assert!(re.is_match("Todos los alumnos"));
        assert!(!re.is_match("los métodos funcionan"));
        assert!(!re.is_match("cadaver"));
        assert!(re.is_match("en CADA caso"));
    }

    #[test]
    fn term_regex_prefers_longest_alternative() {
        let re = term_regex(&["todo", "todos"]);
        let m = re.find("todos juntos").unwrap();
        assert_eq!(m.as_str(), "todos");
    }

    #[test]
    fn term_regex_phrases_span_whitespace() {
        let re = term_regex(&["sin duda"]);
        assert!(re.is_match("es, sin  duda, lo mejor"));
    }

    #[test]
    fn empty_term_list_matches_nothing() {
        let re = term_regex::<&str>(&[]);
        assert!(!re.is_match("anything at all"));
    }

    #[test]
    fn sentences_split_on_terminal_punctuation() {
        let s = split_sentences("Uno. ¿Dos? ¡Tres! El 3.5% sigue.");
        assert_eq!(s, vec!["Uno", "¿Dos", "¡Tres", "El 3.5% sigue"]);
    }

    #[test]
    fn fold_strips_accents() {
        assert_eq!(fold("Preguntas de Reflexión"), "preguntas de reflexion");
        assert_eq!(fold("GLOSARIO"), "glosario");
    }

    #[test]
    fn context_is_char_safe() {
        let text = "áéíóú todos áéíóú";
        let m = term_regex(&["todos"]).find(text).unwrap();
        let ctx = context_around(text, m.start(), m.end(), 3);
        assert!(ctx.contains("todos"));
    }

    #[test]
    fn truncate_counts_chars() {
        assert_eq!(truncate_chars("añoño", 3), "año");
        assert_eq!(truncate_chars("ab", 10), "ab");
    }
}
