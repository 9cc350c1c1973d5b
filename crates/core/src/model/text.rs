use unicode_normalization::UnicodeNormalization;

/// Folds a token for comparison: NFC, unified apostrophes, trimmed, lowercase.
#[must_use]
pub fn fold_token(token: &str) -> String {
    token
        .nfc()
        .map(|c| match c {
            '\u{2018}' | '\u{2019}' | '\u{02BC}' | '\u{0060}' | '\u{00B4}' | '\u{2032}' => '\'',
            other => other,
        })
        .collect::<String>()
        .trim()
        .to_lowercase()
}

/// Splits a sentence into answer tokens on whitespace.
#[must_use]
pub fn tokenize(sentence: &str) -> Vec<String> {
    sentence.split_whitespace().map(str::to_string).collect()
}

/// Content key used for de-duplication: folded tokens joined by one space.
#[must_use]
pub fn content_key(display_text: &str) -> String {
    display_text
        .split_whitespace()
        .map(fold_token)
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Exact sequence equality after folding each token.
#[must_use]
pub fn answers_match<A, B>(submitted: &[A], expected: &[B]) -> bool
where
    A: AsRef<str>,
    B: AsRef<str>,
{
    submitted.len() == expected.len()
        && submitted
            .iter()
            .zip(expected)
            .all(|(s, e)| fold_token(s.as_ref()) == fold_token(e.as_ref()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn folding_ignores_case_only() {
        assert!(answers_match(&["Maayong", "Buntag"], &["Maayong", "buntag"]));
        assert!(!answers_match(&["buntag", "Maayong"], &["Maayong", "buntag"]));
    }

    #[test]
    fn length_mismatch_never_matches() {
        assert!(!answers_match(&["Maayong"], &["Maayong", "buntag"]));
    }

    #[test]
    fn curly_apostrophes_fold_to_ascii() {
        assert_eq!(fold_token("Kumusta’ng"), "kumusta'ng");
        assert_eq!(fold_token("  OO "), "oo");
    }

    #[test]
    fn content_key_collapses_whitespace_and_case() {
        assert_eq!(content_key("Maayong   Buntag"), content_key("maayong buntag"));
        assert_eq!(tokenize("  Salamat  kaayo "), vec!["Salamat", "kaayo"]);
    }
}
