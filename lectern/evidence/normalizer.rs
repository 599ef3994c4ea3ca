use serde_json::Value;

use crate::anchor::MIN_TERM_CHARS;

/// Separators used to break a compound term into searchable tokens, in
/// addition to whitespace.
pub const TOKEN_SEPARATORS: &[char] = &[
    ',', '，', ';', '；', ':', '：', '(', ')', '（', '）', '-', '‐', '‑', '‒', '–', '—', '―', '－',
    '/',
];

/// Canonical search term for an untrusted value: the trimmed string, or an
/// empty string when the value is absent, not a string, or blank.
#[must_use]
pub fn normalize_term(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(raw)) => normalize_text(raw),
        _ => String::new(),
    }
}

/// Trimmed copy of `raw`.
#[must_use]
pub fn normalize_text(raw: &str) -> String {
    raw.trim().to_owned()
}

/// Splits `term` on whitespace and [`TOKEN_SEPARATORS`], keeping tokens of at
/// least two characters in their original order.
#[must_use]
pub fn split_tokens(term: &str) -> Vec<&str> {
    term.split(|c: char| c.is_whitespace() || TOKEN_SEPARATORS.contains(&c))
        .filter(|token| token.chars().count() >= MIN_TERM_CHARS)
        .collect()
}

/// Lowercases `text` char by char. Each folded char is paired with the index
/// of the original char it came from; a char whose lowercase form has several
/// chars yields several pairs with the same index.
pub fn fold_indexed(text: &str) -> impl Iterator<Item = (usize, char)> + '_ {
    text.chars()
        .enumerate()
        .flat_map(|(index, c)| c.to_lowercase().map(move |folded| (index, folded)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn normalize_trims_strings() {
        assert_eq!(normalize_term(Some(&json!("  register file \n"))), "register file");
    }

    #[test]
    fn normalize_rejects_non_strings() {
        assert_eq!(normalize_term(Some(&json!(42))), "");
        assert_eq!(normalize_term(Some(&json!(null))), "");
        assert_eq!(normalize_term(Some(&json!(["a"]))), "");
        assert_eq!(normalize_term(None), "");
        assert_eq!(normalize_term(Some(&json!("   "))), "");
    }

    #[test]
    fn tokens_split_on_mixed_width_punctuation() {
        let tokens = split_tokens("数据冒险（RAW）、控制冒险；pipeline-stall / a");
        assert_eq!(tokens, vec!["数据冒险", "RAW", "、控制冒险", "pipeline", "stall"]);
    }

    #[test]
    fn tokens_drop_short_fragments() {
        assert_eq!(split_tokens("a b cd"), vec!["cd"]);
        assert!(split_tokens(" , ; ").is_empty());
    }

    #[test]
    fn fold_tracks_original_offsets() {
        let folded: Vec<_> = fold_indexed("Rİ数").collect();
        assert_eq!(
            folded,
            vec![(0, 'r'), (1, 'i'), (1, '\u{307}'), (2, '数')]
        );
    }
}
