use serde::{Deserialize, Serialize};

use crate::normalizer::{fold_indexed, split_tokens};

/// Terms shorter than this (after trimming) are never searched.
pub const MIN_TERM_CHARS: usize = 2;

/// Upper bound on the length of a returned quote, in chars.
pub const MAX_QUOTE_CHARS: usize = 600;

/// Context kept around a match before line snapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuoteWindow {
    /// Chars kept before the match start.
    pub before: usize,
    /// Chars kept after the match end.
    pub after: usize,
}

impl QuoteWindow {
    /// First window tried around every match.
    pub const PRIMARY: Self = Self {
        before: 240,
        after: 260,
    };

    /// Retry window when the primary quote exceeds [`MAX_QUOTE_CHARS`].
    pub const TIGHT: Self = Self {
        before: 180,
        after: 220,
    };
}

/// How an anchor was found.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "token")]
pub enum MatchKind {
    /// The whole term occurs in the text.
    WholeTerm,
    /// Only this token of the term occurs in the text.
    Token(String),
}

/// Verbatim quote evidencing a term.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Anchor {
    /// Trimmed, length-capped quote drawn from the text.
    pub quote: String,
    /// Char offset of the snapped window start.
    pub start: usize,
    /// Char offset (exclusive) of the snapped window end.
    pub end: usize,
    /// Whole-term or token match.
    pub matched: MatchKind,
}

/// Document text prepared for repeated searches within one request.
///
/// The case-folded copy is built once, so attributing a whole outline costs a
/// single fold of the document plus one scan per searched term. Full
/// lowercasing may change the length, so `origin` maps every folded char back
/// to the char offset it came from.
#[derive(Debug, Clone)]
pub struct SourceIndex<'a> {
    text: &'a str,
    chars: Vec<char>,
    folded: Vec<char>,
    origin: Vec<usize>,
}

impl<'a> SourceIndex<'a> {
    /// Indexes `text`.
    #[must_use]
    pub fn new(text: &'a str) -> Self {
        let chars: Vec<char> = text.chars().collect();
        let (origin, folded) = fold_indexed(text).unzip();
        Self {
            text,
            chars,
            folded,
            origin,
        }
    }

    /// The indexed text.
    #[must_use]
    pub const fn text(&self) -> &'a str {
        self.text
    }

    /// Length of the text in chars.
    #[must_use]
    pub fn char_len(&self) -> usize {
        self.chars.len()
    }

    /// Finds the best quote for `term`: the whole term first, then each of its
    /// tokens in order. First match wins.
    #[must_use]
    pub fn locate(&self, term: &str) -> Option<Anchor> {
        let term = term.trim();
        if term.chars().count() < MIN_TERM_CHARS {
            return None;
        }
        if let Some(anchor) = self.locate_exact(term, MatchKind::WholeTerm) {
            return Some(anchor);
        }
        split_tokens(term)
            .into_iter()
            .filter(|token| *token != term)
            .find_map(|token| self.locate_exact(token, MatchKind::Token(token.to_owned())))
    }

    fn locate_exact(&self, needle: &str, matched: MatchKind) -> Option<Anchor> {
        let needle: Vec<char> = fold_indexed(needle).map(|(_, c)| c).collect();
        let folded_start = self.find(&needle)?;
        let match_start = self.origin[folded_start];
        let match_end = self.origin[folded_start + needle.len() - 1] + 1;

        let (mut start, mut end, mut quote) =
            self.excerpt(match_start, match_end, QuoteWindow::PRIMARY);
        if quote.chars().count() > MAX_QUOTE_CHARS {
            (start, end, quote) = self.excerpt(match_start, match_end, QuoteWindow::TIGHT);
            if quote.chars().count() > MAX_QUOTE_CHARS {
                let capped: String = quote.chars().take(MAX_QUOTE_CHARS).collect();
                quote = capped.trim_end().to_owned();
            }
        }
        if quote.is_empty() {
            return None;
        }
        Some(Anchor {
            quote,
            start,
            end,
            matched,
        })
    }

    fn find(&self, needle: &[char]) -> Option<usize> {
        if needle.is_empty() {
            return None;
        }
        self.folded
            .windows(needle.len())
            .position(|candidate| candidate == needle)
    }

    /// Window bounds snapped to line boundaries, plus the trimmed quote.
    fn excerpt(
        &self,
        match_start: usize,
        match_end: usize,
        window: QuoteWindow,
    ) -> (usize, usize, String) {
        let mut start = match_start.saturating_sub(window.before);
        let mut end = (match_end + window.after).min(self.chars.len());

        if let Some(newline) = self.chars[start..match_start]
            .iter()
            .rposition(|c| *c == '\n')
        {
            start += newline + 1;
        }
        if let Some(newline) = self.chars[match_end..end].iter().position(|c| *c == '\n') {
            end = match_end + newline;
        }

        let slice: String = self.chars[start..end].iter().collect();
        (start, end, slice.trim().to_owned())
    }
}

/// One-shot search of `term` in `full_text`. Prefer [`SourceIndex`] when the
/// same text is searched repeatedly.
#[must_use]
pub fn locate(full_text: &str, term: &str) -> Option<Anchor> {
    SourceIndex::new(full_text).locate(term)
}
