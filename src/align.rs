//! Locating a token's romanization inside an independently written
//! transliteration line.
//!
//! Transliterations are authored by hand, so a word glossed as `hontou ni`
//! may appear as `hontouni` or `hontou-ni` in the line. A [`FlexPattern`]
//! turns each whitespace run of the romanization into a gap that matches
//! zero or more whitespace or `-` characters in the line, comparing letters
//! case-insensitively. A [`LineAligner`] walks one line's annotations in
//! order and never matches behind the end of the previous match.
//!
//! Alignment is first-match and forward-only: when a romanization also
//! occurs inside an unrelated earlier word, that earlier spot wins.

use crate::annotation::non_sentinel;
use crate::highlight::{Span, chars_match, floor_char_boundary};
use std::collections::HashSet;
use tracing::trace;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlexPattern {
    pieces: Vec<Vec<char>>,
}

impl FlexPattern {
    /// Returns `None` when the romanization has no non-whitespace content.
    pub fn new(romanization: &str) -> Option<Self> {
        let pieces: Vec<Vec<char>> = romanization
            .split_whitespace()
            .map(|piece| piece.chars().collect())
            .collect();
        if pieces.is_empty() {
            None
        } else {
            Some(Self { pieces })
        }
    }

    /// First match starting at or after byte offset `from`.
    pub fn find(&self, text: &str, from: usize) -> Option<Span> {
        let from = floor_char_boundary(text, from);
        // A piece's outcome at a position never depends on how it was
        // reached, so recorded dead ends are shared across start offsets.
        let mut dead_ends = HashSet::new();
        text[from..].char_indices().find_map(|(offset, _)| {
            let start = from + offset;
            self.match_piece(text, start, 0, &mut dead_ends)
                .map(|end| Span::new(start, end - start))
        })
    }

    fn match_piece(
        &self,
        text: &str,
        pos: usize,
        piece: usize,
        dead_ends: &mut HashSet<(usize, usize)>,
    ) -> Option<usize> {
        if dead_ends.contains(&(piece, pos)) {
            return None;
        }
        let matched = self.match_piece_uncached(text, pos, piece, dead_ends);
        if matched.is_none() {
            dead_ends.insert((piece, pos));
        }
        matched
    }

    fn match_piece_uncached(
        &self,
        text: &str,
        pos: usize,
        piece: usize,
        dead_ends: &mut HashSet<(usize, usize)>,
    ) -> Option<usize> {
        let mut cursor = pos;
        for &expected in &self.pieces[piece] {
            let actual = text[cursor..].chars().next()?;
            if !chars_match(actual, expected, true) {
                return None;
            }
            cursor += actual.len_utf8();
        }
        if piece + 1 == self.pieces.len() {
            return Some(cursor);
        }

        let mut gap_ends = vec![cursor];
        for ch in text[cursor..].chars() {
            if !is_gap(ch) {
                break;
            }
            cursor += ch.len_utf8();
            gap_ends.push(cursor);
        }
        // Longest gap first, like a greedy `[\s-]*`.
        gap_ends
            .into_iter()
            .rev()
            .find_map(|end| self.match_piece(text, end, piece + 1, dead_ends))
    }
}

fn is_gap(ch: char) -> bool {
    ch.is_whitespace() || ch == '-'
}

/// Forward-only alignment cursor over one transliteration line.
#[derive(Debug, Clone)]
pub struct LineAligner<'a> {
    line: &'a str,
    cursor: usize,
}

impl<'a> LineAligner<'a> {
    pub fn new(line: &'a str) -> Self {
        Self { line, cursor: 0 }
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Aligns the next romanization. On success the cursor moves to the end
    /// of the match; on failure it stays put.
    pub fn align(&mut self, romanization: &str) -> Option<Span> {
        let pattern = non_sentinel(romanization).and_then(FlexPattern::new)?;
        match pattern.find(self.line, self.cursor) {
            Some(span) => {
                self.cursor = span.end();
                Some(span)
            }
            None => {
                trace!(
                    romanization,
                    cursor = self.cursor,
                    line = self.line,
                    "romanization not found in transliteration"
                );
                None
            }
        }
    }
}

/// Aligns `romanization` in `line` starting from `cursor`.
pub fn align_token(line: &str, romanization: &str, cursor: usize) -> Option<Span> {
    let mut aligner = LineAligner {
        line,
        cursor: floor_char_boundary(line, cursor),
    };
    aligner.align(romanization)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_token_and_advances_cursor() {
        let line = "hontou ni suki";
        let mut aligner = LineAligner::new(line);
        assert_eq!(aligner.align("suki"), Some(Span::new(10, 4)));
        assert_eq!(aligner.cursor(), 14);
        assert_eq!(aligner.align("suki"), None);
        assert_eq!(aligner.cursor(), 14);
    }

    #[test]
    fn search_starts_at_cursor() {
        assert_eq!(align_token("hontou ni suki", "suki", 0), Some(Span::new(10, 4)));
        assert_eq!(align_token("hontou ni suki", "suki", 15), None);
        assert_eq!(align_token("suki suki", "suki", 1), Some(Span::new(5, 4)));
    }

    #[test]
    fn whitespace_in_romanization_is_a_flexible_gap() {
        assert_eq!(align_token("hontouni suki", "hontou ni", 0), Some(Span::new(0, 8)));
        assert_eq!(align_token("hontou-ni suki", "hontou ni", 0), Some(Span::new(0, 9)));
        assert_eq!(align_token("hontou - ni", "hontou ni", 0), Some(Span::new(0, 11)));
        // The gap only exists where the romanization has whitespace.
        assert_eq!(align_token("hon tou", "hontou", 0), None);
    }

    #[test]
    fn matching_ignores_case() {
        assert_eq!(align_token("Suki Da", "suki da", 0), Some(Span::new(0, 7)));
        assert_eq!(align_token("ÀI NI", "ài", 0), Some(Span::new(0, 3)));
    }

    #[test]
    fn gap_backtracks_for_hyphen_led_piece() {
        assert_eq!(align_token("onii--chan", "onii -chan", 0), Some(Span::new(0, 10)));
    }

    #[test]
    fn long_hyphen_runs_do_not_blow_up_backtracking() {
        let romanization = format!("{} x", vec!["-"; 13].join(" "));
        let hyphens = "-".repeat(60);
        assert_eq!(align_token(&hyphens, &romanization, 0), None);

        let line = format!("{hyphens}x");
        assert_eq!(align_token(&line, &romanization, 0), Some(Span::new(0, 61)));
    }

    #[test]
    fn consecutive_tokens_consume_in_order() {
        let line = "kimi no kimi";
        let mut aligner = LineAligner::new(line);
        assert_eq!(aligner.align("kimi"), Some(Span::new(0, 4)));
        assert_eq!(aligner.align("no"), Some(Span::new(5, 2)));
        assert_eq!(aligner.align("kimi"), Some(Span::new(8, 4)));
    }

    #[test]
    fn sentinel_and_blank_romanizations_never_align() {
        let mut aligner = LineAligner::new("- suki -");
        assert_eq!(aligner.align("-"), None);
        assert_eq!(aligner.align("   "), None);
        assert_eq!(aligner.align(""), None);
        assert_eq!(aligner.cursor(), 0);
    }

    #[test]
    fn takes_first_forward_match_even_inside_other_words() {
        // Known limit: "ai" inside "kaidan" wins over the later "ai".
        assert_eq!(align_token("kaidan ai", "ai", 0), Some(Span::new(1, 2)));
    }

    #[test]
    fn spans_stay_within_line() {
        let line = "sora wo miagete";
        for token in ["sora", "wo", "mi agete", "te", "x"] {
            let mut cursor = 0;
            while let Some(span) = align_token(line, token, cursor) {
                assert!(span.end() <= line.len());
                cursor = span.end();
            }
        }
    }
}
