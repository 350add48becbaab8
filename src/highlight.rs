use serde::{Deserialize, Serialize};

/// Byte range inside a UTF-8 line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub len: usize,
}

impl Span {
    pub const fn new(start: usize, len: usize) -> Self {
        Self { start, len }
    }

    pub const fn end(&self) -> usize {
        self.start + self.len
    }

    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }
}

/// A run of text that is either plain or the single highlighted region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Segment<'a> {
    pub text: &'a str,
    pub marked: bool,
}

impl<'a> Segment<'a> {
    pub const fn plain(text: &'a str) -> Self {
        Self {
            text,
            marked: false,
        }
    }

    pub const fn marked(text: &'a str) -> Self {
        Self { text, marked: true }
    }
}

/// Match rules for occurrence highlighting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HighlightOptions {
    pub case_insensitive: bool,
    /// Reject matches preceded or followed by a word character
    /// (alphanumeric or `_`).
    pub whole_word: bool,
}

impl HighlightOptions {
    pub const fn exact() -> Self {
        Self {
            case_insensitive: false,
            whole_word: false,
        }
    }

    pub const fn words_ignoring_case() -> Self {
        Self {
            case_insensitive: true,
            whole_word: true,
        }
    }
}

/// Marks the `rank`-th (1-based) non-overlapping match of `token`.
///
/// Returns the text unmarked when the token is empty, `rank` is zero, or the
/// text has fewer than `rank` matches.
pub fn highlight_by_occurrence<'a>(
    text: &'a str,
    token: &str,
    rank: usize,
    options: HighlightOptions,
) -> Vec<Segment<'a>> {
    split_at(text, find_occurrence(text, token, rank, options))
}

/// Marks `span`, clamped to the text and widened to char boundaries.
pub fn highlight_by_span(text: &str, span: Option<Span>) -> Vec<Segment<'_>> {
    let clamped = span.map(|span| {
        let start = floor_char_boundary(text, span.start);
        let end = ceil_char_boundary(text, span.start.saturating_add(span.len));
        Span::new(start, end.saturating_sub(start))
    });
    split_at(text, clamped)
}

/// Location of the `rank`-th match of `token`, if there is one.
pub fn find_occurrence(
    text: &str,
    token: &str,
    rank: usize,
    options: HighlightOptions,
) -> Option<Span> {
    if token.is_empty() || rank == 0 {
        return None;
    }
    let mut seen = 0;
    let mut pos = 0;
    while pos < text.len() {
        if let Some(end) = match_at(text, pos, token, options) {
            seen += 1;
            if seen == rank {
                return Some(Span::new(pos, end - pos));
            }
            pos = end;
            continue;
        }
        pos += text[pos..].chars().next().map_or(1, char::len_utf8);
    }
    None
}

/// Number of non-overlapping matches of `token` under `options`.
pub fn count_occurrences(text: &str, token: &str, options: HighlightOptions) -> usize {
    let mut rank = 1;
    while find_occurrence(text, token, rank, options).is_some() {
        rank += 1;
    }
    rank - 1
}

fn match_at(text: &str, pos: usize, token: &str, options: HighlightOptions) -> Option<usize> {
    let mut haystack = text[pos..].chars();
    let mut end = pos;
    for expected in token.chars() {
        let actual = haystack.next()?;
        if !chars_match(actual, expected, options.case_insensitive) {
            return None;
        }
        end += actual.len_utf8();
    }
    if options.whole_word {
        let before = text[..pos].chars().next_back();
        let after = text[end..].chars().next();
        if before.is_some_and(is_word_char) || after.is_some_and(is_word_char) {
            return None;
        }
    }
    Some(end)
}

fn split_at(text: &str, span: Option<Span>) -> Vec<Segment<'_>> {
    let Some(span) = span.filter(|span| !span.is_empty() && span.end() <= text.len()) else {
        return plain_only(text);
    };
    let (before, rest) = text.split_at(span.start);
    let (marked, after) = rest.split_at(span.len);
    [Segment::plain(before), Segment::marked(marked), Segment::plain(after)]
        .into_iter()
        .filter(|segment| !segment.text.is_empty())
        .collect()
}

fn plain_only(text: &str) -> Vec<Segment<'_>> {
    if text.is_empty() {
        Vec::new()
    } else {
        vec![Segment::plain(text)]
    }
}

fn is_word_char(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '_'
}

pub(crate) fn chars_match(actual: char, expected: char, case_insensitive: bool) -> bool {
    actual == expected
        || (case_insensitive && actual.to_lowercase().eq(expected.to_lowercase()))
}

pub(crate) fn floor_char_boundary(text: &str, index: usize) -> usize {
    let mut index = index.min(text.len());
    while !text.is_char_boundary(index) {
        index -= 1;
    }
    index
}

fn ceil_char_boundary(text: &str, index: usize) -> usize {
    let mut index = index.min(text.len());
    while !text.is_char_boundary(index) {
        index += 1;
    }
    index
}

#[cfg(test)]
mod tests {
    use super::*;

    fn joined(segments: &[Segment<'_>]) -> String {
        segments.iter().map(|segment| segment.text).collect()
    }

    fn marked<'a>(segments: &[Segment<'a>]) -> Vec<&'a str> {
        segments
            .iter()
            .filter(|segment| segment.marked)
            .map(|segment| segment.text)
            .collect()
    }

    #[test]
    fn marks_only_the_requested_occurrence() {
        let text = "好きだ、好きだよ";
        let segments = highlight_by_occurrence(text, "好き", 2, HighlightOptions::exact());
        assert_eq!(
            segments,
            vec![
                Segment::plain("好きだ、"),
                Segment::marked("好き"),
                Segment::plain("だよ"),
            ]
        );
        assert_eq!(joined(&segments), text);
    }

    #[test]
    fn missing_rank_marks_nothing() {
        let text = "suki suki";
        for rank in [0, 3] {
            let segments = highlight_by_occurrence(text, "suki", rank, HighlightOptions::exact());
            assert!(marked(&segments).is_empty());
            assert_eq!(joined(&segments), text);
        }
        let segments = highlight_by_occurrence(text, "", 1, HighlightOptions::exact());
        assert_eq!(segments, vec![Segment::plain(text)]);
    }

    #[test]
    fn matches_do_not_overlap() {
        let text = "aaaa";
        assert_eq!(count_occurrences(text, "aa", HighlightOptions::exact()), 2);
        assert_eq!(
            find_occurrence(text, "aa", 2, HighlightOptions::exact()),
            Some(Span::new(2, 2))
        );
    }

    #[test]
    fn case_folding_is_opt_in() {
        let text = "Suki da yo, suki";
        assert_eq!(count_occurrences(text, "suki", HighlightOptions::exact()), 1);
        let options = HighlightOptions {
            case_insensitive: true,
            whole_word: false,
        };
        let segments = highlight_by_occurrence(text, "suki", 1, options);
        assert_eq!(marked(&segments), vec!["Suki"]);
    }

    #[test]
    fn whole_word_skips_embedded_matches() {
        let text = "kani ni ni";
        let loose = highlight_by_occurrence(text, "ni", 1, HighlightOptions::exact());
        assert_eq!(joined(&loose[..1]), "ka");

        let strict = highlight_by_occurrence(text, "ni", 1, HighlightOptions::words_ignoring_case());
        assert_eq!(
            strict,
            vec![
                Segment::plain("kani "),
                Segment::marked("ni"),
                Segment::plain(" ni"),
            ]
        );
        assert_eq!(
            count_occurrences(text, "ni", HighlightOptions::words_ignoring_case()),
            2
        );
    }

    #[test]
    fn span_highlight_splits_three_ways() {
        let segments = highlight_by_span("hontou ni suki", Some(Span::new(10, 4)));
        assert_eq!(
            segments,
            vec![Segment::plain("hontou ni "), Segment::marked("suki")]
        );
    }

    #[test]
    fn span_highlight_clamps_and_tolerates_absence() {
        let text = "suki";
        assert_eq!(highlight_by_span(text, None), vec![Segment::plain(text)]);
        assert_eq!(
            highlight_by_span(text, Some(Span::new(2, 0))),
            vec![Segment::plain(text)]
        );
        assert_eq!(
            highlight_by_span(text, Some(Span::new(2, 99))),
            vec![Segment::plain("su"), Segment::marked("ki")]
        );
        assert_eq!(
            highlight_by_span(text, Some(Span::new(40, 2))),
            vec![Segment::plain(text)]
        );
        assert!(highlight_by_span("", Some(Span::new(0, 3))).is_empty());
    }

    #[test]
    fn span_highlight_widens_to_char_boundaries() {
        let text = "愛してる";
        let segments = highlight_by_span(text, Some(Span::new(1, 1)));
        assert_eq!(segments, vec![Segment::marked("愛"), Segment::plain("してる")]);
    }

    #[test]
    fn concatenation_always_reproduces_text() {
        let text = "kimi no kimi no KIMI";
        for rank in 0..5 {
            for options in [HighlightOptions::exact(), HighlightOptions::words_ignoring_case()] {
                let segments = highlight_by_occurrence(text, "kimi", rank, options);
                assert_eq!(joined(&segments), text);
                assert!(marked(&segments).len() <= 1);
            }
        }
    }
}
