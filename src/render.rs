//! Display helpers for the presentation layer.
//!
//! Hint visibility is passed in on every call; nothing here keeps state.

use crate::config::EngineConfig;
use crate::data::{Glossary, LyricsLine};
use crate::highlight::{HighlightOptions, Segment, Span, highlight_by_occurrence, highlight_by_span};
use crate::pool::{LineAnnotation, annotate_line};
use crate::quiz::Question;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HintOptions {
    pub show_transliteration: bool,
    pub show_translation: bool,
    pub show_glosses: bool,
}

impl HintOptions {
    pub const fn all() -> Self {
        Self {
            show_transliteration: true,
            show_translation: true,
            show_glosses: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuestionView<'a> {
    pub sentence: Vec<Segment<'a>>,
    pub transliteration: Option<Vec<Segment<'a>>>,
    pub translation: Option<&'a str>,
}

/// Highlights the quizzed token in the sentence by its occurrence rank and,
/// when shown, its counterpart in the transliteration: by aligned span when
/// there is one, otherwise by searching the romanization as a whole word.
pub fn render_question<'a>(question: &'a Question, hints: &HintOptions) -> QuestionView<'a> {
    let sentence = highlight_by_occurrence(
        &question.sentence,
        &question.highlight_token,
        question.occurrence_rank,
        HighlightOptions::exact(),
    );
    let transliteration = question
        .transliterated_sentence
        .as_deref()
        .filter(|_| hints.show_transliteration)
        .map(|text| {
            transliteration_segments(
                text,
                question.highlight_span,
                question.highlight_romanization.as_deref(),
                question.occurrence_rank,
            )
        });
    let translation = question
        .translated_sentence
        .as_deref()
        .filter(|_| hints.show_translation);
    QuestionView {
        sentence,
        transliteration,
        translation,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LineView<'a> {
    pub divider: bool,
    pub original: Vec<Segment<'a>>,
    pub transliteration: Option<Vec<Segment<'a>>>,
    pub translation: Option<&'a str>,
    pub glosses: Vec<LineAnnotation>,
}

/// Display rows for one lyrics line. `focus` selects an annotation (by its
/// index in the line's codes) to highlight in the original and
/// transliteration rows.
pub fn render_line<'a>(
    line: &'a LyricsLine,
    glossary: &Glossary,
    config: &EngineConfig,
    hints: &HintOptions,
    focus: Option<usize>,
) -> LineView<'a> {
    if line.is_divider {
        return LineView {
            divider: true,
            original: Vec::new(),
            transliteration: None,
            translation: None,
            glosses: Vec::new(),
        };
    }
    let annotations = annotate_line(line, glossary, config);
    let focused = focus.and_then(|index| annotations.get(index));

    let original = match focused {
        Some(annotation) => highlight_by_occurrence(
            &line.original,
            &annotation.token,
            annotation.occurrence_rank,
            HighlightOptions::exact(),
        ),
        None => highlight_by_span(&line.original, None),
    };
    let transliteration = line
        .transliterated
        .as_deref()
        .filter(|_| hints.show_transliteration)
        .map(|text| match focused {
            Some(annotation) => transliteration_segments(
                text,
                annotation.aligned_span,
                annotation.gloss.romanization(),
                annotation.occurrence_rank,
            ),
            None => highlight_by_span(text, None),
        });
    let translation = line
        .translated
        .as_deref()
        .filter(|_| hints.show_translation);
    let glosses = if hints.show_glosses {
        annotations
    } else {
        Vec::new()
    };
    LineView {
        divider: false,
        original,
        transliteration,
        translation,
        glosses,
    }
}

fn transliteration_segments<'a>(
    text: &'a str,
    span: Option<Span>,
    romanization: Option<&str>,
    rank: usize,
) -> Vec<Segment<'a>> {
    match (span, romanization) {
        (Some(span), _) => highlight_by_span(text, Some(span)),
        (None, Some(romanization)) => highlight_by_occurrence(
            text,
            romanization,
            rank,
            HighlightOptions::words_ignoring_case(),
        ),
        (None, None) => highlight_by_span(text, None),
    }
}
