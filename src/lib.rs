//! Glossing and vocabulary quizzes for annotated song lyrics.
//!
//! A lyrics line carries compact annotation codes (`token|language|function`)
//! that point into per-language word banks. This crate resolves those codes,
//! ranks repeated tokens, aligns tokens with the hand-written transliteration,
//! highlights single occurrences for display and builds multiple-choice
//! questions from a song's own vocabulary. Loading records and word banks is
//! left to the caller.

pub mod align;
pub mod annotation;
pub mod config;
pub mod data;
pub mod highlight;
pub mod occurrence;
pub mod pool;
pub mod quiz;
pub mod render;

pub use align::{FlexPattern, LineAligner, align_token};
pub use annotation::{AnnotationCode, ResolvedGloss};
pub use config::{EngineConfig, QuizConfig, Readiness, SENTINEL};
pub use data::{FunctionGloss, Glossary, GlossaryEntry, Lyrics, LyricsLine, LyricsRecord, WordBank, slugify};
pub use highlight::{HighlightOptions, Segment, Span, count_occurrences, find_occurrence};
pub use occurrence::{OccurrenceCounter, occurrence_ranks};
pub use pool::{GlossItem, GlossPool, LineAnnotation, PoolCache, PoolLine, annotate_line};
pub use quiz::{Question, QuizError, RandomSource};
pub use render::{HintOptions, LineView, QuestionView, render_line, render_question};

/// Resolves a raw annotation code with the default configuration.
pub fn resolve_annotation(code: &str, glossary: &Glossary) -> ResolvedGloss {
    resolve_annotation_with(code, glossary, &EngineConfig::default())
}

pub fn resolve_annotation_with(code: &str, glossary: &Glossary, config: &EngineConfig) -> ResolvedGloss {
    annotation::resolve(&AnnotationCode::parse(code, config.delimiter), glossary, config)
}

pub fn build_pool(record: &LyricsRecord, glossary: &Glossary) -> GlossPool {
    pool::build_pool(record, glossary, &EngineConfig::default())
}

pub fn build_pool_with(record: &LyricsRecord, glossary: &Glossary, config: &EngineConfig) -> GlossPool {
    pool::build_pool(record, glossary, config)
}

/// Draws a question with the default quiz settings.
pub fn next_question<R>(pool: &GlossPool, rng: &mut R) -> Result<Question, QuizError>
where
    R: RandomSource + ?Sized,
{
    quiz::next_question(pool, &QuizConfig::default(), rng)
}

pub fn next_question_with<R>(pool: &GlossPool, config: &QuizConfig, rng: &mut R) -> Result<Question, QuizError>
where
    R: RandomSource + ?Sized,
{
    quiz::next_question(pool, config, rng)
}

pub fn highlight_by_occurrence<'a>(
    text: &'a str,
    token: &str,
    rank: usize,
    options: HighlightOptions,
) -> Vec<Segment<'a>> {
    highlight::highlight_by_occurrence(text, token, rank, options)
}

pub fn highlight_by_span(text: &str, span: Option<Span>) -> Vec<Segment<'_>> {
    highlight::highlight_by_span(text, span)
}
