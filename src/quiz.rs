use crate::config::{QuizConfig, Readiness};
use crate::highlight::Span;
use crate::pool::GlossPool;
use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

/// Source of the random choices behind question generation.
///
/// Every `rand::Rng` is a source; tests can plug in seeded generators or a
/// scripted implementation.
pub trait RandomSource {
    /// Uniform index in `0..len`. Only called with `len > 0`.
    fn pick(&mut self, len: usize) -> usize;

    fn shuffle<T>(&mut self, items: &mut [T]);
}

impl<R: Rng + ?Sized> RandomSource for R {
    fn pick(&mut self, len: usize) -> usize {
        self.gen_range(0..len)
    }

    fn shuffle<T>(&mut self, items: &mut [T]) {
        SliceRandom::shuffle(items, self);
    }
}

/// A multiple-choice question about one glossed token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub sentence: String,
    pub transliterated_sentence: Option<String>,
    pub translated_sentence: Option<String>,
    pub highlight_token: String,
    pub highlight_romanization: Option<String>,
    pub highlight_span: Option<Span>,
    pub occurrence_rank: usize,
    pub correct_meaning: String,
    pub options: Vec<String>,
}

impl Question {
    pub fn is_correct(&self, answer: &str) -> bool {
        answer == self.correct_meaning
    }

    pub fn correct_index(&self) -> Option<usize> {
        self.options
            .iter()
            .position(|option| *option == self.correct_meaning)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuizError {
    NotEnoughData { items: usize, meanings: usize },
}

impl fmt::Display for QuizError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuizError::NotEnoughData { items, meanings } => write!(
                f,
                "not enough data for a question ({items} glossed items, {meanings} distinct meanings)"
            ),
        }
    }
}

impl std::error::Error for QuizError {}

pub fn is_ready(pool: &GlossPool, config: &QuizConfig) -> bool {
    let has_items = pool.lines.iter().any(|line| !line.items.is_empty());
    match config.readiness {
        Readiness::Strict => has_items && pool.distinct_meanings.len() >= 2,
        Readiness::Lenient => has_items,
    }
}

pub fn next_question<R>(
    pool: &GlossPool,
    config: &QuizConfig,
    rng: &mut R,
) -> Result<Question, QuizError>
where
    R: RandomSource + ?Sized,
{
    let not_enough = || QuizError::NotEnoughData {
        items: pool.item_count(),
        meanings: pool.distinct_meanings.len(),
    };
    if !is_ready(pool, config) {
        return Err(not_enough());
    }

    let lines: Vec<_> = pool
        .lines
        .iter()
        .filter(|line| !line.items.is_empty())
        .collect();
    let line = lines[rng.pick(lines.len())];
    let item = &line.items[rng.pick(line.items.len())];

    let mut distractors: Vec<&str> = pool
        .distinct_meanings
        .iter()
        .map(String::as_str)
        .filter(|meaning| *meaning != item.meaning)
        .collect();
    rng.shuffle(&mut distractors);
    distractors.truncate(config.option_limit() - 1);

    let mut options: Vec<String> = Vec::with_capacity(distractors.len() + 1);
    options.push(item.meaning.clone());
    options.extend(distractors.into_iter().map(str::to_string));
    rng.shuffle(&mut options);
    if options.len() < 2 {
        return Err(not_enough());
    }

    debug!(
        line = item.line_index,
        token = %item.token,
        rank = item.occurrence_rank,
        options = options.len(),
        "drew quiz question"
    );
    Ok(Question {
        sentence: item.line_original.clone(),
        transliterated_sentence: item.line_transliterated.clone(),
        translated_sentence: item.line_translated.clone(),
        highlight_token: item.token.clone(),
        highlight_romanization: item.token_romanization.clone(),
        highlight_span: item.aligned_span,
        occurrence_rank: item.occurrence_rank,
        correct_meaning: item.meaning.clone(),
        options,
    })
}
