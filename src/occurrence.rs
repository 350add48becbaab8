use crate::annotation::AnnotationCode;
use std::collections::HashMap;

/// Per-line repetition counter keyed by raw token text. Create a fresh one
/// for every line.
#[derive(Debug, Default)]
pub struct OccurrenceCounter {
    seen: HashMap<String, usize>,
}

impl OccurrenceCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the 1-based rank of this occurrence of `token`.
    pub fn next_rank(&mut self, token: &str) -> usize {
        let count = self.seen.entry(token.to_string()).or_insert(0);
        *count += 1;
        *count
    }
}

pub fn occurrence_ranks(codes: &[AnnotationCode]) -> Vec<usize> {
    let mut counter = OccurrenceCounter::new();
    codes
        .iter()
        .map(|code| counter.next_rank(&code.token))
        .collect()
}
