use crate::align::LineAligner;
use crate::annotation::{AnnotationCode, ResolvedGloss, resolve};
use crate::config::EngineConfig;
use crate::data::{Glossary, LyricsLine, LyricsRecord};
use crate::highlight::Span;
use crate::occurrence::OccurrenceCounter;
use lru::LruCache;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::hash::{DefaultHasher, Hash, Hasher};
use std::num::NonZeroUsize;
use std::sync::Arc;
use tracing::debug;

pub const DEFAULT_POOL_CACHE_CAPACITY: usize = 32;

/// One glossed token occurrence, ready to be quizzed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlossItem {
    pub line_index: usize,
    pub line_original: String,
    pub line_transliterated: Option<String>,
    pub line_translated: Option<String>,
    pub token: String,
    pub token_romanization: Option<String>,
    pub meaning: String,
    pub occurrence_rank: usize,
    pub aligned_span: Option<Span>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolLine {
    pub line_index: usize,
    pub items: Vec<GlossItem>,
}

/// Quizzable vocabulary of one lyrics record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlossPool {
    pub lines: Vec<PoolLine>,
    pub distinct_meanings: BTreeSet<String>,
}

impl GlossPool {
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn item_count(&self) -> usize {
        self.lines.iter().map(|line| line.items.len()).sum()
    }

    pub fn items(&self) -> impl Iterator<Item = &GlossItem> {
        self.lines.iter().flat_map(|line| line.items.iter())
    }
}

pub fn build_pool(record: &LyricsRecord, glossary: &Glossary, config: &EngineConfig) -> GlossPool {
    let mut pool = GlossPool::default();
    for (line_index, line) in record.lines().iter().enumerate() {
        if !line.has_annotations() {
            continue;
        }
        let items = line_items(line_index, line, glossary, config);
        if items.is_empty() {
            continue;
        }
        pool.distinct_meanings
            .extend(items.iter().map(|item| item.meaning.clone()));
        pool.lines.push(PoolLine { line_index, items });
    }
    debug!(
        lines = pool.lines.len(),
        items = pool.item_count(),
        meanings = pool.distinct_meanings.len(),
        "built gloss pool"
    );
    pool
}

/// One annotation code of a line after resolution, ranking and alignment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineAnnotation {
    pub token: String,
    pub gloss: ResolvedGloss,
    pub occurrence_rank: usize,
    pub aligned_span: Option<Span>,
}

impl LineAnnotation {
    pub fn is_usable(&self) -> bool {
        !self.token.is_empty() && self.gloss.has_meaning()
    }
}

/// Runs every code of `line` through resolution, ranking and alignment, in
/// order. Sentinel glosses are kept.
pub fn annotate_line(line: &LyricsLine, glossary: &Glossary, config: &EngineConfig) -> Vec<LineAnnotation> {
    if line.is_divider {
        return Vec::new();
    }
    let mut counter = OccurrenceCounter::new();
    let mut aligner = line.transliterated.as_deref().map(LineAligner::new);
    line.annotations
        .iter()
        .map(|raw| {
            let code = AnnotationCode::parse(raw, config.delimiter);
            let occurrence_rank = counter.next_rank(&code.token);
            let gloss = resolve(&code, glossary, config);
            let aligned_span = aligner
                .as_mut()
                .and_then(|aligner| aligner.align(&gloss.romanization));
            LineAnnotation {
                token: code.token,
                gloss,
                occurrence_rank,
                aligned_span,
            }
        })
        .collect()
}

/// Usable gloss items of one line: annotations without a meaning or token
/// are dropped after ranking and alignment.
pub fn line_items(
    line_index: usize,
    line: &LyricsLine,
    glossary: &Glossary,
    config: &EngineConfig,
) -> Vec<GlossItem> {
    annotate_line(line, glossary, config)
        .into_iter()
        .filter(LineAnnotation::is_usable)
        .map(|annotation| GlossItem {
            line_index,
            line_original: line.original.clone(),
            line_transliterated: line.transliterated.clone(),
            line_translated: line.translated.clone(),
            token_romanization: annotation.gloss.romanization().map(str::to_string),
            token: annotation.token,
            meaning: annotation.gloss.meaning,
            occurrence_rank: annotation.occurrence_rank,
            aligned_span: annotation.aligned_span,
        })
        .collect()
}

struct CachedPool {
    fingerprint: u64,
    pool: Arc<GlossPool>,
}

/// Memoized pools keyed by record identity (for example the song slug).
///
/// A key whose record, glossary or config changed gets a freshly built pool;
/// pools already handed out are never modified.
pub struct PoolCache {
    config: EngineConfig,
    entries: Mutex<LruCache<String, CachedPool>>,
}

impl PoolCache {
    pub fn new(config: EngineConfig, capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            config,
            entries: Mutex::new(LruCache::new(capacity)),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn get_or_build(&self, key: &str, record: &LyricsRecord, glossary: &Glossary) -> Arc<GlossPool> {
        let fingerprint = fingerprint(record, glossary, &self.config);
        {
            let mut entries = self.entries.lock();
            if let Some(cached) = entries.get(key) {
                if cached.fingerprint == fingerprint {
                    debug!(key, "gloss pool cache hit");
                    return Arc::clone(&cached.pool);
                }
                debug!(key, "gloss pool source changed, rebuilding");
            }
        }
        let pool = Arc::new(build_pool(record, glossary, &self.config));
        self.entries.lock().put(
            key.to_string(),
            CachedPool {
                fingerprint,
                pool: Arc::clone(&pool),
            },
        );
        pool
    }

    pub fn invalidate(&self, key: &str) -> bool {
        self.entries.lock().pop(key).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for PoolCache {
    fn default() -> Self {
        Self::new(EngineConfig::default(), DEFAULT_POOL_CACHE_CAPACITY)
    }
}

fn fingerprint(record: &LyricsRecord, glossary: &Glossary, config: &EngineConfig) -> u64 {
    let mut hasher = DefaultHasher::new();
    record.hash(&mut hasher);
    glossary.hash(&mut hasher);
    config.delimiter.hash(&mut hasher);
    config.phonetic_languages.hash(&mut hasher);
    hasher.finish()
}
