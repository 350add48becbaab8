use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

/// Words of one language, keyed by surface form.
pub type WordBank = BTreeMap<String, GlossaryEntry>;

/// One line of a lyrics record.
///
/// Content files use the field names `divider`, `romanized`, `english` and
/// `explanation`; those are accepted as aliases.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LyricsLine {
    #[serde(default, alias = "divider")]
    pub is_divider: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub original: String,
    #[serde(
        default,
        alias = "romanized",
        skip_serializing_if = "Option::is_none",
        deserialize_with = "blank_as_none"
    )]
    pub transliterated: Option<String>,
    #[serde(
        default,
        alias = "english",
        skip_serializing_if = "Option::is_none",
        deserialize_with = "blank_as_none"
    )]
    pub translated: Option<String>,
    #[serde(default, alias = "explanation", deserialize_with = "null_as_default")]
    pub annotations: Vec<String>,
}

impl LyricsLine {
    pub fn divider() -> Self {
        Self {
            is_divider: true,
            ..Self::default()
        }
    }

    pub fn new(original: impl Into<String>) -> Self {
        Self {
            original: original.into(),
            ..Self::default()
        }
    }

    pub fn with_transliteration(mut self, text: impl Into<String>) -> Self {
        self.transliterated = Some(text.into());
        self
    }

    pub fn with_translation(mut self, text: impl Into<String>) -> Self {
        self.translated = Some(text.into());
        self
    }

    pub fn with_annotations<I, S>(mut self, codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.annotations = codes.into_iter().map(Into::into).collect();
        self
    }

    pub fn has_annotations(&self) -> bool {
        !self.is_divider && !self.annotations.is_empty()
    }
}

/// Body of a lyrics record: annotated lines, or a plain text block for songs
/// that have not been glossed yet.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Lyrics {
    Lines(Vec<LyricsLine>),
    Plain(String),
}

impl Default for Lyrics {
    fn default() -> Self {
        Lyrics::Lines(Vec::new())
    }
}

impl Lyrics {
    pub fn lines(&self) -> &[LyricsLine] {
        match self {
            Lyrics::Lines(lines) => lines,
            Lyrics::Plain(_) => &[],
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LyricsRecord {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub artist: String,
    #[serde(default)]
    pub album: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub languages: Vec<String>,
    #[serde(default)]
    pub lyrics: Lyrics,
}

impl LyricsRecord {
    pub fn from_lines(lines: Vec<LyricsLine>) -> Self {
        Self {
            lyrics: Lyrics::Lines(lines),
            ..Self::default()
        }
    }

    pub fn lines(&self) -> &[LyricsLine] {
        self.lyrics.lines()
    }

    /// Catalog slug in the `artist-album-title` form used for song URLs.
    pub fn slug(&self) -> String {
        format!(
            "{}-{}-{}",
            slugify(&self.artist),
            slugify(&self.album),
            slugify(&self.title)
        )
    }
}

/// Lowercases `text` and collapses every run of characters outside
/// `[a-z0-9-]` into a single `-`.
pub fn slugify(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_run = false;
    for ch in text.chars().flat_map(char::to_lowercase) {
        if ch.is_ascii_lowercase() || ch.is_ascii_digit() || ch == '-' {
            out.push(ch);
            in_run = false;
        } else if !in_run {
            out.push('-');
            in_run = true;
        }
    }
    out
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FunctionGloss {
    #[serde(default, alias = "english", skip_serializing_if = "Option::is_none")]
    pub meaning: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GlossaryEntry {
    /// Latin-script reading; Japanese banks write it as `romaji`.
    #[serde(default, alias = "romaji", skip_serializing_if = "Option::is_none")]
    pub romanized: Option<String>,
    /// Tonal reading for the configured phonetic languages (pinyin).
    #[serde(default, alias = "pinyin", skip_serializing_if = "Option::is_none")]
    pub phonetic: Option<String>,
    #[serde(default, alias = "english", skip_serializing_if = "Option::is_none")]
    pub meaning: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub functions: BTreeMap<String, FunctionGloss>,
}

impl GlossaryEntry {
    pub fn new(meaning: impl Into<String>) -> Self {
        Self {
            meaning: Some(meaning.into()),
            ..Self::default()
        }
    }

    pub fn romanized(mut self, text: impl Into<String>) -> Self {
        self.romanized = Some(text.into());
        self
    }

    pub fn phonetic(mut self, text: impl Into<String>) -> Self {
        self.phonetic = Some(text.into());
        self
    }

    pub fn function(mut self, key: impl Into<String>, meaning: impl Into<String>) -> Self {
        self.functions.insert(
            key.into(),
            FunctionGloss {
                meaning: Some(meaning.into()),
            },
        );
        self
    }
}

/// Per-language word banks: `language -> surface form -> entry`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Glossary {
    banks: BTreeMap<String, WordBank>,
}

impl Glossary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_bank(&mut self, language: impl Into<String>, bank: WordBank) {
        self.banks.insert(language.into(), bank);
    }

    pub fn insert(
        &mut self,
        language: impl Into<String>,
        surface_form: impl Into<String>,
        entry: GlossaryEntry,
    ) {
        self.banks
            .entry(language.into())
            .or_default()
            .insert(surface_form.into(), entry);
    }

    pub fn with_entry(
        mut self,
        language: impl Into<String>,
        surface_form: impl Into<String>,
        entry: GlossaryEntry,
    ) -> Self {
        self.insert(language, surface_form, entry);
        self
    }

    pub fn bank(&self, language: &str) -> Option<&WordBank> {
        self.banks.get(language)
    }

    pub fn lookup(&self, language: &str, surface_form: &str) -> Option<&GlossaryEntry> {
        self.banks.get(language)?.get(surface_form)
    }

    pub fn languages(&self) -> impl Iterator<Item = &str> {
        self.banks.keys().map(String::as_str)
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn blank_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|text| !text.trim().is_empty()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugify_collapses_runs() {
        assert_eq!(slugify("Ref:rain"), "ref-rain");
        assert_eq!(slugify("THE ORAL CIGARETTES"), "the-oral-cigarettes");
        assert_eq!(slugify("No Rain  No Rainbow"), "no-rain-no-rainbow");
    }

    #[test]
    fn record_slug_joins_artist_album_title() {
        let record = LyricsRecord {
            title: "Ref:rain".into(),
            artist: "Aimer".into(),
            album: "Penny Rain".into(),
            ..LyricsRecord::default()
        };
        assert_eq!(record.slug(), "aimer-penny-rain-ref-rain");
    }

    #[test]
    fn line_accepts_content_field_names() {
        let json = r#"{
            "original": "好きだ",
            "romanized": "suki da",
            "english": "I like it",
            "explanation": ["好き|jp|-"]
        }"#;
        let line: LyricsLine = serde_json::from_str(json).expect("line parses");
        assert!(!line.is_divider);
        assert_eq!(line.transliterated.as_deref(), Some("suki da"));
        assert_eq!(line.translated.as_deref(), Some("I like it"));
        assert_eq!(line.annotations, vec!["好き|jp|-".to_string()]);
    }

    #[test]
    fn null_and_blank_fields_default() {
        let json = r#"{"divider": true, "original": null, "romanized": "  ", "explanation": null}"#;
        let line: LyricsLine = serde_json::from_str(json).expect("line parses");
        assert!(line.is_divider);
        assert!(line.original.is_empty());
        assert!(line.transliterated.is_none());
        assert!(line.annotations.is_empty());
    }

    #[test]
    fn plain_lyrics_have_no_lines() {
        let json = r#"{"title": "Amy", "languages": ["jp"], "lyrics": "la la la"}"#;
        let record: LyricsRecord = serde_json::from_str(json).expect("record parses");
        assert!(matches!(record.lyrics, Lyrics::Plain(_)));
        assert!(record.lines().is_empty());
    }

    #[test]
    fn glossary_entry_reads_aliases() {
        let json = r#"{
            "jp": {"好き": {"english": "like", "romaji": "suki", "functions": {"adj": {"english": "fond"}}}},
            "zh": {"爱": {"english": "love", "pinyin": "ài"}}
        }"#;
        let glossary: Glossary = serde_json::from_str(json).expect("glossary parses");
        let suki = glossary.lookup("jp", "好き").expect("entry present");
        assert_eq!(suki.meaning.as_deref(), Some("like"));
        assert_eq!(suki.romanized.as_deref(), Some("suki"));
        assert_eq!(suki.phonetic, None);
        assert_eq!(
            suki.functions.get("adj").and_then(|f| f.meaning.as_deref()),
            Some("fond")
        );
        assert_eq!(
            glossary.lookup("zh", "爱").and_then(|e| e.phonetic.as_deref()),
            Some("ài")
        );
        assert!(glossary.lookup("ko", "사랑").is_none());
    }
}
