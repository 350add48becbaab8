use crate::config::{EngineConfig, SENTINEL};
use crate::data::{Glossary, GlossaryEntry};
use serde::{Deserialize, Serialize};

/// A parsed `token|language|function` reference into the glossary.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AnnotationCode {
    pub token: String,
    pub language: Option<String>,
    pub function: Option<String>,
}

impl AnnotationCode {
    /// Splits `raw` on `delimiter`. Fields beyond the third are ignored and
    /// missing trailing fields are `None`.
    pub fn parse(raw: &str, delimiter: char) -> Self {
        let mut fields = raw.split(delimiter);
        let token = fields.next().unwrap_or_default().to_string();
        let language = fields.next().map(str::to_string);
        let function = fields.next().map(str::to_string);
        Self {
            token,
            language,
            function,
        }
    }

    pub fn new(
        token: impl Into<String>,
        language: impl Into<String>,
        function: impl Into<String>,
    ) -> Self {
        Self {
            token: token.into(),
            language: Some(language.into()),
            function: Some(function.into()),
        }
    }

    /// `-|-|-`, an explicit "no gloss" slot.
    pub fn is_placeholder(&self) -> bool {
        self.token == SENTINEL
            && self.language.as_deref() == Some(SENTINEL)
            && self.function.as_deref() == Some(SENTINEL)
    }

    fn wants_default_meaning(&self) -> bool {
        matches!(self.function.as_deref(), None | Some(SENTINEL))
    }
}

/// Display-ready gloss. Missing data is the `"-"` sentinel, never empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResolvedGloss {
    pub surface_form: String,
    pub romanization: String,
    pub meaning: String,
}

impl ResolvedGloss {
    pub fn missing(surface_form: impl Into<String>) -> Self {
        Self {
            surface_form: surface_form.into(),
            romanization: SENTINEL.to_string(),
            meaning: SENTINEL.to_string(),
        }
    }

    pub fn has_meaning(&self) -> bool {
        self.meaning != SENTINEL
    }

    pub fn romanization(&self) -> Option<&str> {
        non_sentinel(&self.romanization)
    }
}

pub fn resolve(code: &AnnotationCode, glossary: &Glossary, config: &EngineConfig) -> ResolvedGloss {
    if code.is_placeholder() {
        return ResolvedGloss::missing(SENTINEL);
    }
    let Some(language) = code.language.as_deref() else {
        return ResolvedGloss::missing(code.token.as_str());
    };
    let Some(entry) = glossary.lookup(language, &code.token) else {
        return ResolvedGloss::missing(code.token.as_str());
    };
    ResolvedGloss {
        surface_form: code.token.clone(),
        romanization: romanization_for(entry, language, config),
        meaning: meaning_for(entry, code),
    }
}

fn romanization_for(entry: &GlossaryEntry, language: &str, config: &EngineConfig) -> String {
    let field = if config.uses_phonetic(language) {
        entry.phonetic.as_deref()
    } else {
        entry.romanized.as_deref()
    };
    or_sentinel(field)
}

fn meaning_for(entry: &GlossaryEntry, code: &AnnotationCode) -> String {
    if code.wants_default_meaning() {
        return or_sentinel(entry.meaning.as_deref());
    }
    let function = code.function.as_deref().unwrap_or(SENTINEL);
    or_sentinel(
        entry
            .functions
            .get(function)
            .and_then(|gloss| gloss.meaning.as_deref()),
    )
}

fn or_sentinel(value: Option<&str>) -> String {
    match value {
        Some(text) if !text.trim().is_empty() => text.to_string(),
        _ => SENTINEL.to_string(),
    }
}

pub(crate) fn non_sentinel(value: &str) -> Option<&str> {
    if value.is_empty() || value == SENTINEL {
        None
    } else {
        Some(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn glossary() -> Glossary {
        Glossary::new()
            .with_entry("jp", "好き", GlossaryEntry::new("like").romanized("suki"))
            .with_entry(
                "jp",
                "の",
                GlossaryEntry::new("of")
                    .romanized("no")
                    .function("nominalizer", "the one that"),
            )
            .with_entry("zh", "爱", GlossaryEntry::new("love").phonetic("ài").romanized("ai"))
            .with_entry("zh", "心", GlossaryEntry::default())
    }

    fn resolve_raw(raw: &str) -> ResolvedGloss {
        let config = EngineConfig::default();
        resolve(&AnnotationCode::parse(raw, config.delimiter), &glossary(), &config)
    }

    #[test]
    fn parse_treats_missing_fields_as_absent() {
        let code = AnnotationCode::parse("好き|jp", '|');
        assert_eq!(code.token, "好き");
        assert_eq!(code.language.as_deref(), Some("jp"));
        assert_eq!(code.function, None);

        let bare = AnnotationCode::parse("", '|');
        assert_eq!(bare.token, "");
        assert_eq!(bare.language, None);
    }

    #[test]
    fn resolves_default_meaning() {
        let gloss = resolve_raw("好き|jp|-");
        assert_eq!(
            gloss,
            ResolvedGloss {
                surface_form: "好き".into(),
                romanization: "suki".into(),
                meaning: "like".into(),
            }
        );
    }

    #[test]
    fn resolves_function_meaning() {
        assert_eq!(resolve_raw("の|jp|nominalizer").meaning, "the one that");
        assert_eq!(resolve_raw("の|jp|particle").meaning, "-");
    }

    #[test]
    fn phonetic_language_reads_phonetic_field() {
        assert_eq!(resolve_raw("爱|zh|-").romanization, "ài");

        let config = EngineConfig {
            phonetic_languages: Vec::new(),
            ..EngineConfig::default()
        };
        let gloss = resolve(&AnnotationCode::new("爱", "zh", "-"), &glossary(), &config);
        assert_eq!(gloss.romanization, "ai");
    }

    #[test]
    fn misses_resolve_to_sentinels() {
        assert_eq!(resolve_raw("嫌い|jp|-"), ResolvedGloss::missing("嫌い"));
        assert_eq!(resolve_raw("사랑|ko|-"), ResolvedGloss::missing("사랑"));
        assert_eq!(resolve_raw("好き"), ResolvedGloss::missing("好き"));
        let empty = resolve_raw("心|zh|-");
        assert_eq!(empty.romanization, "-");
        assert!(!empty.has_meaning());
    }

    #[test]
    fn placeholder_skips_lookup() {
        let gloss = resolve_raw("-|-|-");
        assert_eq!(gloss, ResolvedGloss::missing("-"));
        assert_eq!(gloss.romanization(), None);
    }
}
