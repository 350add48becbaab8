use serde::{Deserialize, Serialize};

/// Marker used for "no data" in annotation codes and resolved glosses.
pub const SENTINEL: &str = "-";
pub const DEFAULT_DELIMITER: char = '|';
pub const MAX_OPTIONS: usize = 4;
pub const MIN_OPTIONS: usize = 2;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Separator between the token, language and function fields of a code.
    pub delimiter: char,
    /// Languages whose romanization comes from the entry's phonetic field.
    pub phonetic_languages: Vec<String>,
    pub quiz: QuizConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            delimiter: DEFAULT_DELIMITER,
            phonetic_languages: vec!["zh".to_string()],
            quiz: QuizConfig::default(),
        }
    }
}

impl EngineConfig {
    pub fn uses_phonetic(&self, language: &str) -> bool {
        self.phonetic_languages.iter().any(|lang| lang == language)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Readiness {
    /// Require two distinct meanings before drawing anything.
    #[default]
    Strict,
    /// Draw as soon as one item exists; report a question that ends up
    /// with fewer than two options as not enough data.
    Lenient,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct QuizConfig {
    pub readiness: Readiness,
    pub max_options: usize,
}

impl Default for QuizConfig {
    fn default() -> Self {
        Self {
            readiness: Readiness::Strict,
            max_options: MAX_OPTIONS,
        }
    }
}

impl QuizConfig {
    pub fn option_limit(&self) -> usize {
        self.max_options.clamp(MIN_OPTIONS, MAX_OPTIONS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn option_limit_is_clamped() {
        let mut quiz = QuizConfig::default();
        assert_eq!(quiz.option_limit(), 4);
        quiz.max_options = 9;
        assert_eq!(quiz.option_limit(), 4);
        quiz.max_options = 0;
        assert_eq!(quiz.option_limit(), 2);
    }

    #[test]
    fn partial_config_fills_defaults() {
        let config: EngineConfig =
            serde_json::from_str(r#"{"phonetic_languages": ["zh", "jp"]}"#).expect("parses");
        assert_eq!(config.delimiter, '|');
        assert!(config.uses_phonetic("jp"));
        assert!(!config.uses_phonetic("ko"));
        assert_eq!(config.quiz.readiness, Readiness::Strict);
    }
}
