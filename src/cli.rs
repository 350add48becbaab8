use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};

use atty::Stream;
use clap::{Parser, Subcommand};
use leerically::{
    EngineConfig, Glossary, HintOptions, Lyrics, LyricsRecord, PoolCache, QuizConfig, QuizError,
    Readiness, Segment, WordBank, quiz, render_line, render_question, resolve_annotation_with,
};
use rand::SeedableRng;
use rand::rngs::SmallRng;
use serde::de::DeserializeOwned;
use serde_json::json;
use termimad::{FmtText, MadSkin, terminal_size};
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;
use unicode_width::UnicodeWidthStr;

#[derive(Parser, Debug)]
#[command(name = "leerically", about = "Gloss and quiz annotated song lyrics", version)]
pub struct Cli {
    /// Emit JSON instead of human-readable output.
    #[arg(long, global = true)]
    json: bool,

    /// Languages whose romanization comes from the phonetic field (comma separated).
    #[arg(long = "phonetic-lang", global = true, value_delimiter = ',')]
    phonetic_langs: Vec<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Resolve raw annotation codes against word banks.
    Resolve {
        /// Codes in `token|language|function` form.
        #[arg(required = true)]
        codes: Vec<String>,
        /// Word bank as LANG=FILE; repeat for several languages.
        #[arg(long = "bank", value_parser = parse_bank_arg, required = true)]
        banks: Vec<(String, PathBuf)>,
    },
    /// Print a song's lines with optional hint rows and gloss tables.
    Lyrics {
        /// Song file (YAML or JSON).
        song: PathBuf,
        /// Directory holding `<lang>.yml` word banks.
        #[arg(long)]
        banks_dir: Option<PathBuf>,
        /// Hide the romanized row.
        #[arg(long)]
        no_romanized: bool,
        /// Hide the translation row.
        #[arg(long)]
        no_translation: bool,
        /// Show the gloss table under each annotated line.
        #[arg(long)]
        glosses: bool,
    },
    /// Draw multiple-choice vocabulary questions from a song.
    Quiz {
        /// Song file (YAML or JSON).
        song: PathBuf,
        /// Directory holding `<lang>.yml` word banks.
        #[arg(long)]
        banks_dir: Option<PathBuf>,
        /// Number of questions to draw.
        #[arg(short, long, default_value_t = 5)]
        count: usize,
        /// Seed for reproducible questions.
        #[arg(long)]
        seed: Option<u64>,
        /// Draw even when the song has a single distinct meaning.
        #[arg(long)]
        lenient: bool,
        /// Show romanized and translated hint rows.
        #[arg(long)]
        hints: bool,
        /// Print the answer under each question.
        #[arg(long)]
        reveal: bool,
    },
    /// Print the catalog slug of a song.
    Slug {
        /// Song file (YAML or JSON).
        song: PathBuf,
    },
}

pub fn run() -> Result<(), Box<dyn Error>> {
    init_tracing();
    let cli = Cli::parse();
    let mut config = EngineConfig::default();
    if !cli.phonetic_langs.is_empty() {
        config.phonetic_languages = cli.phonetic_langs.clone();
    }
    match cli.command {
        Command::Resolve { codes, banks } => handle_resolve(codes, banks, &config, cli.json),
        Command::Lyrics {
            song,
            banks_dir,
            no_romanized,
            no_translation,
            glosses,
        } => {
            let hints = HintOptions {
                show_transliteration: !no_romanized,
                show_translation: !no_translation,
                show_glosses: glosses,
            };
            handle_lyrics(&song, banks_dir, hints, &config, cli.json)
        }
        Command::Quiz {
            song,
            banks_dir,
            count,
            seed,
            lenient,
            hints,
            reveal,
        } => {
            config.quiz = QuizConfig {
                readiness: if lenient {
                    Readiness::Lenient
                } else {
                    Readiness::Strict
                },
                ..config.quiz
            };
            let hints = if hints {
                HintOptions::all()
            } else {
                HintOptions::default()
            };
            let settings = QuizRun {
                count,
                seed,
                hints,
                reveal,
            };
            handle_quiz(&song, banks_dir, settings, &config, cli.json)
        }
        Command::Slug { song } => handle_slug(&song, cli.json),
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn parse_bank_arg(raw: &str) -> Result<(String, PathBuf), String> {
    let (language, path) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected LANG=FILE, got {raw:?}"))?;
    if language.is_empty() || path.is_empty() {
        return Err(format!("expected LANG=FILE, got {raw:?}"));
    }
    Ok((language.to_string(), PathBuf::from(path)))
}

fn handle_resolve(
    codes: Vec<String>,
    banks: Vec<(String, PathBuf)>,
    config: &EngineConfig,
    as_json: bool,
) -> Result<(), Box<dyn Error>> {
    let mut glossary = Glossary::new();
    for (language, path) in banks {
        let bank: WordBank = load_document(&path)?;
        glossary.insert_bank(language, bank);
    }
    let resolved: Vec<_> = codes
        .iter()
        .map(|code| resolve_annotation_with(code, &glossary, config))
        .collect();

    if as_json {
        println!("{}", serde_json::to_string_pretty(&resolved)?);
        return Ok(());
    }
    let rows: Vec<_> = resolved
        .iter()
        .map(|gloss| {
            [
                gloss.surface_form.as_str(),
                gloss.romanization.as_str(),
                gloss.meaning.as_str(),
            ]
        })
        .collect();
    print_gloss_table(&rows, "");
    Ok(())
}

fn handle_lyrics(
    song: &Path,
    banks_dir: Option<PathBuf>,
    hints: HintOptions,
    config: &EngineConfig,
    as_json: bool,
) -> Result<(), Box<dyn Error>> {
    let record: LyricsRecord = load_document(song)?;
    let glossary = load_glossary(&record, song, banks_dir.as_deref());
    let views: Vec<_> = record
        .lines()
        .iter()
        .map(|line| render_line(line, &glossary, config, &hints, None))
        .collect();

    if as_json {
        let payload = json!({
            "title": record.title,
            "artist": record.artist,
            "album": record.album,
            "slug": record.slug(),
            "lines": views,
        });
        println!("{}", serde_json::to_string_pretty(&payload)?);
        return Ok(());
    }

    println!("{} - {} ({})", record.title, record.artist, record.album);
    if record.lines().is_empty() {
        if let Lyrics::Plain(text) = &record.lyrics {
            println!("\n{}", text.trim());
        }
        return Ok(());
    }
    for view in &views {
        if view.divider {
            println!("\n----");
            continue;
        }
        println!();
        println!("{}", plain_text(&view.original));
        if let Some(transliteration) = &view.transliteration {
            println!("{}", plain_text(transliteration));
        }
        if let Some(translation) = view.translation {
            println!("{translation}");
        }
        if !view.glosses.is_empty() {
            let rows: Vec<_> = view
                .glosses
                .iter()
                .map(|annotation| {
                    [
                        annotation.gloss.surface_form.as_str(),
                        annotation.gloss.romanization.as_str(),
                        annotation.gloss.meaning.as_str(),
                    ]
                })
                .collect();
            print_gloss_table(&rows, "    ");
        }
    }
    Ok(())
}

struct QuizRun {
    count: usize,
    seed: Option<u64>,
    hints: HintOptions,
    reveal: bool,
}

fn handle_quiz(
    song: &Path,
    banks_dir: Option<PathBuf>,
    settings: QuizRun,
    config: &EngineConfig,
    as_json: bool,
) -> Result<(), Box<dyn Error>> {
    let record: LyricsRecord = load_document(song)?;
    let glossary = load_glossary(&record, song, banks_dir.as_deref());
    let cache = PoolCache::new(config.clone(), 1);
    let pool = cache.get_or_build(&record.slug(), &record, &glossary);
    let mut rng = match settings.seed {
        Some(seed) => SmallRng::seed_from_u64(seed),
        None => SmallRng::from_entropy(),
    };

    let mut questions = Vec::with_capacity(settings.count);
    for _ in 0..settings.count {
        match quiz::next_question(&pool, &config.quiz, &mut rng) {
            Ok(question) => questions.push(question),
            Err(QuizError::NotEnoughData { items, meanings }) => {
                if as_json {
                    let payload = json!({
                        "error": "not_enough_data",
                        "items": items,
                        "meanings": meanings,
                    });
                    println!("{}", serde_json::to_string_pretty(&payload)?);
                } else {
                    println!(
                        "Not enough glossed vocabulary in \"{}\" for a quiz ({items} items, {meanings} meanings).",
                        record.title
                    );
                }
                return Ok(());
            }
        }
    }

    if as_json {
        println!("{}", serde_json::to_string_pretty(&questions)?);
        return Ok(());
    }

    let styled = stdout_is_tty();
    let (bold, italic) = if styled { ("**", "*") } else { ("", "") };
    for (number, question) in questions.iter().enumerate() {
        let view = render_question(question, &settings.hints);
        let mut block = format!(
            "{bold}Q{}.{bold} {}\n",
            number + 1,
            markup(&view.sentence, styled)
        );
        if let Some(transliteration) = &view.transliteration {
            block.push_str(&format!("\n{italic}{}{italic}\n", markup(transliteration, styled)));
        }
        if let Some(translation) = view.translation {
            block.push_str(&format!("\n{translation}\n"));
        }
        for (index, option) in question.options.iter().enumerate() {
            block.push_str(&format!("\n{}) {option}", option_label(index)));
        }
        if settings.reveal {
            let label = question
                .correct_index()
                .map(option_label)
                .unwrap_or('?');
            block.push_str(&format!("\n\nanswer: {label}) {}", question.correct_meaning));
        }
        render_block(&block, styled);
    }
    Ok(())
}

fn handle_slug(song: &Path, as_json: bool) -> Result<(), Box<dyn Error>> {
    let record: LyricsRecord = load_document(song)?;
    let slug = record.slug();
    if as_json {
        println!("{}", serde_json::to_string_pretty(&json!({ "slug": slug }))?);
    } else {
        println!("{slug}");
    }
    Ok(())
}

fn load_document<T: DeserializeOwned>(path: &Path) -> Result<T, Box<dyn Error>> {
    let text = fs::read_to_string(path)
        .map_err(|err| format!("failed to read {}: {err}", path.display()))?;
    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    let value = if is_json {
        serde_json::from_str(&text)
            .map_err(|err| format!("failed to parse {}: {err}", path.display()))?
    } else {
        serde_yaml::from_str(&text)
            .map_err(|err| format!("failed to parse {}: {err}", path.display()))?
    };
    Ok(value)
}

/// Loads `<lang>.yml` (or `.json`) for every language of the record. Banks
/// that are missing or unreadable are skipped so their codes resolve to "-".
fn load_glossary(record: &LyricsRecord, song: &Path, banks_dir: Option<&Path>) -> Glossary {
    let dir = banks_dir
        .map(Path::to_path_buf)
        .unwrap_or_else(|| default_banks_dir(song));
    let mut glossary = Glossary::new();
    for language in &record.languages {
        let candidates = [
            dir.join(format!("{language}.yml")),
            dir.join(format!("{language}.yaml")),
            dir.join(format!("{language}.json")),
        ];
        let Some(path) = candidates.iter().find(|path| path.is_file()) else {
            warn!(language = %language, dir = %dir.display(), "no word bank found");
            continue;
        };
        match load_document::<Option<WordBank>>(path) {
            Ok(Some(bank)) => {
                debug!(language = %language, words = bank.len(), "loaded word bank");
                glossary.insert_bank(language.clone(), bank);
            }
            Ok(None) => warn!(language = %language, "word bank is empty"),
            Err(err) => warn!(language = %language, error = %err, "failed to load word bank"),
        }
    }
    glossary
}

/// Content layout keeps songs in `data/songs` and banks in `data/word-banks`.
fn default_banks_dir(song: &Path) -> PathBuf {
    let songs_dir = song.parent().unwrap_or_else(|| Path::new("."));
    songs_dir
        .parent()
        .unwrap_or(songs_dir)
        .join("word-banks")
}

fn print_gloss_table(rows: &[[&str; 3]], indent: &str) {
    if rows.is_empty() {
        println!("{indent}No annotations.");
        return;
    }
    let headers = ["ORIGINAL", "ROMANIZED", "MEANING"];
    let width = |column: usize| {
        rows.iter()
            .map(|row| UnicodeWidthStr::width(row[column]))
            .max()
            .unwrap_or(0)
            .max(headers[column].len())
    };
    let (w0, w1) = (width(0), width(1));
    println!("{indent}{}  {}  {}", pad(headers[0], w0), pad(headers[1], w1), headers[2]);
    println!("{indent}{}  {}  {}", "-".repeat(w0), "-".repeat(w1), "-------");
    for row in rows {
        println!("{indent}{}  {}  {}", pad(row[0], w0), pad(row[1], w1), row[2]);
    }
}

/// Left-aligns `text` in `width` terminal columns; CJK glyphs take two.
fn pad(text: &str, width: usize) -> String {
    let fill = width.saturating_sub(UnicodeWidthStr::width(text));
    format!("{text}{}", " ".repeat(fill))
}

fn option_label(index: usize) -> char {
    (b'a' + (index % 26) as u8) as char
}

fn plain_text(segments: &[Segment<'_>]) -> String {
    segments.iter().map(|segment| segment.text).collect()
}

fn markup(segments: &[Segment<'_>], styled: bool) -> String {
    segments
        .iter()
        .map(|segment| match (segment.marked, styled) {
            (true, true) => format!("**{}**", segment.text),
            (true, false) => format!("[{}]", segment.text),
            (false, _) => segment.text.to_string(),
        })
        .collect()
}

fn stdout_is_tty() -> bool {
    atty::is(Stream::Stdout)
}

fn markdown_width() -> usize {
    let (width, _) = terminal_size();
    width.max(60) as usize
}

fn render_block(body: &str, styled: bool) {
    println!();
    if styled {
        let skin = MadSkin::default();
        let formatted = FmtText::from(&skin, body, Some(markdown_width()));
        println!("{formatted}");
    } else {
        println!("{body}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bank_args_split_on_equals() {
        assert_eq!(
            parse_bank_arg("jp=banks/jp.yml"),
            Ok(("jp".to_string(), PathBuf::from("banks/jp.yml")))
        );
        assert!(parse_bank_arg("jp").is_err());
        assert!(parse_bank_arg("=x.yml").is_err());
    }

    #[test]
    fn padding_counts_terminal_columns() {
        assert_eq!(pad("好き", 6), "好き  ");
        assert_eq!(pad("suki", 6), "suki  ");
        assert_eq!(pad("会いたい", 4), "会いたい");
    }

    #[test]
    fn markup_brackets_when_unstyled() {
        let segments = [Segment::plain("hontou ni "), Segment::marked("suki")];
        assert_eq!(markup(&segments, false), "hontou ni [suki]");
        assert_eq!(markup(&segments, true), "hontou ni **suki**");
    }

    #[test]
    fn banks_default_next_to_songs_dir() {
        let dir = default_banks_dir(Path::new("public/data/songs/aimer.yml"));
        assert_eq!(dir, PathBuf::from("public/data/word-banks"));
    }
}
