use clap::Parser;
use std::fmt::{Debug, Formatter};
use std::fs;
use std::path::PathBuf;

use rebus_core::dictionary::{Dictionary, DictionarySource};
use rebus_core::generator::{Generator, GeneratorConfig};
use rebus_core::placer::{BlockerConfig, BlockerSpec};
use rebus_core::theme::{StaticBucketProvider, ThemeProvider, UserListProvider};
use rebus_core::types::Difficulty;

/// rebus: command-line barred-crossword generation tool
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Grid height in cells
    #[arg(long)]
    height: usize,

    /// Grid width in cells
    #[arg(long)]
    width: usize,

    /// Path to the dictionary TSV (surface/frequency/flags columns)
    #[arg(long)]
    dictionary: PathBuf,

    /// Difficulty tier (EASY, MEDIUM, HARD)
    #[arg(long, default_value = "MEDIUM")]
    difficulty: String,

    /// Theme bucket to draw placeholder words from
    #[arg(long)]
    theme: Option<String>,

    /// Comma-separated user theme words, placed verbatim
    #[arg(long, value_delimiter = ',')]
    theme_words: Vec<String>,

    /// Skip the minimum-theme-coverage check (implied by --theme-words)
    #[arg(long)]
    words_only: bool,

    /// Random seed for reproducibility
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// Target language tag recorded in the output
    #[arg(long, default_value = "Romanian")]
    language: String,

    /// Disable the blocker zone
    #[arg(long)]
    no_blocker: bool,

    /// Pin the blocker zone height (rows)
    #[arg(long)]
    blocker_height: Option<usize>,

    /// Pin the blocker zone width (columns)
    #[arg(long)]
    blocker_width: Option<usize>,

    /// Pin the blocker zone start row
    #[arg(long)]
    blocker_row: Option<usize>,

    /// Pin the blocker zone start column
    #[arg(long)]
    blocker_col: Option<usize>,

    /// Generation attempts before giving up
    #[arg(long, default_value_t = 12)]
    max_attempts: usize,

    /// Fill solver deadline in milliseconds
    #[arg(long, default_value_t = 30_000)]
    solver_timeout_ms: u64,

    /// Fill solver worker count
    #[arg(long, default_value_t = 4)]
    solver_workers: usize,

    /// Target fill ratio in (0, 1]
    #[arg(long, default_value_t = 1.0)]
    completion_target: f32,

    /// Keep EASY mode strict instead of relaxing after failed attempts
    #[arg(long)]
    no_relax: bool,

    /// Write the sealed puzzle JSON here instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,
}

struct Error(String);

impl Debug for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0) // Print error unquoted
    }
}

fn main() -> Result<(), Error> {
    env_logger::init();
    let args = Args::parse();

    let difficulty: Difficulty = args
        .difficulty
        .parse()
        .map_err(|e: String| Error(e))?;

    let blocker = if args.no_blocker {
        if args.blocker_height.is_some()
            || args.blocker_width.is_some()
            || args.blocker_row.is_some()
            || args.blocker_col.is_some()
        {
            return Err(Error(
                "--no-blocker cannot be combined with blocker overrides".into(),
            ));
        }
        BlockerConfig::None
    } else {
        match (args.blocker_height, args.blocker_width) {
            (Some(height), Some(width)) => BlockerConfig::Pinned(BlockerSpec {
                height,
                width,
                row: args.blocker_row,
                col: args.blocker_col,
            }),
            (None, None) => {
                if args.blocker_row.is_some() || args.blocker_col.is_some() {
                    return Err(Error(
                        "blocker position overrides require --blocker-height and --blocker-width"
                            .into(),
                    ));
                }
                BlockerConfig::Random
            }
            _ => {
                return Err(Error(
                    "--blocker-height and --blocker-width must be given together".into(),
                ))
            }
        }
    };

    let dictionary = Dictionary::load(DictionarySource::File(args.dictionary))
        .map_err(|e| Error(e.to_string()))?;
    for row_error in dictionary.row_errors().iter().take(5) {
        eprintln!("dictionary line {}: {}", row_error.line, row_error.reason);
    }

    let words_only = args.words_only || !args.theme_words.is_empty();
    let theme_provider: Box<dyn ThemeProvider> = if !args.theme_words.is_empty() {
        Box::new(UserListProvider::new(&args.theme_words))
    } else if let Some(theme) = &args.theme {
        Box::new(StaticBucketProvider::new(theme, difficulty, args.seed))
    } else {
        Box::new(rebus_core::theme::EmptyThemeProvider)
    };

    let config = GeneratorConfig {
        height: args.height,
        width: args.width,
        difficulty,
        language: args.language,
        seed: args.seed,
        completion_target: args.completion_target,
        blocker,
        max_attempts: args.max_attempts,
        solver_timeout_ms: args.solver_timeout_ms,
        solver_workers: args.solver_workers,
        allow_phase2: !args.no_relax,
        words_only,
    };

    let puzzle = Generator::new(config, &dictionary)
        .with_theme_provider(theme_provider)
        .generate()
        .map_err(|e| Error(e.to_string()))?;

    let json = serde_json::to_string_pretty(&puzzle).map_err(|e| Error(e.to_string()))?;
    match args.output {
        Some(path) => fs::write(&path, json)
            .map_err(|_| Error(format!("couldn't write {}", path.display())))?,
        None => println!("{json}"),
    }

    Ok(())
}
