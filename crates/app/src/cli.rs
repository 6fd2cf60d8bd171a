use std::fmt;
use std::path::PathBuf;

use services::QuizKind;

pub const DEFAULT_DB_URL: &str = "sqlite://quiz.sqlite3";
pub const DEFAULT_BANK_PATH: &str = "data/questions.json";

#[derive(Debug, PartialEq, Eq)]
pub enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    UnknownCommand(String),
    InvalidCount { raw: String },
    InvalidDbUrl { raw: String },
    MissingWeightArgs,
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::UnknownCommand(cmd) => write!(f, "unknown command: {cmd}"),
            ArgsError::InvalidCount { raw } => {
                write!(f, "invalid --count value: {raw} (expected a positive number)")
            }
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::MissingWeightArgs => {
                write!(f, "usage: weights show | weights set <field> <value> | weights reset")
            }
        }
    }
}

impl std::error::Error for ArgsError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WeightsCommand {
    Show,
    Set { field: String, value: String },
    Reset,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Stats,
    Play(QuizKind),
    Speed,
    Arcade,
    Reset,
    Weights(WeightsCommand),
    Help,
}

impl Command {
    fn from_arg(arg: &str) -> Option<Self> {
        match arg {
            "stats" => Some(Self::Stats),
            "quiz" => Some(Self::Play(QuizKind::MultipleChoice)),
            "flashcards" => Some(Self::Play(QuizKind::Flashcards)),
            "type" => Some(Self::Play(QuizKind::TypedAnswer)),
            "weak" => Some(Self::Play(QuizKind::WeakSpot)),
            "speed" => Some(Self::Speed),
            "arcade" => Some(Self::Arcade),
            "reset" => Some(Self::Reset),
            "weights" => Some(Self::Weights(WeightsCommand::Show)),
            "help" => Some(Self::Help),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Args {
    pub command: Command,
    pub db_url: String,
    pub bank_path: PathBuf,
    pub count: Option<usize>,
    pub fresh: bool,
}

/// Environment fallbacks for the flags.
#[derive(Debug, Clone, Default)]
pub struct Env {
    pub db_url: Option<String>,
    pub bank_path: Option<String>,
    pub session_size: Option<String>,
}

impl Env {
    pub fn from_process() -> Self {
        Self {
            db_url: std::env::var("QUIZ_DB_URL").ok(),
            bank_path: std::env::var("QUIZ_BANK_PATH").ok(),
            session_size: std::env::var("QUIZ_SESSION_SIZE").ok(),
        }
    }
}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

fn parse_count(raw: &str) -> Option<usize> {
    raw.trim().parse::<usize>().ok().filter(|n| *n > 0)
}

impl Args {
    /// Parse `argv` (program name already stripped).
    ///
    /// The first non-flag argument names the command; `stats` is the default.
    pub fn parse(argv: impl IntoIterator<Item = String>, env: &Env) -> Result<Self, ArgsError> {
        let mut db_url = env
            .db_url
            .clone()
            .map_or_else(|| DEFAULT_DB_URL.to_owned(), normalize_sqlite_url);
        let mut bank_path = PathBuf::from(
            env.bank_path
                .clone()
                .unwrap_or_else(|| DEFAULT_BANK_PATH.to_owned()),
        );
        let mut count = env.session_size.as_deref().and_then(parse_count);
        let mut fresh = false;
        let mut command = None;
        let mut positional = Vec::new();

        let mut args = argv.into_iter();
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(&mut args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = normalize_sqlite_url(value);
                }
                "--bank" => bank_path = PathBuf::from(require_value(&mut args, "--bank")?),
                "--count" => {
                    let value = require_value(&mut args, "--count")?;
                    count = Some(
                        parse_count(&value).ok_or(ArgsError::InvalidCount { raw: value.clone() })?,
                    );
                }
                "--fresh" => fresh = true,
                "--help" | "-h" => command = Some(Command::Help),
                flag if flag.starts_with("--") => return Err(ArgsError::UnknownArg(arg)),
                _ if command.is_none() => {
                    command = Some(
                        Command::from_arg(&arg).ok_or(ArgsError::UnknownCommand(arg.clone()))?,
                    );
                }
                _ => positional.push(arg),
            }
        }

        let command = match command.unwrap_or(Command::Stats) {
            Command::Weights(_) => Command::Weights(parse_weights(positional)?),
            other => {
                if let Some(extra) = positional.into_iter().next() {
                    return Err(ArgsError::UnknownArg(extra));
                }
                other
            }
        };

        Ok(Self {
            command,
            db_url,
            bank_path,
            count,
            fresh,
        })
    }
}

fn parse_weights(positional: Vec<String>) -> Result<WeightsCommand, ArgsError> {
    let mut rest = positional.into_iter();
    match rest.next().as_deref() {
        None | Some("show") => Ok(WeightsCommand::Show),
        Some("reset") => Ok(WeightsCommand::Reset),
        Some("set") => {
            let field = rest.next().ok_or(ArgsError::MissingWeightArgs)?;
            let value = rest.next().ok_or(ArgsError::MissingWeightArgs)?;
            Ok(WeightsCommand::Set { field, value })
        }
        Some(_) => Err(ArgsError::MissingWeightArgs),
    }
}

pub fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p app -- [command] [--db <sqlite_url>] [--bank <path>] [--count <n>] [--fresh]");
    eprintln!();
    eprintln!("Commands:");
    eprintln!("  stats        progress dashboard (default)");
    eprintln!("  quiz         multiple choice");
    eprintln!("  flashcards   flip and self-grade");
    eprintln!("  type         type the answer");
    eprintln!("  weak         drill questions that need practice");
    eprintln!("  speed        60-second speed round");
    eprintln!("  arcade       endless run, one mistake ends it");
    eprintln!("  reset        forget all progress");
    eprintln!("  weights [show | set <field> <value> | reset]");
    eprintln!();
    eprintln!("Defaults:");
    eprintln!("  --db {DEFAULT_DB_URL}");
    eprintln!("  --bank {DEFAULT_BANK_PATH}");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  QUIZ_DB_URL, QUIZ_BANK_PATH, QUIZ_SESSION_SIZE, RUST_LOG");
}

pub fn normalize_sqlite_url(raw: String) -> String {
    if raw == "sqlite::memory:" || raw.starts_with("sqlite://") {
        return raw;
    }

    let trimmed = raw.trim().to_string();
    let path_str = trimmed
        .strip_prefix("sqlite:")
        .unwrap_or(trimmed.as_str())
        .to_string();
    let path = std::path::Path::new(&path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}

/// Make sure the database file (and its directory) exists before connecting.
pub fn prepare_sqlite_file(db_url: &str) -> Result<(), Box<dyn std::error::Error>> {
    if db_url == "sqlite::memory:" {
        return Ok(());
    }

    let path = db_url
        .strip_prefix("sqlite://")
        .ok_or_else(|| ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        })?;
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() {
        return Err(ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        }
        .into());
    }

    let path = std::path::Path::new(path);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    if !path.exists() {
        std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(path)?;
    }

    Ok(())
}
