use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use listen_core::model::{HintOutcome, Tier};
use services::{
    AppServices, Clock, ListeningSessionService, ResetScope, RunnerState, SessionError,
    SessionRunner, SpeechOutput,
};
use storage::import::import_seed;
use storage::repository::ProgressionRepository;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const START_ATTEMPTS: u32 = 5;
const START_RETRY_DELAY: Duration = Duration::from_millis(1000);

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidTier { raw: String },
    InvalidDbUrl { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidTier { raw } => write!(f, "invalid --tier value: {raw}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
        }
    }
}

impl std::error::Error for ArgsError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

fn parse_tier(raw: String) -> Result<Tier, ArgsError> {
    raw.parse().map_err(|_| ArgsError::InvalidTier { raw })
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p app -- play       [--db <sqlite_url>] [--tier <tier>]");
    eprintln!("  cargo run -p app -- seed       [--db <sqlite_url>] [--file <path>] [--force]");
    eprintln!("  cargo run -p app -- reset-pool [--db <sqlite_url>] [--tier <tier> | --all]");
    eprintln!();
    eprintln!("Tiers: beginner, intermediate, advanced");
    eprintln!();
    eprintln!("Defaults:");
    eprintln!("  --db sqlite:listen.sqlite3");
    eprintln!("  --tier beginner");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  LISTEN_DB_URL, LISTEN_TIER, LISTEN_SEED_FILE, RUST_LOG");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Play,
    Seed,
    ResetPool,
}

impl Command {
    fn from_arg(arg: &str) -> Option<Self> {
        match arg {
            "play" => Some(Self::Play),
            "seed" => Some(Self::Seed),
            "reset-pool" => Some(Self::ResetPool),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
struct Args {
    db_url: String,
    tier: Tier,
    seed_file: Option<PathBuf>,
    force: bool,
    reset_all: bool,
}

impl Args {
    fn parse(cmd: Command, args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let mut db_url = normalize_sqlite_url(
            std::env::var("LISTEN_DB_URL").unwrap_or_else(|_| "sqlite:listen.sqlite3".into()),
        );
        let mut tier = match std::env::var("LISTEN_TIER") {
            Ok(raw) => parse_tier(raw)?,
            Err(_) => Tier::Beginner,
        };
        let mut seed_file = std::env::var("LISTEN_SEED_FILE").ok().map(PathBuf::from);
        let mut force = false;
        let mut reset_all = false;

        while let Some(arg) = args.next() {
            match (cmd, arg.as_str()) {
                (_, "--db") => {
                    let value = require_value(args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = normalize_sqlite_url(value);
                }
                (Command::Play | Command::ResetPool, "--tier") => {
                    tier = parse_tier(require_value(args, "--tier")?)?;
                }
                (Command::ResetPool, "--all") => reset_all = true,
                (Command::Seed, "--file") => {
                    seed_file = Some(PathBuf::from(require_value(args, "--file")?));
                }
                (Command::Seed, "--force") => force = true,
                (_, "--help" | "-h") => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(Self {
            db_url,
            tier,
            seed_file,
            force,
            reset_all,
        })
    }
}

fn normalize_sqlite_url(raw: String) -> String {
    if raw == "sqlite::memory:" || raw.starts_with("sqlite://") {
        return raw;
    }

    let trimmed = raw.trim();
    let path = std::path::Path::new(trimmed.strip_prefix("sqlite:").unwrap_or(trimmed));
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}

fn prepare_sqlite_file(db_url: &str) -> Result<(), Box<dyn std::error::Error>> {
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

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "app=info,services=info,storage=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

//
// ─── TERMINAL DRILL ────────────────────────────────────────────────────────────
//

/// Prints what a speech engine would say.
struct TerminalSpeech;

impl SpeechOutput for TerminalSpeech {
    fn speak(&self, text: &str, rate: f32) {
        println!("  ♪ [{rate:.1}x] {text}");
    }
}

type Input = Lines<BufReader<Stdin>>;

async fn read_line(input: &mut Input) -> Result<Option<String>, std::io::Error> {
    Ok(input.next_line().await?.map(|line| line.trim().to_string()))
}

/// Starts a session, retrying while the tier has no content.
async fn start_with_retry(
    sessions: &ListeningSessionService,
    tier: Tier,
) -> Result<SessionRunner, SessionError> {
    let mut attempt = 1;
    loop {
        match sessions.start_session(tier).await {
            Err(SessionError::EmptyContentPool { .. }) if attempt < START_ATTEMPTS => {
                tracing::warn!(%tier, attempt, "no content yet, retrying");
                tokio::time::sleep(START_RETRY_DELAY).await;
                attempt += 1;
            }
            other => return other,
        }
    }
}

fn print_board(runner: &SessionRunner) {
    let Some(board) = runner.board() else {
        return;
    };
    let options: Vec<String> = board
        .options()
        .iter()
        .enumerate()
        .map(|(i, token)| format!("{}:{token}", i + 1))
        .collect();
    println!("  options:  {}", options.join("  "));
    println!(
        "  answer:   [{}] {}/{}",
        board.selected().join(" "),
        board.selected().len(),
        board.answer_len()
    );
}

fn print_question(runner: &SessionRunner) {
    let Some(item) = runner.current_item() else {
        return;
    };
    let progress = runner.progress();
    println!();
    println!(
        "Question {}/{} ({}), mistakes {}, hints left {}",
        progress.answered + 1,
        progress.total,
        item.kind(),
        progress.mistakes,
        runner.difficulty().hints_remaining
    );
    if let Some(meaning) = item.meaning() {
        println!("  meaning:  {meaning}");
    }
}

/// Drives one session from the terminal. Returns `false` if the learner quit.
async fn drill(
    sessions: &ListeningSessionService,
    runner: &mut SessionRunner,
    input: &mut Input,
) -> Result<bool, Box<dyn std::error::Error>> {
    while !runner.is_complete() {
        if let RunnerState::AwaitingAnswer { .. } = runner.state() {
            print_question(runner);
            sessions.play_prompt(runner)?;
        }

        while let RunnerState::AwaitingAnswer { .. } = runner.state() {
            print_board(runner);
            print!("> ");
            std::io::Write::flush(&mut std::io::stdout())?;
            let Some(line) = read_line(input).await? else {
                return Ok(false);
            };

            let mut parts = line.split_whitespace();
            match (parts.next(), parts.next()) {
                (Some("q"), _) => return Ok(false),
                (Some("p"), _) => sessions.play_prompt(runner)?,
                (Some("h"), _) => {
                    if sessions.request_hint(runner)? == HintOutcome::Exhausted {
                        println!("  no hints left (r: watch a reward to refill)");
                    }
                }
                (Some("r"), _) => {
                    sessions.grant_hint_recovery(runner)?;
                    println!("  hints refilled");
                }
                (Some("u"), _) => {
                    runner.remove_last_token()?;
                }
                (Some("x"), Some(n)) => match n.parse::<usize>() {
                    Ok(pos) if pos > 0 => {
                        if let Err(err) = runner.remove_token_at(pos - 1) {
                            println!("  {err}");
                        }
                    }
                    _ => println!("  usage: x <position>"),
                },
                (Some(n), None) => {
                    let token = n
                        .parse::<usize>()
                        .ok()
                        .and_then(|i| i.checked_sub(1))
                        .and_then(|i| runner.board()?.options().get(i).cloned());
                    let Some(token) = token else {
                        println!("  pick an option number, or h/p/r/u/x N/q");
                        continue;
                    };
                    if let Some(outcome) = runner.select_token(&token)? {
                        if outcome.was_correct {
                            println!("  ✓ correct ({:.1}x)", outcome.difficulty.playback_rate());
                        } else {
                            println!(
                                "  ✗ expected: {} ({:.1}x)",
                                outcome.expected.join(" "),
                                outcome.difficulty.playback_rate()
                            );
                        }
                    }
                }
                _ => println!("  pick an option number, or h/p/r/u/x N/q"),
            }
        }

        if let RunnerState::ShowingResult { .. } = runner.state() {
            print!("  (enter to continue) ");
            std::io::Write::flush(&mut std::io::stdout())?;
            if read_line(input).await?.is_none() {
                return Ok(false);
            }
            sessions.advance(runner).await?;
        }
    }
    Ok(true)
}

async fn play(services: &AppServices, tier: Tier) -> Result<(), Box<dyn std::error::Error>> {
    let report = services.ensure_seeded().await?;
    if !report.skipped {
        println!("Imported {} bundled questions", report.inserted);
    }

    let progress = services.storage().progression.get_progress(tier).await?;
    if !progress.unlocked {
        println!("{tier} is locked; pass the previous tier first");
        return Ok(());
    }

    let sessions = services.sessions();
    let rank = sessions.learner_rank().await?;
    println!("Rank {} ({}), tier {tier}", rank.value(), rank.title());

    let mut runner = start_with_retry(&sessions, tier).await?;
    let mut input = BufReader::new(tokio::io::stdin()).lines();

    if !drill(&sessions, &mut runner, &mut input).await? {
        println!("Session abandoned");
        return Ok(());
    }

    let Some(result) = runner.result() else {
        return Ok(());
    };
    println!();
    println!(
        "{}/{} correct, {} star(s), +{} XP, {}",
        result.correct_count,
        result.total_questions,
        result.stars.value(),
        result.xp_earned,
        if result.passed { "passed" } else { "not passed" }
    );
    if let (true, Some(next)) = (result.passed, tier.next()) {
        println!("{next} unlocked");
    }
    Ok(())
}

async fn reset_pool(
    services: &AppServices,
    tier: Tier,
    all: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    services.ensure_seeded().await?;
    let sessions = services.sessions();
    let pool = services.pool();

    // Serve one session so there is history to clear.
    let _ = start_with_retry(&sessions, tier).await?;
    println!("{tier}: {} of {} questions seen", pool.seen_count(tier), pool.size(tier));

    let scope = if all {
        ResetScope::All
    } else {
        ResetScope::Tier(tier)
    };
    sessions.reset_seen(scope);
    println!("{tier}: {} of {} questions seen after reset", pool.seen_count(tier), pool.size(tier));
    Ok(())
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut argv: Vec<String> = std::env::args().skip(1).collect();

    // No subcommand means play.
    let cmd = match argv.first().map(String::as_str) {
        None => Command::Play,
        Some("--help" | "-h") => {
            print_usage();
            return Ok(());
        }
        Some(first) if first.starts_with("--") => Command::Play,
        Some(first) => Command::from_arg(first).ok_or_else(|| {
            eprintln!("unknown subcommand: {first}");
            print_usage();
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "unknown subcommand")
        })?,
    };
    if argv.first().is_some_and(|first| !first.starts_with("--")) {
        argv.remove(0);
    }

    let mut iter = argv.into_iter();
    let parsed = Args::parse(cmd, &mut iter).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    init_tracing();

    // Open + migrate SQLite here so the library crates stay free of file handling.
    prepare_sqlite_file(&parsed.db_url)?;
    let services =
        AppServices::new_sqlite(&parsed.db_url, Clock::default(), Arc::new(TerminalSpeech))
            .await?;

    match cmd {
        Command::Play => play(&services, parsed.tier).await,
        Command::Seed => {
            let report = import_seed(
                services.storage(),
                parsed.seed_file.as_deref(),
                parsed.force,
            )
            .await?;
            if report.skipped {
                println!("questions already present; use --force to import again");
            } else {
                println!("Imported {} questions", report.inserted);
            }
            Ok(())
        }
        Command::ResetPool => reset_pool(&services, parsed.tier, parsed.reset_all).await,
    }
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}
