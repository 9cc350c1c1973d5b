use std::fmt;
use std::path::PathBuf;

use listen_core::model::Tier;
use storage::import::import_seed;
use storage::repository::Storage;

#[derive(Debug, Clone)]
struct Args {
    db_url: String,
    file: Option<PathBuf>,
    force: bool,
}

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidDbUrl { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
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

impl Args {
    fn parse() -> Result<Self, ArgsError> {
        let mut db_url =
            std::env::var("LISTEN_DB_URL").unwrap_or_else(|_| "sqlite:listen.sqlite3?mode=rwc".into());
        let mut file = std::env::var("LISTEN_SEED_FILE").ok().map(PathBuf::from);
        let mut force = false;

        let mut args = std::env::args().skip(1);
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(&mut args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = value;
                }
                "--file" => {
                    file = Some(PathBuf::from(require_value(&mut args, "--file")?));
                }
                "--force" => force = true,
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(Self {
            db_url,
            file,
            force,
        })
    }
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p storage --bin seed -- [options]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --db <sqlite_url>         SQLite URL (default: sqlite:listen.sqlite3?mode=rwc)");
    eprintln!("  --file <path>             Seed JSON (default: bundled questions)");
    eprintln!("  --force                   Import even if questions already exist");
    eprintln!("  -h, --help                Show this help");
    eprintln!();
    eprintln!("Environment (same as flags):");
    eprintln!("  LISTEN_DB_URL, LISTEN_SEED_FILE");
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse().map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    let storage = Storage::sqlite(&args.db_url).await?;
    let report = import_seed(&storage, args.file.as_deref(), args.force).await?;

    if report.skipped {
        println!("{} already has questions; use --force to import again", args.db_url);
    } else {
        println!("Imported {} questions into {}", report.inserted, args.db_url);
    }
    for tier in Tier::ALL {
        let count = storage.content.get_questions(tier).await?.len();
        println!("  {tier}: {count}");
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}
