use std::fmt;

use chrono::{DateTime, Duration, Utc};
use exam_core::model::ExamKind;
use storage::history::{LegacyProgress, LegacyTopicProgress, legacy_keys};
use storage::repository::Storage;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone)]
struct Args {
    db_url: String,
    exam: ExamKind,
    topics: u32,
    now: Option<DateTime<Utc>>,
    migrate: bool,
}

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidExam { raw: String },
    InvalidTopics { raw: String },
    InvalidDbUrl { raw: String },
    InvalidNow { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidExam { raw } => {
                write!(f, "invalid --exam value (expected ielts or toefl): {raw}")
            }
            ArgsError::InvalidTopics { raw } => write!(f, "invalid --topics value: {raw}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::InvalidNow { raw } => {
                write!(f, "invalid --now value (expected RFC3339): {raw}")
            }
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

fn parse_exam(raw: String) -> Result<ExamKind, ArgsError> {
    ExamKind::from_slug(raw.trim()).ok_or(ArgsError::InvalidExam { raw })
}

impl Args {
    fn parse() -> Result<Self, ArgsError> {
        let mut db_url =
            std::env::var("EXAM_DB_URL").unwrap_or_else(|_| "sqlite:dev.sqlite3".into());
        let mut exam = match std::env::var("EXAM_KIND") {
            Ok(raw) => parse_exam(raw)?,
            Err(_) => ExamKind::Ielts,
        };
        let mut topics = std::env::var("EXAM_TOPICS")
            .ok()
            .and_then(|value| value.parse::<u32>().ok())
            .unwrap_or(4);
        let mut now: Option<DateTime<Utc>> = None;
        let mut migrate = false;

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
                "--exam" => {
                    exam = parse_exam(require_value(&mut args, "--exam")?)?;
                }
                "--topics" => {
                    let value = require_value(&mut args, "--topics")?;
                    topics = value
                        .parse::<u32>()
                        .map_err(|_| ArgsError::InvalidTopics { raw: value.clone() })?;
                }
                "--now" => {
                    let value = require_value(&mut args, "--now")?;
                    let parsed = DateTime::parse_from_rfc3339(&value)
                        .map_err(|_| ArgsError::InvalidNow { raw: value.clone() })?
                        .with_timezone(&Utc);
                    now = Some(parsed);
                }
                "--migrate" => migrate = true,
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(Self {
            db_url,
            exam,
            topics,
            now,
            migrate,
        })
    }
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p storage --bin seed -- [options]");
    eprintln!();
    eprintln!("Writes legacy per-section practice progress so the history migration can be exercised.");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --db <sqlite_url>         SQLite URL (default: sqlite:dev.sqlite3)");
    eprintln!("  --exam <ielts|toefl>      Exam kind to seed (default: ielts)");
    eprintln!("  --topics <n>              Completed topics per section (default: 4)");
    eprintln!("  --now <rfc3339>           Fixed current time for deterministic seeding");
    eprintln!("  --migrate                 Run the history migration after seeding");
    eprintln!("  -h, --help                Show this help");
    eprintln!();
    eprintln!("Environment (same as flags):");
    eprintln!("  EXAM_DB_URL, EXAM_KIND, EXAM_TOPICS, RUST_LOG");
}

fn legacy_section(topics: u32, section_idx: usize, now: DateTime<Utc>) -> LegacyProgress {
    (0..topics)
        .map(|i| {
            let completed = i + 1 < topics || topics == 1;
            let days_ago = i64::from(i) * 2 + i64::try_from(section_idx).unwrap_or(0);
            let progress = LegacyTopicProgress {
                completed,
                score: 10 + i * 3,
                total: 40,
                completed_at: completed.then(|| now - Duration::days(days_ago)),
                time_spent: 1_200 + u64::from(i) * 60,
                ..LegacyTopicProgress::default()
            };
            (format!("topic-{}", i + 1), progress)
        })
        .collect()
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse().map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    let storage = Storage::sqlite(&args.db_url).await?;
    let now = args.now.unwrap_or_else(Utc::now);

    for (idx, key) in legacy_keys(args.exam).iter().enumerate() {
        let progress = legacy_section(args.topics, idx, now);
        storage.kv.set(key, &serde_json::to_string(&progress)?).await?;
        tracing::info!(key = %key, topics = progress.len(), "seeded legacy progress");
    }

    if args.migrate {
        let report = storage.history().migrate_old_format(args.exam).await?;
        println!(
            "Migrated {} attempts ({} keys skipped)",
            report.migrated,
            report.skipped_keys.len()
        );
    }

    println!(
        "Seeded {} topics per section for {} into {}",
        args.topics, args.exam, args.db_url
    );

    Ok(())
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}
