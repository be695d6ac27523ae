use crate::demo::{run_demo, DemoArgs};
use crate::fixtures::{load_fixture, MatchFixture, ReliabilityFixture};
use crate::infra::{adhoc_service, parse_timestamp, print_json, write_json};
use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand};
use cleanflow::config::AppConfig;
use cleanflow::error::AppError;
use cleanflow::telemetry;
use cleanflow::workflows::booking::{billable_minutes, worked_minutes, Job, JobId, UserRef};
use cleanflow::workflows::matching::{MatchResult, MatchingEngine};
use cleanflow::workflows::reliability::ReliabilityEngine;
use std::io::{self, Write};
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
#[command(
    name = "cleanflow",
    about = "Inspect the job lifecycle, reliability, and matching engines from the command line",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run an end-to-end demo over in-memory storage (default command)
    Demo(DemoArgs),
    /// Rank a cleaner pool described by a JSON fixture
    Match(MatchArgs),
    /// Compute a reliability snapshot from a JSON history fixture
    Reliability(ReliabilityArgs),
    /// Show worked and billable minutes for a clock-in/clock-out pair
    Billing(BillingArgs),
}

impl Command {
    fn name(&self) -> &'static str {
        match self {
            Self::Demo(_) => "demo",
            Self::Match(_) => "match",
            Self::Reliability(_) => "reliability",
            Self::Billing(_) => "billing",
        }
    }
}

#[derive(Args, Debug)]
pub(crate) struct MatchArgs {
    /// Path to the match fixture
    #[arg(long)]
    pub(crate) fixture: PathBuf,
    /// Number of candidates to return (primary plus fallbacks)
    #[arg(long)]
    pub(crate) limit: Option<usize>,
}

#[derive(Args, Debug)]
pub(crate) struct ReliabilityArgs {
    /// Path to the history fixture
    #[arg(long)]
    pub(crate) fixture: PathBuf,
    /// Evaluation instant (RFC 3339). Defaults to the fixture's value, then now.
    #[arg(long, value_parser = parse_timestamp)]
    pub(crate) now: Option<DateTime<Utc>>,
}

#[derive(Args, Debug)]
pub(crate) struct BillingArgs {
    /// Clock-in time (RFC 3339)
    #[arg(long, value_parser = parse_timestamp)]
    pub(crate) start: DateTime<Utc>,
    /// Clock-out time (RFC 3339)
    #[arg(long, value_parser = parse_timestamp)]
    pub(crate) end: DateTime<Utc>,
    /// Contracted maximum billable minutes
    #[arg(long)]
    pub(crate) cap: Option<u32>,
}

pub(crate) fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;

    let command = cli
        .command
        .unwrap_or_else(|| Command::Demo(DemoArgs::default()));
    info!(?config.environment, command = command.name(), "cleanflow cli ready");

    match command {
        Command::Demo(args) => run_demo(args, &config),
        Command::Match(args) => run_match(args, &config),
        Command::Reliability(args) => run_reliability(args, &config),
        Command::Billing(args) => run_billing(args),
    }
}

fn run_match(args: MatchArgs, config: &AppConfig) -> Result<(), AppError> {
    let fixture: MatchFixture = load_fixture(&args.fixture)?;
    let matching = config.engines.matching_config()?;
    let limit = args.limit.unwrap_or(matching.default_limit);
    let engine = MatchingEngine::new(matching)?;

    let context = fixture.context();
    let result = engine.rank(&fixture.request, &fixture.pool, &context, limit);
    report_match(&result, &mut io::stdout().lock(), &mut io::stderr().lock())
}

/// JSON goes to `out`; the empty-result notice goes to `notices` so `out` stays parseable.
fn report_match<O: Write, N: Write>(
    result: &MatchResult,
    out: &mut O,
    notices: &mut N,
) -> Result<(), AppError> {
    if result.is_empty() {
        info!("no cleaners matched");
        writeln!(notices, "No cleaners available, try adjusting filters")?;
    }
    write_json(out, result)
}

fn run_reliability(args: ReliabilityArgs, config: &AppConfig) -> Result<(), AppError> {
    let fixture: ReliabilityFixture = load_fixture(&args.fixture)?;
    let now = args.now.or(fixture.now).unwrap_or_else(Utc::now);
    let engine = ReliabilityEngine::new(config.engines.reliability_config()?)?;

    let history = fixture.history();
    let snapshot = engine.compute(&fixture.cleaner, &history, now);
    print_json(&snapshot)
}

fn run_billing(args: BillingArgs) -> Result<(), AppError> {
    let mut job = Job::new(
        JobId("adhoc".to_string()),
        UserRef::new("billing@cleanflow.local"),
        adhoc_service(args.start),
        args.start,
    )
    .with_billing_cap(args.cap, None);
    job.timeline.start_at = Some(args.start);
    job.timeline.end_at = Some(args.end);

    let describe = |minutes: Option<u32>| match minutes {
        Some(minutes) => minutes.to_string(),
        None => "none (end is not after start)".to_string(),
    };
    println!("worked minutes:   {}", describe(worked_minutes(&job)));
    println!("billable minutes: {}", describe(billable_minutes(&job)));
    Ok(())
}
