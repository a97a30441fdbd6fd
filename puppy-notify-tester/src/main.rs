mod common;
mod logic;

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use std::fs::File;
use std::io::{BufWriter, Write, stdout};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::watch;

use common::{parse_date_arg, split_csv};
use logic::{LogicTester, SimulationConfig, SimulationResult, resolve_seed_inputs};
use puppy_notify::{
    HourlySchedule, HourlyWorker, JsonFileStore, LogSink, MessageCatalog, NotifierConfig,
    RotationEngine, SystemClock, WorkResult,
};

#[derive(Debug, Parser)]
#[command(name = "puppy-notify-tester", version = "0.1.0")]
#[command(about = "Simulate and check the Find My Puppy hourly reminder rotation")]
struct Args {
    /// First simulated day (YYYY-MM-DD or `today`)
    #[arg(long, default_value = "today")]
    start_date: String,

    /// Number of simulated days
    #[arg(long, default_value_t = 30)]
    days: u32,

    /// Reminder ticks per simulated day
    #[arg(long, default_value_t = 24)]
    ticks_per_day: u32,

    /// Shuffle seeds to run (comma-separated)
    #[arg(long, default_value = "1337")]
    seeds: String,

    /// Message catalog JSON (defaults to the built-in catalog)
    #[arg(long)]
    catalog: Option<PathBuf>,

    /// Notifier config JSON (defaults to built-in settings)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Persist state as JSON files under this directory instead of in memory
    #[arg(long)]
    store_dir: Option<PathBuf>,

    /// Output report format
    #[arg(long, default_value = "console")]
    #[arg(value_parser = ["json", "markdown", "console"])]
    report: String,

    /// Optional path to write the report output instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,

    /// List the catalog's festivals and exit
    #[arg(long)]
    list_festivals: bool,

    /// Run a single real tick against the persisted store and exit
    #[arg(long, conflicts_with = "live")]
    once: bool,

    /// Run the hourly schedule against the persisted store until Ctrl-C
    #[arg(long)]
    live: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let catalog = Arc::new(load_catalog(args.catalog.as_deref())?);
    let config = load_config(args.config.as_deref())?;

    if args.list_festivals {
        list_festivals(&args, &catalog)?;
        return Ok(());
    }

    announce_banner();

    if args.once || args.live {
        return run_live(&args, catalog, &config).await;
    }

    let start_time = Instant::now();
    let start_date = parse_date_arg(&args.start_date)?;
    let seeds = resolve_seed_inputs(&split_csv(&args.seeds))?;
    let base = SimulationConfig::new(seeds.first().copied().unwrap_or_default(), start_date)
        .with_days(args.days)
        .with_ticks_per_day(args.ticks_per_day);

    let tester = LogicTester::new(catalog, config.store_namespace.clone(), args.verbose)
        .with_store_dir(args.store_dir.clone());
    let results = tester.run_seeds(base, &seeds);

    write_reports(&args, &results, start_time)?;

    if results.iter().any(|r| !r.passed) {
        std::process::exit(1);
    }

    Ok(())
}

fn announce_banner() {
    println!("{}", "🐶 Find My Puppy Reminder Tester".bright_cyan().bold());
    println!("{}", "================================".cyan());
}

fn load_catalog(path: Option<&Path>) -> Result<MessageCatalog> {
    let Some(path) = path else {
        return Ok(MessageCatalog::builtin());
    };
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read catalog {}", path.display()))?;
    let catalog = MessageCatalog::from_json(&raw)
        .with_context(|| format!("invalid catalog {}", path.display()))?;
    for key in catalog.undated_festivals() {
        log::warn!("festival `{key}` has messages but no date");
    }
    Ok(catalog)
}

fn load_config(path: Option<&Path>) -> Result<NotifierConfig> {
    let Some(path) = path else {
        return Ok(NotifierConfig::default());
    };
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    NotifierConfig::from_json(&raw).with_context(|| format!("invalid config {}", path.display()))
}

fn list_festivals(args: &Args, catalog: &MessageCatalog) -> Result<()> {
    let mut output_target = OutputTarget::new(args.output.clone())?;
    writeln!(output_target.writer(), "Festivals:")?;
    for (key, date) in &catalog.festival_dates {
        let count = catalog.festive_messages(key).map_or(0, <[String]>::len);
        writeln!(output_target.writer(), "  {key:12} {date}  ({count} messages)")?;
    }
    output_target.flush_inner()?;
    Ok(())
}

async fn run_live(
    args: &Args,
    catalog: Arc<MessageCatalog>,
    config: &NotifierConfig,
) -> Result<()> {
    let dir = args.store_dir.clone().unwrap_or_else(|| PathBuf::from("."));
    let store = JsonFileStore::open(&dir, &config.store_namespace)
        .with_context(|| format!("failed to open store under {}", dir.display()))?;
    println!("Store: {}", store.path().display());

    let engine = Arc::new(RotationEngine::from_config(catalog, store, config));
    let worker = HourlyWorker::new(engine, SystemClock, LogSink, config);

    if args.once {
        return match worker.do_work() {
            WorkResult::Success => {
                println!("{}", "✅ Reminder delivered".green());
                Ok(())
            }
            WorkResult::Retry => anyhow::bail!("reminder tick asked for a retry"),
        };
    }

    let schedule = HourlySchedule::from_config(config);
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = shutdown_tx.send(true);
        }
    });

    println!(
        "Running `{}` every {:?}; press Ctrl-C to stop",
        schedule.unique_name, schedule.interval
    );
    let report = puppy_notify::run_schedule(&worker, &schedule, shutdown_rx).await;
    println!(
        "Stopped after {} ticks ({} attempts, {} retries)",
        report.ticks, report.attempts, report.retries
    );
    Ok(())
}

fn write_reports(args: &Args, results: &[SimulationResult], start_time: Instant) -> Result<()> {
    let mut output_target = OutputTarget::new(args.output.clone())?;

    match args.report.as_str() {
        "json" => logic::reports::generate_json_report(&mut output_target, results)?,
        "markdown" => logic::reports::generate_markdown_report(&mut output_target, results)?,
        _ => logic::reports::generate_console_report(
            &mut output_target,
            results,
            start_time.elapsed(),
        )?,
    }

    output_target.flush_inner()?;
    Ok(())
}

enum OutputTarget {
    Stdout(BufWriter<std::io::Stdout>),
    File(BufWriter<File>),
}

impl OutputTarget {
    fn new(path: Option<PathBuf>) -> Result<Self> {
        if let Some(path) = path {
            let file = File::create(&path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            Ok(Self::File(BufWriter::new(file)))
        } else {
            Ok(Self::Stdout(BufWriter::new(stdout())))
        }
    }

    fn writer(&mut self) -> &mut dyn Write {
        match self {
            Self::Stdout(w) => w,
            Self::File(w) => w,
        }
    }

    fn flush_inner(&mut self) -> std::io::Result<()> {
        match self {
            Self::Stdout(w) => w.flush(),
            Self::File(w) => w.flush(),
        }
    }
}

impl Write for OutputTarget {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.writer().write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.flush_inner()
    }
}
