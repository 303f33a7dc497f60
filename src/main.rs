mod aggregator;
mod config;
mod grid;
mod model;
mod months;
mod normalizer;
mod output;
mod parsers;
mod pipeline;
mod report;
mod summary;

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use config::{MonthRequest, NormalizerConfig, RunConfig};
use crossbeam::channel::unbounded;
use memmap2::Mmap;
use months::YearMonth;
use normalizer::Normalizer;
use pipeline::{Dataset, MonthReport, ReportError};
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{error, info};
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_appender::rolling;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

static LOG_FILE_NAME: &str = "attendance_processor.log";

#[derive(Parser, Debug)]
#[command(author, version, about = "Monthly attendance reports from time-clock punches", long_about = None)]
struct Args {
    /// Input layout: `agl` (tab-separated clock export) or `csv`
    #[arg(short, long, default_value = "agl")]
    preset: String,

    /// `stdout`, `dir` (timestamped directory), a directory, or a .json/.jsonl/.xlsx file
    #[arg(short, long, default_value = "stdout")]
    output: String,

    /// Comma-separated YYYY-MM keys, or `all`
    #[arg(short, long)]
    months: Option<String>,

    /// Pick months from a menu (the default when --months is absent)
    #[arg(short, long, conflicts_with = "months")]
    interactive: bool,

    #[arg(value_name = "FILE", default_value = "AGL_0001.TXT")]
    file: PathBuf,

    #[arg(long)]
    stats: bool,

    /// Directory for attendance_processor.log
    #[arg(long, default_value = ".")]
    log_dir: PathBuf,
}

impl Args {
    fn into_config(self) -> RunConfig {
        // clap rejects --interactive together with --months
        let months = if self.interactive {
            MonthRequest::Interactive
        } else {
            MonthRequest::from_arg(self.months.as_deref())
        };
        RunConfig {
            preset: self.preset,
            input: self.file,
            output: self.output,
            months,
            stats: self.stats,
            normalizer: NormalizerConfig::default(),
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    // dropping the guard flushes the log file
    let (log_writer, _guard) = log_file_writer(&args.log_dir);
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(log_writer)
                .with_ansi(false)
                .with_target(false),
        )
        .init();

    let config = args.into_config();
    run(&config)
}

fn log_file_writer(log_dir: &Path) -> (NonBlocking, WorkerGuard) {
    let file_appender = rolling::never(log_dir, LOG_FILE_NAME);
    tracing_appender::non_blocking(file_appender)
}

fn run(config: &RunConfig) -> Result<()> {
    let start_time = Instant::now();
    info!("reading {}", config.input.display());

    let file = File::open(&config.input)
        .with_context(|| format!("File not found: '{}'", config.input.display()))?;
    let mmap = unsafe { Mmap::map(&file)? };
    let text = parsers::decode(&mmap);
    let loaded = parsers::parse(&config.preset, &text)?;
    info!(
        "raw records read: {} ({} malformed lines skipped)",
        loaded.records.len(),
        loaded.skipped_lines
    );

    let normalizer = Normalizer::new(config.normalizer.clone());
    let dataset = match Dataset::from_records(&loaded.records, loaded.skipped_lines, &normalizer) {
        Ok(dataset) => dataset,
        Err(ReportError::NoValidMonths) => {
            error!("no valid months found after parsing; no report produced");
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };
    info!(
        "{} events, {} employees, months: {}",
        dataset.events.len(),
        dataset.employee_count(),
        join_months(&dataset.months)
    );

    let selected = select_months(config, &dataset)?;
    if selected.is_empty() {
        info!("no months selected, no reports generated");
        return Ok(());
    }

    let reports = pipeline::build_reports(&dataset.events, &selected);
    let written = write_reports(&config.output, reports)?;

    if config.stats {
        print_run_stats(&dataset, written, start_time.elapsed());
    }
    Ok(())
}

fn select_months(config: &RunConfig, dataset: &Dataset) -> Result<Vec<YearMonth>> {
    match &config.months {
        MonthRequest::All => Ok(dataset.months.clone()),
        MonthRequest::Listed(keys) => {
            let selected = months::select_listed(keys, &dataset.months);
            if selected.is_empty() {
                error!(
                    "no valid months found in: {} (available: {})",
                    keys.join(","),
                    join_months(&dataset.months)
                );
            }
            Ok(selected)
        }
        MonthRequest::Interactive => {
            let overview = months::month_overview(&dataset.events);
            months::select_interactive(&overview, io::stdin().lock(), &mut io::stdout())
        }
    }
}

/// Hands reports to a dedicated writer thread, in order. Returns how many were written.
fn write_reports(output_arg: &str, reports: Vec<MonthReport>) -> Result<usize> {
    let mut writer = output::create_writer(output_arg)?;
    let (tx, rx) = unbounded::<MonthReport>();

    let writer_handle = std::thread::spawn(move || -> Result<usize> {
        let mut count = 0usize;
        for report in rx {
            writer.write_report(&report)?;
            info!("report written for {}", report.month.long_name());
            count += 1;
        }
        writer.finish()?;
        Ok(count)
    });

    for report in reports {
        // a closed channel means the writer failed; its error surfaces on join
        if tx.send(report).is_err() {
            break;
        }
    }
    drop(tx);

    writer_handle
        .join()
        .map_err(|_| anyhow!("report writer thread panicked"))?
}

fn join_months(months: &[YearMonth]) -> String {
    months.iter().map(|m| m.to_string()).collect::<Vec<_>>().join(", ")
}

fn print_run_stats(dataset: &Dataset, reports: usize, duration: Duration) {
    let duration_secs = duration.as_secs_f64();
    let total_rows = dataset.raw_records + dataset.skipped_lines;

    eprintln!("\n=== RUN STATISTICS ===");
    eprintln!("Raw rows: {}", total_rows);
    eprintln!("Malformed lines skipped: {}", dataset.skipped_lines);
    eprintln!("Unparsable date-times dropped: {}", dataset.dropped);
    eprintln!("Punch events: {}", dataset.events.len());
    eprintln!("Unknown direction: {}", dataset.unknown_direction);
    eprintln!("Employees: {}", dataset.employee_count());
    eprintln!("Months available: {}", dataset.months.len());
    eprintln!("Reports written: {}", reports);
    eprintln!("Processing time: {:.3}s", duration_secs);
    if total_rows > 0 {
        eprintln!(
            "Parse success rate: {:.1}%",
            (dataset.events.len() as f64 / total_rows as f64) * 100.0
        );
    }
}
