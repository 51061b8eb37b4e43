//! Jayhawk Worker Binary
//!
//! Runs the labor-hours worker, or (as `compute`) the computation child the
//! worker launches.

use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use jayhawk_config::{ConfigLoader, WorkerSettings};
use jayhawk_logging::init_logging_from_config;
use jayhawk_metrics::{parse_datetime, LaborHoursQuery, Period};
use jayhawk_web::os_shutdown_signal;
use jayhawk_worker::compute::{run_computation, write_rows};
use jayhawk_worker::WorkerRuntime;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the worker until it is told to stop (default)
    Serve {
        /// Control endpoint port, 0 for any free port
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Compute labor hours once and print them as JSON on stdout
    Compute(ComputeArgs),
    /// Print the effective configuration and exit
    PrintConfig,
}

#[derive(Args, Debug)]
struct ComputeArgs {
    #[arg(long)]
    repo_group_id: i64,

    #[arg(long)]
    repo_id: Option<i64>,

    /// Defaults to 1970-01-01 00:00:01
    #[arg(long, value_parser = parse_timestamp)]
    begin_date: Option<NaiveDateTime>,

    /// Defaults to now
    #[arg(long, value_parser = parse_timestamp)]
    end_date: Option<NaiveDateTime>,

    /// day, week, month or year
    #[arg(long, default_value = "month")]
    period: Period,

    /// Create the labor tables if missing
    #[arg(long)]
    init_schema: bool,

    #[arg(long)]
    pretty: bool,
}

impl ComputeArgs {
    fn query(&self) -> LaborHoursQuery {
        LaborHoursQuery {
            repo_group_id: self.repo_group_id,
            repo_id: self.repo_id,
            begin_date: self.begin_date,
            end_date: self.end_date,
            period: self.period,
        }
    }
}

fn parse_timestamp(value: &str) -> Result<NaiveDateTime, String> {
    parse_datetime(value).map_err(|e| e.to_string())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let settings = ConfigLoader::new()
        .load(cli.config.as_ref())
        .context("Failed to load configuration")?;

    // The control endpoint runs on a single dedicated thread
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to build tokio runtime")?;

    match cli.command {
        Some(Commands::PrintConfig) => {
            print!("{}", serde_yaml::to_string(&settings)?);
            Ok(())
        }
        Some(Commands::Compute(args)) => {
            init_logging_from_config(&settings.logging)?;
            runtime.block_on(compute(&settings, &args))
        }
        Some(Commands::Serve { port }) => {
            let mut settings = settings;
            if let Some(port) = port {
                settings.worker.port = port;
            }
            init_logging_from_config(&settings.logging)?;
            runtime.block_on(serve(settings, cli.config))
        }
        None => {
            init_logging_from_config(&settings.logging)?;
            runtime.block_on(serve(settings, cli.config))
        }
    }
}

async fn serve(settings: WorkerSettings, config_path: Option<PathBuf>) -> Result<()> {
    let worker = WorkerRuntime::bootstrap(&settings, config_path.as_deref())
        .await
        .context("Worker startup failed")?;

    let stop = worker.stop_signal();
    tokio::spawn(async move {
        os_shutdown_signal().await;
        stop.trigger();
    });

    // With the default termination policy this does not return
    let report = worker.run().await?;
    tracing::info!(deregistered = report.deregistered, "Worker finished");
    Ok(())
}

async fn compute(settings: &WorkerSettings, args: &ComputeArgs) -> Result<()> {
    let rows = run_computation(&settings.database, &args.query(), args.init_schema).await?;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    write_rows(&mut out, &rows, args.pretty).context("Failed to write rows")?;
    Ok(())
}
