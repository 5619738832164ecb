//! jobrun CLI - runs serialized jobs synchronously with the bundled variants

mod jobs;
mod logging;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use jobrun_core::application::Executor;
use jobrun_core::domain::{ArgumentStore, JobData, JobError};
use jobrun_core::{KernelConfig, PerformOutcome};
use logging::LogFormat;
use serde::Serialize;
use serde_json::Value;
use std::io::Read;
use std::path::PathBuf;
use tabled::{Table, Tabled};
use tracing::info;

#[derive(Parser)]
#[command(name = "jobrun")]
#[command(about = "Run jobs synchronously", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log format (logs are written to stderr)
    #[arg(long, value_enum, env = "JOBRUN_LOG_FORMAT", default_value = "pretty")]
    log_format: LogFormat,

    /// Kernel config file (JSON); env vars are used when absent
    #[arg(long, env = "JOBRUN_CONFIG")]
    config: Option<PathBuf>,

    /// Result format on stdout
    #[arg(long, value_enum, default_value = "text")]
    output: OutputFormat,
}

#[derive(Subcommand)]
enum Commands {
    /// Execute serialized job data (one object or an array), "-" for stdin
    Run {
        /// Path to a JSON file
        input: String,
    },

    /// Instantiate a job and perform it immediately
    Perform {
        /// Job class (e.g., EchoJob, SumJob)
        job_class: String,

        /// Arguments as a JSON array
        #[arg(long, default_value = "[]")]
        args: String,
    },

    /// List registered job classes
    Classes,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

/// One line of output per job
#[derive(Debug, Serialize)]
struct JobReport {
    job_id: String,
    job_class: String,
    outcome: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl JobReport {
    fn new(job_id: &str, job_class: &str, result: &Result<PerformOutcome, JobError>) -> Self {
        let (outcome, error) = match result {
            Ok(PerformOutcome::Rescued(err)) => ("rescued", Some(err.to_string())),
            Ok(outcome) => (outcome.as_str(), None),
            Err(err) => ("failed", Some(err.to_string())),
        };
        Self {
            job_id: job_id.to_string(),
            job_class: job_class.to_string(),
            outcome,
            error,
        }
    }

    fn failed(&self) -> bool {
        self.outcome == "failed"
    }

    fn print(&self, format: OutputFormat) -> Result<()> {
        match format {
            OutputFormat::Json => println!("{}", serde_json::to_string(self)?),
            OutputFormat::Text => {
                let status = match self.outcome {
                    "completed" => "✓ completed".green(),
                    "halted" => "○ halted".yellow(),
                    "rescued" => "↺ rescued".cyan(),
                    other => format!("✗ {}", other).red(),
                };
                print!("{} {} ({})", status.bold(), self.job_class, self.job_id);
                match &self.error {
                    Some(error) => println!(": {}", error),
                    None => println!(),
                }
            }
        }
        Ok(())
    }
}

#[derive(Tabled)]
struct ClassRow {
    job_class: String,
    hooks: usize,
    rescue_handlers: usize,
}

fn load_config(path: Option<&PathBuf>) -> Result<KernelConfig> {
    match path {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config {}", path.display()))?;
            KernelConfig::from_json(&raw).context("Invalid config file")
        }
        None => KernelConfig::from_env().context("Invalid environment configuration"),
    }
}

fn read_input(input: &str) -> Result<String> {
    if input == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read stdin")?;
        return Ok(buf);
    }
    std::fs::read_to_string(input).with_context(|| format!("Failed to read {}", input))
}

fn parse_job_data(raw: &str) -> Result<Vec<JobData>> {
    let value: Value = serde_json::from_str(raw).context("Input is not valid JSON")?;
    let items = match value {
        Value::Array(items) => items,
        other => vec![other],
    };
    items
        .into_iter()
        .map(|item| serde_json::from_value(item).context("Invalid job data"))
        .collect()
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // 1. Initialize logging
    logging::init_logging(cli.log_format)?;
    info!("jobrun v{} starting...", jobrun_core::VERSION);

    // 2. Load configuration
    let config = load_config(cli.config.as_ref())?;

    // 3. Wire variants (composition root)
    let registry = jobs::registry(&config);

    match cli.command {
        Commands::Classes => {
            let rows: Vec<ClassRow> = registry
                .job_classes()
                .into_iter()
                .filter_map(|class| {
                    registry.kernel(class).map(|kernel| ClassRow {
                        job_class: class.to_string(),
                        hooks: kernel.callbacks().len(),
                        rescue_handlers: kernel.rescues().len(),
                    })
                })
                .collect();
            println!("{}", Table::new(rows));
        }

        Commands::Run { input } => {
            let executor = Executor::from(registry);
            let payloads = parse_job_data(&read_input(&input)?)?;

            let mut failures = 0;
            for data in payloads {
                let (job_id, job_class) = (data.job_id.clone(), data.job_class.clone());
                let result = executor.execute(data);
                let report = JobReport::new(&job_id, &job_class, &result);
                if report.failed() {
                    failures += 1;
                }
                report.print(cli.output)?;
            }

            if failures > 0 {
                anyhow::bail!("{} job(s) failed", failures);
            }
        }

        Commands::Perform { job_class, args } => {
            let raw: Value = serde_json::from_str(&args).context("Invalid JSON arguments")?;
            let mut store = ArgumentStore::serialized(raw);
            let arguments = store.materialize()?.to_vec();

            let executor = Executor::from(registry);
            let job_id = executor.next_job_id();
            let result = executor.perform_now_as(job_id.clone(), &job_class, arguments);
            let report = JobReport::new(&job_id, &job_class, &result);
            report.print(cli.output)?;

            if report.failed() {
                anyhow::bail!("job failed");
            }
        }
    }

    Ok(())
}
