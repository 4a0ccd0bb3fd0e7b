use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::fs::File;
use std::io::{self, BufReader, BufWriter};
use std::path::Path;

use crate::application::{RunReport, SynthesisConfig, SynthesisService, TransactionFilter};
use crate::domain::DegenerateDrawPolicy;
use crate::io::{Exporter, ForecastImporter, ImportOptions};
use crate::logging::init_tracing;

/// txsynth - synthetic transactions from daily forecasts
#[derive(Parser)]
#[command(name = "txsynth")]
#[command(about = "Synthesize individual transactions from daily count and value forecasts")]
#[command(version)]
pub struct Cli {
    /// Database file path
    #[arg(short, long, default_value = "txsynth.db")]
    pub database: String,

    /// JSON configuration file (defaults apply when omitted)
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new database
    Init,

    /// Load a forecast CSV into the forecast collections
    ImportForecast {
        /// Input file (stdin if omitted)
        #[arg(short, long)]
        input: Option<String>,

        /// Validate without importing
        #[arg(long)]
        dry_run: bool,
    },

    /// Synthesize transactions and replace the output collection
    Synthesize {
        /// RNG seed for a reproducible run
        #[arg(long)]
        seed: Option<u64>,

        /// Number of forecast days to synthesize
        #[arg(long)]
        horizon: Option<usize>,

        /// Added to the count forecast before scaling
        #[arg(long, allow_hyphen_values = true)]
        add_count: Option<f64>,

        /// Multiplies the count forecast
        #[arg(long, allow_hyphen_values = true)]
        mul_count: Option<f64>,

        /// Added to the value forecast before scaling
        #[arg(long, allow_hyphen_values = true)]
        add_value: Option<f64>,

        /// Multiplies the value forecast
        #[arg(long, allow_hyphen_values = true)]
        mul_value: Option<f64>,

        /// What a day does when its total runs out before its count: fail, zero
        #[arg(long, value_parser = parse_degenerate_policy)]
        degenerate: Option<DegenerateDrawPolicy>,

        /// Show what would be written without touching the output collection
        #[arg(long)]
        dry_run: bool,
    },

    /// List stored synthetic transactions
    Transactions {
        /// Only transactions on this date (YYYY-MM-DD)
        #[arg(long)]
        date: Option<String>,

        /// Maximum number of transactions to show
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Per-day totals of stored synthetic transactions
    Summary,

    /// Document counts per collection
    Status,

    /// Export synthetic transactions to CSV or JSON
    Export {
        /// What to export: transactions, daily
        #[arg(default_value = "transactions")]
        export_type: String,

        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<String>,

        /// Format: csv, json (json only for transactions)
        #[arg(short, long, default_value = "csv")]
        format: String,
    },
}

impl Cli {
    fn load_config(&self) -> Result<SynthesisConfig> {
        match &self.config {
            Some(path) => Ok(SynthesisConfig::load(Path::new(path))?),
            None => Ok(SynthesisConfig::default()),
        }
    }

    pub async fn run(self) -> Result<()> {
        init_tracing(self.verbose);
        let mut config = self.load_config()?;

        match self.command {
            Commands::Init => {
                SynthesisService::init(&self.database, config).await?;
                println!("Database initialized: {}", self.database);
            }

            Commands::ImportForecast { input, dry_run } => {
                let service = SynthesisService::connect(&self.database, config).await?;
                run_import_command(&service, input.as_deref(), dry_run).await?;
            }

            Commands::Synthesize {
                seed,
                horizon,
                add_count,
                mul_count,
                add_value,
                mul_value,
                degenerate,
                dry_run,
            } => {
                if seed.is_some() {
                    config.seed = seed;
                }
                if let Some(h) = horizon {
                    config.horizon_days = h;
                }
                if let Some(v) = add_count {
                    config.adjustment.add_count = v;
                }
                if let Some(v) = mul_count {
                    config.adjustment.mul_count = v;
                }
                if let Some(v) = add_value {
                    config.adjustment.add_value = v;
                }
                if let Some(v) = mul_value {
                    config.adjustment.mul_value = v;
                }
                if let Some(policy) = degenerate {
                    config.degenerate_draw = policy;
                }

                let service = SynthesisService::connect(&self.database, config).await?;
                let report = if dry_run {
                    service.preview().await?
                } else {
                    service.synthesize().await?
                };
                print_run_report(&service, &report);
            }

            Commands::Transactions { date, limit } => {
                let service = SynthesisService::connect(&self.database, config).await?;
                let date = date
                    .map(|s| parse_date(&s))
                    .transpose()
                    .context("Invalid date")?;
                run_transactions_command(&service, TransactionFilter { date, limit }).await?;
            }

            Commands::Summary => {
                let service = SynthesisService::connect(&self.database, config).await?;
                run_summary_command(&service).await?;
            }

            Commands::Status => {
                let service = SynthesisService::connect(&self.database, config).await?;
                run_status_command(&service).await?;
            }

            Commands::Export {
                export_type,
                output,
                format,
            } => {
                let service = SynthesisService::connect(&self.database, config).await?;
                run_export_command(&service, &export_type, output.as_deref(), &format).await?;
            }
        }

        Ok(())
    }
}

async fn run_import_command(
    service: &SynthesisService,
    input: Option<&str>,
    dry_run: bool,
) -> Result<()> {
    let importer = ForecastImporter::new(service);
    let options = ImportOptions { dry_run };

    let result = match input {
        Some(path) => {
            let file = File::open(path).with_context(|| format!("Cannot open {}", path))?;
            importer.import_csv(BufReader::new(file), options).await?
        }
        None => importer.import_csv(io::stdin().lock(), options).await?,
    };

    for error in &result.errors {
        match &error.field {
            Some(field) => eprintln!("  line {} ({}): {}", error.line, field, error.error),
            None => eprintln!("  line {}: {}", error.line, error.error),
        }
    }

    let config = service.config();
    if dry_run {
        println!(
            "Validated {} forecast day(s), {} skipped (nothing written)",
            result.imported, result.skipped
        );
    } else {
        println!(
            "Imported {} forecast day(s) into '{}' and '{}', {} skipped",
            result.imported, config.count_collection, config.value_collection, result.skipped
        );
    }
    Ok(())
}

fn print_run_report(service: &SynthesisService, report: &RunReport) {
    let batch = &report.batch;

    println!("Run:   {}", batch.run_id);
    println!("Seed:  {}", batch.seed);
    println!("Days:  {} of {} forecast", batch.days.len(), report.forecast_days);
    println!();

    if !batch.days.is_empty() {
        println!(
            "{:<12} {:>10} {:>14} {:>10}",
            "DATE", "COUNT", "TARGET", "PRODUCED"
        );
        println!("{}", "-".repeat(49));
        for day in &batch.days {
            println!(
                "{:<12} {:>10} {:>14} {:>10}",
                day.date, day.requested_count, day.target_total, day.produced
            );
        }
        println!();
    }

    if !report.adjustment_issues.is_empty() {
        println!("Left unadjusted:");
        for issue in &report.adjustment_issues {
            println!("  - day {}: {}", issue.index + 1, issue.error);
        }
        println!();
    }

    if !batch.failures.is_empty() {
        println!("Skipped days:");
        for failure in &batch.failures {
            let date = failure
                .date
                .map(|d| d.to_string())
                .unwrap_or_else(|| format!("day {}", failure.index + 1));
            println!("  - {}: {}", date, failure.error);
        }
        println!();
    }

    let total = batch
        .total_amount()
        .map(|t| t.to_string())
        .unwrap_or_else(|| "more than the largest amount".to_string());

    match report.written {
        Some(written) => println!(
            "Stored {} transaction(s) totalling {} in '{}' ({} replaced)",
            written.inserted,
            total,
            service.config().output_collection,
            written.deleted
        ),
        None => println!(
            "Dry run: {} transaction(s) totalling {} not stored",
            batch.transactions.len(),
            total
        ),
    }
}

async fn run_transactions_command(
    service: &SynthesisService,
    filter: TransactionFilter,
) -> Result<()> {
    let transactions = service.list_transactions(&filter).await?;

    if transactions.is_empty() {
        println!("No transactions found.");
    } else {
        println!("{:<20} {:>12}", "TIMESTAMP", "AMOUNT");
        println!("{}", "-".repeat(33));
        for transaction in &transactions {
            println!(
                "{:<20} {:>12}",
                transaction.timestamp.format("%Y-%m-%d %H:%M:%S"),
                transaction.amount
            );
        }
    }
    Ok(())
}

async fn run_summary_command(service: &SynthesisService) -> Result<()> {
    let totals = service.daily_totals().await?;

    if totals.is_empty() {
        println!("No transactions found.");
        return Ok(());
    }

    println!(
        "{:<12} {:>8} {:>14} {:>10} {:>10}",
        "DATE", "COUNT", "TOTAL", "FIRST", "LAST"
    );
    println!("{}", "-".repeat(58));
    for day in &totals {
        println!(
            "{:<12} {:>8} {:>14} {:>10} {:>10}",
            day.date,
            day.count,
            day.total,
            day.first.format("%H:%M:%S"),
            day.last.format("%H:%M:%S")
        );
    }
    println!("{}", "-".repeat(58));
    println!(
        "{:<12} {:>8} {:>14}",
        "Total:",
        totals.iter().map(|d| d.count).sum::<usize>(),
        totals.iter().map(|d| d.total as i128).sum::<i128>()
    );
    Ok(())
}

async fn run_status_command(service: &SynthesisService) -> Result<()> {
    let stats = service.store().collection_stats().await?;

    if stats.is_empty() {
        println!("Database is empty.");
    } else {
        println!("{:<30} {:>10}", "COLLECTION", "DOCUMENTS");
        println!("{}", "-".repeat(41));
        for entry in &stats {
            println!("{:<30} {:>10}", entry.collection, entry.documents);
        }
    }
    Ok(())
}

async fn run_export_command(
    service: &SynthesisService,
    export_type: &str,
    output: Option<&str>,
    format: &str,
) -> Result<()> {
    let writer: Box<dyn io::Write> = match output {
        Some(path) => Box::new(BufWriter::new(
            File::create(path).with_context(|| format!("Cannot create {}", path))?,
        )),
        None => Box::new(io::stdout().lock()),
    };
    let exporter = Exporter::new(service);

    let count = match (export_type, format) {
        ("transactions", "csv") => exporter.export_transactions_csv(writer).await?,
        ("transactions", "json") => {
            exporter
                .export_transactions_json(writer)
                .await?
                .transactions
                .len()
        }
        ("daily", "csv") => exporter.export_daily_csv(writer).await?,
        _ => anyhow::bail!(
            "Unsupported export '{}' as '{}' (use transactions csv|json or daily csv)",
            export_type,
            format
        ),
    };

    if let Some(path) = output {
        eprintln!("Exported {} record(s) to {}", count, path);
    }
    Ok(())
}

fn parse_degenerate_policy(value: &str) -> std::result::Result<DegenerateDrawPolicy, String> {
    DegenerateDrawPolicy::from_str(value)
        .ok_or_else(|| format!("Unknown policy '{}'. Use 'fail' or 'zero'", value))
}

/// Parse a YYYY-MM-DD date
fn parse_date(date_str: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(date_str, "%Y-%m-%d")
        .with_context(|| format!("Invalid date format '{}'. Use YYYY-MM-DD", date_str))
}
