mod artifact;
mod classify;
mod extract;
mod fetcher;
mod ledger;
mod pipeline;
mod records;
mod settings;
#[cfg(test)]
mod test_support;

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Instant;

use clap::{Parser, Subcommand};

use crate::fetcher::HttpFetcher;
use crate::ledger::Ledger;
use crate::pipeline::Pipeline;
use crate::settings::Settings;

#[derive(Parser)]
#[command(
    name = "lawsuit_scraper",
    about = "Resumable fetcher for accessibility lawsuit citations"
)]
struct Cli {
    /// Lawsuit archive (JSON array of records)
    #[arg(long, global = true)]
    input: Option<PathBuf>,
    /// Directory for extracted text files
    #[arg(long, global = true)]
    output_dir: Option<PathBuf>,
    /// Processing log used for resumption
    #[arg(long, global = true)]
    ledger: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch and extract the next batch, skipping URLs already extracted
    Run {
        /// Batch size (default: 50)
        #[arg(short = 'n', long)]
        limit: Option<usize>,
        /// Pause between requests in seconds
        #[arg(long)]
        delay_secs: Option<u64>,
        /// Per-request timeout in seconds
        #[arg(long)]
        timeout_secs: Option<u64>,
    },
    /// Show the batch that would be processed, without fetching
    Candidates {
        #[arg(short = 'n', long)]
        limit: Option<usize>,
    },
    /// Summarise the processing log
    Stats,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();

    let mut settings = Settings::load()?;
    if let Some(p) = cli.input {
        settings.input = p;
    }
    if let Some(p) = cli.output_dir {
        settings.output_dir = p;
    }
    if let Some(p) = cli.ledger {
        settings.ledger = p;
    }

    let result = match cli.command {
        Commands::Run {
            limit,
            delay_secs,
            timeout_secs,
        } => {
            if let Some(n) = limit {
                settings.batch_size = n;
            }
            if let Some(s) = delay_secs {
                settings.delay_secs = s;
            }
            if let Some(s) = timeout_secs {
                settings.timeout_secs = s;
            }
            settings.validate()?;
            run(&settings).await
        }
        Commands::Candidates { limit } => {
            if let Some(n) = limit {
                settings.batch_size = n;
            }
            settings.validate()?;
            show_candidates(&settings)
        }
        Commands::Stats => show_stats(&settings),
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("\nDone in {}", format_duration(elapsed));
    }

    result
}

async fn run(settings: &Settings) -> anyhow::Result<()> {
    println!("Loading lawsuit archive from {:?}...", settings.input);
    let records = records::load_records(&settings.input)?;
    let batch = records::select_batch(&records, &settings.exclusions(), settings.batch_size);
    if batch.is_empty() {
        println!("No fetchable citations found.");
        return Ok(());
    }
    println!("Processing {} lawsuits chronologically...\n", batch.len());

    let ledger = Ledger::load(&settings.ledger)?;
    let fetcher = HttpFetcher::new(&settings.fetch_config())?;
    let mut pipeline = Pipeline::new(fetcher, ledger, settings.pipeline_config());
    let summary = pipeline.run(&batch).await?;

    println!("{}", "=".repeat(80));
    println!("Extraction Summary:");
    println!("  Selected:  {}", summary.selected);
    println!("  Skipped:   {}", summary.skipped);
    println!("  Attempted: {}", summary.attempted);
    println!("  Succeeded: {}", summary.succeeded);
    println!("  Failed:    {}", summary.failed);
    println!("  Log saved to: {:?}", pipeline.ledger().path());
    println!("  Content saved to: {:?}", settings.output_dir);
    Ok(())
}

fn show_candidates(settings: &Settings) -> anyhow::Result<()> {
    let records = records::load_records(&settings.input)?;
    let batch = records::select_batch(&records, &settings.exclusions(), settings.batch_size);
    let ledger = Ledger::load(&settings.ledger)?;
    let done = ledger.successful_urls();

    println!(
        "{:>3} | {:>4} | {:<24} | {:<24} | {:<16} | URL",
        "#", "Year", "Plaintiff", "Defendant", "State"
    );
    println!("{}", "-".repeat(105));

    for (i, c) in batch.iter().enumerate() {
        let state = if done.contains(&c.url) {
            "done".to_string()
        } else {
            match ledger.latest_for(&c.url) {
                Some(e) => e.status.to_string(),
                None => "pending".to_string(),
            }
        };
        println!(
            "{:>3} | {:>4} | {:<24} | {:<24} | {:<16} | {}",
            i + 1,
            c.year,
            truncate(&c.record.plaintiff, 24),
            truncate(&c.record.defendant, 24),
            state,
            c.url
        );
    }

    let pending = batch.iter().filter(|c| !done.contains(&c.url)).count();
    println!("\n{} in batch | {} still to fetch", batch.len(), pending);
    Ok(())
}

fn show_stats(settings: &Settings) -> anyhow::Result<()> {
    let ledger = Ledger::load(&settings.ledger)?;
    let entries = ledger.entries();

    let mut by_status: BTreeMap<String, usize> = BTreeMap::new();
    for e in entries {
        *by_status.entry(e.status.to_string()).or_default() += 1;
    }
    let chars: usize = entries.iter().map(|e| e.content_length).sum();

    println!("Entries:         {}", entries.len());
    println!("Successful URLs: {}", ledger.successful_urls().len());
    println!("Extracted chars: {}", chars);
    for (status, count) in &by_status {
        println!("  {:<18} {}", status, count);
    }
    Ok(())
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max - 3).collect();
        format!("{}...", truncated)
    }
}

fn format_duration(d: std::time::Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{:.1}s", d.as_secs_f64())
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_keeps_width() {
        assert_eq!(truncate("Target", 24), "Target");
        let t = truncate("National Federation of the Blind of California", 24);
        assert_eq!(t.chars().count(), 24);
        assert!(t.ends_with("..."));
    }

    #[test]
    fn durations_read_naturally() {
        assert_eq!(format_duration(std::time::Duration::from_millis(2500)), "2.5s");
        assert_eq!(format_duration(std::time::Duration::from_secs(125)), "2m 5s");
        assert_eq!(format_duration(std::time::Duration::from_secs(3725)), "1h 2m 5s");
    }

    #[test]
    fn cli_parses_run_flags() {
        let cli = Cli::try_parse_from([
            "lawsuit_scraper",
            "--ledger",
            "log.json",
            "run",
            "-n",
            "10",
            "--delay-secs",
            "0",
        ])
        .unwrap();
        assert_eq!(cli.ledger, Some(PathBuf::from("log.json")));
        match cli.command {
            Commands::Run {
                limit, delay_secs, ..
            } => {
                assert_eq!(limit, Some(10));
                assert_eq!(delay_secs, Some(0));
            }
            _ => panic!("expected run"),
        }
    }
}
