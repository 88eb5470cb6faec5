use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use chrono::Local;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info, warn};

use crate::artifact;
use crate::fetcher::{FetchOutcome, PageFetcher};
use crate::ledger::{Ledger, LedgerEntry};
use crate::records::Candidate;

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub batch_size: usize,
    /// Pause after each network attempt, except after the last batch position.
    pub delay: Duration,
    pub output_dir: PathBuf,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            batch_size: 50,
            delay: Duration::from_secs(2),
            output_dir: PathBuf::from("extracted-content"),
        }
    }
}

/// Counts for one run. `attempted` = entries appended by this run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub selected: usize,
    pub skipped: usize,
    pub attempted: usize,
    pub succeeded: usize,
    pub failed: usize,
}

pub struct Pipeline<F> {
    fetcher: F,
    ledger: Ledger,
    config: PipelineConfig,
}

impl<F: PageFetcher> Pipeline<F> {
    pub fn new(fetcher: F, ledger: Ledger, config: PipelineConfig) -> Self {
        Self {
            fetcher,
            ledger,
            config,
        }
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    /// Process a batch in order. URLs with a recorded success are skipped;
    /// every attempt is appended to the ledger and persisted before moving on.
    pub async fn run(&mut self, batch: &[Candidate]) -> Result<RunSummary> {
        let total = batch.len().min(self.config.batch_size);
        let batch = &batch[..total];
        let mut done = self.ledger.successful_urls();
        let mut summary = RunSummary {
            selected: total,
            ..RunSummary::default()
        };

        let pb = ProgressBar::new(total as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("[{elapsed_precise}] {bar:40} {pos}/{len} ({eta})")?
                .progress_chars("=> "),
        );

        for (i, candidate) in batch.iter().enumerate() {
            let index = i + 1;

            if done.contains(&candidate.url) {
                summary.skipped += 1;
                say(&pb, format!(
                    "[{}/{}] SKIPPED (already processed): {}",
                    index,
                    total,
                    candidate.title()
                ));
                pb.inc(1);
                continue;
            }

            say(&pb, format!(
                "[{}/{}] Processing: {}\n  URL: {}",
                index,
                total,
                candidate.title(),
                candidate.url
            ));

            let outcome = self.fetcher.fetch(&candidate.url).await.checked();
            let extracted_at = Local::now().naive_local();

            let filename = match outcome.content() {
                Some(content) => {
                    let r = &candidate.record;
                    let name = artifact::filename(&r.year, index, &r.plaintiff, &r.defendant);
                    artifact::write(
                        &self.config.output_dir,
                        &name,
                        candidate,
                        content,
                        &extracted_at,
                    )?;
                    say(&pb, format!(
                        "  ✓ Saved to {} ({} chars)",
                        name,
                        outcome.content_length()
                    ));
                    Some(name)
                }
                None => {
                    let detail = match &outcome {
                        FetchOutcome::Pdf { placeholder } => placeholder.as_str(),
                        other => other.error_message().unwrap_or("Unknown error"),
                    };
                    say(&pb, format!("  ✗ Failed: {} - {}", outcome.status(), detail));
                    warn!("{} -> {}: {}", candidate.url, outcome.status(), detail);
                    None
                }
            };

            let succeeded = filename.is_some();
            self.ledger.append(LedgerEntry::new(
                index,
                candidate,
                &outcome,
                filename,
                extracted_at,
            ))?;

            summary.attempted += 1;
            if succeeded {
                summary.succeeded += 1;
                done.insert(candidate.url.clone());
            } else {
                summary.failed += 1;
            }
            pb.inc(1);

            if index < total && !self.config.delay.is_zero() {
                tokio::time::sleep(self.config.delay).await;
            }
        }

        pb.finish_and_clear();
        info!(
            "Run complete: {} selected, {} skipped, {} attempted ({} ok, {} failed)",
            summary.selected, summary.skipped, summary.attempted, summary.succeeded, summary.failed
        );
        Ok(summary)
    }
}

/// Print above the bar. `ProgressBar::println` drops lines when stdout is not a terminal.
fn say(pb: &ProgressBar, line: String) {
    pb.suspend(|| println!("{}", line));
}

// ── Tests ──
