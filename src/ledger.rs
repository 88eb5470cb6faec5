//! Resume ledger: every fetch attempt across every run, persisted as a
//! pretty-printed JSON array that is rewritten in full after each append.

use std::collections::HashSet;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::fetcher::{FetchOutcome, FetchStatus};
use crate::records::Candidate;

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("failed to read ledger {path:?}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("malformed ledger {path:?}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("failed to write ledger {path:?}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to encode ledger: {0}")]
    Encode(#[from] serde_json::Error),
}

/// One attempt. `filename` is set exactly when `status` is success.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub index: usize,
    pub year: String,
    pub plaintiff: String,
    pub defendant: String,
    pub url: String,
    pub status: FetchStatus,
    pub filename: Option<String>,
    pub error: Option<String>,
    pub extracted_at: NaiveDateTime,
    #[serde(default)]
    pub content_length: usize,
}

impl LedgerEntry {
    /// Record an outcome. `filename` is dropped unless the outcome is a success.
    pub fn new(
        index: usize,
        candidate: &Candidate,
        outcome: &FetchOutcome,
        filename: Option<String>,
        extracted_at: NaiveDateTime,
    ) -> Self {
        let status = outcome.status();
        Self {
            index,
            year: candidate.record.year.clone(),
            plaintiff: candidate.record.plaintiff.clone(),
            defendant: candidate.record.defendant.clone(),
            url: candidate.url.clone(),
            status,
            filename: filename.filter(|_| status == FetchStatus::Success),
            error: outcome.error_message().map(str::to_string),
            extracted_at,
            content_length: outcome.content_length(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == FetchStatus::Success
    }
}

/// URLs with at least one successful attempt.
pub fn successful_urls(entries: &[LedgerEntry]) -> HashSet<String> {
    entries
        .iter()
        .filter(|e| e.is_success())
        .map(|e| e.url.clone())
        .collect()
}

pub struct Ledger {
    path: PathBuf,
    entries: Vec<LedgerEntry>,
}

impl Ledger {
    /// Load the store, or start empty when it does not exist yet.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, LedgerError> {
        let path = path.into();
        let entries = if path.exists() {
            let raw = std::fs::read_to_string(&path).map_err(|source| LedgerError::Read {
                path: path.clone(),
                source,
            })?;
            serde_json::from_str(&raw).map_err(|source| LedgerError::Parse {
                path: path.clone(),
                source,
            })?
        } else {
            Vec::new()
        };
        info!("Ledger {:?}: {} existing entries", path, entries.len());
        Ok(Self { path, entries })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn entries(&self) -> &[LedgerEntry] {
        &self.entries
    }

    pub fn successful_urls(&self) -> HashSet<String> {
        successful_urls(&self.entries)
    }

    /// Most recent entry for `url`, if any.
    pub fn latest_for(&self, url: &str) -> Option<&LedgerEntry> {
        self.entries.iter().rev().find(|e| e.url == url)
    }

    /// Append and rewrite the whole store before returning. If the write
    /// fails the entry is not kept in memory either.
    pub fn append(&mut self, entry: LedgerEntry) -> Result<(), LedgerError> {
        self.entries.push(entry);
        if let Err(e) = self.persist() {
            self.entries.pop();
            return Err(e);
        }
        Ok(())
    }

    /// Write and sync a sibling temp file, then rename over the store.
    fn persist(&self) -> Result<(), LedgerError> {
        let json = serde_json::to_string_pretty(&self.entries)?;
        let write_err = |source: std::io::Error| LedgerError::Write {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(write_err)?;
        }
        let tmp = self.path.with_extension("json.tmp");
        let mut file = File::create(&tmp).map_err(write_err)?;
        file.write_all(json.as_bytes()).map_err(write_err)?;
        file.sync_all().map_err(write_err)?;
        drop(file);
        std::fs::rename(&tmp, &self.path).map_err(write_err)?;

        debug!("Persisted {} ledger entries to {:?}", self.entries.len(), self.path);
        Ok(())
    }
}

// ── Tests ──
