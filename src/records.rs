use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Deserializer};
use tracing::{info, warn};

use crate::classify::{self, Exclusions};

/// One archived lawsuit. `citation` is either a URL or a free-text docket reference.
#[derive(Debug, Clone, Deserialize)]
pub struct LawsuitRecord {
    #[serde(deserialize_with = "year_as_string")]
    pub year: String,
    pub plaintiff: String,
    pub defendant: String,
    pub citation: String,
}

/// A record whose citation is a live, non-excluded URL.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub record: LawsuitRecord,
    pub year: i32,
    pub url: String,
}

impl Candidate {
    pub fn title(&self) -> String {
        format!(
            "{} - {} v. {}",
            self.record.year, self.record.plaintiff, self.record.defendant
        )
    }
}

/// Accept `"2019"` as well as `2019`.
fn year_as_string<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Year {
        Text(String),
        Number(i64),
    }

    Ok(match Year::deserialize(deserializer)? {
        Year::Text(s) => s,
        Year::Number(n) => n.to_string(),
    })
}

/// Read the archive export (a JSON array of records).
pub fn load_records(path: &Path) -> Result<Vec<LawsuitRecord>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read lawsuit archive {:?}", path))?;
    let records: Vec<LawsuitRecord> = serde_json::from_str(&raw)
        .with_context(|| format!("Malformed lawsuit archive {:?}", path))?;
    info!("Loaded {} lawsuit records from {:?}", records.len(), path);
    Ok(records)
}

/// Filter to candidates and order them by (year, plaintiff). Stable for equal keys.
pub fn candidates(records: &[LawsuitRecord], exclusions: &Exclusions) -> Vec<Candidate> {
    let mut out: Vec<Candidate> = records
        .iter()
        .filter(|r| classify::is_candidate_citation(&r.citation, exclusions))
        .filter_map(|r| match r.year.trim().parse::<i32>() {
            Ok(year) => Some(Candidate {
                record: r.clone(),
                year,
                url: r.citation.trim().to_string(),
            }),
            Err(_) => {
                warn!(
                    "Skipping {} v. {}: year {:?} is not a number",
                    r.plaintiff, r.defendant, r.year
                );
                None
            }
        })
        .collect();

    out.sort_by(|a, b| {
        a.year
            .cmp(&b.year)
            .then_with(|| a.record.plaintiff.cmp(&b.record.plaintiff))
    });
    out
}

/// Candidates truncated to the batch bound.
pub fn select_batch(
    records: &[LawsuitRecord],
    exclusions: &Exclusions,
    batch_size: usize,
) -> Vec<Candidate> {
    let mut all = candidates(records, exclusions);
    info!(
        "Found {} candidate URLs out of {} records ({} URLs excluded by config)",
        all.len(),
        records.len(),
        exclusions.len()
    );
    all.truncate(batch_size);
    all
}

// ── Tests ──
