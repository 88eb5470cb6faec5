use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use regex::Regex;

use crate::records::Candidate;

static DASH_RUN_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[-\s]+").unwrap());

const NAME_CHARS: usize = 20;
const SEPARATOR_WIDTH: usize = 80;

/// Keep `[A-Za-z0-9_ -]`, cut to 20 chars, collapse space/hyphen runs to one hyphen.
pub fn sanitize(part: &str) -> String {
    let kept: String = part
        .chars()
        .filter(|&c| c.is_ascii_alphanumeric() || matches!(c, '_' | ' ' | '-'))
        .take(NAME_CHARS)
        .collect();
    DASH_RUN_RE.replace_all(&kept, "-").into_owned()
}

/// `lawsuit-{year}-{index:03}-{plaintiff}-v-{defendant}.txt`
pub fn filename(year: &str, index: usize, plaintiff: &str, defendant: &str) -> String {
    format!(
        "lawsuit-{}-{:03}-{}-v-{}.txt",
        year,
        index,
        sanitize(plaintiff),
        sanitize(defendant)
    )
}

pub fn format_timestamp(at: &NaiveDateTime) -> String {
    at.format("%Y-%m-%dT%H:%M:%S%.6f").to_string()
}

/// Header block, separator, then the extracted text.
pub fn render(candidate: &Candidate, content: &str, extracted_at: &NaiveDateTime) -> String {
    let r = &candidate.record;
    format!(
        "URL: {}\nYear: {}\nPlaintiff: {}\nDefendant: {}\nExtracted: {}\n\n{}\n\n{}",
        candidate.url,
        r.year,
        r.plaintiff,
        r.defendant,
        format_timestamp(extracted_at),
        "=".repeat(SEPARATOR_WIDTH),
        content
    )
}

pub fn write(
    dir: &Path,
    name: &str,
    candidate: &Candidate,
    content: &str,
    extracted_at: &NaiveDateTime,
) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create output directory {:?}", dir))?;
    let path = dir.join(name);
    std::fs::write(&path, render(candidate, content, extracted_at))
        .with_context(|| format!("Failed to write {:?}", path))?;
    Ok(path)
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::LawsuitRecord;

    #[test]
    fn sanitize_strips_and_collapses() {
        assert_eq!(sanitize("Domino's Pizza, LLC"), "Dominos-Pizza-LLC");
        assert_eq!(sanitize("National Federation of the Blind"), "National-Federation-");
        assert_eq!(sanitize("A  -  B"), "A-B");
        assert_eq!(sanitize("Café & Co."), "Caf-Co");
        assert_eq!(sanitize("snake_case_name"), "snake_case_name");
    }

    #[test]
    fn filename_scheme() {
        assert_eq!(
            filename("2017", 7, "Gil", "Winn-Dixie Stores, Inc."),
            "lawsuit-2017-007-Gil-v-Winn-Dixie-Stores-In.txt"
        );
        assert_eq!(
            filename("2019", 123, "U.S.", "Target"),
            "lawsuit-2019-123-US-v-Target.txt"
        );
    }

    #[test]
    fn artifact_layout() {
        let candidate = Candidate {
            record: LawsuitRecord {
                year: "2006".to_string(),
                plaintiff: "NFB".to_string(),
                defendant: "Target".to_string(),
                citation: "https://example.com/nfb-target".to_string(),
            },
            year: 2006,
            url: "https://example.com/nfb-target".to_string(),
        };
        let at = chrono::NaiveDate::from_ymd_opt(2024, 2, 3)
            .unwrap()
            .and_hms_opt(4, 5, 6)
            .unwrap();

        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("extracted");
        let path = write(&out, "x.txt", &candidate, "Body text here", &at).unwrap();
        let body = std::fs::read_to_string(path).unwrap();
        let lines: Vec<&str> = body.lines().collect();

        assert_eq!(lines[0], "URL: https://example.com/nfb-target");
        assert_eq!(lines[1], "Year: 2006");
        assert_eq!(lines[2], "Plaintiff: NFB");
        assert_eq!(lines[3], "Defendant: Target");
        assert_eq!(lines[4], "Extracted: 2024-02-03T04:05:06.000000");
        assert_eq!(lines[5], "");
        assert_eq!(lines[6], "=".repeat(80));
        assert_eq!(lines[7], "");
        assert_eq!(lines[8], "Body text here");
    }
}
