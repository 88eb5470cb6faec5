use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use url::Url;

static CASE_NUMBER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^Case\s*(No\.?)?\s*\d+[:.]\d{2}-cv-\d+").unwrap());

/// True when the citation is a court docket reference ("Case No. 1:17-cv-01234") rather than a link.
pub fn is_case_number(citation: &str) -> bool {
    CASE_NUMBER_RE.is_match(citation.trim())
}

/// True when the citation is an absolute http(s) URL with a host and not a case number.
pub fn is_fetchable_url(citation: &str) -> bool {
    let trimmed = citation.trim();
    if trimmed.is_empty() || is_case_number(trimmed) {
        return false;
    }

    match Url::parse(trimmed) {
        Ok(url) => {
            matches!(url.scheme(), "http" | "https")
                && url.host_str().is_some_and(|h| !h.is_empty())
        }
        Err(_) => false,
    }
}

/// Deny-set of URLs known to be dead. Empty unless configured.
#[derive(Debug, Clone, Default)]
pub struct Exclusions {
    urls: HashSet<String>,
}

impl Exclusions {
    pub fn new<I, S>(urls: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            urls: urls
                .into_iter()
                .map(|u| u.into().trim().to_string())
                .filter(|u| !u.is_empty())
                .collect(),
        }
    }

    pub fn contains(&self, url: &str) -> bool {
        self.urls.contains(url.trim())
    }

    pub fn len(&self) -> usize {
        self.urls.len()
    }
}

/// A citation is a candidate when it is a fetchable URL that is not excluded.
pub fn is_candidate_citation(citation: &str, exclusions: &Exclusions) -> bool {
    is_fetchable_url(citation) && !exclusions.contains(citation)
}

// ── Tests ──
