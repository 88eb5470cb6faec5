use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, CONTENT_TYPE};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::extract;

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

const ACCEPT_HTML: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";
const ACCEPT_LANG: &str = "en-US,en;q=0.9";

/// HTTP settings for one run.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    pub timeout: Duration,
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

/// Status recorded in the ledger. On disk: `success`, `pdf`, `timeout`,
/// `http_error_<code>`, `connection_error`, `error`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum FetchStatus {
    Success,
    Pdf,
    Timeout,
    HttpError(u16),
    ConnectionError,
    Error,
}

impl fmt::Display for FetchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success => f.write_str("success"),
            Self::Pdf => f.write_str("pdf"),
            Self::Timeout => f.write_str("timeout"),
            Self::HttpError(code) => write!(f, "http_error_{}", code),
            Self::ConnectionError => f.write_str("connection_error"),
            Self::Error => f.write_str("error"),
        }
    }
}

impl FromStr for FetchStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "success" => Ok(Self::Success),
            "pdf" => Ok(Self::Pdf),
            "timeout" => Ok(Self::Timeout),
            "connection_error" => Ok(Self::ConnectionError),
            "error" => Ok(Self::Error),
            other => other
                .strip_prefix("http_error_")
                .and_then(|code| code.parse().ok())
                .map(Self::HttpError)
                .ok_or_else(|| format!("unknown fetch status {:?}", other)),
        }
    }
}

impl TryFrom<String> for FetchStatus {
    type Error = String;

    fn try_from(s: String) -> Result<Self, String> {
        s.parse()
    }
}

impl From<FetchStatus> for String {
    fn from(status: FetchStatus) -> Self {
        status.to_string()
    }
}

const NO_TEXT: &str = "No text content extracted";

/// Classified result of one fetch attempt. Only `Success` carries page text,
/// and that text is never empty (see [`FetchOutcome::checked`]).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    Success { content: String },
    Pdf { placeholder: String },
    Timeout,
    HttpError { code: u16, message: String },
    ConnectionError { message: String },
    Error { message: String },
}

impl FetchOutcome {
    pub fn status(&self) -> FetchStatus {
        match self {
            Self::Success { .. } => FetchStatus::Success,
            Self::Pdf { .. } => FetchStatus::Pdf,
            Self::Timeout => FetchStatus::Timeout,
            Self::HttpError { code, .. } => FetchStatus::HttpError(*code),
            Self::ConnectionError { .. } => FetchStatus::ConnectionError,
            Self::Error { .. } => FetchStatus::Error,
        }
    }

    /// Demote a `Success` without any text to `Error`.
    pub fn checked(self) -> Self {
        match self {
            Self::Success { content } if content.trim().is_empty() => Self::Error {
                message: NO_TEXT.to_string(),
            },
            other => other,
        }
    }

    pub fn content(&self) -> Option<&str> {
        match self {
            Self::Success { content } => Some(content),
            _ => None,
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            Self::Timeout => Some("Request timed out"),
            Self::HttpError { message, .. }
            | Self::ConnectionError { message }
            | Self::Error { message } => Some(message),
            Self::Success { .. } | Self::Pdf { .. } => None,
        }
    }

    /// Characters of extracted text; 0 for everything but `Success`.
    pub fn content_length(&self) -> usize {
        self.content().map(|c| c.chars().count()).unwrap_or(0)
    }
}

pub fn pdf_placeholder(url: &str) -> String {
    format!("[PDF file - content extraction not implemented] URL: {}", url)
}

/// Anything that can turn a URL into a classified outcome.
pub trait PageFetcher {
    async fn fetch(&self, url: &str) -> FetchOutcome;
}

/// Fetches pages over HTTP with a browser header set. No retries.
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(config: &FetchConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_HTML));
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static(ACCEPT_LANG));

        let client = Client::builder()
            .user_agent(config.user_agent.as_str())
            .default_headers(headers)
            .timeout(config.timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self { client })
    }
}

impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> FetchOutcome {
        debug!("GET {}", url);
        let response = match self.client.get(url).send().await {
            Ok(r) => r,
            Err(e) => return classify_error(&e),
        };

        let status = response.status();
        if !status.is_success() {
            let code = status.as_u16();
            return FetchOutcome::HttpError {
                code,
                message: format!(
                    "HTTP {}: {} for url: {}",
                    code,
                    status.canonical_reason().unwrap_or("Unknown Status"),
                    response.url()
                ),
            };
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_ascii_lowercase();
        if content_type.contains("pdf") {
            return FetchOutcome::Pdf {
                placeholder: pdf_placeholder(url),
            };
        }

        // Relative links resolve against where we ended up, not where we started.
        let final_url = response.url().to_string();
        let body = match response.text().await {
            Ok(b) => b,
            Err(e) => return classify_error(&e),
        };

        let content = extract::extract_main_content(&body, &final_url);
        if content.is_empty() {
            warn!("No text extracted from {}", url);
        }

        FetchOutcome::Success { content }.checked()
    }
}

/// Timeouts win over connect failures: a connect timeout is a timeout.
fn classify_error(e: &reqwest::Error) -> FetchOutcome {
    if e.is_timeout() {
        FetchOutcome::Timeout
    } else if e.is_connect() {
        FetchOutcome::ConnectionError {
            message: format!("Connection error: {}", e),
        }
    } else {
        FetchOutcome::Error {
            message: e.to_string(),
        }
    }
}

// ── Tests ──
