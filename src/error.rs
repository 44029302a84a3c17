use thiserror::Error;

/// Failure fetching one guide page. Never fatal to a run.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("guide not found: {0}")]
    NotFound(String),
    #[error("timed out fetching {0}")]
    Timeout(String),
    #[error("fetch failed for {url}: {message}")]
    Other {
        url: String,
        status: Option<u16>,
        message: String,
    },
}

impl FetchError {
    pub fn from_reqwest(url: &str, e: reqwest::Error) -> Self {
        if e.is_timeout() {
            return FetchError::Timeout(url.to_string());
        }
        match e.status().map(|s| s.as_u16()) {
            Some(404) | Some(410) => FetchError::NotFound(url.to_string()),
            status => FetchError::Other {
                url: url.to_string(),
                status,
                message: e.to_string(),
            },
        }
    }

    /// Timeouts, throttling, server errors and connection failures are worth another try.
    pub fn is_retryable(&self) -> bool {
        match self {
            FetchError::NotFound(_) => false,
            FetchError::Timeout(_) => true,
            FetchError::Other { status: None, .. } => true,
            FetchError::Other { status: Some(s), .. } => *s == 429 || (500..600).contains(s),
        }
    }
}

/// Asking for something the tool has no definition for. Fatal.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unknown profession '{0}'")]
    UnknownProfession(String),
    #[error("unknown expansion '{0}'")]
    UnknownExpansion(String),
    #[error("unknown material category '{0}'")]
    UnknownCategory(String),
    #[error("no guide URL configured for {profession} {expansion}")]
    NotConfigured {
        profession: String,
        expansion: String,
    },
}
