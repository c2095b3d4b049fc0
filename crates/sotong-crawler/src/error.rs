use thiserror::Error;

#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    #[error("invalid CSS selector \"{selector}\": {reason}")]
    InvalidSelector { selector: String, reason: String },

    #[error("failed to save crawl output: {0}")]
    Save(#[from] sotong_core::DatasetError),
}

impl CrawlError {
    /// Short, stable name of the failure used inside the detail-page sentinel.
    #[must_use]
    pub fn kind(&self) -> String {
        match self {
            CrawlError::Http(e) if e.is_timeout() => "Timeout".to_string(),
            CrawlError::Http(e) if e.is_connect() => "Connect".to_string(),
            CrawlError::Http(e) if e.is_decode() => "Decode".to_string(),
            CrawlError::Http(_) => "Http".to_string(),
            CrawlError::UnexpectedStatus { status, .. } => format!("Status{status}"),
            CrawlError::InvalidSelector { .. } => "InvalidSelector".to_string(),
            CrawlError::Save(_) => "Save".to_string(),
        }
    }
}
