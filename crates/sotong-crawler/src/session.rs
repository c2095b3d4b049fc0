//! The browsing session used for a whole crawl.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use reqwest::Client;

use crate::error::CrawlError;

/// Something that can load board pages as HTML and be shut down once.
///
/// `close` takes `self` so a session cannot be used or closed again after it
/// has been released.
#[allow(async_fn_in_trait)]
pub trait PageSource {
    /// Loads `url` and returns the response body.
    ///
    /// # Errors
    ///
    /// Returns [`CrawlError`] on transport failures and non-2xx responses.
    async fn fetch_html(&self, url: &str) -> Result<String, CrawlError>;

    /// Releases the session.
    fn close(self);
}

/// HTTP session that keeps cookies across every request of a crawl, the way
/// a single browser window would.
pub struct BoardSession {
    client: Client,
    requests: AtomicU64,
    closed: bool,
}

impl BoardSession {
    /// Opens a session with the given request timeout and `User-Agent`.
    ///
    /// # Errors
    ///
    /// Returns [`CrawlError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed (e.g., invalid TLS config).
    pub fn open(timeout_secs: u64, user_agent: &str) -> Result<Self, CrawlError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .cookie_store(true)
            .build()?;
        tracing::debug!(timeout_secs, "board session opened");
        Ok(Self {
            client,
            requests: AtomicU64::new(0),
            closed: false,
        })
    }
}

impl PageSource for BoardSession {
    async fn fetch_html(&self, url: &str) -> Result<String, CrawlError> {
        self.requests.fetch_add(1, Ordering::Relaxed);
        let response = self
            .client
            .get(url)
            .header(
                reqwest::header::ACCEPT,
                "text/html,application/xhtml+xml;q=0.9,*/*;q=0.8",
            )
            .header(reqwest::header::ACCEPT_LANGUAGE, "ko-KR,ko;q=0.9,en;q=0.8")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(CrawlError::UnexpectedStatus {
                status: status.as_u16(),
                url: url.to_owned(),
            });
        }

        Ok(response.text().await?)
    }

    fn close(mut self) {
        self.closed = true;
        tracing::info!(
            requests = self.requests.load(Ordering::Relaxed),
            "board session closed"
        );
    }
}

impl Drop for BoardSession {
    fn drop(&mut self) {
        if !self.closed {
            tracing::warn!("board session dropped without an explicit close");
        }
    }
}
