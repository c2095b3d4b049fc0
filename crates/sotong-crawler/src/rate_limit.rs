//! Fixed-delay pacing between board requests.
//!
//! The board is crawled politely with a constant pause after every list page
//! and every detail page. There is no adaptive backoff and no retry: a failed
//! request is handled by the caller (skip the post, or stop the crawl).

use std::time::Duration;

/// Sleeps a fixed amount of time after each kind of page load.
#[derive(Debug, Clone, Copy)]
pub struct Pacer {
    list_delay: Duration,
    detail_delay: Duration,
}

impl Pacer {
    #[must_use]
    pub fn new(list_delay: Duration, detail_delay: Duration) -> Self {
        Self {
            list_delay,
            detail_delay,
        }
    }

    /// Waits out the pause that follows a list page load.
    pub async fn after_list_page(&self) {
        pause(self.list_delay).await;
    }

    /// Waits out the pause that follows a detail page load.
    pub async fn after_detail_page(&self) {
        pause(self.detail_delay).await;
    }
}

async fn pause(delay: Duration) {
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn list_pause_waits_configured_delay() {
        let pacer = Pacer::new(Duration::from_millis(1500), Duration::from_millis(1000));
        let start = tokio::time::Instant::now();
        pacer.after_list_page().await;
        assert_eq!(start.elapsed(), Duration::from_millis(1500));
    }

    #[tokio::test(start_paused = true)]
    async fn detail_pause_waits_configured_delay() {
        let pacer = Pacer::new(Duration::from_millis(1500), Duration::from_millis(1000));
        let start = tokio::time::Instant::now();
        pacer.after_detail_page().await;
        assert_eq!(start.elapsed(), Duration::from_millis(1000));
    }

    #[tokio::test(start_paused = true)]
    async fn zero_delay_does_not_sleep() {
        let pacer = Pacer::new(Duration::ZERO, Duration::ZERO);
        let start = tokio::time::Instant::now();
        pacer.after_list_page().await;
        pacer.after_detail_page().await;
        assert_eq!(start.elapsed(), Duration::ZERO);
    }
}
