//! Board crawl loop: list pages, then detail pages, then cleanup and save.

use std::path::Path;
use std::time::Duration;

use scraper::Selector;
use sotong_core::{write_csv, AppConfig, Post};

use crate::error::CrawlError;
use crate::parse::{
    body_selector, parse_detail_page, parse_list_page, DetailOutcome, ListItem, ListSelectors,
};
use crate::rate_limit::Pacer;
use crate::session::{BoardSession, PageSource};

/// Settings for one crawl run.
#[derive(Debug, Clone)]
pub struct CrawlConfig {
    /// List URL without the page number; the number is appended verbatim.
    pub base_url: String,
    pub max_pages: u32,
    pub list_delay: Duration,
    pub detail_delay: Duration,
    pub content_selector: String,
    pub request_timeout_secs: u64,
    pub user_agent: String,
}

impl CrawlConfig {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            base_url: config.board_base_url.clone(),
            max_pages: config.crawl_max_pages,
            list_delay: Duration::from_millis(config.crawl_list_delay_ms),
            detail_delay: Duration::from_millis(config.crawl_detail_delay_ms),
            content_selector: config.content_selector.clone(),
            request_timeout_secs: config.request_timeout_secs,
            user_agent: config.user_agent.clone(),
        }
    }

    fn page_url(&self, page: u32) -> String {
        format!("{}{page}", self.base_url)
    }
}

/// A visited post, kept with its detail outcome until cleanup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawledPost {
    pub item: ListItem,
    pub detail: DetailOutcome,
}

/// Summary of a finished crawl.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlReport {
    /// Posts collected before cleanup.
    pub attempted: usize,
    /// Posts dropped because the body was missing, failed or blank.
    pub removed: usize,
    /// The posts written to the output file.
    pub posts: Vec<Post>,
    /// Why the crawl stopped early, if it did.
    pub aborted: Option<String>,
}

/// Opens a board session and crawls with it.
///
/// # Errors
///
/// Returns [`CrawlError::Http`] if the session cannot be created, in which
/// case nothing is written. See [`crawl_and_save`] for the rest.
pub async fn run_crawl(config: &CrawlConfig, output: &Path) -> Result<CrawlReport, CrawlError> {
    let session = BoardSession::open(config.request_timeout_secs, &config.user_agent)?;
    crawl_and_save(session, config, output).await
}

/// Crawls the board with `session`, closes it, then cleans and saves
/// whatever was collected.
///
/// An error inside the crawl loop stops the crawl but does not prevent the
/// save: the session is closed and the partial result is written, with the
/// reason recorded in [`CrawlReport::aborted`].
///
/// # Errors
///
/// Returns [`CrawlError::InvalidSelector`] before any request is made if the
/// content selector is not valid CSS, and [`CrawlError::Save`] if the output
/// file cannot be written.
pub async fn crawl_and_save<S: PageSource>(
    session: S,
    config: &CrawlConfig,
    output: &Path,
) -> Result<CrawlReport, CrawlError> {
    let body = match body_selector(&config.content_selector) {
        Ok(body) => body,
        Err(e) => {
            session.close();
            return Err(e);
        }
    };

    let mut collected: Vec<CrawledPost> = Vec::new();
    let outcome = crawl_board(&session, config, &body, &mut collected).await;
    session.close();

    let aborted = match outcome {
        Ok(()) => None,
        Err(e) => {
            tracing::error!(
                error = %e,
                collected = collected.len(),
                "crawl aborted; saving posts collected so far"
            );
            Some(e.to_string())
        }
    };

    let attempted = collected.len();
    let posts = retain_valid_posts(collected);
    let removed = attempted - posts.len();

    write_csv(output, &Post::COLUMNS, &posts)?;
    tracing::info!(
        attempted,
        removed,
        saved = posts.len(),
        path = %output.display(),
        "raw dataset saved"
    );

    Ok(CrawlReport {
        attempted,
        removed,
        posts,
        aborted,
    })
}

/// Walks list pages `1..=max_pages`, visiting every post's detail page.
///
/// Stops after the first page beyond page 1 that has no post rows. A failed
/// list page load is returned as an error; a failed detail page load only
/// marks that post.
async fn crawl_board<S: PageSource>(
    session: &S,
    config: &CrawlConfig,
    body: &Selector,
    collected: &mut Vec<CrawledPost>,
) -> Result<(), CrawlError> {
    let pacer = Pacer::new(config.list_delay, config.detail_delay);
    let selectors = ListSelectors::new();

    for page in 1..=config.max_pages {
        tracing::info!(page, "crawling list page");
        let page_url = config.page_url(page);
        let html = session.fetch_html(&page_url).await?;
        pacer.after_list_page().await;

        let items = parse_list_page(&html, &page_url, &selectors);
        if items.is_empty() && page > 1 {
            tracing::info!(page, "no more posts on the board; stopping");
            break;
        }

        let page_count = items.len();
        for item in items {
            let crawled = visit_detail(session, &pacer, body, item).await;
            collected.push(crawled);
        }

        tracing::info!(
            page,
            page_count,
            total = collected.len(),
            "list page collected"
        );
    }

    Ok(())
}

async fn visit_detail<S: PageSource>(
    session: &S,
    pacer: &Pacer,
    body: &Selector,
    item: ListItem,
) -> CrawledPost {
    let outcome = match session.fetch_html(&item.detail_url).await {
        Ok(html) => parse_detail_page(&html, body),
        Err(e) => {
            tracing::warn!(
                post_id = %item.post_id,
                url = %item.detail_url,
                error = %e,
                "detail page failed"
            );
            DetailOutcome::Failed(e.kind())
        }
    };
    pacer.after_detail_page().await;

    if outcome == DetailOutcome::MissingBody {
        tracing::warn!(post_id = %item.post_id, "detail page has no body element");
    }
    CrawledPost {
        item,
        detail: outcome,
    }
}

/// Keeps the posts whose detail page yielded a body that is not blank after
/// trimming. Missing and failed bodies are dropped whatever their text.
#[must_use]
pub fn retain_valid_posts(crawled: Vec<CrawledPost>) -> Vec<Post> {
    crawled
        .into_iter()
        .filter(|c| match &c.detail {
            DetailOutcome::Body(text) => !text.trim().is_empty(),
            DetailOutcome::MissingBody | DetailOutcome::Failed(_) => {
                tracing::debug!(
                    post_id = %c.item.post_id,
                    content = %c.detail.clone().into_content(),
                    "post dropped"
                );
                false
            }
        })
        .map(|c| c.item.into_post(c.detail))
        .collect()
}
