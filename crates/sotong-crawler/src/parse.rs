//! Extraction of post metadata from board list pages and body text from
//! detail pages.
//!
//! Parsing is synchronous and returns owned data so no parsed document is
//! held across an `.await`.

use scraper::{ElementRef, Html, Selector};

use sotong_core::Post;

use crate::error::CrawlError;

/// Content written when the detail page loaded but had no body element.
pub const MISSING_BODY_SENTINEL: &str = "본문 영역 찾기 실패";

/// Prefix of the content written when the detail page could not be loaded.
pub const FETCH_FAILED_PREFIX: &str = "상세 페이지 접속/추출 오류";

/// Minimum number of `td` cells a list row needs to be a post row.
const MIN_COLUMNS: usize = 6;

/// Metadata for one post as it appears on a list page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListItem {
    pub post_id: String,
    pub title: String,
    pub author: String,
    pub date: String,
    pub views: String,
    pub recommends: String,
    pub detail_url: String,
}

impl ListItem {
    /// Completes the item with the detail-page outcome.
    #[must_use]
    pub fn into_post(self, detail: DetailOutcome) -> Post {
        Post {
            post_id: self.post_id,
            title: self.title,
            author: self.author,
            date: self.date,
            views: self.views,
            recommends: self.recommends,
            detail_url: self.detail_url,
            content: detail.into_content(),
        }
    }
}

/// Result of visiting one detail page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DetailOutcome {
    Body(String),
    MissingBody,
    Failed(String),
}

impl DetailOutcome {
    /// Renders the outcome as the `content` column value.
    #[must_use]
    pub fn into_content(self) -> String {
        match self {
            DetailOutcome::Body(text) => text,
            DetailOutcome::MissingBody => MISSING_BODY_SENTINEL.to_string(),
            DetailOutcome::Failed(kind) => format!("{FETCH_FAILED_PREFIX}: {kind}"),
        }
    }
}

/// Selectors for the board list table, built once per crawl.
pub struct ListSelectors {
    rows: Selector,
    cells: Selector,
    anchor: Selector,
}

impl ListSelectors {
    #[must_use]
    pub fn new() -> Self {
        Self {
            rows: Selector::parse("#board_list > tr, #board_list > tbody > tr")
                .expect("row selector"),
            cells: Selector::parse("td").expect("cell selector"),
            anchor: Selector::parse("a").expect("anchor selector"),
        }
    }
}

impl Default for ListSelectors {
    fn default() -> Self {
        Self::new()
    }
}

/// Parses a user-supplied CSS selector for the detail body.
///
/// # Errors
///
/// Returns [`CrawlError::InvalidSelector`] if `selector` is not valid CSS.
pub fn body_selector(selector: &str) -> Result<Selector, CrawlError> {
    Selector::parse(selector).map_err(|e| CrawlError::InvalidSelector {
        selector: selector.to_owned(),
        reason: e.to_string(),
    })
}

/// Extracts the post rows of one list page.
///
/// Announcement rows (class containing `notice`) are skipped. A row that
/// does not have enough cells or has no title link is skipped as a whole.
/// A page without the board table yields no rows.
#[must_use]
pub fn parse_list_page(html: &str, page_url: &str, selectors: &ListSelectors) -> Vec<ListItem> {
    let document = Html::parse_document(html);
    let base = reqwest::Url::parse(page_url).ok();

    document
        .select(&selectors.rows)
        .filter(|row| {
            !row.value()
                .attr("class")
                .is_some_and(|class| class.contains("notice"))
        })
        .filter_map(|row| parse_list_row(row, base.as_ref(), selectors))
        .collect()
}

fn parse_list_row(
    row: ElementRef<'_>,
    base: Option<&reqwest::Url>,
    selectors: &ListSelectors,
) -> Option<ListItem> {
    let cols: Vec<ElementRef<'_>> = row.select(&selectors.cells).collect();
    if cols.len() < MIN_COLUMNS {
        return None;
    }

    let title_link = cols[1].select(&selectors.anchor).next()?;
    let href = title_link.value().attr("href")?;
    let detail_url = resolve_link(base, href)?;

    Some(ListItem {
        post_id: cell_text(cols[0]),
        title: cell_text(title_link),
        author: cell_text(cols[2]),
        date: cell_text(cols[3]),
        views: cell_text(cols[4]),
        recommends: cell_text(cols[5]),
        detail_url,
    })
}

/// Extracts the post body from a detail page.
#[must_use]
pub fn parse_detail_page(html: &str, body: &Selector) -> DetailOutcome {
    let document = Html::parse_document(html);
    match document.select(body).next() {
        Some(element) => DetailOutcome::Body(block_text(element)),
        None => DetailOutcome::MissingBody,
    }
}

fn resolve_link(base: Option<&reqwest::Url>, href: &str) -> Option<String> {
    let href = href.trim();
    if href.is_empty() || href.starts_with("javascript:") {
        return None;
    }
    match base {
        Some(base) => base.join(href).ok().map(String::from),
        None => reqwest::Url::parse(href).ok().map(String::from),
    }
}

/// Single-line text of a table cell with whitespace runs collapsed.
fn cell_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Multi-line text of a block element: each line trimmed, blank lines dropped.
fn block_text(element: ElementRef<'_>) -> String {
    let raw: String = element.text().collect();
    raw.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
#[path = "parse_test.rs"]
mod tests;
