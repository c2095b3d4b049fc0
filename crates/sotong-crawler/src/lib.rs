pub mod crawl;
pub mod error;
pub mod parse;
pub mod rate_limit;
pub mod session;

pub use crawl::{crawl_and_save, retain_valid_posts, run_crawl, CrawlConfig, CrawlReport, CrawledPost};
pub use error::CrawlError;
pub use parse::{DetailOutcome, ListItem};
pub use session::{BoardSession, PageSource};
