use std::path::PathBuf;

#[derive(Clone)]
pub struct AppConfig {
    pub log_level: String,
    pub raw_path: PathBuf,
    pub sample_path: PathBuf,
    pub labeled_path: PathBuf,
    pub model_output_path: PathBuf,
    pub topics_input_path: PathBuf,
    pub topics_dir: PathBuf,
    pub board_base_url: String,
    pub crawl_max_pages: u32,
    pub crawl_list_delay_ms: u64,
    pub crawl_detail_delay_ms: u64,
    pub content_selector: String,
    pub request_timeout_secs: u64,
    pub user_agent: String,
    pub model_dir: PathBuf,
    pub train_epochs: usize,
    pub train_batch_size: usize,
    pub train_max_len: usize,
    pub train_learning_rate: f64,
    pub font_path: PathBuf,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("log_level", &self.log_level)
            .field("raw_path", &self.raw_path)
            .field("sample_path", &self.sample_path)
            .field("labeled_path", &self.labeled_path)
            .field("model_output_path", &self.model_output_path)
            .field("topics_input_path", &self.topics_input_path)
            .field("topics_dir", &self.topics_dir)
            .field("board_base_url", &self.board_base_url)
            .field("crawl_max_pages", &self.crawl_max_pages)
            .field("crawl_list_delay_ms", &self.crawl_list_delay_ms)
            .field("crawl_detail_delay_ms", &self.crawl_detail_delay_ms)
            .field("content_selector", &self.content_selector)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("user_agent", &self.user_agent)
            .field("model_dir", &self.model_dir)
            .field("train_epochs", &self.train_epochs)
            .field("train_batch_size", &self.train_batch_size)
            .field("train_max_len", &self.train_max_len)
            .field("train_learning_rate", &self.train_learning_rate)
            .field("font_path", &self.font_path)
            .finish()
    }
}
