pub mod app_config;
pub mod config;
pub mod dataset;
pub mod posts;
pub mod tier;

pub use app_config::AppConfig;
pub use config::load_app_config_from_env;
pub use dataset::{read_csv, write_csv, DatasetError};
pub use posts::{LabeledRecord, LabelingSample, Post, Topic};
pub use tier::{Tier, TierError};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}
