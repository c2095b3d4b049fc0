use crate::app_config::AppConfig;
use crate::ConfigError;

pub const DEFAULT_RAW_PATH: &str = "soop_community_data_raw.csv";
pub const DEFAULT_SAMPLE_PATH: &str = "soop_data_labeling_sample.csv";
pub const DEFAULT_LABELED_PATH: &str = "soop_data_labeled_final_for_model.csv";
pub const DEFAULT_MODEL_OUTPUT_PATH: &str = "koelectra_soop_5tier_model.safetensors";
pub const DEFAULT_BOARD_BASE_URL: &str = "https://sotong.sooplive.co.kr/?board_type=user&work=list&check_nick=false&check_title=true&check_content=true&page=";
pub const DEFAULT_CONTENT_SELECTOR: &str = "div.v_article div.view";

/// Load application configuration from environment variables already in the process.
///
/// `.env` files are not read here; the binary loads them first.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but cannot be parsed.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Every variable has a default matching the pipeline's working-directory
/// file names and crawl constants, so an empty environment is valid.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::path::PathBuf;

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        or_default(var, default)
            .parse::<u32>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        or_default(var, default)
            .parse::<u64>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_positive_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        let value = or_default(var, default)
            .parse::<usize>()
            .map_err(|e| invalid(var, e.to_string()))?;
        if value == 0 {
            return Err(invalid(var, "must be greater than zero".to_string()));
        }
        Ok(value)
    };

    let log_level = or_default("SOTONG_LOG_LEVEL", "info");

    let raw_path = PathBuf::from(or_default("SOTONG_RAW_PATH", DEFAULT_RAW_PATH));
    let sample_path = PathBuf::from(or_default("SOTONG_SAMPLE_PATH", DEFAULT_SAMPLE_PATH));
    let labeled_path = PathBuf::from(or_default("SOTONG_LABELED_PATH", DEFAULT_LABELED_PATH));
    let model_output_path = PathBuf::from(or_default(
        "SOTONG_MODEL_OUTPUT_PATH",
        DEFAULT_MODEL_OUTPUT_PATH,
    ));
    let topics_input_path = PathBuf::from(or_default("SOTONG_TOPICS_INPUT_PATH", DEFAULT_RAW_PATH));
    let topics_dir = PathBuf::from(or_default("SOTONG_TOPICS_DIR", "topics"));

    let board_base_url = or_default("SOTONG_BOARD_BASE_URL", DEFAULT_BOARD_BASE_URL);
    let crawl_max_pages = parse_u32("SOTONG_CRAWL_MAX_PAGES", "2500")?;
    let crawl_list_delay_ms = parse_u64("SOTONG_CRAWL_LIST_DELAY_MS", "1500")?;
    let crawl_detail_delay_ms = parse_u64("SOTONG_CRAWL_DETAIL_DELAY_MS", "1000")?;
    let content_selector = or_default("SOTONG_CONTENT_SELECTOR", DEFAULT_CONTENT_SELECTOR);
    let request_timeout_secs = parse_u64("SOTONG_REQUEST_TIMEOUT_SECS", "30")?;
    let user_agent = or_default(
        "SOTONG_USER_AGENT",
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36",
    );

    let model_dir = PathBuf::from(or_default(
        "SOTONG_MODEL_DIR",
        "models/koelectra-base-v3-discriminator",
    ));
    let train_epochs = parse_positive_usize("SOTONG_TRAIN_EPOCHS", "4")?;
    let train_batch_size = parse_positive_usize("SOTONG_TRAIN_BATCH_SIZE", "16")?;
    let train_max_len = parse_positive_usize("SOTONG_TRAIN_MAX_LEN", "128")?;
    let train_learning_rate = or_default("SOTONG_TRAIN_LEARNING_RATE", "5e-5")
        .parse::<f64>()
        .map_err(|e| invalid("SOTONG_TRAIN_LEARNING_RATE", e.to_string()))?;
    if !(train_learning_rate > 0.0 && train_learning_rate.is_finite()) {
        return Err(invalid(
            "SOTONG_TRAIN_LEARNING_RATE",
            "must be a positive finite number".to_string(),
        ));
    }

    let font_path = PathBuf::from(or_default("SOTONG_FONT_PATH", "c:/Windows/Fonts/malgun.ttf"));

    Ok(AppConfig {
        log_level,
        raw_path,
        sample_path,
        labeled_path,
        model_output_path,
        topics_input_path,
        topics_dir,
        board_base_url,
        crawl_max_pages,
        crawl_list_delay_ms,
        crawl_detail_delay_ms,
        content_selector,
        request_timeout_secs,
        user_agent,
        model_dir,
        train_epochs,
        train_batch_size,
        train_max_len,
        train_learning_rate,
        font_path,
    })
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
