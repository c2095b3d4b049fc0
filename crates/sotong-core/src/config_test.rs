use std::collections::HashMap;
use std::env::VarError;
use std::path::Path;

use super::*;

fn lookup_from_map<'a>(
    map: &'a HashMap<&'a str, &'a str>,
) -> impl Fn(&str) -> Result<String, VarError> + 'a {
    move |key| {
        map.get(key)
            .map(|v| (*v).to_string())
            .ok_or(VarError::NotPresent)
    }
}

#[test]
fn empty_environment_uses_pipeline_defaults() {
    let map = HashMap::new();
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();

    assert_eq!(cfg.log_level, "info");
    assert_eq!(cfg.raw_path, Path::new("soop_community_data_raw.csv"));
    assert_eq!(cfg.sample_path, Path::new("soop_data_labeling_sample.csv"));
    assert_eq!(
        cfg.labeled_path,
        Path::new("soop_data_labeled_final_for_model.csv")
    );
    assert_eq!(cfg.topics_input_path, cfg.raw_path);
    assert_eq!(cfg.crawl_max_pages, 2500);
    assert_eq!(cfg.crawl_list_delay_ms, 1500);
    assert_eq!(cfg.crawl_detail_delay_ms, 1000);
    assert_eq!(cfg.content_selector, "div.v_article div.view");
    assert!(cfg.board_base_url.ends_with("&page="));
    assert_eq!(cfg.train_epochs, 4);
    assert_eq!(cfg.train_batch_size, 16);
    assert_eq!(cfg.train_max_len, 128);
    assert!((cfg.train_learning_rate - 5e-5).abs() < f64::EPSILON);
}

#[test]
fn overrides_are_applied() {
    let mut map = HashMap::new();
    map.insert("SOTONG_RAW_PATH", "/data/raw.csv");
    map.insert("SOTONG_CRAWL_MAX_PAGES", "3");
    map.insert("SOTONG_CRAWL_LIST_DELAY_MS", "0");
    map.insert("SOTONG_TRAIN_LEARNING_RATE", "0.0001");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();

    assert_eq!(cfg.raw_path, Path::new("/data/raw.csv"));
    assert_eq!(cfg.crawl_max_pages, 3);
    assert_eq!(cfg.crawl_list_delay_ms, 0);
    assert!((cfg.train_learning_rate - 1e-4).abs() < f64::EPSILON);
}

#[test]
fn invalid_max_pages_is_rejected() {
    let mut map = HashMap::new();
    map.insert("SOTONG_CRAWL_MAX_PAGES", "many");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "SOTONG_CRAWL_MAX_PAGES"),
        "expected InvalidEnvVar(SOTONG_CRAWL_MAX_PAGES), got: {result:?}"
    );
}

#[test]
fn zero_batch_size_is_rejected() {
    let mut map = HashMap::new();
    map.insert("SOTONG_TRAIN_BATCH_SIZE", "0");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "SOTONG_TRAIN_BATCH_SIZE"),
        "expected InvalidEnvVar(SOTONG_TRAIN_BATCH_SIZE), got: {result:?}"
    );
}

#[test]
fn negative_learning_rate_is_rejected() {
    let mut map = HashMap::new();
    map.insert("SOTONG_TRAIN_LEARNING_RATE", "-1e-5");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "SOTONG_TRAIN_LEARNING_RATE"),
        "expected InvalidEnvVar(SOTONG_TRAIN_LEARNING_RATE), got: {result:?}"
    );
}

#[test]
fn debug_lists_paths() {
    let map = HashMap::new();
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    let rendered = format!("{cfg:?}");
    assert!(rendered.contains("soop_community_data_raw.csv"));
}
