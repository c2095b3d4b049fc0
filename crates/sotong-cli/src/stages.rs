//! One handler per pipeline stage.
//!
//! Handlers translate [`AppConfig`] into each crate's own config, run the
//! stage and print the human-facing summary. CPU-bound stages run on the
//! blocking pool.

use anyhow::Context;
use sotong_core::{AppConfig, Tier};
use sotong_crawler::{run_crawl, CrawlConfig};
use sotong_labeling::{run_labeling, run_sampling, LabelRun, SamplerConfig};
use sotong_topics::{format_topic_line, run_topics, HangulNouns, TopicRun, TopicsConfig};
use sotong_trainer::{run_training, TrainConfig};

pub(crate) async fn crawl(
    config: &AppConfig,
    max_pages: Option<u32>,
    then_sample: bool,
) -> anyhow::Result<()> {
    let mut crawl_config = CrawlConfig::from_app_config(config);
    if let Some(pages) = max_pages {
        crawl_config.max_pages = pages;
    }

    let report = run_crawl(&crawl_config, &config.raw_path).await?;
    println!(
        "crawled {} posts, removed {}, saved {} to {}",
        report.attempted,
        report.removed,
        report.posts.len(),
        config.raw_path.display()
    );
    if let Some(reason) = &report.aborted {
        println!("crawl stopped early: {reason}");
    }

    if then_sample {
        sample(config)?;
    }
    Ok(())
}

pub(crate) fn sample(config: &AppConfig) -> anyhow::Result<()> {
    let selection = run_sampling(
        &config.raw_path,
        &config.sample_path,
        &SamplerConfig::default(),
    )?;
    println!(
        "sampled {} rows ({} random, {} strategic) into {}",
        selection.rows.len(),
        selection.random_count,
        selection.strategic_count,
        config.sample_path.display()
    );
    Ok(())
}

pub(crate) fn label(config: &AppConfig) -> anyhow::Result<()> {
    match run_labeling(&config.raw_path, &config.sample_path, &config.labeled_path)? {
        LabelRun::Written(distribution) => {
            println!("labels written to {}", config.labeled_path.display());
            for tier in Tier::ALL {
                println!("  {}: {}", tier.class_name(), distribution.count(tier));
            }
            println!("check the labels by hand before training");
        }
        LabelRun::MissingInput(path) => {
            println!("input file not found: {}", path.display());
        }
    }
    Ok(())
}

pub(crate) async fn train(config: &AppConfig, epochs: Option<usize>) -> anyhow::Result<()> {
    let mut train_config = TrainConfig::from_app_config(config);
    if let Some(epochs) = epochs {
        anyhow::ensure!(epochs > 0, "--epochs must be greater than zero");
        train_config.epochs = epochs;
    }

    let summary = tokio::task::spawn_blocking(move || run_training(&train_config))
        .await
        .context("training task panicked")??;

    for stats in &summary.history {
        println!(
            "epoch {}: train loss {:.4}, validation accuracy {:.4}",
            stats.epoch, stats.train_loss, stats.val_accuracy
        );
    }
    println!("\n{}", summary.report);
    println!("{}", summary.confusion);
    println!("model saved to {}", summary.output_path.display());
    Ok(())
}

pub(crate) async fn topics(config: &AppConfig, num_topics: Option<usize>) -> anyhow::Result<()> {
    let mut topics_config = TopicsConfig::new(config.topics_dir.clone(), config.font_path.clone());
    if let Some(n) = num_topics {
        anyhow::ensure!(n > 0, "--num-topics must be greater than zero");
        topics_config.lda.num_topics = n;
    }
    let input = config.topics_input_path.clone();

    let run = tokio::task::spawn_blocking(move || run_topics(&input, &HangulNouns, &topics_config))
        .await
        .context("topic task panicked")??;

    match run {
        TopicRun::Finished { topics, clouds } => {
            for topic in &topics {
                println!("{}", format_topic_line(topic));
            }
            for cloud in &clouds {
                println!("word cloud: {}", cloud.display());
            }
        }
        TopicRun::MissingInput(path) => {
            println!("input file not found: {}", path.display());
        }
    }
    Ok(())
}
