mod stages;

use clap::{Parser, Subcommand};
use sotong_core::AppConfig;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "sotong-cli")]
#[command(about = "Community board crawl, labeling, classifier training and topic analysis")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Crawl the board list and post bodies into the raw dataset
    Crawl {
        /// Stop after this many list pages instead of the configured limit
        #[arg(long)]
        max_pages: Option<u32>,

        /// Draw the labeling sample as soon as the crawl is saved
        #[arg(long)]
        then_sample: bool,
    },
    /// Draw the random plus high-engagement labeling sample
    Sample,
    /// Assign keyword labels to the sample
    Label,
    /// Fine-tune the classifier on the labeled sample
    Train {
        /// Override the configured number of epochs
        #[arg(long)]
        epochs: Option<usize>,
    },
    /// Fit LDA topics over the raw dataset and draw word clouds
    Topics {
        /// Override the number of topics
        #[arg(long)]
        num_topics: Option<usize>,
    },
}

/// Loads `.env` (when present) into the process, then reads `SOTONG_*`.
fn load_config() -> anyhow::Result<AppConfig> {
    dotenvy::dotenv().ok();
    Ok(sotong_core::load_app_config_from_env()?)
}

fn init_tracing(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = load_config()?;
    init_tracing(&config.log_level);
    tracing::debug!(?config, "configuration loaded");

    match cli.command {
        Some(Commands::Crawl {
            max_pages,
            then_sample,
        }) => stages::crawl(&config, max_pages, then_sample).await,
        Some(Commands::Sample) => stages::sample(&config),
        Some(Commands::Label) => stages::label(&config),
        Some(Commands::Train { epochs }) => stages::train(&config, epochs).await,
        Some(Commands::Topics { num_topics }) => stages::topics(&config, num_topics).await,
        None => {
            println!("no stage given; run `sotong-cli --help` to list them");
            Ok(())
        }
    }
}
