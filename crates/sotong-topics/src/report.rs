//! End-to-end topic run: load posts, fit the model, print keywords and write
//! word clouds.

use std::path::{Path, PathBuf};

use sotong_core::{read_csv, Post, Topic};

use crate::dictionary::{BagOfWords, Dictionary};
use crate::error::TopicError;
use crate::lda::{LdaConfig, LdaModel};
use crate::tokenize::{preprocess, NounExtractor};
use crate::wordcloud::{cloud_file_name, render_svg, WordCloudOptions};

/// Words printed per topic in the keyword report.
pub const REPORT_WORDS: usize = 10;
/// Words drawn per topic in the word cloud.
pub const CLOUD_WORDS: usize = 20;

#[derive(Debug, Clone)]
pub struct TopicsConfig {
    pub lda: LdaConfig,
    pub no_below: usize,
    pub no_above: f64,
    pub keep_n: usize,
    pub output_dir: PathBuf,
    pub font_path: PathBuf,
}

impl TopicsConfig {
    #[must_use]
    pub fn new(output_dir: PathBuf, font_path: PathBuf) -> Self {
        Self {
            lda: LdaConfig::default(),
            no_below: 5,
            no_above: 0.5,
            keep_n: 100_000,
            output_dir,
            font_path,
        }
    }
}

/// Outcome of [`run_topics`].
#[derive(Debug, Clone)]
pub enum TopicRun {
    Finished {
        topics: Vec<Topic>,
        clouds: Vec<PathBuf>,
    },
    /// The input file was missing; nothing was fitted.
    MissingInput(PathBuf),
}

/// Formats one report line: `Topic 1: 서버, 접속, ...`.
#[must_use]
pub fn format_topic_line(topic: &Topic) -> String {
    let words: Vec<&str> = topic
        .top_words(REPORT_WORDS)
        .iter()
        .map(|(w, _)| w.as_str())
        .collect();
    format!("Topic {}: {}", topic.topic_id + 1, words.join(", "))
}

/// Tokenizes every post with content and builds the pruned corpus.
fn build_corpus(
    posts: &[Post],
    extractor: &dyn NounExtractor,
    config: &TopicsConfig,
) -> (Dictionary, Vec<BagOfWords>) {
    let documents: Vec<Vec<String>> = posts
        .iter()
        .filter(|p| !p.content.trim().is_empty())
        .map(|p| preprocess(&p.content, extractor))
        .collect();

    let mut dictionary = Dictionary::from_documents(&documents);
    dictionary.filter_extremes(config.no_below, config.no_above, config.keep_n);
    let corpus = documents.iter().map(|d| dictionary.doc2bow(d)).collect();
    (dictionary, corpus)
}

/// Fits topics over the `content` column of `input` and writes one word
/// cloud per topic into `config.output_dir`.
///
/// # Errors
///
/// Returns [`TopicError::EmptyCorpus`] when no token survives pruning,
/// [`TopicError::Dataset`] when `input` cannot be parsed and
/// [`TopicError::Io`] when a word cloud cannot be written.
pub fn run_topics(
    input: &Path,
    extractor: &dyn NounExtractor,
    config: &TopicsConfig,
) -> Result<TopicRun, TopicError> {
    if !input.exists() {
        tracing::error!(path = %input.display(), "input file not found; run the crawl step first");
        return Ok(TopicRun::MissingInput(input.to_path_buf()));
    }

    let posts: Vec<Post> = read_csv(input)?;
    tracing::info!(posts = posts.len(), "topic input loaded");

    let (dictionary, corpus) = build_corpus(&posts, extractor, config);
    if dictionary.is_empty() {
        return Err(TopicError::EmptyCorpus);
    }
    tracing::info!(
        documents = corpus.len(),
        vocabulary = dictionary.len(),
        "corpus built"
    );

    let model = LdaModel::train(&corpus, dictionary.len(), &config.lda);
    let topics = model.topics(&dictionary, CLOUD_WORDS);
    for topic in &topics {
        tracing::info!("{}", format_topic_line(topic));
    }

    std::fs::create_dir_all(&config.output_dir).map_err(|source| TopicError::Io {
        path: config.output_dir.display().to_string(),
        source,
    })?;
    let options = WordCloudOptions::default().with_font(&config.font_path);
    let mut clouds = Vec::with_capacity(topics.len());
    for topic in &topics {
        let path = config.output_dir.join(cloud_file_name(topic));
        std::fs::write(&path, render_svg(&topic.words, &options)).map_err(|source| {
            TopicError::Io {
                path: path.display().to_string(),
                source,
            }
        })?;
        clouds.push(path);
    }
    tracing::info!(
        clouds = clouds.len(),
        dir = %config.output_dir.display(),
        "word clouds written"
    );

    Ok(TopicRun::Finished { topics, clouds })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokenize::HangulNouns;
    use sotong_core::write_csv;

    fn post(id: usize, content: &str) -> Post {
        Post {
            post_id: id.to_string(),
            title: String::new(),
            author: String::new(),
            date: String::new(),
            views: String::new(),
            recommends: String::new(),
            detail_url: String::new(),
            content: content.to_string(),
        }
    }

    fn topics_config(dir: &Path) -> TopicsConfig {
        let mut config = TopicsConfig::new(dir.join("clouds"), dir.join("missing.ttf"));
        config.lda.num_topics = 2;
        config
    }

    #[test]
    fn format_topic_line_numbers_from_one() {
        let topic = Topic {
            topic_id: 2,
            words: vec![("서버".to_string(), 0.3), ("접속".to_string(), 0.2)],
        };
        assert_eq!(format_topic_line(&topic), "Topic 3: 서버, 접속");
    }

    #[test]
    fn blank_posts_are_not_documents() {
        let dir = tempfile::tempdir().unwrap();
        let posts = vec![post(1, "서버 접속"), post(2, "   ")];
        let mut config = topics_config(dir.path());
        config.no_below = 1;
        config.no_above = 1.0;

        let (dictionary, corpus) = build_corpus(&posts, &HangulNouns, &config);

        assert_eq!(corpus.len(), 1);
        assert_eq!(dictionary.num_docs(), 1);
    }

    #[test]
    fn writes_one_cloud_per_topic() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("raw.csv");
        let posts: Vec<Post> = (0..20)
            .map(|i| {
                if i % 2 == 0 {
                    post(i, "서버 접속 끊김 로딩")
                } else {
                    post(i, "화질 옵션 구독 선물")
                }
            })
            .collect();
        write_csv(&input, &Post::COLUMNS, &posts).unwrap();

        let run = run_topics(&input, &HangulNouns, &topics_config(dir.path())).unwrap();

        let TopicRun::Finished { topics, clouds } = run else {
            panic!("expected a finished run");
        };
        assert_eq!(topics.len(), 2);
        assert_eq!(clouds.len(), 2);
        for cloud in &clouds {
            let svg = std::fs::read_to_string(cloud).unwrap();
            assert!(svg.starts_with("<svg"));
        }
    }

    #[test]
    fn missing_input_returns_early() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("absent.csv");
        let run = run_topics(&input, &HangulNouns, &topics_config(dir.path())).unwrap();
        assert!(matches!(run, TopicRun::MissingInput(p) if p == input));
        assert!(!dir.path().join("clouds").exists());
    }

    #[test]
    fn corpus_without_frequent_tokens_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("raw.csv");
        write_csv(&input, &Post::COLUMNS, &[post(1, "서버 접속")]).unwrap();

        let result = run_topics(&input, &HangulNouns, &topics_config(dir.path()));
        assert!(matches!(result, Err(TopicError::EmptyCorpus)));
    }
}
