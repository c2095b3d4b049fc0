//! Exploratory topic modelling over the crawled posts.
//!
//! Posts are reduced to noun tokens, turned into a pruned bag-of-words
//! corpus, fitted with a variational-Bayes LDA model and rendered as a
//! keyword report plus one SVG word cloud per topic.

pub mod dictionary;
pub mod error;
pub mod lda;
pub mod report;
pub mod tokenize;
pub mod wordcloud;

mod special;

pub use dictionary::{BagOfWords, Dictionary};
pub use error::TopicError;
pub use lda::{LdaConfig, LdaModel};
pub use report::{format_topic_line, run_topics, TopicRun, TopicsConfig};
pub use tokenize::{preprocess, HangulNouns, NounExtractor, STOP_WORDS};
pub use wordcloud::{render_svg, WordCloudOptions};
