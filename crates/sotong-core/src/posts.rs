use serde::{Deserialize, Serialize};

use crate::tier::Tier;

/// One community board post, as written to the raw dataset.
///
/// `views` and `recommends` keep the list-cell text exactly as scraped; the
/// sampler is responsible for coercing them into counts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub post_id: String,
    pub title: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub views: String,
    #[serde(default)]
    pub recommends: String,
    #[serde(default)]
    pub detail_url: String,
    /// Body text from the detail page. Empty until the detail pass ran.
    #[serde(default)]
    pub content: String,
}

/// A candidate row handed to human labelers.
///
/// Field order is the on-disk column order of the sampling file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelingSample {
    pub post_id: String,
    pub title: String,
    pub content: String,
    pub views: u64,
    pub recommends: u64,
    pub date: String,
    pub detail_url: String,
    pub label: Option<Tier>,
}

/// Final training unit: body text and its tier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabeledRecord {
    pub content: String,
    pub label: Tier,
}

/// A latent topic: words ranked by weight, heaviest first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Topic {
    pub topic_id: usize,
    pub words: Vec<(String, f64)>,
}

impl Topic {
    /// Returns at most `n` of the heaviest words.
    #[must_use]
    pub fn top_words(&self, n: usize) -> &[(String, f64)] {
        &self.words[..n.min(self.words.len())]
    }
}
