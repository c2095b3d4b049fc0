//! Token ids, document frequencies and bag-of-words conversion.

use std::collections::HashMap;

/// A document as `(token id, count)` pairs sorted by id.
pub type BagOfWords = Vec<(usize, u32)>;

/// Mapping between tokens and dense integer ids, with per-token document
/// frequencies.
#[derive(Debug, Clone, Default)]
pub struct Dictionary {
    token2id: HashMap<String, usize>,
    id2token: Vec<String>,
    dfs: Vec<usize>,
    num_docs: usize,
}

impl Dictionary {
    /// Builds a dictionary over `documents`. Ids follow first appearance.
    #[must_use]
    pub fn from_documents(documents: &[Vec<String>]) -> Self {
        let mut dict = Self::default();
        for doc in documents {
            dict.add_document(doc);
        }
        dict
    }

    fn add_document(&mut self, tokens: &[String]) {
        self.num_docs += 1;
        let mut seen: Vec<usize> = Vec::new();
        for token in tokens {
            let id = match self.token2id.get(token) {
                Some(&id) => id,
                None => {
                    let id = self.id2token.len();
                    self.token2id.insert(token.clone(), id);
                    self.id2token.push(token.clone());
                    self.dfs.push(0);
                    id
                }
            };
            if !seen.contains(&id) {
                seen.push(id);
                self.dfs[id] += 1;
            }
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.id2token.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.id2token.is_empty()
    }

    #[must_use]
    pub fn num_docs(&self) -> usize {
        self.num_docs
    }

    #[must_use]
    pub fn token(&self, id: usize) -> Option<&str> {
        self.id2token.get(id).map(String::as_str)
    }

    #[must_use]
    pub fn id(&self, token: &str) -> Option<usize> {
        self.token2id.get(token).copied()
    }

    /// Number of documents containing `token`.
    #[must_use]
    pub fn doc_freq(&self, token: &str) -> Option<usize> {
        self.id(token).map(|id| self.dfs[id])
    }

    /// Drops rare and overly common tokens, then keeps at most `keep_n` of
    /// the most frequent survivors.
    ///
    /// A token survives when it appears in at least `no_below` documents and
    /// in no more than `no_above` (a fraction) of all documents. Ids are
    /// reassigned densely, preserving the relative order of kept tokens.
    pub fn filter_extremes(&mut self, no_below: usize, no_above: f64, keep_n: usize) {
        #[allow(
            clippy::cast_precision_loss,
            clippy::cast_possible_truncation,
            clippy::cast_sign_loss
        )]
        let no_above_abs = (no_above * self.num_docs as f64) as usize;

        let mut good: Vec<usize> = (0..self.len())
            .filter(|&id| self.dfs[id] >= no_below && self.dfs[id] <= no_above_abs)
            .collect();
        // Stable sort keeps first-appearance order among equal frequencies.
        good.sort_by(|a, b| self.dfs[*b].cmp(&self.dfs[*a]));
        good.truncate(keep_n);
        good.sort_unstable();

        let before = self.len();
        let mut token2id = HashMap::with_capacity(good.len());
        let mut id2token = Vec::with_capacity(good.len());
        let mut dfs = Vec::with_capacity(good.len());
        for old in good {
            token2id.insert(self.id2token[old].clone(), id2token.len());
            id2token.push(self.id2token[old].clone());
            dfs.push(self.dfs[old]);
        }
        self.token2id = token2id;
        self.id2token = id2token;
        self.dfs = dfs;

        tracing::debug!(before, after = self.len(), "dictionary pruned");
    }

    /// Counts the known tokens of `tokens`. Unknown tokens are ignored.
    #[must_use]
    pub fn doc2bow(&self, tokens: &[String]) -> BagOfWords {
        let mut counts: HashMap<usize, u32> = HashMap::new();
        for token in tokens {
            if let Some(&id) = self.token2id.get(token) {
                *counts.entry(id).or_insert(0) += 1;
            }
        }
        let mut bow: BagOfWords = counts.into_iter().collect();
        bow.sort_unstable_by_key(|&(id, _)| id);
        bow
    }
}
