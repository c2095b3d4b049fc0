//! Provisional tier labels from keyword heuristics, merged onto the rows
//! chosen by the sampler.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use sotong_core::{read_csv, write_csv, LabeledRecord, Post, Tier};

use crate::error::LabelingError;
use crate::keywords::{contains_any, CASCADE, NOTICE_MIN_CHARS, OPERATOR_NOTICE};

/// Assigns a provisional tier to `text`.
///
/// Operator notices win first but only for posts longer than
/// [`NOTICE_MIN_CHARS`] characters. Otherwise technical failures, policy
/// issues and feature requests are checked in that order, and anything
/// without a keyword hit is [`Tier::General`].
#[must_use]
pub fn assign_temp_label(text: &str) -> Tier {
    let lowered = text.to_lowercase();

    if contains_any(&lowered, OPERATOR_NOTICE) && text.chars().count() > NOTICE_MIN_CHARS {
        return Tier::OperatorNotice;
    }

    CASCADE
        .iter()
        .find(|(_, keywords)| contains_any(&lowered, keywords))
        .map_or(Tier::General, |(tier, _)| *tier)
}

/// Number of records per tier, indexed by label.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LabelDistribution(pub [usize; Tier::COUNT]);

impl LabelDistribution {
    #[must_use]
    pub fn from_records(records: &[LabeledRecord]) -> Self {
        let mut counts = [0usize; Tier::COUNT];
        for record in records {
            counts[usize::from(record.label.label())] += 1;
        }
        Self(counts)
    }

    #[must_use]
    pub fn count(&self, tier: Tier) -> usize {
        self.0[usize::from(tier.label())]
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.0.iter().sum()
    }
}

/// Outcome of [`run_labeling`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LabelRun {
    /// The labeled file was written.
    Written(LabelDistribution),
    /// An input file was missing; nothing was written.
    MissingInput(PathBuf),
}

/// Labels every raw post and merges the labels onto the sample rows.
///
/// Rows with an empty `post_id` or `content` are ignored on both sides. Each
/// sample row takes the label of the first raw row with the same
/// `(post_id, content)`; a sample row with no such raw row is
/// [`Tier::General`]. One output record is produced per kept sample row.
#[must_use]
pub fn label_samples(raw: &[Post], samples: &[(String, String)]) -> Vec<LabeledRecord> {
    let mut labels: HashMap<(&str, &str), Tier> = HashMap::new();
    for post in raw.iter().filter(|p| has_key(&p.post_id, &p.content)) {
        labels
            .entry((post.post_id.as_str(), post.content.as_str()))
            .or_insert_with(|| assign_temp_label(&post.content));
    }

    samples
        .iter()
        .filter(|(post_id, content)| has_key(post_id, content))
        .map(|(post_id, content)| LabeledRecord {
            content: content.clone(),
            label: labels
                .get(&(post_id.as_str(), content.as_str()))
                .copied()
                .unwrap_or(Tier::General),
        })
        .collect()
}

/// The two sample columns the merge reads. Other columns, including a
/// hand-edited `label`, are ignored.
#[derive(Debug, Deserialize)]
struct SampleKey {
    #[serde(default)]
    post_id: String,
    #[serde(default)]
    content: String,
}

fn has_key(post_id: &str, content: &str) -> bool {
    !post_id.trim().is_empty() && !content.trim().is_empty()
}

/// Reads the raw and sample files, labels the sample and writes the
/// `content,label` training file.
///
/// A missing input is reported with an error event and returned as
/// [`LabelRun::MissingInput`] without touching `output`.
///
/// # Errors
///
/// Returns [`LabelingError::Dataset`] when an existing input cannot be parsed
/// or the output cannot be written.
pub fn run_labeling(
    raw_path: &Path,
    sample_path: &Path,
    output: &Path,
) -> Result<LabelRun, LabelingError> {
    for path in [raw_path, sample_path] {
        if !path.exists() {
            tracing::error!(
                path = %path.display(),
                "input file not found; run the crawl and sample steps first"
            );
            return Ok(LabelRun::MissingInput(path.to_path_buf()));
        }
    }

    let raw: Vec<Post> = read_csv(raw_path)?;
    let samples: Vec<SampleKey> = read_csv(sample_path)?;
    tracing::info!(raw = raw.len(), samples = samples.len(), "labeling inputs loaded");

    let keys: Vec<(String, String)> = samples
        .into_iter()
        .map(|s| (s.post_id, s.content))
        .collect();
    let records = label_samples(&raw, &keys);

    write_csv(output, &LabeledRecord::COLUMNS, &records)?;

    let distribution = LabelDistribution::from_records(&records);
    for tier in Tier::ALL {
        tracing::info!(
            tier = tier.class_name(),
            count = distribution.count(tier),
            "label distribution"
        );
    }
    tracing::info!(
        total = distribution.total(),
        path = %output.display(),
        "labeled dataset saved"
    );
    tracing::warn!("labels are keyword heuristics; review them by hand before training");

    Ok(LabelRun::Written(distribution))
}

#[cfg(test)]
#[path = "labeler_test.rs"]
mod tests;
