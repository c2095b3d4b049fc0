//! Selection of posts for manual labeling.
//!
//! A uniform random draw keeps the sample representative; a second draw
//! from the remaining posts favours high-engagement threads and posts that
//! are recommended unusually often relative to their views.

use std::collections::HashSet;
use std::path::Path;

use rand::rngs::StdRng;
use rand::SeedableRng;
use sotong_core::{read_csv, write_csv, LabelingSample, Post};

use crate::error::LabelingError;

/// Engagement quantile above which a post is a strategic candidate.
const ENGAGEMENT_QUANTILE: f64 = 0.9;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SamplerConfig {
    pub random_sample_size: usize,
    pub strategic_sample_size: usize,
    pub seed: u64,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            random_sample_size: 1000,
            strategic_sample_size: 1000,
            seed: 42,
        }
    }
}

impl SamplerConfig {
    #[must_use]
    pub fn target(&self) -> usize {
        self.random_sample_size + self.strategic_sample_size
    }
}

/// The rows chosen for labeling and how many came from each draw.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleSelection {
    pub random_count: usize,
    pub strategic_count: usize,
    pub rows: Vec<LabelingSample>,
}

/// Coerces a scraped count cell into a non-negative integer.
///
/// Plain integers and decimal numbers are accepted (`"12.0"` is 12, fractions
/// truncate). Anything else, including thousands separators, blanks and
/// negative values, becomes 0.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn normalize_count(raw: &str) -> u64 {
    let raw = raw.trim();
    if let Ok(n) = raw.parse::<i64>() {
        return u64::try_from(n).unwrap_or(0);
    }
    match raw.parse::<f64>() {
        Ok(n) if n.is_finite() && n > 0.0 => n.trunc() as u64,
        _ => 0,
    }
}

fn to_sample(post: &Post) -> LabelingSample {
    LabelingSample {
        post_id: post.post_id.clone(),
        title: post.title.clone(),
        content: post.content.clone(),
        views: normalize_count(&post.views),
        recommends: normalize_count(&post.recommends),
        date: post.date.clone(),
        detail_url: post.detail_url.clone(),
        label: None,
    }
}

fn dedup_by_post_id(rows: impl IntoIterator<Item = LabelingSample>) -> Vec<LabelingSample> {
    let mut seen = HashSet::new();
    rows.into_iter()
        .filter(|row| seen.insert(row.post_id.clone()))
        .collect()
}

/// Draws `amount` rows (capped at the pool size) without replacement, in
/// draw order. Each call starts from a fresh RNG seeded with `seed`.
fn draw(pool: &[LabelingSample], amount: usize, seed: u64) -> Vec<usize> {
    let amount = amount.min(pool.len());
    let mut rng = StdRng::seed_from_u64(seed);
    rand::seq::index::sample(&mut rng, pool.len(), amount).into_vec()
}

/// Linear-interpolation quantile of `values`; 0 for an empty slice.
#[must_use]
pub(crate) fn quantile(values: &[f64], q: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    #[allow(clippy::cast_precision_loss)]
    let pos = q * (sorted.len() - 1) as f64;
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let lo = pos.floor() as usize;
    let hi = (lo + 1).min(sorted.len() - 1);
    #[allow(clippy::cast_precision_loss)]
    let frac = pos - lo as f64;
    sorted[lo] + (sorted[hi] - sorted[lo]) * frac
}

#[allow(clippy::cast_precision_loss)]
fn engagement(row: &LabelingSample) -> f64 {
    row.views as f64 + row.recommends as f64
}

#[allow(clippy::cast_precision_loss)]
fn recommended_above_views(row: &LabelingSample) -> bool {
    row.recommends as f64 > row.views as f64 / 100.0
}

/// Picks the labeling sample from `posts`.
///
/// Posts are de-duplicated by `post_id` first. The strategic draw only sees
/// posts the random draw did not take, so the two parts never overlap.
#[must_use]
pub fn select_samples(posts: &[Post], config: &SamplerConfig) -> SampleSelection {
    let all = dedup_by_post_id(posts.iter().map(to_sample));

    let random_idx = draw(&all, config.random_sample_size, config.seed);
    let taken: HashSet<usize> = random_idx.iter().copied().collect();
    let random: Vec<LabelingSample> = random_idx.iter().map(|&i| all[i].clone()).collect();

    let pool: Vec<LabelingSample> = all
        .into_iter()
        .enumerate()
        .filter(|(i, _)| !taken.contains(i))
        .map(|(_, row)| row)
        .collect();

    let engagements: Vec<f64> = pool.iter().map(engagement).collect();
    let threshold = quantile(&engagements, ENGAGEMENT_QUANTILE);
    let candidates: Vec<LabelingSample> = pool
        .into_iter()
        .filter(|row| engagement(row) >= threshold || recommended_above_views(row))
        .collect();
    tracing::debug!(threshold, candidates = candidates.len(), "strategic candidates");

    let strategic: Vec<LabelingSample> = draw(&candidates, config.strategic_sample_size, config.seed)
        .into_iter()
        .map(|i| candidates[i].clone())
        .collect();

    let random_count = random.len();
    let strategic_count = strategic.len();
    let rows = dedup_by_post_id(random.into_iter().chain(strategic));

    SampleSelection {
        random_count,
        strategic_count,
        rows,
    }
}

/// Reads the raw dataset, selects the labeling sample and writes it.
///
/// # Errors
///
/// Returns [`LabelingError::EmptyDataset`] when the input has no rows (the
/// output is not written) and [`LabelingError::Dataset`] when reading or
/// writing fails.
pub fn run_sampling(
    input: &Path,
    output: &Path,
    config: &SamplerConfig,
) -> Result<SampleSelection, LabelingError> {
    let posts: Vec<Post> = read_csv(input)?;
    if posts.is_empty() {
        tracing::error!(path = %input.display(), "raw dataset is empty; nothing to sample");
        return Err(LabelingError::EmptyDataset {
            path: input.display().to_string(),
        });
    }
    tracing::info!(posts = posts.len(), "raw dataset loaded");

    let selection = select_samples(&posts, config);
    write_csv(output, &LabelingSample::COLUMNS, &selection.rows)?;

    tracing::info!(
        random = selection.random_count,
        strategic = selection.strategic_count,
        total = selection.rows.len(),
        target = config.target(),
        path = %output.display(),
        "labeling sample saved"
    );
    Ok(selection)
}
