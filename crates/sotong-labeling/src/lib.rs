//! Labeling stage: choose which posts people should label, and give every
//! post a provisional tier from keyword heuristics.
//!
//! The sampler mixes a uniform random draw with an engagement-weighted
//! draw. The labeler assigns tiers by keyword cascade and merges them onto
//! the sampled rows to produce the training file.

pub mod error;
pub mod keywords;
pub mod labeler;
pub mod sampler;

pub use error::LabelingError;
pub use labeler::{assign_temp_label, label_samples, run_labeling, LabelDistribution, LabelRun};
pub use sampler::{normalize_count, run_sampling, select_samples, SampleSelection, SamplerConfig};
