//! Fine-tuning of a pretrained ELECTRA encoder as a five-tier post
//! classifier.

pub mod data;
pub mod error;
pub mod metrics;
pub mod model;
pub mod schedule;
pub mod train;

#[cfg(test)]
mod fixtures;

pub use error::TrainError;
pub use metrics::{ClassificationReport, ConfusionMatrix};
pub use model::ElectraClassifier;
pub use schedule::LinearSchedule;
pub use train::{run_training, EpochStats, TrainConfig, TrainSummary};
