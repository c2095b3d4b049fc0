use thiserror::Error;

#[derive(Debug, Error)]
pub enum LabelingError {
    #[error("input dataset {path} has no rows")]
    EmptyDataset { path: String },

    #[error(transparent)]
    Dataset(#[from] sotong_core::DatasetError),
}
