use thiserror::Error;

#[derive(Debug, Error)]
pub enum TopicError {
    #[error("no document has a token left after dictionary pruning")]
    EmptyCorpus,

    #[error("failed to write {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Dataset(#[from] sotong_core::DatasetError),
}
