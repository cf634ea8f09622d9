use thiserror::Error;

#[derive(Debug, Error)]
pub enum FileError {
    #[error("i/o failure: {0}")]
    Io(#[from] std::io::Error),

    /// The file exists and is readable but its content cannot be parsed as
    /// a point-cloud array.
    #[error("malformed array file: {0}")]
    Corrupt(String),

    #[error("expected an [N, 3] point array, got shape {shape:?}")]
    BadShape { shape: Vec<usize> },
}
