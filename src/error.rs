use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("File not found or could not be read: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to read CSV table: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Failed to parse tuning JSON: {0}")]
    DeserializationError(#[from] serde_json::Error),

    #[error("Malformed value in '{file}' at row {row}: {message}")]
    MalformedCell { file: String, row: usize, message: String },

    #[error("Input tables are inconsistent: {0}")]
    InconsistentInput(String),

    #[error("Invalid configuration: {0}")]
    ConfigError(String),
}

pub type Result<T> = std::result::Result<T, Error>;
