use std::path::PathBuf;

use thiserror::Error;

/// Reasons a candidate JSON file cannot become a descriptor.
#[derive(Debug, Error)]
pub enum DescriptorError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("{path} is not valid JSON: {source}")]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("{path} has invalid render data: {message}")]
    InvalidData { path: PathBuf, message: String },
}

impl DescriptorError {
    pub fn invalid_data(path: PathBuf, message: impl Into<String>) -> Self {
        Self::InvalidData {
            path,
            message: message.into(),
        }
    }
}
