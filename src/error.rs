use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("Invalid image path: {}", .0.display())]
    InvalidInputPath(PathBuf),

    #[error("Invalid image file {}: {source}", .path.display())]
    InvalidImageFile {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("{0}")]
    InvalidArgument(String),

    #[error("Output directory does not exist: {}", .0.display())]
    InvalidOutputPath(PathBuf),

    #[error("Failed to write {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ExtractError {
    /// Process exit status for this error. Usage errors reported by the
    /// argument parser itself exit with 2, so the codes here start at 3.
    pub fn exit_code(&self) -> u8 {
        match self {
            ExtractError::Io { .. } => 1,
            ExtractError::InvalidInputPath(_) => 3,
            ExtractError::InvalidImageFile { .. } => 4,
            ExtractError::InvalidArgument(_) => 5,
            ExtractError::InvalidOutputPath(_) => 6,
        }
    }
}

pub type Result<T, E = ExtractError> = std::result::Result<T, E>;
