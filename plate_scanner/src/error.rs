use std::path::PathBuf;

use crate::config::ConfigError;

#[derive(Debug, thiserror::Error)]
pub enum ScannerError {
    #[error("Haar cascade xml file not found or could not be loaded: {path} ({reason})")]
    ClassifierLoad { path: PathBuf, reason: String },
    #[error("failed to prepare output directory {path}: {source}")]
    OutputDir {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to write plate image {0}")]
    PlateWrite(PathBuf),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("opencv: {0}")]
    OpenCv(#[from] opencv::Error),
}
