use std::io;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum PystatsError {
    #[error("Invalid filespec pattern '{spec}': {source}")]
    InvalidFilespec {
        spec: String,
        source: glob::PatternError,
    },

    #[error("Cannot read package root {}: {source}", path.display())]
    PackageRoot { path: PathBuf, source: io::Error },

    #[error("Error opening {}: {source}", path.display())]
    Read { path: PathBuf, source: io::Error },

    #[error("Error saving {}: {source}", path.display())]
    Write { path: PathBuf, source: io::Error },
}

pub type Result<T> = std::result::Result<T, PystatsError>;
