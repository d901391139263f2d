use std::path::PathBuf;

use thiserror::Error;

/// Errors surfaced by user actions against a plan or log.
///
/// None of these are fatal to a session: the presentation layer reports
/// them as a short message and carries on.
#[derive(Debug, Error)]
pub enum DietError {
    #[error("Invalid meal name: {0}")]
    InvalidName(String),

    #[error("Unknown food '{0}'")]
    UnknownFood(String),

    #[error("Invalid quantity {grams}g: must be greater than 0 and at most {max}g")]
    InvalidQuantity { grams: f64, max: f64 },

    #[error("No entry #{} (only {len} entries)", .index + 1)]
    EntryNotFound { index: usize, len: usize },

    #[error("Storage unavailable at {}: {message}", .path.display())]
    StorageUnavailable { path: PathBuf, message: String },
}

impl DietError {
    pub(crate) fn storage(path: impl Into<PathBuf>, err: impl std::fmt::Display) -> Self {
        Self::StorageUnavailable {
            path: path.into(),
            message: err.to_string(),
        }
    }

    #[must_use]
    pub fn is_storage(&self) -> bool {
        matches!(self, Self::StorageUnavailable { .. })
    }
}

pub type Result<T> = std::result::Result<T, DietError>;
