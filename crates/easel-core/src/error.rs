//! Umbrella error for editor operations.

use crate::codec::FormatError;
use crate::config::ConfigError;
use crate::filter::FilterError;
use crate::import::ImportError;
use crate::scene::SceneError;
use crate::shapes::InvalidObject;
use crate::storage::StorageError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EditorError {
    #[error(transparent)]
    Scene(#[from] SceneError),
    #[error(transparent)]
    Format(#[from] FormatError),
    #[error(transparent)]
    Filter(#[from] FilterError),
    #[error(transparent)]
    Import(#[from] ImportError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("Invalid style: {0}")]
    Style(#[from] InvalidObject),
    #[error("Image import needs a decoder")]
    NoDecoder,
}

/// Result type for editor operations.
pub type EditorResult<T> = Result<T, EditorError>;
