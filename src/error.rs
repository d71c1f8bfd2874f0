//! Import error types.

use std::path::PathBuf;

use thiserror::Error;

/// Errors surfaced by [`load_model`](crate::resources::load_model).
///
/// Structural failures abort the whole load and never return a partially
/// populated [`Model`](crate::data_structures::model::Model). Texture decode
/// failures are deliberately *not* represented here: an unreadable image
/// degrades to an invalid-handle texture plus an error log and the load
/// carries on (see [`resources::texture`](crate::resources::texture)).
#[derive(Debug, Error)]
pub enum ImportError {
    /// The file extension matched neither recognized model family.
    #[error("unsupported model format `{extension}`")]
    UnsupportedFormat { extension: String },

    /// The source file could not be read from disk.
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The source file was readable but malformed or incomplete.
    #[error("malformed model file {path}: {message}")]
    Parse { path: PathBuf, message: String },
}
