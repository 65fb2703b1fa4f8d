//! Operator-facing failures. The `Display` text is what the alert shows.

use thiserror::Error;

/// Loading an image into the session.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Please upload a valid image file. ('{name}' is not a supported image)")]
    NotAnImage { name: String },

    #[error("Error reading image file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Error loading image. Please try another file. ({0})")]
    Decode(#[from] image::ImageError),

    #[error("Image decoder stopped unexpectedly")]
    WorkerGone,
}

/// Producing the exported configuration.
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Please upload an image first.")]
    NoImage,

    #[error("Please define at least one region.")]
    NoRegions,

    #[error("Failed to serialize config: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Failed to write config: {0}")]
    Io(#[from] std::io::Error),
}

impl ExportError {
    /// Validation failures are expected operator mistakes, not faults.
    pub fn is_validation(&self) -> bool {
        matches!(self, ExportError::NoImage | ExportError::NoRegions)
    }
}
