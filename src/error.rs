use std::path::PathBuf;

use uuid::Uuid;

/// Error type for all editor operations.
#[derive(Debug)]
pub enum EditorError {
    Io(std::io::Error),
    Image(image::ImageError),
    /// An operation carried parameters outside its valid range.
    /// Raised during validation, before the operation reaches the log.
    InvalidOp(String),
    UnsupportedFormat(String),
    FileTooLarge { size: u64, max: u64 },
    NoActiveAsset,
    UnknownAsset(Uuid),
    /// A text watermark was requested but no font is configured.
    MissingFont,
    /// The source file of an image watermark could not be read or decoded.
    WatermarkAsset { path: PathBuf, reason: String },
    Session(String),
}

impl std::fmt::Display for EditorError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EditorError::Io(e) => write!(f, "I/O error: {}", e),
            EditorError::Image(e) => write!(f, "Image error: {}", e),
            EditorError::InvalidOp(msg) => write!(f, "Invalid operation: {}", msg),
            EditorError::UnsupportedFormat(fmt) => {
                write!(f, "Unsupported file format: {}", fmt)
            }
            EditorError::FileTooLarge { size, max } => write!(
                f,
                "File too large: {:.2}MB (max: {}MB)",
                *size as f64 / 1024.0 / 1024.0,
                max / 1024 / 1024
            ),
            EditorError::NoActiveAsset => write!(f, "No active asset loaded"),
            EditorError::UnknownAsset(id) => write!(f, "Unknown asset id: {}", id),
            EditorError::MissingFont => {
                write!(f, "Text watermark requires a configured font")
            }
            EditorError::WatermarkAsset { path, reason } => {
                write!(f, "Watermark image '{}': {}", path.display(), reason)
            }
            EditorError::Session(msg) => write!(f, "Session error: {}", msg),
        }
    }
}

impl From<std::io::Error> for EditorError {
    fn from(e: std::io::Error) -> Self {
        EditorError::Io(e)
    }
}

impl From<image::ImageError> for EditorError {
    fn from(e: image::ImageError) -> Self {
        EditorError::Image(e)
    }
}
