//! Error types for the LibreOfficeKit binding.

use std::ffi::NulError;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Failed to initialize LibreOfficeKit with path '{}': {reason}", path.display())]
    Initialization { path: PathBuf, reason: String },

    #[error("LibreOffice installation not found. Set LOK_PATH to its program directory.")]
    NotFound,

    #[error("LibreOfficeKit is already initialized in this process")]
    AlreadyInitialized,

    #[error("LibreOfficeKit was destroyed and cannot be initialized again in this process")]
    EngineTerminated,

    #[error("Failed to load document '{url}': {message}")]
    Load { url: String, message: String },

    #[error("Failed to save document to '{url}': {message}")]
    Save { url: String, message: String },

    #[error("Entry point not provided by this LibreOffice version: {0}")]
    Unsupported(&'static str),

    #[error("Tile buffer too small: need {required} bytes, got {actual}")]
    BufferTooSmall { required: usize, actual: usize },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Path is not valid UTF-8: {}", .0.display())]
    InvalidPath(PathBuf),

    #[error("String contains an interior NUL byte: {0}")]
    Nul(#[from] NulError),

    #[error("Unexpected {what} value from LibreOfficeKit: {value}")]
    UnexpectedValue { what: &'static str, value: i32 },

    #[error("Malformed page rectangle '{record}': {reason}")]
    MalformedRectangle { record: String, reason: String },

    #[error("Invalid version info: {0}")]
    VersionInfo(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
