use std::path::PathBuf;
use thiserror::Error;

/// The main error type for labelshift operations.
#[derive(Debug, Error)]
pub enum LabelError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Category map not found at {path}")]
    CategoryMapNotFound { path: PathBuf },

    #[error("Failed to parse category map {path}: {source}")]
    CategoryMapParse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Invalid category map: {message}")]
    CategoryMapInvalid { message: String },

    #[error("Invalid label path {path}: {message}")]
    LabelPathInvalid { path: PathBuf, message: String },

    #[error("Failed to parse COCO JSON from {path}: {source}")]
    CocoJsonParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to write COCO JSON to {path}: {source}")]
    CocoJsonWrite {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to parse VOC XML {path}: {message}")]
    VocXmlParse { path: PathBuf, message: String },

    #[error("Failed to parse YOLO label {path}:{line}: {message}")]
    YoloLabelParse {
        path: PathBuf,
        line: usize,
        message: String,
    },

    #[error("No image found for label {label_path} (looked for {expected})")]
    ImageNotFound {
        label_path: PathBuf,
        expected: String,
    },

    #[error("Failed to read image dimensions from {path}: {source}")]
    ImageDimensionRead {
        path: PathBuf,
        #[source]
        source: imagesize::ImageError,
    },

    #[error("Image {image_path} has invalid dimensions {width}x{height}")]
    InvalidImageDimensions {
        image_path: PathBuf,
        width: u32,
        height: u32,
    },

    #[error("Invalid output path {path}: {message}")]
    OutputPathInvalid { path: PathBuf, message: String },

    #[error("Unknown {role} format '{name}' (available: {available})")]
    UnknownFormat {
        role: &'static str,
        name: String,
        available: String,
    },

    #[error("Index {index} out of range for {len} record(s)")]
    IndexOutOfRange { index: usize, len: usize },
}

/// Coarse classification of a [`LabelError`].
///
/// Every failure is fatal; the kind only tells the caller which part of the
/// pipeline gave up.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// Category map missing, malformed, or unusable.
    Config,
    /// Malformed source record.
    Format,
    /// Missing or unreadable file, or an unusable output location.
    Io,
    /// Unregistered format name.
    NotFound,
    /// Out-of-range access into a reader.
    Index,
}

impl LabelError {
    /// Returns the taxonomy bucket this error belongs to.
    pub fn kind(&self) -> ErrorKind {
        match self {
            LabelError::CategoryMapNotFound { .. }
            | LabelError::CategoryMapParse { .. }
            | LabelError::CategoryMapInvalid { .. } => ErrorKind::Config,
            LabelError::CocoJsonParse { .. }
            | LabelError::VocXmlParse { .. }
            | LabelError::YoloLabelParse { .. }
            | LabelError::InvalidImageDimensions { .. } => ErrorKind::Format,
            LabelError::Io(_)
            | LabelError::LabelPathInvalid { .. }
            | LabelError::CocoJsonWrite { .. }
            | LabelError::ImageNotFound { .. }
            | LabelError::ImageDimensionRead { .. }
            | LabelError::OutputPathInvalid { .. } => ErrorKind::Io,
            LabelError::UnknownFormat { .. } => ErrorKind::NotFound,
            LabelError::IndexOutOfRange { .. } => ErrorKind::Index,
        }
    }
}
