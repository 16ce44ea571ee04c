//! Per-image annotation record shared by every codec.
//!
//! Readers produce one [`UnifiedLabel`] per source image; writers consume
//! them. Nothing else crosses a codec boundary.

use std::path::{Path, PathBuf};

use super::bbox::BBox;

/// One image's full annotation record.
#[derive(Clone, Debug, PartialEq)]
pub struct UnifiedLabel {
    /// Path (or bare identifier) of the associated image. Only touched on
    /// disk when a reader has to probe dimensions.
    pub image_path: PathBuf,

    /// Width of the image in pixels.
    pub image_width: u32,

    /// Height of the image in pixels.
    pub image_height: u32,

    /// Boxes in annotation order.
    pub bboxes: Vec<BBox>,

    /// Raster masks. No codec reads or writes these yet.
    pub masks: Vec<Mask>,
}

impl UnifiedLabel {
    /// Creates a record with no boxes and no masks.
    pub fn new(image_path: impl Into<PathBuf>, image_width: u32, image_height: u32) -> Self {
        Self {
            image_path: image_path.into(),
            image_width,
            image_height,
            bboxes: Vec::new(),
            masks: Vec::new(),
        }
    }

    /// Sets the boxes for this record.
    pub fn with_bboxes(mut self, bboxes: Vec<BBox>) -> Self {
        self.bboxes = bboxes;
        self
    }

    /// The image's base name including extension, e.g. `0001.jpg`.
    pub fn file_name(&self) -> Option<String> {
        self.image_path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .filter(|name| !name.is_empty())
    }

    /// The image's base name without extension, e.g. `0001`.
    pub fn file_stem(&self) -> Option<String> {
        self.image_path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .filter(|stem| !stem.is_empty())
    }

    /// Name of the directory directly containing the image, if any.
    pub fn folder_name(&self) -> Option<String> {
        self.image_path
            .parent()
            .and_then(Path::file_name)
            .map(|name| name.to_string_lossy().into_owned())
    }
}

/// A single-channel raster mask aligned with its image.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Mask {
    pub width: u32,
    pub height: u32,
    /// Row-major, one byte per pixel.
    pub data: Vec<u8>,
}
