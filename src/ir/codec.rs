//! Reader and writer contracts every format codec implements.

use std::path::{Path, PathBuf};

use super::category::CategoryMap;
use super::model::UnifiedLabel;
use crate::error::LabelError;

/// Indexed access to the records of one source dataset.
///
/// Every reader knows its record count up front, so callers can report
/// progress and jump to any record. Sequential iteration comes from
/// [`Labels`], built on top of `len` and `get`.
pub trait LabelReader {
    /// Registry name of the format this reader decodes.
    fn format_name(&self) -> &'static str;

    /// Number of records this reader will yield.
    fn len(&self) -> usize;

    /// Decodes the record at `index`.
    ///
    /// # Errors
    /// [`LabelError::IndexOutOfRange`] when `index >= len()`, or whatever
    /// decoding the record fails with.
    fn get(&self, index: usize) -> Result<UnifiedLabel, LabelError>;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<'a> IntoIterator for &'a (dyn LabelReader + 'a) {
    type Item = Result<UnifiedLabel, LabelError>;
    type IntoIter = Labels<'a>;

    fn into_iter(self) -> Self::IntoIter {
        Labels::new(self)
    }
}

/// Sequential iterator over a [`LabelReader`].
pub struct Labels<'a> {
    reader: &'a dyn LabelReader,
    next: usize,
    len: usize,
}

impl<'a> Labels<'a> {
    pub fn new(reader: &'a dyn LabelReader) -> Self {
        Self {
            reader,
            next: 0,
            len: reader.len(),
        }
    }
}

impl Iterator for Labels<'_> {
    type Item = Result<UnifiedLabel, LabelError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.len {
            return None;
        }
        let item = self.reader.get(self.next);
        self.next += 1;
        Some(item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.len - self.next;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Labels<'_> {}

/// Returns the bounds error for `index` when it is past `len`.
pub(crate) fn check_index(index: usize, len: usize) -> Result<(), LabelError> {
    if index >= len {
        Err(LabelError::IndexOutOfRange { index, len })
    } else {
        Ok(())
    }
}

/// Encodes a finished label sequence into one format on disk.
pub trait LabelWriter {
    /// Registry name of the format this writer encodes.
    fn format_name(&self) -> &'static str;

    /// Writes every record in `labels`.
    fn write(&self, labels: &[UnifiedLabel]) -> Result<WriteSummary, LabelError>;
}

/// What a writer produced.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct WriteSummary {
    pub images: usize,
    pub annotations: usize,
    /// Distinct categories emitted; `None` for formats without a category list.
    pub categories: Option<usize>,
    pub files: Vec<PathBuf>,
}

/// Inputs shared by every reader constructor.
#[derive(Clone, Debug)]
pub struct ReaderOptions {
    /// A single label file, or a directory of them.
    pub label_path: PathBuf,
    /// Root that image file names are resolved against.
    pub image_path: Option<PathBuf>,
    /// Configured id → name map.
    pub categories: CategoryMap,
}

impl ReaderOptions {
    pub fn new(label_path: impl Into<PathBuf>) -> Self {
        Self {
            label_path: label_path.into(),
            image_path: None,
            categories: CategoryMap::default(),
        }
    }

    pub fn with_image_path(mut self, image_path: impl Into<PathBuf>) -> Self {
        self.image_path = Some(image_path.into());
        self
    }

    pub fn with_categories(mut self, categories: CategoryMap) -> Self {
        self.categories = categories;
        self
    }

    /// The image root: the explicit one, or `images/` beside the labels.
    pub fn image_root(&self) -> PathBuf {
        match &self.image_path {
            Some(path) => path.clone(),
            None => self
                .label_path
                .parent()
                .unwrap_or_else(|| Path::new(""))
                .join("images"),
        }
    }
}
