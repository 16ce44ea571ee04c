//! Filesystem helpers shared by the format codecs.

use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, warn};
use walkdir::WalkDir;

use crate::error::LabelError;

/// Lists the label files a reader should consume.
///
/// `path` may be a single file with extension `ext`, or a directory that is
/// scanned flat (non-recursive). Directory results are sorted by file name.
pub(crate) fn collect_label_files(path: &Path, ext: &str) -> Result<Vec<PathBuf>, LabelError> {
    if path.is_file() {
        if has_extension(path, ext) {
            return Ok(vec![path.to_path_buf()]);
        }
        return Err(LabelError::LabelPathInvalid {
            path: path.to_path_buf(),
            message: format!("expected a .{ext} file or a directory of .{ext} files"),
        });
    }

    if !path.is_dir() {
        return Err(LabelError::LabelPathInvalid {
            path: path.to_path_buf(),
            message: "path does not exist".to_string(),
        });
    }

    let mut files = Vec::new();
    for entry in fs::read_dir(path).map_err(LabelError::Io)? {
        let entry = entry.map_err(LabelError::Io)?;
        let entry_path = entry.path();
        if entry_path.is_file() && has_extension(&entry_path, ext) {
            files.push(entry_path);
        }
    }
    files.sort_by_cached_key(|file| {
        file.file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_default()
    });

    let nested = WalkDir::new(path)
        .follow_links(true)
        .min_depth(2)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file() && has_extension(entry.path(), ext))
        .count();
    if nested > 0 {
        warn!(
            "{} is scanned flat (non-recursive); skipping {} nested .{} file(s)",
            path.display(),
            nested,
            ext
        );
    }

    debug!("found {} .{} file(s) in {}", files.len(), ext, path.display());
    Ok(files)
}

pub(crate) fn has_extension(path: &Path, ext: &str) -> bool {
    path.extension()
        .and_then(|found| found.to_str())
        .map(|found| found.eq_ignore_ascii_case(ext))
        .unwrap_or(false)
}

/// Reads `(width, height)` from an image header without decoding pixels.
pub(crate) fn read_image_dimensions(path: &Path) -> Result<(u32, u32), LabelError> {
    let size = imagesize::size(path).map_err(|source| LabelError::ImageDimensionRead {
        path: path.to_path_buf(),
        source,
    })?;

    let width: u32 = size
        .width
        .try_into()
        .map_err(|_| LabelError::LabelPathInvalid {
            path: path.to_path_buf(),
            message: format!("image width {} does not fit in u32", size.width),
        })?;

    let height: u32 = size
        .height
        .try_into()
        .map_err(|_| LabelError::LabelPathInvalid {
            path: path.to_path_buf(),
            message: format!("image height {} does not fit in u32", size.height),
        })?;

    Ok((width, height))
}

/// Creates `dir` (and parents) unless it already exists as a directory.
pub(crate) fn ensure_output_dir(dir: &Path) -> Result<(), LabelError> {
    if dir.exists() && !dir.is_dir() {
        return Err(LabelError::OutputPathInvalid {
            path: dir.to_path_buf(),
            message: "exists and is not a directory".to_string(),
        });
    }
    fs::create_dir_all(dir).map_err(LabelError::Io)
}
