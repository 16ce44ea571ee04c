//! YOLO text label reader and writer.
//!
//! One `.txt` file per image, one `class_id cx cy w h` row per box, all
//! coordinates normalized by the image size. The label files do not record
//! that size, so the reader probes the companion image (same stem, under the
//! image root) for it.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};

use super::category::CategoryMap;
use super::codec::{check_index, LabelReader, LabelWriter, ReaderOptions, WriteSummary};
use super::coord::Cxcywh;
use super::files::{collect_label_files, ensure_output_dir, read_image_dimensions};
use super::{BBox, UnifiedLabel};
use crate::error::LabelError;

/// Registry name of this codec.
pub const FORMAT_NAME: &str = "yolo";

/// Companion image extensions, in lookup order.
pub const IMAGE_EXTENSIONS: [&str; 5] = ["jpg", "jpeg", "png", "bmp", "webp"];

const LABEL_EXTENSION: &str = "txt";

// ============================================================================
// Reader
// ============================================================================

/// Reads one YOLO label file or a directory of them.
///
/// A label file whose companion image is missing or unreadable is an error,
/// never a skipped record.
#[derive(Debug)]
pub struct YoloReader {
    files: Vec<PathBuf>,
    image_root: PathBuf,
    categories: CategoryMap,
}

impl YoloReader {
    /// Lists the `.txt` files under `opts.label_path`.
    pub fn open(opts: &ReaderOptions) -> Result<Self, LabelError> {
        let files = collect_label_files(&opts.label_path, LABEL_EXTENSION)?;
        info!("[yolo] found {} label file(s)", files.len());

        Ok(Self {
            files,
            image_root: opts.image_root(),
            categories: opts.categories.clone(),
        })
    }
}

impl LabelReader for YoloReader {
    fn format_name(&self) -> &'static str {
        FORMAT_NAME
    }

    fn len(&self) -> usize {
        self.files.len()
    }

    fn get(&self, index: usize) -> Result<UnifiedLabel, LabelError> {
        check_index(index, self.files.len())?;
        let label_path = &self.files[index];

        let stem = label_path
            .file_stem()
            .map(|stem| stem.to_string_lossy().to_string())
            .unwrap_or_default();
        let image_path = find_image_for_stem(&self.image_root, &stem).ok_or_else(|| {
            LabelError::ImageNotFound {
                label_path: label_path.clone(),
                expected: format!(
                    "{}.{{{}}}",
                    self.image_root.join(&stem).display(),
                    IMAGE_EXTENSIONS.join(",")
                ),
            }
        })?;
        let (width, height) = read_image_dimensions(&image_path)?;
        debug!(
            "[yolo] {} -> {} ({}x{})",
            label_path.display(),
            image_path.display(),
            width,
            height
        );

        let content = fs::read_to_string(label_path).map_err(LabelError::Io)?;
        let mut bboxes = Vec::new();
        for (line_idx, line) in content.lines().enumerate() {
            let Some(row) = parse_label_line(line, label_path, line_idx + 1)? else {
                continue;
            };

            bboxes.push(BBox::from_cxcywh(
                Cxcywh::new(row.cx, row.cy, row.w, row.h),
                width,
                height,
                row.class_id,
                self.categories.name_or_id(row.class_id),
            ));
        }

        Ok(UnifiedLabel::new(image_path, width, height).with_bboxes(bboxes))
    }
}

fn find_image_for_stem(image_root: &Path, stem: &str) -> Option<PathBuf> {
    IMAGE_EXTENSIONS
        .iter()
        .map(|ext| image_root.join(format!("{stem}.{ext}")))
        .find(|candidate| candidate.is_file())
}

/// One parsed label row, still normalized.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct YoloLabelRow {
    pub class_id: i64,
    pub cx: f64,
    pub cy: f64,
    pub w: f64,
    pub h: f64,
}

/// Parses one label line. Blank lines yield `Ok(None)`.
///
/// `line_num` is 1-based and only used for error messages.
pub fn parse_label_line(
    line: &str,
    file_path: &Path,
    line_num: usize,
) -> Result<Option<YoloLabelRow>, LabelError> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    // Take at most 6 tokens so pathological inputs do not allocate unbounded memory.
    let tokens: Vec<&str> = trimmed.split_whitespace().take(6).collect();

    if tokens.len() != 5 {
        let found = if tokens.len() > 5 {
            "more than 5".to_string()
        } else {
            tokens.len().to_string()
        };
        return Err(LabelError::YoloLabelParse {
            path: file_path.to_path_buf(),
            line: line_num,
            message: format!("expected 5 tokens, found {found}"),
        });
    }

    let class_id = parse_class_id(tokens[0]).ok_or_else(|| LabelError::YoloLabelParse {
        path: file_path.to_path_buf(),
        line: line_num,
        message: format!(
            "invalid class_id '{}'; expected integer",
            tokens[0]
        ),
    })?;

    let cx = parse_f64_token(tokens[1], "x_center", file_path, line_num)?;
    let cy = parse_f64_token(tokens[2], "y_center", file_path, line_num)?;
    let w = parse_f64_token(tokens[3], "width", file_path, line_num)?;
    let h = parse_f64_token(tokens[4], "height", file_path, line_num)?;

    Ok(Some(YoloLabelRow {
        class_id,
        cx,
        cy,
        w,
        h,
    }))
}

/// Accepts `3` as well as integral floats such as `3.0`.
///
/// Negative ids are kept: `-1` is how unresolved categories are written.
fn parse_class_id(raw: &str) -> Option<i64> {
    if let Ok(id) = raw.parse::<i64>() {
        return Some(id);
    }
    let value = raw.parse::<f64>().ok()?;
    if !value.is_finite() || value.fract() != 0.0 || value.abs() > i64::MAX as f64 {
        return None;
    }
    Some(value as i64)
}

fn parse_f64_token(
    raw: &str,
    field_name: &str,
    file_path: &Path,
    line_num: usize,
) -> Result<f64, LabelError> {
    raw.parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
        .ok_or_else(|| LabelError::YoloLabelParse {
            path: file_path.to_path_buf(),
            line: line_num,
            message: format!("invalid {field_name} '{raw}'; expected finite number"),
        })
}

/// Fuzz-only entrypoint for YOLO single-line parsing.
#[cfg(feature = "fuzzing")]
pub fn fuzz_parse_label_line(input: &str) -> Result<(), LabelError> {
    let _ = parse_label_line(input, Path::new("<fuzz>"), 1)?;
    Ok(())
}

// ============================================================================
// Writer
// ============================================================================

/// Writes one `<stem>.txt` per record into a directory.
#[derive(Clone, Debug)]
pub struct YoloWriter {
    output_dir: PathBuf,
}

impl YoloWriter {
    pub fn new(destination: &Path) -> Self {
        Self {
            output_dir: destination.to_path_buf(),
        }
    }
}

impl LabelWriter for YoloWriter {
    fn format_name(&self) -> &'static str {
        FORMAT_NAME
    }

    fn write(&self, labels: &[UnifiedLabel]) -> Result<WriteSummary, LabelError> {
        ensure_output_dir(&self.output_dir)?;

        let mut summary = WriteSummary::default();
        let mut written = BTreeSet::new();

        for (idx, label) in labels.iter().enumerate() {
            let stem = label
                .file_stem()
                .unwrap_or_else(|| format!("{:06}", idx + 1));
            let label_path = self.output_dir.join(format!("{stem}.{LABEL_EXTENSION}"));

            if !written.insert(label_path.clone()) {
                warn!(
                    "[yolo] {} written more than once; the last record wins",
                    label_path.display()
                );
            }

            fs::write(&label_path, to_yolo_string(label)?).map_err(LabelError::Io)?;

            summary.images += 1;
            summary.annotations += label.bboxes.len();
            summary.files.push(label_path);
        }

        info!(
            "[yolo] wrote {} file(s) to {}",
            written.len(),
            self.output_dir.display()
        );
        Ok(summary)
    }
}

/// Renders one record as YOLO label text, one line per box.
///
/// The box's own `cls_id` is written as-is; the category map plays no part.
///
/// # Errors
/// [`LabelError::InvalidImageDimensions`] if the record has boxes but a zero
/// image width or height.
pub fn to_yolo_string(label: &UnifiedLabel) -> Result<String, LabelError> {
    if label.bboxes.is_empty() {
        return Ok(String::new());
    }
    if label.image_width == 0 || label.image_height == 0 {
        return Err(LabelError::InvalidImageDimensions {
            image_path: label.image_path.clone(),
            width: label.image_width,
            height: label.image_height,
        });
    }

    let mut text = String::new();
    for bbox in &label.bboxes {
        let yolo = bbox.to_cxcywh(label.image_width, label.image_height);
        text.push_str(&format!(
            "{} {} {} {} {}\n",
            bbox.cls_id, yolo.cx, yolo.cy, yolo.w, yolo.h
        ));
    }
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_label_line_accepts_valid_rows() {
        let parsed = parse_label_line("2 0.5 0.25 0.3 0.1", Path::new("a.txt"), 1)
            .expect("parse should succeed")
            .expect("line should produce a row");

        assert_eq!(
            parsed,
            YoloLabelRow {
                class_id: 2,
                cx: 0.5,
                cy: 0.25,
                w: 0.3,
                h: 0.1,
            }
        );
    }

    #[test]
    fn parse_label_line_accepts_integral_float_class() {
        let parsed = parse_label_line("3.0 0.5 0.5 0.1 0.1", Path::new("a.txt"), 1)
            .expect("parse should succeed")
            .expect("line should produce a row");
        assert_eq!(parsed.class_id, 3);

        assert!(parse_label_line("3.5 0.5 0.5 0.1 0.1", Path::new("a.txt"), 1).is_err());
        assert!(parse_label_line("nan 0.5 0.5 0.1 0.1", Path::new("a.txt"), 1).is_err());
    }

    #[test]
    fn parse_label_line_keeps_unknown_class_sentinel() {
        let parsed = parse_label_line("-1 0.15 0.15 0.1 0.1", Path::new("a.txt"), 1)
            .expect("parse should succeed")
            .expect("line should produce a row");
        assert_eq!(parsed.class_id, -1);

        let parsed = parse_label_line("-1.0 0.15 0.15 0.1 0.1", Path::new("a.txt"), 1)
            .expect("parse should succeed")
            .expect("line should produce a row");
        assert_eq!(parsed.class_id, -1);
    }

    #[test]
    fn parse_label_line_rejects_non_finite_coordinates() {
        for line in [
            "0 nan 0.5 0.2 0.2",
            "0 0.5 inf 0.2 0.2",
            "0 0.5 0.5 -inf 0.2",
            "0 0.5 0.5 0.2 infinity",
        ] {
            let err = parse_label_line(line, Path::new("a.txt"), 7).unwrap_err();
            assert!(
                matches!(err, LabelError::YoloLabelParse { line: 7, .. }),
                "{line}: {err}"
            );
        }
    }

    #[test]
    fn parse_label_line_skips_empty_rows() {
        let parsed = parse_label_line("   ", Path::new("a.txt"), 2).expect("parse should succeed");
        assert!(parsed.is_none());
    }

    #[test]
    fn parse_label_line_rejects_wrong_token_counts() {
        let err = parse_label_line("0 0.1 0.2", Path::new("a.txt"), 3).unwrap_err();
        assert!(matches!(err, LabelError::YoloLabelParse { line: 3, .. }));

        let err = parse_label_line("0 0.1 0.2 0.3 0.4 0.5", Path::new("a.txt"), 4).unwrap_err();
        assert!(matches!(err, LabelError::YoloLabelParse { line: 4, .. }));
    }

    #[test]
    fn parse_label_line_rejects_non_numeric_fields() {
        let err = parse_label_line("0 0.1 abc 0.3 0.4", Path::new("a.txt"), 1).unwrap_err();
        assert!(err.to_string().contains("y_center"));
    }

    #[test]
    fn find_image_for_stem_prefers_extension_order() {
        let temp = tempfile::tempdir().expect("create temp dir");
        fs::write(temp.path().join("sample.png"), b"dummy").expect("write png");
        fs::write(temp.path().join("sample.jpg"), b"dummy").expect("write jpg");

        let found = find_image_for_stem(temp.path(), "sample").expect("should find image");
        assert!(found.ends_with("sample.jpg"));
        assert!(find_image_for_stem(temp.path(), "other").is_none());
    }

    #[test]
    fn to_yolo_string_normalizes_boxes() {
        let label = UnifiedLabel::new("a.jpg", 100, 100)
            .with_bboxes(vec![BBox::from_xyxy(40.0, 40.0, 60.0, 60.0, 4, "ignored")]);
        assert_eq!(to_yolo_string(&label).expect("encode"), "4 0.5 0.5 0.2 0.2\n");
    }

    #[test]
    fn to_yolo_string_rejects_zero_sized_images() {
        let label = UnifiedLabel::new("a.jpg", 0, 100)
            .with_bboxes(vec![BBox::from_xyxy(1.0, 1.0, 2.0, 2.0, 0, "cat")]);
        assert!(matches!(
            to_yolo_string(&label),
            Err(LabelError::InvalidImageDimensions { .. })
        ));

        let empty = UnifiedLabel::new("a.jpg", 0, 0);
        assert_eq!(to_yolo_string(&empty).expect("encode"), "");
    }
}
