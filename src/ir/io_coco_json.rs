//! COCO JSON format reader and writer.
//!
//! # COCO Format Reference
//!
//! COCO bounding boxes use `[x, y, width, height]` format where:
//! - `(x, y)` is the top-left corner in absolute pixel coordinates
//! - `width` and `height` are the dimensions
//!
//! This differs from our canonical format which uses XYXY (xmin, ymin, xmax, ymax).
//!
//! # Category identity
//!
//! The reader resolves `category_id` against the `categories` array of the
//! same file only; ids are never merged across files. The writer ignores
//! source ids altogether and numbers categories by first appearance of their
//! name, so the output ids depend on input order.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use super::category::CategoryTable;
use super::codec::{check_index, LabelReader, LabelWriter, ReaderOptions, WriteSummary};
use super::coord::Xywh;
use super::files::{collect_label_files, ensure_output_dir, has_extension};
use super::ids::{AnnotationId, CategoryId, ImageId};
use super::{BBox, UnifiedLabel};
use crate::error::LabelError;

/// Registry name of this codec.
pub const FORMAT_NAME: &str = "coco";

/// File written when the destination is a directory.
pub const DEFAULT_COCO_FILE_NAME: &str = "instances_default.json";

const COCO_JSON_EXTENSION: &str = "json";

// ============================================================================
// COCO Schema Types (internal to this module)
// ============================================================================

/// Top-level COCO document as read.
#[derive(Debug, Deserialize)]
struct CocoDataset {
    images: Vec<CocoImage>,

    #[serde(default)]
    annotations: Vec<CocoAnnotation>,

    #[serde(default)]
    categories: Vec<CocoCategory>,
}

#[derive(Debug, Deserialize)]
struct CocoImage {
    id: i64,
    file_name: String,
    width: u32,
    height: u32,
}

#[derive(Debug, Deserialize)]
struct CocoAnnotation {
    image_id: i64,
    category_id: i64,

    /// COCO bbox format: [x, y, width, height] with (x,y) as top-left corner
    bbox: [f64; 4],
}

#[derive(Debug, Deserialize)]
struct CocoCategory {
    id: i64,
    name: String,
}

/// Top-level COCO document as written.
#[derive(Debug, Serialize)]
struct CocoExport {
    info: CocoExportInfo,
    licenses: Vec<serde_json::Value>,
    images: Vec<CocoExportImage>,
    annotations: Vec<CocoExportAnnotation>,
    categories: Vec<CocoExportCategory>,
}

#[derive(Debug, Serialize)]
struct CocoExportInfo {
    description: String,
    version: String,
}

#[derive(Debug, Serialize)]
struct CocoExportImage {
    id: ImageId,
    file_name: String,
    width: u32,
    height: u32,
}

#[derive(Debug, Serialize)]
struct CocoExportAnnotation {
    id: AnnotationId,
    image_id: ImageId,
    category_id: CategoryId,
    bbox: [f64; 4],
    area: f64,
    iscrowd: u8,
    /// Always empty: only detection boxes are exported.
    segmentation: Vec<serde_json::Value>,
}

#[derive(Debug, Serialize)]
struct CocoExportCategory {
    id: CategoryId,
    name: String,
    supercategory: String,
}

// ============================================================================
// Reader
// ============================================================================

/// Reads one COCO file or a directory of COCO files.
///
/// All files are parsed at construction; `get` hands out clones of the
/// indexed records.
#[derive(Debug)]
pub struct CocoReader {
    samples: Vec<UnifiedLabel>,
}

impl CocoReader {
    /// Loads every `.json` file under `opts.label_path`.
    pub fn open(opts: &ReaderOptions) -> Result<Self, LabelError> {
        let files = collect_label_files(&opts.label_path, COCO_JSON_EXTENSION)?;
        let image_root = opts.image_root();
        info!("[coco] loading annotations from {} file(s)", files.len());

        let mut samples = Vec::new();
        let mut seen_categories: BTreeMap<i64, (String, PathBuf)> = BTreeMap::new();

        for path in &files {
            let coco = parse_coco_file(path)?;

            for category in &coco.categories {
                match seen_categories.get(&category.id) {
                    Some((name, first_path)) if *name != category.name => {
                        warn!(
                            "[coco] category id {} is '{}' in {} but '{}' in {}; each file keeps its own mapping",
                            category.id,
                            name,
                            first_path.display(),
                            category.name,
                            path.display()
                        );
                    }
                    Some(_) => {}
                    None => {
                        seen_categories
                            .insert(category.id, (category.name.clone(), path.clone()));
                    }
                }
            }

            let labels = coco_to_labels(coco, &image_root);
            debug!("[coco] {} image(s) in {}", labels.len(), path.display());
            samples.extend(labels);
        }

        info!("[coco] loaded {} image(s)", samples.len());
        Ok(Self { samples })
    }
}

impl LabelReader for CocoReader {
    fn format_name(&self) -> &'static str {
        FORMAT_NAME
    }

    fn len(&self) -> usize {
        self.samples.len()
    }

    fn get(&self, index: usize) -> Result<UnifiedLabel, LabelError> {
        check_index(index, self.samples.len())?;
        Ok(self.samples[index].clone())
    }
}

/// Reads the records of a single COCO JSON file.
///
/// # Errors
/// Returns an error if the file cannot be read or parsed.
pub fn read_coco_json(path: &Path, image_root: &Path) -> Result<Vec<UnifiedLabel>, LabelError> {
    let coco = parse_coco_file(path)?;
    Ok(coco_to_labels(coco, image_root))
}

/// Reads records from a COCO JSON string.
///
/// Useful for testing without file I/O.
pub fn from_coco_str(json: &str, image_root: &Path) -> Result<Vec<UnifiedLabel>, serde_json::Error> {
    let coco: CocoDataset = serde_json::from_str(json)?;
    Ok(coco_to_labels(coco, image_root))
}

/// Reads records from a COCO JSON byte slice.
///
/// Useful for fuzzing and processing raw bytes without UTF-8 validation overhead.
pub fn from_coco_slice(
    bytes: &[u8],
    image_root: &Path,
) -> Result<Vec<UnifiedLabel>, serde_json::Error> {
    let coco: CocoDataset = serde_json::from_slice(bytes)?;
    Ok(coco_to_labels(coco, image_root))
}

fn parse_coco_file(path: &Path) -> Result<CocoDataset, LabelError> {
    let file = File::open(path).map_err(LabelError::Io)?;
    let reader = BufReader::new(file);

    serde_json::from_reader(reader).map_err(|source| LabelError::CocoJsonParse {
        path: path.to_path_buf(),
        source,
    })
}

// ============================================================================
// Conversion: COCO -> canonical
// ============================================================================

fn coco_to_labels(coco: CocoDataset, image_root: &Path) -> Vec<UnifiedLabel> {
    let category_names: BTreeMap<i64, String> = coco
        .categories
        .into_iter()
        .map(|category| (category.id, category.name))
        .collect();

    let mut boxes_by_image: BTreeMap<i64, Vec<BBox>> = BTreeMap::new();
    for ann in coco.annotations {
        let [x, y, w, h] = ann.bbox;
        let label_name = category_names
            .get(&ann.category_id)
            .cloned()
            .unwrap_or_else(|| ann.category_id.to_string());

        boxes_by_image
            .entry(ann.image_id)
            .or_default()
            .push(BBox::from_xywh(
                Xywh::new(x, y, w, h),
                ann.category_id,
                label_name,
            ));
    }

    coco.images
        .into_iter()
        .map(|img| {
            let bboxes = boxes_by_image.get(&img.id).cloned().unwrap_or_default();
            UnifiedLabel::new(image_root.join(&img.file_name), img.width, img.height)
                .with_bboxes(bboxes)
        })
        .collect()
}

// ============================================================================
// Writer
// ============================================================================

/// Writes all records into a single COCO JSON document.
#[derive(Clone, Debug)]
pub struct CocoWriter {
    output_dir: PathBuf,
    annotation_path: PathBuf,
}

impl CocoWriter {
    /// A destination ending in `.json` is the output file itself; anything
    /// else is a directory that receives [`DEFAULT_COCO_FILE_NAME`].
    pub fn new(destination: &Path) -> Self {
        if has_extension(destination, COCO_JSON_EXTENSION) {
            let output_dir = destination
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_default();
            Self {
                output_dir,
                annotation_path: destination.to_path_buf(),
            }
        } else {
            Self {
                output_dir: destination.to_path_buf(),
                annotation_path: destination.join(DEFAULT_COCO_FILE_NAME),
            }
        }
    }

    /// Path of the JSON file this writer produces.
    pub fn annotation_path(&self) -> &Path {
        &self.annotation_path
    }
}

impl LabelWriter for CocoWriter {
    fn format_name(&self) -> &'static str {
        FORMAT_NAME
    }

    fn write(&self, labels: &[UnifiedLabel]) -> Result<WriteSummary, LabelError> {
        if !self.output_dir.as_os_str().is_empty() {
            ensure_output_dir(&self.output_dir)?;
        }

        let coco = labels_to_coco(labels);
        let summary = WriteSummary {
            images: coco.images.len(),
            annotations: coco.annotations.len(),
            categories: Some(coco.categories.len()),
            files: vec![self.annotation_path.clone()],
        };

        info!("[coco] saving to {}", self.annotation_path.display());
        let file = File::create(&self.annotation_path).map_err(LabelError::Io)?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, &coco).map_err(|source| {
            LabelError::CocoJsonWrite {
                path: self.annotation_path.clone(),
                source,
            }
        })?;
        writer.flush().map_err(LabelError::Io)?;

        Ok(summary)
    }
}

/// Writes records to a COCO JSON string.
///
/// Useful for testing without file I/O.
pub fn to_coco_string(labels: &[UnifiedLabel]) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(&labels_to_coco(labels))
}

// ============================================================================
// Conversion: canonical -> COCO
// ============================================================================

fn labels_to_coco(labels: &[UnifiedLabel]) -> CocoExport {
    // Categories are fixed before any annotation is emitted.
    let (table, category_ids) = CategoryTable::assign(labels);

    let mut images = Vec::with_capacity(labels.len());
    let mut annotations = Vec::new();
    let mut clamped = 0usize;

    for (idx, (label, box_ids)) in labels.iter().zip(&category_ids).enumerate() {
        let image_id = ImageId::from_index(idx);
        let file_name = label
            .file_name()
            .unwrap_or_else(|| format!("{:06}.jpg", image_id.as_u64()));

        images.push(CocoExportImage {
            id: image_id,
            file_name,
            width: label.image_width,
            height: label.image_height,
        });

        for (bbox, &category_id) in label.bboxes.iter().zip(box_ids) {
            if !bbox.is_ordered() {
                clamped += 1;
            }

            let xywh = bbox.to_xywh();
            annotations.push(CocoExportAnnotation {
                id: AnnotationId::from_index(annotations.len()),
                image_id,
                category_id,
                bbox: xywh.to_array(),
                area: xywh.area(),
                iscrowd: 0,
                segmentation: Vec::new(),
            });
        }
    }

    if clamped > 0 {
        warn!(
            "[coco] {} box(es) had max < min; their width/height were clamped to 0",
            clamped
        );
    }

    let categories = table
        .iter()
        .map(|(id, name)| CocoExportCategory {
            id,
            name: name.to_string(),
            supercategory: "none".to_string(),
        })
        .collect();

    CocoExport {
        info: CocoExportInfo {
            description: "Converted by labelshift".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        },
        licenses: Vec::new(),
        images,
        annotations,
        categories,
    }
}

// ============================================================================
// Tests
// ============================================================================
