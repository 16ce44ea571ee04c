//! The conversion driver: resolve codecs by name, read, analyze, write.

pub mod report;

pub use report::{
    ConversionCounts, ConversionIssue, ConversionIssueCode, ConversionReport, ConversionSeverity,
};

use std::path::PathBuf;

use indicatif::{ProgressBar, ProgressStyle};
use log::info;

use crate::error::LabelError;
use crate::ir::io_coco_json::FORMAT_NAME as COCO;
use crate::ir::io_voc_xml::FORMAT_NAME as VOC;
use crate::ir::io_yolo::FORMAT_NAME as YOLO;
use crate::ir::{CategoryMap, LabelReader, Labels, ReaderOptions, UnifiedLabel, UNKNOWN_CLASS_ID};
use crate::registry::Registry;

/// One source → destination conversion.
#[derive(Clone, Debug)]
pub struct ConvertRequest {
    pub source_format: String,
    pub label_path: PathBuf,
    /// Image root; `None` means `images/` beside the labels.
    pub image_path: Option<PathBuf>,
    pub destination_format: String,
    pub destination_path: PathBuf,
    pub categories: CategoryMap,
    /// Draw a progress bar while reading.
    pub progress: bool,
}

/// Runs one conversion end to end.
///
/// Both codecs are resolved before anything is read, so an unknown format
/// name fails without touching the filesystem. Every source record is
/// materialized before the writer runs.
pub fn convert(registry: &Registry, request: &ConvertRequest) -> Result<ConversionReport, LabelError> {
    let opts = ReaderOptions {
        label_path: request.label_path.clone(),
        image_path: request.image_path.clone(),
        categories: request.categories.clone(),
    };

    let writer = registry.writer(&request.destination_format, &request.destination_path)?;
    let reader = registry.reader(&request.source_format, &opts)?;

    info!(
        "converting {} record(s): {} -> {}",
        reader.len(),
        reader.format_name(),
        writer.format_name()
    );
    let labels = read_all(reader.as_ref(), request.progress)?;

    let mut report = build_conversion_report(&labels, reader.format_name(), writer.format_name());
    let summary = writer.write(&labels)?;
    report.record_output(summary);

    info!(
        "wrote {} file(s) to {}",
        report.files.len(),
        request.destination_path.display()
    );
    Ok(report)
}

/// Reads every record, stopping at the first failure.
pub fn read_all(reader: &dyn LabelReader, progress: bool) -> Result<Vec<UnifiedLabel>, LabelError> {
    let records = Labels::new(reader);
    let pb = if progress {
        ProgressBar::new(records.len() as u64)
    } else {
        ProgressBar::hidden()
    };
    if let Ok(style) = ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos:>7}/{len:7} {msg}")
    {
        pb.set_style(style.progress_chars("##>-"));
    }
    pb.set_message(reader.format_name());

    let mut labels = Vec::with_capacity(records.len());
    for record in records {
        let label = match record {
            Ok(label) => label,
            Err(err) => {
                pb.abandon();
                return Err(err);
            }
        };
        labels.push(label);
        pb.inc(1);
    }
    pb.finish_and_clear();

    Ok(labels)
}

/// Describes what the target format will lose or decide for these records.
pub fn build_conversion_report(labels: &[UnifiedLabel], from: &str, to: &str) -> ConversionReport {
    let mut report = ConversionReport::new(from, to);
    report.input = ConversionCounts {
        images: labels.len(),
        annotations: labels.iter().map(|label| label.bboxes.len()).sum(),
    };

    let with_masks = labels.iter().filter(|label| !label.masks.is_empty()).count();
    if with_masks > 0 {
        report.add(ConversionIssue::warning(
            ConversionIssueCode::DropMasks,
            format!("{} image(s) carry masks that {} cannot store", with_masks, to),
        ));
    }

    let boxes = || labels.iter().flat_map(|label| label.bboxes.iter());

    match to {
        COCO => {
            let unordered = boxes().filter(|bbox| !bbox.is_ordered()).count();
            if unordered > 0 {
                report.add(ConversionIssue::warning(
                    ConversionIssueCode::CocoClampedBoxes,
                    format!(
                        "{} box(es) have max < min and will get zero width/height",
                        unordered
                    ),
                ));
            }
            report.add(ConversionIssue::info(
                ConversionIssueCode::CocoCategoryIdAssignment,
                "category ids are assigned 1..N in first-seen order of label names",
            ));
        }
        VOC => {
            let fractional = boxes()
                .filter(|bbox| {
                    [bbox.xmin, bbox.ymin, bbox.xmax, bbox.ymax]
                        .iter()
                        .any(|value| value.fract() != 0.0)
                })
                .count();
            if fractional > 0 {
                report.add(ConversionIssue::warning(
                    ConversionIssueCode::VocTruncatedCoordinates,
                    format!(
                        "{} box(es) have fractional coordinates that will be truncated",
                        fractional
                    ),
                ));
            }
        }
        YOLO => {
            let unknown = boxes()
                .filter(|bbox| bbox.cls_id == UNKNOWN_CLASS_ID)
                .count();
            if unknown > 0 {
                report.add(ConversionIssue::warning(
                    ConversionIssueCode::YoloUnknownClassIds,
                    format!(
                        "{} box(es) have no resolved class and will be written as class {}",
                        unknown, UNKNOWN_CLASS_ID
                    ),
                ));
            }
            let empty = labels.iter().filter(|label| label.bboxes.is_empty()).count();
            if empty > 0 {
                report.add(ConversionIssue::info(
                    ConversionIssueCode::YoloWriterEmptyLabelFiles,
                    format!("{} image(s) without boxes get empty label files", empty),
                ));
            }
        }
        _ => {}
    }

    if from == YOLO {
        report.add(ConversionIssue::info(
            ConversionIssueCode::YoloReaderClassNames,
            "label names come from the category map, or the class id when unmapped",
        ));
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{BBox, Mask};

    fn sample_labels() -> Vec<UnifiedLabel> {
        let mut masked = UnifiedLabel::new("b.jpg", 10, 10);
        masked.masks.push(Mask {
            width: 1,
            height: 1,
            data: vec![1],
        });

        vec![
            UnifiedLabel::new("a.jpg", 100, 100).with_bboxes(vec![
                BBox::from_xyxy(10.5, 10.0, 20.0, 20.0, 0, "cat"),
                BBox::from_xyxy(30.0, 30.0, 25.0, 40.0, UNKNOWN_CLASS_ID, "bird"),
            ]),
            masked,
        ]
    }

    fn codes(report: &ConversionReport) -> Vec<ConversionIssueCode> {
        report.issues.iter().map(|issue| issue.code).collect()
    }

    #[test]
    fn to_coco_flags_clamped_boxes() {
        let report = build_conversion_report(&sample_labels(), "voc", "coco");
        assert_eq!(report.input.images, 2);
        assert_eq!(report.input.annotations, 2);
        assert_eq!(
            codes(&report),
            vec![
                ConversionIssueCode::DropMasks,
                ConversionIssueCode::CocoClampedBoxes,
                ConversionIssueCode::CocoCategoryIdAssignment,
            ]
        );
    }

    #[test]
    fn to_voc_flags_fractional_coordinates() {
        let report = build_conversion_report(&sample_labels(), "coco", "voc");
        assert!(codes(&report).contains(&ConversionIssueCode::VocTruncatedCoordinates));
        assert!(report.is_lossy());
    }

    #[test]
    fn yolo_on_both_sides_adds_policy_notes() {
        let report = build_conversion_report(&sample_labels(), "yolo", "yolo");
        let codes = codes(&report);
        assert!(codes.contains(&ConversionIssueCode::YoloUnknownClassIds));
        assert!(codes.contains(&ConversionIssueCode::YoloWriterEmptyLabelFiles));
        assert!(codes.contains(&ConversionIssueCode::YoloReaderClassNames));
    }

    #[test]
    fn clean_input_is_not_lossy() {
        let labels = vec![UnifiedLabel::new("a.jpg", 10, 10)
            .with_bboxes(vec![BBox::from_xyxy(1.0, 1.0, 5.0, 5.0, 0, "cat")])];
        let report = build_conversion_report(&labels, "coco", "voc");
        assert!(!report.is_lossy());
        assert!(report.issues.is_empty());
    }

    #[test]
    fn unknown_destination_fails_before_reading() {
        let request = ConvertRequest {
            source_format: "coco".to_string(),
            label_path: PathBuf::from("does/not/exist.json"),
            image_path: None,
            destination_format: "parquet".to_string(),
            destination_path: PathBuf::from("out"),
            categories: CategoryMap::new(),
            progress: false,
        };

        let err = convert(&Registry::builtin(), &request).unwrap_err();
        assert!(matches!(err, LabelError::UnknownFormat { role: "writer", .. }));
    }
}
