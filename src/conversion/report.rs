//! Conversion report types: counts, written files, and lossiness notes.

use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

use crate::ir::WriteSummary;

/// What one conversion read, wrote, and could not carry across.
#[derive(Clone, Debug, Default, Serialize)]
pub struct ConversionReport {
    /// Source format name.
    pub from: String,
    /// Target format name.
    pub to: String,
    /// Counts from the source records.
    pub input: ConversionCounts,
    /// Counts reported by the writer.
    pub output: ConversionCounts,
    /// Distinct categories the writer emitted, for formats that list them.
    pub categories: Option<usize>,
    /// Every file the writer produced, in write order.
    pub files: Vec<PathBuf>,
    /// Issues discovered while analyzing the conversion.
    pub issues: Vec<ConversionIssue>,
}

impl ConversionReport {
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            ..Default::default()
        }
    }

    pub fn add(&mut self, issue: ConversionIssue) {
        self.issues.push(issue);
    }

    /// Copies the writer's results into the report.
    pub fn record_output(&mut self, summary: WriteSummary) {
        self.output = ConversionCounts {
            images: summary.images,
            annotations: summary.annotations,
        };
        self.categories = summary.categories;
        self.files = summary.files;
    }

    pub fn warning_count(&self) -> usize {
        self.issues
            .iter()
            .filter(|i| i.severity == ConversionSeverity::Warning)
            .count()
    }

    pub fn info_count(&self) -> usize {
        self.issues
            .iter()
            .filter(|i| i.severity == ConversionSeverity::Info)
            .count()
    }

    /// Returns true if the output cannot reproduce the input exactly.
    pub fn is_lossy(&self) -> bool {
        self.warning_count() > 0
    }
}

impl fmt::Display for ConversionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Converted {} -> {}", self.from, self.to)?;
        writeln!(
            f,
            "  {} images, {} annotations",
            self.input.images, self.input.annotations
        )?;

        if self.output != self.input {
            writeln!(
                f,
                "  output: {} images, {} annotations",
                self.output.images, self.output.annotations
            )?;
        }
        if let Some(categories) = self.categories {
            writeln!(f, "  {} categories", categories)?;
        }
        writeln!(f, "  {} file(s) written", self.files.len())?;

        let warnings = self.warning_count();
        if warnings > 0 {
            writeln!(f)?;
            writeln!(f, "Warnings ({}):", warnings)?;
            for issue in self
                .issues
                .iter()
                .filter(|i| i.severity == ConversionSeverity::Warning)
            {
                writeln!(f, "  - {}", issue.message)?;
            }
        }

        let infos = self.info_count();
        if infos > 0 {
            writeln!(f)?;
            writeln!(f, "Notes ({}):", infos)?;
            for issue in self
                .issues
                .iter()
                .filter(|i| i.severity == ConversionSeverity::Info)
            {
                writeln!(f, "  - {}", issue.message)?;
            }
        }

        Ok(())
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ConversionCounts {
    pub images: usize,
    pub annotations: usize,
}

/// A single issue discovered during conversion analysis.
#[derive(Clone, Debug, Serialize)]
pub struct ConversionIssue {
    pub severity: ConversionSeverity,
    pub code: ConversionIssueCode,
    pub message: String,
}

impl ConversionIssue {
    /// Create a warning-level issue (indicates lossiness).
    pub fn warning(code: ConversionIssueCode, message: impl Into<String>) -> Self {
        Self {
            severity: ConversionSeverity::Warning,
            code,
            message: message.into(),
        }
    }

    /// Create an info-level issue (policy note).
    pub fn info(code: ConversionIssueCode, message: impl Into<String>) -> Self {
        Self {
            severity: ConversionSeverity::Info,
            code,
            message: message.into(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversionSeverity {
    /// Information is lost or altered.
    Warning,
    /// A deterministic policy applied; nothing is lost.
    Info,
}

/// Stable issue codes for programmatic consumption.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversionIssueCode {
    /// Segmentation masks have no encoding in any supported writer.
    DropMasks,
    /// COCO export clamps boxes with max < min to zero width/height.
    CocoClampedBoxes,
    /// VOC export truncates fractional pixel coordinates.
    VocTruncatedCoordinates,
    /// Boxes whose class could not be resolved are written as class -1.
    YoloUnknownClassIds,
    /// COCO writer assigns category ids 1..N by first-seen label name.
    CocoCategoryIdAssignment,
    /// YOLO writer emits empty label files for images without boxes.
    YoloWriterEmptyLabelFiles,
    /// YOLO reader names boxes from the category map or the bare class id.
    YoloReaderClassNames,
}
