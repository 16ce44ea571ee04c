//! Canonical label model and the format codecs built on it.
//!
//! Every conversion passes through [`UnifiedLabel`]: one record per image,
//! boxes in absolute-pixel XYXY corners. Readers decode a source format into
//! that model and writers encode it back out, so adding a format means one
//! reader and one writer rather than a converter per format pair.
//!
//! # Example
//!
//! ```
//! use labelshift::ir::{BBox, UnifiedLabel, Xywh};
//!
//! let bbox = BBox::from_xywh(Xywh::new(10.0, 20.0, 30.0, 40.0), 0, "cat");
//! assert_eq!((bbox.xmax, bbox.ymax), (40.0, 60.0));
//!
//! let label = UnifiedLabel::new("images/0001.jpg", 640, 480).with_bboxes(vec![bbox]);
//! assert_eq!(label.file_stem().as_deref(), Some("0001"));
//! ```

mod bbox;
mod category;
mod codec;
mod coord;
pub(crate) mod files;
mod ids;
pub mod io_coco_json;
pub mod io_voc_xml;
pub mod io_yolo;
mod model;

pub use bbox::BBox;
pub use category::{CategoryMap, CategoryTable, NameIndex, UNKNOWN_CLASS_ID, UNNAMED_CATEGORY};
pub use codec::{LabelReader, LabelWriter, Labels, ReaderOptions, WriteSummary};
pub use coord::{Cxcywh, Xywh};
pub use ids::{AnnotationId, CategoryId, ImageId};
pub use model::{Mask, UnifiedLabel};
