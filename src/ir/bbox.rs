//! Bounding box type in canonical XYXY pixel form.

use super::coord::{Cxcywh, Xywh};

/// One detected object region, in absolute pixel XYXY coordinates.
///
/// Note: the constructor does NOT enforce `xmin <= xmax` / `ymin <= ymax`.
/// Readers keep whatever the source declared; the COCO writer clamps
/// negative extents to zero on export.
#[derive(Clone, Debug, PartialEq)]
pub struct BBox {
    pub xmin: f64,
    pub ymin: f64,
    pub xmax: f64,
    pub ymax: f64,

    /// Category identifier. Its meaning depends on the format that produced
    /// the box (COCO category id, YOLO class index, or the VOC name lookup,
    /// where `-1` marks a name missing from the category map).
    pub cls_id: i64,

    /// Human-readable class name, never empty after a read.
    pub label_name: String,
}

impl BBox {
    /// Creates a new box from explicit XYXY coordinates.
    pub fn from_xyxy(
        xmin: f64,
        ymin: f64,
        xmax: f64,
        ymax: f64,
        cls_id: i64,
        label_name: impl Into<String>,
    ) -> Self {
        Self {
            xmin,
            ymin,
            xmax,
            ymax,
            cls_id,
            label_name: label_name.into(),
        }
    }

    /// Creates a box from a COCO `[x, y, w, h]` encoding.
    pub fn from_xywh(xywh: Xywh, cls_id: i64, label_name: impl Into<String>) -> Self {
        let (xmin, ymin, xmax, ymax) = xywh.to_xyxy();
        Self::from_xyxy(xmin, ymin, xmax, ymax, cls_id, label_name)
    }

    /// Creates a box from a normalized YOLO encoding and the image size.
    pub fn from_cxcywh(
        cxcywh: Cxcywh,
        image_width: u32,
        image_height: u32,
        cls_id: i64,
        label_name: impl Into<String>,
    ) -> Self {
        let (xmin, ymin, xmax, ymax) = cxcywh.to_xyxy(image_width as f64, image_height as f64);
        Self::from_xyxy(xmin, ymin, xmax, ymax, cls_id, label_name)
    }

    /// Converts to COCO form, clamping negative extents to zero.
    #[inline]
    pub fn to_xywh(&self) -> Xywh {
        Xywh::from_xyxy(self.xmin, self.ymin, self.xmax, self.ymax)
    }

    /// Converts to normalized YOLO form for the given image size.
    #[inline]
    pub fn to_cxcywh(&self, image_width: u32, image_height: u32) -> Cxcywh {
        Cxcywh::from_xyxy(
            self.xmin,
            self.ymin,
            self.xmax,
            self.ymax,
            image_width as f64,
            image_height as f64,
        )
    }

    /// May be negative if the box is malformed (xmax < xmin).
    #[inline]
    pub fn width(&self) -> f64 {
        self.xmax - self.xmin
    }

    /// May be negative if the box is malformed (ymax < ymin).
    #[inline]
    pub fn height(&self) -> f64 {
        self.ymax - self.ymin
    }

    /// Returns true if the box is properly ordered (min <= max for both axes).
    #[inline]
    pub fn is_ordered(&self) -> bool {
        self.xmin <= self.xmax && self.ymin <= self.ymax
    }

    /// Returns true if all coordinates are finite (not NaN or infinite).
    #[inline]
    pub fn is_finite(&self) -> bool {
        self.xmin.is_finite()
            && self.ymin.is_finite()
            && self.xmax.is_finite()
            && self.ymax.is_finite()
    }
}
