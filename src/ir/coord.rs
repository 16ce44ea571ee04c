//! Box encodings and the pure conversions between them.
//!
//! The canonical form is absolute-pixel XYXY, stored directly on
//! [`BBox`](super::BBox). The two other encodings only exist at codec
//! boundaries:
//!
//! - [`Xywh`]: COCO's top-left corner plus extent, in pixels.
//! - [`Cxcywh`]: YOLO's center plus extent, normalized by image size.
//!
//! VOC already stores absolute XYXY and needs no conversion.

/// A COCO box: top-left corner plus width/height, in absolute pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Xywh {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl Xywh {
    #[inline]
    pub fn new(x: f64, y: f64, w: f64, h: f64) -> Self {
        Self { x, y, w, h }
    }

    /// Converts a canonical XYXY box to COCO form.
    ///
    /// Negative extents (xmax < xmin or ymax < ymin) clamp to zero.
    #[inline]
    pub fn from_xyxy(xmin: f64, ymin: f64, xmax: f64, ymax: f64) -> Self {
        Self {
            x: xmin,
            y: ymin,
            w: (xmax - xmin).max(0.0),
            h: (ymax - ymin).max(0.0),
        }
    }

    /// Returns `(xmin, ymin, xmax, ymax)`.
    #[inline]
    pub fn to_xyxy(&self) -> (f64, f64, f64, f64) {
        (self.x, self.y, self.x + self.w, self.y + self.h)
    }

    #[inline]
    pub fn area(&self) -> f64 {
        self.w * self.h
    }

    /// Returns `[x, y, w, h]`, the order COCO serializes.
    #[inline]
    pub fn to_array(&self) -> [f64; 4] {
        [self.x, self.y, self.w, self.h]
    }
}

/// A YOLO box: center plus width/height, normalized to `[0, 1]`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Cxcywh {
    pub cx: f64,
    pub cy: f64,
    pub w: f64,
    pub h: f64,
}

impl Cxcywh {
    #[inline]
    pub fn new(cx: f64, cy: f64, w: f64, h: f64) -> Self {
        Self { cx, cy, w, h }
    }

    /// Normalizes a canonical XYXY box against an image of
    /// `image_width` x `image_height` pixels.
    ///
    /// The caller is responsible for non-zero image dimensions.
    #[inline]
    pub fn from_xyxy(
        xmin: f64,
        ymin: f64,
        xmax: f64,
        ymax: f64,
        image_width: f64,
        image_height: f64,
    ) -> Self {
        Self {
            cx: (xmin + xmax) / 2.0 / image_width,
            cy: (ymin + ymax) / 2.0 / image_height,
            w: (xmax - xmin) / image_width,
            h: (ymax - ymin) / image_height,
        }
    }

    /// Returns absolute `(xmin, ymin, xmax, ymax)` for the given image size.
    #[inline]
    pub fn to_xyxy(&self, image_width: f64, image_height: f64) -> (f64, f64, f64, f64) {
        (
            (self.cx - self.w / 2.0) * image_width,
            (self.cy - self.h / 2.0) * image_height,
            (self.cx + self.w / 2.0) * image_width,
            (self.cy + self.h / 2.0) * image_height,
        )
    }
}
