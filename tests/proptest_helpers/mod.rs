#![allow(dead_code)]

use labelshift::ir::{BBox, UnifiedLabel};
use proptest::prelude::*;
use proptest::test_runner::{Config as ProptestConfig, FileFailurePersistence};

pub const EPS_YOLO: f64 = 1e-6;

pub fn proptest_config() -> ProptestConfig {
    let cases = std::env::var("PROPTEST_CASES")
        .ok()
        .and_then(|v| v.parse::<u32>().ok())
        .unwrap_or(64);

    let mut config = ProptestConfig::with_failure_persistence(FileFailurePersistence::WithSource(
        "proptest-regressions",
    ));
    config.cases = cases;
    config.max_shrink_iters = 1024;
    config
}

/// Whole-pixel `[x, y, w, h]` with non-negative extents.
pub fn arb_coco_bbox() -> impl Strategy<Value = [f64; 4]> {
    (0u32..4096, 0u32..4096, 0u32..2048, 0u32..2048)
        .prop_map(|(x, y, w, h)| [x as f64, y as f64, w as f64, h as f64])
}

/// An image size plus a normalized box that stays inside it.
pub fn arb_yolo_box() -> impl Strategy<Value = (u32, u32, [f64; 4])> {
    (1u32..4096, 1u32..4096, 0.001f64..=1.0, 0.001f64..=1.0, 0.0f64..=1.0, 0.0f64..=1.0)
        .prop_map(|(width, height, bw, bh, fx, fy)| {
            let cx = bw / 2.0 + fx * (1.0 - bw);
            let cy = bh / 2.0 + fy * (1.0 - bh);
            (width, height, [cx, cy, bw, bh])
        })
}

/// Boxes whose corners are swapped on at least one axis.
pub fn arb_unordered_bbox() -> impl Strategy<Value = BBox> {
    (0.0f64..1000.0, 0.0f64..1000.0, 0.5f64..500.0, 0.5f64..500.0, any::<bool>())
        .prop_map(|(x, y, dx, dy, swap_both)| {
            let (ymin, ymax) = if swap_both { (y + dy, y) } else { (y, y + dy) };
            BBox::from_xyxy(x + dx, ymin, x, ymax, 0, "cat")
        })
}

fn arb_name() -> impl Strategy<Value = String> {
    prop::sample::select(vec!["person", "car", "dog", "traffic light"]).prop_map(String::from)
}

/// Labels with integer-valued, ordered boxes, so every format can carry
/// them unchanged.
pub fn arb_labels(max_images: usize, max_boxes: usize) -> impl Strategy<Value = Vec<UnifiedLabel>> {
    let bbox = (0u32..500, 0u32..500, 1u32..100, 1u32..100, arb_name()).prop_map(
        |(x, y, w, h, name)| {
            BBox::from_xyxy(
                x as f64,
                y as f64,
                (x + w) as f64,
                (y + h) as f64,
                0,
                name,
            )
        },
    );

    prop::collection::vec(prop::collection::vec(bbox, 0..=max_boxes), 1..=max_images).prop_map(
        |images| {
            images
                .into_iter()
                .enumerate()
                .map(|(idx, bboxes)| {
                    UnifiedLabel::new(format!("img_{idx:03}.jpg"), 640, 640).with_bboxes(bboxes)
                })
                .collect()
        },
    )
}
