use std::path::Path;

use labelshift::ir::io_coco_json::{from_coco_str, to_coco_string};
use labelshift::ir::io_voc_xml::{from_voc_xml_str, to_voc_xml_string};
use labelshift::ir::io_yolo::{parse_label_line, to_yolo_string};
use labelshift::ir::{BBox, CategoryMap, Cxcywh, UnifiedLabel, Xywh};
use proptest::prelude::*;

mod proptest_helpers;
use proptest_helpers::EPS_YOLO;

proptest! {
    #![proptest_config(proptest_helpers::proptest_config())]

    #[test]
    fn coco_bbox_roundtrip_is_exact(bbox in proptest_helpers::arb_coco_bbox()) {
        let [x, y, w, h] = bbox;
        let json = format!(
            r#"{{"images": [{{"id": 1, "file_name": "a.jpg", "width": 4096, "height": 4096}}],
                "annotations": [{{"id": 1, "image_id": 1, "category_id": 1, "bbox": [{x}, {y}, {w}, {h}]}}],
                "categories": [{{"id": 1, "name": "cat"}}]}}"#
        );

        let labels = from_coco_str(&json, Path::new("")).expect("parse coco");
        let exported: serde_json::Value =
            serde_json::from_str(&to_coco_string(&labels).expect("encode coco")).expect("json");
        let ann = &exported["annotations"][0];

        let got: Vec<f64> = ann["bbox"]
            .as_array()
            .expect("bbox")
            .iter()
            .map(|v| v.as_f64().expect("number"))
            .collect();
        prop_assert_eq!(got, vec![x, y, w, h]);
        prop_assert_eq!(ann["area"].as_f64().expect("area"), w * h);
    }

    #[test]
    fn unordered_boxes_clamp_to_zero_extent(bbox in proptest_helpers::arb_unordered_bbox()) {
        let xywh = bbox.to_xywh();
        prop_assert!(xywh.w >= 0.0 && xywh.h >= 0.0);
        prop_assert_eq!(xywh.w, (bbox.xmax - bbox.xmin).max(0.0));
        prop_assert_eq!(xywh.h, (bbox.ymax - bbox.ymin).max(0.0));
        prop_assert_eq!(xywh.area(), 0.0);

        let label = UnifiedLabel::new("a.jpg", 2000, 2000).with_bboxes(vec![bbox]);
        let exported: serde_json::Value =
            serde_json::from_str(&to_coco_string(&[label]).expect("encode coco")).expect("json");
        prop_assert_eq!(exported["annotations"][0]["area"].as_f64(), Some(0.0));
    }

    #[test]
    fn yolo_roundtrip_within_tolerance((width, height, row) in proptest_helpers::arb_yolo_box()) {
        let [cx, cy, bw, bh] = row;
        let bbox = BBox::from_cxcywh(Cxcywh::new(cx, cy, bw, bh), width, height, 3, "3");
        let label = UnifiedLabel::new("a.jpg", width, height).with_bboxes(vec![bbox]);

        let text = to_yolo_string(&label).expect("encode yolo");
        let parsed = parse_label_line(text.trim_end(), Path::new("a.txt"), 1)
            .expect("parse yolo")
            .expect("one row");

        prop_assert_eq!(parsed.class_id, 3);
        prop_assert!((parsed.cx - cx).abs() < EPS_YOLO);
        prop_assert!((parsed.cy - cy).abs() < EPS_YOLO);
        prop_assert!((parsed.w - bw).abs() < EPS_YOLO);
        prop_assert!((parsed.h - bh).abs() < EPS_YOLO);
    }

    #[test]
    fn xywh_and_xyxy_agree(x in -1000.0f64..1000.0, y in -1000.0f64..1000.0, w in 0.0f64..1000.0, h in 0.0f64..1000.0) {
        let bbox = BBox::from_xywh(Xywh::new(x, y, w, h), 0, "cat");
        prop_assert!(bbox.is_ordered());
        prop_assert!((bbox.width() - w).abs() < 1e-9);
        prop_assert!((bbox.height() - h).abs() < 1e-9);
    }

    #[test]
    fn integer_labels_survive_every_format(labels in proptest_helpers::arb_labels(4, 5)) {
        let coco = from_coco_str(&to_coco_string(&labels).expect("encode coco"), Path::new(""))
            .expect("parse coco");
        prop_assert_eq!(coco.len(), labels.len());

        let names = CategoryMap::new().invert().expect("empty map inverts");
        for (label, from_coco) in labels.iter().zip(&coco) {
            let voc = from_voc_xml_str(&to_voc_xml_string(label), Path::new(""), &names)
                .expect("parse voc");

            for ((orig, c), v) in label.bboxes.iter().zip(&from_coco.bboxes).zip(&voc.bboxes) {
                prop_assert_eq!(
                    (orig.xmin, orig.ymin, orig.xmax, orig.ymax),
                    (c.xmin, c.ymin, c.xmax, c.ymax)
                );
                prop_assert_eq!(
                    (orig.xmin, orig.ymin, orig.xmax, orig.ymax),
                    (v.xmin, v.ymin, v.xmax, v.ymax)
                );
                prop_assert_eq!(&orig.label_name, &c.label_name);
                prop_assert_eq!(&orig.label_name, &v.label_name);
            }
        }
    }
}
