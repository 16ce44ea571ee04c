//! Pascal VOC XML reader and writer.
//!
//! One XML file per image, boxes already in absolute XYXY pixels. Class
//! identity in VOC is the object's `<name>`; the reader maps names back to
//! ids through the inverted category map.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};
use roxmltree::Node;

use super::category::NameIndex;
use super::codec::{check_index, LabelReader, LabelWriter, ReaderOptions, WriteSummary};
use super::files::{collect_label_files, ensure_output_dir, read_image_dimensions};
use super::{BBox, UnifiedLabel};
use crate::error::LabelError;

/// Registry name of this codec.
pub const FORMAT_NAME: &str = "voc";

const VOC_XML_EXTENSION: &str = "xml";

// ============================================================================
// Reader
// ============================================================================

/// Reads one VOC XML file or a directory of them, one record per file.
///
/// Files are listed at construction and parsed on access.
#[derive(Debug)]
pub struct VocReader {
    files: Vec<PathBuf>,
    image_root: PathBuf,
    names: NameIndex,
}

impl VocReader {
    /// Lists the `.xml` files under `opts.label_path`.
    ///
    /// # Errors
    /// Fails if the label path is unusable or the category map cannot be
    /// inverted (two ids sharing one name).
    pub fn open(opts: &ReaderOptions) -> Result<Self, LabelError> {
        let names = opts.categories.invert()?;
        let files = collect_label_files(&opts.label_path, VOC_XML_EXTENSION)?;
        info!("[voc] found {} annotation file(s)", files.len());

        Ok(Self {
            files,
            image_root: opts.image_root(),
            names,
        })
    }
}

impl LabelReader for VocReader {
    fn format_name(&self) -> &'static str {
        FORMAT_NAME
    }

    fn len(&self) -> usize {
        self.files.len()
    }

    fn get(&self, index: usize) -> Result<UnifiedLabel, LabelError> {
        check_index(index, self.files.len())?;
        let path = &self.files[index];
        debug!("[voc] parsing {}", path.display());

        let xml = fs::read_to_string(path).map_err(LabelError::Io)?;
        parse_voc_xml_str(&xml, path, &self.image_root, &self.names)
    }
}

/// Parse VOC XML from a UTF-8 string.
///
/// When the document has no `<size>` block the image under `image_root` is
/// probed for its dimensions.
pub fn from_voc_xml_str(
    xml: &str,
    image_root: &Path,
    names: &NameIndex,
) -> Result<UnifiedLabel, LabelError> {
    parse_voc_xml_str(xml, Path::new("<memory>"), image_root, names)
}

/// Parse VOC XML from bytes.
///
/// The input must be valid UTF-8.
pub fn from_voc_xml_slice(
    bytes: &[u8],
    image_root: &Path,
    names: &NameIndex,
) -> Result<UnifiedLabel, LabelError> {
    let xml = std::str::from_utf8(bytes).map_err(|source| LabelError::VocXmlParse {
        path: PathBuf::from("<memory>"),
        message: format!("input is not valid UTF-8: {source}"),
    })?;
    from_voc_xml_str(xml, image_root, names)
}

fn parse_voc_xml_str(
    xml: &str,
    path: &Path,
    image_root: &Path,
    names: &NameIndex,
) -> Result<UnifiedLabel, LabelError> {
    let document = roxmltree::Document::parse(xml).map_err(|source| LabelError::VocXmlParse {
        path: path.to_path_buf(),
        message: source.to_string(),
    })?;

    let annotation = document.root_element();
    if annotation.tag_name().name() != "annotation" {
        return Err(LabelError::VocXmlParse {
            path: path.to_path_buf(),
            message: "missing <annotation> root element".to_string(),
        });
    }

    let filename = required_child_text(annotation, "filename", path, "<annotation>")?;
    let image_path = image_root.join(&filename);

    let mut bboxes = Vec::new();
    for object in annotation
        .children()
        .filter(|node| node.is_element() && node.tag_name().name() == "object")
    {
        let name = required_child_text(object, "name", path, "<object>")?;
        let bndbox = required_child_element(object, "bndbox", path, "<object>")?;

        let xmin = parse_required_f64(bndbox, "xmin", path, "<bndbox>")?;
        let ymin = parse_required_f64(bndbox, "ymin", path, "<bndbox>")?;
        let xmax = parse_required_f64(bndbox, "xmax", path, "<bndbox>")?;
        let ymax = parse_required_f64(bndbox, "ymax", path, "<bndbox>")?;

        let cls_id = names.id_or_unknown(&name);
        bboxes.push(BBox::from_xyxy(xmin, ymin, xmax, ymax, cls_id, name));
    }

    let (width, height) = match child_element(annotation, "size") {
        Some(size) => (
            parse_required_u32(size, "width", path, "<size>")?,
            parse_required_u32(size, "height", path, "<size>")?,
        ),
        None => {
            debug!(
                "[voc] {} has no <size>; probing {}",
                path.display(),
                image_path.display()
            );
            read_image_dimensions(&image_path)?
        }
    };

    Ok(UnifiedLabel::new(image_path, width, height).with_bboxes(bboxes))
}

fn required_child_element<'a, 'input>(
    node: Node<'a, 'input>,
    tag: &str,
    path: &Path,
    context: &str,
) -> Result<Node<'a, 'input>, LabelError> {
    child_element(node, tag).ok_or_else(|| LabelError::VocXmlParse {
        path: path.to_path_buf(),
        message: format!("missing <{tag}> in {context}"),
    })
}

fn required_child_text(
    node: Node<'_, '_>,
    tag: &str,
    path: &Path,
    context: &str,
) -> Result<String, LabelError> {
    optional_child_text(node, tag).ok_or_else(|| LabelError::VocXmlParse {
        path: path.to_path_buf(),
        message: format!("missing <{tag}> in {context}"),
    })
}

fn parse_required_u32(
    node: Node<'_, '_>,
    tag: &str,
    path: &Path,
    context: &str,
) -> Result<u32, LabelError> {
    let raw = required_child_text(node, tag, path, context)?;
    raw.parse::<u32>().map_err(|_| LabelError::VocXmlParse {
        path: path.to_path_buf(),
        message: format!("invalid <{tag}> value '{raw}' in {context}; expected u32"),
    })
}

fn parse_required_f64(
    node: Node<'_, '_>,
    tag: &str,
    path: &Path,
    context: &str,
) -> Result<f64, LabelError> {
    let raw = required_child_text(node, tag, path, context)?;
    raw.parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
        .ok_or_else(|| LabelError::VocXmlParse {
            path: path.to_path_buf(),
            message: format!("invalid <{tag}> value '{raw}' in {context}; expected finite number"),
        })
}

fn child_element<'a, 'input>(node: Node<'a, 'input>, tag: &str) -> Option<Node<'a, 'input>> {
    node.children()
        .find(|child| child.is_element() && child.tag_name().name() == tag)
}

fn optional_child_text(node: Node<'_, '_>, tag: &str) -> Option<String> {
    child_element(node, tag)
        .and_then(|child| child.text())
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(ToOwned::to_owned)
}

// ============================================================================
// Writer
// ============================================================================

/// Writes one `<stem>.xml` per record into a directory.
#[derive(Clone, Debug)]
pub struct VocWriter {
    output_dir: PathBuf,
}

impl VocWriter {
    pub fn new(destination: &Path) -> Self {
        Self {
            output_dir: destination.to_path_buf(),
        }
    }
}

impl LabelWriter for VocWriter {
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
            let xml_path = self.output_dir.join(format!("{stem}.{VOC_XML_EXTENSION}"));

            if !written.insert(xml_path.clone()) {
                warn!(
                    "[voc] {} written more than once; the last record wins",
                    xml_path.display()
                );
            }

            fs::write(&xml_path, to_voc_xml_string(label)).map_err(LabelError::Io)?;

            summary.images += 1;
            summary.annotations += label.bboxes.len();
            summary.files.push(xml_path);
        }

        info!(
            "[voc] wrote {} file(s) to {}",
            written.len(),
            self.output_dir.display()
        );
        Ok(summary)
    }
}

/// Renders one record as an indented VOC document (no XML declaration).
///
/// Box coordinates are truncated toward zero to integers.
pub fn to_voc_xml_string(label: &UnifiedLabel) -> String {
    let mut xml = String::from("<annotation>\n");

    xml.push_str(&format!(
        "  <folder>{}</folder>\n",
        xml_escape(&label.folder_name().unwrap_or_default())
    ));
    xml.push_str(&format!(
        "  <filename>{}</filename>\n",
        xml_escape(&label.file_name().unwrap_or_default())
    ));
    xml.push_str(&format!(
        "  <path>{}</path>\n",
        xml_escape(&label.image_path.to_string_lossy())
    ));
    xml.push_str("  <size>\n");
    xml.push_str(&format!("    <width>{}</width>\n", label.image_width));
    xml.push_str(&format!("    <height>{}</height>\n", label.image_height));
    xml.push_str("  </size>\n");

    for bbox in &label.bboxes {
        xml.push_str("  <object>\n");
        xml.push_str(&format!("    <name>{}</name>\n", xml_escape(&bbox.label_name)));
        xml.push_str("    <bndbox>\n");
        xml.push_str(&format!("      <xmin>{}</xmin>\n", truncate(bbox.xmin)));
        xml.push_str(&format!("      <ymin>{}</ymin>\n", truncate(bbox.ymin)));
        xml.push_str(&format!("      <xmax>{}</xmax>\n", truncate(bbox.xmax)));
        xml.push_str(&format!("      <ymax>{}</ymax>\n", truncate(bbox.ymax)));
        xml.push_str("    </bndbox>\n");
        xml.push_str("  </object>\n");
    }

    xml.push_str("</annotation>\n");
    xml
}

fn truncate(value: f64) -> i64 {
    value.trunc() as i64
}

fn xml_escape(raw: &str) -> String {
    raw.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{CategoryMap, UNKNOWN_CLASS_ID};

    fn names() -> NameIndex {
        let map: CategoryMap = [(0, "cat".to_string()), (1, "dog".to_string())]
            .into_iter()
            .collect();
        map.invert().expect("invert map")
    }

    #[test]
    fn parse_voc_xml_extracts_boxes_and_ids() {
        let xml = r#"<?xml version="1.0" encoding="utf-8"?>
<annotation>
  <folder>JPEGImages</folder>
  <filename>img1.jpg</filename>
  <size>
    <width>640</width>
    <height>480</height>
    <depth>3</depth>
  </size>
  <object>
    <name>dog</name>
    <bndbox>
      <xmin>10.5</xmin>
      <ymin>20</ymin>
      <xmax>30</xmax>
      <ymax>40</ymax>
    </bndbox>
  </object>
  <object>
    <name>bird</name>
    <bndbox>
      <xmin>1</xmin>
      <ymin>2</ymin>
      <xmax>3</xmax>
      <ymax>4</ymax>
    </bndbox>
  </object>
</annotation>"#;

        let label = from_voc_xml_str(xml, Path::new("images"), &names()).expect("parse xml");
        assert_eq!(label.image_path, Path::new("images/img1.jpg"));
        assert_eq!(label.image_width, 640);
        assert_eq!(label.image_height, 480);
        assert_eq!(label.bboxes.len(), 2);

        let dog = &label.bboxes[0];
        assert_eq!(dog.cls_id, 1);
        assert_eq!(dog.label_name, "dog");
        assert_eq!(dog.xmin, 10.5);
        assert_eq!(dog.ymax, 40.0);

        let bird = &label.bboxes[1];
        assert_eq!(bird.cls_id, UNKNOWN_CLASS_ID);
        assert_eq!(bird.label_name, "bird");
    }

    #[test]
    fn parse_voc_xml_rejects_malformed_documents() {
        let wrong_root = "<root><filename>a.jpg</filename></root>";
        assert!(matches!(
            from_voc_xml_str(wrong_root, Path::new(""), &names()),
            Err(LabelError::VocXmlParse { .. })
        ));

        let bad_number = r#"<annotation>
  <filename>a.jpg</filename>
  <size><width>10</width><height>10</height></size>
  <object><name>cat</name><bndbox><xmin>x</xmin><ymin>0</ymin><xmax>1</xmax><ymax>1</ymax></bndbox></object>
</annotation>"#;
        let err = from_voc_xml_str(bad_number, Path::new(""), &names()).unwrap_err();
        assert!(err.to_string().contains("<xmin>"));

        assert!(from_voc_xml_str("<annotation>", Path::new(""), &names()).is_err());
    }

    #[test]
    fn parse_voc_xml_rejects_non_finite_coordinates() {
        for (tag, raw) in [("xmin", "nan"), ("ymin", "inf"), ("xmax", "-inf"), ("ymax", "infinity")] {
            let mut coords = vec![("xmin", "0"), ("ymin", "0"), ("xmax", "1"), ("ymax", "1")];
            for entry in coords.iter_mut() {
                if entry.0 == tag {
                    entry.1 = raw;
                }
            }
            let bndbox: String = coords
                .iter()
                .map(|(t, v)| format!("<{t}>{v}</{t}>"))
                .collect();
            let xml = format!(
                "<annotation><filename>a.jpg</filename>\
                 <size><width>10</width><height>10</height></size>\
                 <object><name>cat</name><bndbox>{bndbox}</bndbox></object></annotation>"
            );

            let err = from_voc_xml_str(&xml, Path::new(""), &names()).unwrap_err();
            assert!(matches!(err, LabelError::VocXmlParse { .. }), "{tag}: {err}");
            assert!(err.to_string().contains(&format!("<{tag}>")));
        }
    }

    #[test]
    fn parse_voc_xml_without_size_needs_the_image() {
        let xml = "<annotation><filename>missing.jpg</filename></annotation>";
        let temp = tempfile::tempdir().expect("create temp dir");
        let err = from_voc_xml_str(xml, temp.path(), &names()).unwrap_err();
        assert!(matches!(err, LabelError::ImageDimensionRead { .. }));
    }

    #[test]
    fn to_voc_xml_truncates_coordinates() {
        let label = UnifiedLabel::new("data/images/0001.jpg", 640, 480).with_bboxes(vec![
            BBox::from_xyxy(10.9, 20.2, 40.99, 60.5, 0, "cat & dog"),
        ]);

        let xml = to_voc_xml_string(&label);
        assert!(!xml.starts_with("<?xml"));
        assert!(xml.contains("<folder>images</folder>"));
        assert!(xml.contains("<filename>0001.jpg</filename>"));
        assert!(xml.contains("<path>data/images/0001.jpg</path>"));
        assert!(xml.contains("<name>cat &amp; dog</name>"));
        assert!(xml.contains("<xmin>10</xmin>"));
        assert!(xml.contains("<ymin>20</ymin>"));
        assert!(xml.contains("<xmax>40</xmax>"));
        assert!(xml.contains("<ymax>60</ymax>"));
    }

    #[test]
    fn written_xml_parses_back() {
        let label = UnifiedLabel::new("imgs/a.jpg", 32, 16)
            .with_bboxes(vec![BBox::from_xyxy(1.0, 2.0, 3.0, 4.0, 0, "cat")]);

        let restored = from_voc_xml_str(&to_voc_xml_string(&label), Path::new("imgs"), &names())
            .expect("parse written xml");
        assert_eq!(restored, label);
    }
}
