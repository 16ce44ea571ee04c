//! Category identity: the configured id → name map, its inverse, and the
//! first-seen category table the COCO writer builds.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::Deserialize;

use super::bbox::BBox;
use super::ids::CategoryId;
use super::model::UnifiedLabel;
use crate::error::LabelError;

/// Class id assigned to a VOC object whose name is missing from the map.
pub const UNKNOWN_CLASS_ID: i64 = -1;

/// Category name used by the COCO writer for boxes without a name.
pub const UNNAMED_CATEGORY: &str = "unknown";

/// Configured mapping from integer class id to class name.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CategoryMap {
    names: BTreeMap<i64, String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum CategoryMapFile {
    /// Ultralytics `data.yaml` style: the names live under `names:`.
    Wrapped { names: CategoryNames },
    Bare(CategoryNames),
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum CategoryNames {
    Sequence(Vec<String>),
    Mapping(BTreeMap<i64, String>),
}

impl CategoryMap {
    /// Creates an empty map; every lookup falls back to the stringified id.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads a category map from a YAML file.
    ///
    /// Accepts `{0: cat, 1: dog}`, `[cat, dog]`, or either nested under a
    /// `names:` key.
    pub fn load(path: &Path) -> Result<Self, LabelError> {
        if !path.is_file() {
            return Err(LabelError::CategoryMapNotFound {
                path: path.to_path_buf(),
            });
        }

        let yaml = fs::read_to_string(path).map_err(LabelError::Io)?;
        Self::from_yaml_str(&yaml).map_err(|source| LabelError::CategoryMapParse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Parses a category map from a YAML string.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, serde_yaml::Error> {
        let parsed: CategoryMapFile = serde_yaml::from_str(yaml)?;
        let names = match parsed {
            CategoryMapFile::Wrapped { names } | CategoryMapFile::Bare(names) => names,
        };

        let names = match names {
            CategoryNames::Sequence(names) => names
                .into_iter()
                .enumerate()
                .map(|(idx, name)| (idx as i64, name))
                .collect(),
            CategoryNames::Mapping(mapping) => mapping,
        };

        Ok(Self { names })
    }

    /// Adds or replaces the name for `id`.
    pub fn insert(&mut self, id: i64, name: impl Into<String>) {
        self.names.insert(id, name.into());
    }

    pub fn name(&self, id: i64) -> Option<&str> {
        self.names.get(&id).map(String::as_str)
    }

    /// Returns the configured name, or the stringified id when unmapped.
    pub fn name_or_id(&self, id: i64) -> String {
        self.name(id)
            .map(ToOwned::to_owned)
            .unwrap_or_else(|| id.to_string())
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Iterates `(id, name)` pairs in ascending id order.
    pub fn iter(&self) -> impl Iterator<Item = (i64, &str)> {
        self.names.iter().map(|(id, name)| (*id, name.as_str()))
    }

    /// Builds the name → id lookup used by name-keyed formats.
    ///
    /// The map must be a bijection: a name bound to two ids is rejected.
    pub fn invert(&self) -> Result<NameIndex, LabelError> {
        let mut ids = BTreeMap::new();
        for (id, name) in &self.names {
            if let Some(previous) = ids.insert(name.clone(), *id) {
                return Err(LabelError::CategoryMapInvalid {
                    message: format!(
                        "name '{}' is mapped to both id {} and id {}; name lookup needs unique names",
                        name, previous, id
                    ),
                });
            }
        }
        Ok(NameIndex { ids })
    }
}

impl FromIterator<(i64, String)> for CategoryMap {
    fn from_iter<T: IntoIterator<Item = (i64, String)>>(iter: T) -> Self {
        Self {
            names: iter.into_iter().collect(),
        }
    }
}

/// Name → id lookup derived from a [`CategoryMap`].
#[derive(Clone, Debug, Default)]
pub struct NameIndex {
    ids: BTreeMap<String, i64>,
}

impl NameIndex {
    /// Returns the id for `name`, or [`UNKNOWN_CLASS_ID`].
    pub fn id_or_unknown(&self, name: &str) -> i64 {
        self.ids.get(name).copied().unwrap_or(UNKNOWN_CLASS_ID)
    }
}

/// Categories discovered across a whole label sequence, in first-seen order.
///
/// Built in one pass before any output is emitted, so category ids are fixed
/// by the input order alone: the first distinct name gets id 1, the next id 2,
/// and so on.
#[derive(Clone, Debug, Default)]
pub struct CategoryTable {
    names: Vec<String>,
    ids: BTreeMap<String, CategoryId>,
}

impl CategoryTable {
    /// Collects every distinct category name in `labels`.
    pub fn collect(labels: &[UnifiedLabel]) -> Self {
        Self::assign(labels).0
    }

    /// Collects the table and the id of every box, one `Vec` per record in
    /// input order.
    pub fn assign(labels: &[UnifiedLabel]) -> (Self, Vec<Vec<CategoryId>>) {
        let mut table = Self::default();
        let ids = labels
            .iter()
            .map(|label| label.bboxes.iter().map(|bbox| table.intern(bbox)).collect())
            .collect();
        (table, ids)
    }

    fn intern(&mut self, bbox: &BBox) -> CategoryId {
        let name = Self::category_name(bbox);
        if let Some(id) = self.ids.get(name) {
            return *id;
        }
        let id = CategoryId::from_index(self.names.len());
        self.ids.insert(name.to_string(), id);
        self.names.push(name.to_string());
        id
    }

    /// The name a box is filed under.
    pub fn category_name(bbox: &BBox) -> &str {
        if bbox.label_name.is_empty() {
            UNNAMED_CATEGORY
        } else {
            &bbox.label_name
        }
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Iterates `(id, name)` in id order.
    pub fn iter(&self) -> impl Iterator<Item = (CategoryId, &str)> {
        self.names
            .iter()
            .enumerate()
            .map(|(idx, name)| (CategoryId::from_index(idx), name.as_str()))
    }
}
