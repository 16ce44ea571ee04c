//! Name-based dispatch from format names to codec constructors.
//!
//! A [`RegistryBuilder`] collects constructors; [`RegistryBuilder::build`]
//! freezes them into a [`Registry`] that is read-only from then on and is
//! passed by reference to whatever needs to resolve a format name.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use log::debug;

use crate::error::LabelError;
use crate::ir::io_coco_json::{self, CocoReader, CocoWriter};
use crate::ir::io_voc_xml::{self, VocReader, VocWriter};
use crate::ir::io_yolo::{self, YoloReader, YoloWriter};
use crate::ir::{LabelReader, LabelWriter, ReaderOptions};

/// Builds a reader for one source dataset.
pub type ReaderFactory =
    Box<dyn Fn(&ReaderOptions) -> Result<Box<dyn LabelReader>, LabelError> + Send + Sync>;

/// Builds a writer targeting one destination path.
pub type WriterFactory = Box<dyn Fn(&Path) -> Result<Box<dyn LabelWriter>, LabelError> + Send + Sync>;

/// Mutable registration phase.
///
/// Registering a name twice keeps the later constructor.
#[derive(Default)]
pub struct RegistryBuilder {
    readers: BTreeMap<String, ReaderFactory>,
    writers: BTreeMap<String, WriterFactory>,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_reader<F>(mut self, name: impl Into<String>, factory: F) -> Self
    where
        F: Fn(&ReaderOptions) -> Result<Box<dyn LabelReader>, LabelError> + Send + Sync + 'static,
    {
        let name = name.into();
        if self.readers.insert(name.clone(), Box::new(factory)).is_some() {
            debug!("reader '{}' re-registered; keeping the newer one", name);
        }
        self
    }

    pub fn register_writer<F>(mut self, name: impl Into<String>, factory: F) -> Self
    where
        F: Fn(&Path) -> Result<Box<dyn LabelWriter>, LabelError> + Send + Sync + 'static,
    {
        let name = name.into();
        if self.writers.insert(name.clone(), Box::new(factory)).is_some() {
            debug!("writer '{}' re-registered; keeping the newer one", name);
        }
        self
    }

    /// Freezes the registrations.
    pub fn build(self) -> Registry {
        Registry {
            readers: self.readers,
            writers: self.writers,
        }
    }
}

/// Immutable name → constructor lookup for readers and writers.
pub struct Registry {
    readers: BTreeMap<String, ReaderFactory>,
    writers: BTreeMap<String, WriterFactory>,
}

impl Registry {
    /// Registry with the built-in `coco`, `voc` and `yolo` codecs.
    pub fn builtin() -> Self {
        RegistryBuilder::new()
            .register_reader(io_coco_json::FORMAT_NAME, |opts: &ReaderOptions| {
                Ok(Box::new(CocoReader::open(opts)?) as Box<dyn LabelReader>)
            })
            .register_reader(io_voc_xml::FORMAT_NAME, |opts: &ReaderOptions| {
                Ok(Box::new(VocReader::open(opts)?) as Box<dyn LabelReader>)
            })
            .register_reader(io_yolo::FORMAT_NAME, |opts: &ReaderOptions| {
                Ok(Box::new(YoloReader::open(opts)?) as Box<dyn LabelReader>)
            })
            .register_writer(io_coco_json::FORMAT_NAME, |dest: &Path| {
                Ok(Box::new(CocoWriter::new(dest)) as Box<dyn LabelWriter>)
            })
            .register_writer(io_voc_xml::FORMAT_NAME, |dest: &Path| {
                Ok(Box::new(VocWriter::new(dest)) as Box<dyn LabelWriter>)
            })
            .register_writer(io_yolo::FORMAT_NAME, |dest: &Path| {
                Ok(Box::new(YoloWriter::new(dest)) as Box<dyn LabelWriter>)
            })
            .build()
    }

    /// Constructs the reader registered as `name`.
    ///
    /// # Errors
    /// [`LabelError::UnknownFormat`] if nothing is registered under `name`,
    /// otherwise whatever the reader's constructor fails with.
    pub fn reader(&self, name: &str, opts: &ReaderOptions) -> Result<Box<dyn LabelReader>, LabelError> {
        let factory = self.readers.get(name).ok_or_else(|| LabelError::UnknownFormat {
            role: "reader",
            name: name.to_string(),
            available: self.reader_names().join(", "),
        })?;
        factory(opts)
    }

    /// Constructs the writer registered as `name`.
    pub fn writer(&self, name: &str, destination: &Path) -> Result<Box<dyn LabelWriter>, LabelError> {
        let factory = self.writers.get(name).ok_or_else(|| LabelError::UnknownFormat {
            role: "writer",
            name: name.to_string(),
            available: self.writer_names().join(", "),
        })?;
        factory(destination)
    }

    /// Registered reader names, sorted.
    pub fn reader_names(&self) -> Vec<&str> {
        self.readers.keys().map(String::as_str).collect()
    }

    /// Registered writer names, sorted.
    pub fn writer_names(&self) -> Vec<&str> {
        self.writers.keys().map(String::as_str).collect()
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("readers", &self.reader_names())
            .field("writers", &self.writer_names())
            .finish()
    }
}
