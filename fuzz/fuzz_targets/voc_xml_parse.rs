//! Fuzz target for VOC XML parsing, with a small category map so name
//! resolution is exercised too.

#![no_main]

use std::path::Path;
use std::sync::OnceLock;

use labelshift::ir::io_voc_xml::from_voc_xml_slice;
use labelshift::ir::{CategoryMap, NameIndex};
use libfuzzer_sys::fuzz_target;

fn names() -> &'static NameIndex {
    static NAMES: OnceLock<NameIndex> = OnceLock::new();
    NAMES.get_or_init(|| {
        [(0, "cat".to_string()), (1, "dog".to_string())]
            .into_iter()
            .collect::<CategoryMap>()
            .invert()
            .expect("distinct names")
    })
}

fuzz_target!(|data: &[u8]| {
    if data.len() > 10 * 1024 * 1024 {
        return;
    }

    // A missing <size> block makes the parser probe this (absent) root.
    let _ = from_voc_xml_slice(data, Path::new("/nonexistent-fuzz-root"), names());
});
