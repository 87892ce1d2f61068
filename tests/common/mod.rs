#![allow(dead_code)]

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use chunker::enumerate;

/// Deterministic, non-repeating-looking content for a file.
pub fn pattern(len: usize, seed: u8) -> Vec<u8> {
    (0..len)
        .map(|i| (i as u32).wrapping_mul(31).wrapping_add(seed as u32 * 7) as u8)
        .collect()
}

pub fn write_file(root: &Path, name: &str, data: &[u8]) {
    let path = root.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create parent");
    }
    fs::write(path, data).expect("write file");
}

/// Every file below `root`, keyed by relative name.
pub fn snapshot(root: &Path) -> BTreeMap<String, Vec<u8>> {
    let inputs = enumerate(root).expect("enumerate");
    inputs
        .names
        .iter()
        .map(|name| {
            let data = fs::read(inputs.path_of(name)).expect("read file");
            (name.clone(), data)
        })
        .collect()
}
