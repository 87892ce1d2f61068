use std::fs;

use chunker::core::layout::header_path;
use chunker::{encode_inputs, ChunkConfig, Error, InputSet};
use tempfile::tempdir;

#[test]
fn duplicate_names_abort_without_header() {
    let src = tempdir().expect("tempdir");
    let chunks = tempdir().expect("tempdir");
    fs::write(src.path().join("same"), b"payload").expect("write");
    let inputs = InputSet::new(src.path(), vec!["same".to_string(), "same".to_string()]);

    let aborted =
        encode_inputs(&inputs, chunks.path(), ChunkConfig::with_capacity(4)).unwrap_err();
    assert!(matches!(aborted.error, Error::DuplicateName(ref name) if name == "same"));
    assert_eq!(aborted.progress.files, 1);
    assert_eq!(aborted.progress.total_bytes, 7);
    assert!(!header_path(chunks.path()).exists());
}
