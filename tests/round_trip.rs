mod common;

use chunker::core::layout::discover_chunks;
use chunker::{decode, encode, read_header, ChunkConfig};
use tempfile::tempdir;

use common::{pattern, snapshot, write_file};

#[test]
fn tree_round_trip_across_capacities() {
    let src = tempdir().expect("tempdir");
    write_file(src.path(), "alpha.bin", &pattern(97, 1));
    write_file(src.path(), "empty", b"");
    write_file(src.path(), "docs/readme.txt", b"hello chunks");
    write_file(src.path(), "docs/nested/deep/blob", &pattern(300, 2));
    write_file(src.path(), "docs/nested/zero", b"");
    write_file(src.path(), "z-last", &pattern(5, 3));
    let expected = snapshot(src.path());

    for capacity in [1, 2, 3, 7, 16, 64, 1000] {
        let chunks = tempdir().expect("tempdir");
        let out = tempdir().expect("tempdir");

        let encoded = encode(src.path(), chunks.path(), ChunkConfig::with_capacity(capacity))
            .expect("encode");
        assert_eq!(encoded.files, expected.len());
        assert_eq!(encoded.total_bytes, 414);

        let decoded = decode(chunks.path(), out.path()).expect("decode");
        assert_eq!(decoded.files, expected.len());
        assert_eq!(decoded.chunks, encoded.chunks);
        assert_eq!(decoded.total_bytes, 414);

        assert_eq!(snapshot(out.path()), expected, "capacity {capacity}");
    }
}

#[test]
fn single_file_round_trip() {
    let src = tempdir().expect("tempdir");
    let chunks = tempdir().expect("tempdir");
    let out = tempdir().expect("tempdir");
    let data = pattern(10_000, 9);
    write_file(src.path(), "video.mp4", &data);

    let report = encode(
        &src.path().join("video.mp4"),
        chunks.path(),
        ChunkConfig::with_capacity(4096),
    )
    .expect("encode");
    assert_eq!(report.chunks, 3);

    let header = read_header(chunks.path()).expect("header");
    assert_eq!(header.positions.len(), 1);
    assert_eq!(header.positions[0].name, "video.mp4");

    decode(chunks.path(), out.path()).expect("decode");
    let restored = std::fs::read(out.path().join("video.mp4")).expect("read restored");
    assert_eq!(restored, data);
}

#[test]
fn empty_tree_round_trip() {
    let src = tempdir().expect("tempdir");
    let chunks = tempdir().expect("tempdir");
    let out = tempdir().expect("tempdir");

    let report = encode(src.path(), chunks.path(), ChunkConfig::with_capacity(8)).expect("encode");
    assert_eq!(report.files, 0);
    assert_eq!(report.chunks, 1);
    assert_eq!(discover_chunks(chunks.path()).expect("chunks"), vec![0]);

    let report = decode(chunks.path(), out.path()).expect("decode");
    assert_eq!(report.files, 0);
    assert!(snapshot(out.path()).is_empty());
}

#[test]
fn zero_length_files_share_offsets() {
    let src = tempdir().expect("tempdir");
    let chunks = tempdir().expect("tempdir");
    let out = tempdir().expect("tempdir");
    write_file(src.path(), "a", b"abcd");
    write_file(src.path(), "b", b"");
    write_file(src.path(), "c", b"efg");
    write_file(src.path(), "d", b"");

    encode(src.path(), chunks.path(), ChunkConfig::with_capacity(4)).expect("encode");

    let header = read_header(chunks.path()).expect("header");
    let offsets: Vec<_> = header
        .positions
        .iter()
        .map(|p| (p.name.as_str(), p.offset))
        .collect();
    assert_eq!(offsets, vec![("a", 0), ("b", 4), ("c", 4), ("d", 7)]);
    assert_eq!(header.total_bytes, 7);
    assert_eq!(std::fs::read(chunks.path().join("chunk-1")).expect("chunk-1"), b"efg");

    decode(chunks.path(), out.path()).expect("decode");
    assert_eq!(snapshot(out.path()), snapshot(src.path()));
}
