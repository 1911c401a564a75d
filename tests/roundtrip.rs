//! Black-box round-trip tests through the public compile/load API, covering
//! the concrete scenarios enumerated in the BlobFS design document.

use blobfs::{compile, load, CompileOptions, Tree};

#[test]
fn roundtrip_plain_tree() {
    let tree = Tree::dir([
        ("a.txt".to_string(), Tree::file(*b"hello")),
        (
            "sub".to_string(),
            Tree::dir([("b.txt".to_string(), Tree::file(*b"world"))]),
        ),
    ]);

    let blob = compile(&tree, CompileOptions::default()).unwrap();
    assert_eq!(load(&blob).unwrap(), tree);
}

#[test]
fn roundtrip_with_compression() {
    let tree = Tree::dir([(
        "big.txt".to_string(),
        Tree::file(vec![b'A'; 4096]),
    )]);

    let blob = compile(&tree, CompileOptions { compress: true }).unwrap();
    assert_eq!(load(&blob).unwrap(), tree);
}

#[test]
fn empty_tree_roundtrips() {
    let tree = Tree::empty_dir();
    let blob = compile(&tree, CompileOptions::default()).unwrap();
    assert!(blob.len() >= blobfs::format::ENTRY_SIZE);
    assert_eq!(load(&blob).unwrap(), tree);
}

#[test]
fn dedup_keeps_blob_small() {
    let payload = vec![0x42u8; 1024];
    let children = (0..100)
        .map(|i| (format!("f{i}"), Tree::file(payload.clone())))
        .collect::<std::collections::BTreeMap<_, _>>();
    let tree = Tree::Dir(children);

    let blob = compile(&tree, CompileOptions::default()).unwrap();
    // One copy of the 1 KiB payload plus headers/names/tables, not 100.
    assert!(
        blob.len() < 1024 * 5,
        "blob grew roughly linearly with duplicate count: {} bytes",
        blob.len()
    );
    assert_eq!(load(&blob).unwrap(), tree);
}

#[test]
fn determinism_across_runs() {
    let tree = Tree::dir([
        ("z".to_string(), Tree::file(*b"zzz")),
        ("a".to_string(), Tree::file(*b"aaa")),
    ]);
    let first = compile(&tree, CompileOptions { compress: true }).unwrap();
    let second = compile(&tree, CompileOptions { compress: true }).unwrap();
    assert_eq!(first, second);
}
