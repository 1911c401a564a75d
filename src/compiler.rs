//! Serializes an in-memory [`Tree`] into a blob.
//!
//! Mirrors the post-order, content-addressed writer from the original
//! implementation: leaf payloads are written first and deduplicated by exact
//! byte equality, directory child tables reference already-written offsets,
//! and the root header is patched in at the very end.

use std::collections::HashMap;
use std::io::Write;

use flate2::write::ZlibEncoder;
use flate2::Compression;

use crate::error::{BlobError, InvalidNameReason, Result};
use crate::format::{EntryHeader, COMPRESSED, DIRENTRY_SIZE, ENTRY_SIZE, IS_DIR};
use crate::tree::Tree;

/// Options controlling a single [`compile`] call.
#[derive(Debug, Clone, Copy, Default)]
pub struct CompileOptions {
    /// Attempt zlib compression of file payloads; only kept when it
    /// strictly shrinks the payload.
    pub compress: bool,
}

/// Compile `root` into a blob under the given options.
///
/// For a fixed `root` and fixed `options.compress`, the output is
/// byte-identical across runs and platforms (sorted child iteration comes
/// from [`Tree::Dir`]'s `BTreeMap`, zlib output is deterministic for fixed
/// input, and traversal order is the fixed post-order below).
pub fn compile(root: &Tree, options: CompileOptions) -> Result<Vec<u8>> {
    Compiler::new(options).compile(root)
}

struct Compiler {
    options: CompileOptions,
    buf: Vec<u8>,
    cache: HashMap<Vec<u8>, u32>,
}

impl Compiler {
    fn new(options: CompileOptions) -> Self {
        Self {
            options,
            buf: Vec::new(),
            cache: HashMap::new(),
        }
    }

    fn compile(mut self, root: &Tree) -> Result<Vec<u8>> {
        self.buf.clear();
        self.cache.clear();
        self.buf.resize(ENTRY_SIZE, 0);

        let root_header = self.encode_entry(root, "")?;
        self.buf[0..ENTRY_SIZE].copy_from_slice(&root_header.to_bytes());
        Ok(self.buf)
    }

    /// Append `bytes` unless an identical byte string was already written;
    /// return the offset either way. Never truncates or overwrites.
    fn store_data(&mut self, bytes: &[u8]) -> Result<u32> {
        if let Some(&offset) = self.cache.get(bytes) {
            return Ok(offset);
        }
        let offset = self.checked_offset(self.buf.len(), bytes.len())?;
        self.buf.extend_from_slice(bytes);
        self.cache.insert(bytes.to_vec(), offset);
        Ok(offset)
    }

    /// Try zlib compression; keep it only if strictly shorter than the raw
    /// form (ties favor the uncompressed form, per spec).
    fn store_compressed(&mut self, bytes: &[u8], path: &str) -> Result<(u32, u8)> {
        if self.options.compress {
            let compressed = zlib_compress(bytes).map_err(|source| BlobError::CompressionFailed {
                path: path.to_string(),
                source,
            })?;
            if compressed.len() < bytes.len() {
                let offset = self.store_data(&compressed)?;
                return Ok((offset, COMPRESSED));
            }
        }
        let offset = self.store_data(bytes)?;
        Ok((offset, 0))
    }

    fn encode_entry(&mut self, entry: &Tree, path: &str) -> Result<EntryHeader> {
        match entry {
            Tree::Dir(children) => {
                let size = u32_checked(children.len() as u64)?;
                let mut table = Vec::with_capacity(children.len() * DIRENTRY_SIZE);
                // BTreeMap iteration is already ascending byte-lexicographic order.
                for (name, child) in children {
                    let child_path = if path.is_empty() {
                        name.clone()
                    } else {
                        format!("{path}/{name}")
                    };
                    validate_name(name, &child_path)?;
                    let mut name_bytes = name.as_bytes().to_vec();
                    name_bytes.push(0);
                    let name_ptr = self.store_data(&name_bytes)?;
                    table.extend_from_slice(&name_ptr.to_le_bytes());

                    let child_header = self.encode_entry(child, &child_path)?;
                    table.extend_from_slice(&child_header.to_bytes());
                }
                let ptr = self.store_data(&table)?;
                Ok(EntryHeader {
                    flags: IS_DIR,
                    size,
                    ptr,
                })
            }
            Tree::File(bytes) => {
                let size = u32_checked(bytes.len() as u64)?;
                let (ptr, flags) = self.store_compressed(bytes, path)?;
                Ok(EntryHeader { flags, size, ptr })
            }
        }
    }

    fn checked_offset(&self, current_len: usize, extra: usize) -> Result<u32> {
        let needed = current_len as u64 + extra as u64;
        u32_checked(needed)?;
        u32_checked(current_len as u64)
    }
}

fn u32_checked(value: u64) -> Result<u32> {
    u32::try_from(value).map_err(|_| BlobError::BlobTooLarge {
        needed: value,
        max: u32::MAX as u64,
    })
}

fn validate_name(name: &str, path: &str) -> Result<()> {
    if name.as_bytes().contains(&0) {
        return Err(BlobError::InvalidName {
            name: path.to_string(),
            reason: InvalidNameReason::ContainsNul,
        });
    }
    Ok(())
}

fn zlib_compress(bytes: &[u8]) -> std::io::Result<Vec<u8>> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::best());
    encoder.write_all(bytes)?;
    encoder.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::PTR_SIZE;

    #[test]
    fn empty_dir_is_nine_bytes_plus_slack() {
        let blob = compile(&Tree::empty_dir(), CompileOptions::default()).unwrap();
        assert!(blob.len() >= ENTRY_SIZE);
        let header = EntryHeader::from_bytes(&blob[0..ENTRY_SIZE]);
        assert!(header.is_dir());
        assert_eq!(header.size, 0);
    }

    #[test]
    fn single_empty_file() {
        let tree = Tree::dir([("a".to_string(), Tree::file(Vec::new()))]);
        let blob = compile(&tree, CompileOptions::default()).unwrap();
        let root = EntryHeader::from_bytes(&blob[0..ENTRY_SIZE]);
        assert!(root.is_dir());
        assert_eq!(root.size, 1);
        assert_eq!(root.ptr as usize, ENTRY_SIZE);

        let rec_start = root.ptr as usize;
        let name_ptr = u32::from_le_bytes(
            blob[rec_start..rec_start + PTR_SIZE].try_into().unwrap(),
        );
        assert_eq!(&blob[name_ptr as usize..name_ptr as usize + 2], b"a\0");

        let child = EntryHeader::from_bytes(
            &blob[rec_start + PTR_SIZE..rec_start + PTR_SIZE + ENTRY_SIZE],
        );
        assert_eq!(child.flags, 0);
        assert_eq!(child.size, 0);
    }

    #[test]
    fn identical_files_deduplicate() {
        let tree = Tree::dir([
            ("x".to_string(), Tree::file(*b"hello")),
            ("y".to_string(), Tree::file(*b"hello")),
        ]);
        let blob = compile(&tree, CompileOptions::default()).unwrap();
        let hits: Vec<usize> = blob
            .windows(5)
            .enumerate()
            .filter(|(_, w)| *w == b"hello")
            .map(|(i, _)| i)
            .collect();
        assert_eq!(hits.len(), 1, "payload must be written exactly once");
    }

    #[test]
    fn compressible_file_gets_flagged() {
        let tree = Tree::dir([("z".to_string(), Tree::file(vec![b'A'; 1024]))]);
        let blob = compile(
            &tree,
            CompileOptions { compress: true },
        )
        .unwrap();
        let root = EntryHeader::from_bytes(&blob[0..ENTRY_SIZE]);
        let rec_start = root.ptr as usize;
        let child = EntryHeader::from_bytes(
            &blob[rec_start + PTR_SIZE..rec_start + PTR_SIZE + ENTRY_SIZE],
        );
        assert!(child.is_compressed());
        assert_eq!(child.size, 1024);
        assert!((child.ptr as usize) < blob.len());
    }

    #[test]
    fn incompressible_file_clears_flag() {
        // 16 random-ish bytes; zlib framing overhead keeps the compressed
        // form >= the original, so the raw form must be kept.
        let bytes: Vec<u8> = vec![
            0x4f, 0x1a, 0xe2, 0x07, 0x93, 0xcd, 0x5b, 0x88, 0x02, 0xfa, 0x61, 0x3e, 0x9d, 0x10,
            0xb7, 0x44,
        ];
        let tree = Tree::dir([("r".to_string(), Tree::file(bytes))]);
        let blob = compile(&tree, CompileOptions { compress: true }).unwrap();
        let root = EntryHeader::from_bytes(&blob[0..ENTRY_SIZE]);
        let rec_start = root.ptr as usize;
        let child = EntryHeader::from_bytes(
            &blob[rec_start + PTR_SIZE..rec_start + PTR_SIZE + ENTRY_SIZE],
        );
        assert_eq!(child.flags, 0);
    }

    #[test]
    fn rejects_nul_in_name() {
        let tree = Tree::dir([("ba\0d".to_string(), Tree::file(Vec::new()))]);
        let err = compile(&tree, CompileOptions::default()).unwrap_err();
        assert!(matches!(err, BlobError::InvalidName { .. }));
    }

    #[test]
    fn determinism() {
        let tree = Tree::dir([
            ("banana".to_string(), Tree::file(*b"1")),
            ("apple".to_string(), Tree::file(*b"2")),
            ("cherry".to_string(), Tree::file(*b"3")),
        ]);
        let a = compile(&tree, CompileOptions::default()).unwrap();
        let b = compile(&tree, CompileOptions::default()).unwrap();
        assert_eq!(a, b);
    }
}
