//! BlobFS packs a filesystem tree into a single self-contained binary blob
//! suitable for embedding into another artifact, plus a matching loader
//! that reconstitutes any file or directory on demand without unpacking.
//!
//! The core — [`format`], [`compiler`] and [`loader`] — is synchronous,
//! pure, and fully specified down to the byte: same input tree and same
//! `compress` setting always produce the same blob. Everything else
//! ([`fswalk`], [`watch`], [`encodings`], [`cli`]) is a collaborator that
//! drives the core from the outside.
//!
//! ```
//! use blobfs::{compile, load, CompileOptions, Tree};
//!
//! let tree = Tree::dir([
//!     ("hello.txt".to_string(), Tree::file(*b"hi")),
//! ]);
//! let blob = compile(&tree, CompileOptions::default()).unwrap();
//! let roundtripped = load(&blob).unwrap();
//! assert_eq!(roundtripped, tree);
//! ```

pub mod cli;
pub mod compiler;
pub mod encodings;
pub mod error;
pub mod format;
pub mod fswalk;
pub mod loader;
pub mod tree;
pub mod watch;

pub use compiler::{compile, CompileOptions};
pub use error::{BlobError, CliError, Result};
pub use loader::{load, load_with_options, BlobReader, LoaderOptions};
pub use tree::Tree;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_level_roundtrip() {
        let tree = Tree::dir([
            ("apple".to_string(), Tree::file(*b"2")),
            ("banana".to_string(), Tree::file(*b"1")),
            ("cherry".to_string(), Tree::file(*b"3")),
        ]);
        let blob = compile(&tree, CompileOptions::default()).unwrap();
        assert_eq!(load(&blob).unwrap(), tree);

        // Sorted-children invariant: names resolve in ascending order.
        let root = format::EntryHeader::from_bytes(&blob[0..format::ENTRY_SIZE]);
        let mut names = Vec::new();
        for i in 0..root.size {
            let rec = root.ptr as usize + i as usize * format::DIRENTRY_SIZE;
            let name_ptr = format::ptr_from_bytes(&blob[rec..rec + format::PTR_SIZE]);
            let start = name_ptr as usize;
            let end = blob[start..].iter().position(|&b| b == 0).unwrap() + start;
            names.push(std::str::from_utf8(&blob[start..end]).unwrap().to_string());
        }
        assert_eq!(names, vec!["apple", "banana", "cherry"]);
    }
}
