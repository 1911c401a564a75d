//! Materializes a [`Tree`] from a real filesystem path.
//!
//! Out of the core's scope (spec §1): this module is a collaborator that
//! drives the public [`compile`](crate::compile) entry point. Iteration
//! order at scan time is irrelevant because the compiler re-sorts by name.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::error::CliError;
use crate::tree::Tree;

/// Recursively scan `path` into a [`Tree`].
///
/// Regular files become [`Tree::File`]; directories become [`Tree::Dir`].
/// Symlinks, sockets, FIFOs and other non-regular, non-directory entries
/// fail with [`CliError::UnsupportedFileType`]. Empty directories are
/// permitted.
pub fn compile_path(path: &Path) -> Result<Tree, CliError> {
    log::debug!("scanning {}", path.display());
    let metadata = fs::symlink_metadata(path)?;
    build(path, &metadata)
}

fn build(path: &Path, metadata: &fs::Metadata) -> Result<Tree, CliError> {
    let file_type = metadata.file_type();

    if file_type.is_dir() {
        let mut children = BTreeMap::new();
        for entry in fs::read_dir(path)? {
            let entry = entry?;
            log::debug!("found {}", entry.path().display());
            let name = entry.file_name().into_string().map_err(|_| {
                CliError::UnsupportedFileType {
                    path: entry.path().display().to_string(),
                    kind: "non-UTF-8 file name".to_string(),
                }
            })?;
            let child_metadata = entry.metadata()?;
            let child = build(&entry.path(), &child_metadata)?;
            children.insert(name, child);
        }
        Ok(Tree::Dir(children))
    } else if file_type.is_file() {
        Ok(Tree::File(fs::read(path)?))
    } else {
        Err(CliError::UnsupportedFileType {
            path: path.display().to_string(),
            kind: format!("{file_type:?}"),
        })
    }
}
