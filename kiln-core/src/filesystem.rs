//! Filesystem collaborator: entry kinds and enumeration under a root.

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::error::Result;
use crate::method::EntryKind;

/// A filesystem entry seen by filters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub kind: EntryKind,
    pub path: PathBuf,
}

/// Read-only view of the filesystem consumed by the engine.
pub trait FileSystem: Send + Sync {
    /// Kind of the entry at `path`, or `None` if nothing (file or directory) is there.
    fn kind_of(&self, path: &Path) -> Option<EntryKind>;

    /// Every file and directory strictly below `root`, sorted by path string.
    fn entries(&self, root: &Path) -> Result<Vec<Entry>>;
}

/// The local disk.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFileSystem;

impl FileSystem for LocalFileSystem {
    fn kind_of(&self, path: &Path) -> Option<EntryKind> {
        let metadata = std::fs::metadata(path).ok()?;
        if metadata.is_dir() {
            Some(EntryKind::Directory)
        } else if metadata.is_file() {
            Some(EntryKind::File)
        } else {
            None
        }
    }

    fn entries(&self, root: &Path) -> Result<Vec<Entry>> {
        let mut entries = Vec::new();
        for entry in WalkDir::new(root).min_depth(1) {
            let entry = entry?;
            let file_type = entry.file_type();
            let kind = if file_type.is_dir() {
                EntryKind::Directory
            } else if file_type.is_file() {
                EntryKind::File
            } else {
                continue;
            };
            entries.push(Entry {
                kind,
                path: entry.into_path(),
            });
        }
        sort_entries(&mut entries);
        Ok(entries)
    }
}

/// Lexicographic, case-sensitive order on the full path string.
pub fn sort_entries(entries: &mut [Entry]) {
    entries.sort_by(|a, b| a.path.to_string_lossy().cmp(&b.path.to_string_lossy()));
}
