// src/root_fs.rs

//! The served directory tree.
//!
//! Opened once at startup and shared read-only by every request. All access
//! goes through relative paths produced by [`crate::url::resolve`].

use std::{
    io,
    path::{Path, PathBuf},
    time::SystemTime,
};

use log::warn;
use walkdir::WalkDir;

use crate::{directory_browser::EntryMetadata, error::ConfigError, url::ROOT_RELATIVE};

#[derive(Debug, Clone)]
pub struct RootFs {
    root: PathBuf,
}

impl RootFs {
    pub fn open(path: &Path) -> Result<Self, ConfigError> {
        let root = path.canonicalize().map_err(|source| ConfigError::RootPath {
            path: path.display().to_string(),
            source,
        })?;
        if !root.is_dir() {
            return Err(ConfigError::RootNotDirectory(root.display().to_string()));
        }
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Absolute location of a resolver-produced relative path.
    pub fn locate(&self, relative: &str) -> PathBuf {
        if relative.is_empty() || relative == ROOT_RELATIVE {
            self.root.clone()
        } else {
            self.root.join(relative)
        }
    }

    /// Immediate children of a directory, in the order the OS returns them.
    pub fn read_dir(&self, relative: &str) -> io::Result<Vec<FsEntry>> {
        let mut entries = Vec::new();
        for entry in WalkDir::new(self.locate(relative))
            .min_depth(1)
            .max_depth(1)
            .follow_links(true)
        {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) if e.depth() == 0 => return Err(io::Error::from(e)),
                Err(e) => {
                    warn!("Skipping unreadable entry in <{}>: {}", relative, e);
                    continue;
                }
            };
            let metadata = match entry.metadata() {
                Ok(metadata) => metadata,
                Err(e) => {
                    warn!("Skipping entry without metadata in <{}>: {}", relative, e);
                    continue;
                }
            };
            entries.push(FsEntry {
                name: entry.file_name().to_string_lossy().into_owned(),
                is_dir: metadata.is_dir(),
                size: metadata.len(),
                modified: metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH),
            });
        }
        Ok(entries)
    }
}

/// A directory entry as seen on disk.
#[derive(Debug, Clone)]
pub struct FsEntry {
    name: String,
    is_dir: bool,
    size: u64,
    modified: SystemTime,
}

impl EntryMetadata for FsEntry {
    fn name(&self) -> &str {
        &self.name
    }

    fn size(&self) -> u64 {
        self.size
    }

    fn is_dir(&self) -> bool {
        self.is_dir
    }

    fn modified(&self) -> SystemTime {
        self.modified
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn open_rejects_missing_and_file_roots() {
        let dir = tempfile::tempdir().unwrap();
        assert!(RootFs::open(&dir.path().join("missing")).is_err());

        let file = dir.path().join("file.txt");
        fs::write(&file, b"x").unwrap();
        assert!(matches!(
            RootFs::open(&file),
            Err(ConfigError::RootNotDirectory(_))
        ));
    }

    #[test]
    fn read_dir_is_not_recursive() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("sub/deeper")).unwrap();
        fs::write(dir.path().join("a.txt"), b"hello").unwrap();
        fs::write(dir.path().join("sub/b.txt"), b"nested").unwrap();

        let root = RootFs::open(dir.path()).unwrap();
        let mut names: Vec<String> = root
            .read_dir(".")
            .unwrap()
            .iter()
            .map(|e| e.name().to_string())
            .collect();
        names.sort();
        assert_eq!(names, vec!["a.txt", "sub"]);

        let nested = root.read_dir("sub").unwrap();
        assert_eq!(nested.len(), 2);
        let file = nested.iter().find(|e| e.name() == "b.txt").unwrap();
        assert_eq!(file.size(), 6);
        assert!(!file.is_dir());
    }

    #[test]
    fn locate_root_marker() {
        let dir = tempfile::tempdir().unwrap();
        let root = RootFs::open(dir.path()).unwrap();
        assert_eq!(root.locate("."), root.root());
        assert_eq!(root.locate("a/b"), root.root().join("a/b"));
    }
}
