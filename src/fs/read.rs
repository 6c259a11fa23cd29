use std::fs::{self, Metadata};
use std::path::{Path, PathBuf};

use crate::error::{Error, IoResultExt, Result};

/// file type enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileType {
    Regular,
    Directory,
    /// fifo, socket, device
    Special,
}

impl FileType {
    /// detect file type from metadata
    pub fn from_metadata(meta: &Metadata) -> Self {
        let ft = meta.file_type();
        if ft.is_dir() {
            FileType::Directory
        } else if ft.is_file() {
            FileType::Regular
        } else {
            FileType::Special
        }
    }
}

/// one immediate child of a directory
#[derive(Debug, Clone)]
pub struct DirEntry {
    pub name: String,
    pub path: PathBuf,
    pub file_type: FileType,
}

/// list the immediate children of a directory, sorted by name
///
/// symlinks are followed, so a link to a directory is listed as a directory.
/// a name that is not valid UTF-8 fails the whole listing.
pub fn list_dir(dir: &Path) -> Result<Vec<DirEntry>> {
    let mut entries = Vec::new();

    for entry in fs::read_dir(dir).with_path(dir)? {
        let entry = entry.with_path(dir)?;
        let path = entry.path();
        let name = entry
            .file_name()
            .into_string()
            .map_err(|_| Error::InvalidPath(path.clone()))?;
        let meta = fs::metadata(&path).with_path(&path)?;

        entries.push(DirEntry {
            name,
            file_type: FileType::from_metadata(&meta),
            path,
        });
    }

    entries.sort_by(|a, b| a.name.as_bytes().cmp(b.name.as_bytes()));
    Ok(entries)
}

/// read a whole file into memory
pub fn read_file(path: &Path) -> Result<Vec<u8>> {
    fs::read(path).with_path(path)
}
