//! turn a directory on disk into a tree of blobs and subtrees

use std::path::Path;

use log::{debug, warn};

use crate::error::{Error, Result};
use crate::fs::{list_dir, read_file, FileType};
use crate::hash::Hash;
use crate::types::{Blob, Object, Tree, TreeObjectData, SEPARATOR};

/// receives every object produced by a directory walk
pub trait ObjectSink {
    fn put_blob(&mut self, blob: &Blob) -> Result<Hash>;
    fn put_tree(&mut self, tree: &Tree) -> Result<Hash>;
}

/// sink that only hashes; nothing is kept
pub struct Discard;

impl ObjectSink for Discard {
    fn put_blob(&mut self, blob: &Blob) -> Result<Hash> {
        Ok(blob.hash())
    }

    fn put_tree(&mut self, tree: &Tree) -> Result<Hash> {
        Ok(tree.hash())
    }
}

/// entries to leave out of a walk
#[derive(Debug, Clone, Default)]
pub struct WalkOptions {
    ignore: Vec<glob::Pattern>,
}

impl WalkOptions {
    pub fn new(ignore: Vec<glob::Pattern>) -> Self {
        Self { ignore }
    }

    /// compile glob patterns
    pub fn from_patterns<S: AsRef<str>>(patterns: &[S]) -> Result<Self> {
        let ignore = patterns
            .iter()
            .map(|p| {
                glob::Pattern::new(p.as_ref()).map_err(|e| Error::InvalidPattern {
                    pattern: p.as_ref().to_string(),
                    message: e.to_string(),
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { ignore })
    }

    /// matched against the entry path (without trailing separator) and its name
    pub fn is_ignored(&self, path: &str, name: &str) -> bool {
        let path = path.trim_end_matches(SEPARATOR);
        self.ignore
            .iter()
            .any(|pattern| pattern.matches(path) || pattern.matches(name))
    }
}

/// build the tree for `dir`, naming entries `prefix<name>`
///
/// `prefix` is empty or ends with the separator. subdirectories recurse with
/// `prefix<name>/`. every blob and subtree is handed to `sink`; the returned
/// tree itself is not.
pub fn walk<S: ObjectSink + ?Sized>(
    dir: &Path,
    prefix: &str,
    options: &WalkOptions,
    sink: &mut S,
) -> Result<Tree> {
    let mut tree = Tree::new();

    for entry in list_dir(dir)? {
        let logical_path = format!("{}{}", prefix, entry.name);
        if options.is_ignored(&logical_path, &entry.name) {
            debug!("ignoring {}", logical_path);
            continue;
        }

        match entry.file_type {
            FileType::Directory => {
                let data = TreeObjectData::tree(logical_path);
                let subtree = walk(&entry.path, data.path(), options, sink)?;
                let hash = sink.put_tree(&subtree)?;
                tree.add_object(data, hash);
            }

            FileType::Regular => {
                let blob = Blob::new(read_file(&entry.path)?);
                let hash = sink.put_blob(&blob)?;
                debug!("{} {} ({} bytes)", hash.short(), logical_path, blob.len());
                tree.add_object(TreeObjectData::blob(logical_path), hash);
            }

            FileType::Special => {
                warn!("skipping special file {}", entry.path.display());
            }
        }
    }

    Ok(tree)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::fs;
    use tempfile::tempdir;

    /// keeps everything in memory
    #[derive(Default)]
    struct Collect {
        blobs: HashMap<Hash, Blob>,
        trees: HashMap<Hash, Tree>,
    }

    impl ObjectSink for Collect {
        fn put_blob(&mut self, blob: &Blob) -> Result<Hash> {
            let hash = blob.hash();
            self.blobs.insert(hash, blob.clone());
            Ok(hash)
        }

        fn put_tree(&mut self, tree: &Tree) -> Result<Hash> {
            let hash = tree.hash();
            self.trees.insert(hash, tree.clone());
            Ok(hash)
        }
    }

    #[test]
    fn test_walk_relative_prefix() {
        let dir = tempdir().unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        fs::write(dir.path().join("sub/inner.txt"), "inner").unwrap();
        fs::write(dir.path().join("top.txt"), "top").unwrap();

        let mut sink = Collect::default();
        let tree = walk(dir.path(), "", &WalkOptions::default(), &mut sink).unwrap();

        assert!(tree.get(&TreeObjectData::blob("top.txt")).is_some());
        let sub_hash = tree.get(&TreeObjectData::tree("sub/")).unwrap();
        let sub = &sink.trees[sub_hash];
        assert!(sub.get(&TreeObjectData::blob("sub/inner.txt")).is_some());

        assert_eq!(sink.blobs.len(), 2);
        assert_eq!(sink.trees.len(), 1);
    }

    #[test]
    fn test_walk_ignores_patterns() {
        let dir = tempdir().unwrap();
        fs::create_dir(dir.path().join(".cvs")).unwrap();
        fs::write(dir.path().join(".cvs/HEAD"), "x").unwrap();
        fs::write(dir.path().join("keep.rs"), "k").unwrap();
        fs::write(dir.path().join("drop.log"), "d").unwrap();

        let options = WalkOptions::from_patterns(&[".cvs", "*.log"]).unwrap();
        let tree = walk(dir.path(), "", &options, &mut Discard).unwrap();

        assert_eq!(tree.len(), 1);
        assert!(tree.find("keep.rs").is_some());
    }

    #[test]
    fn test_ignore_matches_nested_name() {
        let options = WalkOptions::from_patterns(&["target"]).unwrap();
        assert!(options.is_ignored("a/b/target/", "target"));
        assert!(!options.is_ignored("a/b/targets", "targets"));
    }

    #[test]
    fn test_invalid_pattern() {
        let result = WalkOptions::from_patterns(&["[unclosed"]);
        assert!(matches!(result, Err(Error::InvalidPattern { .. })));
    }

    #[test]
    fn test_walk_same_content_same_blob() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("one"), "same").unwrap();
        fs::write(dir.path().join("two"), "same").unwrap();

        let mut sink = Collect::default();
        let tree = walk(dir.path(), "", &WalkOptions::default(), &mut sink).unwrap();

        assert_eq!(tree.len(), 2);
        assert_eq!(sink.blobs.len(), 1);
    }
}
