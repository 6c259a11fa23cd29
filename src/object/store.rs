use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use log::debug;

use crate::error::{not_found_or_io, Error, IoResultExt, Result};
use crate::hash::Hash;
use crate::materialize::ObjectSink;
use crate::repo::Repo;
use crate::types::{AnyObject, Blob, Object, Tree};

/// write an object to the store, keyed by its hash
///
/// the file holds the encoded object. if an object with this hash already
/// exists nothing is written.
pub fn write_object<T: Object>(repo: &Repo, object: &T) -> Result<Hash> {
    let hash = object.hash();

    let (dir, file) = hash.to_path_components();
    let object_dir = repo.objects_path().join(&dir);
    let object_path = object_dir.join(&file);

    // dedup: if object already exists, we're done
    if object_path.exists() {
        return Ok(hash);
    }

    let bytes = object.encode()?;

    fs::create_dir_all(&object_dir).with_path(&object_dir)?;

    // atomic write: temp -> fsync -> rename
    let tmp_path = repo.tmp_path().join(uuid::Uuid::new_v4().to_string());
    {
        let mut tmp_file = File::create(&tmp_path).with_path(&tmp_path)?;
        tmp_file.write_all(&bytes).with_path(&tmp_path)?;
        tmp_file.sync_all().with_path(&tmp_path)?;
    }

    fs::rename(&tmp_path, &object_path).with_path(&object_path)?;
    fsync_dir(&object_dir)?;

    debug!("wrote {} {} ({} bytes)", T::KIND, hash.short(), bytes.len());
    Ok(hash)
}

/// read and decode an object of a known kind
///
/// the decoded object is rehashed and must match `hash`.
pub fn read_object<T: Object>(repo: &Repo, hash: &Hash) -> Result<T> {
    let bytes = read_raw(repo, hash)?;
    let object = T::decode(&bytes)?;
    if object.hash() != *hash {
        return Err(Error::CorruptObject(*hash));
    }
    Ok(object)
}

/// read and decode an object of any kind
pub fn read_any(repo: &Repo, hash: &Hash) -> Result<AnyObject> {
    let bytes = read_raw(repo, hash)?;
    let object = AnyObject::decode(&bytes)?;
    if object.hash() != *hash {
        return Err(Error::CorruptObject(*hash));
    }
    Ok(object)
}

/// raw encoded bytes of an object
pub fn read_raw(repo: &Repo, hash: &Hash) -> Result<Vec<u8>> {
    let path = object_path(repo, hash);
    fs::read(&path).map_err(|e| not_found_or_io(e, path, Error::ObjectNotFound(*hash)))
}

/// get the filesystem path to an object
pub fn object_path(repo: &Repo, hash: &Hash) -> PathBuf {
    let (dir, file) = hash.to_path_components();
    repo.objects_path().join(dir).join(file)
}

/// check if an object exists in the store
pub fn object_exists(repo: &Repo, hash: &Hash) -> bool {
    object_path(repo, hash).exists()
}

/// fsync a directory
fn fsync_dir(path: &Path) -> Result<()> {
    let dir = File::open(path).with_path(path)?;
    dir.sync_all().with_path(path)?;
    Ok(())
}

/// sink that persists every object handed to it
pub struct StoreSink<'a> {
    repo: &'a Repo,
    received: usize,
}

impl<'a> StoreSink<'a> {
    pub fn new(repo: &'a Repo) -> Self {
        Self { repo, received: 0 }
    }

    /// number of objects received, including ones already stored
    pub fn received(&self) -> usize {
        self.received
    }
}

impl ObjectSink for StoreSink<'_> {
    fn put_blob(&mut self, blob: &Blob) -> Result<Hash> {
        self.received += 1;
        write_object(self.repo, blob)
    }

    fn put_tree(&mut self, tree: &Tree) -> Result<Hash> {
        self.received += 1;
        write_object(self.repo, tree)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Commit, ObjectKind, TreeObjectData};
    use tempfile::tempdir;

    fn test_repo() -> (tempfile::TempDir, Repo) {
        let dir = tempdir().unwrap();
        let repo = Repo::init(dir.path()).unwrap();
        (dir, repo)
    }

    #[test]
    fn test_write_and_read_blob() {
        let (_dir, repo) = test_repo();

        let blob = Blob::new("hello, world!");
        let hash = write_object(&repo, &blob).unwrap();
        assert_eq!(hash, blob.hash());
        assert!(object_exists(&repo, &hash));

        let read: Blob = read_object(&repo, &hash).unwrap();
        assert_eq!(read, blob);
    }

    #[test]
    fn test_write_and_read_tree_and_commit() {
        let (_dir, repo) = test_repo();

        let mut tree = Tree::new();
        tree.add_object(TreeObjectData::blob("a"), Blob::new("a").hash());
        let tree_hash = write_object(&repo, &tree).unwrap();

        let commit = Commit::new(&tree, "first");
        let commit_hash = write_object(&repo, &commit).unwrap();

        assert_eq!(read_object::<Tree>(&repo, &tree_hash).unwrap(), tree);
        assert_eq!(read_object::<Commit>(&repo, &commit_hash).unwrap(), commit);
        assert_eq!(read_any(&repo, &commit_hash).unwrap().kind(), ObjectKind::Commit);
    }

    #[test]
    fn test_deduplication() {
        let (_dir, repo) = test_repo();

        let h1 = write_object(&repo, &Blob::new("dup")).unwrap();
        let h2 = write_object(&repo, &Blob::new("dup")).unwrap();
        assert_eq!(h1, h2);
    }

    #[test]
    fn test_object_path_structure() {
        let (_dir, repo) = test_repo();

        let hash = write_object(&repo, &Blob::new("test")).unwrap();
        let path = object_path(&repo, &hash);

        // path should be objects/XX/YYYY...
        let hex = hash.to_hex();
        assert!(path.ends_with(format!("{}/{}", &hex[..2], &hex[2..])));
    }

    #[test]
    fn test_read_nonexistent() {
        let (_dir, repo) = test_repo();

        let result = read_object::<Blob>(&repo, &Hash::ZERO);
        assert!(matches!(result, Err(Error::ObjectNotFound(_))));
    }

    #[test]
    fn test_read_wrong_kind() {
        let (_dir, repo) = test_repo();

        let hash = write_object(&repo, &Blob::new("x")).unwrap();
        let result = read_object::<Tree>(&repo, &hash);
        assert!(matches!(result, Err(Error::UnexpectedObjectKind { .. })));
    }

    #[test]
    fn test_read_detects_corruption() {
        let (_dir, repo) = test_repo();

        let hash = write_object(&repo, &Blob::new("original")).unwrap();
        fs::write(object_path(&repo, &hash), Blob::new("tampered").encode().unwrap()).unwrap();

        let result = read_object::<Blob>(&repo, &hash);
        assert!(matches!(result, Err(Error::CorruptObject(h)) if h == hash));
    }

    #[test]
    fn test_store_sink() {
        let (_dir, repo) = test_repo();

        let mut sink = StoreSink::new(&repo);
        let blob_hash = sink.put_blob(&Blob::new("via sink")).unwrap();
        let tree_hash = sink.put_tree(&Tree::new()).unwrap();

        assert!(object_exists(&repo, &blob_hash));
        assert!(object_exists(&repo, &tree_hash));
        assert_eq!(sink.received(), 2);
    }
}
