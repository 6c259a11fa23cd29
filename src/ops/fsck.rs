use std::collections::HashSet;
use std::path::Path;

use log::{debug, warn};
use walkdir::WalkDir;

use crate::error::{Error, Result};
use crate::hash::Hash;
use crate::object::{object_exists, read_any, read_object};
use crate::refs::{list_branches, read_branch, read_head, Head};
use crate::repo::Repo;
use crate::types::{Commit, EntryKind, ObjectKind, Tree};

/// fsck report
#[derive(Debug, Default)]
pub struct FsckReport {
    /// objects checked
    pub objects_checked: usize,
    /// objects that fail to decode or whose content doesn't match the file name
    pub corrupt_objects: Vec<CorruptObject>,
    /// missing objects referenced by other objects
    pub missing_objects: Vec<MissingObject>,
    /// objects not reachable from any branch or HEAD
    pub dangling_objects: Vec<Hash>,
}

impl FsckReport {
    pub fn is_ok(&self) -> bool {
        self.corrupt_objects.is_empty() && self.missing_objects.is_empty()
    }
}

#[derive(Debug)]
pub struct CorruptObject {
    pub hash: Hash,
    pub message: String,
}

#[derive(Debug)]
pub struct MissingObject {
    pub hash: Hash,
    pub kind: ObjectKind,
    pub referenced_by: String,
}

#[derive(Default)]
struct Reachable {
    commits: HashSet<Hash>,
    trees: HashSet<Hash>,
    blobs: HashSet<Hash>,
}

impl Reachable {
    fn contains(&self, hash: &Hash) -> bool {
        self.commits.contains(hash) || self.trees.contains(hash) || self.blobs.contains(hash)
    }
}

/// verify repository integrity
///
/// every stored object is decoded and rehashed, then the history reachable
/// from branches and HEAD is walked looking for missing objects.
pub fn fsck(repo: &Repo) -> Result<FsckReport> {
    let mut report = FsckReport::default();

    let all = list_objects(&repo.objects_path())?;
    for hash in &all {
        report.objects_checked += 1;
        match read_any(repo, hash) {
            Ok(_) => {}
            Err(e) if is_corruption(&e) => {
                warn!("corrupt object {}: {}", hash.short(), e);
                report.corrupt_objects.push(CorruptObject {
                    hash: *hash,
                    message: e.to_string(),
                });
            }
            Err(e) => return Err(e),
        }
    }

    let mut reachable = Reachable::default();
    for branch in list_branches(repo)? {
        let hash = read_branch(repo, &branch)?;
        check_commit(repo, &hash, &format!("branch {}", branch), &mut reachable, &mut report)?;
    }
    if let Head::Detached(hash) = read_head(repo)? {
        check_commit(repo, &hash, "HEAD", &mut reachable, &mut report)?;
    }

    report.dangling_objects = all.into_iter().filter(|h| !reachable.contains(h)).collect();

    debug!(
        "fsck: {} objects, {} corrupt, {} missing, {} dangling",
        report.objects_checked,
        report.corrupt_objects.len(),
        report.missing_objects.len(),
        report.dangling_objects.len()
    );
    Ok(report)
}

fn check_commit(
    repo: &Repo,
    commit_hash: &Hash,
    referenced_by: &str,
    reachable: &mut Reachable,
    report: &mut FsckReport,
) -> Result<()> {
    let mut next = Some((*commit_hash, referenced_by.to_string()));

    while let Some((hash, referenced_by)) = next.take() {
        if !reachable.commits.insert(hash) {
            break;
        }

        let commit: Commit = match load(repo, &hash, ObjectKind::Commit, &referenced_by, report)? {
            Some(commit) => commit,
            None => break,
        };

        let by = format!("commit {}", hash);
        check_tree(repo, &commit.tree, &by, reachable, report)?;
        next = commit.parent.map(|parent| (parent, by));
    }

    Ok(())
}

fn check_tree(
    repo: &Repo,
    tree_hash: &Hash,
    referenced_by: &str,
    reachable: &mut Reachable,
    report: &mut FsckReport,
) -> Result<()> {
    if !reachable.trees.insert(*tree_hash) {
        return Ok(());
    }

    let tree: Tree = match load(repo, tree_hash, ObjectKind::Tree, referenced_by, report)? {
        Some(tree) => tree,
        None => return Ok(()),
    };

    for (data, hash) in tree.children() {
        // tombstones record a deletion, their hash need not be stored
        if data.is_removed() {
            continue;
        }

        let by = format!("tree {} entry {}", tree_hash, data.path());
        match data.object_type() {
            EntryKind::Blob => {
                reachable.blobs.insert(*hash);
                if !object_exists(repo, hash) {
                    report.missing_objects.push(MissingObject {
                        hash: *hash,
                        kind: ObjectKind::Blob,
                        referenced_by: by,
                    });
                }
            }
            EntryKind::Tree => check_tree(repo, hash, &by, reachable, report)?,
        }
    }

    Ok(())
}

/// read an object, recording it as missing; corruption was already reported
/// by the scan
fn load<T: crate::types::Object>(
    repo: &Repo,
    hash: &Hash,
    kind: ObjectKind,
    referenced_by: &str,
    report: &mut FsckReport,
) -> Result<Option<T>> {
    match read_object(repo, hash) {
        Ok(object) => Ok(Some(object)),
        Err(Error::ObjectNotFound(_)) => {
            report.missing_objects.push(MissingObject {
                hash: *hash,
                kind,
                referenced_by: referenced_by.to_string(),
            });
            Ok(None)
        }
        Err(e @ Error::UnexpectedObjectKind { .. }) => {
            report.corrupt_objects.push(CorruptObject {
                hash: *hash,
                message: format!("referenced by {}: {}", referenced_by, e),
            });
            Ok(None)
        }
        Err(e) if is_corruption(&e) => Ok(None),
        Err(e) => Err(e),
    }
}

fn is_corruption(e: &Error) -> bool {
    matches!(
        e,
        Error::CorruptObject(_)
            | Error::CborDecode(_)
            | Error::UnsupportedVersion(_)
            | Error::UnexpectedObjectKind { .. }
    )
}

fn list_objects(dir: &Path) -> Result<Vec<Hash>> {
    let mut hashes = Vec::new();

    if !dir.exists() {
        return Ok(hashes);
    }

    for entry in WalkDir::new(dir).min_depth(2).max_depth(2).sort_by_file_name() {
        let entry = entry.map_err(|e| Error::Io {
            path: dir.to_path_buf(),
            source: e
                .into_io_error()
                .unwrap_or_else(|| std::io::Error::other("walkdir error")),
        })?;

        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        let file_name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
        let parent_name = path
            .parent()
            .and_then(|p| p.file_name())
            .and_then(|n| n.to_str())
            .unwrap_or("");

        let hex = format!("{}{}", parent_name, file_name);
        match Hash::from_hex(&hex) {
            Ok(hash) => hashes.push(hash),
            Err(_) => warn!("stray file in object store: {}", path.display()),
        }
    }

    Ok(hashes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::{object_path, write_object};
    use crate::ops::add::add;
    use crate::ops::commit::commit;
    use crate::types::{Blob, Object};
    use std::fs;
    use tempfile::tempdir;

    fn committed_repo() -> (tempfile::TempDir, Repo) {
        let dir = tempdir().unwrap();
        let repo = Repo::init(dir.path()).unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        fs::write(dir.path().join("sub/file.txt"), "content").unwrap();
        add(&repo, &["sub"]).unwrap();
        commit(&repo, "first").unwrap();
        (dir, repo)
    }

    #[test]
    fn test_fsck_healthy_repo() {
        let (_dir, repo) = committed_repo();

        let report = fsck(&repo).unwrap();

        assert!(report.is_ok());
        // blob, sub tree, root tree, commit
        assert_eq!(report.objects_checked, 4);
        assert!(report.dangling_objects.is_empty());
    }

    #[test]
    fn test_fsck_with_dangling() {
        let (_dir, repo) = committed_repo();
        let loose = write_object(&repo, &Blob::new("unreferenced")).unwrap();

        let report = fsck(&repo).unwrap();

        assert!(report.is_ok());
        assert_eq!(report.dangling_objects, vec![loose]);
    }

    #[test]
    fn test_fsck_missing_blob() {
        let (_dir, repo) = committed_repo();
        let blob = Blob::new("content").hash();
        fs::remove_file(object_path(&repo, &blob)).unwrap();

        let report = fsck(&repo).unwrap();

        assert!(!report.is_ok());
        assert_eq!(report.missing_objects.len(), 1);
        assert_eq!(report.missing_objects[0].hash, blob);
        assert_eq!(report.missing_objects[0].kind, ObjectKind::Blob);
        assert!(report.missing_objects[0].referenced_by.contains("sub/file.txt"));
    }

    #[test]
    fn test_fsck_corrupt_blob() {
        let (_dir, repo) = committed_repo();
        let blob = Blob::new("content").hash();
        let other = Blob::new("tampered").encode().unwrap();
        fs::write(object_path(&repo, &blob), other).unwrap();

        let report = fsck(&repo).unwrap();

        assert!(!report.is_ok());
        assert_eq!(report.corrupt_objects.len(), 1);
        assert_eq!(report.corrupt_objects[0].hash, blob);
        assert!(report.missing_objects.is_empty());
    }

    #[test]
    fn test_fsck_garbage_object() {
        let (_dir, repo) = committed_repo();
        let blob = Blob::new("content").hash();
        fs::write(object_path(&repo, &blob), b"not cbor at all").unwrap();

        let report = fsck(&repo).unwrap();
        assert_eq!(report.corrupt_objects.len(), 1);
    }
}
