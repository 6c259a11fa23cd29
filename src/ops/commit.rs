use log::{debug, info};

use crate::error::{Error, Result};
use crate::fs::read_file;
use crate::hash::Hash;
use crate::index::Index;
use crate::materialize::{walk, ObjectSink};
use crate::object::{read_object, write_object, StoreSink};
use crate::ops::flat::{assemble, flatten, flatten_stored, remove_subtree, FlatTree};
use crate::refs::{head_commit, update_head};
use crate::repo::Repo;
use crate::types::{Blob, Commit, EntryKind, TreeObjectData, SEPARATOR};

/// commit the staged entries on top of HEAD
///
/// staged files and directories are read from the working tree and stored;
/// tombstones drop their path. the resulting root tree becomes a new commit
/// whose parent is HEAD (if any), HEAD moves to it and the index is cleared.
pub fn commit(repo: &Repo, message: &str) -> Result<Hash> {
    let _lock = repo.lock()?;

    let mut index = Index::load(repo)?;
    if index.is_empty() {
        return Err(Error::NothingToCommit);
    }

    let parent = match head_commit(repo)? {
        Some(hash) => Some(read_object::<Commit>(repo, &hash)?),
        None => None,
    };
    let mut files = match &parent {
        Some(parent) => flatten_stored(repo, &parent.tree)?,
        None => FlatTree::new(),
    };

    let mut sink = StoreSink::new(repo);
    for data in index.staged() {
        apply_staged(repo, data, &mut files, &mut sink)?;
    }

    let root = assemble(&files, &mut sink)?;
    sink.put_tree(&root)?;

    let commit = match &parent {
        Some(parent) => parent.derive_commit(&root, message),
        None => Commit::new(&root, message),
    };
    let hash = write_object(repo, &commit)?;
    let branch = update_head(repo, &hash)?;

    index.clear();
    index.save(repo)?;

    info!(
        "committed {} on {} ({} objects)",
        hash.short(),
        branch.as_deref().unwrap_or("detached HEAD"),
        sink.received()
    );
    Ok(hash)
}

/// apply one staged entry to the flattened tree
fn apply_staged(
    repo: &Repo,
    data: &TreeObjectData,
    files: &mut FlatTree,
    sink: &mut StoreSink<'_>,
) -> Result<()> {
    let path = data.path();
    debug!("applying {}", data);

    match (data.object_type(), data.is_removed()) {
        (EntryKind::Blob, false) => {
            let blob = Blob::new(read_file(&repo.root().join(path))?);
            let hash = sink.put_blob(&blob)?;
            // a directory may have been replaced by a file, or a file by a directory
            remove_subtree(files, &format!("{}{}", path, SEPARATOR));
            remove_file_ancestors(files, path);
            files.insert(path.to_string(), hash);
        }

        (EntryKind::Blob, true) => {
            files.remove(path);
        }

        (EntryKind::Tree, false) => {
            files.remove(path.trim_end_matches(SEPARATOR));
            remove_subtree(files, path);
            remove_file_ancestors(files, path);

            let options = repo.walk_options()?;
            let subtree = walk(&repo.root().join(path), path, &options, sink)?;
            let hash = sink.put_tree(&subtree)?;

            files.insert(path.to_string(), hash);
            files.extend(flatten(&subtree, &mut |hash| read_object(repo, hash))?);
        }

        (EntryKind::Tree, true) => {
            remove_subtree(files, path);
        }
    }

    Ok(())
}

/// drop files sitting where a parent directory of `path` now is
fn remove_file_ancestors(files: &mut FlatTree, path: &str) {
    let path = path.trim_end_matches(SEPARATOR);
    for (i, _) in path.match_indices(SEPARATOR) {
        files.remove(&path[..i]);
    }
}
