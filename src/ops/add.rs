use std::path::{Component, Path};

use log::{info, warn};

use crate::error::{Error, Result};
use crate::index::Index;
use crate::materialize::WalkOptions;
use crate::ops::flat::FlatTree;
use crate::ops::status::{head_flat, status};
use crate::repo::{Repo, REPO_DIR};
use crate::types::{EntryKind, TreeObjectData, SEPARATOR};

/// stage paths for the next commit
///
/// relative paths are taken from the working tree root, and the root itself
/// (`.`) stands for every path [`status`] reports. a path that no longer
/// exists is staged as a tombstone; it is staged as a directory when it ends
/// with a separator or was a directory in HEAD. paths matching an ignore
/// pattern are skipped.
pub fn add<P: AsRef<Path>>(repo: &Repo, paths: &[P]) -> Result<Vec<TreeObjectData>> {
    let _lock = repo.lock()?;
    let mut index = Index::load(repo)?;
    let head = head_flat(repo)?;
    let options = repo.walk_options()?;

    // (relative path, named with a trailing separator)
    let mut resolved: Vec<(String, bool)> = Vec::new();
    for path in paths {
        let path = path.as_ref();
        let rel = relative_path(repo, path)?;
        if rel.is_empty() {
            let st = status(repo)?;
            resolved.extend(st.changed_paths().map(|p| {
                (p.trim_end_matches(SEPARATOR).to_string(), p.ends_with(SEPARATOR))
            }));
        } else {
            resolved.push((rel, path.to_string_lossy().ends_with(SEPARATOR)));
        }
    }

    let mut staged = Vec::new();
    for (rel, trailing_sep) in resolved {
        if is_ignored(&options, &rel) {
            warn!("not staging ignored path {}", rel);
            continue;
        }
        let data = entry_for(repo, rel, trailing_sep, &head);
        if index.stage(data.clone()) {
            staged.push(data);
        }
    }

    index.save(repo)?;
    info!("staged {} entries", staged.len());
    Ok(staged)
}

/// stage every path reported by [`status`]
pub fn add_all(repo: &Repo) -> Result<Vec<TreeObjectData>> {
    add(repo, &["."])
}

/// true if the path or any of its parent directories matches an ignore pattern
fn is_ignored(options: &WalkOptions, rel: &str) -> bool {
    let mut end = 0;
    for name in rel.split(SEPARATOR) {
        end += name.len();
        if options.is_ignored(&rel[..end], name) {
            return true;
        }
        end += SEPARATOR.len_utf8();
    }
    false
}

/// descriptor for a working tree path, a tombstone if it is gone
fn entry_for(repo: &Repo, rel: String, trailing_sep: bool, head: &FlatTree) -> TreeObjectData {
    let full = repo.root().join(&rel);
    let exists = full.exists();

    let was_dir = head.contains_key(&format!("{}{}", rel, SEPARATOR));
    let kind = if full.is_dir() || (!exists && (trailing_sep || was_dir)) {
        EntryKind::Tree
    } else {
        EntryKind::Blob
    };

    match (kind, exists) {
        (EntryKind::Tree, true) => TreeObjectData::tree(rel),
        (EntryKind::Blob, true) => TreeObjectData::blob(rel),
        (kind, false) => TreeObjectData::removed(rel, kind),
    }
}

/// normalize a path to a `/`-separated path relative to the working tree root;
/// the root itself is the empty string
fn relative_path(repo: &Repo, path: &Path) -> Result<String> {
    let rel = if path.is_absolute() {
        path.strip_prefix(repo.root())
            .map_err(|_| Error::PathOutsideRepo(path.to_path_buf()))?
    } else {
        path
    };

    let mut parts: Vec<String> = Vec::new();
    for component in rel.components() {
        match component {
            Component::CurDir => {}
            Component::Normal(part) => match part.to_str() {
                Some(part) => parts.push(part.to_string()),
                None => return Err(Error::InvalidPath(path.to_path_buf())),
            },
            Component::ParentDir => {
                if parts.pop().is_none() {
                    return Err(Error::PathOutsideRepo(path.to_path_buf()));
                }
            }
            Component::RootDir | Component::Prefix(_) => {
                return Err(Error::PathOutsideRepo(path.to_path_buf()));
            }
        }
    }

    if parts.first().is_some_and(|first| first == REPO_DIR) {
        return Err(Error::PathOutsideRepo(path.to_path_buf()));
    }
    Ok(parts.join("/"))
}
