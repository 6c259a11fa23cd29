use crate::error::Result;
use crate::index::Index;
use crate::materialize::walk;
use crate::object::read_object;
use crate::ops::flat::{flatten, flatten_stored, FlatTree, MemorySink};
use crate::refs::head_commit;
use crate::repo::Repo;
use crate::types::{Commit, TreeObjectData, SEPARATOR};

/// working tree compared with HEAD, plus the staging area
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Status {
    /// paths present in the working tree but not in HEAD
    pub new: Vec<String>,
    /// paths in HEAD that are gone from the working tree
    pub removed: Vec<String>,
    /// files whose content differs from HEAD
    pub modified: Vec<String>,
    /// entries staged for the next commit
    pub staged: Vec<TreeObjectData>,
}

impl Status {
    /// no differences from HEAD and nothing staged
    pub fn is_clean(&self) -> bool {
        self.new.is_empty()
            && self.removed.is_empty()
            && self.modified.is_empty()
            && self.staged.is_empty()
    }

    /// every changed path, in the form `add` expects
    pub fn changed_paths(&self) -> impl Iterator<Item = &str> {
        self.new
            .iter()
            .chain(&self.removed)
            .chain(&self.modified)
            .map(String::as_str)
    }
}

/// compare the working tree with HEAD
///
/// new and removed directories are reported once, without their contents.
pub fn status(repo: &Repo) -> Result<Status> {
    let head = head_flat(repo)?;
    let work = working_flat(repo)?;
    let index = Index::load(repo)?;

    let new: Vec<_> = work.keys().filter(|p| !head.contains_key(*p)).cloned().collect();
    let removed: Vec<_> = head.keys().filter(|p| !work.contains_key(*p)).cloned().collect();
    let modified = work
        .iter()
        .filter(|(path, _)| !path.ends_with(SEPARATOR))
        .filter(|(path, hash)| head.get(*path).is_some_and(|h| h != *hash))
        .map(|(path, _)| path.clone())
        .collect();

    Ok(Status {
        new: collapse(new),
        removed: collapse(removed),
        modified,
        staged: index.staged().cloned().collect(),
    })
}

/// flattened tree of the commit HEAD points at, empty before the first commit
pub fn head_flat(repo: &Repo) -> Result<FlatTree> {
    match head_commit(repo)? {
        Some(hash) => {
            let commit: Commit = read_object(repo, &hash)?;
            flatten_stored(repo, &commit.tree)
        }
        None => Ok(FlatTree::new()),
    }
}

/// flattened snapshot of the working tree; nothing is stored
pub fn working_flat(repo: &Repo) -> Result<FlatTree> {
    let mut sink = MemorySink::default();
    let root = walk(repo.root(), "", &repo.walk_options()?, &mut sink)?;
    flatten(&root, &mut |hash| sink.load(hash))
}

/// drop paths whose parent directory is already listed
fn collapse(paths: Vec<String>) -> Vec<String> {
    let mut kept: Vec<String> = Vec::new();
    for path in paths {
        // sorted input: a listed directory comes right before its contents
        if kept
            .iter()
            .rev()
            .find(|dir| dir.ends_with(SEPARATOR))
            .is_some_and(|dir| path.starts_with(dir.as_str()))
        {
            continue;
        }
        kept.push(path);
    }
    kept
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops::{add, commit};
    use std::fs;
    use tempfile::tempdir;

    fn test_repo() -> (tempfile::TempDir, Repo) {
        let dir = tempdir().unwrap();
        let repo = Repo::init(dir.path()).unwrap();
        (dir, repo)
    }

    #[test]
    fn test_status_fresh_repo() {
        let (dir, repo) = test_repo();
        fs::write(dir.path().join("a.txt"), "a").unwrap();

        let st = status(&repo).unwrap();
        assert_eq!(st.new, vec!["a.txt"]);
        assert!(st.removed.is_empty());
        assert!(st.modified.is_empty());
        assert!(!st.is_clean());
    }

    #[test]
    fn test_status_ignores_metadata_dir() {
        let (_dir, repo) = test_repo();
        assert!(status(&repo).unwrap().is_clean());
    }

    #[test]
    fn test_status_collapses_new_directory() {
        let (dir, repo) = test_repo();
        fs::create_dir_all(dir.path().join("sub/deeper")).unwrap();
        fs::write(dir.path().join("sub/deeper/x"), "x").unwrap();
        fs::write(dir.path().join("subway"), "s").unwrap();

        let st = status(&repo).unwrap();
        assert_eq!(st.new, vec!["sub/", "subway"]);
    }

    #[test]
    fn test_status_after_commit() {
        let (dir, repo) = test_repo();
        fs::write(dir.path().join("keep"), "1").unwrap();
        fs::write(dir.path().join("change"), "1").unwrap();
        fs::write(dir.path().join("drop"), "1").unwrap();

        add::add_all(&repo).unwrap();
        commit::commit(&repo, "first").unwrap();
        assert!(status(&repo).unwrap().is_clean());

        fs::write(dir.path().join("change"), "2").unwrap();
        fs::remove_file(dir.path().join("drop")).unwrap();
        fs::write(dir.path().join("fresh"), "1").unwrap();

        let st = status(&repo).unwrap();
        assert_eq!(st.new, vec!["fresh"]);
        assert_eq!(st.removed, vec!["drop"]);
        assert_eq!(st.modified, vec!["change"]);
        assert!(st.staged.is_empty());
        assert_eq!(st.changed_paths().count(), 3);
    }

    #[test]
    fn test_status_lists_staged() {
        let (dir, repo) = test_repo();
        fs::write(dir.path().join("a.txt"), "a").unwrap();

        add::add(&repo, &["a.txt"]).unwrap();

        let st = status(&repo).unwrap();
        assert_eq!(st.staged, vec![TreeObjectData::blob("a.txt")]);
    }
}
