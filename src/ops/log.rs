use std::collections::HashSet;

use crate::error::{Error, Result};
use crate::hash::Hash;
use crate::object::read_object;
use crate::refs::head_commit;
use crate::repo::Repo;
use crate::types::Commit;

/// commit with its hash for log output
#[derive(Debug, Clone)]
pub struct LogEntry {
    pub hash: Hash,
    pub commit: Commit,
}

/// history reachable from HEAD, newest first; empty before the first commit
pub fn log(repo: &Repo, max_count: Option<usize>) -> Result<Vec<LogEntry>> {
    match head_commit(repo)? {
        Some(hash) => log_from(repo, &hash, max_count),
        None => Ok(Vec::new()),
    }
}

/// follow the parent chain starting at `start`
pub fn log_from(repo: &Repo, start: &Hash, max_count: Option<usize>) -> Result<Vec<LogEntry>> {
    let mut entries = Vec::new();
    let mut visited = HashSet::new();
    let mut next = Some(*start);

    while let Some(hash) = next {
        if max_count.is_some_and(|max| entries.len() >= max) {
            break;
        }
        if !visited.insert(hash) {
            // a commit can't reach itself unless the store was tampered with
            return Err(Error::CorruptObject(hash));
        }

        let commit: Commit = read_object(repo, &hash)?;
        next = commit.parent;
        entries.push(LogEntry { hash, commit });
    }

    Ok(entries)
}

impl std::fmt::Display for LogEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "commit {}", self.hash)?;
        writeln!(f, "tree   {}", self.commit.tree)?;
        if let Some(parent) = &self.commit.parent {
            writeln!(f, "parent {}", parent)?;
        }

        writeln!(f)?;
        for line in self.commit.message.lines() {
            writeln!(f, "    {}", line)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops::add::add;
    use crate::ops::commit::commit;
    use std::fs;
    use tempfile::tempdir;

    fn test_repo() -> (tempfile::TempDir, Repo) {
        let dir = tempdir().unwrap();
        let repo = Repo::init(dir.path()).unwrap();
        (dir, repo)
    }

    fn commit_version(dir: &std::path::Path, repo: &Repo, i: usize) -> Hash {
        fs::write(dir.join("file.txt"), format!("v{}", i)).unwrap();
        add(repo, &["file.txt"]).unwrap();
        commit(repo, &format!("commit {}", i)).unwrap()
    }

    #[test]
    fn test_log_empty_repo() {
        let (_dir, repo) = test_repo();
        assert!(log(&repo, None).unwrap().is_empty());
    }

    #[test]
    fn test_log_newest_first() {
        let (dir, repo) = test_repo();
        let hashes: Vec<_> = (0..3).map(|i| commit_version(dir.path(), &repo, i)).collect();

        let entries = log(&repo, None).unwrap();

        assert_eq!(entries.len(), 3);
        let logged: Vec<_> = entries.iter().map(|e| e.hash).collect();
        assert_eq!(logged, hashes.into_iter().rev().collect::<Vec<_>>());
        assert_eq!(entries[0].commit.message, "commit 2");
        assert!(entries[2].commit.is_root());
    }

    #[test]
    fn test_log_max_count() {
        let (dir, repo) = test_repo();
        for i in 0..5 {
            commit_version(dir.path(), &repo, i);
        }

        assert_eq!(log(&repo, Some(2)).unwrap().len(), 2);
        assert!(log(&repo, Some(0)).unwrap().is_empty());
    }

    #[test]
    fn test_log_from_older_commit() {
        let (dir, repo) = test_repo();
        let first = commit_version(dir.path(), &repo, 0);
        commit_version(dir.path(), &repo, 1);

        let entries = log_from(&repo, &first, None).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].hash, first);
    }

    #[test]
    fn test_log_entry_display() {
        let (dir, repo) = test_repo();
        commit_version(dir.path(), &repo, 0);
        let second = commit_version(dir.path(), &repo, 1);

        let entries = log(&repo, Some(1)).unwrap();
        let display = format!("{}", entries[0]);

        assert!(display.starts_with(&format!("commit {}", second)));
        assert!(display.contains("parent "));
        assert!(display.contains("    commit 1"));
    }
}
