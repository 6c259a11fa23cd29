use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use log::debug;

use crate::error::{not_found_or_io, Error, IoResultExt, Result};
use crate::hash::{Hash, HASH_LEN};
use crate::repo::Repo;

const HEAD: &str = "HEAD";
const SYMREF_PREFIX: &str = "ref: ";

/// what HEAD points at
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Head {
    /// a branch, which may not have any commit yet
    Branch(String),
    /// a commit, with no branch attached
    Detached(Hash),
}

/// read HEAD
pub fn read_head(repo: &Repo) -> Result<Head> {
    let path = repo.head_path();
    let content = fs::read_to_string(&path)
        .map_err(|e| not_found_or_io(e, path, Error::RefNotFound(HEAD.to_string())))?;
    let content = content.trim();

    match content.strip_prefix(SYMREF_PREFIX) {
        Some(branch) => Ok(Head::Branch(branch.to_string())),
        None => Ok(Head::Detached(Hash::from_hex(content)?)),
    }
}

/// write HEAD
pub fn write_head(repo: &Repo, head: &Head) -> Result<()> {
    let content = match head {
        Head::Branch(name) => {
            validate_ref_name(name)?;
            format!("{}{}", SYMREF_PREFIX, name)
        }
        Head::Detached(hash) => hash.to_hex(),
    };
    write_atomic(repo, &repo.head_path(), &content)
}

/// write a branch (create or update)
pub fn write_branch(repo: &Repo, name: &str, hash: &Hash) -> Result<()> {
    validate_ref_name(name)?;

    let path = branch_path(repo, name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).with_path(parent)?;
    }
    write_atomic(repo, &path, &hash.to_hex())
}

/// read a branch
pub fn read_branch(repo: &Repo, name: &str) -> Result<Hash> {
    let path = branch_path(repo, name);
    let content = fs::read_to_string(&path)
        .map_err(|e| not_found_or_io(e, path, Error::RefNotFound(name.to_string())))?;
    Hash::from_hex(content.trim())
}

/// check if a branch exists
pub fn branch_exists(repo: &Repo, name: &str) -> bool {
    branch_path(repo, name).is_file()
}

/// list all branches, sorted
pub fn list_branches(repo: &Repo) -> Result<Vec<String>> {
    let refs_dir = repo.refs_path();
    let mut refs = Vec::new();

    if refs_dir.exists() {
        collect_refs(&refs_dir, &refs_dir, &mut refs)?;
    }

    refs.sort();
    Ok(refs)
}

/// commit HEAD resolves to, or None on a branch without commits
pub fn head_commit(repo: &Repo) -> Result<Option<Hash>> {
    match read_head(repo)? {
        Head::Detached(hash) => Ok(Some(hash)),
        Head::Branch(name) => match read_branch(repo, &name) {
            Ok(hash) => Ok(Some(hash)),
            Err(Error::RefNotFound(_)) => Ok(None),
            Err(e) => Err(e),
        },
    }
}

/// point HEAD at a new commit
///
/// on a branch the branch moves and HEAD keeps naming it. when detached,
/// HEAD itself is rewritten. returns the branch that moved, if any.
pub fn update_head(repo: &Repo, hash: &Hash) -> Result<Option<String>> {
    match read_head(repo)? {
        Head::Branch(name) => {
            write_branch(repo, &name, hash)?;
            debug!("moved branch {} to {}", name, hash.short());
            Ok(Some(name))
        }
        Head::Detached(_) => {
            write_head(repo, &Head::Detached(*hash))?;
            debug!("moved detached HEAD to {}", hash.short());
            Ok(None)
        }
    }
}

/// resolve a hash, `HEAD`, or branch name to a commit hash
pub fn resolve_rev(repo: &Repo, rev: &str) -> Result<Hash> {
    if rev.len() == HASH_LEN * 2 && rev.chars().all(|c| c.is_ascii_hexdigit()) {
        return Hash::from_hex(rev);
    }

    if rev == HEAD {
        return head_commit(repo)?.ok_or_else(|| Error::RefNotFound(HEAD.to_string()));
    }

    read_branch(repo, rev)
}

/// get filesystem path for a branch
fn branch_path(repo: &Repo, name: &str) -> PathBuf {
    repo.refs_path().join(name)
}

/// atomic write: temp -> fsync -> rename -> fsync dir
fn write_atomic(repo: &Repo, path: &Path, content: &str) -> Result<()> {
    let tmp_path = repo.tmp_path().join(uuid::Uuid::new_v4().to_string());
    {
        let mut tmp_file = File::create(&tmp_path).with_path(&tmp_path)?;
        writeln!(tmp_file, "{}", content).with_path(&tmp_path)?;
        tmp_file.sync_all().with_path(&tmp_path)?;
    }

    fs::rename(&tmp_path, path).with_path(path)?;

    if let Some(parent) = path.parent() {
        let dir = File::open(parent).with_path(parent)?;
        dir.sync_all().with_path(parent)?;
    }

    Ok(())
}

/// recursively collect refs from directory
fn collect_refs(base: &Path, dir: &Path, refs: &mut Vec<String>) -> Result<()> {
    for entry in fs::read_dir(dir).with_path(dir)? {
        let entry = entry.with_path(dir)?;
        let path = entry.path();

        if path.is_dir() {
            collect_refs(base, &path, refs)?;
        } else if path.is_file() {
            // compute ref name relative to base
            if let Ok(rel) = path.strip_prefix(base) {
                refs.push(rel.to_string_lossy().to_string());
            }
        }
    }
    Ok(())
}

/// validate ref name
fn validate_ref_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(Error::InvalidRef("empty ref name".to_string()));
    }

    if name == HEAD {
        return Err(Error::InvalidRef(format!("reserved ref name: {}", name)));
    }

    if name.starts_with('/') || name.ends_with('/') {
        return Err(Error::InvalidRef(format!(
            "ref name cannot start or end with '/': {}",
            name
        )));
    }

    if name.contains("//") {
        return Err(Error::InvalidRef(format!(
            "ref name cannot contain '//': {}",
            name
        )));
    }

    if name.contains('\0') {
        return Err(Error::InvalidRef(format!(
            "ref name cannot contain null byte: {}",
            name
        )));
    }

    // check for path traversal
    for component in name.split('/') {
        if component == "." || component == ".." {
            return Err(Error::InvalidRef(format!(
                "ref name cannot contain '.' or '..': {}",
                name
            )));
        }
    }

    Ok(())
}
