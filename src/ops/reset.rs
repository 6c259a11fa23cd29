use log::info;

use crate::error::Result;
use crate::hash::Hash;
use crate::object::read_object;
use crate::refs::{resolve_rev, update_head};
use crate::repo::Repo;
use crate::types::Commit;

/// move HEAD (or the branch it names) to another commit
///
/// `rev` is a full hash, `HEAD` or a branch name. the working tree and the
/// index are left alone.
pub fn reset(repo: &Repo, rev: &str) -> Result<Hash> {
    let _lock = repo.lock()?;

    let hash = resolve_rev(repo, rev)?;
    // must name a stored commit, not just any object
    read_object::<Commit>(repo, &hash)?;

    let branch = update_head(repo, &hash)?;
    info!(
        "reset {} to {}",
        branch.as_deref().unwrap_or("HEAD"),
        hash.short()
    );
    Ok(hash)
}
