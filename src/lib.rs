//! cvs - minimal content-addressed version control
//!
//! an immutable object graph of blobs, trees and commits built from a working
//! directory, plus the small repository layer (refs, staging index, loose
//! object store) needed to drive it from a shell.
//!
//! # Core concepts
//!
//! - **Blob**: raw file bytes
//! - **Tree**: one directory level, entry descriptors mapped to child hashes
//! - **Commit**: a root tree hash and an optional parent commit hash
//! - **Tombstone**: an entry (or object) flagged as removed
//!
//! # Hash format
//!
//! all digests are SHA-1 over a domain-separated input:
//!
//! - blob = SHA1("blob #\0" | content)
//! - commit = SHA1("commit #\0" | tree | parent?)
//! - tree = SHA1("tree #\0" | is_removed | count | children...)
//!
//! where each child is: kind | is_removed | path_len | path | hash, in canonical
//! (path-sorted) order. the commit message is not part of the hash.
//!
//! # Example usage
//!
//! ```no_run
//! use cvs::{ops, Repo};
//! use std::path::Path;
//!
//! // initialize a repository in a working directory
//! let repo = Repo::init(Path::new("/path/to/work")).unwrap();
//!
//! // stage everything and commit it
//! ops::add_all(&repo).unwrap();
//! let hash = ops::commit(&repo, "initial commit").unwrap();
//! println!("{}", hash);
//! ```

mod config;
mod error;
mod hash;
mod index;
mod refs;
mod repo;

pub mod fs;
pub mod materialize;
pub mod object;
pub mod ops;
pub mod types;

pub use config::Config;
pub use error::{Error, Result};
pub use hash::{compute_blob_hash, compute_commit_hash, compute_tree_hash, Hash, HASH_LEN};
pub use index::Index;
pub use materialize::{walk, Discard, ObjectSink, WalkOptions};
pub use object::{object_exists, object_path, read_any, read_object, write_object, StoreSink};
pub use refs::{
    branch_exists, head_commit, list_branches, read_branch, read_head, resolve_rev, update_head,
    write_branch, write_head, Head,
};
pub use repo::{Repo, RepoLock, REPO_DIR};
pub use types::{
    AnyObject, Blob, Commit, EntryKind, Object, ObjectKind, Tree, TreeObjectData, SEPARATOR,
};
