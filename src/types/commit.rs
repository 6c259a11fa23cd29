use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::hash::{compute_commit_hash, Hash};
use crate::types::object::{encode, AnyObject, Object, ObjectKind, ObjectRef};
use crate::types::Tree;

/// a snapshot: root tree hash, optional parent and message
///
/// equality is structural over all three fields and never hashes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commit {
    /// root tree hash
    pub tree: Hash,
    /// parent commit hash, `None` for the first commit
    pub parent: Option<Hash>,
    /// commit message
    pub message: String,
}

impl Commit {
    /// create a root commit for a tree
    pub fn new(tree: &Tree, message: impl Into<String>) -> Self {
        Self::with_tree_hash(tree.hash(), None, message)
    }

    /// create a commit from already computed hashes
    pub fn with_tree_hash(tree: Hash, parent: Option<Hash>, message: impl Into<String>) -> Self {
        Self {
            tree,
            parent,
            message: message.into(),
        }
    }

    /// create the next commit in the chain, with this commit as parent
    ///
    /// the tree is hashed now; later mutation of `tree` does not affect
    /// the returned commit.
    pub fn derive_commit(&self, tree: &Tree, message: impl Into<String>) -> Commit {
        Self::with_tree_hash(tree.hash(), Some(self.hash()), message)
    }

    /// is this an initial commit (no parent)
    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }
}

impl Object for Commit {
    const KIND: ObjectKind = ObjectKind::Commit;

    /// covers the tree and parent only; the message is not hashed
    fn hash(&self) -> Hash {
        compute_commit_hash(&self.tree, self.parent.as_ref())
    }

    fn encode(&self) -> Result<Vec<u8>> {
        encode(ObjectRef::Commit(self))
    }

    fn decode(bytes: &[u8]) -> Result<Self> {
        match AnyObject::decode(bytes)? {
            AnyObject::Commit(commit) => Ok(commit),
            other => Err(Error::UnexpectedObjectKind {
                expected: Self::KIND,
                found: other.kind(),
            }),
        }
    }
}
