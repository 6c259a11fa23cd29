use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::hash::Hash;
use crate::types::{Blob, Commit, Tree};

/// current on-disk encoding version
pub const FORMAT_VERSION: u8 = 1;

/// capability shared by every storable object
pub trait Object: Sized {
    const KIND: ObjectKind;

    /// content hash, recomputed on every call
    fn hash(&self) -> Hash;

    /// full self-describing encoding of the object
    fn encode(&self) -> Result<Vec<u8>>;

    /// inverse of [`Object::encode`]
    fn decode(bytes: &[u8]) -> Result<Self>;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectKind {
    Blob,
    Tree,
    Commit,
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ObjectKind::Blob => write!(f, "blob"),
            ObjectKind::Tree => write!(f, "tree"),
            ObjectKind::Commit => write!(f, "commit"),
        }
    }
}

/// any decoded object
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AnyObject {
    Blob(Blob),
    Tree(Tree),
    Commit(Commit),
}

impl AnyObject {
    pub fn kind(&self) -> ObjectKind {
        match self {
            AnyObject::Blob(_) => ObjectKind::Blob,
            AnyObject::Tree(_) => ObjectKind::Tree,
            AnyObject::Commit(_) => ObjectKind::Commit,
        }
    }

    pub fn hash(&self) -> Hash {
        match self {
            AnyObject::Blob(blob) => blob.hash(),
            AnyObject::Tree(tree) => tree.hash(),
            AnyObject::Commit(commit) => commit.hash(),
        }
    }

    pub fn encode(&self) -> Result<Vec<u8>> {
        match self {
            AnyObject::Blob(blob) => encode(ObjectRef::Blob(blob)),
            AnyObject::Tree(tree) => encode(ObjectRef::Tree(tree)),
            AnyObject::Commit(commit) => encode(ObjectRef::Commit(commit)),
        }
    }

    /// decode an object of whatever kind the bytes carry
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let envelope: Envelope = ciborium::from_reader(bytes)?;
        if envelope.version != FORMAT_VERSION {
            return Err(Error::UnsupportedVersion(envelope.version));
        }
        Ok(envelope.object)
    }
}

impl From<Blob> for AnyObject {
    fn from(blob: Blob) -> Self {
        AnyObject::Blob(blob)
    }
}

impl From<Tree> for AnyObject {
    fn from(tree: Tree) -> Self {
        AnyObject::Tree(tree)
    }
}

impl From<Commit> for AnyObject {
    fn from(commit: Commit) -> Self {
        AnyObject::Commit(commit)
    }
}

/// borrowed counterpart of [`AnyObject`] for encoding; tags must match
#[derive(Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub(crate) enum ObjectRef<'a> {
    Blob(&'a Blob),
    Tree(&'a Tree),
    Commit(&'a Commit),
}

#[derive(Serialize)]
struct EnvelopeRef<'a> {
    version: u8,
    object: ObjectRef<'a>,
}

#[derive(Deserialize)]
struct Envelope {
    version: u8,
    object: AnyObject,
}

/// wrap an object in the versioned envelope and encode as CBOR
pub(crate) fn encode(object: ObjectRef<'_>) -> Result<Vec<u8>> {
    let envelope = EnvelopeRef {
        version: FORMAT_VERSION,
        object,
    };
    let mut bytes = Vec::new();
    ciborium::into_writer(&envelope, &mut bytes)?;
    Ok(bytes)
}
