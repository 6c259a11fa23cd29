use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::hash::{compute_blob_hash, Hash};
use crate::types::object::{encode, AnyObject, Object, ObjectKind, ObjectRef};

/// raw file content, addressed by its bytes
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Blob {
    pub content: Vec<u8>,
    /// tombstone marker; not part of the hash
    pub is_removed: bool,
}

impl Blob {
    pub fn new(content: impl Into<Vec<u8>>) -> Self {
        Self {
            content: content.into(),
            is_removed: false,
        }
    }

    /// tombstone blob for a deleted path
    pub fn removed(content: impl Into<Vec<u8>>) -> Self {
        Self {
            content: content.into(),
            is_removed: true,
        }
    }

    pub fn len(&self) -> usize {
        self.content.len()
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }
}

impl Object for Blob {
    const KIND: ObjectKind = ObjectKind::Blob;

    fn hash(&self) -> Hash {
        compute_blob_hash(&self.content)
    }

    fn encode(&self) -> Result<Vec<u8>> {
        encode(ObjectRef::Blob(self))
    }

    fn decode(bytes: &[u8]) -> Result<Self> {
        match AnyObject::decode(bytes)? {
            AnyObject::Blob(blob) => Ok(blob),
            other => Err(Error::UnexpectedObjectKind {
                expected: Self::KIND,
                found: other.kind(),
            }),
        }
    }
}
