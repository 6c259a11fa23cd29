use serde::{Deserialize, Serialize};
use sha1::{Digest, Sha1};
use std::fmt;

use crate::types::TreeObjectData;
use crate::Error;

/// length of a digest in bytes
pub const HASH_LEN: usize = 20;

/// domain-separation headers
pub const BLOB_HEADER: &[u8] = b"blob #\0";
pub const TREE_HEADER: &[u8] = b"tree #\0";
pub const COMMIT_HEADER: &[u8] = b"commit #\0";

/// SHA-1 digest used for content addressing
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Hash([u8; HASH_LEN]);

impl Hash {
    /// zero hash (useful as sentinel)
    pub const ZERO: Hash = Hash([0u8; HASH_LEN]);

    /// create from raw bytes
    pub fn from_bytes(bytes: [u8; HASH_LEN]) -> Self {
        Self(bytes)
    }

    /// create from a slice, which must be exactly 20 bytes
    pub fn from_slice(bytes: &[u8]) -> crate::Result<Self> {
        let arr: [u8; HASH_LEN] = bytes
            .try_into()
            .map_err(|_| Error::InvalidHashHex(hex::encode(bytes)))?;
        Ok(Self(arr))
    }

    /// parse from hex string
    pub fn from_hex(s: &str) -> crate::Result<Self> {
        let bytes = hex::decode(s).map_err(|_| Error::InvalidHashHex(s.to_string()))?;
        if bytes.len() != HASH_LEN {
            return Err(Error::InvalidHashHex(s.to_string()));
        }
        Self::from_slice(&bytes)
    }

    /// get raw bytes
    pub fn as_bytes(&self) -> &[u8; HASH_LEN] {
        &self.0
    }

    /// convert to hex string
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// first 12 hex chars, for display
    pub fn short(&self) -> String {
        self.to_hex()[..12].to_string()
    }

    /// split into path components for object store
    /// returns (first 2 hex chars, remaining 38 hex chars)
    pub fn to_path_components(&self) -> (String, String) {
        let hex = self.to_hex();
        (hex[..2].to_string(), hex[2..].to_string())
    }
}

impl fmt::Display for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hash({})", self.short())
    }
}

impl Serialize for Hash {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Hash {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

/// compute blob hash over header ++ content
///
/// the removal flag is not part of the hash; tombstones are carried
/// by the tree entry that references the blob.
pub fn compute_blob_hash(content: &[u8]) -> Hash {
    let mut hasher = Sha1::new();
    hasher.update(BLOB_HEADER);
    hasher.update(content);
    Hash(hasher.finalize().into())
}

/// compute tree hash over the full tree state
///
/// children must be supplied in canonical order. format:
///   header
///   is_removed: 1 byte
///   child_count: 4 bytes LE
///   for each child:
///     kind: 1 byte
///     is_removed: 1 byte
///     path_len: 4 bytes LE
///     path: bytes
///     hash: 20 bytes
pub fn compute_tree_hash<'a, I>(children: I, is_removed: bool) -> Hash
where
    I: ExactSizeIterator<Item = (&'a TreeObjectData, &'a Hash)>,
{
    let mut hasher = Sha1::new();
    hasher.update(TREE_HEADER);
    hasher.update([is_removed as u8]);
    hasher.update((children.len() as u32).to_le_bytes());

    for (data, hash) in children {
        hasher.update([data.object_type().code(), data.is_removed() as u8]);
        hasher.update((data.path().len() as u32).to_le_bytes());
        hasher.update(data.path().as_bytes());
        hasher.update(hash.as_bytes());
    }

    Hash(hasher.finalize().into())
}

/// compute commit hash over header ++ tree ++ parent
///
/// a root commit contributes no parent bytes.
pub fn compute_commit_hash(tree: &Hash, parent: Option<&Hash>) -> Hash {
    let mut hasher = Sha1::new();
    hasher.update(COMMIT_HEADER);
    hasher.update(tree.as_bytes());
    if let Some(parent) = parent {
        hasher.update(parent.as_bytes());
    }
    Hash(hasher.finalize().into())
}
