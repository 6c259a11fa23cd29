use std::fmt;

use serde::{Deserialize, Serialize};

/// path separator used inside tree entry paths
pub const SEPARATOR: char = '/';

/// kind of object a tree entry points at
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    Blob,
    Tree,
}

impl EntryKind {
    /// stable byte code used in tree hashing
    pub fn code(self) -> u8 {
        match self {
            EntryKind::Blob => 0,
            EntryKind::Tree => 1,
        }
    }

    pub fn type_name(self) -> &'static str {
        match self {
            EntryKind::Blob => "blob",
            EntryKind::Tree => "tree",
        }
    }
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name())
    }
}

/// descriptor for one tree entry: path, kind and tombstone flag
///
/// this is a value type. two descriptors with equal fields are the same map
/// key, so a tree can hold a live entry and a tombstone for one path side by
/// side. ordering is by path first, which is the canonical child order of a
/// [`Tree`](crate::Tree).
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TreeObjectData {
    path: String,
    object_type: EntryKind,
    is_removed: bool,
}

impl TreeObjectData {
    pub fn new(path: impl Into<String>, object_type: EntryKind, is_removed: bool) -> Self {
        Self {
            path: path.into(),
            object_type,
            is_removed,
        }
    }

    /// live blob entry
    pub fn blob(path: impl Into<String>) -> Self {
        Self::new(path, EntryKind::Blob, false)
    }

    /// live tree entry; the path is given a trailing separator if it lacks one
    pub fn tree(path: impl Into<String>) -> Self {
        Self::new(dir_path(path.into()), EntryKind::Tree, false)
    }

    /// tombstone for a path of the given kind
    pub fn removed(path: impl Into<String>, object_type: EntryKind) -> Self {
        let path = path.into();
        let path = match object_type {
            EntryKind::Tree => dir_path(path),
            EntryKind::Blob => path,
        };
        Self::new(path, object_type, true)
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn object_type(&self) -> EntryKind {
        self.object_type
    }

    pub fn is_removed(&self) -> bool {
        self.is_removed
    }

    /// final path component, without a trailing separator
    pub fn name(&self) -> &str {
        let trimmed = self.path.trim_end_matches(SEPARATOR);
        match trimmed.rfind(SEPARATOR) {
            Some(i) => &trimmed[i + 1..],
            None => trimmed,
        }
    }
}

impl fmt::Display for TreeObjectData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_removed {
            write!(f, "{} {} (removed)", self.object_type, self.path)
        } else {
            write!(f, "{} {}", self.object_type, self.path)
        }
    }
}

/// append a trailing separator if missing
pub(crate) fn dir_path(mut path: String) -> String {
    if !path.ends_with(SEPARATOR) {
        path.push(SEPARATOR);
    }
    path
}
