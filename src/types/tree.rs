use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::hash::{compute_tree_hash, Hash};
use crate::materialize::{walk, Discard, WalkOptions};
use crate::types::object::{encode, AnyObject, Object, ObjectKind, ObjectRef};
use crate::types::TreeObjectData;

/// one directory level: entry descriptors mapped to child hashes
///
/// children are kept ordered by descriptor (path first), so the hash does not
/// depend on the order entries were added in.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tree {
    #[serde(with = "children_list")]
    children: BTreeMap<TreeObjectData, Hash>,
    is_removed: bool,
}

impl Tree {
    /// create an empty tree
    pub fn new() -> Self {
        Self::default()
    }

    /// create an empty tree marked as removed
    pub fn removed() -> Self {
        Self {
            children: BTreeMap::new(),
            is_removed: true,
        }
    }

    /// snapshot a directory into an unstored tree
    ///
    /// entry paths are `directory/<name>`, with a trailing separator for
    /// subdirectories. nothing is written anywhere; any read failure aborts
    /// the whole walk.
    pub fn from_directory(directory: &Path) -> Result<Self> {
        let prefix = crate::types::entry::dir_path(directory.to_string_lossy().into_owned());
        walk(directory, &prefix, &WalkOptions::default(), &mut Discard)
    }

    /// insert or overwrite the child hash for `data`, returning the previous hash
    pub fn add_object(&mut self, data: TreeObjectData, hash: Hash) -> Option<Hash> {
        self.children.insert(data, hash)
    }

    /// children in canonical order
    pub fn children(&self) -> impl ExactSizeIterator<Item = (&TreeObjectData, &Hash)> {
        self.children.iter()
    }

    /// hash stored for an exact descriptor
    pub fn get(&self, data: &TreeObjectData) -> Option<&Hash> {
        self.children.get(data)
    }

    /// first child whose path matches, of any kind or removal state
    pub fn find(&self, path: &str) -> Option<(&TreeObjectData, &Hash)> {
        self.children.iter().find(|(data, _)| data.path() == path)
    }

    pub fn is_removed(&self) -> bool {
        self.is_removed
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }
}

impl Object for Tree {
    const KIND: ObjectKind = ObjectKind::Tree;

    fn hash(&self) -> Hash {
        compute_tree_hash(self.children.iter(), self.is_removed)
    }

    fn encode(&self) -> Result<Vec<u8>> {
        encode(ObjectRef::Tree(self))
    }

    fn decode(bytes: &[u8]) -> Result<Self> {
        match AnyObject::decode(bytes)? {
            AnyObject::Tree(tree) => Ok(tree),
            other => Err(Error::UnexpectedObjectKind {
                expected: Self::KIND,
                found: other.kind(),
            }),
        }
    }
}

/// encodes the child map as a list of `{entry, hash}` records
mod children_list {
    use std::collections::BTreeMap;

    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    use crate::hash::Hash;
    use crate::types::TreeObjectData;

    #[derive(Serialize)]
    struct ChildRef<'a> {
        entry: &'a TreeObjectData,
        hash: &'a Hash,
    }

    #[derive(Deserialize)]
    struct Child {
        entry: TreeObjectData,
        hash: Hash,
    }

    pub fn serialize<S>(children: &BTreeMap<TreeObjectData, Hash>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_seq(children.iter().map(|(entry, hash)| ChildRef { entry, hash }))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<BTreeMap<TreeObjectData, Hash>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let children = Vec::<Child>::deserialize(deserializer)?;
        Ok(children
            .into_iter()
            .map(|child| (child.entry, child.hash))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Blob, EntryKind};
    use std::fs;
    use tempfile::tempdir;

    fn blob_hash(content: &str) -> Hash {
        Blob::new(content).hash()
    }

    #[test]
    fn test_tree_empty() {
        let t = Tree::new();
        assert!(t.is_empty());
        assert_eq!(t.len(), 0);
        assert_eq!(t.hash(), Tree::new().hash());
    }

    #[test]
    fn test_add_object_last_insert_wins() {
        let mut tree = Tree::new();
        let data = TreeObjectData::blob("a.txt");

        assert_eq!(tree.add_object(data.clone(), blob_hash("v1")), None);
        assert_eq!(
            tree.add_object(data.clone(), blob_hash("v2")),
            Some(blob_hash("v1"))
        );

        assert_eq!(tree.len(), 1);
        assert_eq!(tree.get(&data), Some(&blob_hash("v2")));
    }

    #[test]
    fn test_hash_is_insertion_order_independent() {
        let a = (TreeObjectData::blob("a"), blob_hash("a"));
        let b = (TreeObjectData::blob("b"), blob_hash("b"));

        let mut t1 = Tree::new();
        t1.add_object(a.0.clone(), a.1);
        t1.add_object(b.0.clone(), b.1);

        let mut t2 = Tree::new();
        t2.add_object(b.0, b.1);
        t2.add_object(a.0, a.1);

        assert_eq!(t1.hash(), t2.hash());
        assert_eq!(t1.encode().unwrap(), t2.encode().unwrap());
    }

    #[test]
    fn test_hash_changes_with_children() {
        let mut tree = Tree::new();
        let empty = tree.hash();
        tree.add_object(TreeObjectData::blob("a"), blob_hash("a"));
        assert_ne!(tree.hash(), empty);
    }

    #[test]
    fn test_removed_tree_hash_differs() {
        assert_ne!(Tree::new().hash(), Tree::removed().hash());
    }

    #[test]
    fn test_tombstone_does_not_change_blob_hash() {
        let before = blob_hash("content");

        let mut tree = Tree::new();
        tree.add_object(TreeObjectData::removed("a.txt", EntryKind::Blob), before);

        assert_eq!(Blob::new("content").hash(), before);
        assert_eq!(
            tree.find("a.txt").map(|(data, _)| data.is_removed()),
            Some(true)
        );
    }

    #[test]
    fn test_encode_decode() {
        let mut tree = Tree::new();
        tree.add_object(TreeObjectData::blob("f"), blob_hash("f"));
        tree.add_object(TreeObjectData::tree("d"), Tree::new().hash());
        tree.add_object(TreeObjectData::removed("gone", EntryKind::Blob), Hash::ZERO);

        let decoded = Tree::decode(&tree.encode().unwrap()).unwrap();
        assert_eq!(decoded, tree);
        assert_eq!(decoded.hash(), tree.hash());
    }

    #[test]
    fn test_from_directory() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("a.txt"), b"hello").unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();

        let tree = Tree::from_directory(dir.path()).unwrap();
        assert_eq!(tree.len(), 2);

        let root = dir.path().to_string_lossy().into_owned();
        let file = TreeObjectData::blob(format!("{}/a.txt", root));
        let sub = TreeObjectData::tree(format!("{}/sub/", root));

        assert_eq!(tree.get(&file), Some(&Blob::new(b"hello".to_vec()).hash()));
        assert_eq!(tree.get(&sub), Some(&Tree::new().hash()));
        assert_eq!(file.name(), "a.txt");
        assert_eq!(sub.name(), "sub");
    }

    #[test]
    fn test_from_directory_nested() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("a/b")).unwrap();
        fs::write(dir.path().join("a/b/deep.txt"), "deep").unwrap();

        let tree = Tree::from_directory(dir.path()).unwrap();
        let inner = Tree::from_directory(&dir.path().join("a")).unwrap();

        let root = dir.path().to_string_lossy().into_owned();
        let a = TreeObjectData::tree(format!("{}/a", root));
        assert_eq!(tree.get(&a), Some(&inner.hash()));
    }

    #[test]
    fn test_from_directory_is_deterministic() {
        let dir = tempdir().unwrap();
        for name in ["z", "m", "a"] {
            fs::write(dir.path().join(name), name).unwrap();
        }

        let t1 = Tree::from_directory(dir.path()).unwrap();
        let t2 = Tree::from_directory(dir.path()).unwrap();
        assert_eq!(t1.hash(), t2.hash());
    }

    #[test]
    fn test_from_missing_directory() {
        let dir = tempdir().unwrap();
        let result = Tree::from_directory(&dir.path().join("nope"));
        assert!(matches!(result, Err(Error::Io { .. })));
    }
}
