//! path-keyed view of a tree hierarchy

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::ops::Bound;

use crate::error::{Error, Result};
use crate::hash::Hash;
use crate::materialize::ObjectSink;
use crate::object::read_object;
use crate::repo::Repo;
use crate::types::{Blob, EntryKind, Object, Tree, TreeObjectData, SEPARATOR};

/// every live path in a hierarchy mapped to its object hash
///
/// directory keys end with the separator; their values are the subtree hash.
pub type FlatTree = BTreeMap<String, Hash>;

/// expand a tree and all subtrees into a [`FlatTree`]; tombstones are skipped
pub fn flatten<F>(tree: &Tree, load: &mut F) -> Result<FlatTree>
where
    F: FnMut(&Hash) -> Result<Tree>,
{
    let mut flat = FlatTree::new();
    flatten_into(tree, load, &mut flat)?;
    Ok(flat)
}

fn flatten_into<F>(tree: &Tree, load: &mut F, flat: &mut FlatTree) -> Result<()>
where
    F: FnMut(&Hash) -> Result<Tree>,
{
    for (data, hash) in tree.children() {
        if data.is_removed() {
            continue;
        }
        flat.insert(data.path().to_string(), *hash);
        if data.object_type() == EntryKind::Tree {
            let subtree = load(hash)?;
            flatten_into(&subtree, load, flat)?;
        }
    }
    Ok(())
}

/// flatten a tree read from the store
pub fn flatten_stored(repo: &Repo, tree_hash: &Hash) -> Result<FlatTree> {
    let root: Tree = read_object(repo, tree_hash)?;
    flatten(&root, &mut |hash| read_object(repo, hash))
}

/// rebuild nested trees from a [`FlatTree`]
///
/// directory keys only need to be present for directories with no files
/// below them. every subtree is handed to `sink`; the root is returned.
pub fn assemble<S: ObjectSink + ?Sized>(flat: &FlatTree, sink: &mut S) -> Result<Tree> {
    assemble_dir(flat, "", sink)
}

fn assemble_dir<S: ObjectSink + ?Sized>(flat: &FlatTree, prefix: &str, sink: &mut S) -> Result<Tree> {
    let mut tree = Tree::new();
    let mut subdirs = BTreeSet::new();

    for (path, hash) in flat.range::<str, _>((Bound::Included(prefix), Bound::Unbounded)) {
        let Some(rest) = path.strip_prefix(prefix) else {
            break;
        };
        if rest.is_empty() {
            continue;
        }
        match rest.find(SEPARATOR) {
            None => {
                tree.add_object(TreeObjectData::blob(path.as_str()), *hash);
            }
            Some(i) => {
                subdirs.insert(&path[..prefix.len() + i + 1]);
            }
        }
    }

    for dir in subdirs {
        let subtree = assemble_dir(flat, dir, sink)?;
        let hash = sink.put_tree(&subtree)?;
        tree.add_object(TreeObjectData::tree(dir), hash);
    }

    Ok(tree)
}

/// drop a directory key and everything below it
pub fn remove_subtree(flat: &mut FlatTree, dir: &str) {
    flat.retain(|path, _| !path.starts_with(dir));
}

/// sink that keeps trees in memory so they can be flattened without a store
#[derive(Default)]
pub struct MemorySink {
    trees: HashMap<Hash, Tree>,
}

impl MemorySink {
    pub fn load(&self, hash: &Hash) -> Result<Tree> {
        self.trees
            .get(hash)
            .cloned()
            .ok_or(Error::ObjectNotFound(*hash))
    }
}

impl ObjectSink for MemorySink {
    fn put_blob(&mut self, blob: &Blob) -> Result<Hash> {
        Ok(blob.hash())
    }

    fn put_tree(&mut self, tree: &Tree) -> Result<Hash> {
        let hash = tree.hash();
        self.trees.insert(hash, tree.clone());
        Ok(hash)
    }
}
