mod blob;
mod commit;
pub(crate) mod entry;
mod object;
mod tree;

pub use blob::Blob;
pub use commit::Commit;
pub use entry::{EntryKind, TreeObjectData, SEPARATOR};
pub use object::{AnyObject, Object, ObjectKind, FORMAT_VERSION};
pub use tree::Tree;
