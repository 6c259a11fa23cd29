pub mod read;

pub use read::{list_dir, read_file, DirEntry, FileType};
