pub mod store;

pub use store::{object_exists, object_path, read_any, read_object, read_raw, write_object, StoreSink};
