//! high-level operations on a working tree and its repository

mod add;
mod commit;
pub mod flat;
mod fsck;
mod log;
mod reset;
mod status;

pub use add::{add, add_all};
pub use commit::commit;
pub use flat::{assemble, flatten, flatten_stored, FlatTree, MemorySink};
pub use fsck::{fsck, CorruptObject, FsckReport, MissingObject};
pub use log::{log, log_from, LogEntry};
pub use reset::reset;
pub use status::{head_flat, status, working_flat, Status};
