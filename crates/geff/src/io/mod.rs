//! Reading and writing whole graphs.

pub mod memory;
pub mod read;
pub mod write;

pub use memory::{InMemoryGeff, PropData};
pub use read::{GeffReader, ReadOptions, read_from_path, read_to_memory};
pub use write::{WriteOptions, write_arrays, write_dicts, write_to_path};
