//! Data models for the Blob, Queue and Table services.

mod blob;
mod container;
mod queue;
mod table;

pub use blob::*;
pub use container::*;
pub use queue::*;
pub use table::*;
