//! XML bodies exchanged with the Blob and Queue services.

pub mod deserialize;
pub mod serialize;

pub use deserialize::*;
pub use serialize::*;
