//! Adapters implementing the domain ports.

pub mod in_memory_store;
pub mod msgpack_store;
pub mod snapshot;

pub use in_memory_store::InMemoryStore;
pub use msgpack_store::MsgPackStore;
pub use snapshot::{StoreSnapshot, UserRecord};
