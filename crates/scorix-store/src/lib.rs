//! Key/value store abstraction for the Scorix scoring service.
//!
//! One authoritative primary partition plus one TTL-bounded cache
//! partition, addressed through the [`Store`] trait. The Redis backend
//! carries the reconnect discipline; the in-memory backend mirrors its
//! semantics for tests and local runs.

pub mod error;
pub mod memory;
pub mod redis;
pub mod traits;

pub use error::{Result, StoreError};
pub use memory::MemoryStore;
pub use redis::{RedisStore, StoreConfig};
pub use traits::Store;
