//! Persistence layer: the backend capability trait, its filesystem and
//! in-memory implementations, and the key layout the version store uses.

pub mod fs;
pub mod keys;
pub mod memory;
pub mod retry;
pub mod traits;

pub use fs::FsBackend;
pub use memory::MemoryBackend;
pub use retry::RetryPolicy;
pub use traits::StorageBackend;
