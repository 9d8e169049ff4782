//! Repository layer
//!
//! Repositories are thin accessors over the two places the book lives: the
//! local key-value store and the shared cloud record. They validate shapes
//! but hold no orchestration logic.
//!
//! Remote access is trait-based to enable testing and mocking.

mod local;
mod remote;
mod store;
mod subscription;

// Re-export traits
pub use remote::{RemoteRepository, UpdateCallback};
pub use store::KeyValueStore;

// Re-export implementations
pub use local::LocalRepository;
pub use remote::{CloudRemote, MemoryRemote};
pub use store::{FileStore, MemoryStore, StoreError};
pub use subscription::Subscription;
