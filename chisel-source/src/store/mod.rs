//! Downstream graph store abstraction.
//!
//! - `NodeStore` trait: collections, node emission, reference construction
//! - `MemoryStore`: in-process store used by the CLI and in tests

pub mod memory;
pub mod traits;

pub use memory::MemoryStore;
pub use traits::{CollectionHandle, NodeStore, StoreError};
