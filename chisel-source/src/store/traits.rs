//! Core traits for graph stores.

use async_trait::async_trait;

use crate::node::Node;
use crate::reference::ReferenceToken;

/// Error types for store operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// Collection was never registered
    #[error("Unknown collection: {0}")]
    UnknownCollection(String),

    /// A node with this id already exists in the collection
    #[error("Duplicate node {id} in {collection}")]
    DuplicateNode { collection: String, id: String },
}

/// Handle to a registered collection, used to target node emission.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CollectionHandle {
    type_name: String,
}

impl CollectionHandle {
    /// Create a handle for a collection.
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
        }
    }

    /// The collection's type name.
    pub fn type_name(&self) -> &str {
        &self.type_name
    }
}

/// Core trait for graph stores.
///
/// The store owns every node handed to [`add_node`](NodeStore::add_node) and
/// is responsible for linking reference tokens to their target nodes.
#[async_trait]
pub trait NodeStore: Send + Sync {
    /// Register a collection for a type name. Registering twice is a no-op.
    async fn register_collection(&self, type_name: &str) -> Result<(), StoreError>;

    /// Get the handle of a registered collection.
    async fn collection(&self, type_name: &str) -> Result<CollectionHandle, StoreError>;

    /// Emit one finished node into a collection.
    async fn add_node(&self, collection: &CollectionHandle, node: Node) -> Result<(), StoreError>;

    /// Construct a reference token the store will link lazily.
    fn create_reference(&self, type_name: &str, id: &str) -> ReferenceToken {
        ReferenceToken::new(type_name, id)
    }
}
