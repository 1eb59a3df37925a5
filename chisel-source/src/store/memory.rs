//! In-memory graph store.

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::RwLock;

use super::traits::*;
use crate::node::Node;

#[derive(Debug, Default)]
struct MemoryState {
    /// Collections in registration order
    order: Vec<String>,
    nodes: HashMap<String, Vec<Node>>,
    ids: HashMap<String, HashSet<String>>,
    /// Type name of every emitted node, in emission order
    emissions: Vec<String>,
}

/// Graph store that keeps every node in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<RwLock<MemoryState>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registered collections, in registration order.
    pub async fn collections(&self) -> Vec<String> {
        self.state.read().await.order.clone()
    }

    /// Nodes of one collection, in emission order.
    pub async fn nodes(&self, type_name: &str) -> Vec<Node> {
        let state = self.state.read().await;
        state.nodes.get(type_name).cloned().unwrap_or_default()
    }

    /// Find one node by collection and id.
    pub async fn node(&self, type_name: &str, id: &str) -> Option<Node> {
        let state = self.state.read().await;
        state
            .nodes
            .get(type_name)
            .and_then(|nodes| nodes.iter().find(|n| n.id == id).cloned())
    }

    /// Total number of nodes across all collections.
    pub async fn node_count(&self) -> usize {
        self.state.read().await.emissions.len()
    }

    /// Collection of every emitted node, in emission order.
    pub async fn emission_log(&self) -> Vec<String> {
        self.state.read().await.emissions.clone()
    }

    /// Render the whole graph as `{ typeName: [node, ...] }`.
    pub async fn snapshot(&self) -> Value {
        let state = self.state.read().await;
        let mut graph = Map::new();
        for type_name in &state.order {
            let nodes = state
                .nodes
                .get(type_name)
                .map(|nodes| nodes.iter().map(Node::to_json).collect())
                .unwrap_or_default();
            graph.insert(type_name.clone(), Value::Array(nodes));
        }
        Value::Object(graph)
    }
}

#[async_trait]
impl NodeStore for MemoryStore {
    async fn register_collection(&self, type_name: &str) -> Result<(), StoreError> {
        let mut state = self.state.write().await;
        if !state.nodes.contains_key(type_name) {
            state.order.push(type_name.to_string());
            state.nodes.insert(type_name.to_string(), Vec::new());
            state.ids.insert(type_name.to_string(), HashSet::new());
        }
        Ok(())
    }

    async fn collection(&self, type_name: &str) -> Result<CollectionHandle, StoreError> {
        let state = self.state.read().await;
        if state.nodes.contains_key(type_name) {
            Ok(CollectionHandle::new(type_name))
        } else {
            Err(StoreError::UnknownCollection(type_name.to_string()))
        }
    }

    async fn add_node(&self, collection: &CollectionHandle, node: Node) -> Result<(), StoreError> {
        let mut state = self.state.write().await;
        let type_name = collection.type_name();

        let ids = state
            .ids
            .get_mut(type_name)
            .ok_or_else(|| StoreError::UnknownCollection(type_name.to_string()))?;
        if !ids.insert(node.id.clone()) {
            return Err(StoreError::DuplicateNode {
                collection: type_name.to_string(),
                id: node.id,
            });
        }

        state.emissions.push(type_name.to_string());
        state.nodes.entry(type_name.to_string()).or_default().push(node);
        Ok(())
    }
}
