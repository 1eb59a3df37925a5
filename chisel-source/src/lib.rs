//! Chisel Source - schema-driven node graph sourcing
//!
//! Reads a Chisel site's content schema (content types and their typed field
//! definitions) plus its published records, and turns them into flat nodes
//! whose cross-entity fields are resolved into reference tokens for a
//! downstream graph store.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────┐
//! │          SourceOrchestrator              │
//! │  schema → media → entries → done         │
//! └───────┬───────────────────────┬──────────┘
//!         │                       │
//!         ▼                       ▼
//! ┌───────────────┐       ┌───────────────┐
//! │ ContentBackend│       │  NodeBuilder  │──► NodeStore
//! │ (Parse/Mock)  │       │  transform    │
//! └───────────────┘       │  reference    │
//!                         └───────────────┘
//! ```
//!
//! # Example
//!
//! ```ignore
//! use chisel_source::{MemoryStore, ParseBackend, SourceConfig, SourceOrchestrator};
//!
//! let config = SourceConfig::from_yaml(&std::fs::read_to_string("chisel.yaml")?)?;
//! config.validate()?;
//!
//! let backend = ParseBackend::new(&config)?;
//! let store = MemoryStore::new();
//! let report = SourceOrchestrator::new(&backend, &store, &config).run().await?;
//! ```

pub mod backend;
pub mod config;
pub mod error;
pub mod loader;
pub mod naming;
pub mod node;
pub mod orchestrator;
pub mod reference;
pub mod schema;
pub mod store;
pub mod transform;

// Re-export main types
pub use backend::{BackendError, ContentBackend, MockBackend, ParseBackend, RawContentType, RawField, RawRecord};
pub use config::{ConfigurationError, SourceConfig};
pub use error::{SchemaLoadError, SourceError};
pub use loader::SchemaLoader;
pub use naming::{canonicalize, type_name_for_source_table, TypeNameRegistry};
pub use node::{BuiltNode, Node, NodeBuildError, NodeBuilder};
pub use orchestrator::{Phase, SourceOrchestrator, SyncReport};
pub use reference::{ReferenceResolver, ReferenceToken, Resolution};
pub use schema::{ContentType, FieldDefinition, FieldType, Schema};
pub use store::{CollectionHandle, MemoryStore, NodeStore, StoreError};
pub use transform::{transform, transform_field, FieldFault, FieldOutcome, FieldTransformError, FieldValue};
