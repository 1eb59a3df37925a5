//! Run-level error types.
//!
//! Per-field faults never reach this level; see
//! [`FieldTransformError`](crate::transform::FieldTransformError).

use crate::backend::BackendError;
use crate::config::ConfigurationError;
use crate::store::StoreError;

/// Failure while building the schema. Always fatal for the run.
#[derive(Debug, thiserror::Error)]
pub enum SchemaLoadError {
    /// Listing the site's content types failed
    #[error("Failed to list content types for site {site_id}: {source}")]
    ContentTypes {
        site_id: String,
        #[source]
        source: BackendError,
    },

    /// Listing one content type's fields failed
    #[error("Failed to list fields of {type_name}: {source}")]
    Fields {
        type_name: String,
        #[source]
        source: BackendError,
    },

    /// The store refused to register a collection
    #[error("Failed to register collection {type_name}: {source}")]
    Registration {
        type_name: String,
        #[source]
        source: StoreError,
    },

    /// Two raw names canonicalize to the same type name
    #[error("Type name {type_name} claimed by both {first:?} and {second:?}")]
    TypeNameCollision {
        type_name: String,
        first: String,
        second: String,
    },

    /// Two content types store their records in the same table
    #[error("Source table {0} owned by more than one content type")]
    DuplicateSourceTable(String),

    /// A content type repeats a field name id
    #[error("Field {name_id} declared twice on {type_name}")]
    DuplicateField { type_name: String, name_id: String },
}

/// Error that stops a sync run.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// Configuration invalid; the run never started
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    /// Schema could not be built
    #[error("Schema load failed: {0}")]
    SchemaLoad(#[from] SchemaLoadError),

    /// Backend failed during media or entry loading
    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),

    /// Store failed during media or entry loading
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}
