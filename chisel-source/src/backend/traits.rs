//! Core traits for content backends.
//!
//! This module defines the `ContentBackend` trait - the read-only view of
//! the upstream content API that the schema loader and orchestrator use.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A raw backend row: field name ids and metadata keys mapped to JSON values.
pub type RawRecord = serde_json::Map<String, serde_json::Value>;

/// Record key holding an entry's publication status.
pub const STATUS_KEY: &str = "t__status";

/// Status value of entries that are loaded.
pub const PUBLISHED: &str = "Published";

/// Error types for backend operations.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Server returned an error
    #[error("Server error {status}: {message}")]
    Server { status: u16, message: String },

    /// Response did not have the expected shape
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Backend could not be constructed from its settings
    #[error("Invalid backend settings: {0}")]
    InvalidSettings(String),

    /// Backend is not available
    #[error("Backend unavailable: {0}")]
    Unavailable(String),
}

/// A content type ("model") as listed by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawContentType {
    /// Backend id of the model record
    pub id: String,
    /// Raw model name, canonicalized into the type name
    pub name_id: String,
    /// Human-readable model name
    #[serde(default)]
    pub name: Option<String>,
    /// Table holding the model's entries
    pub table_name: String,
}

impl RawContentType {
    /// Create a raw content type.
    pub fn new(
        id: impl Into<String>,
        name_id: impl Into<String>,
        table_name: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name_id: name_id.into(),
            name: None,
            table_name: table_name.into(),
        }
    }
}

/// A field definition as listed by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawField {
    /// Key of the field in entry records
    pub name_id: String,
    /// Human-readable label
    #[serde(default)]
    pub name: String,
    /// Backend type string ("Short Text", "Reference", "Media", ...)
    #[serde(rename = "type", default)]
    pub field_type: String,
    /// Whether the field holds a sequence
    #[serde(default)]
    pub is_list: bool,
    /// Whether the field is flagged required
    #[serde(default)]
    pub is_required: bool,
    /// Whether the field is switched off in the CMS
    #[serde(default)]
    pub is_disabled: bool,
}

impl RawField {
    /// Create an enabled, optional, single-valued field.
    pub fn new(
        name_id: impl Into<String>,
        name: impl Into<String>,
        field_type: impl Into<String>,
    ) -> Self {
        Self {
            name_id: name_id.into(),
            name: name.into(),
            field_type: field_type.into(),
            is_list: false,
            is_required: false,
            is_disabled: false,
        }
    }

    /// Builder: mark as list-valued.
    pub fn list(mut self) -> Self {
        self.is_list = true;
        self
    }

    /// Builder: mark as required.
    pub fn required(mut self) -> Self {
        self.is_required = true;
        self
    }

    /// Builder: mark as disabled.
    pub fn disabled(mut self) -> Self {
        self.is_disabled = true;
        self
    }
}

/// Core trait for content backends.
///
/// All operations are read-only. Retries and timeouts are the
/// implementation's business; callers treat every error as final.
#[async_trait]
pub trait ContentBackend: Send + Sync {
    /// Get the backend identifier (e.g., server URL).
    fn id(&self) -> &str;

    /// List the content types defined for a site.
    async fn list_content_types(&self, site_id: &str) -> Result<Vec<RawContentType>, BackendError>;

    /// List the enabled fields of one content type, in declared order.
    async fn list_field_definitions(&self, model_id: &str) -> Result<Vec<RawField>, BackendError>;

    /// List the media items of a site.
    async fn list_media_items(&self, site_id: &str) -> Result<Vec<RawRecord>, BackendError>;

    /// List the published records stored in a table.
    async fn list_records(&self, table_id: &str) -> Result<Vec<RawRecord>, BackendError>;
}
