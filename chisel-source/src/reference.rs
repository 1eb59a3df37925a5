//! Reference resolution.
//!
//! Raw reference and media values are descriptors naming a source table and
//! a record id. The resolver turns each into a [`ReferenceToken`] for a type
//! registered in the [`Schema`], or into [`Resolution::Unresolved`] when the
//! table belongs to no registered content type. It never emits a token for
//! an unregistered type.

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{json, Value};
use tracing::debug;

use crate::naming::type_name_for_source_table;
use crate::schema::Schema;
use crate::store::NodeStore;
use crate::transform::FieldTransformError;

/// Opaque pointer to a node of another collection.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReferenceToken {
    /// Target collection
    #[serde(rename = "typeName")]
    pub type_name: String,
    /// Target node id
    pub id: String,
}

impl ReferenceToken {
    /// Create a token.
    pub fn new(type_name: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            id: id.into(),
        }
    }

    /// Render as `{"typeName": .., "id": ..}`.
    pub fn to_json(&self) -> Value {
        json!({ "typeName": self.type_name, "id": self.id })
    }
}

/// Outcome of resolving one reference descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Target type is registered
    Token(ReferenceToken),
    /// Target table has no registered content type
    Unresolved,
}

impl Resolution {
    /// The token, if resolved.
    pub fn token(&self) -> Option<&ReferenceToken> {
        match self {
            Self::Token(token) => Some(token),
            Self::Unresolved => None,
        }
    }

    /// Whether the target could not be resolved.
    pub fn is_unresolved(&self) -> bool {
        matches!(self, Self::Unresolved)
    }

    /// Render for the store: a token object or `{"unresolved": true}`.
    pub fn to_json(&self) -> Value {
        match self {
            Self::Token(token) => token.to_json(),
            Self::Unresolved => json!({ "unresolved": true }),
        }
    }
}

impl Serialize for Resolution {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Token(token) => token.serialize(serializer),
            Self::Unresolved => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("unresolved", &true)?;
                map.end()
            }
        }
    }
}

/// Raw cross-entity descriptor.
///
/// Accepts both the plain `{table, id}` shape and Parse pointers
/// (`{"__type": "Pointer", "className": .., "objectId": ..}`).
#[derive(Debug, Clone, Deserialize)]
struct RawDescriptor {
    #[serde(default, alias = "className")]
    table: Option<String>,
    #[serde(alias = "objectId")]
    id: String,
}

impl RawDescriptor {
    fn parse(raw: &Value) -> Result<Self, FieldTransformError> {
        if !raw.is_object() {
            return Err(FieldTransformError::TypeMismatch {
                expected: "descriptor object",
                actual: json_kind(raw),
            });
        }
        Self::deserialize(raw).map_err(|e| FieldTransformError::MalformedDescriptor(e.to_string()))
    }
}

/// Short name of a JSON value's kind, for diagnostics.
pub(crate) fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Resolves descriptors against a schema, minting tokens through the store.
#[derive(Clone, Copy)]
pub struct ReferenceResolver<'a> {
    schema: &'a Schema,
    store: &'a dyn NodeStore,
}

impl<'a> ReferenceResolver<'a> {
    /// Create a resolver.
    pub fn new(schema: &'a Schema, store: &'a dyn NodeStore) -> Self {
        Self { schema, store }
    }

    /// Resolve a reference descriptor.
    ///
    /// An unknown source table is an expected outcome and yields
    /// [`Resolution::Unresolved`]. Only a malformed descriptor is an error.
    pub fn resolve(&self, raw: &Value) -> Result<Resolution, FieldTransformError> {
        let descriptor = RawDescriptor::parse(raw)?;
        let table = descriptor
            .table
            .ok_or(FieldTransformError::MissingSourceTable)?;

        match type_name_for_source_table(self.schema, &table) {
            Some(type_name) => Ok(Resolution::Token(
                self.store.create_reference(type_name, &descriptor.id),
            )),
            None => {
                debug!(table = %table, id = %descriptor.id, "Reference target not registered");
                Ok(Resolution::Unresolved)
            }
        }
    }

    /// Resolve a media descriptor to a token against the media type.
    pub fn resolve_media(&self, raw: &Value) -> Result<ReferenceToken, FieldTransformError> {
        let descriptor = RawDescriptor::parse(raw)?;
        Ok(self
            .store
            .create_reference(&self.schema.media_type().type_name, &descriptor.id))
    }
}
