//! Node assembly.

use serde::{Serialize, Serializer};
use serde_json::{Map, Value};

use crate::backend::RawRecord;
use crate::reference::ReferenceResolver;
use crate::schema::{ContentType, Schema};
use crate::store::NodeStore;
use crate::transform::{transform_field, FieldFault, FieldValue};

/// Record key holding the record id.
pub const ID_KEY: &str = "id";
/// Record key holding the creation timestamp.
pub const CREATED_AT_KEY: &str = "createdAt";
/// Record key holding the last update timestamp.
pub const UPDATED_AT_KEY: &str = "updatedAt";

/// Flat, store-ready representation of one record.
///
/// `date` and `created_at` always hold the same value; both keys exist for
/// consumers that expect either.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    /// Record id
    pub id: String,
    /// Value of the content type's display field, or null
    pub title: Value,
    /// Same as `created_at`
    pub date: Value,
    /// Creation timestamp as delivered by the backend
    pub created_at: Value,
    /// Last update timestamp as delivered by the backend
    pub updated_at: Value,
    /// One entry per field, in the content type's declared order
    pub fields: Vec<(String, FieldValue)>,
}

impl Node {
    /// Look up a transformed field by name id.
    pub fn field(&self, name_id: &str) -> Option<&FieldValue> {
        self.fields
            .iter()
            .find(|(name, _)| name == name_id)
            .map(|(_, value)| value)
    }

    /// Render as one flat JSON object.
    ///
    /// Metadata keys come first, then fields in declared order. A field
    /// whose name id matches a metadata key replaces that key's value.
    pub fn to_json(&self) -> Value {
        let mut object = Map::new();
        object.insert(ID_KEY.to_string(), Value::String(self.id.clone()));
        object.insert("title".to_string(), self.title.clone());
        object.insert("date".to_string(), self.date.clone());
        object.insert(CREATED_AT_KEY.to_string(), self.created_at.clone());
        object.insert(UPDATED_AT_KEY.to_string(), self.updated_at.clone());
        for (name, value) in &self.fields {
            object.insert(name.clone(), value.to_json());
        }
        Value::Object(object)
    }
}

impl Serialize for Node {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

/// A built node plus the diagnostics of any degraded fields.
#[derive(Debug, Clone, PartialEq)]
pub struct BuiltNode {
    pub node: Node,
    pub faults: Vec<FieldFault>,
}

/// Error that prevents a record from becoming a node.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NodeBuildError {
    /// Record has no string id
    #[error("Record of {type_name} has no id")]
    MissingId { type_name: String },
}

/// Builds nodes from raw records.
pub struct NodeBuilder<'a> {
    resolver: ReferenceResolver<'a>,
}

impl<'a> NodeBuilder<'a> {
    /// Create a builder resolving references against `schema`.
    pub fn new(schema: &'a Schema, store: &'a dyn NodeStore) -> Self {
        Self {
            resolver: ReferenceResolver::new(schema, store),
        }
    }

    /// Build the node for one record of `content_type`.
    ///
    /// Field faults are degraded to null and reported in
    /// [`BuiltNode::faults`]; only a missing id is an error.
    pub fn build(
        &self,
        content_type: &ContentType,
        record: &RawRecord,
    ) -> Result<BuiltNode, NodeBuildError> {
        let id = record
            .get(ID_KEY)
            .and_then(Value::as_str)
            .ok_or_else(|| NodeBuildError::MissingId {
                type_name: content_type.type_name.clone(),
            })?
            .to_string();

        let title = content_type
            .display_field_name
            .as_deref()
            .and_then(|key| record.get(key))
            .cloned()
            .unwrap_or(Value::Null);

        let created_at = record.get(CREATED_AT_KEY).cloned().unwrap_or(Value::Null);
        let updated_at = record.get(UPDATED_AT_KEY).cloned().unwrap_or(Value::Null);

        let mut fields = Vec::with_capacity(content_type.fields.len());
        let mut faults = Vec::new();
        for field in &content_type.fields {
            let outcome = transform_field(
                content_type,
                field,
                record.get(&field.name_id),
                &self.resolver,
            );
            if let Some(fault) = outcome.fault {
                faults.push(fault);
            }
            fields.push((field.name_id.clone(), outcome.value));
        }

        Ok(BuiltNode {
            node: Node {
                id,
                title,
                date: created_at.clone(),
                created_at,
                updated_at,
                fields,
            },
            faults,
        })
    }
}
