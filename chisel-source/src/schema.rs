//! In-memory content schema.
//!
//! The [`Schema`] is built once per run by the
//! [`SchemaLoader`](crate::loader::SchemaLoader) and is read-only afterwards.
//! Later stages borrow it; nothing mutates it after construction.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::error::SchemaLoadError;
use crate::naming::canonicalize;

/// Raw name and source table of the synthetic media content type.
pub const MEDIA_ITEM_NAME: &str = "MediaItem";

/// Declared type of a field, as far as transformation cares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FieldType {
    /// Inline data (text, numbers, booleans, dates, JSON)
    Scalar,
    /// Pointer(s) to records of another content type
    Reference,
    /// Pointer to a media item
    Media,
}

impl FieldType {
    /// Map a backend field type string onto a [`FieldType`].
    ///
    /// Anything that is not a reference or media field carries its value
    /// inline, so unknown type strings are scalars.
    pub fn from_raw(raw: &str) -> Self {
        match raw {
            "Reference" => Self::Reference,
            "Media" => Self::Media,
            _ => Self::Scalar,
        }
    }
}

/// One typed, named attribute of a content type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDefinition {
    /// Key of the field in raw records and in emitted nodes
    pub name_id: String,
    /// Human-readable label
    pub display_name: String,
    /// Declared field type
    pub declared_type: FieldType,
    /// Whether the value is a sequence
    pub is_list: bool,
    /// Whether the backend flags the field as required
    pub is_required: bool,
}

impl FieldDefinition {
    /// Create a single-valued, optional field.
    pub fn new(
        name_id: impl Into<String>,
        display_name: impl Into<String>,
        declared_type: FieldType,
    ) -> Self {
        Self {
            name_id: name_id.into(),
            display_name: display_name.into(),
            declared_type,
            is_list: false,
            is_required: false,
        }
    }

    /// Builder: mark the field as list-valued.
    pub fn list(mut self) -> Self {
        self.is_list = true;
        self
    }

    /// Builder: mark the field as required.
    pub fn required(mut self) -> Self {
        self.is_required = true;
        self
    }
}

/// A user-defined entity schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentType {
    /// Backend id of the model record
    pub model_id: String,
    /// Raw model name as stored by the backend
    pub raw_name: String,
    /// Canonical type name, unique across the schema
    pub type_name: String,
    /// Table that holds this type's records
    pub source_table_id: String,
    /// Record key used for node titles, if any
    pub display_field_name: Option<String>,
    /// Fields in declared order
    pub fields: Vec<FieldDefinition>,
}

impl ContentType {
    /// Create a content type, deriving its display field from `fields`.
    pub fn new(
        model_id: impl Into<String>,
        raw_name: impl Into<String>,
        type_name: impl Into<String>,
        source_table_id: impl Into<String>,
        fields: Vec<FieldDefinition>,
    ) -> Self {
        let display_field_name = select_display_field(&fields);
        Self {
            model_id: model_id.into(),
            raw_name: raw_name.into(),
            type_name: type_name.into(),
            source_table_id: source_table_id.into(),
            display_field_name,
            fields,
        }
    }

    /// The synthetic content type for media items.
    pub fn media(prefix: &str) -> Self {
        Self::new(
            MEDIA_ITEM_NAME,
            MEDIA_ITEM_NAME,
            canonicalize(prefix, MEDIA_ITEM_NAME),
            MEDIA_ITEM_NAME,
            vec![
                FieldDefinition::new("name", "Name", FieldType::Scalar).required(),
                FieldDefinition::new("type", "Type", FieldType::Scalar),
                FieldDefinition::new("size", "Size", FieldType::Scalar),
                FieldDefinition::new("file", "File", FieldType::Scalar),
            ],
        )
    }

    /// Whether the backend enabled no fields for this type.
    pub fn is_degenerate(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Pick the record key used as a node's title.
///
/// Starts from the first field's display name; every required field seen
/// afterwards replaces it with its name id, so the last required field wins.
pub fn select_display_field(fields: &[FieldDefinition]) -> Option<String> {
    let mut display = fields.first().map(|f| f.display_name.clone());
    for field in fields.iter().filter(|f| f.is_required) {
        display = Some(field.name_id.clone());
    }
    display
}

/// Every content type of a site plus the synthetic media type.
#[derive(Debug, Clone)]
pub struct Schema {
    /// Content types in load order; the media type is always last
    types: Vec<ContentType>,
    by_type_name: HashMap<String, usize>,
    by_table: HashMap<String, usize>,
}

impl Schema {
    /// Build a schema from loaded content types.
    ///
    /// Appends the media type and checks that type names and source tables
    /// are unique and that no content type repeats a field name id.
    pub fn new(prefix: &str, content_types: Vec<ContentType>) -> Result<Self, SchemaLoadError> {
        let mut types = content_types;
        types.push(ContentType::media(prefix));

        let mut by_type_name: HashMap<String, usize> = HashMap::with_capacity(types.len());
        let mut by_table: HashMap<String, usize> = HashMap::with_capacity(types.len());

        for (index, content_type) in types.iter().enumerate() {
            if let Some(&existing) = by_type_name.get(&content_type.type_name) {
                return Err(SchemaLoadError::TypeNameCollision {
                    type_name: content_type.type_name.clone(),
                    first: types[existing].raw_name.clone(),
                    second: content_type.raw_name.clone(),
                });
            }
            if by_table.contains_key(&content_type.source_table_id) {
                return Err(SchemaLoadError::DuplicateSourceTable(
                    content_type.source_table_id.clone(),
                ));
            }

            let mut seen = HashSet::new();
            for field in &content_type.fields {
                if !seen.insert(field.name_id.as_str()) {
                    return Err(SchemaLoadError::DuplicateField {
                        type_name: content_type.type_name.clone(),
                        name_id: field.name_id.clone(),
                    });
                }
            }

            by_type_name.insert(content_type.type_name.clone(), index);
            by_table.insert(content_type.source_table_id.clone(), index);
        }

        Ok(Self {
            types,
            by_type_name,
            by_table,
        })
    }

    /// Content types whose entries are loaded, in load order.
    pub fn content_types(&self) -> &[ContentType] {
        &self.types[..self.types.len() - 1]
    }

    /// The synthetic media content type.
    pub fn media_type(&self) -> &ContentType {
        &self.types[self.types.len() - 1]
    }

    /// Look up a content type by canonical type name.
    pub fn content_type(&self, type_name: &str) -> Option<&ContentType> {
        self.by_type_name.get(type_name).map(|&i| &self.types[i])
    }

    /// Look up the content type stored in `table_id`.
    pub fn content_type_for_table(&self, table_id: &str) -> Option<&ContentType> {
        self.by_table.get(table_id).map(|&i| &self.types[i])
    }

    /// Number of content types, excluding the media type.
    pub fn len(&self) -> usize {
        self.types.len() - 1
    }

    /// Whether the site defines no content types.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
