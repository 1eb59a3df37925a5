//! Field value transformation.
//!
//! Converts one raw field value into its node-ready form by matching on the
//! field's declared type and list-ness:
//!
//! | list | type      | output                                   |
//! |------|-----------|------------------------------------------|
//! | no   | Scalar    | value unchanged                          |
//! | no   | Reference | sequence of resolutions (see below)      |
//! | no   | Media     | one media token                          |
//! | yes  | Scalar    | elements unchanged, nulls kept in place  |
//! | yes  | Reference | resolutions, nulls kept in place         |
//! | yes  | Media     | media tokens, nulls kept in place        |
//!
//! The backend stores even a to-one relation as a sequence of descriptors,
//! so a non-list reference field still produces a sequence. That shape is
//! kept as its own variant, [`FieldValue::ToOneReferences`], and consumers
//! should expect an array there.
//!
//! A fault while transforming one field never fails the record:
//! [`transform_field`] degrades the value to null and returns the fault
//! alongside it.

use serde::{Serialize, Serializer};
use serde_json::Value;
use tracing::warn;

use crate::reference::{json_kind, ReferenceResolver, ReferenceToken, Resolution};
use crate::schema::{ContentType, FieldDefinition, FieldType};

/// Fault while transforming a single field.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FieldTransformError {
    /// Raw value has the wrong JSON shape
    #[error("Expected {expected}, got {actual}")]
    TypeMismatch {
        expected: &'static str,
        actual: &'static str,
    },

    /// Descriptor object could not be read (e.g. missing id)
    #[error("Malformed descriptor: {0}")]
    MalformedDescriptor(String),

    /// Reference descriptor does not name its source table
    #[error("Reference descriptor has no source table")]
    MissingSourceTable,
}

/// Node-ready value of one field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// Absent, null, or degraded after a fault
    Null,
    /// Single inline value
    Scalar(Value),
    /// List of inline values
    ScalarList(Vec<Value>),
    /// Non-list reference field; the backend delivers it as a sequence
    ToOneReferences(Vec<Resolution>),
    /// List reference field
    ReferenceList(Vec<Option<Resolution>>),
    /// Single media pointer
    Media(ReferenceToken),
    /// List of media pointers
    MediaList(Vec<Option<ReferenceToken>>),
}

impl FieldValue {
    /// Whether the value is null.
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Number of elements for sequence-shaped values.
    pub fn len(&self) -> Option<usize> {
        match self {
            Self::ScalarList(items) => Some(items.len()),
            Self::ToOneReferences(items) => Some(items.len()),
            Self::ReferenceList(items) => Some(items.len()),
            Self::MediaList(items) => Some(items.len()),
            Self::Null | Self::Scalar(_) | Self::Media(_) => None,
        }
    }

    /// Render as plain JSON for the store.
    pub fn to_json(&self) -> Value {
        match self {
            Self::Null => Value::Null,
            Self::Scalar(value) => value.clone(),
            Self::ScalarList(items) => Value::Array(items.clone()),
            Self::ToOneReferences(items) => {
                Value::Array(items.iter().map(Resolution::to_json).collect())
            }
            Self::ReferenceList(items) => Value::Array(
                items
                    .iter()
                    .map(|item| item.as_ref().map_or(Value::Null, Resolution::to_json))
                    .collect(),
            ),
            Self::Media(token) => token.to_json(),
            Self::MediaList(items) => Value::Array(
                items
                    .iter()
                    .map(|item| item.as_ref().map_or(Value::Null, ReferenceToken::to_json))
                    .collect(),
            ),
        }
    }
}

impl Serialize for FieldValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

/// Diagnostic for a field that was degraded to null.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldFault {
    /// Content type of the record
    pub type_name: String,
    /// Field name id
    pub field: String,
    /// Raw value that could not be transformed
    pub raw_value: Value,
    /// What went wrong
    pub error: FieldTransformError,
}

/// Transformed value of one field plus the fault, if it was degraded.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldOutcome {
    /// Value to put on the node
    pub value: FieldValue,
    /// Present when `value` is a degraded null
    pub fault: Option<FieldFault>,
}

impl FieldOutcome {
    /// Whether the field was degraded.
    pub fn is_degraded(&self) -> bool {
        self.fault.is_some()
    }
}

/// Transform one raw field value.
///
/// Absent or null values short-circuit to [`FieldValue::Null`] before
/// dispatch.
pub fn transform(
    field: &FieldDefinition,
    raw: Option<&Value>,
    resolver: &ReferenceResolver<'_>,
) -> Result<FieldValue, FieldTransformError> {
    let raw = match raw {
        None | Some(Value::Null) => return Ok(FieldValue::Null),
        Some(raw) => raw,
    };

    match (field.declared_type, field.is_list) {
        (FieldType::Scalar, false) => Ok(FieldValue::Scalar(raw.clone())),
        (FieldType::Reference, false) => {
            let resolutions = as_sequence(raw)?
                .iter()
                .map(|descriptor| resolver.resolve(descriptor))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(FieldValue::ToOneReferences(resolutions))
        }
        (FieldType::Media, false) => Ok(FieldValue::Media(resolver.resolve_media(raw)?)),
        (FieldType::Scalar, true) => Ok(FieldValue::ScalarList(as_sequence(raw)?.clone())),
        (FieldType::Reference, true) => {
            let resolutions = as_sequence(raw)?
                .iter()
                .map(|element| non_null(element, |d| resolver.resolve(d)))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(FieldValue::ReferenceList(resolutions))
        }
        (FieldType::Media, true) => {
            let tokens = as_sequence(raw)?
                .iter()
                .map(|element| non_null(element, |d| resolver.resolve_media(d)))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(FieldValue::MediaList(tokens))
        }
    }
}

/// Transform one field of a record, degrading faults to null.
pub fn transform_field(
    content_type: &ContentType,
    field: &FieldDefinition,
    raw: Option<&Value>,
    resolver: &ReferenceResolver<'_>,
) -> FieldOutcome {
    match transform(field, raw, resolver) {
        Ok(value) => FieldOutcome { value, fault: None },
        Err(error) => {
            let raw_value = raw.cloned().unwrap_or(Value::Null);
            warn!(
                type_name = %content_type.type_name,
                field = %field.name_id,
                raw_value = %raw_value,
                error = %error,
                "Field transform failed, degrading to null"
            );
            FieldOutcome {
                value: FieldValue::Null,
                fault: Some(FieldFault {
                    type_name: content_type.type_name.clone(),
                    field: field.name_id.clone(),
                    raw_value,
                    error,
                }),
            }
        }
    }
}

fn as_sequence(raw: &Value) -> Result<&Vec<Value>, FieldTransformError> {
    raw.as_array().ok_or(FieldTransformError::TypeMismatch {
        expected: "array",
        actual: json_kind(raw),
    })
}

fn non_null<T>(
    element: &Value,
    resolve: impl FnOnce(&Value) -> Result<T, FieldTransformError>,
) -> Result<Option<T>, FieldTransformError> {
    if element.is_null() {
        Ok(None)
    } else {
        resolve(element).map(Some)
    }
}
