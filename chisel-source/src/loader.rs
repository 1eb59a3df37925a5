//! Schema loading.
//!
//! Lists a site's content types, registers each with the store as it is
//! discovered, then fetches every type's fields concurrently and joins them
//! into an immutable [`Schema`].

use futures::future::try_join_all;
use tracing::{debug, info};

use crate::backend::{ContentBackend, RawContentType, RawField};
use crate::error::SchemaLoadError;
use crate::naming::TypeNameRegistry;
use crate::schema::{ContentType, FieldDefinition, FieldType, Schema, MEDIA_ITEM_NAME};
use crate::store::NodeStore;

/// Builds the schema for one site.
pub struct SchemaLoader<'a> {
    backend: &'a dyn ContentBackend,
    store: &'a dyn NodeStore,
    prefix: String,
}

impl<'a> SchemaLoader<'a> {
    /// Create a loader naming types with `prefix`.
    pub fn new(
        backend: &'a dyn ContentBackend,
        store: &'a dyn NodeStore,
        prefix: impl Into<String>,
    ) -> Self {
        Self {
            backend,
            store,
            prefix: prefix.into(),
        }
    }

    /// Load the full schema of `site_id`.
    ///
    /// Fails as a whole if listing types, any field query, or any
    /// registration fails.
    pub async fn load(&self, site_id: &str) -> Result<Schema, SchemaLoadError> {
        let raw_types = self
            .backend
            .list_content_types(site_id)
            .await
            .map_err(|source| SchemaLoadError::ContentTypes {
                site_id: site_id.to_string(),
                source,
            })?;

        info!(site_id, count = raw_types.len(), "Discovered content types");

        // Reserved for the media collection.
        let mut registry = TypeNameRegistry::new(self.prefix.clone());
        registry.claim(MEDIA_ITEM_NAME)?;

        let mut named = Vec::with_capacity(raw_types.len());
        for raw in raw_types {
            let type_name = registry.claim(&raw.name_id)?;
            self.store
                .register_collection(&type_name)
                .await
                .map_err(|source| SchemaLoadError::Registration {
                    type_name: type_name.clone(),
                    source,
                })?;
            debug!(type_name = %type_name, table = %raw.table_name, "Registered collection");
            named.push((raw, type_name));
        }

        let content_types =
            try_join_all(named.into_iter().map(|(raw, type_name)| self.load_content_type(raw, type_name)))
                .await?;

        Schema::new(&self.prefix, content_types)
    }

    async fn load_content_type(
        &self,
        raw: RawContentType,
        type_name: String,
    ) -> Result<ContentType, SchemaLoadError> {
        let raw_fields = self
            .backend
            .list_field_definitions(&raw.id)
            .await
            .map_err(|source| SchemaLoadError::Fields {
                type_name: type_name.clone(),
                source,
            })?;

        let fields: Vec<FieldDefinition> = raw_fields.into_iter().map(field_definition).collect();
        let content_type = ContentType::new(raw.id, raw.name_id, type_name, raw.table_name, fields);

        if content_type.is_degenerate() {
            info!(type_name = %content_type.type_name, "Content type has no enabled fields");
        } else {
            debug!(
                type_name = %content_type.type_name,
                fields = content_type.fields.len(),
                "Loaded fields"
            );
        }

        Ok(content_type)
    }
}

fn field_definition(raw: RawField) -> FieldDefinition {
    FieldDefinition {
        declared_type: FieldType::from_raw(&raw.field_type),
        name_id: raw.name_id,
        display_name: raw.name,
        is_list: raw.is_list,
        is_required: raw.is_required,
    }
}
