//! Parse Server REST backend.
//!
//! Reads the Chisel CMS data layout:
//! - `Model` rows (one per content type, scoped to a `Site`)
//! - `ModelField` rows (one per field, pointing at their `Model`)
//! - `MediaItem` rows (scoped to a `Site`)
//! - one table per model holding its entries, with a `t__status` column

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::debug;

use super::traits::*;
use crate::config::SourceConfig;
use crate::schema::MEDIA_ITEM_NAME;

const MODEL_CLASS: &str = "Model";
const MODEL_FIELD_CLASS: &str = "ModelField";
const SITE_CLASS: &str = "Site";

/// Total order for paging; `objectId` breaks `createdAt` ties.
const SORT_ORDER: &str = "createdAt,objectId";

const APP_ID_HEADER: &str = "x-parse-application-id";
const MASTER_KEY_HEADER: &str = "x-parse-master-key";

/// Parse REST backend.
pub struct ParseBackend {
    client: Client,
    server_url: String,
    page_size: usize,
}

/// Body of a Parse `GET /classes/{class}` response.
#[derive(Debug, Deserialize)]
struct QueryResponse {
    results: Option<Vec<RawRecord>>,
}

impl ParseBackend {
    /// Create a backend from validated settings.
    pub fn new(config: &SourceConfig) -> Result<Self, BackendError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            HeaderName::from_static(APP_ID_HEADER),
            header_value("app_id", &config.app_id)?,
        );
        headers.insert(
            HeaderName::from_static(MASTER_KEY_HEADER),
            header_value("master_key", &config.master_key)?,
        );

        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        Ok(Self {
            client,
            server_url: config.server_url.trim_end_matches('/').to_string(),
            page_size: config.page_size.max(1),
        })
    }

    /// Build the query URL for one page of a class.
    fn class_url(&self, class: &str, constraints: &Value, skip: usize) -> String {
        format!(
            "{}/classes/{}?where={}&limit={}&skip={}&order={}",
            self.server_url,
            urlencoding::encode(class),
            urlencoding::encode(&constraints.to_string()),
            self.page_size,
            skip,
            urlencoding::encode(SORT_ORDER)
        )
    }

    /// Fetch every row of `class` matching `constraints`, page by page.
    async fn query(&self, class: &str, constraints: Value) -> Result<Vec<RawRecord>, BackendError> {
        let mut rows = Vec::new();
        let mut skip = 0;

        loop {
            let url = self.class_url(class, &constraints, skip);
            let response = self.client.get(&url).send().await?;
            let page: QueryResponse = self.handle_response(response).await?;
            let results = page.results.ok_or_else(|| {
                BackendError::InvalidResponse(format!("{}: response has no results", class))
            })?;

            let count = results.len();
            rows.extend(results.into_iter().map(normalize_object_id));

            debug!(class, skip, count, "Fetched page");

            if count < self.page_size {
                break;
            }
            skip += count;
        }

        Ok(rows)
    }

    async fn handle_response<T: serde::de::DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, BackendError> {
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(BackendError::Server {
                status,
                message: body,
            });
        }

        let body = response.json().await?;
        Ok(body)
    }
}

/// A Parse pointer to `object_id` in `class`.
fn pointer(class: &str, object_id: &str) -> Value {
    json!({
        "__type": "Pointer",
        "className": class,
        "objectId": object_id,
    })
}

/// Parse calls the record id `objectId`; everything downstream expects `id`.
fn normalize_object_id(mut row: RawRecord) -> RawRecord {
    if let Some(id) = row.remove("objectId") {
        row.insert("id".to_string(), id);
    }
    row
}

fn header_value(name: &str, value: &str) -> Result<HeaderValue, BackendError> {
    HeaderValue::from_str(value)
        .map_err(|e| BackendError::InvalidSettings(format!("{}: {}", name, e)))
}

fn decode_rows<T: serde::de::DeserializeOwned>(rows: Vec<RawRecord>) -> Result<Vec<T>, BackendError> {
    rows.into_iter()
        .map(|row| serde_json::from_value(Value::Object(row)).map_err(BackendError::from))
        .collect()
}

#[async_trait]
impl ContentBackend for ParseBackend {
    fn id(&self) -> &str {
        &self.server_url
    }

    async fn list_content_types(&self, site_id: &str) -> Result<Vec<RawContentType>, BackendError> {
        let rows = self
            .query(MODEL_CLASS, json!({ "site": pointer(SITE_CLASS, site_id) }))
            .await?;
        decode_rows(rows)
    }

    async fn list_field_definitions(&self, model_id: &str) -> Result<Vec<RawField>, BackendError> {
        let rows = self
            .query(
                MODEL_FIELD_CLASS,
                json!({
                    "model": pointer(MODEL_CLASS, model_id),
                    "isDisabled": false,
                }),
            )
            .await?;
        decode_rows(rows)
    }

    async fn list_media_items(&self, site_id: &str) -> Result<Vec<RawRecord>, BackendError> {
        self.query(MEDIA_ITEM_NAME, json!({ "site": pointer(SITE_CLASS, site_id) }))
            .await
    }

    async fn list_records(&self, table_id: &str) -> Result<Vec<RawRecord>, BackendError> {
        self.query(table_id, json!({ STATUS_KEY: PUBLISHED })).await
    }
}
