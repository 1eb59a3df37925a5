//! Mock content backend for testing.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use super::traits::*;

/// Mock backend for testing.
///
/// Holds a fixed site layout in memory and applies the same filters a real
/// backend does (enabled fields only, published records only).
pub struct MockBackend {
    site_id: String,
    available: AtomicBool,
    content_types: Vec<RawContentType>,
    fields: HashMap<String, Vec<RawField>>,
    media: Vec<RawRecord>,
    records: HashMap<String, Vec<RawRecord>>,
    failing_models: HashSet<String>,
    field_latency: Option<Duration>,
    calls: Mutex<Vec<String>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl MockBackend {
    /// Create an empty mock backend serving `site_id`.
    pub fn new(site_id: impl Into<String>) -> Self {
        Self {
            site_id: site_id.into(),
            available: AtomicBool::new(true),
            content_types: Vec::new(),
            fields: HashMap::new(),
            media: Vec::new(),
            records: HashMap::new(),
            failing_models: HashSet::new(),
            field_latency: None,
            calls: Mutex::new(Vec::new()),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    /// Add a content type with its fields.
    pub fn with_content_type(mut self, content_type: RawContentType, fields: Vec<RawField>) -> Self {
        self.fields.insert(content_type.id.clone(), fields);
        self.content_types.push(content_type);
        self
    }

    /// Add a media item.
    pub fn with_media_item(mut self, record: RawRecord) -> Self {
        self.media.push(record);
        self
    }

    /// Add a record to a table.
    pub fn with_record(mut self, table_id: impl Into<String>, record: RawRecord) -> Self {
        self.records.entry(table_id.into()).or_default().push(record);
        self
    }

    /// Make field listing fail for one model.
    pub fn with_failing_fields(mut self, model_id: impl Into<String>) -> Self {
        self.failing_models.insert(model_id.into());
        self
    }

    /// Delay every field listing by `latency`.
    pub fn with_field_latency(mut self, latency: Duration) -> Self {
        self.field_latency = Some(latency);
        self
    }

    /// Set availability.
    pub fn with_available(self, available: bool) -> Self {
        self.available.store(available, Ordering::SeqCst);
        self
    }

    /// Calls made so far, in order (e.g. `"records:t_post"`).
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    /// Highest number of field listings that were in flight at once.
    pub fn max_concurrent_field_fetches(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    fn record_call(&self, call: String) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(call);
        }
    }

    fn check_available(&self) -> Result<(), BackendError> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(BackendError::Unavailable("Mock backend disabled".to_string()))
        }
    }
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new("mock-site")
    }
}

#[async_trait]
impl ContentBackend for MockBackend {
    fn id(&self) -> &str {
        "mock"
    }

    async fn list_content_types(&self, site_id: &str) -> Result<Vec<RawContentType>, BackendError> {
        self.record_call(format!("content_types:{}", site_id));
        self.check_available()?;

        if site_id != self.site_id {
            return Ok(Vec::new());
        }
        Ok(self.content_types.clone())
    }

    async fn list_field_definitions(&self, model_id: &str) -> Result<Vec<RawField>, BackendError> {
        self.record_call(format!("fields:{}", model_id));
        self.check_available()?;

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        if let Some(latency) = self.field_latency {
            tokio::time::sleep(latency).await;
        }

        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.failing_models.contains(model_id) {
            return Err(BackendError::Server {
                status: 500,
                message: format!("field query failed for {}", model_id),
            });
        }

        Ok(self
            .fields
            .get(model_id)
            .map(|fields| fields.iter().filter(|f| !f.is_disabled).cloned().collect())
            .unwrap_or_default())
    }

    async fn list_media_items(&self, site_id: &str) -> Result<Vec<RawRecord>, BackendError> {
        self.record_call(format!("media:{}", site_id));
        self.check_available()?;

        if site_id != self.site_id {
            return Ok(Vec::new());
        }
        Ok(self.media.clone())
    }

    async fn list_records(&self, table_id: &str) -> Result<Vec<RawRecord>, BackendError> {
        self.record_call(format!("records:{}", table_id));
        self.check_available()?;

        Ok(self
            .records
            .get(table_id)
            .map(|records| {
                records
                    .iter()
                    .filter(|r| r.get(STATUS_KEY).and_then(|s| s.as_str()) == Some(PUBLISHED))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: serde_json::Value) -> RawRecord {
        value.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn test_mock_filters_disabled_fields() {
        let backend = MockBackend::new("site").with_content_type(
            RawContentType::new("m1", "Post", "t_post"),
            vec![
                RawField::new("title", "Title", "Short Text"),
                RawField::new("legacy", "Legacy", "Short Text").disabled(),
            ],
        );

        let fields = backend.list_field_definitions("m1").await.unwrap();
        assert_eq!(fields.len(), 1);
        assert_eq!(fields[0].name_id, "title");
    }

    #[tokio::test]
    async fn test_mock_returns_only_published_records() {
        let backend = MockBackend::new("site")
            .with_record("t_post", record(json!({"id": "p1", "t__status": "Published"})))
            .with_record("t_post", record(json!({"id": "p2", "t__status": "Draft"})));

        let records = backend.list_records("t_post").await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0]["id"], "p1");
        assert_eq!(backend.calls(), vec!["records:t_post".to_string()]);
    }

    #[tokio::test]
    async fn test_mock_scopes_by_site() {
        let backend = MockBackend::new("site")
            .with_content_type(RawContentType::new("m1", "Post", "t_post"), vec![]);

        assert_eq!(backend.list_content_types("site").await.unwrap().len(), 1);
        assert!(backend.list_content_types("other").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_mock_unavailable() {
        let backend = MockBackend::default().with_available(false);

        let result = backend.list_content_types("mock-site").await;
        assert!(matches!(result, Err(BackendError::Unavailable(_))));
    }
}
