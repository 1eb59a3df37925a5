//! Sync orchestration.
//!
//! A run moves through fixed phases:
//!
//! ```text
//! SchemaLoading ──► MediaLoading ──► EntryLoading ──► Done
//! ```
//!
//! Each phase is a separate state that can only be produced by finishing the
//! previous one, so entries are never built before every collection they
//! may reference (including the media collection) is registered.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::backend::{ContentBackend, RawRecord};
use crate::config::SourceConfig;
use crate::error::SourceError;
use crate::loader::SchemaLoader;
use crate::node::NodeBuilder;
use crate::schema::{ContentType, Schema};
use crate::store::{CollectionHandle, NodeStore};
use crate::transform::FieldFault;

/// Phase of a sync run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    SchemaLoading,
    MediaLoading,
    EntryLoading,
    Done,
}

impl Phase {
    /// Get as string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SchemaLoading => "schema_loading",
            Self::MediaLoading => "media_loading",
            Self::EntryLoading => "entry_loading",
            Self::Done => "done",
        }
    }
}

/// Summary of a finished run.
#[derive(Debug, Clone)]
pub struct SyncReport {
    /// Unique id of this run
    pub run_id: String,
    /// Site that was loaded
    pub site_id: String,
    /// When the run started
    pub started_at: DateTime<Utc>,
    /// When the run reached `Done`
    pub finished_at: Option<DateTime<Utc>>,
    /// Phases entered, in order
    pub phases: Vec<Phase>,
    /// Nodes emitted per collection, in emission order
    pub nodes_emitted: Vec<(String, usize)>,
    /// Fields degraded to null
    pub faults: Vec<FieldFault>,
    /// Records that could not become nodes
    pub skipped_records: usize,
}

impl SyncReport {
    fn new(site_id: &str) -> Self {
        Self {
            run_id: uuid::Uuid::new_v4().to_string(),
            site_id: site_id.to_string(),
            started_at: Utc::now(),
            finished_at: None,
            phases: Vec::new(),
            nodes_emitted: Vec::new(),
            faults: Vec::new(),
            skipped_records: 0,
        }
    }

    fn enter(&mut self, phase: Phase) {
        info!(run_id = %self.run_id, phase = phase.as_str(), "Entering phase");
        self.phases.push(phase);
    }

    /// Nodes emitted into one collection.
    pub fn emitted(&self, type_name: &str) -> usize {
        self.nodes_emitted
            .iter()
            .find(|(name, _)| name == type_name)
            .map(|(_, count)| *count)
            .unwrap_or(0)
    }

    /// Nodes emitted across all collections.
    pub fn total_nodes(&self) -> usize {
        self.nodes_emitted.iter().map(|(_, count)| count).sum()
    }

    /// Whether the run reached `Done`.
    pub fn is_complete(&self) -> bool {
        self.phases.last() == Some(&Phase::Done)
    }
}

/// Collaborators shared by every phase.
#[derive(Clone, Copy)]
struct RunContext<'a> {
    backend: &'a dyn ContentBackend,
    store: &'a dyn NodeStore,
    config: &'a SourceConfig,
}

impl<'a> RunContext<'a> {
    /// Build and emit one node per record.
    ///
    /// A record whose id was already emitted into the collection is skipped.
    async fn emit_all(
        &self,
        builder: &NodeBuilder<'_>,
        content_type: &ContentType,
        collection: &CollectionHandle,
        records: Vec<RawRecord>,
        report: &mut SyncReport,
    ) -> Result<(), SourceError> {
        let mut emitted = 0;
        let mut seen = HashSet::new();

        for record in records {
            let built = match builder.build(content_type, &record) {
                Ok(built) => built,
                Err(e) => {
                    warn!(type_name = %content_type.type_name, error = %e, "Skipping record");
                    report.skipped_records += 1;
                    continue;
                }
            };

            if !seen.insert(built.node.id.clone()) {
                warn!(
                    type_name = %content_type.type_name,
                    id = %built.node.id,
                    "Skipping repeated record"
                );
                report.skipped_records += 1;
                continue;
            }

            debug!(
                type_name = %content_type.type_name,
                id = %built.node.id,
                degraded = built.faults.len(),
                "Emitting node"
            );

            report.faults.extend(built.faults);
            self.store.add_node(collection, built.node).await?;
            emitted += 1;
        }

        report
            .nodes_emitted
            .push((content_type.type_name.clone(), emitted));
        Ok(())
    }
}

struct SchemaLoading<'a> {
    ctx: RunContext<'a>,
}

struct MediaLoading<'a> {
    ctx: RunContext<'a>,
    schema: Schema,
}

struct EntryLoading<'a> {
    ctx: RunContext<'a>,
    schema: Schema,
}

impl<'a> SchemaLoading<'a> {
    async fn run(self, report: &mut SyncReport) -> Result<MediaLoading<'a>, SourceError> {
        report.enter(Phase::SchemaLoading);

        let loader = SchemaLoader::new(self.ctx.backend, self.ctx.store, self.ctx.config.type_name.clone());
        let schema = loader.load(&self.ctx.config.site_id).await?;

        info!(content_types = schema.len(), "Schema ready");
        Ok(MediaLoading {
            ctx: self.ctx,
            schema,
        })
    }
}

impl<'a> MediaLoading<'a> {
    async fn run(self, report: &mut SyncReport) -> Result<EntryLoading<'a>, SourceError> {
        report.enter(Phase::MediaLoading);

        let media_type = self.schema.media_type();
        self.ctx.store.register_collection(&media_type.type_name).await?;
        let collection = self.ctx.store.collection(&media_type.type_name).await?;

        let records = self
            .ctx
            .backend
            .list_media_items(&self.ctx.config.site_id)
            .await?;
        info!(count = records.len(), "Loaded media items");

        let builder = NodeBuilder::new(&self.schema, self.ctx.store);
        self.ctx
            .emit_all(&builder, media_type, &collection, records, report)
            .await?;

        Ok(EntryLoading {
            ctx: self.ctx,
            schema: self.schema,
        })
    }
}

impl<'a> EntryLoading<'a> {
    async fn run(self, report: &mut SyncReport) -> Result<(), SourceError> {
        report.enter(Phase::EntryLoading);

        let builder = NodeBuilder::new(&self.schema, self.ctx.store);
        for content_type in self.schema.content_types() {
            let collection = self.ctx.store.collection(&content_type.type_name).await?;
            let records = self
                .ctx
                .backend
                .list_records(&content_type.source_table_id)
                .await?;

            info!(type_name = %content_type.type_name, count = records.len(), "Loaded entries");
            self.ctx
                .emit_all(&builder, content_type, &collection, records, report)
                .await?;
        }

        Ok(())
    }
}

/// Single entry point for a sync run.
pub struct SourceOrchestrator<'a> {
    backend: &'a dyn ContentBackend,
    store: &'a dyn NodeStore,
    config: &'a SourceConfig,
}

impl<'a> SourceOrchestrator<'a> {
    /// Create an orchestrator over the given collaborators.
    pub fn new(
        backend: &'a dyn ContentBackend,
        store: &'a dyn NodeStore,
        config: &'a SourceConfig,
    ) -> Self {
        Self {
            backend,
            store,
            config,
        }
    }

    /// Run every phase to completion.
    ///
    /// Returns on the first fatal error; nodes already emitted stay in the
    /// store.
    pub async fn run(&self) -> Result<SyncReport, SourceError> {
        self.config.validate()?;

        let mut report = SyncReport::new(&self.config.site_id);
        info!(
            run_id = %report.run_id,
            site_id = %self.config.site_id,
            backend = self.backend.id(),
            "Starting sync"
        );

        let ctx = RunContext {
            backend: self.backend,
            store: self.store,
            config: self.config,
        };

        let media = SchemaLoading { ctx }.run(&mut report).await?;
        let entries = media.run(&mut report).await?;
        entries.run(&mut report).await?;

        report.enter(Phase::Done);
        report.finished_at = Some(Utc::now());

        info!(
            run_id = %report.run_id,
            nodes = report.total_nodes(),
            degraded_fields = report.faults.len(),
            skipped = report.skipped_records,
            "Sync complete"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{MockBackend, RawContentType, RawField};
    use crate::error::SchemaLoadError;
    use crate::store::MemoryStore;
    use serde_json::{json, Value};

    const T1: &str = "2024-03-01T10:00:00.000Z";
    const T2: &str = "2024-03-02T11:30:00.000Z";

    fn record(value: Value) -> RawRecord {
        value.as_object().cloned().unwrap()
    }

    fn config() -> SourceConfig {
        SourceConfig::new("http://localhost:1337/parse", "app", "key", "site").with_type_name("Site")
    }

    fn backend(author_table: &str) -> MockBackend {
        MockBackend::new("site")
            .with_content_type(
                RawContentType::new("m-post", "Post", "t_post"),
                vec![
                    RawField::new("title", "Title", "Short Text").required(),
                    RawField::new("author", "Author", "Reference"),
                    RawField::new("cover", "Cover", "Media"),
                ],
            )
            .with_content_type(
                RawContentType::new("m-author", "Author", "t_author"),
                vec![RawField::new("name", "Name", "Short Text").required()],
            )
            .with_content_type(RawContentType::new("m-empty", "Empty", "t_empty"), vec![])
            .with_media_item(record(json!({
                "id": "img1",
                "name": "cover.png",
                "type": "image/png",
                "size": 1024,
                "file": {"__type": "File", "name": "cover.png", "url": "https://files/cover.png"},
                "createdAt": T1,
                "updatedAt": T1,
            })))
            .with_record(
                "t_post",
                record(json!({
                    "id": "r1",
                    "title": "Hello",
                    "author": [{"table": author_table, "id": "a1"}],
                    "cover": {"__type": "Pointer", "className": "MediaItem", "objectId": "img1"},
                    "createdAt": T1,
                    "updatedAt": T2,
                    "t__status": "Published",
                })),
            )
            .with_record(
                "t_post",
                record(json!({"id": "r2", "title": "Draft", "t__status": "Draft"})),
            )
            .with_record(
                "t_author",
                record(json!({"id": "a1", "name": "Ada", "createdAt": T1, "updatedAt": T1, "t__status": "Published"})),
            )
            .with_record(
                "t_empty",
                record(json!({"id": "e1", "createdAt": T1, "updatedAt": T2, "t__status": "Published"})),
            )
    }

    #[tokio::test]
    async fn test_end_to_end_resolved_reference() {
        let backend = backend("t_author");
        let store = MemoryStore::new();
        let config = config();

        let report = SourceOrchestrator::new(&backend, &store, &config)
            .run()
            .await
            .unwrap();

        assert!(report.is_complete());
        assert_eq!(
            report.phases,
            vec![Phase::SchemaLoading, Phase::MediaLoading, Phase::EntryLoading, Phase::Done]
        );
        assert_eq!(report.emitted("SitePost"), 1);
        assert_eq!(report.emitted("SiteAuthor"), 1);
        assert_eq!(report.emitted("SiteMediaItem"), 1);
        assert!(report.faults.is_empty());

        let post = store.node("SitePost", "r1").await.unwrap();
        assert_eq!(
            post.to_json(),
            json!({
                "id": "r1",
                "title": "Hello",
                "date": T1,
                "createdAt": T1,
                "updatedAt": T2,
                "author": [{"typeName": "SiteAuthor", "id": "a1"}],
                "cover": {"typeName": "SiteMediaItem", "id": "img1"},
            })
        );

        let media = store.node("SiteMediaItem", "img1").await.unwrap();
        assert_eq!(media.title, json!("cover.png"));
    }

    #[tokio::test]
    async fn test_end_to_end_unresolved_reference() {
        let backend = backend("t_unknown");
        let store = MemoryStore::new();
        let config = config();

        let report = SourceOrchestrator::new(&backend, &store, &config)
            .run()
            .await
            .unwrap();

        assert!(report.is_complete());
        let post = store.node("SitePost", "r1").await.unwrap();
        assert_eq!(post.to_json()["author"], json!([{"unresolved": true}]));
    }

    #[tokio::test]
    async fn test_zero_field_type_emits_metadata_only_nodes() {
        let backend = backend("t_author");
        let store = MemoryStore::new();
        let config = config();

        SourceOrchestrator::new(&backend, &store, &config)
            .run()
            .await
            .unwrap();

        let node = store.node("SiteEmpty", "e1").await.unwrap();
        assert_eq!(
            node.to_json(),
            json!({"id": "e1", "title": null, "date": T1, "createdAt": T1, "updatedAt": T2})
        );
    }

    #[tokio::test]
    async fn test_phases_run_in_order() {
        let backend = backend("t_author");
        let store = MemoryStore::new();
        let config = config();

        SourceOrchestrator::new(&backend, &store, &config)
            .run()
            .await
            .unwrap();

        let calls = backend.calls();
        let media_call = calls.iter().position(|c| c == "media:site").unwrap();
        let last_field_call = calls.iter().rposition(|c| c.starts_with("fields:")).unwrap();
        let first_record_call = calls.iter().position(|c| c.starts_with("records:")).unwrap();
        assert!(last_field_call < media_call);
        assert!(media_call < first_record_call);

        let record_calls: Vec<_> = calls.iter().filter(|c| c.starts_with("records:")).collect();
        assert_eq!(record_calls, vec!["records:t_post", "records:t_author", "records:t_empty"]);

        assert_eq!(
            store.collections().await,
            vec!["SitePost", "SiteAuthor", "SiteEmpty", "SiteMediaItem"]
        );
        let emissions = store.emission_log().await;
        assert_eq!(emissions[0], "SiteMediaItem");
    }

    #[tokio::test]
    async fn test_degraded_fields_are_reported() {
        let backend = MockBackend::new("site")
            .with_content_type(
                RawContentType::new("m-post", "Post", "t_post"),
                vec![
                    RawField::new("title", "Title", "Short Text").required(),
                    RawField::new("tags", "Tags", "Reference").list(),
                ],
            )
            .with_record(
                "t_post",
                record(json!({"id": "r1", "title": "Hi", "tags": 42, "t__status": "Published"})),
            )
            .with_record(
                "t_post",
                record(json!({"title": "No id", "t__status": "Published"})),
            );
        let store = MemoryStore::new();
        let config = config();

        let report = SourceOrchestrator::new(&backend, &store, &config)
            .run()
            .await
            .unwrap();

        assert!(report.is_complete());
        assert_eq!(report.faults.len(), 1);
        assert_eq!(report.faults[0].field, "tags");
        assert_eq!(report.faults[0].raw_value, json!(42));
        assert_eq!(report.skipped_records, 1);
        assert_eq!(report.emitted("SitePost"), 1);

        let node = store.node("SitePost", "r1").await.unwrap();
        assert_eq!(node.to_json()["tags"], Value::Null);
    }

    #[tokio::test]
    async fn test_repeated_record_is_skipped() {
        let backend = backend("t_author").with_record(
            "t_author",
            record(json!({"id": "a1", "name": "Ada again", "t__status": "Published"})),
        );
        let store = MemoryStore::new();
        let config = config();

        let report = SourceOrchestrator::new(&backend, &store, &config)
            .run()
            .await
            .unwrap();

        assert!(report.is_complete());
        assert_eq!(report.emitted("SiteAuthor"), 1);
        assert_eq!(report.skipped_records, 1);

        let author = store.node("SiteAuthor", "a1").await.unwrap();
        assert_eq!(author.title, json!("Ada"));
    }

    #[tokio::test]
    async fn test_schema_failure_stops_run() {
        let backend = backend("t_author").with_failing_fields("m-post");
        let store = MemoryStore::new();
        let config = config();

        let err = SourceOrchestrator::new(&backend, &store, &config)
            .run()
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            SourceError::SchemaLoad(SchemaLoadError::Fields { .. })
        ));
        assert!(!backend.calls().iter().any(|c| c.starts_with("media:")));
        assert_eq!(store.node_count().await, 0);
    }

    #[tokio::test]
    async fn test_invalid_config_never_starts() {
        let backend = backend("t_author");
        let store = MemoryStore::new();
        let config = SourceConfig::new("http://localhost:1337/parse", "app", "key", "");

        let err = SourceOrchestrator::new(&backend, &store, &config)
            .run()
            .await
            .unwrap_err();

        assert!(matches!(err, SourceError::Configuration(_)));
        assert!(backend.calls().is_empty());
    }
}
