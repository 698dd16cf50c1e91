//! Ingestion pipeline: extract → embed → upsert.

use std::sync::Arc;

use serde::Serialize;
use specdex_llm::EmbedProvider;
use specdex_memory::{VectorPoint, VectorStore};
use uuid::Uuid;

use crate::chunk::DocumentChunk;
use crate::error::Result;
use crate::extract::{ExtractionReport, MarkdownExtractor, SpecExtractor};

/// Summary of one ingestion call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IngestReport {
    pub collection: String,
    pub chunks: usize,
    pub skipped: usize,
    pub batches: usize,
}

/// Stable point id for chunk `index` of `source_id`.
///
/// Re-ingesting the same source overwrites its points in place.
#[must_use]
pub fn point_id(source_id: &str, index: usize) -> String {
    Uuid::new_v5(&Uuid::NAMESPACE_OID, format!("{source_id}:{index}").as_bytes()).to_string()
}

pub struct Indexer<P: EmbedProvider> {
    store: Arc<dyn VectorStore>,
    provider: Arc<P>,
    spec: SpecExtractor,
    markdown: MarkdownExtractor,
    batch_size: usize,
}

impl<P: EmbedProvider> Indexer<P> {
    #[must_use]
    pub fn new(
        store: Arc<dyn VectorStore>,
        provider: Arc<P>,
        spec: SpecExtractor,
        markdown: MarkdownExtractor,
    ) -> Self {
        let batch_size = spec.config().batch_size.max(1);
        Self {
            store,
            provider,
            spec,
            markdown,
            batch_size,
        }
    }

    /// Extract, embed and store a parsed API specification.
    ///
    /// # Errors
    ///
    /// Returns an error if embedding or a store write fails. Batches written
    /// before the failure stay in the collection.
    pub async fn ingest_spec(
        &self,
        collection: &str,
        source_id: &str,
        spec: &serde_json::Value,
    ) -> Result<IngestReport> {
        let extraction = self.spec.extract(spec);
        tracing::info!(
            collection,
            source = source_id,
            chunks = extraction.chunks.len(),
            skipped = extraction.skipped,
            "spec extracted"
        );
        self.store_chunks(collection, source_id, extraction).await
    }

    /// Extract, embed and store a markdown document.
    ///
    /// # Errors
    ///
    /// Returns an error if embedding or a store write fails.
    pub async fn ingest_markdown(
        &self,
        collection: &str,
        source_id: &str,
        doc: &str,
    ) -> Result<IngestReport> {
        let extraction = self.markdown.extract(doc);
        tracing::info!(
            collection,
            source = source_id,
            chunks = extraction.chunks.len(),
            "markdown extracted"
        );
        self.store_chunks(collection, source_id, extraction).await
    }

    async fn store_chunks(
        &self,
        collection: &str,
        source_id: &str,
        extraction: ExtractionReport,
    ) -> Result<IngestReport> {
        let mut report = IngestReport {
            collection: collection.to_owned(),
            chunks: 0,
            skipped: extraction.skipped,
            batches: 0,
        };
        let mut collection_ready = false;

        for (batch_idx, batch) in extraction.chunks.chunks(self.batch_size).enumerate() {
            let offset = batch_idx * self.batch_size;
            let mut points = Vec::with_capacity(batch.len());
            for (i, chunk) in batch.iter().enumerate() {
                let vector = self.provider.embed(chunk.text()).await?;
                if !collection_ready {
                    let vector_size = u64::try_from(vector.len())?;
                    self.store.ensure_collection(collection, vector_size).await?;
                    collection_ready = true;
                }
                points.push(to_point(source_id, offset + i, chunk, vector));
            }

            self.store.upsert(collection, points).await?;
            report.batches += 1;
            report.chunks += batch.len();
            tracing::debug!(collection, batch = batch_idx, size = batch.len(), "batch stored");
        }

        tracing::info!(
            collection,
            source = source_id,
            chunks = report.chunks,
            batches = report.batches,
            "ingestion complete"
        );
        Ok(report)
    }
}

fn to_point(source_id: &str, index: usize, chunk: &DocumentChunk, vector: Vec<f32>) -> VectorPoint {
    let mut payload = chunk.to_payload();
    payload.insert("source".into(), source_id.into());
    payload.insert("chunk_index".into(), index.into());
    VectorPoint {
        id: point_id(source_id, index),
        vector,
        payload,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use specdex_llm::mock::MockProvider;
    use specdex_memory::InMemoryVectorStore;

    use super::*;
    use crate::chunk::ChunkConfig;
    use crate::extract::MarkdownConfig;
    use crate::tokens::TokenCounter;

    fn indexer(store: Arc<InMemoryVectorStore>, provider: MockProvider, batch_size: usize) -> Indexer<MockProvider> {
        let counter = TokenCounter::new().unwrap();
        let config = ChunkConfig {
            batch_size,
            ..ChunkConfig::default()
        };
        Indexer::new(
            store,
            Arc::new(provider),
            SpecExtractor::new(counter.clone(), config),
            MarkdownExtractor::new(counter, &MarkdownConfig::default()),
        )
    }

    fn spec() -> serde_json::Value {
        json!({
            "info": {"title": "Inventory", "version": "1"},
            "paths": {
                "/items": {
                    "get": {"operationId": "listItems", "responses": {"200": {"description": "ok"}}},
                    "post": {"operationId": "createItem", "responses": {"201": {"description": "created"}}}
                }
            }
        })
    }

    #[test]
    fn point_ids_are_stable_and_distinct() {
        assert_eq!(point_id("api.json", 3), point_id("api.json", 3));
        assert_ne!(point_id("api.json", 3), point_id("api.json", 4));
        assert_ne!(point_id("a.json", 0), point_id("b.json", 0));
        assert!(Uuid::parse_str(&point_id("api.json", 0)).is_ok());
    }

    #[tokio::test]
    async fn ingest_spec_batches_and_counts() {
        let store = Arc::new(InMemoryVectorStore::new());
        let idx = indexer(store.clone(), MockProvider::default(), 2);
        let report = idx.ingest_spec("api", "inventory.json", &spec()).await.unwrap();

        // info + 2 × (metadata, responses)
        assert_eq!(report.chunks, 5);
        assert_eq!(report.batches, 3);
        assert_eq!(report.skipped, 0);
        assert_eq!(store.count("api").await.unwrap(), 5);
    }

    #[tokio::test]
    async fn reingest_is_idempotent() {
        let store = Arc::new(InMemoryVectorStore::new());
        let idx = indexer(store.clone(), MockProvider::default(), 100);
        idx.ingest_spec("api", "inventory.json", &spec()).await.unwrap();
        let first = store.count("api").await.unwrap();
        idx.ingest_spec("api", "inventory.json", &spec()).await.unwrap();
        assert_eq!(store.count("api").await.unwrap(), first);
    }

    #[tokio::test]
    async fn payload_carries_chunk_and_source() {
        let store = Arc::new(InMemoryVectorStore::new());
        let provider = MockProvider::default();
        let probe = provider.vectorize("Endpoint: GET /items");
        let idx = indexer(store.clone(), provider, 100);
        idx.ingest_spec("api", "inventory.json", &spec()).await.unwrap();

        let hits = store.search("api", probe, 10, None).await.unwrap();
        let chunk = hits
            .iter()
            .filter_map(|h| DocumentChunk::from_payload(&h.payload))
            .find(|c| c.meta("operation_id") == Some("listItems"))
            .unwrap();
        assert_eq!(chunk.meta("source"), Some("inventory.json"));
        assert!(chunk.meta("chunk_index").is_some());
    }

    #[tokio::test]
    async fn embed_failure_propagates_before_any_write() {
        let store = Arc::new(InMemoryVectorStore::new());
        let idx = indexer(store.clone(), MockProvider::failing(), 100);
        let err = idx.ingest_spec("api", "inventory.json", &spec()).await;
        assert!(matches!(err, Err(crate::error::IndexError::Embedding(_))));
        assert!(!store.collection_exists("api").await.unwrap());
    }

    #[tokio::test]
    async fn markdown_ingestion_stores_learning_chunk() {
        let store = Arc::new(InMemoryVectorStore::new());
        let idx = indexer(store.clone(), MockProvider::default(), 100);
        let report = idx
            .ingest_markdown("notes", "guide.md", "# Guide\nShort but useful notes.")
            .await
            .unwrap();
        assert_eq!(report.chunks, 1);
        assert_eq!(store.count("notes").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn empty_extraction_writes_nothing() {
        let store = Arc::new(InMemoryVectorStore::new());
        let idx = indexer(store.clone(), MockProvider::default(), 100);
        let report = idx.ingest_markdown("notes", "empty.md", "").await.unwrap();
        assert_eq!(report.chunks, 0);
        assert_eq!(report.batches, 0);
        assert!(!store.collection_exists("notes").await.unwrap());
    }
}
