//! Token-aware chunking of API specifications and markdown, ingestion into a
//! vector store, and semantic retrieval.
//!
//! Extractors turn OpenAPI/Swagger trees and markdown into typed
//! [`DocumentChunk`]s bounded by [`TokenCounter`] counts; the [`Indexer`]
//! embeds and stores them; the [`QueryEngine`] answers queries with
//! heuristic reranking and a two-phase endpoint-then-field strategy.

pub mod chunk;
pub mod error;
pub mod extract;
pub mod indexer;
pub mod loader;
pub mod retriever;
pub mod tokens;
pub mod windower;

pub use chunk::{ChunkConfig, ChunkType, DocumentChunk};
pub use error::{IndexError, Result};
pub use extract::{ExtractionReport, MarkdownConfig, MarkdownExtractor, SpecExtractor};
pub use indexer::{IngestReport, Indexer};
pub use retriever::{QueryConfig, QueryEngine, QueryResponse, QueryResult, RerankWeights, format_results};
pub use tokens::TokenCounter;
pub use windower::ChunkWindower;
