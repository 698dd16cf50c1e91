//! Vector storage for chunk embeddings: a backend-agnostic [`VectorStore`]
//! trait with Qdrant and in-memory implementations.
//!
//! The store knows nothing about chunk semantics. Points are an id, a vector
//! and a JSON payload; search is cosine similarity with an optional score
//! floor.

pub mod in_memory_store;
pub mod qdrant_ops;
pub mod vector_store;

pub use in_memory_store::InMemoryVectorStore;
pub use qdrant_ops::QdrantOps;
pub use vector_store::{ScoredVectorPoint, VectorPoint, VectorStore, VectorStoreError};
