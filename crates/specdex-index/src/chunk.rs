//! Chunk model shared by extractors, the indexer, and the query engine.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::tokens::TokenCounter;

/// Semantic tag of a chunk. Serialized as `snake_case` into stored payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChunkType {
    Info,
    Servers,
    Tags,
    ExternalDocs,
    PathMetadata,
    PathParameters,
    OperationMetadata,
    OperationParameters,
    OperationRequestBody,
    OperationResponses,
    SchemaSummary,
    SchemaProperties,
    Components,
    /// Synthesized at query time, never stored.
    EndpointSummary,
    Learning,
}

impl ChunkType {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Servers => "servers",
            Self::Tags => "tags",
            Self::ExternalDocs => "external_docs",
            Self::PathMetadata => "path_metadata",
            Self::PathParameters => "path_parameters",
            Self::OperationMetadata => "operation_metadata",
            Self::OperationParameters => "operation_parameters",
            Self::OperationRequestBody => "operation_request_body",
            Self::OperationResponses => "operation_responses",
            Self::SchemaSummary => "schema_summary",
            Self::SchemaProperties => "schema_properties",
            Self::Components => "components",
            Self::EndpointSummary => "endpoint_summary",
            Self::Learning => "learning",
        }
    }

    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        serde_json::from_value(serde_json::Value::String(s.to_owned())).ok()
    }

    /// Per-type relevance prior applied multiplicatively at rerank time.
    #[must_use]
    pub fn default_weight(self) -> f32 {
        match self {
            Self::Info => 1.3,
            Self::OperationMetadata => 1.2,
            Self::SchemaSummary => 1.1,
            Self::OperationResponses => 0.9,
            _ => 1.0,
        }
    }

    /// Overview chunks, as opposed to field-level detail.
    #[must_use]
    pub fn is_summary(self) -> bool {
        matches!(
            self,
            Self::Info
                | Self::PathMetadata
                | Self::OperationMetadata
                | Self::SchemaSummary
                | Self::EndpointSummary
        )
    }
}

impl std::fmt::Display for ChunkType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Chunking limits for structured specifications.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkConfig {
    pub max_tokens: usize,
    pub overlap_percentage: f32,
    pub min_tokens: usize,
    pub batch_size: usize,
    pub prune_vendor_extensions: bool,
}

impl Default for ChunkConfig {
    fn default() -> Self {
        Self {
            max_tokens: 800,
            overlap_percentage: 0.15,
            min_tokens: 50,
            batch_size: 100,
            prune_vendor_extensions: true,
        }
    }
}

impl ChunkConfig {
    /// Overlap budget in tokens: `overlap_percentage * max_tokens`, rounded down.
    #[must_use]
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    pub fn overlap_tokens(&self) -> usize {
        (f64::from(self.overlap_percentage) * self.max_tokens as f64).floor() as usize
    }
}

const KEY_TEXT: &str = "text";
const KEY_CHUNK_TYPE: &str = "chunk_type";
const KEY_TOKEN_COUNT: &str = "token_count";
const KEY_SEMANTIC_WEIGHT: &str = "semantic_weight";

/// A bounded, typed span of extracted text.
///
/// Immutable once built: `token_count` is computed from `text` at
/// construction and cannot drift from it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocumentChunk {
    text: String,
    chunk_type: ChunkType,
    metadata: BTreeMap<String, String>,
    token_count: usize,
    semantic_weight: f32,
}

impl DocumentChunk {
    /// Build a chunk with the type's default weight.
    #[must_use]
    pub fn new(
        counter: &TokenCounter,
        text: String,
        chunk_type: ChunkType,
        metadata: BTreeMap<String, String>,
    ) -> Self {
        Self::with_weight(counter, text, chunk_type, metadata, chunk_type.default_weight())
    }

    #[must_use]
    pub fn with_weight(
        counter: &TokenCounter,
        text: String,
        chunk_type: ChunkType,
        metadata: BTreeMap<String, String>,
        semantic_weight: f32,
    ) -> Self {
        let token_count = counter.count(&text);
        Self {
            text,
            chunk_type,
            metadata,
            token_count,
            semantic_weight,
        }
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn chunk_type(&self) -> ChunkType {
        self.chunk_type
    }

    #[must_use]
    pub fn metadata(&self) -> &BTreeMap<String, String> {
        &self.metadata
    }

    #[must_use]
    pub fn meta(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).map(String::as_str)
    }

    #[must_use]
    pub fn token_count(&self) -> usize {
        self.token_count
    }

    #[must_use]
    pub fn semantic_weight(&self) -> f32 {
        self.semantic_weight
    }

    /// Flatten into a store payload: the four chunk fields plus every
    /// metadata entry as a top-level string.
    #[must_use]
    pub fn to_payload(&self) -> HashMap<String, serde_json::Value> {
        let mut payload: HashMap<String, serde_json::Value> = self
            .metadata
            .iter()
            .map(|(k, v)| (k.clone(), serde_json::Value::String(v.clone())))
            .collect();
        payload.insert(KEY_TEXT.into(), self.text.clone().into());
        payload.insert(KEY_CHUNK_TYPE.into(), self.chunk_type.as_str().into());
        payload.insert(KEY_TOKEN_COUNT.into(), self.token_count.into());
        payload.insert(KEY_SEMANTIC_WEIGHT.into(), f64::from(self.semantic_weight).into());
        payload
    }

    /// Rebuild a chunk from a stored payload.
    ///
    /// Returns `None` when the payload has no non-empty `text`. Missing or
    /// unknown `chunk_type` falls back to [`ChunkType::Learning`]; missing
    /// weight falls back to the type default. `text` is kept verbatim so the
    /// stored `token_count`, written at ingestion time, still describes it.
    #[must_use]
    pub fn from_payload(payload: &HashMap<String, serde_json::Value>) -> Option<Self> {
        let text = payload.get(KEY_TEXT)?.as_str()?;
        if text.trim().is_empty() {
            return None;
        }
        let chunk_type = payload
            .get(KEY_CHUNK_TYPE)
            .and_then(serde_json::Value::as_str)
            .and_then(ChunkType::parse)
            .unwrap_or(ChunkType::Learning);
        let token_count = payload
            .get(KEY_TOKEN_COUNT)
            .and_then(serde_json::Value::as_u64)
            .and_then(|n| usize::try_from(n).ok())
            .unwrap_or(0);
        #[allow(clippy::cast_possible_truncation)]
        let semantic_weight = payload
            .get(KEY_SEMANTIC_WEIGHT)
            .and_then(serde_json::Value::as_f64)
            .map_or_else(|| chunk_type.default_weight(), |w| w as f32);

        let metadata = payload
            .iter()
            .filter(|(k, _)| {
                !matches!(
                    k.as_str(),
                    KEY_TEXT | KEY_CHUNK_TYPE | KEY_TOKEN_COUNT | KEY_SEMANTIC_WEIGHT
                )
            })
            .filter_map(|(k, v)| {
                let value = match v {
                    serde_json::Value::String(s) => s.clone(),
                    serde_json::Value::Number(n) => n.to_string(),
                    serde_json::Value::Bool(b) => b.to_string(),
                    _ => return None,
                };
                Some((k.clone(), value))
            })
            .collect();

        Some(Self {
            text: text.to_owned(),
            chunk_type,
            metadata,
            token_count,
            semantic_weight,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counter() -> TokenCounter {
        TokenCounter::new().unwrap()
    }

    #[test]
    fn token_count_matches_counter() {
        let c = counter();
        let chunk = DocumentChunk::new(
            &c,
            "Endpoint: GET /pets".into(),
            ChunkType::OperationMetadata,
            BTreeMap::new(),
        );
        assert_eq!(chunk.token_count(), c.count("Endpoint: GET /pets"));
        assert!((chunk.semantic_weight() - 1.2).abs() < f32::EPSILON);
    }

    #[test]
    fn default_weights() {
        assert!((ChunkType::Info.default_weight() - 1.3).abs() < f32::EPSILON);
        assert!((ChunkType::SchemaSummary.default_weight() - 1.1).abs() < f32::EPSILON);
        assert!((ChunkType::OperationResponses.default_weight() - 0.9).abs() < f32::EPSILON);
        assert!((ChunkType::Learning.default_weight() - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn chunk_type_string_forms_agree_with_serde() {
        for ty in [
            ChunkType::Info,
            ChunkType::ExternalDocs,
            ChunkType::OperationRequestBody,
            ChunkType::SchemaProperties,
            ChunkType::EndpointSummary,
        ] {
            let via_serde = serde_json::to_value(ty).unwrap();
            assert_eq!(via_serde.as_str(), Some(ty.as_str()));
            assert_eq!(ChunkType::parse(ty.as_str()), Some(ty));
        }
        assert_eq!(ChunkType::parse("bogus"), None);
    }

    #[test]
    fn payload_round_trip_keeps_metadata() {
        let c = counter();
        let metadata = BTreeMap::from([
            ("path".to_owned(), "/pets".to_owned()),
            ("method".to_owned(), "GET".to_owned()),
        ]);
        let chunk = DocumentChunk::new(
            &c,
            "Parameters for GET /pets".into(),
            ChunkType::OperationParameters,
            metadata,
        );
        let payload = chunk.to_payload();
        assert_eq!(payload["chunk_type"], "operation_parameters");
        assert_eq!(payload["path"], "/pets");

        let back = DocumentChunk::from_payload(&payload).unwrap();
        assert_eq!(back, chunk);
    }

    #[test]
    fn from_payload_without_text_is_none() {
        let payload = HashMap::from([("chunk_type".to_owned(), serde_json::json!("info"))]);
        assert!(DocumentChunk::from_payload(&payload).is_none());
        let blank = HashMap::from([("text".to_owned(), serde_json::json!("   "))]);
        assert!(DocumentChunk::from_payload(&blank).is_none());
    }

    #[test]
    fn from_payload_keeps_stored_text_and_count_together() {
        let payload = HashMap::from([
            ("text".to_owned(), serde_json::json!("  padded text \n")),
            ("chunk_type".to_owned(), serde_json::json!("learning")),
            ("token_count".to_owned(), serde_json::json!(5)),
        ]);
        let chunk = DocumentChunk::from_payload(&payload).unwrap();
        assert_eq!(chunk.text(), "  padded text \n");
        assert_eq!(chunk.token_count(), 5);
    }

    #[test]
    fn from_payload_defaults_unknown_type_to_learning() {
        let payload = HashMap::from([
            ("text".to_owned(), serde_json::json!("notes")),
            ("chunk_type".to_owned(), serde_json::json!("mystery")),
        ]);
        let chunk = DocumentChunk::from_payload(&payload).unwrap();
        assert_eq!(chunk.chunk_type(), ChunkType::Learning);
        assert!((chunk.semantic_weight() - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn overlap_tokens_from_percentage() {
        assert_eq!(ChunkConfig::default().overlap_tokens(), 120);
        let cfg = ChunkConfig {
            max_tokens: 10,
            overlap_percentage: 0.25,
            ..ChunkConfig::default()
        };
        assert_eq!(cfg.overlap_tokens(), 2);
    }

    #[test]
    fn summary_types() {
        assert!(ChunkType::OperationMetadata.is_summary());
        assert!(ChunkType::EndpointSummary.is_summary());
        assert!(!ChunkType::SchemaProperties.is_summary());
        assert!(!ChunkType::Learning.is_summary());
    }
}
