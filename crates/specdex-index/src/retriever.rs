//! Query engine: augmentation, over-fetch, heuristic rerank, hierarchical
//! filtering, and two-phase endpoint-then-field retrieval.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt::Write;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use specdex_llm::EmbedProvider;
use specdex_memory::{ScoredVectorPoint, VectorStore};

use crate::chunk::{ChunkType, DocumentChunk};
use crate::error::Result;
use crate::tokens::TokenCounter;

const MAX_AUGMENTED_QUERY_TOKENS: usize = 6;
const SHORT_QUERY_WORDS: usize = 3;
const SHORT_CHUNK_WORDS: usize = 10;
const LENGTH_BONUS_RANGE: std::ops::RangeInclusive<usize> = 50..=200;

const ENDPOINT_PHASE_SUFFIX: &str = "endpoint path operation method";
const FIELD_PHASE_SUFFIX: &str = "parameter request body schema properties field";

const FIELD_TYPES: [ChunkType; 5] = [
    ChunkType::OperationParameters,
    ChunkType::OperationRequestBody,
    ChunkType::OperationResponses,
    ChunkType::SchemaProperties,
    ChunkType::SchemaSummary,
];

/// Hand-tuned rerank adjustments added to `raw_score * semantic_weight`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RerankWeights {
    pub keyword_overlap: f32,
    pub intent_match: f32,
    pub summary_bonus: f32,
    pub length_bonus: f32,
    /// Subtracted from chunks under ten words.
    pub short_penalty: f32,
}

impl Default for RerankWeights {
    fn default() -> Self {
        Self {
            keyword_overlap: 0.15,
            intent_match: 0.10,
            summary_bonus: 0.05,
            length_bonus: 0.05,
            short_penalty: 0.10,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryConfig {
    pub weights: RerankWeights,
    /// Similarity floor passed to the store when over-fetching candidates.
    pub candidate_floor: f32,
    /// Reranked results below this score are never returned.
    pub min_semantic_score: f32,
    pub max_candidates: usize,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            weights: RerankWeights::default(),
            candidate_floor: 0.2,
            min_semantic_score: 0.1,
            max_candidates: 100,
        }
    }
}

/// Query intent inferred from trigger terms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryIntent {
    Endpoint,
    Parameter,
    Schema,
    Response,
    Auth,
}

impl QueryIntent {
    const ALL: [Self; 5] = [
        Self::Endpoint,
        Self::Parameter,
        Self::Schema,
        Self::Response,
        Self::Auth,
    ];

    fn triggers(self) -> &'static [&'static str] {
        match self {
            Self::Endpoint => &["endpoint", "path", "method"],
            Self::Parameter => &["parameter", "param", "query", "body", "header"],
            Self::Schema => &["schema", "definition", "model", "property"],
            Self::Response => &["response", "return", "status"],
            Self::Auth => &["auth", "token", "security"],
        }
    }

    fn representative_terms(self) -> [&'static str; 2] {
        match self {
            Self::Endpoint => ["operation", "path"],
            Self::Parameter => ["parameter", "request"],
            Self::Schema => ["schema", "properties"],
            Self::Response => ["response", "status"],
            Self::Auth => ["security", "authentication"],
        }
    }

    /// Whether a chunk type answers this intent.
    #[must_use]
    pub fn matches(self, chunk_type: ChunkType) -> bool {
        match self {
            Self::Endpoint => matches!(
                chunk_type,
                ChunkType::OperationMetadata | ChunkType::PathMetadata | ChunkType::EndpointSummary
            ),
            Self::Parameter => matches!(
                chunk_type,
                ChunkType::OperationParameters
                    | ChunkType::PathParameters
                    | ChunkType::OperationRequestBody
            ),
            Self::Schema => matches!(
                chunk_type,
                ChunkType::SchemaSummary | ChunkType::SchemaProperties
            ),
            Self::Response => chunk_type == ChunkType::OperationResponses,
            Self::Auth => matches!(
                chunk_type,
                ChunkType::Components | ChunkType::OperationMetadata
            ),
        }
    }

    /// First category, in declaration order, with a trigger among the
    /// lower-cased query words.
    #[must_use]
    pub fn detect(query: &str) -> Option<Self> {
        let lowered = query.to_lowercase();
        let words: Vec<&str> = lowered
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
            .collect();
        Self::ALL.into_iter().find(|intent| {
            words.iter().any(|word| {
                intent
                    .triggers()
                    .iter()
                    .any(|t| word.starts_with(t) || singular(word) == *t)
            })
        })
    }
}

fn singular(word: &str) -> String {
    if let Some(stem) = word.strip_suffix("ies") {
        format!("{stem}y")
    } else if word.len() > 3 && word.ends_with('s') && !word.ends_with("ss") {
        word[..word.len() - 1].to_owned()
    } else {
        word.to_owned()
    }
}

/// Lower-cased words of `text`: alphanumeric runs, their camelCase parts,
/// and for identifiers like `employee_id` or `employeeId` the compound
/// `employeeid`.
#[must_use]
pub fn word_set(text: &str) -> HashSet<String> {
    let mut words = HashSet::new();
    for token in text.split(|c: char| !(c.is_alphanumeric() || c == '_' || c == '-')) {
        let parts = identifier_parts(token);
        if parts.len() > 1 {
            words.insert(parts.concat());
        }
        words.extend(parts);
    }
    words
}

fn identifier_parts(token: &str) -> Vec<String> {
    let mut parts = Vec::new();
    for raw in token.split(|c: char| !c.is_alphanumeric()) {
        let mut current = String::new();
        let mut prev_lower = false;
        for c in raw.chars() {
            if c.is_uppercase() && prev_lower && !current.is_empty() {
                parts.push(std::mem::take(&mut current));
            }
            prev_lower = c.is_lowercase() || c.is_numeric();
            current.extend(c.to_lowercase());
        }
        if !current.is_empty() {
            parts.push(current);
        }
    }
    parts
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryResult {
    pub text: String,
    #[serde(rename = "score")]
    pub raw_score: f32,
    pub semantic_score: f32,
    pub chunk_type: ChunkType,
    pub token_count: usize,
    pub metadata: BTreeMap<String, String>,
}

impl QueryResult {
    fn from_chunk(chunk: DocumentChunk, raw_score: f32, semantic_score: f32) -> Self {
        Self {
            text: chunk.text().to_owned(),
            raw_score,
            semantic_score,
            chunk_type: chunk.chunk_type(),
            token_count: chunk.token_count(),
            metadata: chunk.metadata().clone(),
        }
    }

    #[must_use]
    pub fn meta(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).map(String::as_str)
    }
}

/// Best-effort retrieval outcome. On failure `results` is empty and `note`
/// carries the diagnostic.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct QueryResponse {
    pub results: Vec<QueryResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl QueryResponse {
    fn degraded(operation: &str, collection: &str, err: &crate::error::IndexError) -> Self {
        tracing::warn!(operation, collection, error = %err, "query degraded to empty result");
        Self {
            results: Vec::new(),
            note: Some(format!("{operation} failed: {err}")),
        }
    }
}

/// Read-only query pipeline over one vector store.
pub struct QueryEngine<P: EmbedProvider> {
    store: Arc<dyn VectorStore>,
    provider: Arc<P>,
    counter: TokenCounter,
    config: QueryConfig,
}

impl<P: EmbedProvider> QueryEngine<P> {
    #[must_use]
    pub fn new(
        store: Arc<dyn VectorStore>,
        provider: Arc<P>,
        counter: TokenCounter,
        config: QueryConfig,
    ) -> Self {
        Self {
            store,
            provider,
            counter,
            config,
        }
    }

    #[must_use]
    pub fn config(&self) -> &QueryConfig {
        &self.config
    }

    /// Plain nearest-neighbor search without rerank; `semantic_score`
    /// equals the raw similarity.
    ///
    /// # Errors
    ///
    /// Returns an error if embedding the query or the store search fails.
    pub async fn search(
        &self,
        query: &str,
        collection: &str,
        limit: usize,
    ) -> Result<Vec<QueryResult>> {
        let vector = self.provider.embed(query).await?;
        let hits = self
            .store
            .search(collection, vector, u64::try_from(limit)?, None)
            .await?;
        Ok(hits
            .into_iter()
            .filter_map(|hit| {
                DocumentChunk::from_payload(&hit.payload)
                    .map(|chunk| QueryResult::from_chunk(chunk, hit.score, hit.score))
            })
            .collect())
    }

    /// Augmented, reranked and hierarchically filtered retrieval.
    pub async fn enhanced_query(&self, query: &str, collection: &str, limit: usize) -> QueryResponse {
        match self.try_enhanced_query(query, collection, limit).await {
            Ok(results) => QueryResponse {
                results,
                note: None,
            },
            Err(e) => QueryResponse::degraded("enhanced_query", collection, &e),
        }
    }

    /// Two-phase retrieval: find endpoints first, then the fields belonging
    /// to each, grouped per endpoint.
    pub async fn endpoint_first_query(
        &self,
        query: &str,
        collection: &str,
        limit: usize,
    ) -> QueryResponse {
        match self.try_endpoint_first(query, collection, limit).await {
            Ok(response) => response,
            Err(e) => QueryResponse::degraded("endpoint_first_query", collection, &e),
        }
    }

    /// Lower-case the query and append up to two representative terms of
    /// the detected intent while it stays within six tokens.
    #[must_use]
    pub fn augment_query(&self, query: &str) -> String {
        let mut augmented = query.trim().to_lowercase();
        let Some(intent) = QueryIntent::detect(&augmented) else {
            return augmented;
        };
        for term in intent.representative_terms() {
            if augmented.split_whitespace().any(|w| w == term) {
                continue;
            }
            let candidate = format!("{augmented} {term}");
            if self.counter.count(&candidate) > MAX_AUGMENTED_QUERY_TOKENS {
                break;
            }
            augmented = candidate;
        }
        augmented
    }

    async fn try_enhanced_query(
        &self,
        query: &str,
        collection: &str,
        limit: usize,
    ) -> Result<Vec<QueryResult>> {
        if limit == 0 {
            return Ok(Vec::new());
        }
        let augmented = self.augment_query(query);
        let intent = QueryIntent::detect(&augmented);
        let vector = self.provider.embed(&augmented).await?;

        let fetch = limit.saturating_mul(4).min(self.config.max_candidates);
        let hits = self
            .store
            .search(
                collection,
                vector,
                u64::try_from(fetch)?,
                Some(self.config.candidate_floor),
            )
            .await?;
        let candidates = hits.len();

        let query_words = word_set(query);
        let results = select_top(
            self.rerank(hits, &query_words, intent),
            limit,
            query.split_whitespace().count(),
            self.config.min_semantic_score,
        );

        tracing::info!(
            collection,
            candidates,
            returned = results.len(),
            intent = ?intent,
            "enhanced query"
        );
        Ok(results)
    }

    fn rerank(
        &self,
        hits: Vec<ScoredVectorPoint>,
        query_words: &HashSet<String>,
        intent: Option<QueryIntent>,
    ) -> Vec<QueryResult> {
        let mut results: Vec<QueryResult> = hits
            .into_iter()
            .filter_map(|hit| {
                let chunk = DocumentChunk::from_payload(&hit.payload)?;
                let score = self.semantic_score(&chunk, hit.score, query_words, intent);
                tracing::debug!(
                    chunk_type = %chunk.chunk_type(),
                    raw = hit.score,
                    semantic = score,
                    "reranked"
                );
                Some(QueryResult::from_chunk(chunk, hit.score, score))
            })
            .collect();
        sort_by_score(&mut results);
        results
    }

    fn semantic_score(
        &self,
        chunk: &DocumentChunk,
        raw_score: f32,
        query_words: &HashSet<String>,
        intent: Option<QueryIntent>,
    ) -> f32 {
        let w = &self.config.weights;
        let mut score = raw_score * chunk.semantic_weight();

        if !query_words.is_empty() {
            let chunk_words = word_set(chunk.text());
            let shared = query_words.intersection(&chunk_words).count();
            #[allow(clippy::cast_precision_loss)]
            let ratio = shared as f32 / query_words.len() as f32;
            score += w.keyword_overlap * ratio;
        }

        if intent.is_some_and(|i| i.matches(chunk.chunk_type())) {
            score += w.intent_match;
        } else if chunk.chunk_type().is_summary() {
            score += w.summary_bonus;
        }

        if LENGTH_BONUS_RANGE.contains(&chunk.token_count()) {
            score += w.length_bonus;
        }
        if chunk.text().split_whitespace().count() < SHORT_CHUNK_WORDS {
            score -= w.short_penalty;
        }
        score.min(1.0)
    }

    async fn try_endpoint_first(
        &self,
        query: &str,
        collection: &str,
        limit: usize,
    ) -> Result<QueryResponse> {
        if limit == 0 {
            return Ok(QueryResponse::default());
        }

        let endpoint_query = format!("{query} {ENDPOINT_PHASE_SUFFIX}");
        let vector = self.provider.embed(&endpoint_query).await?;
        let hits = self
            .store
            .search(
                collection,
                vector,
                u64::try_from(limit.saturating_mul(4).max(20))?,
                Some(self.config.candidate_floor),
            )
            .await?;
        let endpoints = select_endpoints(hits, limit.max(3));

        if endpoints.is_empty() {
            tracing::info!(collection, "no endpoints matched, falling back to plain search");
            let results = self.search(query, collection, limit).await?;
            return Ok(QueryResponse {
                results,
                note: Some("no endpoint chunks matched; returned plain search results".into()),
            });
        }

        let field_query = format!("{query} {FIELD_PHASE_SUFFIX}");
        let vector = self.provider.embed(&field_query).await?;
        let pool: Vec<(DocumentChunk, f32)> = self
            .store
            .search(
                collection,
                vector,
                u64::try_from(limit.saturating_mul(10).max(50))?,
                Some(self.config.candidate_floor),
            )
            .await?
            .into_iter()
            .filter_map(|hit| DocumentChunk::from_payload(&hit.payload).map(|c| (c, hit.score)))
            .filter(|(chunk, _)| FIELD_TYPES.contains(&chunk.chunk_type()))
            .collect();

        let mut results = Vec::new();
        for (endpoint, score) in &endpoints {
            results.push(self.endpoint_summary(endpoint, *score));
            let fields = pool
                .iter()
                .filter(|(chunk, _)| belongs_to(chunk, endpoint))
                .take(limit)
                .map(|(chunk, raw)| {
                    let semantic = (raw * chunk.semantic_weight()).min(1.0);
                    QueryResult::from_chunk(chunk.clone(), *raw, semantic)
                });
            results.extend(fields);
        }

        tracing::info!(
            collection,
            endpoints = endpoints.len(),
            field_pool = pool.len(),
            returned = results.len(),
            "endpoint-first query"
        );
        Ok(QueryResponse {
            results,
            note: None,
        })
    }

    fn endpoint_summary(&self, endpoint: &DocumentChunk, score: f32) -> QueryResult {
        let path = endpoint.meta("path").unwrap_or("");
        let mut lines = vec![match endpoint.meta("method") {
            Some(method) => format!("Endpoint: {method} {path}"),
            None => format!("Endpoint: {path}"),
        }];
        if let Some(id) = endpoint.meta("operation_id") {
            lines.push(format!("Operation ID: {id}"));
        }
        if let Some(tags) = endpoint.meta("tags") {
            lines.push(format!("Tags: {}", tags.replace(',', ", ")));
        }
        let metadata: BTreeMap<String, String> = ["path", "method", "operation_id", "tags", "source"]
            .into_iter()
            .filter_map(|k| endpoint.meta(k).map(|v| (k.to_owned(), v.to_owned())))
            .collect();
        let chunk = DocumentChunk::new(
            &self.counter,
            lines.join("\n"),
            ChunkType::EndpointSummary,
            metadata,
        );
        QueryResult::from_chunk(chunk, score, score.min(1.0))
    }
}

/// Operation/path metadata chunks deduplicated by `(path, method)`, best
/// score first, at most `take`.
fn select_endpoints(hits: Vec<ScoredVectorPoint>, take: usize) -> Vec<(DocumentChunk, f32)> {
    let mut best: HashMap<(String, String), (DocumentChunk, f32)> = HashMap::new();
    for hit in hits {
        let Some(chunk) = DocumentChunk::from_payload(&hit.payload) else {
            continue;
        };
        if !matches!(
            chunk.chunk_type(),
            ChunkType::OperationMetadata | ChunkType::PathMetadata
        ) {
            continue;
        }
        let key = (
            chunk.meta("path").unwrap_or("").to_owned(),
            chunk.meta("method").unwrap_or("").to_owned(),
        );
        if best
            .get(&key)
            .is_none_or(|(_, existing)| hit.score > *existing)
        {
            best.insert(key, (chunk, hit.score));
        }
    }
    let mut endpoints: Vec<(DocumentChunk, f32)> = best.into_values().collect();
    endpoints.sort_by(|a, b| {
        b.1.total_cmp(&a.1)
            .then_with(|| a.0.meta("path").cmp(&b.0.meta("path")))
            .then_with(|| a.0.meta("method").cmp(&b.0.meta("method")))
    });
    endpoints.truncate(take);
    endpoints
}

/// Field chunks match an endpoint on whatever of `path`/`method` they
/// carry; chunks without them always match.
fn belongs_to(chunk: &DocumentChunk, endpoint: &DocumentChunk) -> bool {
    let path_ok = match (chunk.meta("path"), endpoint.meta("path")) {
        (Some(p), Some(e)) => p == e,
        _ => true,
    };
    let method_ok = match (chunk.meta("method"), endpoint.meta("method")) {
        (Some(m), Some(e)) => m.eq_ignore_ascii_case(e),
        _ => true,
    };
    path_ok && method_ok
}

fn sort_by_score(results: &mut [QueryResult]) {
    results.sort_by(|a, b| b.semantic_score.total_cmp(&a.semantic_score));
}

/// Drops results under `min_score`, then allocates at most `limit` slots
/// between summary and detail chunks.
fn select_top(
    mut results: Vec<QueryResult>,
    limit: usize,
    query_word_count: usize,
    min_score: f32,
) -> Vec<QueryResult> {
    results.retain(|r| r.semantic_score >= min_score);
    if results.len() > limit {
        results = hierarchical_filter(results, limit, query_word_count);
    }
    results.truncate(limit);
    results
}

/// Keep `limit` results split between summary and detail chunk types:
/// 60:40 for queries of at most three words, 30:70 otherwise. Slots one
/// side cannot fill go to the best leftovers.
fn hierarchical_filter(
    results: Vec<QueryResult>,
    limit: usize,
    query_word_count: usize,
) -> Vec<QueryResult> {
    let summary_ratio = if query_word_count <= SHORT_QUERY_WORDS {
        0.6
    } else {
        0.3
    };
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    let summary_slots = ((limit as f64 * summary_ratio).round() as usize).min(limit);
    let detail_slots = limit - summary_slots;

    let (summaries, details): (Vec<QueryResult>, Vec<QueryResult>) = results
        .into_iter()
        .partition(|r| r.chunk_type.is_summary());

    let mut selected = Vec::with_capacity(limit);
    let mut leftovers = Vec::new();
    for (group, slots) in [(summaries, summary_slots), (details, detail_slots)] {
        let mut group = group.into_iter();
        selected.extend(group.by_ref().take(slots));
        leftovers.extend(group);
    }
    sort_by_score(&mut leftovers);
    let remaining = limit.saturating_sub(selected.len());
    selected.extend(leftovers.into_iter().take(remaining));
    sort_by_score(&mut selected);
    selected
}

/// Compact listing for terminal output.
#[must_use]
pub fn format_results(results: &[QueryResult]) -> String {
    let mut out = String::new();
    for (i, result) in results.iter().enumerate() {
        let location = match (result.meta("method"), result.meta("path")) {
            (Some(method), Some(path)) => format!("{method} {path}"),
            (None, Some(path)) => path.to_owned(),
            _ => result
                .meta("schema_name")
                .or_else(|| result.meta("section"))
                .or_else(|| result.meta("source"))
                .unwrap_or("-")
                .to_owned(),
        };
        let _ = writeln!(
            out,
            "{}. [{}] {location} (score {:.3}, semantic {:.3}, {} tokens)",
            i + 1,
            result.chunk_type,
            result.raw_score,
            result.semantic_score,
            result.token_count,
        );
        for line in result.text.lines().take(3) {
            let _ = writeln!(out, "   {line}");
        }
    }
    out
}
