use super::Config;

impl Config {
    pub(crate) fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("SPECDEX_EMBEDDING_PROVIDER") {
            if let Ok(kind) = serde_json::from_value(serde_json::Value::String(v.clone())) {
                self.embedding.provider = kind;
            } else {
                tracing::warn!("ignoring invalid SPECDEX_EMBEDDING_PROVIDER value: {v}");
            }
        }
        if let Ok(v) = std::env::var("SPECDEX_EMBEDDING_BASE_URL") {
            self.embedding.base_url = v;
        }
        if let Ok(v) = std::env::var("SPECDEX_EMBEDDING_MODEL") {
            self.embedding.model = v;
        }
        if let Ok(v) = std::env::var("SPECDEX_EMBEDDING_API_KEY") {
            self.embedding.api_key = Some(v);
        }
        if let Ok(v) = std::env::var("SPECDEX_QDRANT_URL") {
            self.store.qdrant_url = v;
        }
        if let Ok(v) = std::env::var("SPECDEX_STORE_BACKEND") {
            if let Ok(backend) = serde_json::from_value(serde_json::Value::String(v.clone())) {
                self.store.backend = backend;
            } else {
                tracing::warn!("ignoring invalid SPECDEX_STORE_BACKEND value: {v}");
            }
        }
        if let Ok(v) = std::env::var("SPECDEX_CHUNK_MAX_TOKENS") {
            if let Ok(tokens) = v.parse::<usize>() {
                self.chunking.max_tokens = tokens;
            } else {
                tracing::warn!("ignoring invalid SPECDEX_CHUNK_MAX_TOKENS value: {v}");
            }
        }
        if let Ok(v) = std::env::var("SPECDEX_CHUNK_OVERLAP") {
            if let Ok(overlap) = v.parse::<f32>() {
                self.chunking.overlap_percentage = overlap;
            } else {
                tracing::warn!("ignoring invalid SPECDEX_CHUNK_OVERLAP value: {v}");
            }
        }
        if let Ok(v) = std::env::var("SPECDEX_CHUNK_PRUNE_VENDOR_EXTENSIONS") {
            if let Ok(prune) = v.parse::<bool>() {
                self.chunking.prune_vendor_extensions = prune;
            } else {
                tracing::warn!("ignoring invalid SPECDEX_CHUNK_PRUNE_VENDOR_EXTENSIONS value: {v}");
            }
        }
    }
}
