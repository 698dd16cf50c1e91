//! Service construction: config resolution, provider, vector store, and the
//! indexer/query engine pair built on top of them.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use specdex_index::{Indexer, MarkdownExtractor, QueryEngine, SpecExtractor, TokenCounter};
use specdex_llm::any::AnyProvider;
use specdex_llm::ollama::OllamaProvider;
use specdex_llm::openai::OpenAiProvider;
use specdex_memory::{InMemoryVectorStore, QdrantOps, VectorStore};

use crate::config::{Config, EmbeddingProviderKind, StoreBackend};

/// Shared handles every command needs.
pub struct Services {
    pub config: Config,
    pub counter: TokenCounter,
    pub provider: Arc<AnyProvider>,
    pub store: Arc<dyn VectorStore>,
}

impl Services {
    /// Build provider and store from `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if the config is invalid, the tokenizer vocabulary
    /// cannot be loaded, or a backend cannot be constructed.
    pub fn build(config: Config) -> anyhow::Result<Self> {
        let store = create_store(&config)?;
        Self::with_store(config, store)
    }

    /// Like [`Services::build`] but with a caller-supplied store.
    ///
    /// # Errors
    ///
    /// Returns an error if the config is invalid or the provider or
    /// tokenizer cannot be constructed.
    pub fn with_store(config: Config, store: Arc<dyn VectorStore>) -> anyhow::Result<Self> {
        config.validate()?;
        let counter = TokenCounter::new().context("failed to initialize token counter")?;
        let provider = Arc::new(create_provider(&config)?);
        tracing::debug!(
            provider = config.embedding.provider.as_str(),
            model = %config.embedding.model,
            "services ready"
        );
        Ok(Self {
            config,
            counter,
            provider,
            store,
        })
    }

    #[must_use]
    pub fn indexer(&self) -> Indexer<AnyProvider> {
        Indexer::new(
            Arc::clone(&self.store),
            Arc::clone(&self.provider),
            SpecExtractor::new(self.counter.clone(), self.config.chunking.clone()),
            MarkdownExtractor::new(self.counter.clone(), &self.config.markdown),
        )
    }

    #[must_use]
    pub fn query_engine(&self) -> QueryEngine<AnyProvider> {
        QueryEngine::new(
            Arc::clone(&self.store),
            Arc::clone(&self.provider),
            self.counter.clone(),
            self.config.query.clone(),
        )
    }
}

/// # Errors
///
/// Returns an error if the configured provider is unavailable in this build
/// or lacks required credentials.
pub fn create_provider(config: &Config) -> anyhow::Result<AnyProvider> {
    let embedding = &config.embedding;
    match embedding.provider {
        EmbeddingProviderKind::Ollama => Ok(AnyProvider::Ollama(OllamaProvider::new(
            &embedding.base_url,
            embedding.model.clone(),
        ))),
        EmbeddingProviderKind::OpenAi => {
            let api_key = embedding
                .api_key
                .clone()
                .context("embedding.api_key is required for the openai provider")?;
            Ok(AnyProvider::OpenAi(
                OpenAiProvider::new(api_key, embedding.base_url.clone(), embedding.model.clone())
                    .with_dimensions(embedding.dimensions),
            ))
        }
        #[cfg(feature = "mock")]
        EmbeddingProviderKind::Mock => Ok(AnyProvider::Mock(
            specdex_llm::mock::MockProvider::default().with_dimensions(embedding.dimensions),
        )),
        #[cfg(not(feature = "mock"))]
        EmbeddingProviderKind::Mock => {
            anyhow::bail!("mock embedding provider requires the `mock` feature")
        }
    }
}

/// # Errors
///
/// Returns an error if the Qdrant client cannot be built from the
/// configured URL.
pub fn create_store(config: &Config) -> anyhow::Result<Arc<dyn VectorStore>> {
    match config.store.backend {
        StoreBackend::Qdrant => {
            let ops = QdrantOps::new(&config.store.qdrant_url)
                .map_err(|e| anyhow::anyhow!("failed to connect to qdrant: {e}"))?;
            tracing::info!(url = %config.store.qdrant_url, "using qdrant vector store");
            Ok(Arc::new(ops))
        }
        StoreBackend::Memory => {
            tracing::info!("using in-memory vector store");
            Ok(Arc::new(InMemoryVectorStore::new()))
        }
    }
}

/// Priority: CLI `--config` > `SPECDEX_CONFIG` env > `config/default.toml`.
#[must_use]
pub fn resolve_config_path() -> PathBuf {
    let args: Vec<String> = std::env::args().collect();
    if let Some(path) = args.windows(2).find(|w| w[0] == "--config").map(|w| &w[1]) {
        return PathBuf::from(path);
    }
    if let Ok(path) = std::env::var("SPECDEX_CONFIG") {
        return PathBuf::from(path);
    }
    PathBuf::from("config/default.toml")
}
