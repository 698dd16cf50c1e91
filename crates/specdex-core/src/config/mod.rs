mod env;
mod types;

#[cfg(test)]
mod tests;

pub use types::*;

use std::path::Path;

use anyhow::{Context, bail};

impl Config {
    /// Load configuration from a TOML file with env var overrides.
    ///
    /// Falls back to defaults when the file does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path).context("failed to read config file")?;
            toml::from_str::<Self>(&content).context("failed to parse config file")?
        } else {
            Self::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Reject settings the chunker and providers cannot run with.
    ///
    /// # Errors
    ///
    /// Returns an error describing the first invalid setting.
    pub fn validate(&self) -> anyhow::Result<()> {
        let chunking = &self.chunking;
        if chunking.max_tokens == 0 {
            bail!("chunking.max_tokens must be greater than 0");
        }
        if !(0.0..1.0).contains(&chunking.overlap_percentage) {
            bail!(
                "chunking.overlap_percentage must be in [0, 1), got {}",
                chunking.overlap_percentage
            );
        }
        if chunking.min_tokens > chunking.max_tokens {
            bail!(
                "chunking.min_tokens ({}) exceeds chunking.max_tokens ({})",
                chunking.min_tokens,
                chunking.max_tokens
            );
        }
        if chunking.batch_size == 0 {
            bail!("chunking.batch_size must be greater than 0");
        }
        if self.embedding.model.trim().is_empty() {
            bail!("embedding.model must not be empty");
        }
        if self.embedding.provider == EmbeddingProviderKind::OpenAi
            && self
                .embedding
                .api_key
                .as_deref()
                .is_none_or(|k| k.trim().is_empty())
        {
            bail!("embedding.api_key (or SPECDEX_EMBEDDING_API_KEY) is required for the openai provider");
        }
        if self.store.backend == StoreBackend::Qdrant && self.store.qdrant_url.trim().is_empty() {
            bail!("store.qdrant_url must not be empty");
        }
        Ok(())
    }
}
