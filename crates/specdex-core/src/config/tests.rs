use std::io::Write;

use serial_test::serial;

use super::*;

const ENV_KEYS: [&str; 9] = [
    "SPECDEX_EMBEDDING_PROVIDER",
    "SPECDEX_EMBEDDING_BASE_URL",
    "SPECDEX_EMBEDDING_MODEL",
    "SPECDEX_EMBEDDING_API_KEY",
    "SPECDEX_QDRANT_URL",
    "SPECDEX_STORE_BACKEND",
    "SPECDEX_CHUNK_MAX_TOKENS",
    "SPECDEX_CHUNK_OVERLAP",
    "SPECDEX_CHUNK_PRUNE_VENDOR_EXTENSIONS",
];

fn clear_env() {
    for key in ENV_KEYS {
        unsafe { std::env::remove_var(key) };
    }
}

#[test]
fn defaults() {
    let config = Config::default();
    assert_eq!(config.embedding.provider, EmbeddingProviderKind::Ollama);
    assert_eq!(config.embedding.base_url, "http://localhost:11434");
    assert_eq!(config.embedding.model, "all-minilm");
    assert_eq!(config.embedding.dimensions, 384);
    assert!(config.embedding.api_key.is_none());
    assert_eq!(config.store.backend, StoreBackend::Qdrant);
    assert_eq!(config.store.qdrant_url, "http://localhost:6334");
    assert_eq!(config.chunking.max_tokens, 800);
    assert!((config.chunking.overlap_percentage - 0.15).abs() < f32::EPSILON);
    assert_eq!(config.chunking.min_tokens, 50);
    assert_eq!(config.chunking.batch_size, 100);
    assert!(config.chunking.prune_vendor_extensions);
    assert_eq!(config.markdown.target_tokens, 1000);
    assert_eq!(config.markdown.overlap_tokens, 100);
    assert!((config.query.weights.keyword_overlap - 0.15).abs() < f32::EPSILON);
    config.validate().unwrap();
}

#[test]
#[serial]
fn missing_file_yields_defaults() {
    clear_env();
    let dir = tempfile::tempdir().unwrap();
    let config = Config::load(&dir.path().join("absent.toml")).unwrap();
    assert_eq!(config.embedding.model, "all-minilm");
    assert_eq!(config.store.backend, StoreBackend::Qdrant);
}

#[test]
#[serial]
fn load_partial_toml() {
    clear_env();
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"
[embedding]
provider = "openai"
model = "text-embedding-3-small"
api_key = "sk-file"
dimensions = 512

[store]
backend = "memory"

[chunking]
max_tokens = 400
prune_vendor_extensions = false

[markdown]
target_tokens = 900

[query.weights]
short_penalty = 0.2
"#
    )
    .unwrap();

    let config = Config::load(file.path()).unwrap();
    assert_eq!(config.embedding.provider, EmbeddingProviderKind::OpenAi);
    assert_eq!(config.embedding.model, "text-embedding-3-small");
    assert_eq!(config.embedding.base_url, "http://localhost:11434");
    assert_eq!(config.embedding.api_key.as_deref(), Some("sk-file"));
    assert_eq!(config.embedding.dimensions, 512);
    assert_eq!(config.store.backend, StoreBackend::Memory);
    assert_eq!(config.chunking.max_tokens, 400);
    assert_eq!(config.chunking.min_tokens, 50);
    assert!(!config.chunking.prune_vendor_extensions);
    assert_eq!(config.markdown.target_tokens, 900);
    assert_eq!(config.markdown.min_tokens, 800);
    assert!((config.query.weights.short_penalty - 0.2).abs() < f32::EPSILON);
    assert!((config.query.weights.keyword_overlap - 0.15).abs() < f32::EPSILON);
    config.validate().unwrap();
}

#[test]
#[serial]
fn malformed_toml_is_an_error() {
    clear_env();
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, "[chunking\nmax_tokens = ").unwrap();
    assert!(Config::load(file.path()).is_err());
}

#[test]
#[serial]
fn env_overrides() {
    clear_env();
    unsafe {
        std::env::set_var("SPECDEX_EMBEDDING_PROVIDER", "openai");
        std::env::set_var("SPECDEX_EMBEDDING_BASE_URL", "https://api.example.test/v1");
        std::env::set_var("SPECDEX_EMBEDDING_MODEL", "embed-large");
        std::env::set_var("SPECDEX_EMBEDDING_API_KEY", "sk-env");
        std::env::set_var("SPECDEX_QDRANT_URL", "http://qdrant:6334");
        std::env::set_var("SPECDEX_STORE_BACKEND", "memory");
        std::env::set_var("SPECDEX_CHUNK_MAX_TOKENS", "512");
        std::env::set_var("SPECDEX_CHUNK_OVERLAP", "0.25");
        std::env::set_var("SPECDEX_CHUNK_PRUNE_VENDOR_EXTENSIONS", "false");
    }

    let dir = tempfile::tempdir().unwrap();
    let config = Config::load(&dir.path().join("absent.toml")).unwrap();
    clear_env();

    assert_eq!(config.embedding.provider, EmbeddingProviderKind::OpenAi);
    assert_eq!(config.embedding.base_url, "https://api.example.test/v1");
    assert_eq!(config.embedding.model, "embed-large");
    assert_eq!(config.embedding.api_key.as_deref(), Some("sk-env"));
    assert_eq!(config.store.qdrant_url, "http://qdrant:6334");
    assert_eq!(config.store.backend, StoreBackend::Memory);
    assert_eq!(config.chunking.max_tokens, 512);
    assert!((config.chunking.overlap_percentage - 0.25).abs() < f32::EPSILON);
    assert!(!config.chunking.prune_vendor_extensions);
}

#[test]
#[serial]
fn invalid_env_values_are_ignored() {
    clear_env();
    unsafe {
        std::env::set_var("SPECDEX_EMBEDDING_PROVIDER", "llamacpp");
        std::env::set_var("SPECDEX_STORE_BACKEND", "sqlite");
        std::env::set_var("SPECDEX_CHUNK_MAX_TOKENS", "lots");
        std::env::set_var("SPECDEX_CHUNK_OVERLAP", "half");
        std::env::set_var("SPECDEX_CHUNK_PRUNE_VENDOR_EXTENSIONS", "maybe");
    }

    let dir = tempfile::tempdir().unwrap();
    let config = Config::load(&dir.path().join("absent.toml")).unwrap();
    clear_env();

    assert_eq!(config.embedding.provider, EmbeddingProviderKind::Ollama);
    assert_eq!(config.store.backend, StoreBackend::Qdrant);
    assert_eq!(config.chunking.max_tokens, 800);
    assert!((config.chunking.overlap_percentage - 0.15).abs() < f32::EPSILON);
    assert!(config.chunking.prune_vendor_extensions);
}

#[test]
fn validate_rejects_zero_max_tokens() {
    let mut config = Config::default();
    config.chunking.max_tokens = 0;
    let err = config.validate().unwrap_err();
    assert!(err.to_string().contains("max_tokens"));
}

#[test]
fn validate_rejects_overlap_out_of_range() {
    let mut config = Config::default();
    config.chunking.overlap_percentage = 1.0;
    assert!(config.validate().is_err());
    config.chunking.overlap_percentage = -0.1;
    assert!(config.validate().is_err());
    config.chunking.overlap_percentage = 0.0;
    config.validate().unwrap();
}

#[test]
fn validate_rejects_min_above_max() {
    let mut config = Config::default();
    config.chunking.min_tokens = 900;
    let err = config.validate().unwrap_err();
    assert!(err.to_string().contains("min_tokens"));
}

#[test]
fn validate_rejects_zero_batch_size() {
    let mut config = Config::default();
    config.chunking.batch_size = 0;
    assert!(config.validate().is_err());
}

#[test]
fn validate_requires_openai_key() {
    let mut config = Config::default();
    config.embedding.provider = EmbeddingProviderKind::OpenAi;
    assert!(config.validate().is_err());
    config.embedding.api_key = Some("   ".into());
    assert!(config.validate().is_err());
    config.embedding.api_key = Some("sk-test".into());
    config.validate().unwrap();
}

#[test]
fn api_key_is_redacted_in_debug() {
    let mut config = Config::default();
    config.embedding.api_key = Some("sk-very-secret".into());
    let debug = format!("{config:?}");
    assert!(!debug.contains("sk-very-secret"));
    assert!(debug.contains("[REDACTED]"));
}
