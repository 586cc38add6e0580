//! Configuration management for docchat.
//!
//! This module handles loading and merging configuration from multiple
//! sources:
//! - Built-in defaults
//! - Config file (`<data_dir>/config.yaml`)
//! - Environment variables (`DOCCHAT_*`)
//! - Command-line flags
//!
//! The configuration is data-directory-centric: the vector index storage,
//! the session snapshot, and prompt overrides all live under `data_dir`.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{AppError, AppResult};

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Directory holding collections, the session snapshot, and overrides
    pub data_dir: PathBuf,

    /// Optional config file path (default: `<data_dir>/config.yaml`)
    pub config_file: Option<PathBuf>,

    /// Provider for both chat and embeddings ("ollama", "mock")
    pub provider: String,

    /// Chat model identifier
    pub model: String,

    /// Provider endpoint URL
    pub endpoint: String,

    /// Embedding model identifier
    pub embedding_model: String,

    /// Embedding vector dimension, fixed per provider instance
    pub embedding_dimensions: usize,

    /// Chunk window size in characters
    pub chunk_size: usize,

    /// Overlap between consecutive chunks in characters
    pub chunk_overlap: usize,

    /// Overall number of chunks handed to the synthesizer
    pub top_k: usize,

    /// Chunks requested from the index per query variant
    pub k_per_variant: usize,

    /// Number of paraphrase variants requested from the expander
    pub query_variants: usize,

    /// Log level override
    pub log_level: Option<String>,

    /// Verbose mode (enables debug logging)
    pub verbose: bool,

    /// Disable colored output
    pub no_color: bool,
}

/// Config file structure (`config.yaml`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct ConfigFile {
    provider: Option<String>,
    model: Option<String>,
    endpoint: Option<String>,
    embedding: Option<EmbeddingSection>,
    chunking: Option<ChunkingSection>,
    retrieval: Option<RetrievalSection>,
    logging: Option<LoggingSection>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct EmbeddingSection {
    model: Option<String>,
    dimensions: Option<usize>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct ChunkingSection {
    chunk_size: Option<usize>,
    chunk_overlap: Option<usize>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct RetrievalSection {
    top_k: Option<usize>,
    k_per_variant: Option<usize>,
    query_variants: Option<usize>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct LoggingSection {
    level: Option<String>,
    color: Option<bool>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: std::env::current_dir()
                .unwrap_or_else(|_| PathBuf::from("."))
                .join(".docchat"),
            config_file: None,
            provider: "ollama".to_string(), // Local-first default
            model: "llama3.2".to_string(),
            endpoint: "http://localhost:11434".to_string(),
            embedding_model: "nomic-embed-text".to_string(),
            embedding_dimensions: 768,
            chunk_size: 7500,
            chunk_overlap: 100,
            top_k: 5,
            k_per_variant: 4,
            query_variants: 2,
            log_level: None,
            verbose: false,
            no_color: false,
        }
    }
}

impl AppConfig {
    /// Load configuration from defaults, config file, and environment.
    ///
    /// Environment variables:
    /// - `DOCCHAT_DATA_DIR`: Override the data directory
    /// - `DOCCHAT_CONFIG`: Path to config file
    /// - `DOCCHAT_PROVIDER`: Provider name
    /// - `DOCCHAT_MODEL`: Chat model identifier
    /// - `DOCCHAT_ENDPOINT`: Provider endpoint URL
    /// - `DOCCHAT_EMBEDDING_MODEL`: Embedding model identifier
    /// - `RUST_LOG`: Log level
    /// - `NO_COLOR`: Disable colored output
    pub fn load() -> AppResult<Self> {
        let mut config = Self::default();

        if let Ok(data_dir) = std::env::var("DOCCHAT_DATA_DIR") {
            config.data_dir = PathBuf::from(data_dir);
        }

        if let Ok(config_file) = std::env::var("DOCCHAT_CONFIG") {
            config.config_file = Some(PathBuf::from(config_file));
        }

        let config_path = if let Some(ref cf) = config.config_file {
            cf.clone()
        } else {
            config.data_dir.join("config.yaml")
        };

        if config_path.exists() {
            config.merge_yaml(&config_path)?;
        }

        // Environment variables override the config file
        if let Ok(provider) = std::env::var("DOCCHAT_PROVIDER") {
            config.provider = provider;
        }
        if let Ok(model) = std::env::var("DOCCHAT_MODEL") {
            config.model = model;
        }
        if let Ok(endpoint) = std::env::var("DOCCHAT_ENDPOINT") {
            config.endpoint = endpoint;
        }
        if let Ok(embedding_model) = std::env::var("DOCCHAT_EMBEDDING_MODEL") {
            config.embedding_model = embedding_model;
        }

        config.log_level = std::env::var("RUST_LOG").ok();

        if std::env::var("NO_COLOR").is_ok() {
            config.no_color = true;
        }

        Ok(config)
    }

    /// Merge a YAML configuration file into this config.
    fn merge_yaml(&mut self, path: &PathBuf) -> AppResult<()> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        let file: ConfigFile = serde_yaml::from_str(&contents).map_err(|e| {
            AppError::Config(format!("Failed to parse config file {:?}: {}", path, e))
        })?;

        if let Some(provider) = file.provider {
            self.provider = provider;
        }
        if let Some(model) = file.model {
            self.model = model;
        }
        if let Some(endpoint) = file.endpoint {
            self.endpoint = endpoint;
        }

        if let Some(embedding) = file.embedding {
            if let Some(model) = embedding.model {
                self.embedding_model = model;
            }
            if let Some(dimensions) = embedding.dimensions {
                self.embedding_dimensions = dimensions;
            }
        }

        if let Some(chunking) = file.chunking {
            if let Some(size) = chunking.chunk_size {
                self.chunk_size = size;
            }
            if let Some(overlap) = chunking.chunk_overlap {
                self.chunk_overlap = overlap;
            }
        }

        if let Some(retrieval) = file.retrieval {
            if let Some(top_k) = retrieval.top_k {
                self.top_k = top_k;
            }
            if let Some(k) = retrieval.k_per_variant {
                self.k_per_variant = k;
            }
            if let Some(n) = retrieval.query_variants {
                self.query_variants = n;
            }
        }

        if let Some(logging) = file.logging {
            if let Some(level) = logging.level {
                self.log_level = Some(level);
            }
            if let Some(color) = logging.color {
                self.no_color = !color;
            }
        }

        Ok(())
    }

    /// Apply CLI overrides to the configuration.
    ///
    /// CLI flags take precedence over both the config file and the
    /// environment.
    #[allow(clippy::too_many_arguments)]
    pub fn with_overrides(
        mut self,
        data_dir: Option<PathBuf>,
        config_file: Option<PathBuf>,
        provider: Option<String>,
        model: Option<String>,
        endpoint: Option<String>,
        log_level: Option<String>,
        verbose: bool,
        no_color: bool,
    ) -> Self {
        if let Some(data_dir) = data_dir {
            self.data_dir = data_dir;
        }

        if let Some(config_file) = config_file {
            self.config_file = Some(config_file);
        }

        if let Some(provider) = provider {
            self.provider = provider;
        }

        if let Some(model) = model {
            self.model = model;
        }

        if let Some(endpoint) = endpoint {
            self.endpoint = endpoint;
        }

        if let Some(log_level) = log_level {
            self.log_level = Some(log_level);
        }

        if verbose {
            self.verbose = true;
            // Verbose mode implies debug logging
            if self.log_level.is_none() {
                self.log_level = Some("debug".to_string());
            }
        }

        if no_color {
            self.no_color = true;
        }

        self
    }

    /// Directory where collection segments are stored.
    pub fn collections_dir(&self) -> PathBuf {
        self.data_dir.join("collections")
    }

    /// Path of the persisted session snapshot.
    pub fn session_path(&self) -> PathBuf {
        self.data_dir.join("session.json")
    }

    /// Directory holding prompt template overrides.
    pub fn prompts_dir(&self) -> PathBuf {
        self.data_dir.join("prompts")
    }

    /// Ensure the data directory exists.
    pub fn ensure_data_dir(&self) -> AppResult<()> {
        if !self.data_dir.exists() {
            std::fs::create_dir_all(&self.data_dir).map_err(|e| {
                AppError::Config(format!("Failed to create data directory: {}", e))
            })?;
        }
        Ok(())
    }

    /// Validate configuration invariants.
    ///
    /// Bad chunk parameters are a configuration error, never a runtime
    /// condition.
    pub fn validate(&self) -> AppResult<()> {
        let known_providers = ["ollama", "mock"];
        if !known_providers.contains(&self.provider.as_str()) {
            return Err(AppError::Config(format!(
                "Unknown provider: {}. Supported: {}",
                self.provider,
                known_providers.join(", ")
            )));
        }

        if self.chunk_size == 0 {
            return Err(AppError::Config("chunk_size must be positive".to_string()));
        }

        if self.chunk_overlap >= self.chunk_size {
            return Err(AppError::Config(format!(
                "chunk_overlap ({}) must be smaller than chunk_size ({})",
                self.chunk_overlap, self.chunk_size
            )));
        }

        if self.embedding_dimensions == 0 {
            return Err(AppError::Config(
                "embedding dimensions must be positive".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.provider, "ollama");
        assert_eq!(config.chunk_size, 7500);
        assert_eq!(config.chunk_overlap, 100);
        assert_eq!(config.query_variants, 2);
        assert!(!config.verbose);
    }

    #[test]
    fn test_default_validates() {
        assert!(AppConfig::default().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_chunking() {
        let mut config = AppConfig::default();
        config.chunk_overlap = config.chunk_size;
        assert!(matches!(config.validate(), Err(AppError::Config(_))));

        config.chunk_size = 0;
        assert!(matches!(config.validate(), Err(AppError::Config(_))));
    }

    #[test]
    fn test_validate_unknown_provider() {
        let mut config = AppConfig::default();
        config.provider = "unknown".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_with_overrides() {
        let config = AppConfig::default();
        let overridden = config.with_overrides(
            Some(PathBuf::from("/tmp/docchat-test")),
            None,
            Some("mock".to_string()),
            Some("llama3.1".to_string()),
            None,
            None,
            true,
            false,
        );

        assert_eq!(overridden.data_dir, PathBuf::from("/tmp/docchat-test"));
        assert_eq!(overridden.provider, "mock");
        assert_eq!(overridden.model, "llama3.1");
        assert!(overridden.verbose);
        assert_eq!(overridden.log_level, Some("debug".to_string()));
    }

    #[test]
    fn test_paths_derive_from_data_dir() {
        let mut config = AppConfig::default();
        config.data_dir = PathBuf::from("/tmp/docchat-test");
        assert!(config.collections_dir().ends_with("collections"));
        assert!(config.session_path().ends_with("session.json"));
        assert!(config.prompts_dir().ends_with("prompts"));
    }
}
