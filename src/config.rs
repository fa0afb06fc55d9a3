/// Configuration module for docqa.
///
/// Handles loading, validating, and providing default configuration values
/// for both the ingest and serve subcommands.
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// File extensions the loader understands.
const SUPPORTED_EXTENSIONS: &[&str] = &["pdf", "docx"];

// ── Default value functions ──────────────────────────────────────────

fn default_document_patterns() -> Vec<String> {
    vec!["./data".to_string()]
}

fn default_store_path() -> String {
    "./vector_store.db".to_string()
}

fn default_chunk_size() -> usize {
    1000
}

fn default_chunk_overlap() -> usize {
    200
}

fn default_model_name() -> String {
    "all-MiniLM-L6-v2".to_string()
}

fn default_dimensions() -> usize {
    384
}

fn default_model_dir() -> String {
    "models/all-MiniLM-L6-v2".to_string()
}

fn default_llm_model() -> String {
    "llama3.2".to_string()
}

fn default_llm_base_url() -> String {
    "http://localhost:11434".to_string()
}

fn default_max_context_chunks() -> usize {
    5
}

fn default_top_k() -> usize {
    3
}

fn default_num_variations() -> usize {
    2
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8000
}

// ── Config structs ───────────────────────────────────────────────────

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Config {
    /// Glob patterns or directories containing PDF/DOCX documents.
    #[serde(default = "default_document_patterns")]
    pub document_patterns: Vec<String>,

    #[serde(default = "default_store_path")]
    pub store_path: String,

    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,

    #[serde(default)]
    pub model: ModelConfig,

    #[serde(default)]
    pub llm: LlmConfig,

    #[serde(default)]
    pub search: SearchConfig,

    #[serde(default)]
    pub server: ServerConfig,
}

/// Embedding model settings.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ModelConfig {
    #[serde(default = "default_model_name")]
    pub name: String,

    #[serde(default = "default_dimensions")]
    pub dimensions: usize,

    #[serde(default = "default_model_dir")]
    pub dir: String,
}

/// Local LLM server settings.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LlmConfig {
    #[serde(default = "default_llm_model")]
    pub model: String,

    #[serde(default = "default_llm_base_url")]
    pub base_url: String,

    #[serde(default = "default_max_context_chunks")]
    pub max_context_chunks: usize,
}

/// Default retrieval parameters; per-request values override these.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SearchConfig {
    #[serde(default = "default_top_k")]
    pub top_k: usize,

    #[serde(default = "default_num_variations")]
    pub num_variations: usize,

    #[serde(default)]
    pub min_score: f32,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

// ── Default impls ────────────────────────────────────────────────────

impl Default for Config {
    fn default() -> Self {
        Self {
            document_patterns: default_document_patterns(),
            store_path: default_store_path(),
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
            model: ModelConfig::default(),
            llm: LlmConfig::default(),
            search: SearchConfig::default(),
            server: ServerConfig::default(),
        }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            name: default_model_name(),
            dimensions: default_dimensions(),
            dir: default_model_dir(),
        }
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            model: default_llm_model(),
            base_url: default_llm_base_url(),
            max_context_chunks: default_max_context_chunks(),
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
            num_variations: default_num_variations(),
            min_score: 0.0,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

// ── Config implementation ────────────────────────────────────────────

impl Config {
    /// Load configuration from a JSON file.
    ///
    /// If `config_path` is empty, defaults to `"config.json"`.
    /// If the file does not exist, returns a default config and optionally
    /// generates a template file.
    pub fn load(config_path: &str) -> Result<Self> {
        let path = if config_path.is_empty() {
            "config.json"
        } else {
            config_path
        };

        if !Path::new(path).exists() {
            info!("{path} not found, using defaults");
            let cfg = Self::default();

            // Generate template only for the default path
            if path == "config.json" {
                match cfg.save(path) {
                    Ok(()) => info!("Generated config template: {path}"),
                    Err(e) => warn!("Failed to generate config template: {e}"),
                }
            }

            return Ok(cfg);
        }

        let data = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config: {path}"))?;

        let cfg: Config = match serde_json::from_str(&data) {
            Ok(c) => c,
            Err(e) => {
                warn!("Invalid JSON in {path}: {e}");
                warn!("Using default configuration");
                return Ok(Self::default());
            }
        };

        info!("Loaded configuration from {path}");
        Ok(cfg)
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &str) -> Result<()> {
        let data = serde_json::to_string_pretty(self).context("failed to marshal config")?;
        std::fs::write(path, data).with_context(|| format!("failed to write config: {path}"))?;
        Ok(())
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<()> {
        anyhow::ensure!(self.chunk_size > 0, "chunk_size must be positive");
        anyhow::ensure!(
            self.chunk_overlap < self.chunk_size,
            "chunk_overlap must be smaller than chunk_size"
        );
        anyhow::ensure!(
            self.model.dimensions > 0,
            "model.dimensions must be positive"
        );
        anyhow::ensure!(
            (1..=10).contains(&self.search.top_k),
            "search.top_k must be in 1..=10"
        );
        anyhow::ensure!(
            self.search.num_variations <= 5,
            "search.num_variations must be at most 5"
        );
        anyhow::ensure!(
            (0.0..=1.0).contains(&self.search.min_score),
            "search.min_score must be in [0, 1]"
        );
        anyhow::ensure!(
            !self.document_patterns.is_empty(),
            "at least one document pattern must be specified"
        );
        Ok(())
    }

    /// Expand all document patterns and return matching document files.
    pub fn document_files(&self) -> Result<Vec<PathBuf>> {
        // BTreeSet gives deduplication plus deterministic ordering
        let mut files = BTreeSet::new();

        for pattern in &self.document_patterns {
            match expand_pattern(pattern) {
                Ok(matches) => files.extend(matches),
                Err(e) => warn!("Failed to expand pattern {pattern}: {e}"),
            }
        }

        Ok(files.into_iter().collect())
    }
}

// ── Pattern helpers ──────────────────────────────────────────────────

fn is_supported(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| SUPPORTED_EXTENSIONS.contains(&e.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// Expand a single pattern to matching document files.
///
/// A pattern without wildcards is treated as a literal file or directory;
/// directories are listed non-recursively.
fn expand_pattern(pattern: &str) -> Result<Vec<PathBuf>> {
    if !pattern.contains('*') && !pattern.contains('?') {
        let path = Path::new(pattern);
        if path.is_file() {
            return Ok(if is_supported(path) {
                vec![path.to_path_buf()]
            } else {
                Vec::new()
            });
        }
        if path.is_dir() {
            let mut files = Vec::new();
            for entry in std::fs::read_dir(path)? {
                let entry = entry?;
                let p = entry.path();
                if p.is_file() && is_supported(&p) {
                    files.push(p);
                }
            }
            return Ok(files);
        }
        return Ok(Vec::new());
    }

    let matches = glob::glob(pattern).context("invalid glob pattern")?;
    let mut files = Vec::new();
    for entry in matches.flatten() {
        if entry.is_file() && is_supported(&entry) {
            files.push(entry);
        }
    }
    Ok(files)
}

// ── Tests ────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.chunk_size, 1000);
        assert_eq!(config.chunk_overlap, 200);
        assert_eq!(config.model.dimensions, 384);
        assert_eq!(config.model.name, "all-MiniLM-L6-v2");
        assert_eq!(config.llm.model, "llama3.2");
        assert_eq!(config.llm.base_url, "http://localhost:11434");
        assert_eq!(config.search.top_k, 3);
        assert_eq!(config.server.port, 8000);
    }

    #[test]
    fn test_load_from_json() {
        let json = r#"{"chunk_size": 1500, "store_path": "./test.db"}"#;
        let config: Config = serde_json::from_str(json).unwrap();
        assert_eq!(config.chunk_size, 1500);
        assert_eq!(config.store_path, "./test.db");
        // Other fields should have defaults
        assert_eq!(config.chunk_overlap, 200);
        assert_eq!(config.model.dimensions, 384);
    }

    #[test]
    fn test_validate_ok() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_bad_chunk_size() {
        let mut config = Config::default();
        config.chunk_size = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_overlap_exceeds_chunk_size() {
        let mut config = Config::default();
        config.chunk_overlap = config.chunk_size;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_bad_min_score() {
        let mut config = Config::default();
        config.search.min_score = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_empty_patterns() {
        let mut config = Config::default();
        config.document_patterns = vec![];
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_serialization_roundtrip() {
        let config = Config::default();
        let json = serde_json::to_string_pretty(&config).unwrap();
        let parsed: Config = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.chunk_size, config.chunk_size);
        assert_eq!(parsed.store_path, config.store_path);
        assert_eq!(parsed.llm.model, config.llm.model);
    }

    #[test]
    fn test_expand_pattern_directory() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.pdf"), "x").unwrap();
        fs::write(dir.path().join("b.docx"), "x").unwrap();
        fs::write(dir.path().join("c.txt"), "x").unwrap();

        let files = expand_pattern(dir.path().to_str().unwrap()).unwrap();
        assert_eq!(files.len(), 2);
    }

    #[test]
    fn test_expand_pattern_glob() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.pdf"), "x").unwrap();
        fs::write(dir.path().join("b.docx"), "x").unwrap();

        let pattern = format!("{}/*.pdf", dir.path().display());
        let files = expand_pattern(&pattern).unwrap();
        assert_eq!(files.len(), 1);
        assert!(files[0].ends_with("a.pdf"));
    }

    #[test]
    fn test_expand_pattern_missing_path() {
        let files = expand_pattern("/nonexistent/docs").unwrap();
        assert!(files.is_empty());
    }

    #[test]
    fn test_document_files_deduplicated() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.pdf"), "x").unwrap();

        let dir_str = dir.path().to_str().unwrap().to_string();
        let mut config = Config::default();
        config.document_patterns = vec![dir_str.clone(), format!("{dir_str}/*.pdf")];

        let files = config.document_files().unwrap();
        assert_eq!(files.len(), 1);
    }
}
