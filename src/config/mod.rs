//! Configuration loading and management.

use std::path::{Path, PathBuf};

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::core::Result;

/// Main configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Bug-report dataset configuration.
    pub dataset: DatasetConfig,
    /// Candidate repository configuration.
    pub repository: RepositoryConfig,
    /// Pre-trained embedding table configuration.
    pub embedding: EmbeddingConfig,
    /// Similarity scoring configuration.
    pub similarity: SimilarityConfig,
    /// 2D projection configuration.
    pub projection: ProjectionConfig,
    /// HTTP server configuration.
    pub server: ServerConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            dataset: DatasetConfig::default(),
            repository: RepositoryConfig::default(),
            embedding: EmbeddingConfig::default(),
            similarity: SimilarityConfig::default(),
            projection: ProjectionConfig::default(),
            server: ServerConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from an explicit file path.
    ///
    /// Errors if the file does not exist. Use this for explicit `--config` flags.
    /// Env vars with `DOWSER_` prefix override file values.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(crate::core::Error::Config(format!(
                "config file not found: {}",
                path.display()
            )));
        }
        let config: Self = Figment::from(Serialized::defaults(Self::default()))
            .merge(Toml::file_exact(path))
            .merge(Env::prefixed("DOWSER_").split("__"))
            .extract()
            .map_err(|e| crate::core::Error::Config(e.to_string()))?;
        Ok(config)
    }

    /// Load configuration from directory, looking for dowser.toml.
    ///
    /// A missing file is silently skipped (defaults are used).
    /// Env vars with `DOWSER_` prefix override file/default values.
    pub fn load_default(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        let config: Self = Figment::from(Serialized::defaults(Self::default()))
            .merge(Toml::file(dir.join("dowser.toml")))
            .merge(Env::prefixed("DOWSER_").split("__"))
            .extract()
            .map_err(|e| crate::core::Error::Config(e.to_string()))?;
        Ok(config)
    }

    /// Create default config file content.
    pub fn default_toml() -> &'static str {
        include_str!("default_config.toml")
    }
}

/// Bug-report dataset configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatasetConfig {
    /// Path to the CSV file mapping bug ids to summary, description, and commit.
    pub path: PathBuf,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("dataset/bug-reports.csv"),
        }
    }
}

/// Candidate repository configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RepositoryConfig {
    /// Working tree holding the candidate source files.
    pub path: PathBuf,
    /// File extensions treated as candidates.
    pub extensions: Vec<String>,
    /// Skip files whose path contains a test segment.
    pub exclude_tests: bool,
    /// Additional exclude patterns (glob).
    #[serde(rename = "exclude")]
    pub exclude_patterns: Vec<String>,
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("repo"),
            extensions: vec!["java".to_string()],
            exclude_tests: true,
            exclude_patterns: Vec::new(),
        }
    }
}

/// Pre-trained embedding table configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// Path to the word-vector file (one word + D floats per line).
    pub path: PathBuf,
    /// Vector dimension D; every line must carry exactly this many floats.
    pub dimension: usize,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("dataset/glove.6B.300d.txt"),
            dimension: 300,
        }
    }
}

/// Similarity scoring configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimilarityConfig {
    /// Additive smoothing on the common-word count.
    pub smoothing: f64,
    /// Drop stop words after stemming.
    pub filter_stopwords: bool,
    /// Number of ranked files returned per request.
    pub top_files: usize,
    /// Number of most-relevant word indices kept per file.
    pub top_words: usize,
    /// Length of the quick-display shortlist.
    pub shortlist: usize,
}

impl Default for SimilarityConfig {
    fn default() -> Self {
        Self {
            smoothing: 1.0,
            filter_stopwords: true,
            top_files: 100,
            top_words: 100,
            shortlist: 10,
        }
    }
}

/// 2D projection configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectionConfig {
    /// t-SNE perplexity; clamped to the sample count at runtime.
    pub perplexity: f64,
    /// t-SNE gradient-descent epochs.
    pub epochs: usize,
}

impl Default for ProjectionConfig {
    fn default() -> Self {
        Self {
            perplexity: 30.0,
            epochs: 1000,
        }
    }
}

/// HTTP server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address.
    pub host: String,
    /// Bind port.
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 6440,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.embedding.dimension, 300);
        assert_eq!(config.similarity.top_files, 100);
        assert_eq!(config.similarity.shortlist, 10);
        assert!(config.similarity.filter_stopwords);
    }

    #[test]
    fn test_smoothing_default_is_one() {
        let config = Config::default();
        assert!((config.similarity.smoothing - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_config_from_file() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "dowser.toml",
                "[similarity]\ntop_files = 50\nsmoothing = 1e-6",
            )?;
            let config = Config::from_file("dowser.toml").unwrap();
            assert_eq!(config.similarity.top_files, 50);
            assert!(config.similarity.smoothing < 1e-5);
            Ok(())
        });
    }

    #[test]
    fn test_config_load_default_no_file() {
        Jail::expect_with(|_jail| {
            let config = Config::load_default(".").unwrap();
            assert_eq!(config.embedding.dimension, 300);
            Ok(())
        });
    }

    #[test]
    fn test_from_file_errors_on_missing_file() {
        let result = Config::from_file("/nonexistent/path/dowser.toml");
        assert!(result.is_err());
        let err = result.unwrap_err().to_string();
        assert!(err.contains("not found"), "expected 'not found' in: {err}");
    }

    #[test]
    fn test_env_var_overrides_file_value() {
        Jail::expect_with(|jail| {
            jail.create_file("dowser.toml", "[embedding]\ndimension = 100")?;
            jail.set_env("DOWSER_EMBEDDING__DIMENSION", "50");
            let config = Config::from_file("dowser.toml").unwrap();
            assert_eq!(config.embedding.dimension, 50);
            Ok(())
        });
    }

    #[test]
    fn test_repository_defaults() {
        let config = RepositoryConfig::default();
        assert_eq!(config.extensions, vec!["java".to_string()]);
        assert!(config.exclude_tests);
    }

    #[test]
    fn test_config_default_toml() {
        let content = Config::default_toml();
        assert!(!content.is_empty());
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::default();
        let json = serde_json::to_string(&config).unwrap();
        assert!(json.contains("similarity"));
        assert!(json.contains("top_files"));
    }
}
