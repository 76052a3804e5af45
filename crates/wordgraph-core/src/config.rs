use crate::error::{Result, WordGraphError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

/// Main configuration for WordGraph.
///
/// Every section has serde defaults, so an empty (or absent) file yields a
/// fully usable configuration. Constructed once per run and passed by
/// reference to the components that need it.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct WordGraphConfig {
    /// File locations
    #[serde(default)]
    pub paths: PathConfig,

    /// Inference gateway settings
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Graph construction settings
    #[serde(default)]
    pub pipeline: PipelineConfig,

    /// Batch normalization and prompt generation settings
    #[serde(default)]
    pub batch: BatchConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathConfig {
    /// Directory holding the candidate batch files
    #[serde(default = "default_batches_dir")]
    pub batches_dir: PathBuf,

    /// The persisted word graph document
    #[serde(default = "default_graph_file")]
    pub graph_file: PathBuf,

    /// Prompt template for connection discovery
    #[serde(default = "default_links_prompt")]
    pub links_prompt: PathBuf,

    /// Prompt template for description generation
    #[serde(default = "default_description_prompt")]
    pub description_prompt: PathBuf,
}

impl Default for PathConfig {
    fn default() -> Self {
        Self {
            batches_dir: default_batches_dir(),
            graph_file: default_graph_file(),
            links_prompt: default_links_prompt(),
            description_prompt: default_description_prompt(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Base URL of the OpenAI-compatible API
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Environment variable holding the API key
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// Model for the analytical task of finding connections
    #[serde(default = "default_links_model")]
    pub links_model: String,

    /// Model for the creative task of writing descriptions
    #[serde(default = "default_description_model")]
    pub description_model: String,

    /// Sampling temperature for generation
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Maximum retries for failed requests
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_key_env: default_api_key_env(),
            links_model: default_links_model(),
            description_model: default_description_model(),
            temperature: default_temperature(),
            timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Number of related words to request per target word
    #[serde(default = "default_max_connections")]
    pub max_connections: usize,

    /// Fixed delay between consecutive gateway calls
    #[serde(default = "default_seconds_between_calls")]
    pub seconds_between_calls: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_connections: default_max_connections(),
            seconds_between_calls: default_seconds_between_calls(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Target number of words per batch file
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Minimum dimensions per generated tag combination
    #[serde(default = "default_combo_min")]
    pub combo_min: usize,

    /// Maximum dimensions per generated tag combination
    #[serde(default = "default_combo_max")]
    pub combo_max: usize,

    /// Consecutive rejected samples before the combination generator
    /// reports the space as exhausted
    #[serde(default = "default_sample_retry_ceiling")]
    pub sample_retry_ceiling: u64,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            combo_min: default_combo_min(),
            combo_max: default_combo_max(),
            sample_retry_ceiling: default_sample_retry_ceiling(),
        }
    }
}

fn default_batches_dir() -> PathBuf {
    PathBuf::from("candidate_batches")
}

fn default_graph_file() -> PathBuf {
    PathBuf::from("word_graph.json")
}

fn default_links_prompt() -> PathBuf {
    PathBuf::from("prompts/find_connections_prompt.txt")
}

fn default_description_prompt() -> PathBuf {
    PathBuf::from("prompts/generate_description_prompt.txt")
}

fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_api_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}

fn default_links_model() -> String {
    "gpt-4o".to_string()
}

fn default_description_model() -> String {
    "gpt-4o".to_string()
}

fn default_temperature() -> f32 {
    0.7
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_max_retries() -> u32 {
    3
}

fn default_max_connections() -> usize {
    5
}

fn default_seconds_between_calls() -> u64 {
    1
}

fn default_batch_size() -> usize {
    30
}

fn default_combo_min() -> usize {
    3
}

fn default_combo_max() -> usize {
    4
}

fn default_sample_retry_ceiling() -> u64 {
    10_000
}

/// Conventional config file name probed when no path is given.
const CONFIG_FILE: &str = "wordgraph.toml";

impl WordGraphConfig {
    /// Loads configuration from `path`, or from `wordgraph.toml` in the
    /// working directory when present, or defaults otherwise. An explicitly
    /// named file that cannot be read or parsed is a configuration error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => {
                let conventional = Path::new(CONFIG_FILE);
                if conventional.exists() {
                    Self::from_file(conventional)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            WordGraphError::Configuration(format!("cannot read config {}: {}", path.display(), e))
        })?;
        let config = toml::from_str(&raw).map_err(|e| {
            WordGraphError::Configuration(format!("cannot parse config {}: {}", path.display(), e))
        })?;
        info!("loaded configuration from {}", path.display());
        Ok(config)
    }

    pub fn combo_sizes(&self) -> std::ops::RangeInclusive<usize> {
        self.batch.combo_min..=self.batch.combo_max
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = WordGraphConfig::default();
        assert_eq!(config.pipeline.max_connections, 5);
        assert_eq!(config.pipeline.seconds_between_calls, 1);
        assert_eq!(config.batch.batch_size, 30);
        assert_eq!(config.combo_sizes(), 3..=4);
        assert_eq!(config.gateway.timeout_secs, 30);
        assert_eq!(config.paths.graph_file, PathBuf::from("word_graph.json"));
    }

    #[test]
    fn partial_file_keeps_defaults_for_the_rest() {
        let raw = r#"
            [pipeline]
            max_connections = 8

            [gateway]
            links_model = "gpt-4-turbo"
        "#;
        let config: WordGraphConfig = toml::from_str(raw).unwrap();
        assert_eq!(config.pipeline.max_connections, 8);
        assert_eq!(config.pipeline.seconds_between_calls, 1);
        assert_eq!(config.gateway.links_model, "gpt-4-turbo");
        assert_eq!(config.gateway.description_model, "gpt-4o");
    }

    #[test]
    fn missing_explicit_file_is_a_configuration_error() {
        let err = WordGraphConfig::load(Some(Path::new("/nonexistent/wordgraph.toml"))).unwrap_err();
        assert!(matches!(err, WordGraphError::Configuration(_)));
    }

    #[test]
    fn explicit_file_is_loaded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wordgraph.toml");
        std::fs::write(&path, "[batch]\nbatch_size = 12\n").unwrap();

        let config = WordGraphConfig::load(Some(&path)).unwrap();
        assert_eq!(config.batch.batch_size, 12);
    }

    #[test]
    fn unparseable_file_is_a_configuration_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wordgraph.toml");
        std::fs::write(&path, "batch_size = [not toml").unwrap();

        let err = WordGraphConfig::load(Some(&path)).unwrap_err();
        assert!(matches!(err, WordGraphError::Configuration(_)));
    }
}
