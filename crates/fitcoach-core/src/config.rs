//! FitCoach configuration system.
//!
//! Values resolve as: explicit TOML > environment variable > default.
//! All external service coordinates (endpoint, API keys, deployment names,
//! web search provider) live here; the core logic never reads the
//! environment directly.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{FitCoachError, Result};
use crate::types::ModelSize;

/// Root configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FitCoachConfig {
    #[serde(default)]
    pub azure: AzureConfig,
    #[serde(default)]
    pub rag: RagConfig,
    #[serde(default)]
    pub web: WebSearchConfig,
    #[serde(default = "default_temperature")]
    pub default_temperature: f32,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

fn default_temperature() -> f32 { 0.7 }
fn default_max_tokens() -> u32 { 1024 }

impl Default for FitCoachConfig {
    fn default() -> Self {
        Self {
            azure: AzureConfig::default(),
            rag: RagConfig::default(),
            web: WebSearchConfig::default(),
            default_temperature: default_temperature(),
            max_tokens: default_max_tokens(),
        }
    }
}

/// Azure OpenAI service coordinates: one chat deployment plus one embedding
/// deployment per model size.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AzureConfig {
    #[serde(default)]
    pub endpoint: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_api_version")]
    pub api_version: String,
    #[serde(default)]
    pub chat_deployment: String,
    #[serde(default)]
    pub embed_small_deployment: String,
    #[serde(default)]
    pub embed_large_deployment: String,
}

fn default_api_version() -> String { "2024-10-21".into() }

impl Default for AzureConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            api_key: String::new(),
            api_version: default_api_version(),
            chat_deployment: String::new(),
            embed_small_deployment: String::new(),
            embed_large_deployment: String::new(),
        }
    }
}

impl AzureConfig {
    /// The embedding deployment configured for `size`, or a config error.
    /// Never falls back to the other size.
    pub fn embedding_deployment(&self, size: ModelSize) -> Result<&str> {
        let name = match size {
            ModelSize::Small => &self.embed_small_deployment,
            ModelSize::Large => &self.embed_large_deployment,
        };
        if name.is_empty() {
            return Err(FitCoachError::Config(format!(
                "No embedding deployment configured for model size '{size}'"
            )));
        }
        Ok(name)
    }
}

/// Retrieval and indexing parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RagConfig {
    /// Directory scanned for source PDFs/CSVs.
    #[serde(default = "default_resources_dir")]
    pub resources_dir: PathBuf,
    /// Directory holding the persisted corpus index artifacts.
    #[serde(default = "default_index_dir")]
    pub index_dir: PathBuf,
    #[serde(default = "default_model_size")]
    pub model_size: ModelSize,
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,
    /// Pages with extractable text below this ratio classify a PDF as scanned.
    #[serde(default = "default_text_ratio_threshold")]
    pub text_ratio_threshold: f64,
    #[serde(default = "default_k")]
    pub default_k: usize,
    #[serde(default = "default_score_threshold")]
    pub score_threshold: f32,
}

fn default_resources_dir() -> PathBuf { PathBuf::from("resources") }
fn default_index_dir() -> PathBuf { PathBuf::from("vectorstore/corpus__small") }
fn default_model_size() -> ModelSize { ModelSize::Small }
fn default_chunk_size() -> usize { 1000 }
fn default_chunk_overlap() -> usize { 200 }
fn default_text_ratio_threshold() -> f64 { 0.1 }
fn default_k() -> usize { 6 }
fn default_score_threshold() -> f32 { 0.75 }

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            resources_dir: default_resources_dir(),
            index_dir: default_index_dir(),
            model_size: default_model_size(),
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
            text_ratio_threshold: default_text_ratio_threshold(),
            default_k: default_k(),
            score_threshold: default_score_threshold(),
        }
    }
}

/// Web search provider selection and credentials.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebSearchConfig {
    #[serde(default = "default_web_provider")]
    pub provider: String,
    #[serde(default)]
    pub tavily_api_key: String,
    #[serde(default)]
    pub serpapi_api_key: String,
}

fn default_web_provider() -> String { "tavily".into() }

impl Default for WebSearchConfig {
    fn default() -> Self {
        Self {
            provider: default_web_provider(),
            tavily_api_key: String::new(),
            serpapi_api_key: String::new(),
        }
    }
}

impl FitCoachConfig {
    /// Load config from the default path, then apply environment overrides.
    pub fn load() -> Result<Self> {
        let path = Self::default_path();
        let mut config = if path.exists() {
            Self::load_from(&path)?
        } else {
            Self::default()
        };
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load config from a specific TOML file (no env overrides).
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| FitCoachError::Config(format!("Failed to read config: {e}")))?;
        let config: Self = toml::from_str(&content)
            .map_err(|e| FitCoachError::Config(format!("Failed to parse config: {e}")))?;
        Ok(config)
    }

    /// Get the default config path (~/.fitcoach/config.toml).
    pub fn default_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".fitcoach")
            .join("config.toml")
    }

    /// Fill unset fields from the environment.
    pub fn apply_env_overrides(&mut self) {
        fn env_or(current: &mut String, key: &str) {
            if current.is_empty()
                && let Ok(v) = std::env::var(key)
            {
                *current = v;
            }
        }

        env_or(&mut self.azure.endpoint, "AOAI_ENDPOINT");
        env_or(&mut self.azure.api_key, "AOAI_API_KEY");
        env_or(&mut self.azure.chat_deployment, "AOAI_DEPLOY_GPT4O_MINI");
        env_or(&mut self.azure.embed_small_deployment, "AOAI_DEPLOY_EMBED_3_SMALL");
        env_or(&mut self.azure.embed_large_deployment, "AOAI_DEPLOY_EMBED_3_LARGE");
        env_or(&mut self.web.tavily_api_key, "TAVILY_API_KEY");
        env_or(&mut self.web.serpapi_api_key, "SERPAPI_API_KEY");

        if let Ok(v) = std::env::var("WEB_SEARCH_PROVIDER") {
            self.web.provider = v.to_lowercase();
        }
        if let Ok(v) = std::env::var("RAG_INDEX_PATH") {
            self.rag.index_dir = PathBuf::from(v);
        }
        if let Ok(v) = std::env::var("RAG_RESOURCES_DIR") {
            self.rag.resources_dir = PathBuf::from(v);
        }
    }
}
