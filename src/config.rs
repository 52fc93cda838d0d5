use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::PathBuf;

use crate::oracle::EXTRACTION_PROMPT;

/// Main application configuration structure
#[derive(Debug, Deserialize, Clone, Default)]
pub struct AppConfig {
    /// Gemini oracle settings
    #[serde(default)]
    pub gemini: GeminiConfig,
    /// Prompt overrides
    #[serde(default)]
    pub prompts: PromptsConfig,
    /// Markdown archive settings
    #[serde(default)]
    pub storage: StorageConfig,
    /// Network and subprocess timeouts
    #[serde(default)]
    pub fetch: FetchConfig,
}

/// Configuration for the Gemini model used for extraction
#[derive(Debug, Deserialize, Clone)]
pub struct GeminiConfig {
    /// API key for authentication (can also be set via the GEMINI_API_KEY
    /// environment variable)
    pub api_key: Option<String>,
    /// Model identifier (e.g., "gemini-2.0-flash")
    #[serde(default = "default_model")]
    pub model: String,
    /// Base URL for the API endpoint (for custom or proxy endpoints)
    #[serde(default = "default_gemini_base_url")]
    pub base_url: String,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: default_model(),
            base_url: default_gemini_base_url(),
        }
    }
}

/// Configuration for the prompts sent to the model
#[derive(Debug, Deserialize, Clone)]
pub struct PromptsConfig {
    /// Extraction prompt placed ahead of the collected source sections
    #[serde(default = "default_extraction_prompt")]
    pub extraction: String,
}

impl Default for PromptsConfig {
    fn default() -> Self {
        Self {
            extraction: default_extraction_prompt(),
        }
    }
}

/// Configuration for archiving extracted recipes as markdown files
#[derive(Debug, Deserialize, Clone, Default)]
pub struct StorageConfig {
    /// Whether archiving is enabled
    #[serde(default)]
    pub enabled: bool,
    /// Directory the markdown files are written to
    pub path: Option<PathBuf>,
}

/// Timeouts for the individual pipeline stages, in seconds
#[derive(Debug, Deserialize, Clone)]
pub struct FetchConfig {
    /// Webpage fetch timeout
    #[serde(default = "default_page_timeout")]
    pub page_timeout_secs: u64,
    /// Timeout for the metadata and caption probes
    #[serde(default = "default_metadata_timeout")]
    pub metadata_timeout_secs: u64,
    /// Timeout for the media download
    #[serde(default = "default_download_timeout")]
    pub download_timeout_secs: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            page_timeout_secs: default_page_timeout(),
            metadata_timeout_secs: default_metadata_timeout(),
            download_timeout_secs: default_download_timeout(),
        }
    }
}

// Default value functions
fn default_model() -> String {
    "gemini-2.0-flash".to_string()
}

fn default_gemini_base_url() -> String {
    "https://generativelanguage.googleapis.com".to_string()
}

fn default_extraction_prompt() -> String {
    EXTRACTION_PROMPT.to_string()
}

fn default_page_timeout() -> u64 {
    15
}

fn default_metadata_timeout() -> u64 {
    60
}

fn default_download_timeout() -> u64 {
    120
}

impl AppConfig {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded with the following priority (highest to lowest):
    /// 1. Environment variables with HARVEST__ prefix
    /// 2. config.toml file in current directory
    /// 3. Default values
    ///
    /// Environment variable format: HARVEST__GEMINI__API_KEY
    pub fn load() -> Result<Self, ConfigError> {
        load_config()
    }
}

/// Load configuration from file and environment variables
///
/// Every section has working defaults, so a missing config file and an empty
/// environment still produce a usable configuration.
pub fn load_config() -> Result<AppConfig, ConfigError> {
    let settings = Config::builder()
        // Optional config file (can be missing)
        .add_source(File::with_name("config").required(false))
        // Environment variables with HARVEST_ prefix
        // Use double underscore for nested: HARVEST__GEMINI__API_KEY
        .add_source(
            Environment::with_prefix("HARVEST")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    settings.try_deserialize()
}
