use crate::cli::{Cli, OutputFormat, VerbosityLevel};
use crate::validator::ValidationEngine;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Protocol ceiling on `<url>` entries per sitemap file
pub const PROTOCOL_MAX_URLS: usize = 50_000;

/// Default per-file entry limit, a third below the protocol ceiling
pub const DEFAULT_MAX_URLS_PER_FILE: usize = 33_333;

/// Protocol ceiling on uncompressed sitemap size (50 MiB)
pub const DEFAULT_MAX_FILE_SIZE_BYTES: u64 = 52_428_800;

/// Trait for abstracting environment variable access
pub trait EnvProvider {
    fn get(&self, key: &str) -> Option<String>;
}

/// System environment variable provider for production use
pub struct SystemEnvProvider;

impl EnvProvider for SystemEnvProvider {
    fn get(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlParsing(#[from] toml::de::Error),

    #[error("JSON parsing error: {0}")]
    JsonParsing(#[from] serde_json::Error),

    #[error("Configuration validation error: {0}")]
    Validation(String),

    #[error("Environment variable error: {0}")]
    Environment(String),

    #[error("Unsupported configuration file format: {0}")]
    UnsupportedFormat(String),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    pub generation: GenerationConfig,
    pub validation: ValidationConfig,
    pub output: OutputConfig,
}

/// Where and how sitemap files are produced; immutable once generation starts
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GenerationConfig {
    /// Directory the sitemap files are written into
    pub output_dir: PathBuf,
    /// Base URL relative entry locations are resolved against
    pub base_url: String,
    /// Base URL shard files are referenced under in the index (defaults to `base_url`)
    pub sitemap_base_url: Option<String>,
    /// Optional XSL stylesheet referenced from every document
    pub stylesheet_url: Option<String>,
    /// Maximum `<url>` entries per file
    pub max_urls_per_file: usize,
    /// Advisory size limit per file; oversized files are reported, not rejected
    pub max_file_size_bytes: u64,
}

impl GenerationConfig {
    pub fn new(output_dir: impl Into<PathBuf>, base_url: impl Into<String>) -> Self {
        Self {
            output_dir: output_dir.into(),
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    /// Base URL used for shard references in the index; a blank value falls
    /// back to `base_url`
    pub fn effective_sitemap_base_url(&self) -> &str {
        self.sitemap_base_url
            .as_deref()
            .filter(|url| !url.trim().is_empty())
            .unwrap_or(&self.base_url)
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("."),
            base_url: String::new(),
            sitemap_base_url: None,
            stylesheet_url: None,
            max_urls_per_file: DEFAULT_MAX_URLS_PER_FILE,
            max_file_size_bytes: DEFAULT_MAX_FILE_SIZE_BYTES,
        }
    }
}

/// Post-write schema validation settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ValidationConfig {
    /// Validate every written file
    pub enabled: bool,
    /// Validation engine
    pub engine: ValidationEngine,
    /// Validate shards concurrently
    pub parallel: bool,
    /// Worker threads for parallel validation (defaults to the CPU count)
    pub threads: Option<usize>,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            engine: ValidationEngine::Libxml2,
            parallel: false,
            threads: None,
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct OutputConfig {
    /// Output format
    pub format: OutputFormatConfig,
    /// Verbose output
    pub verbose: bool,
    /// Quiet mode (errors only)
    pub quiet: bool,
}

impl OutputConfig {
    pub fn verbosity(&self) -> VerbosityLevel {
        if self.quiet {
            VerbosityLevel::Quiet
        } else if self.verbose {
            VerbosityLevel::Verbose
        } else {
            VerbosityLevel::Normal
        }
    }
}

/// Output format configuration (serializable version of CLI OutputFormat)
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormatConfig {
    #[default]
    Human,
    Json,
    Summary,
}

impl From<OutputFormat> for OutputFormatConfig {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Human => OutputFormatConfig::Human,
            OutputFormat::Json => OutputFormatConfig::Json,
            OutputFormat::Summary => OutputFormatConfig::Summary,
        }
    }
}

impl From<OutputFormatConfig> for OutputFormat {
    fn from(format: OutputFormatConfig) -> Self {
        match format {
            OutputFormatConfig::Human => OutputFormat::Human,
            OutputFormatConfig::Json => OutputFormat::Json,
            OutputFormatConfig::Summary => OutputFormat::Summary,
        }
    }
}

fn parse_env<T: std::str::FromStr>(env: &impl EnvProvider, key: &str) -> Result<Option<T>> {
    match env.get(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::Environment(format!("Invalid {} value: {}", key, raw))),
        None => Ok(None),
    }
}

/// Configuration manager for loading and merging configurations
pub struct ConfigManager;

impl ConfigManager {
    /// Load configuration with precedence: defaults -> file -> environment -> CLI
    pub async fn load_config(cli: &Cli) -> Result<Config> {
        let mut config = match &cli.config {
            Some(config_path) => Self::load_from_file(config_path).await?,
            None => Self::find_config_file().await?.unwrap_or_default(),
        };

        config = Self::apply_environment_overrides(config)?;
        config = Self::merge_with_cli(config, cli);

        Self::validate_config(&config)?;

        Ok(config)
    }

    /// Load configuration from a file (TOML or JSON)
    pub async fn load_from_file(path: &Path) -> Result<Config> {
        let content = tokio::fs::read_to_string(path).await?;

        match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Ok(toml::from_str(&content)?),
            Some("json") => Ok(serde_json::from_str(&content)?),
            Some(ext) => Err(ConfigError::UnsupportedFormat(ext.to_string())),
            None => {
                if let Ok(config) = toml::from_str::<Config>(&content) {
                    Ok(config)
                } else {
                    Ok(serde_json::from_str(&content)?)
                }
            }
        }
    }

    /// Find a configuration file in the current directory, then the user config directory
    pub async fn find_config_file() -> Result<Option<Config>> {
        let config_names = [
            "sitemap-gen.toml",
            "sitemap-gen.json",
            ".sitemap-gen.toml",
            ".sitemap-gen.json",
        ];

        for name in &config_names {
            let path = PathBuf::from(name);
            if path.exists() {
                return Ok(Some(Self::load_from_file(&path).await?));
            }
        }

        if let Some(config_dir) = dirs::config_dir() {
            let app_config_dir = config_dir.join("sitemap-gen");
            for name in &config_names {
                let path = app_config_dir.join(name);
                if path.exists() {
                    return Ok(Some(Self::load_from_file(&path).await?));
                }
            }
        }

        Ok(None)
    }

    /// Apply environment variable overrides using the system environment
    pub fn apply_environment_overrides(config: Config) -> Result<Config> {
        Self::apply_environment_overrides_with(&SystemEnvProvider, config)
    }

    /// Apply environment variable overrides with a custom environment provider
    pub fn apply_environment_overrides_with(
        env: &impl EnvProvider,
        mut config: Config,
    ) -> Result<Config> {
        // Generation settings
        if let Some(dir) = env.get("SITEMAP_GEN_OUTPUT_DIR") {
            config.generation.output_dir = PathBuf::from(dir);
        }
        if let Some(base_url) = env.get("SITEMAP_GEN_BASE_URL") {
            config.generation.base_url = base_url;
        }
        if let Some(sitemap_base_url) = env.get("SITEMAP_GEN_SITEMAP_BASE_URL") {
            config.generation.sitemap_base_url = Some(sitemap_base_url);
        }
        if let Some(stylesheet) = env.get("SITEMAP_GEN_STYLESHEET_URL") {
            config.generation.stylesheet_url = Some(stylesheet).filter(|s| !s.is_empty());
        }
        if let Some(max_urls) = parse_env(env, "SITEMAP_GEN_MAX_URLS")? {
            config.generation.max_urls_per_file = max_urls;
        }
        if let Some(max_size) = parse_env(env, "SITEMAP_GEN_MAX_FILE_SIZE")? {
            config.generation.max_file_size_bytes = max_size;
        }

        // Validation settings
        if let Some(enabled) = parse_env(env, "SITEMAP_GEN_VALIDATE")? {
            config.validation.enabled = enabled;
        }
        if let Some(engine) = parse_env(env, "SITEMAP_GEN_VALIDATION_ENGINE")? {
            config.validation.engine = engine;
        }
        if let Some(parallel) = parse_env(env, "SITEMAP_GEN_PARALLEL")? {
            config.validation.parallel = parallel;
        }
        if let Some(threads) = parse_env(env, "SITEMAP_GEN_THREADS")? {
            config.validation.threads = Some(threads);
        }

        // Output settings
        if let Some(verbose) = parse_env(env, "SITEMAP_GEN_VERBOSE")? {
            config.output.verbose = verbose;
        }
        if let Some(quiet) = parse_env(env, "SITEMAP_GEN_QUIET")? {
            config.output.quiet = quiet;
        }
        if let Some(format) = env.get("SITEMAP_GEN_FORMAT") {
            config.output.format = match format.to_lowercase().as_str() {
                "human" => OutputFormatConfig::Human,
                "json" => OutputFormatConfig::Json,
                "summary" => OutputFormatConfig::Summary,
                _ => {
                    return Err(ConfigError::Environment(format!(
                        "Invalid SITEMAP_GEN_FORMAT value: {}",
                        format
                    )));
                }
            };
        }

        Ok(config)
    }

    /// Merge CLI arguments with configuration; only flags actually given override
    pub fn merge_with_cli(mut config: Config, cli: &Cli) -> Config {
        // Generation settings
        if let Some(dir) = &cli.output_dir {
            config.generation.output_dir = dir.clone();
        }
        if let Some(base_url) = &cli.base_url {
            config.generation.base_url = base_url.clone();
        }
        if let Some(sitemap_base_url) = &cli.sitemap_base_url {
            config.generation.sitemap_base_url = Some(sitemap_base_url.clone());
        }
        if let Some(stylesheet) = &cli.stylesheet_url {
            config.generation.stylesheet_url = Some(stylesheet.clone());
        }
        if let Some(max_urls) = cli.max_urls {
            config.generation.max_urls_per_file = max_urls;
        }
        if let Some(max_size) = cli.max_file_size {
            config.generation.max_file_size_bytes = max_size;
        }

        // Validation settings
        if cli.no_validate {
            config.validation.enabled = false;
        }
        if let Some(engine) = cli.engine {
            config.validation.engine = engine;
        }
        if cli.parallel {
            config.validation.parallel = true;
        }
        if cli.threads.is_some() {
            config.validation.threads = cli.threads;
        }

        // Output settings
        if let Some(format) = cli.output_format {
            config.output.format = format.into();
        }
        if cli.verbose {
            config.output.verbose = true;
            config.output.quiet = false;
        }
        if cli.quiet {
            config.output.quiet = true;
            config.output.verbose = false;
        }

        config
    }

    /// Validate configuration values
    pub fn validate_config(config: &Config) -> Result<()> {
        let generation = &config.generation;

        if generation.base_url.trim().is_empty() {
            return Err(ConfigError::Validation(
                "A base URL must be configured".to_string(),
            ));
        }

        if generation.max_urls_per_file == 0 {
            return Err(ConfigError::Validation(
                "Maximum URLs per file must be greater than 0".to_string(),
            ));
        }
        if generation.max_urls_per_file > PROTOCOL_MAX_URLS {
            return Err(ConfigError::Validation(format!(
                "Maximum URLs per file cannot exceed the protocol limit of {}",
                PROTOCOL_MAX_URLS
            )));
        }

        if generation.max_file_size_bytes == 0 {
            return Err(ConfigError::Validation(
                "Maximum file size must be greater than 0".to_string(),
            ));
        }

        if let Some(threads) = config.validation.threads {
            if threads == 0 {
                return Err(ConfigError::Validation(
                    "Number of threads must be greater than 0".to_string(),
                ));
            }
            if threads > 1000 {
                return Err(ConfigError::Validation(
                    "Number of threads cannot exceed 1000".to_string(),
                ));
            }
        }

        if config.output.verbose && config.output.quiet {
            return Err(ConfigError::Validation(
                "Cannot enable both verbose and quiet modes".to_string(),
            ));
        }

        Ok(())
    }

    /// Get the effective validation thread count
    pub fn get_thread_count(config: &ValidationConfig) -> usize {
        config.threads.unwrap_or_else(num_cpus::get)
    }
}
