//! Configuration module for basenet
//!
//! Handles loading and merging configuration from multiple sources:
//! - Default values
//! - User configuration (~/.basenet/config.yaml)
//! - Project configuration (./basenet.yaml, ./basenet.toml, ./basenet.json)
//! - Environment variables
//! - Command-line arguments

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

use crate::graph::StackContext;
use crate::settings::{ShapePolicy, StackValues};

/// Region used when neither the stack file nor the environment names one
pub const DEFAULT_REGION: &str = "us-east-1";

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Project name, used in resource names and as the key namespace
    pub project: String,

    /// Stack name
    pub stack: String,

    /// AWS region
    pub region: Option<String>,

    /// Fail on malformed values instead of falling back to defaults
    pub strict_config: bool,

    /// Logging settings
    pub logging: LoggingConfig,

    /// Network configuration values read by the settings resolver
    pub config: Map<String, Value>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            project: "basenet".to_string(),
            stack: "dev".to_string(),
            region: None,
            strict_config: false,
            logging: LoggingConfig::default(),
            config: Map::new(),
        }
    }
}

/// Logging settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level used when neither `-v` nor `RUST_LOG` is given
    pub log_level: String,

    /// Log format: `text` or `json`
    pub log_format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_level: "warn".to_string(),
            log_format: "text".to_string(),
        }
    }
}

impl LoggingConfig {
    /// Fields the later file leaves at their default keep the earlier value
    fn merge(&self, other: LoggingConfig) -> LoggingConfig {
        let defaults = LoggingConfig::default();
        LoggingConfig {
            log_level: if other.log_level != defaults.log_level {
                other.log_level
            } else {
                self.log_level.clone()
            },
            log_format: if other.log_format != defaults.log_format {
                other.log_format
            } else {
                self.log_format.clone()
            },
        }
    }
}

impl Config {
    /// Load configuration from all sources
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        let mut config = Config::default();

        // Load from standard locations
        let config_paths = Self::get_config_paths(config_path);

        for path in config_paths {
            if path.exists() {
                config = config.merge_from_file(&path)?;
            }
        }

        // Apply environment variable overrides
        config.apply_env_overrides();

        Ok(config)
    }

    /// Get the list of configuration file paths to check, lowest priority first
    fn get_config_paths(explicit_path: Option<&PathBuf>) -> Vec<PathBuf> {
        let mut paths = Vec::new();

        // Explicit path takes priority
        if let Some(path) = explicit_path {
            paths.push(path.clone());
            return paths;
        }

        // User config
        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".basenet/config.yaml"));
        }

        // Project config (current directory)
        paths.push(PathBuf::from("basenet.yaml"));
        paths.push(PathBuf::from("basenet.toml"));
        paths.push(PathBuf::from("basenet.json"));

        // Environment variable
        if let Ok(env_config) = std::env::var("BASENET_CONFIG") {
            paths.push(PathBuf::from(env_config));
        }

        paths
    }

    /// Merge configuration from a file
    fn merge_from_file(&self, path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        // Determine format based on extension
        let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("");

        let file_config: Config = match extension {
            "yml" | "yaml" => serde_yaml::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?,
            "json" => serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?,
            "toml" => toml::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?,
            _ => {
                // Try YAML first, then TOML
                serde_yaml::from_str::<Config>(&content)
                    .map_err(anyhow::Error::from)
                    .or_else(|_| toml::from_str::<Config>(&content).map_err(anyhow::Error::from))
                    .with_context(|| format!("Failed to parse config file: {}", path.display()))?
            }
        };

        Ok(self.merge(file_config))
    }

    /// Merge another config into this one
    fn merge(&self, other: Config) -> Config {
        let defaults = Config::default();
        Config {
            project: if other.project != defaults.project {
                other.project
            } else {
                self.project.clone()
            },
            stack: if other.stack != defaults.stack {
                other.stack
            } else {
                self.stack.clone()
            },
            region: other.region.or_else(|| self.region.clone()),
            strict_config: other.strict_config || self.strict_config,
            logging: self.logging.merge(other.logging),
            config: {
                let mut values = self.config.clone();
                values.extend(other.config);
                values
            },
        }
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&mut self) {
        // BASENET_PROJECT
        if let Ok(project) = std::env::var("BASENET_PROJECT") {
            self.project = project;
        }

        // BASENET_STACK
        if let Ok(stack) = std::env::var("BASENET_STACK") {
            self.stack = stack;
        }

        // BASENET_REGION, then AWS_REGION
        if let Ok(region) = std::env::var("BASENET_REGION").or_else(|_| std::env::var("AWS_REGION")) {
            self.region = Some(region);
        }

        // BASENET_STRICT_CONFIG
        if let Ok(strict) = std::env::var("BASENET_STRICT_CONFIG") {
            self.strict_config = matches!(
                strict.to_lowercase().as_str(),
                "1" | "true" | "yes" | "on"
            );
        }

        // BASENET_LOG_LEVEL
        if let Ok(level) = std::env::var("BASENET_LOG_LEVEL") {
            self.logging.log_level = level;
        }
    }

    /// Get the effective region
    pub fn region(&self) -> &str {
        self.region.as_deref().unwrap_or(DEFAULT_REGION)
    }

    /// Get the shape policy for network configuration values
    pub fn shape_policy(&self) -> ShapePolicy {
        if self.strict_config {
            ShapePolicy::Strict
        } else {
            ShapePolicy::Lenient
        }
    }

    /// Network configuration values, namespaced by project
    pub fn stack_values(&self) -> StackValues {
        StackValues::new(self.config.clone()).with_namespace(self.project.clone())
    }

    /// Project, stack and region of this run
    pub fn stack_context(&self) -> StackContext {
        StackContext::new(self.project.clone(), self.stack.clone(), self.region())
    }

    /// Load from a specific file only
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        Config::default().merge_from_file(path.as_ref())
    }
}
