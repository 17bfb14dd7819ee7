//! Configuration management for fnship
//!
//! This module handles loading, parsing, validating, and managing
//! configuration from files, environment variables, and CLI overrides.

use crate::deploy::names::DEFAULT_REGION;
use crate::error::{FnshipError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration structure for fnship
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Target project settings
    #[serde(default)]
    pub project: ProjectConfig,

    /// Functions service and declaration settings
    #[serde(default)]
    pub functions: FunctionsConfig,

    /// Runtime config service settings
    #[serde(default)]
    pub runtime_config: RuntimeConfigSettings,

    /// Shared HTTP client settings
    #[serde(default)]
    pub http: HttpConfig,

    /// Deploy pipeline settings
    #[serde(default)]
    pub deploy: DeployConfig,
}

/// Target project settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// Project id; may also come from `--project` or `FNSHIP_PROJECT`
    #[serde(default)]
    pub id: Option<String>,

    /// Region used for functions that do not declare any
    #[serde(default = "default_region")]
    pub default_region: String,
}

fn default_region() -> String {
    DEFAULT_REGION.to_string()
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            id: None,
            default_region: default_region(),
        }
    }
}

/// Functions service and declaration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionsConfig {
    /// Functions API base URL
    #[serde(default = "default_functions_api")]
    pub api_base: String,

    /// Declaration manifest produced by source discovery
    #[serde(default = "default_manifest")]
    pub manifest: PathBuf,

    /// Runtime set on created and updated functions
    #[serde(default)]
    pub runtime: Option<String>,
}

fn default_functions_api() -> String {
    "https://cloudfunctions.googleapis.com".to_string()
}

fn default_manifest() -> PathBuf {
    PathBuf::from("functions/functions.yaml")
}

impl Default for FunctionsConfig {
    fn default() -> Self {
        Self {
            api_base: default_functions_api(),
            manifest: default_manifest(),
            runtime: None,
        }
    }
}

/// Runtime config service settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeConfigSettings {
    /// Embed a config snapshot into deployments
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Runtime config API base URL
    #[serde(default = "default_runtime_config_api")]
    pub api_base: String,

    /// Upper bound on in-flight remote requests per fan-out
    #[serde(default = "default_max_concurrent_requests")]
    pub max_concurrent_requests: usize,
}

fn default_enabled() -> bool {
    true
}

fn default_runtime_config_api() -> String {
    "https://runtimeconfig.googleapis.com".to_string()
}

fn default_max_concurrent_requests() -> usize {
    8
}

impl Default for RuntimeConfigSettings {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            api_base: default_runtime_config_api(),
            max_concurrent_requests: default_max_concurrent_requests(),
        }
    }
}

/// Shared HTTP client settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Request timeout (seconds)
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,

    /// Bearer token obtained by the authentication step
    #[serde(default, skip_serializing)]
    pub access_token: Option<String>,
}

fn default_timeout_seconds() -> u64 {
    60
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: default_timeout_seconds(),
            access_token: None,
        }
    }
}

/// Deploy pipeline settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeployConfig {
    /// Directory receiving the packaging hand-off files
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Value injected under the reserved `firebase` key of the config snapshot
    ///
    /// Defaults to `{"projectId": <project>}` when unset.
    #[serde(default)]
    pub platform_config: Option<serde_json::Map<String, serde_json::Value>>,
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(".fnship")
}

impl Default for DeployConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            platform_config: None,
        }
    }
}

impl Config {
    /// Load configuration from file with environment and CLI overrides
    ///
    /// # Arguments
    ///
    /// * `path` - Path to configuration file
    /// * `cli` - CLI arguments for overrides
    ///
    /// # Errors
    ///
    /// Returns error if the file exists but cannot be read or parsed
    pub fn load(path: &str, cli: &crate::cli::Cli) -> Result<Self> {
        let mut config = if Path::new(path).exists() {
            Self::from_file(path)?
        } else {
            tracing::warn!("Config file not found at {}, using defaults", path);
            Self::default()
        };

        config.apply_env_vars();
        config.apply_cli_overrides(cli);

        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| FnshipError::Config(format!("Failed to read config file: {}", e)))?;
        serde_yaml::from_str(&contents)
            .map_err(|e| FnshipError::Config(format!("Failed to parse config: {}", e)).into())
    }

    fn apply_env_vars(&mut self) {
        if let Ok(project) = std::env::var("FNSHIP_PROJECT") {
            self.project.id = Some(project);
        }

        if let Ok(region) = std::env::var("FNSHIP_DEFAULT_REGION") {
            self.project.default_region = region;
        }

        if let Ok(token) = std::env::var("FNSHIP_ACCESS_TOKEN") {
            self.http.access_token = Some(token);
        }

        if let Ok(api) = std::env::var("FNSHIP_FUNCTIONS_API") {
            self.functions.api_base = api;
        }

        if let Ok(api) = std::env::var("FNSHIP_RUNTIMECONFIG_API") {
            self.runtime_config.api_base = api;
        }

        if let Ok(max) = std::env::var("FNSHIP_MAX_CONCURRENT_REQUESTS") {
            match max.parse::<usize>() {
                Ok(v) => {
                    self.runtime_config.max_concurrent_requests = v;
                    tracing::debug!(
                        max_concurrent = v,
                        "Env override: FNSHIP_MAX_CONCURRENT_REQUESTS"
                    );
                }
                Err(_) => {
                    tracing::warn!("Invalid FNSHIP_MAX_CONCURRENT_REQUESTS: {}", max);
                }
            }
        }

        if let Ok(timeout) = std::env::var("FNSHIP_TIMEOUT_SECONDS") {
            if let Ok(value) = timeout.parse() {
                self.http.timeout_seconds = value;
            } else {
                tracing::warn!("Invalid FNSHIP_TIMEOUT_SECONDS: {}", timeout);
            }
        }
    }

    fn apply_cli_overrides(&mut self, cli: &crate::cli::Cli) {
        if let Some(project) = &cli.project {
            self.project.id = Some(project.clone());
        }
        if cli.verbose {
            tracing::debug!("Verbose mode enabled");
        }
    }

    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns error if any validation check fails
    pub fn validate(&self) -> Result<()> {
        if self.project.default_region.trim().is_empty() {
            return Err(
                FnshipError::Config("project.default_region cannot be empty".to_string()).into(),
            );
        }

        for (field, base) in [
            ("functions.api_base", &self.functions.api_base),
            ("runtime_config.api_base", &self.runtime_config.api_base),
        ] {
            url::Url::parse(base).map_err(|e| {
                FnshipError::Config(format!("{} is not a valid URL ({}): {}", field, base, e))
            })?;
        }

        if self.runtime_config.max_concurrent_requests == 0 {
            return Err(FnshipError::Config(
                "runtime_config.max_concurrent_requests must be greater than 0".to_string(),
            )
            .into());
        }

        if self.http.timeout_seconds == 0 {
            return Err(
                FnshipError::Config("http.timeout_seconds must be greater than 0".to_string())
                    .into(),
            );
        }

        if let Some(id) = &self.project.id {
            if id.trim().is_empty() {
                return Err(FnshipError::Config("project.id cannot be empty".to_string()).into());
            }
        }

        Ok(())
    }

    /// The project id, required by every remote command
    ///
    /// # Errors
    ///
    /// Returns error if no project was configured
    pub fn project_id(&self) -> Result<&str> {
        self.project.id.as_deref().ok_or_else(|| {
            FnshipError::Config(
                "No project specified. Pass --project, set FNSHIP_PROJECT, or set project.id in the config file"
                    .to_string(),
            )
            .into()
        })
    }

    /// Value injected under the reserved key of the config snapshot
    pub fn platform_config(&self, project: &str) -> serde_json::Value {
        match &self.deploy.platform_config {
            Some(map) => serde_json::Value::Object(map.clone()),
            None => serde_json::json!({ "projectId": project }),
        }
    }
}
