//! Configuration for ytsprint.
//!
//! Configuration sources (highest priority first):
//! 1. Environment variables (YTSPRINT_HOME, YTSPRINT_API_URL)
//! 2. Config file (.ytsprint/config.yaml)
//! 3. Defaults (~/.ytsprint, http://localhost:5001/api)
//!
//! Config file discovery:
//! - Searches current directory and parents for .ytsprint/config.yaml
//! - `paths.home` in the config file is relative to the .ytsprint/ directory

pub mod paths;

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::auth::allowlist::DEFAULT_ALLOWED_DOMAINS;
use crate::core::validation::MAX_UPLOAD_BYTES;
use crate::core::workflow::DuplicateCheckPolicy;

/// Default API root
pub const DEFAULT_API_URL: &str = "http://localhost:5001/api";

/// Default request timeout
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 30;

/// Global cached configuration (stores Result to handle init errors)
static CONFIG: OnceLock<Result<ResolvedConfig, String>> = OnceLock::new();

/// Raw config file schema (matches YAML structure)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub api: Option<ApiConfig>,
    #[serde(default)]
    pub auth: Option<AuthConfig>,
    #[serde(default)]
    pub submission: Option<SubmissionConfig>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PathsConfig {
    /// State directory (relative to .ytsprint/)
    pub home: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    pub base_url: Option<String>,
    pub timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    pub allowed_domains: Option<Vec<String>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SubmissionConfig {
    pub max_upload_bytes: Option<u64>,
    pub duplicate_check: Option<DuplicateCheckPolicy>,
}

/// Resolved configuration
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    /// Absolute path to ytsprint home (session state)
    pub home: PathBuf,
    /// Path to config file (if found)
    pub config_file: Option<PathBuf>,
    pub api: ApiSettings,
    pub auth: AuthSettings,
    pub submission: SubmissionSettings,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiSettings {
    pub base_url: String,
    pub timeout_seconds: u64,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
            timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthSettings {
    pub allowed_domains: Vec<String>,
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            allowed_domains: DEFAULT_ALLOWED_DOMAINS.iter().map(|d| d.to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionSettings {
    pub max_upload_bytes: u64,
    pub duplicate_check: DuplicateCheckPolicy,
}

impl Default for SubmissionSettings {
    fn default() -> Self {
        Self {
            max_upload_bytes: MAX_UPLOAD_BYTES,
            duplicate_check: DuplicateCheckPolicy::Strict,
        }
    }
}

/// Values taken from the environment
#[derive(Debug, Clone, Default)]
struct EnvOverrides {
    home: Option<PathBuf>,
    api_url: Option<String>,
}

impl EnvOverrides {
    fn from_env() -> Self {
        Self {
            home: std::env::var("YTSPRINT_HOME").ok().map(PathBuf::from),
            api_url: std::env::var("YTSPRINT_API_URL").ok(),
        }
    }
}

/// Find config file by searching current directory and parents
fn find_config_file() -> Option<PathBuf> {
    let mut current = std::env::current_dir().ok()?;

    loop {
        let config_path = current.join(".ytsprint").join("config.yaml");
        if config_path.exists() {
            return Some(config_path);
        }

        if !current.pop() {
            break;
        }
    }

    None
}

/// Load and parse config file
fn load_config_file(path: &Path) -> Result<ConfigFile> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    serde_yaml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Resolve a path that may be relative to `base`
fn resolve_path(base: &Path, path_str: &str) -> PathBuf {
    let path = PathBuf::from(path_str);
    if path.is_absolute() {
        path
    } else {
        base.join(path)
            .canonicalize()
            .unwrap_or_else(|_| base.join(path_str))
    }
}

/// Merge file settings, environment and defaults
fn resolve(
    config_path: Option<PathBuf>,
    file: ConfigFile,
    env: EnvOverrides,
    default_home: PathBuf,
) -> ResolvedConfig {
    let home = if let Some(env_home) = env.home {
        env_home
    } else if let (Some(home_path), Some(path)) = (&file.paths.home, &config_path) {
        let ytsprint_dir = path.parent().unwrap_or(Path::new("."));
        resolve_path(ytsprint_dir, home_path)
    } else {
        default_home
    };

    let mut api = ApiSettings::default();
    if let Some(cfg) = file.api {
        if let Some(base_url) = cfg.base_url {
            api.base_url = base_url;
        }
        if let Some(timeout) = cfg.timeout_seconds {
            api.timeout_seconds = timeout;
        }
    }
    if let Some(url) = env.api_url.filter(|u| !u.trim().is_empty()) {
        api.base_url = url;
    }
    api.base_url = api.base_url.trim_end_matches('/').to_string();

    let mut auth = AuthSettings::default();
    if let Some(domains) = file.auth.and_then(|a| a.allowed_domains) {
        if !domains.is_empty() {
            auth.allowed_domains = domains;
        }
    }

    let mut submission = SubmissionSettings::default();
    if let Some(cfg) = file.submission {
        if let Some(max) = cfg.max_upload_bytes {
            submission.max_upload_bytes = max;
        }
        if let Some(policy) = cfg.duplicate_check {
            submission.duplicate_check = policy;
        }
    }

    ResolvedConfig {
        home,
        config_file: config_path,
        api,
        auth,
        submission,
    }
}

/// Load configuration from all sources
fn load_config() -> Result<ResolvedConfig> {
    let default_home = dirs::home_dir()
        .context("Failed to determine home directory")?
        .join(".ytsprint");

    let config_path = find_config_file();
    let file = match &config_path {
        Some(path) => load_config_file(path)?,
        None => ConfigFile::default(),
    };

    Ok(resolve(config_path, file, EnvOverrides::from_env(), default_home))
}

/// Get the global configuration (loads once, then cached)
pub fn config() -> Result<&'static ResolvedConfig> {
    let result = CONFIG.get_or_init(|| load_config().map_err(|e| e.to_string()));

    match result {
        Ok(config) => Ok(config),
        Err(e) => anyhow::bail!("{}", e),
    }
}

/// Force reload configuration (useful for testing)
pub fn reload_config() -> Result<ResolvedConfig> {
    load_config()
}

/// Get the ytsprint home directory (session state).
pub fn ytsprint_home() -> Result<PathBuf> {
    Ok(config()?.home.clone())
}
