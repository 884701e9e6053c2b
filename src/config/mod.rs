use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub fallback: FallbackConfig,
    #[serde(default)]
    pub demo: DemoConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    /// Which API target to talk to when no explicit `base_url` is set
    #[serde(default = "default_environment")]
    pub environment: ApiEnvironment,
    /// Base URL used in development (the local dev proxy)
    #[serde(default = "default_development_url")]
    pub development_url: String,
    /// Base URL used in production (versioned API root)
    #[serde(default = "default_production_url")]
    pub production_url: String,
    /// Explicit override, wins over both environment targets
    pub base_url: Option<String>,
    /// Request timeout in seconds (default: 15)
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            environment: default_environment(),
            development_url: default_development_url(),
            production_url: default_production_url(),
            base_url: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl ApiConfig {
    /// Resolve the base URL requests are sent to, without a trailing slash.
    pub fn resolved_base_url(&self) -> String {
        let url = match (&self.base_url, &self.environment) {
            (Some(url), _) => url.as_str(),
            (None, ApiEnvironment::Development) => self.development_url.as_str(),
            (None, ApiEnvironment::Production) => self.production_url.as_str(),
        };
        url.trim_end_matches('/').to_string()
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn default_environment() -> ApiEnvironment {
    ApiEnvironment::Production
}

fn default_development_url() -> String {
    "http://localhost:3000/api".to_string()
}

fn default_production_url() -> String {
    "https://bootcamps-xarala-back-production.up.railway.app/api/v1".to_string()
}

fn default_timeout_secs() -> u64 {
    15
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ApiEnvironment {
    Development,
    Production,
}

impl std::fmt::Display for ApiEnvironment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Development => write!(f, "development"),
            Self::Production => write!(f, "production"),
        }
    }
}

impl std::str::FromStr for ApiEnvironment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "development" | "dev" => Ok(Self::Development),
            "production" | "prod" => Ok(Self::Production),
            _ => Err(format!("Unknown environment: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    /// File holding the persisted session keys
    #[serde(default = "default_storage_path")]
    pub storage_path: PathBuf,
    /// Where the user is sent when the session cannot be refreshed
    #[serde(default = "default_login_path")]
    pub login_path: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            storage_path: default_storage_path(),
            login_path: default_login_path(),
        }
    }
}

fn default_storage_path() -> PathBuf {
    PathBuf::from("./data/session.json")
}

fn default_login_path() -> String {
    "/admin/login".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct FallbackConfig {
    /// Serve fixture data when a read cannot reach the API
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_bootcamp_list_delay_ms")]
    pub bootcamp_list_delay_ms: u64,
    #[serde(default = "default_lead_list_delay_ms")]
    pub lead_list_delay_ms: u64,
    #[serde(default = "default_item_delay_ms")]
    pub item_delay_ms: u64,
}

impl Default for FallbackConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            bootcamp_list_delay_ms: default_bootcamp_list_delay_ms(),
            lead_list_delay_ms: default_lead_list_delay_ms(),
            item_delay_ms: default_item_delay_ms(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_bootcamp_list_delay_ms() -> u64 {
    1000
}

fn default_lead_list_delay_ms() -> u64 {
    800
}

fn default_item_delay_ms() -> u64 {
    500
}

#[derive(Debug, Clone, Deserialize)]
pub struct DemoConfig {
    /// Accept the demo credentials offline when the login endpoint is unreachable
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_demo_email")]
    pub email: String,
    #[serde(default = "default_demo_password")]
    pub password: String,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            email: default_demo_email(),
            password: default_demo_password(),
        }
    }
}

fn default_demo_email() -> String {
    "admin@xarala.sn".to_string()
}

fn default_demo_password() -> String {
    "admin123".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        if path.exists() {
            info!("Loading configuration from {}", path.display());
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            let config: Config = toml::from_str(&content)
                .with_context(|| "Failed to parse configuration file")?;
            Ok(config)
        } else {
            info!("No config file found, using defaults");
            Ok(Config::default())
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api: ApiConfig::default(),
            session: SessionConfig::default(),
            fallback: FallbackConfig::default(),
            demo: DemoConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.api.environment, ApiEnvironment::Production);
        assert_eq!(config.api.timeout_secs, 15);
        assert_eq!(config.session.login_path, "/admin/login");
        assert!(config.fallback.enabled);
        assert!(config.fallback.bootcamp_list_delay_ms > config.fallback.item_delay_ms);
        assert!(config.fallback.lead_list_delay_ms > config.fallback.item_delay_ms);
        assert_eq!(config.demo.email, "admin@xarala.sn");
    }

    #[test]
    fn test_resolved_base_url() {
        let mut api = ApiConfig::default();
        assert_eq!(
            api.resolved_base_url(),
            "https://bootcamps-xarala-back-production.up.railway.app/api/v1"
        );

        api.environment = ApiEnvironment::Development;
        assert_eq!(api.resolved_base_url(), "http://localhost:3000/api");

        api.base_url = Some("http://127.0.0.1:9000/api/".to_string());
        assert_eq!(api.resolved_base_url(), "http://127.0.0.1:9000/api");
    }

    #[test]
    fn test_environment_from_str() {
        assert_eq!("dev".parse::<ApiEnvironment>(), Ok(ApiEnvironment::Development));
        assert_eq!("PROD".parse::<ApiEnvironment>(), Ok(ApiEnvironment::Production));
        assert!("staging".parse::<ApiEnvironment>().is_err());
    }

    #[test]
    fn test_load_partial_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bootcamp-admin.toml");
        std::fs::write(
            &path,
            r#"
[api]
environment = "development"
timeout_secs = 5

[fallback]
enabled = false
"#,
        )
        .unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.api.environment, ApiEnvironment::Development);
        assert_eq!(config.api.timeout_secs, 5);
        assert!(!config.fallback.enabled);
        assert_eq!(config.fallback.item_delay_ms, 500);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let config = Config::load(&dir.path().join("missing.toml")).unwrap();
        assert_eq!(config.api.timeout_secs, 15);
    }
}
