// Configuration Storage Service
// Handles config file read/write, version backup and env overrides

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::services::gateway::GATEWAY_DEFAULT_URL;

pub const UPSTREAM_DEFAULT_URL: &str = "https://api.groq.com/openai/v1/chat/completions";
pub const UPSTREAM_DEFAULT_MODEL: &str = "llama-3.3-70b-versatile";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("config I/O failed at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("unknown config key: {0}")]
    UnknownKey(String),
}

fn io_err(path: &Path) -> impl FnOnce(std::io::Error) -> ConfigError + '_ {
    move |source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppConfig {
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default)]
    pub gateway: GatewayConfig,
    #[serde(default)]
    pub detection: DetectionConfig,
    #[serde(default)]
    pub proxy: ProxyConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            version: default_version(),
            gateway: GatewayConfig::default(),
            detection: DetectionConfig::default(),
            proxy: ProxyConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayConfig {
    #[serde(default = "default_gateway_url")]
    pub url: String,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            url: default_gateway_url(),
            timeout_secs: None,
        }
    }
}

impl GatewayConfig {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectionConfig {
    #[serde(default = "default_min_input_chars")]
    pub min_input_chars: usize,
    #[serde(default = "default_max_prompt_chars")]
    pub max_prompt_chars: usize,
    /// Hard-coded score rewrites for known demo images. Off unless asked for.
    #[serde(default)]
    pub demo_overrides: bool,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            min_input_chars: default_min_input_chars(),
            max_prompt_chars: default_max_prompt_chars(),
            demo_overrides: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProxyConfig {
    #[serde(default = "default_listen")]
    pub listen: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_upstream_url")]
    pub upstream_url: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: i32,
    #[serde(default)]
    pub static_dir: Option<PathBuf>,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            port: default_port(),
            upstream_url: default_upstream_url(),
            model: default_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            static_dir: None,
        }
    }
}

fn default_version() -> String { env!("CARGO_PKG_VERSION").to_string() }
fn default_gateway_url() -> String { GATEWAY_DEFAULT_URL.to_string() }
fn default_min_input_chars() -> usize { 20 }
fn default_max_prompt_chars() -> usize { 3000 }
fn default_listen() -> String { "127.0.0.1".to_string() }
fn default_port() -> u16 { 3000 }
fn default_upstream_url() -> String { UPSTREAM_DEFAULT_URL.to_string() }
fn default_model() -> String { UPSTREAM_DEFAULT_MODEL.to_string() }
fn default_temperature() -> f64 { 0.1 }
fn default_max_tokens() -> i32 { 1024 }

impl AppConfig {
    /// Environment beats the file: `TRUELENS_GATEWAY_URL`, `GROQ_API_URL`, `PORT`.
    pub fn apply_env(&mut self) {
        if let Some(url) = non_empty_env("TRUELENS_GATEWAY_URL") {
            self.gateway.url = url;
        }
        if let Some(url) = non_empty_env("GROQ_API_URL") {
            self.proxy.upstream_url = url;
        }
        if let Some(port) = non_empty_env("PORT").and_then(|p| p.parse().ok()) {
            self.proxy.port = port;
        }
    }
}

impl AppConfig {
    /// Set one field by its dotted camelCase path, e.g. `proxy.port` or
    /// `detection.demoOverrides`. The value is read as JSON when it parses and
    /// as a plain string otherwise; the result must still fit the schema.
    pub fn set_value(&mut self, key: &str, raw: &str) -> Result<(), ConfigError> {
        let mut root = serde_json::to_value(&*self)?;
        let mut slot = &mut root;
        for part in key.split('.') {
            slot = slot
                .as_object_mut()
                .and_then(|obj| obj.get_mut(part))
                .ok_or_else(|| ConfigError::UnknownKey(key.to_string()))?;
        }
        *slot = serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()));
        *self = serde_json::from_value(root)?;
        Ok(())
    }
}

fn non_empty_env(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

pub struct ConfigStore {
    config_dir: PathBuf,
    config_file: PathBuf,
}

impl ConfigStore {
    pub fn new(config_dir: PathBuf) -> Self {
        let config_file = config_dir.join("config.json");
        Self { config_dir, config_file }
    }

    /// Store rooted at an explicit file; backups go next to it.
    pub fn at_file(config_file: PathBuf) -> Self {
        let config_dir = config_file
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        Self { config_dir, config_file }
    }

    /// Get default config directory
    pub fn default_config_dir() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("truelens"))
    }

    pub fn config_file(&self) -> &Path {
        &self.config_file
    }

    /// Ensure config directory exists
    pub fn ensure_dir(&self) -> Result<(), ConfigError> {
        fs::create_dir_all(&self.config_dir).map_err(io_err(&self.config_dir))
    }

    /// Load configuration from file, or defaults if there is none yet
    pub fn load(&self) -> Result<AppConfig, ConfigError> {
        if !self.config_file.exists() {
            return Ok(AppConfig::default());
        }

        let content = fs::read_to_string(&self.config_file).map_err(io_err(&self.config_file))?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Save configuration to file
    pub fn save(&self, config: &AppConfig) -> Result<(), ConfigError> {
        self.ensure_dir()?;

        if self.config_file.exists() {
            self.create_backup()?;
        }

        let content = serde_json::to_string_pretty(config)?;
        fs::write(&self.config_file, content).map_err(io_err(&self.config_file))
    }

    fn create_backup(&self) -> Result<(), ConfigError> {
        let backup_dir = self.config_dir.join("backups");
        fs::create_dir_all(&backup_dir).map_err(io_err(&backup_dir))?;

        let timestamp = chrono::Utc::now().format("%Y%m%d_%H%M%S%.3f");
        let backup_file = backup_dir.join(format!("config_{}.json", timestamp));

        fs::copy(&self.config_file, &backup_file).map_err(io_err(&backup_file))?;

        // Keep only last 10 backups
        self.cleanup_old_backups(&backup_dir, 10)
    }

    /// Remove old backups, keeping only the most recent N
    fn cleanup_old_backups(&self, backup_dir: &Path, keep: usize) -> Result<(), ConfigError> {
        let mut entries: Vec<_> = fs::read_dir(backup_dir)
            .map_err(io_err(backup_dir))?
            .filter_map(|e| e.ok())
            .filter(|e| e.path().extension().map_or(false, |ext| ext == "json"))
            .collect();

        if entries.len() <= keep {
            return Ok(());
        }

        // Names carry the timestamp, so lexical order is age order
        entries.sort_by_key(|e| e.file_name());

        for entry in entries.iter().take(entries.len() - keep) {
            let _ = fs::remove_file(entry.path());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.detection.min_input_chars, 20);
        assert_eq!(config.detection.max_prompt_chars, 3000);
        assert!(!config.detection.demo_overrides);
        assert!(config.gateway.timeout().is_none());
        assert_eq!(config.proxy.port, 3000);
        assert_eq!(config.proxy.model, UPSTREAM_DEFAULT_MODEL);
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let parsed: AppConfig =
            serde_json::from_str(r#"{"detection": {"demoOverrides": true}, "gateway": {"timeoutSecs": 5}}"#).unwrap();
        assert!(parsed.detection.demo_overrides);
        assert_eq!(parsed.detection.min_input_chars, 20);
        assert_eq!(parsed.gateway.timeout(), Some(Duration::from_secs(5)));
        assert_eq!(parsed.gateway.url, GATEWAY_DEFAULT_URL);
    }

    #[test]
    fn test_load_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let store = ConfigStore::new(dir.path().to_path_buf());
        let config = store.load().unwrap();
        assert_eq!(config.proxy.upstream_url, UPSTREAM_DEFAULT_URL);
    }

    #[test]
    fn test_save_and_reload_with_backup() {
        let dir = tempfile::tempdir().unwrap();
        let store = ConfigStore::new(dir.path().join("truelens"));

        let mut config = AppConfig::default();
        config.proxy.port = 4100;
        store.save(&config).unwrap();

        config.detection.max_prompt_chars = 1200;
        store.save(&config).unwrap();

        let loaded = store.load().unwrap();
        assert_eq!(loaded.proxy.port, 4100);
        assert_eq!(loaded.detection.max_prompt_chars, 1200);

        let backups = fs::read_dir(dir.path().join("truelens").join("backups")).unwrap().count();
        assert_eq!(backups, 1);
    }

    #[test]
    fn test_set_value_by_path() {
        let mut config = AppConfig::default();
        config.set_value("proxy.port", "4100").unwrap();
        config.set_value("detection.demoOverrides", "true").unwrap();
        config.set_value("gateway.url", "http://10.0.0.2:3000/api/groq").unwrap();
        config.set_value("gateway.timeoutSecs", "15").unwrap();

        assert_eq!(config.proxy.port, 4100);
        assert!(config.detection.demo_overrides);
        assert_eq!(config.gateway.url, "http://10.0.0.2:3000/api/groq");
        assert_eq!(config.gateway.timeout(), Some(Duration::from_secs(15)));
    }

    #[test]
    fn test_set_value_rejects_unknown_key_and_bad_type() {
        let mut config = AppConfig::default();
        assert!(matches!(
            config.set_value("proxy.colour", "blue"),
            Err(ConfigError::UnknownKey(_))
        ));
        assert!(matches!(
            config.set_value("proxy.port", "not a port"),
            Err(ConfigError::Parse(_))
        ));
        assert_eq!(config.proxy.port, 3000);
    }

    #[test]
    fn test_set_then_save_keeps_backups_bounded() {
        let dir = tempfile::tempdir().unwrap();
        let store = ConfigStore::at_file(dir.path().join("truelens.json"));
        store.save(&AppConfig::default()).unwrap();

        for port in 4000..4012u16 {
            let mut config = store.load().unwrap();
            config.set_value("proxy.port", &port.to_string()).unwrap();
            store.save(&config).unwrap();
            // backup names carry millisecond timestamps
            std::thread::sleep(Duration::from_millis(3));
        }

        assert_eq!(store.load().unwrap().proxy.port, 4011);
        let backups = fs::read_dir(dir.path().join("backups")).unwrap().count();
        assert_eq!(backups, 10);
    }

    #[test]
    fn test_parse_error_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("broken.json");
        fs::write(&file, "{ not json").unwrap();
        let store = ConfigStore::at_file(file);
        assert!(matches!(store.load(), Err(ConfigError::Parse(_))));
    }
}
