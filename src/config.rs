use crate::error::{CheckAiError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const DEFAULT_BACKEND_URL: &str = "http://localhost:8000";
pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";

/// Persisted client configuration. The Ollama URL is the user-editable
/// setting; changes are written back immediately so they survive sessions.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub backend_url: String,
    pub ollama_url: String,
    pub timeout_seconds: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend_url: DEFAULT_BACKEND_URL.into(),
            ollama_url: DEFAULT_OLLAMA_URL.into(),
            timeout_seconds: 300,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let config: Config = serde_json::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(&config_path, content)?;
        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| CheckAiError::Config("home directory not found".into()))?;
        Ok(home.join(".config").join("check-ai").join("config.json"))
    }

    pub fn set_ollama_url(&mut self, url: String) -> Result<()> {
        self.ollama_url = url;
        self.save()
    }

    pub fn set_backend_url(&mut self, url: String) -> Result<()> {
        self.backend_url = url;
        self.save()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_point_at_local_services() {
        let config = Config::default();
        assert_eq!(config.backend_url, "http://localhost:8000");
        assert_eq!(config.ollama_url, "http://localhost:11434");
        assert!(config.timeout_seconds > 0);
    }

    #[test]
    fn partial_config_files_fill_in_defaults() {
        let config: Config =
            serde_json::from_str(r#"{"ollama_url": "http://10.0.0.5:11434"}"#).unwrap();
        assert_eq!(config.ollama_url, "http://10.0.0.5:11434");
        assert_eq!(config.backend_url, DEFAULT_BACKEND_URL);
    }
}
