use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

use crate::vastu_dir;

pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Which text-generation backend the interpreter should try before its heuristics.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Heuristics only.
    #[default]
    None,
    /// A local Ollama server.
    Ollama,
    /// A hosted provider (openai, anthropic, ...).
    Provider,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub backend: BackendKind,
    pub ollama_url: String,
    pub provider: String,
    pub api_key: String,
    pub model: String,
    pub timeout_secs: u64,
    /// Optional JSON rule catalog replacing the built-in one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub catalog_path: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            backend: BackendKind::None,
            ollama_url: DEFAULT_OLLAMA_URL.to_string(),
            provider: String::new(),
            api_key: String::new(),
            model: String::new(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            catalog_path: None,
        }
    }
}

impl Settings {
    /// Apply `VASTU_*` environment overrides on top of the file values.
    pub fn with_env(self) -> Self {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    fn with_overrides(mut self, var: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(backend) = var("VASTU_BACKEND") {
            match backend.to_ascii_lowercase().as_str() {
                "ollama" => self.backend = BackendKind::Ollama,
                "provider" => self.backend = BackendKind::Provider,
                "none" | "" => self.backend = BackendKind::None,
                other => tracing::warn!(backend = other, "ignoring unknown VASTU_BACKEND"),
            }
        }
        if let Some(url) = var("VASTU_OLLAMA_URL") {
            self.ollama_url = url;
        }
        if let Some(model) = var("VASTU_MODEL") {
            self.model = model;
        }
        if let Some(secs) = var("VASTU_TIMEOUT_SECS").and_then(|s| s.parse().ok()) {
            self.timeout_secs = secs;
        }
        self
    }
}

fn settings_path() -> PathBuf {
    vastu_dir().join("settings.json")
}

/// Read settings from disk. A missing or unreadable file yields defaults.
pub fn read_settings() -> Settings {
    let path = settings_path();
    if !path.exists() {
        return Settings::default();
    }
    fs::read_to_string(&path)
        .ok()
        .and_then(|s| serde_json::from_str(&s).ok())
        .unwrap_or_default()
}

pub fn write_settings(settings: &Settings) -> crate::Result<()> {
    fs::create_dir_all(vastu_dir())?;
    let json = serde_json::to_string_pretty(settings)?;
    fs::write(settings_path(), json)?;
    Ok(())
}

/// Whether the selected backend has everything it needs to be probed.
pub fn ai_configured(settings: &Settings) -> bool {
    match settings.backend {
        BackendKind::None => false,
        BackendKind::Ollama => !settings.ollama_url.is_empty(),
        BackendKind::Provider => {
            !settings.provider.is_empty()
                && !settings.model.is_empty()
                && (settings.provider == "ollama" || !settings.api_key.is_empty())
        }
    }
}
