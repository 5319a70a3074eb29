//! Loader for HealthTrust settings with YAML + environment overlays.
//!
//! Precedence, lowest first: built-in defaults, YAML files/snippets,
//! `HEALTHTRUST__SECTION__KEY` environment variables. String values may use
//! `${VAR}` placeholders which are expanded after merging. Placeholders whose
//! variable is unset stay verbatim and are treated as absent by the accessors.
//!
//! The variable names of the original web build (`VITE_ALLE_AI_API_KEY`,
//! `VITE_ALLE_AI_API_URL`, `VITE_API_BASE_URL`) are honoured as fallbacks.
use config::{Config, ConfigError, Environment, File, FileFormat};
use healthtrust_common::observability::LogFormat;
use serde::Deserialize;
use serde_json::Value;
use std::path::{Path, PathBuf};

const MAXIMUM_ENV_EXPANSION_DEPTH: usize = 8;

pub const DEFAULT_AI_BASE_URL: &str = "https://api.alle-ai.com/api/v1";
pub const DEFAULT_AI_MODEL: &str = "gpt-4o";
pub const DEFAULT_BACKEND_URL: &str = "http://localhost:3001/api";

pub const LEGACY_AI_KEY_ENV: &str = "VITE_ALLE_AI_API_KEY";
pub const LEGACY_AI_URL_ENV: &str = "VITE_ALLE_AI_API_URL";
pub const LEGACY_BACKEND_URL_ENV: &str = "VITE_API_BASE_URL";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct HealthTrustConfig {
    #[serde(default)]
    pub ai: AiSettings,
    #[serde(default)]
    pub backend: BackendSettings,
    #[serde(default)]
    pub session: SessionSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

/// Alle AI connection settings.
#[derive(Debug, Clone, Deserialize)]
pub struct AiSettings {
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_ai_base_url")]
    pub base_url: String,
    #[serde(default = "default_ai_model")]
    pub model: String,
    #[serde(default = "default_ai_timeout")]
    pub timeout_secs: u64,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

impl Default for AiSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_ai_base_url(),
            model: default_ai_model(),
            timeout_secs: default_ai_timeout(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
        }
    }
}

impl AiSettings {
    /// The API key, if one is actually set.
    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref().and_then(present)
    }

    pub fn base_url(&self) -> Option<&str> {
        present(&self.base_url)
    }

    /// Both the key and the base URL are present.
    ///
    /// ```
    /// use healthtrust_config::AiSettings;
    ///
    /// let mut ai = AiSettings::default();
    /// assert!(!ai.is_configured());
    /// ai.api_key = Some("${UNSET_KEY}".into());
    /// assert!(!ai.is_configured());
    /// ai.api_key = Some("k-123".into());
    /// assert!(ai.is_configured());
    /// ```
    pub fn is_configured(&self) -> bool {
        self.api_key().is_some() && self.base_url().is_some()
    }
}

/// REST backend settings.
#[derive(Debug, Clone, Deserialize)]
pub struct BackendSettings {
    #[serde(default = "default_backend_url")]
    pub base_url: String,
    #[serde(default = "default_backend_timeout")]
    pub timeout_secs: u64,
}

impl Default for BackendSettings {
    fn default() -> Self {
        Self {
            base_url: default_backend_url(),
            timeout_secs: default_backend_timeout(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SessionSettings {
    /// Where the token/user pair is persisted. Defaults to the data dir.
    #[serde(default)]
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    #[serde(default)]
    pub format: LogFormat,
    #[serde(default)]
    pub emit_stderr: bool,
    #[serde(default = "default_log_filter")]
    pub filter: String,
    #[serde(default)]
    pub dir: Option<PathBuf>,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            format: LogFormat::Text,
            emit_stderr: false,
            filter: default_log_filter(),
            dir: None,
        }
    }
}

fn default_ai_base_url() -> String {
    DEFAULT_AI_BASE_URL.into()
}
fn default_ai_model() -> String {
    DEFAULT_AI_MODEL.into()
}
fn default_ai_timeout() -> u64 {
    30
}
fn default_max_tokens() -> u32 {
    500
}
fn default_temperature() -> f32 {
    0.7
}
fn default_backend_url() -> String {
    DEFAULT_BACKEND_URL.into()
}
fn default_backend_timeout() -> u64 {
    10
}
fn default_log_filter() -> String {
    "info".into()
}

fn present(raw: &str) -> Option<&str> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed.contains("${") {
        None
    } else {
        Some(trimmed)
    }
}

fn expand_env_in_value(v: &mut Value) {
    match v {
        Value::String(s) if s.contains('$') => {
            let mut cur = std::mem::take(s);
            for _ in 0..MAXIMUM_ENV_EXPANSION_DEPTH {
                let expanded = shellexpand::env(&cur)
                    .map(|cow| cow.into_owned())
                    .unwrap_or_else(|_| cur.clone());
                if expanded == cur {
                    break;
                }
                cur = expanded;
            }
            *s = cur;
        }
        Value::Array(arr) => arr.iter_mut().for_each(expand_env_in_value),
        Value::Object(obj) => obj.values_mut().for_each(expand_env_in_value),
        _ => {}
    }
}

/// Fill unset fields from the legacy build-time variable names.
fn apply_legacy_env(cfg: &mut HealthTrustConfig, explicit: &Value) {
    let set_in = |section: &str, key: &str| {
        explicit
            .get(section)
            .and_then(|s| s.get(key))
            .is_some_and(|v| !v.is_null())
    };
    let legacy = |name: &str| std::env::var(name).ok().filter(|v| !v.trim().is_empty());

    if cfg.ai.api_key().is_none() {
        if let Some(key) = legacy(LEGACY_AI_KEY_ENV) {
            cfg.ai.api_key = Some(key);
        }
    }
    if !set_in("ai", "base_url") {
        if let Some(url) = legacy(LEGACY_AI_URL_ENV) {
            cfg.ai.base_url = url;
        }
    }
    if !set_in("backend", "base_url") {
        if let Some(url) = legacy(LEGACY_BACKEND_URL_ENV) {
            cfg.backend.base_url = url;
        }
    }
}

/// Builder hiding the `config` crate wiring (YAML + env overrides).
pub struct HealthTrustConfigLoader {
    builder: config::ConfigBuilder<config::builder::DefaultState>,
    legacy_env: bool,
}

impl Default for HealthTrustConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl HealthTrustConfigLoader {
    /// Start with `HEALTHTRUST__` env overrides and legacy fallbacks enabled.
    ///
    /// ```
    /// use healthtrust_config::HealthTrustConfigLoader;
    ///
    /// let cfg = HealthTrustConfigLoader::new()
    ///     .without_legacy_env()
    ///     .with_yaml_str("ai:\n  model: gpt-4\n")
    ///     .load()
    ///     .expect("valid config");
    ///
    /// assert_eq!(cfg.ai.model, "gpt-4");
    /// assert_eq!(cfg.ai.timeout_secs, 30);
    /// assert_eq!(cfg.backend.base_url, "http://localhost:3001/api");
    /// ```
    pub fn new() -> Self {
        let builder = Config::builder().add_source(
            Environment::with_prefix("HEALTHTRUST")
                .separator("__")
                .try_parsing(true),
        );
        Self {
            builder,
            legacy_env: true,
        }
    }

    /// Ignore the `VITE_*` variable names.
    pub fn without_legacy_env(mut self) -> Self {
        self.legacy_env = false;
        self
    }

    /// Attach a YAML/TOML/JSON file that must exist; format inferred by suffix.
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.builder = self
            .builder
            .add_source(File::from(path.as_ref()).required(true));
        self
    }

    /// Attach a file that is silently skipped when missing.
    pub fn with_optional_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.builder = self
            .builder
            .add_source(File::from(path.as_ref()).required(false));
        self
    }

    /// Merge an inline YAML snippet.
    pub fn with_yaml_str(mut self, yaml: &str) -> Self {
        self.builder = self
            .builder
            .add_source(File::from_str(yaml, FileFormat::Yaml));
        self
    }

    /// Merge all sources, expand `${VAR}` placeholders, and deserialize.
    ///
    /// ```
    /// use healthtrust_config::HealthTrustConfigLoader;
    ///
    /// unsafe { std::env::set_var("HT_DOC_KEY", "from-env"); }
    /// let cfg = HealthTrustConfigLoader::new()
    ///     .without_legacy_env()
    ///     .with_yaml_str("ai:\n  api_key: \"${HT_DOC_KEY}\"\n")
    ///     .load()
    ///     .unwrap();
    /// assert_eq!(cfg.ai.api_key(), Some("from-env"));
    /// assert!(cfg.ai.is_configured());
    /// unsafe { std::env::remove_var("HT_DOC_KEY"); }
    /// ```
    pub fn load(self) -> Result<HealthTrustConfig, ConfigError> {
        let merged = self.builder.build()?;

        let mut v: Value = merged.try_deserialize()?;
        expand_env_in_value(&mut v);

        let mut typed: HealthTrustConfig = serde_json::from_value(v.clone())
            .map_err(|e| ConfigError::Message(e.to_string()))?;

        if self.legacy_env {
            apply_legacy_env(&mut typed, &v);
        }
        Ok(typed)
    }
}
