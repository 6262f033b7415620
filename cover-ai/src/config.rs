//! Provider configuration and its versioned persistence.
//!
//! Documents are stored as an envelope:
//!
//! ```json
//! { "version": 2, "state": { "activeProvider": "gemini", "providers": { .. }, "options": { .. } } }
//! ```
//!
//! Older documents are migrated forward one version at a time on load.
//!
//! | version | state shape                                              |
//! |---------|----------------------------------------------------------|
//! | 0       | one provider: `{provider, endpoint, apiKey, model}`      |
//! | 1       | `{activeProvider, providers: {gemini, openai}}`          |
//! | 2       | version 1 plus `options`                                 |

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tracing::{debug, info};

use crate::error::{ConfigError, ConfigResult, GenerationResult};
use crate::gemini::GeminiClient;
use crate::openai::OpenAiClient;
use crate::provider::ImageGenerator;
use crate::request::GenerationOptions;

/// Store key for the provider configuration.
pub const CONFIG_KEY: &str = "ai-config";

/// Version written by this build.
pub const CONFIG_VERSION: u64 = 2;

/// Default Gemini endpoint.
pub const GEMINI_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta";
/// Default Gemini model.
pub const GEMINI_MODEL: &str = "gemini-2.0-flash-exp-image-generation";
/// Default OpenAI endpoint.
pub const OPENAI_ENDPOINT: &str = "https://api.openai.com/v1";
/// Default OpenAI model.
pub const OPENAI_MODEL: &str = "dall-e-3";

/// Supported providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    /// Google Gemini.
    #[default]
    Gemini,
    /// OpenAI Images.
    #[serde(rename = "openai")]
    OpenAi,
}

impl Provider {
    /// Lowercase identifier.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Gemini => "gemini",
            Self::OpenAi => "openai",
        }
    }
}

impl std::str::FromStr for Provider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "gemini" => Ok(Self::Gemini),
            "openai" => Ok(Self::OpenAi),
            other => Err(format!("unknown provider: {other}")),
        }
    }
}

/// Connection settings for one provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderConfig {
    /// API base URL.
    pub endpoint: String,
    /// API key; empty when unset.
    #[serde(default)]
    pub api_key: String,
    /// Model name.
    pub model: String,
}

impl ProviderConfig {
    /// Default settings for `provider`, without a key.
    #[must_use]
    pub fn defaults_for(provider: Provider) -> Self {
        let (endpoint, model) = match provider {
            Provider::Gemini => (GEMINI_ENDPOINT, GEMINI_MODEL),
            Provider::OpenAi => (OPENAI_ENDPOINT, OPENAI_MODEL),
        };
        Self {
            endpoint: endpoint.to_string(),
            api_key: String::new(),
            model: model.to_string(),
        }
    }

    /// The key with all but the last four characters hidden.
    #[must_use]
    pub fn masked_key(&self) -> String {
        let count = self.api_key.chars().count();
        if count == 0 {
            return String::new();
        }
        if count <= 4 {
            return "*".repeat(count);
        }
        let tail: String = self.api_key.chars().skip(count - 4).collect();
        format!("{}{tail}", "*".repeat(count - 4))
    }
}

/// Settings for every provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Providers {
    /// Gemini settings.
    pub gemini: ProviderConfig,
    /// OpenAI settings.
    pub openai: ProviderConfig,
}

impl Default for Providers {
    fn default() -> Self {
        Self {
            gemini: ProviderConfig::defaults_for(Provider::Gemini),
            openai: ProviderConfig::defaults_for(Provider::OpenAi),
        }
    }
}

/// The persisted image generation configuration.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AiConfig {
    /// Provider used for new requests.
    pub active_provider: Provider,
    /// Per-provider settings.
    pub providers: Providers,
    /// Options applied to new requests.
    #[serde(default)]
    pub options: GenerationOptions,
}

impl AiConfig {
    /// Settings of `provider`.
    #[must_use]
    pub fn provider(&self, provider: Provider) -> &ProviderConfig {
        match provider {
            Provider::Gemini => &self.providers.gemini,
            Provider::OpenAi => &self.providers.openai,
        }
    }

    /// Mutable settings of `provider`.
    pub fn provider_mut(&mut self, provider: Provider) -> &mut ProviderConfig {
        match provider {
            Provider::Gemini => &mut self.providers.gemini,
            Provider::OpenAi => &mut self.providers.openai,
        }
    }

    /// Settings of the active provider.
    #[must_use]
    pub fn active(&self) -> &ProviderConfig {
        self.provider(self.active_provider)
    }

    /// Build a client for the active provider.
    ///
    /// # Errors
    ///
    /// Returns an error if the endpoint is invalid.
    pub fn client(&self) -> GenerationResult<Arc<dyn ImageGenerator>> {
        let cfg = self.active();
        let client: Arc<dyn ImageGenerator> = match self.active_provider {
            Provider::Gemini => Arc::new(GeminiClient::new(
                &cfg.endpoint,
                cfg.api_key.clone(),
                cfg.model.clone(),
            )?),
            Provider::OpenAi => Arc::new(OpenAiClient::new(
                &cfg.endpoint,
                cfg.api_key.clone(),
                cfg.model.clone(),
            )?),
        };
        Ok(client)
    }
}

// ============================================================================
// Migrations
// ============================================================================

type Migration = fn(Value) -> Value;

/// `MIGRATIONS[n]` upgrades a version `n` state to version `n + 1`.
const MIGRATIONS: [Migration; 2] = [migrate_v0_to_v1, migrate_v1_to_v2];

fn string_field(obj: &Map<String, Value>, key: &str) -> Option<String> {
    obj.get(key).and_then(Value::as_str).map(str::to_string)
}

/// Single provider record to per-provider table.
fn migrate_v0_to_v1(state: Value) -> Value {
    // Some writers nested the record under `config`.
    let record = match state {
        Value::Object(mut obj) => match obj.remove("config") {
            Some(Value::Object(inner)) => inner,
            _ => obj,
        },
        _ => Map::new(),
    };

    let provider = string_field(&record, "provider")
        .and_then(|p| p.parse::<Provider>().ok())
        .unwrap_or_default();

    let mut providers = Providers::default();
    let slot = match provider {
        Provider::Gemini => &mut providers.gemini,
        Provider::OpenAi => &mut providers.openai,
    };
    if let Some(endpoint) = string_field(&record, "endpoint") {
        slot.endpoint = endpoint;
    }
    if let Some(key) = string_field(&record, "apiKey") {
        slot.api_key = key;
    }
    if let Some(model) = string_field(&record, "model") {
        slot.model = model;
    }

    json!({ "activeProvider": provider, "providers": providers })
}

/// Adds default generation options.
fn migrate_v1_to_v2(mut state: Value) -> Value {
    if let Value::Object(obj) = &mut state {
        obj.entry("options")
            .or_insert_with(|| json!(GenerationOptions::default()));
    }
    state
}

/// Upgrade an envelope to the current version and decode it.
///
/// A document without a `version` field is treated as version 0, and one
/// without a `state` field is treated as a bare state.
///
/// # Errors
///
/// Returns [`ConfigError::UnsupportedVersion`] for documents newer than this
/// build and [`ConfigError::Json`] when the migrated state does not decode.
pub fn migrate(document: Value) -> ConfigResult<AiConfig> {
    let version = document.get("version").and_then(Value::as_u64).unwrap_or(0);
    if version > CONFIG_VERSION {
        return Err(ConfigError::UnsupportedVersion {
            found: version,
            supported: CONFIG_VERSION,
        });
    }

    let mut state = match document {
        Value::Object(mut obj) if obj.contains_key("state") => {
            obj.remove("state").unwrap_or(Value::Null)
        }
        other => other,
    };

    for (from, step) in MIGRATIONS.iter().enumerate().skip(usize::try_from(version).unwrap_or(0)) {
        debug!(from, to = from + 1, "Migrating AI config");
        state = step(state);
    }

    Ok(serde_json::from_value(state)?)
}

/// Wrap a config in the current envelope.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn to_document(config: &AiConfig) -> ConfigResult<Value> {
    Ok(json!({ "version": CONFIG_VERSION, "state": serde_json::to_value(config)? }))
}

// ============================================================================
// Stores
// ============================================================================

/// Key-value persistence for JSON documents.
pub trait ConfigStore: Send + Sync {
    /// Load the document under `key`, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store cannot be read.
    fn load(&self, key: &str) -> ConfigResult<Option<Value>>;

    /// Replace the document under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store cannot be written.
    fn save(&self, key: &str, document: &Value) -> ConfigResult<()>;
}

/// Load the AI configuration, falling back to defaults when absent.
///
/// # Errors
///
/// Returns an error if the store fails or the document cannot be migrated.
pub fn load_config(store: &dyn ConfigStore) -> ConfigResult<AiConfig> {
    match store.load(CONFIG_KEY)? {
        Some(document) => migrate(document),
        None => {
            debug!("No stored AI config, using defaults");
            Ok(AiConfig::default())
        }
    }
}

/// Persist the AI configuration at the current version.
///
/// # Errors
///
/// Returns an error if the store fails.
pub fn save_config(store: &dyn ConfigStore, config: &AiConfig) -> ConfigResult<()> {
    store.save(CONFIG_KEY, &to_document(config)?)?;
    info!(provider = config.active_provider.as_str(), "Saved AI config");
    Ok(())
}

/// Stores each key as `<dir>/<key>.json`.
#[derive(Debug, Clone)]
pub struct FileConfigStore {
    dir: PathBuf,
}

impl FileConfigStore {
    /// Store rooted at `dir`; the directory is created on first save.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Root directory.
    #[must_use]
    pub fn dir(&self) -> &std::path::Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> ConfigResult<PathBuf> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(ConfigError::InvalidKey(key.to_string()));
        }
        Ok(self.dir.join(format!("{key}.json")))
    }
}

impl ConfigStore for FileConfigStore {
    fn load(&self, key: &str) -> ConfigResult<Option<Value>> {
        let path = self.path_for(key)?;
        match std::fs::read_to_string(&path) {
            Ok(text) => Ok(Some(serde_json::from_str(&text)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn save(&self, key: &str, document: &Value) -> ConfigResult<()> {
        let path = self.path_for(key)?;
        std::fs::create_dir_all(&self.dir)?;
        std::fs::write(&path, serde_json::to_string_pretty(document)?)?;
        debug!(path = %path.display(), "Wrote config document");
        Ok(())
    }
}

/// In-memory store, used in tests and by embedders without a disk.
#[derive(Debug, Default)]
pub struct MemoryConfigStore {
    entries: RwLock<HashMap<String, Value>>,
}

impl MemoryConfigStore {
    /// Empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl ConfigStore for MemoryConfigStore {
    fn load(&self, key: &str) -> ConfigResult<Option<Value>> {
        let entries = self
            .entries
            .read()
            .map_err(|_| std::io::Error::other("config store lock poisoned"))?;
        Ok(entries.get(key).cloned())
    }

    fn save(&self, key: &str, document: &Value) -> ConfigResult<()> {
        let mut entries = self
            .entries
            .write()
            .map_err(|_| std::io::Error::other("config store lock poisoned"))?;
        entries.insert(key.to_string(), document.clone());
        Ok(())
    }
}
