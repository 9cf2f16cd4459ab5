use crate::errors::ConfigError;
use crate::export::{ExportFormat, ExportOptions};
use crate::model::Membership;
use crate::storage::Store;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::env;
use std::path::{Path, PathBuf};

pub const SUPPORTED_CONFIG_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvalbookConfig {
    pub version: u32,
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub export: ExportSettings,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportSettings {
    #[serde(default)]
    pub format: ExportFormat,
    #[serde(default)]
    pub membership: Membership,
}

impl ExportSettings {
    pub fn options(&self) -> ExportOptions {
        ExportOptions {
            membership: self.membership,
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from(".evalbook/evalbook.db")
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for EvalbookConfig {
    fn default() -> Self {
        Self {
            version: SUPPORTED_CONFIG_VERSION,
            db_path: default_db_path(),
            log_level: default_log_level(),
            export: ExportSettings::default(),
        }
    }
}

impl EvalbookConfig {
    /// Defaults with environment overrides applied.
    pub fn from_env() -> Self {
        let mut cfg = Self::default();
        cfg.apply_env();
        cfg
    }

    /// Overrides from `EVALBOOK_DB`, `EVALBOOK_LOG` and `EVALBOOK_EXPORT_FORMAT`.
    pub fn apply_env(&mut self) {
        self.apply_overrides(|key| env::var(key).ok());
    }

    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(v) = lookup("EVALBOOK_DB").filter(|v| !v.is_empty()) {
            self.db_path = PathBuf::from(v);
        }
        if let Some(v) = lookup("EVALBOOK_LOG").filter(|v| !v.is_empty()) {
            self.log_level = v;
        }
        if let Some(v) = lookup("EVALBOOK_EXPORT_FORMAT") {
            match ExportFormat::parse(&v) {
                Some(format) => self.export.format = format,
                None => tracing::warn!(
                    event = "evalbook.config.bad_env",
                    key = "EVALBOOK_EXPORT_FORMAT",
                    value = %v
                ),
            }
        }
    }

    /// Opens the configured database and brings its schema up to date.
    pub fn open_store(&self) -> anyhow::Result<Store> {
        let store = Store::open(&self.db_path)?;
        store.init_schema()?;
        Ok(store)
    }
}

/// Reads a config file. Unknown keys are an error in strict mode and a
/// logged warning otherwise.
pub fn load_config(path: &Path, strict: bool) -> Result<EvalbookConfig, ConfigError> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| ConfigError(format!("failed to read config {}: {}", path.display(), e)))?;
    parse_config(&raw, strict)
        .map_err(|ConfigError(msg)| ConfigError(format!("{} (file: {})", msg, path.display())))
}

pub fn parse_config(raw: &str, strict: bool) -> Result<EvalbookConfig, ConfigError> {
    let mut ignored_keys = BTreeSet::new();
    let deserializer = serde_yaml::Deserializer::from_str(raw);
    let cfg: EvalbookConfig = serde_ignored::deserialize(deserializer, |path| {
        ignored_keys.insert(path.to_string());
    })
    .map_err(|e| ConfigError(format!("failed to parse YAML: {}", e)))?;

    // Anchor holders (`x-…`, `_…`) are tolerated in both modes.
    let unknown: Vec<String> = ignored_keys
        .into_iter()
        .filter(|k| !k.starts_with('_') && !k.starts_with("x-"))
        .collect();
    if !unknown.is_empty() {
        if strict {
            return Err(ConfigError(format!(
                "unknown fields detected in strict mode: {:?}",
                unknown
            )));
        }
        tracing::warn!(event = "evalbook.config.unknown_fields", fields = ?unknown);
    }

    if cfg.version != SUPPORTED_CONFIG_VERSION {
        return Err(ConfigError(format!(
            "unsupported config version {} (supported: {})",
            cfg.version, SUPPORTED_CONFIG_VERSION
        )));
    }

    Ok(cfg)
}

pub fn write_sample_config(path: &Path) -> Result<(), ConfigError> {
    std::fs::write(
        path,
        r#"version: 1
# SQLite file holding models, problems, submissions and evaluations.
db_path: .evalbook/evalbook.db
# tracing filter, e.g. "info" or "evalbook_core=debug"
log_level: info
export:
  # yaml | json
  format: yaml
  # owned | owned_and_linked
  membership: owned
"#,
    )
    .map_err(|e| ConfigError(format!("failed to write sample config: {}", e)))?;
    Ok(())
}
