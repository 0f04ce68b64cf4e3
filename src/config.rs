//! Configuration management using the prefer crate.
//!
//! Values resolve in three layers: built-in defaults, then the config file,
//! then environment variables.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default worker ceiling for bulk annotation.
pub const DEFAULT_BULK_NPROC: usize = 8;

/// Default HTTP bind address.
pub const DEFAULT_BIND: &str = "0.0.0.0:5000";

/// Name used for config file discovery.
const CONFIG_NAME: &str = "concept-annotator";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file {}: {message}", .path.display())]
    Parse { path: PathBuf, message: String },

    #[error("Invalid value {value:?} for {key}: {reason}")]
    InvalidValue {
        key: &'static str,
        value: String,
        reason: &'static str,
    },
}

/// Shape of the annotations in each document result.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityOutputMode {
    /// Entities keyed by id.
    #[default]
    #[serde(alias = "mapping")]
    Dict,
    /// Entities as a list in id order.
    List,
}

impl FromStr for EntityOutputMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "dict" | "mapping" => Ok(Self::Dict),
            "list" => Ok(Self::List),
            _ => Err(ConfigError::InvalidValue {
                key: "ANNOTATIONS_ENTITY_OUTPUT_MODE",
                value: s.to_string(),
                reason: "expected \"dict\" or \"list\"",
            }),
        }
    }
}

/// Resolved application settings.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub app_name: String,
    pub app_language: String,
    pub model_name: String,
    /// Concept database file. Required to serve or annotate.
    pub cdb_path: Option<PathBuf>,
    /// Optional file of CUIs to keep, one per line.
    pub cui_filter_path: Option<PathBuf>,
    /// Upper bound on parallel workers for a bulk request.
    pub bulk_worker_ceiling: usize,
    pub output_mode: EntityOutputMode,
    pub bind: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            app_name: CONFIG_NAME.to_string(),
            app_language: "en".to_string(),
            model_name: "unknown".to_string(),
            cdb_path: None,
            cui_filter_path: None,
            bulk_worker_ceiling: DEFAULT_BULK_NPROC,
            output_mode: EntityOutputMode::default(),
            bind: DEFAULT_BIND.to_string(),
        }
    }
}

impl Settings {
    /// Apply environment variable overrides.
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        self.apply_overrides_from(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary variable lookup. Empty values are
    /// treated as unset.
    pub fn apply_overrides_from<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(name) = get("APP_NAME") {
            self.app_name = name;
        }
        if let Some(language) = get("APP_MODEL_LANGUAGE") {
            self.app_language = language;
        }
        if let Some(model) = get("APP_MODEL_NAME") {
            self.model_name = model;
        }
        if let Some(path) = get("APP_MODEL_CDB_PATH") {
            self.cdb_path = Some(expand_path(&path));
        }
        if let Some(path) = get("APP_MODEL_CUI_FILTER_PATH") {
            self.cui_filter_path = Some(expand_path(&path));
        }
        if let Some(nproc) = get("APP_BULK_NPROC") {
            self.bulk_worker_ceiling = parse_worker_ceiling(&nproc)?;
        }
        if let Some(mode) = get("ANNOTATIONS_ENTITY_OUTPUT_MODE") {
            self.output_mode = mode.parse()?;
        }
        if let Some(bind) = get("SERVER_BIND") {
            self.bind = bind;
        }
        Ok(())
    }
}

fn parse_worker_ceiling(value: &str) -> Result<usize, ConfigError> {
    let invalid = |reason| ConfigError::InvalidValue {
        key: "APP_BULK_NPROC",
        value: value.to_string(),
        reason,
    };

    match value.trim().parse::<usize>() {
        Ok(0) => Err(invalid("must be at least 1")),
        Ok(n) => Ok(n),
        Err(_) => Err(invalid("expected a positive integer")),
    }
}

fn expand_path(path: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(path).as_ref())
}

/// Configuration file contents. Every key is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_name: Option<String>,
    /// Relative paths resolve against the config file's directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cdb_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cui_filter_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bulk_nproc: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity_output_mode: Option<EntityOutputMode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bind: Option<String>,

    /// Path the config was loaded from.
    #[serde(skip)]
    pub source_path: Option<PathBuf>,
}

impl Config {
    /// Discover a config file in the standard locations. Returns the default
    /// config when none is found.
    pub async fn load() -> Result<Self, ConfigError> {
        match prefer::load(CONFIG_NAME).await {
            Ok(pref_config) => match pref_config.source_path() {
                Some(path) => Self::load_from_path(path).await,
                None => Ok(Self::default()),
            },
            Err(e) => {
                tracing::debug!("No config file discovered: {}", e);
                Ok(Self::default())
            }
        }
    }

    /// Load from a specific file. The format follows the extension: TOML,
    /// YAML, or JSON for anything else.
    pub async fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        let contents =
            tokio::fs::read_to_string(path)
                .await
                .map_err(|source| ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                })?;

        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("json");
        let parse_error = |message: String| ConfigError::Parse {
            path: path.to_path_buf(),
            message,
        };

        let mut config: Config = match ext {
            "toml" => toml::from_str(&contents).map_err(|e| parse_error(e.to_string()))?,
            "yaml" | "yml" => {
                serde_yaml::from_str(&contents).map_err(|e| parse_error(e.to_string()))?
            }
            _ => serde_json::from_str(&contents).map_err(|e| parse_error(e.to_string()))?,
        };

        tracing::debug!("Loaded config from {}", path.display());
        config.source_path = Some(path.to_path_buf());
        Ok(config)
    }

    /// Directory of the config file, if it came from one.
    pub fn base_dir(&self) -> Option<PathBuf> {
        self.source_path
            .as_ref()
            .and_then(|p| p.parent().map(|p| p.to_path_buf()))
    }

    /// Resolve a possibly relative, possibly `~`-prefixed path.
    pub fn resolve_path(&self, path_str: &str, base_dir: &Path) -> PathBuf {
        let expanded = expand_path(path_str);
        if expanded.is_absolute() {
            expanded
        } else {
            base_dir.join(expanded)
        }
    }

    pub fn apply_to_settings(
        &self,
        settings: &mut Settings,
        base_dir: &Path,
    ) -> Result<(), ConfigError> {
        if let Some(ref name) = self.app_name {
            settings.app_name = name.clone();
        }
        if let Some(ref language) = self.language {
            settings.app_language = language.clone();
        }
        if let Some(ref model) = self.model_name {
            settings.model_name = model.clone();
        }
        if let Some(ref path) = self.cdb_path {
            settings.cdb_path = Some(self.resolve_path(path, base_dir));
        }
        if let Some(ref path) = self.cui_filter_path {
            settings.cui_filter_path = Some(self.resolve_path(path, base_dir));
        }
        if let Some(nproc) = self.bulk_nproc {
            settings.bulk_worker_ceiling = parse_worker_ceiling(&nproc.to_string())?;
        }
        if let Some(mode) = self.entity_output_mode {
            settings.output_mode = mode;
        }
        if let Some(ref bind) = self.bind {
            settings.bind = bind.clone();
        }
        Ok(())
    }
}

/// Options for loading settings.
#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    /// Explicit config file path (skips discovery).
    pub config_path: Option<PathBuf>,
}

/// Load settings: defaults, then config file, then environment.
pub async fn load_settings(options: LoadOptions) -> Result<(Settings, Config), ConfigError> {
    let config = match options.config_path {
        Some(ref path) => Config::load_from_path(path).await?,
        None => Config::load().await?,
    };

    let base_dir = config
        .base_dir()
        .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")));

    let mut settings = Settings::default();
    config.apply_to_settings(&mut settings, &base_dir)?;
    settings.apply_env_overrides()?;

    Ok((settings, config))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.bulk_worker_ceiling, 8);
        assert_eq!(settings.output_mode, EntityOutputMode::Dict);
        assert_eq!(settings.bind, "0.0.0.0:5000");
        assert!(settings.cdb_path.is_none());
    }

    #[test]
    fn test_output_mode_parsing() {
        assert_eq!("dict".parse::<EntityOutputMode>().unwrap(), EntityOutputMode::Dict);
        assert_eq!("MAPPING".parse::<EntityOutputMode>().unwrap(), EntityOutputMode::Dict);
        assert_eq!(" List ".parse::<EntityOutputMode>().unwrap(), EntityOutputMode::List);
        assert!("table".parse::<EntityOutputMode>().is_err());
    }

    #[test]
    fn test_env_overrides() {
        let mut settings = Settings::default();
        settings
            .apply_overrides_from(lookup(&[
                ("APP_NAME", "medical-annotator"),
                ("APP_MODEL_NAME", "snomed-small"),
                ("APP_BULK_NPROC", "3"),
                ("ANNOTATIONS_ENTITY_OUTPUT_MODE", "list"),
                ("APP_MODEL_CDB_PATH", "/models/cdb.json"),
                ("APP_MODEL_LANGUAGE", ""),
            ]))
            .unwrap();

        assert_eq!(settings.app_name, "medical-annotator");
        assert_eq!(settings.model_name, "snomed-small");
        assert_eq!(settings.bulk_worker_ceiling, 3);
        assert_eq!(settings.output_mode, EntityOutputMode::List);
        assert_eq!(settings.cdb_path, Some(PathBuf::from("/models/cdb.json")));
        // Empty values are ignored
        assert_eq!(settings.app_language, "en");
    }

    #[test]
    fn test_invalid_worker_ceiling() {
        for bad in ["0", "many", "-2"] {
            let mut settings = Settings::default();
            let err = settings
                .apply_overrides_from(lookup(&[("APP_BULK_NPROC", bad)]))
                .unwrap_err();
            assert!(matches!(
                err,
                ConfigError::InvalidValue {
                    key: "APP_BULK_NPROC",
                    ..
                }
            ));
        }
    }

    #[tokio::test]
    async fn test_load_toml_resolves_relative_paths() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("concept-annotator.toml");
        std::fs::write(
            &path,
            r#"
model_name = "sample"
cdb_path = "models/cdb.json"
bulk_nproc = 2
entity_output_mode = "list"
"#,
        )
        .unwrap();

        let config = Config::load_from_path(&path).await.unwrap();
        assert_eq!(config.base_dir().as_deref(), Some(dir.path()));

        let mut settings = Settings::default();
        config
            .apply_to_settings(&mut settings, dir.path())
            .unwrap();

        assert_eq!(settings.model_name, "sample");
        assert_eq!(settings.cdb_path, Some(dir.path().join("models/cdb.json")));
        assert_eq!(settings.bulk_worker_ceiling, 2);
        assert_eq!(settings.output_mode, EntityOutputMode::List);
    }

    #[tokio::test]
    async fn test_load_yaml_and_json() {
        let mut yaml = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(yaml, "app_name: from-yaml\nentity_output_mode: mapping").unwrap();
        let config = Config::load_from_path(yaml.path()).await.unwrap();
        assert_eq!(config.app_name.as_deref(), Some("from-yaml"));
        assert_eq!(config.entity_output_mode, Some(EntityOutputMode::Dict));

        let mut json = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(json, r#"{{"bind": "127.0.0.1:8080"}}"#).unwrap();
        let config = Config::load_from_path(json.path()).await.unwrap();
        assert_eq!(config.bind.as_deref(), Some("127.0.0.1:8080"));
    }

    #[tokio::test]
    async fn test_load_errors() {
        let missing = Config::load_from_path(Path::new("/nonexistent/concept-annotator.toml")).await;
        assert!(matches!(missing, Err(ConfigError::Read { .. })));

        let mut bad = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        write!(bad, "bulk_nproc = \"lots\"").unwrap();
        let parsed = Config::load_from_path(bad.path()).await;
        assert!(matches!(parsed, Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn test_zero_nproc_in_file_is_rejected() {
        let config = Config {
            bulk_nproc: Some(0),
            ..Default::default()
        };
        let mut settings = Settings::default();
        assert!(config
            .apply_to_settings(&mut settings, Path::new("."))
            .is_err());
    }
}
