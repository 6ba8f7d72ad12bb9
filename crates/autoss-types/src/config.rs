//! Configuration loading for autoss.
//!
//! Layered config: defaults -> `[autoss]` section of the INI config file ->
//! `AUTOSS_*` environment variables -> CLI flags (applied by the caller).
//! The config file keeps the historical `autoss.conf` layout, including the
//! `azure_` prefixed Computer Vision keys.

use std::path::{Path, PathBuf};

use config::{Config, Environment, File, FileFormat, Map, Source, Value};
use directories::ProjectDirs;
use secrecy::SecretString;
use serde::Deserialize;

use crate::error::TypesError;
use crate::record::Collection;

/// INI section holding every autoss option.
pub const CONFIG_SECTION: &str = "autoss";

/// Config file read when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "autoss.conf";

/// Which part of the analyze response supplies the tag set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TagFeature {
    /// `description.tags`: caption vocabulary, plain strings
    #[default]
    Description,
    /// `tags[].name`: object/scene tags with confidences
    Tags,
}

/// Record store backend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordStoreKind {
    /// Azure Cosmos DB, one container per collection
    #[default]
    Cosmos,
    /// Local RocksDB, one column family per collection
    Rocksdb,
}

/// Connection details for one Cosmos DB container.
#[derive(Debug, Clone)]
pub struct CosmosTarget {
    pub endpoint: String,
    pub primary_key: SecretString,
    pub database: String,
    pub container: String,
}

/// Main application settings
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// Computer Vision subscription key
    #[serde(default, alias = "azure_compvision_subkey")]
    pub compvision_subkey: Option<SecretString>,

    /// Computer Vision endpoint (e.g. "https://westus.api.cognitive.microsoft.com")
    #[serde(default, alias = "azure_compvision_endpoint")]
    pub compvision_endpoint: Option<String>,

    /// Analyze feature the tags are read from
    #[serde(default)]
    pub compvision_feature: TagFeature,

    /// Response language requested from the analyze call
    #[serde(default = "default_compvision_language")]
    pub compvision_language: String,

    /// Timeout for one analyze request
    #[serde(default = "default_compvision_timeout_secs")]
    pub compvision_timeout_secs: u64,

    /// Log file path (`~` is expanded)
    #[serde(default = "default_log_file")]
    pub log_file: String,

    /// Log level (DEBUG, INFO, WARNING, ERROR, CRITICAL; case-insensitive)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// word2vec model file, relative to `assets_dir` unless absolute
    #[serde(default)]
    pub word2vec_model_file: Option<String>,

    /// Installation assets directory
    #[serde(default = "default_assets_dir")]
    pub assets_dir: String,

    /// Record store backend
    #[serde(default)]
    pub record_store: RecordStoreKind,

    #[serde(default)]
    pub cosmos_endpoint_vectors: Option<String>,
    #[serde(default)]
    pub cosmos_primarykey_vectors: Option<SecretString>,
    #[serde(default)]
    pub cosmos_db_vectors: Option<String>,
    #[serde(default)]
    pub cosmos_col_vectors: Option<String>,

    #[serde(default)]
    pub cosmos_endpoint_rnninput: Option<String>,
    #[serde(default)]
    pub cosmos_primarykey_rnninput: Option<SecretString>,
    #[serde(default)]
    pub cosmos_db_rnninput: Option<String>,
    #[serde(default)]
    pub cosmos_col_rnninput: Option<String>,

    /// RocksDB directory used when `record_store = rocksdb`
    #[serde(default = "default_rocksdb_path")]
    pub rocksdb_path: String,

    /// Frames processed concurrently within a pass (1 = sequential)
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
}

fn default_compvision_language() -> String {
    "en".to_string()
}

fn default_compvision_timeout_secs() -> u64 {
    30
}

fn default_log_file() -> String {
    "~/autoss.log".to_string()
}

fn default_log_level() -> String {
    "INFO".to_string()
}

fn default_assets_dir() -> String {
    "../assets".to_string()
}

fn default_rocksdb_path() -> String {
    ProjectDirs::from("", "", "autoss")
        .map(|p| p.data_local_dir().join("records"))
        .unwrap_or_else(|| PathBuf::from("./records"))
        .to_string_lossy()
        .to_string()
}

fn default_concurrency() -> usize {
    1
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            compvision_subkey: None,
            compvision_endpoint: None,
            compvision_feature: TagFeature::default(),
            compvision_language: default_compvision_language(),
            compvision_timeout_secs: default_compvision_timeout_secs(),
            log_file: default_log_file(),
            log_level: default_log_level(),
            word2vec_model_file: None,
            assets_dir: default_assets_dir(),
            record_store: RecordStoreKind::default(),
            cosmos_endpoint_vectors: None,
            cosmos_primarykey_vectors: None,
            cosmos_db_vectors: None,
            cosmos_col_vectors: None,
            cosmos_endpoint_rnninput: None,
            cosmos_primarykey_rnninput: None,
            cosmos_db_rnninput: None,
            cosmos_col_rnninput: None,
            rocksdb_path: default_rocksdb_path(),
            concurrency: default_concurrency(),
        }
    }
}

/// Exposes one section of an INI file as top-level keys.
#[derive(Debug, Clone)]
struct IniSection {
    path: PathBuf,
    section: &'static str,
    required: bool,
}

impl Source for IniSection {
    fn clone_into_box(&self) -> Box<dyn Source + Send + Sync> {
        Box::new(self.clone())
    }

    fn collect(&self) -> Result<Map<String, Value>, config::ConfigError> {
        let mut all = File::from(self.path.as_path())
            .format(FileFormat::Ini)
            .required(self.required)
            .collect()?;
        match all.remove(self.section) {
            Some(section) => section.into_table(),
            None => Ok(Map::new()),
        }
    }
}

impl Settings {
    /// Load settings with layered precedence:
    /// 1. Built-in defaults
    /// 2. `[autoss]` section of the config file
    ///    (`cli_config_path`, else `./autoss.conf` if present)
    /// 3. Environment variables (AUTOSS_*)
    ///
    /// CLI flags should be applied by the caller after this returns.
    pub fn load(cli_config_path: Option<&str>) -> Result<Self, TypesError> {
        let (path, required) = match cli_config_path {
            Some(path) => (PathBuf::from(path), true),
            None => (PathBuf::from(DEFAULT_CONFIG_FILE), false),
        };

        let config = Config::builder()
            .set_default("log_file", default_log_file())?
            .set_default("log_level", default_log_level())?
            .set_default("assets_dir", default_assets_dir())?
            .add_source(IniSection {
                path,
                section: CONFIG_SECTION,
                required,
            })
            // Format: AUTOSS_LOG_LEVEL, AUTOSS_COMPVISION_SUBKEY, ...
            .add_source(Environment::with_prefix("AUTOSS").try_parsing(true))
            .build()?;

        Ok(config.try_deserialize()?)
    }

    /// Check that every option the configured backends need is present.
    ///
    /// All missing keys are reported together.
    pub fn validate(&self) -> Result<(), TypesError> {
        let mut missing = Vec::new();

        if self.compvision_subkey.is_none() {
            missing.push("compvision_subkey");
        }
        if is_blank(&self.compvision_endpoint) {
            missing.push("compvision_endpoint");
        }
        if is_blank(&self.word2vec_model_file) {
            missing.push("word2vec_model_file");
        }

        if self.record_store == RecordStoreKind::Cosmos {
            let cosmos = [
                ("cosmos_endpoint_vectors", is_blank(&self.cosmos_endpoint_vectors)),
                ("cosmos_primarykey_vectors", self.cosmos_primarykey_vectors.is_none()),
                ("cosmos_db_vectors", is_blank(&self.cosmos_db_vectors)),
                ("cosmos_col_vectors", is_blank(&self.cosmos_col_vectors)),
                ("cosmos_endpoint_rnninput", is_blank(&self.cosmos_endpoint_rnninput)),
                ("cosmos_primarykey_rnninput", self.cosmos_primarykey_rnninput.is_none()),
                ("cosmos_db_rnninput", is_blank(&self.cosmos_db_rnninput)),
                ("cosmos_col_rnninput", is_blank(&self.cosmos_col_rnninput)),
            ];
            missing.extend(cosmos.iter().filter(|(_, m)| *m).map(|(k, _)| *k));
        }

        if self.compvision_timeout_secs == 0 {
            return Err(TypesError::Config(
                "compvision_timeout_secs must be > 0".to_string(),
            ));
        }
        if self.concurrency == 0 {
            return Err(TypesError::Config("concurrency must be > 0".to_string()));
        }

        if missing.is_empty() {
            Ok(())
        } else {
            Err(TypesError::Config(format!(
                "missing required option(s) in [{}]: {}",
                CONFIG_SECTION,
                missing.join(", ")
            )))
        }
    }

    /// Resolve the embedding model path against the assets directory.
    pub fn model_path(&self) -> Option<PathBuf> {
        let file = self.word2vec_model_file.as_deref()?;
        let path = Path::new(file);
        if path.is_absolute() {
            return Some(path.to_path_buf());
        }
        let assets = expand_home(&self.assets_dir);
        let assets = if assets.is_absolute() {
            assets
        } else {
            std::env::current_dir()
                .map(|cwd| cwd.join(&assets))
                .unwrap_or(assets)
        };
        Some(assets.join(path))
    }

    /// Log file path with `~` expanded.
    pub fn expanded_log_file(&self) -> PathBuf {
        expand_home(&self.log_file)
    }

    /// RocksDB directory with `~` expanded.
    pub fn expanded_rocksdb_path(&self) -> PathBuf {
        expand_home(&self.rocksdb_path)
    }

    /// `tracing` filter directive for the configured log level.
    ///
    /// Accepts the Python-style names the config file historically used;
    /// unknown names fall back to `info`.
    pub fn tracing_directive(&self) -> &'static str {
        level_directive(&self.log_level)
    }

    /// Cosmos container settings for a collection.
    pub fn cosmos_target(&self, collection: Collection) -> Result<CosmosTarget, TypesError> {
        let (endpoint, key, db, col, suffix) = match collection {
            Collection::Vectors => (
                &self.cosmos_endpoint_vectors,
                &self.cosmos_primarykey_vectors,
                &self.cosmos_db_vectors,
                &self.cosmos_col_vectors,
                "vectors",
            ),
            Collection::SequenceInputs => (
                &self.cosmos_endpoint_rnninput,
                &self.cosmos_primarykey_rnninput,
                &self.cosmos_db_rnninput,
                &self.cosmos_col_rnninput,
                "rnninput",
            ),
        };
        let missing = |name: &str| TypesError::Config(format!("cosmos_{}_{} is not set", name, suffix));

        Ok(CosmosTarget {
            endpoint: endpoint.clone().ok_or_else(|| missing("endpoint"))?,
            primary_key: key.clone().ok_or_else(|| missing("primarykey"))?,
            database: db.clone().ok_or_else(|| missing("db"))?,
            container: col.clone().ok_or_else(|| missing("col"))?,
        })
    }
}

/// Map a level name to a `tracing` directive.
pub fn level_directive(level: &str) -> &'static str {
    match level.trim().to_ascii_uppercase().as_str() {
        "CRITICAL" | "ERROR" => "error",
        "WARNING" | "WARN" => "warn",
        "DEBUG" => "debug",
        "TRACE" => "trace",
        _ => "info",
    }
}

fn is_blank(value: &Option<String>) -> bool {
    value.as_deref().map(str::trim).unwrap_or("").is_empty()
}

/// Expand a leading `~/` to the user's home directory.
fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_conf(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.log_file, "~/autoss.log");
        assert_eq!(settings.log_level, "INFO");
        assert_eq!(settings.compvision_timeout_secs, 30);
        assert_eq!(settings.concurrency, 1);
        assert_eq!(settings.record_store, RecordStoreKind::Cosmos);
        assert_eq!(settings.compvision_feature, TagFeature::Description);
    }

    #[test]
    fn test_load_ini_section_with_legacy_keys() {
        let conf = write_conf(
            "[autoss]\n\
             azure_compvision_subkey = abc123\n\
             azure_compvision_endpoint = https://vision.example.com\n\
             word2vec_model_file = word2vec.model\n\
             log_level = DEBUG\n\
             record_store = rocksdb\n\
             compvision_timeout_secs = 5\n",
        );

        let settings = Settings::load(Some(conf.path().to_str().unwrap())).unwrap();
        assert_eq!(
            settings.compvision_subkey.as_ref().unwrap().expose_secret(),
            "abc123"
        );
        assert_eq!(
            settings.compvision_endpoint.as_deref(),
            Some("https://vision.example.com")
        );
        assert_eq!(settings.log_level, "DEBUG");
        assert_eq!(settings.record_store, RecordStoreKind::Rocksdb);
        assert_eq!(settings.compvision_timeout_secs, 5);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_load_missing_explicit_file_fails() {
        let result = Settings::load(Some("/nonexistent/autoss.conf"));
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_reports_all_missing_cosmos_keys() {
        let conf = write_conf(
            "[autoss]\n\
             compvision_subkey = k\n\
             compvision_endpoint = https://vision.example.com\n\
             word2vec_model_file = m.txt\n\
             cosmos_endpoint_vectors = https://db.example.com\n",
        );
        let settings = Settings::load(Some(conf.path().to_str().unwrap())).unwrap();

        let err = settings.validate().unwrap_err().to_string();
        assert!(err.contains("cosmos_primarykey_vectors"));
        assert!(err.contains("cosmos_col_rnninput"));
        assert!(!err.contains("cosmos_endpoint_vectors"));
    }

    #[test]
    fn test_validate_requires_model_and_vision() {
        let settings = Settings {
            record_store: RecordStoreKind::Rocksdb,
            ..Settings::default()
        };
        let err = settings.validate().unwrap_err().to_string();
        assert!(err.contains("compvision_subkey"));
        assert!(err.contains("compvision_endpoint"));
        assert!(err.contains("word2vec_model_file"));
    }

    #[test]
    fn test_model_path_resolution() {
        let settings = Settings {
            word2vec_model_file: Some("w2v.txt".to_string()),
            assets_dir: "/opt/autoss/assets".to_string(),
            ..Settings::default()
        };
        assert_eq!(
            settings.model_path().unwrap(),
            PathBuf::from("/opt/autoss/assets/w2v.txt")
        );

        let absolute = Settings {
            word2vec_model_file: Some("/models/w2v.bin".to_string()),
            ..Settings::default()
        };
        assert_eq!(absolute.model_path().unwrap(), PathBuf::from("/models/w2v.bin"));
    }

    #[test]
    fn test_level_directive() {
        assert_eq!(level_directive("CRITICAL"), "error");
        assert_eq!(level_directive("warning"), "warn");
        assert_eq!(level_directive("Debug"), "debug");
        assert_eq!(level_directive("bogus"), "info");
    }

    #[test]
    fn test_cosmos_target() {
        let settings = Settings {
            cosmos_endpoint_rnninput: Some("https://db.example.com".to_string()),
            cosmos_primarykey_rnninput: Some(SecretString::from("a2V5".to_string())),
            cosmos_db_rnninput: Some("autoss".to_string()),
            cosmos_col_rnninput: Some("rnninput".to_string()),
            ..Settings::default()
        };
        let target = settings.cosmos_target(Collection::SequenceInputs).unwrap();
        assert_eq!(target.container, "rnninput");
        assert!(settings.cosmos_target(Collection::Vectors).is_err());
    }
}
