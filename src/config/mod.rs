//! Configuration management.
//!
//! Settings come from a TOML file (`graphport.toml`), an optional
//! `GRAPHPORT_BATCH_SIZE` environment override, and console-style option
//! strings such as `batchSize=10 lenient=true`.

use crate::io::{AttributeStrategy, AttributeStrategyRegistry, ImportOptions};
use crate::models::ElementKind;
use crate::{Error, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Environment variable overriding the configured batch size.
pub const BATCH_SIZE_ENV: &str = "GRAPHPORT_BATCH_SIZE";

/// Default number of elements per commit; `0` commits once at the end.
pub const DEFAULT_BATCH_SIZE: usize = 0;

/// Main configuration for graphport.
#[derive(Debug, Clone, Default)]
pub struct GraphportConfig {
    /// Path to the `SQLite` database backing the CLI.
    pub database: Option<PathBuf>,
    /// Import settings.
    pub import: ImportSettings,
    /// Logging settings.
    pub logging: LoggingSettings,
}

/// Import-side configuration bag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportSettings {
    /// Elements per commit; `0` commits once at the end.
    pub batch_size: usize,
    /// Drop edges with unknown endpoints instead of failing.
    pub lenient: bool,
    /// Attribute whose raw value labels unlabeled vertices.
    pub vertex_label_key: Option<String>,
    /// Per-attribute strategies.
    pub strategies: AttributeStrategyRegistry,
}

impl Default for ImportSettings {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            lenient: false,
            vertex_label_key: None,
            strategies: AttributeStrategyRegistry::default(),
        }
    }
}

/// Logging section of the config file.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct LoggingSettings {
    /// `pretty` or `json`.
    pub format: Option<String>,
    /// Filter directive, e.g. `graphport=debug`.
    pub level: Option<String>,
}

/// Configuration file structure (for TOML parsing).
#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    /// Database path.
    pub database: Option<String>,
    /// Import section.
    pub import: Option<ConfigFileImport>,
    /// Logging section.
    pub logging: Option<LoggingSettings>,
}

/// Import section in config file.
#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ConfigFileImport {
    /// Batch size.
    pub batch_size: Option<usize>,
    /// Lenient endpoint handling.
    pub lenient: Option<bool>,
    /// Vertex label key.
    pub vertex_label_key: Option<String>,
    /// Vertex attribute strategies by key.
    #[serde(default)]
    pub vertex_attribute_strategy: BTreeMap<String, StrategyEntry>,
    /// Edge attribute strategies by key.
    #[serde(default)]
    pub edge_attribute_strategy: BTreeMap<String, StrategyEntry>,
}

/// A strategy as written in the config file.
///
/// Either the compact `"rename:target"` form or a table
/// `{ strategy = "rename", target = "t" }`.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum StrategyEntry {
    /// `name[:target]`.
    Inline(String),
    /// Explicit table.
    Table {
        /// Strategy name.
        strategy: String,
        /// Rename target.
        target: Option<String>,
    },
}

impl StrategyEntry {
    /// Builds the strategy this entry describes.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] for unknown names or a rename without target.
    pub fn to_strategy(&self) -> Result<AttributeStrategy> {
        match self {
            Self::Inline(descriptor) => AttributeStrategy::parse_descriptor(descriptor),
            Self::Table { strategy, target } => {
                AttributeStrategy::from_name(strategy, target.as_deref())
            },
        }
    }
}

impl ImportSettings {
    /// Parses a console-style option string.
    ///
    /// Tokens are whitespace separated `key=value` pairs. Recognized keys are
    /// `batchSize`, `lenient`, `vertexLabelKey`, and
    /// `vertexAttributeStrategy.<key>` / `edgeAttributeStrategy.<key>` whose
    /// value is `name[:target]`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] for malformed tokens, unknown keys,
    /// non-numeric batch sizes, or invalid strategies.
    pub fn parse_options(input: &str) -> Result<Self> {
        let mut settings = Self::default();
        settings.apply_options(input)?;
        Ok(settings)
    }

    /// Applies a console-style option string on top of these settings.
    ///
    /// # Errors
    ///
    /// See [`Self::parse_options`].
    pub fn apply_options(&mut self, input: &str) -> Result<()> {
        for token in input.split_whitespace() {
            let token = token.trim_end_matches(';');
            if token.is_empty() {
                continue;
            }
            let (key, value) = token.split_once('=').ok_or_else(|| {
                Error::Configuration(format!("expected key=value, got '{token}'"))
            })?;
            self.set(key, value)?;
        }
        Ok(())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        if let Some(attr) = key.strip_prefix("vertexAttributeStrategy.") {
            self.strategies
                .register(ElementKind::Vertex, attr, AttributeStrategy::parse_descriptor(value)?);
            return Ok(());
        }
        if let Some(attr) = key.strip_prefix("edgeAttributeStrategy.") {
            self.strategies
                .register(ElementKind::Edge, attr, AttributeStrategy::parse_descriptor(value)?);
            return Ok(());
        }

        match key {
            "batchSize" => self.batch_size = parse_batch_size(value)?,
            "lenient" => {
                self.lenient = value.parse().map_err(|_| {
                    Error::Configuration(format!("lenient must be true or false, got '{value}'"))
                })?;
            },
            "vertexLabelKey" => {
                self.vertex_label_key = (!value.is_empty()).then(|| value.to_string());
            },
            other => {
                return Err(Error::Configuration(format!("unknown option '{other}'")));
            },
        }
        Ok(())
    }

    /// Returns a copy of the configured strategies.
    #[must_use]
    pub fn registry(&self) -> AttributeStrategyRegistry {
        self.strategies.clone()
    }

    /// Converts the settings into pipeline options.
    #[must_use]
    pub fn to_import_options(&self) -> ImportOptions {
        let mut options = ImportOptions::default()
            .with_batch_size(self.batch_size)
            .with_lenient(self.lenient)
            .with_strategies(self.registry());
        if let Some(key) = &self.vertex_label_key {
            options = options.with_vertex_label_key(key.clone());
        }
        options
    }

    fn merge_file(&mut self, file: ConfigFileImport) -> Result<()> {
        if let Some(batch_size) = file.batch_size {
            self.batch_size = batch_size;
        }
        if let Some(lenient) = file.lenient {
            self.lenient = lenient;
        }
        if file.vertex_label_key.is_some() {
            self.vertex_label_key = file.vertex_label_key;
        }
        for (key, entry) in &file.vertex_attribute_strategy {
            self.strategies
                .register(ElementKind::Vertex, key.as_str(), entry.to_strategy()?);
        }
        for (key, entry) in &file.edge_attribute_strategy {
            self.strategies
                .register(ElementKind::Edge, key.as_str(), entry.to_strategy()?);
        }
        Ok(())
    }
}

fn parse_batch_size(value: &str) -> Result<usize> {
    value.trim().parse().map_err(|_| {
        Error::Configuration(format!("batchSize must be a non-negative integer, got '{value}'"))
    })
}

impl GraphportConfig {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if the text is not valid configuration.
    pub fn from_toml(contents: &str) -> Result<Self> {
        let file: ConfigFile =
            toml::from_str(contents).map_err(|e| Error::Configuration(e.to_string()))?;
        Self::from_config_file(file)
    }

    /// Loads configuration from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| Error::OperationFailed {
            operation: "read_config_file".to_string(),
            cause: format!("{}: {e}", path.display()),
        })?;
        Self::from_toml(&contents)
    }

    /// Loads configuration from the default location.
    ///
    /// Checks the platform config dir (`~/.config/graphport/graphport.toml`
    /// on Linux) and returns defaults if no file is found. A file that
    /// exists but fails to parse is an error.
    ///
    /// # Errors
    ///
    /// Returns an error if a config file exists but is invalid.
    pub fn load_default() -> Result<Self> {
        let Some(dirs) = directories::ProjectDirs::from("", "", "graphport") else {
            return Ok(Self::default());
        };
        let path = dirs.config_dir().join("graphport.toml");
        if path.exists() {
            tracing::debug!(path = %path.display(), "loading config file");
            return Self::load_from_file(&path);
        }
        Ok(Self::default())
    }

    /// Applies environment overrides using the given lookup.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if `GRAPHPORT_BATCH_SIZE` is not a number.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup(BATCH_SIZE_ENV) {
            self.import.batch_size = parse_batch_size(&value)?;
        }
        Ok(())
    }

    /// Applies overrides from the process environment.
    ///
    /// # Errors
    ///
    /// See [`Self::apply_env`].
    pub fn apply_process_env(&mut self) -> Result<()> {
        self.apply_env(|key| std::env::var(key).ok())
    }

    fn from_config_file(file: ConfigFile) -> Result<Self> {
        let mut config = Self::default();
        if let Some(database) = file.database {
            config.database = Some(PathBuf::from(database));
        }
        if let Some(import) = file.import {
            config.import.merge_file(import)?;
        }
        if let Some(logging) = file.logging {
            config.logging = logging;
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test]
    fn test_parse_options() {
        let settings = ImportSettings::parse_options(
            "batchSize=10 lenient=true vertexAttributeStrategy.__type__=ignore \
             edgeAttributeStrategy.w=rename:weight",
        )
        .unwrap();
        assert_eq!(settings.batch_size, 10);
        assert!(settings.lenient);
        assert_eq!(
            settings.strategies.get(ElementKind::Vertex, "__type__"),
            Some(&AttributeStrategy::Ignore)
        );
        assert_eq!(
            settings.strategies.get(ElementKind::Edge, "w"),
            Some(&AttributeStrategy::rename("weight"))
        );
    }

    #[test]
    fn test_unset_batch_size_commits_once() {
        let settings = ImportSettings::parse_options("lenient=true").unwrap();
        assert_eq!(settings.batch_size, 0);
        assert_eq!(ImportSettings::parse_options("").unwrap().batch_size, 0);

        let config = GraphportConfig::from_toml("[import]\nlenient = true\n").unwrap();
        assert_eq!(config.import.batch_size, 0);
        assert_eq!(config.import.to_import_options().batch_size, 0);
    }

    #[test]
    fn test_trailing_semicolon_is_tolerated() {
        let settings = ImportSettings::parse_options("batchSize=10;").unwrap();
        assert_eq!(settings.batch_size, 10);
    }

    #[test_case("batchSize=ten" ; "non numeric batch size")]
    #[test_case("batchSize=-1" ; "negative batch size")]
    #[test_case("colour=blue" ; "unknown key")]
    #[test_case("batchSize" ; "missing value")]
    #[test_case("vertexAttributeStrategy.x=shred" ; "unknown strategy")]
    #[test_case("edgeAttributeStrategy.x=rename" ; "rename without target")]
    fn test_invalid_options(input: &str) {
        let err = ImportSettings::parse_options(input).unwrap_err();
        assert!(err.is_configuration(), "{err:?}");
    }

    #[test]
    fn test_from_toml() {
        let config = GraphportConfig::from_toml(
            r#"
            database = "graph.db"

            [import]
            batchSize = 50
            vertexLabelKey = "__type__"

            [import.vertexAttributeStrategy]
            __type__ = "ignore"
            name = { strategy = "rename", target = "title" }

            [logging]
            format = "json"
            "#,
        )
        .unwrap();

        assert_eq!(config.database, Some(PathBuf::from("graph.db")));
        assert_eq!(config.import.batch_size, 50);
        assert_eq!(config.import.vertex_label_key.as_deref(), Some("__type__"));
        assert_eq!(config.import.strategies.len(), 2);
        assert_eq!(
            config.import.strategies.get(ElementKind::Vertex, "name"),
            Some(&AttributeStrategy::rename("title"))
        );
        assert_eq!(config.logging.format.as_deref(), Some("json"));
    }

    #[test]
    fn test_from_toml_rejects_bad_batch_size() {
        let err = GraphportConfig::from_toml("[import]\nbatchSize = \"many\"\n").unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_from_toml_rejects_unknown_key() {
        let err = GraphportConfig::from_toml("[import]\nbatchsize = 5\n").unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_env_override() {
        let mut config = GraphportConfig::default();
        config
            .apply_env(|key| (key == BATCH_SIZE_ENV).then(|| "25".to_string()))
            .unwrap();
        assert_eq!(config.import.batch_size, 25);

        let err = config
            .apply_env(|_| Some("lots".to_string()))
            .unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_to_import_options() {
        let settings = ImportSettings::parse_options("batchSize=0 vertexLabelKey=kind").unwrap();
        let options = settings.to_import_options();
        assert_eq!(options.batch_size, 0);
        assert_eq!(options.vertex_label_key.as_deref(), Some("kind"));
        assert!(!options.lenient);
    }
}
