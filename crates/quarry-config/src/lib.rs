//! Project configuration loaded from a TOML document.
//!
//! ```toml
//! [schema-parser]
//! schema-path = "sqls"
//! parameter-check = "warn"
//!
//! [artifact]
//! path = "dist/result.json"
//!
//! [[profiles]]
//! name = "local"
//! type = "sqlite"
//! log-queries = true
//! [profiles.connection]
//! persistent-path = "data.db"
//! ```

use quarry_build::options::{ArtifactOptions, SchemaParserOptions};
use quarry_core::data_source::{DataSourceKind, DataSourceProfile};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::{
    collections::BTreeSet,
    fs, io,
    path::{Path, PathBuf},
};
use thiserror::Error as ThisError;

/// Connection key holding a SQLite database file.
const SQLITE_PATH_KEY: &str = "persistent-path";

///
/// ConfigError
///

#[derive(Debug, ThisError)]
pub enum ConfigError {
    #[error("duplicate profile name '{0}'")]
    DuplicateProfile(String),

    #[error("cannot read config '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}

///
/// QuarryConfig
///

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct QuarryConfig {
    pub schema_parser: SchemaParserOptions,
    pub artifact: ArtifactOptions,
    pub profiles: Vec<DataSourceProfile>,
}

impl QuarryConfig {
    /// Parse and validate a TOML document. Paths are kept as written.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;

        Ok(config)
    }

    /// Load a config file. Relative paths inside it resolve against the
    /// file's folder.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let source = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let mut config = Self::from_toml_str(&source)?;
        if let Some(base) = path.parent() {
            config.resolve_paths(base);
        }

        tracing::debug!(
            path = %path.display(),
            profiles = config.profiles.len(),
            "config loaded"
        );

        Ok(config)
    }

    /// Look up a profile by name.
    #[must_use]
    pub fn profile(&self, name: &str) -> Option<&DataSourceProfile> {
        self.profiles.iter().find(|p| p.name == name)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let mut seen = BTreeSet::new();
        for profile in &self.profiles {
            if !seen.insert(profile.name.as_str()) {
                return Err(ConfigError::DuplicateProfile(profile.name.clone()));
            }
        }

        Ok(())
    }

    fn resolve_paths(&mut self, base: &Path) {
        let resolve = |path: &Path| {
            if path.is_relative() {
                base.join(path)
            } else {
                path.to_path_buf()
            }
        };

        self.schema_parser.schema_path = resolve(&self.schema_parser.schema_path);
        self.artifact.path = resolve(&self.artifact.path);

        for profile in &mut self.profiles {
            if profile.kind != DataSourceKind::Sqlite {
                continue;
            }
            if let Some(Value::String(file)) = profile.connection.get_mut(SQLITE_PATH_KEY) {
                *file = resolve(Path::new(file.as_str())).to_string_lossy().into_owned();
            }
        }
    }
}
