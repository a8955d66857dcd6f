//! Connector construction keyed by backend kind, and a name-indexed set of
//! live connectors.

use quarry_core::{
    data_source::{DataSource, DataSourceError, DataSourceKind, DataSourceProfile},
    obs::QueryLogSink,
};
use std::{collections::HashMap, sync::Arc};
use thiserror::Error as ThisError;

///
/// RegistryError
///

#[derive(Debug, ThisError)]
#[remain::sorted]
pub enum RegistryError {
    #[error("data source '{0}' is already registered")]
    AlreadyRegistered(String),

    #[error("cannot create data source '{profile}': {source}")]
    DataSource {
        profile: String,
        #[source]
        source: DataSourceError,
    },

    #[error("data source '{0}' not found")]
    NotFound(String),

    #[error("backend '{0}' is not compiled into this build")]
    Unsupported(DataSourceKind),
}

#[cfg(any(feature = "sqlite", feature = "postgres"))]
fn wrap(profile: &DataSourceProfile, source: DataSourceError) -> RegistryError {
    RegistryError::DataSource {
        profile: profile.name.clone(),
        source,
    }
}

/// Build the connector a profile asks for.
#[cfg_attr(
    not(any(feature = "sqlite", feature = "postgres")),
    allow(unused_variables, unreachable_code)
)]
pub fn create_data_source(
    profile: &DataSourceProfile,
    sink: Arc<dyn QueryLogSink>,
) -> Result<Arc<dyn DataSource>, RegistryError> {
    let source: Arc<dyn DataSource> = match profile.kind {
        #[cfg(feature = "sqlite")]
        DataSourceKind::Sqlite => Arc::new(
            quarry_sqlite::SqliteDataSource::from_profile(profile, sink)
                .map_err(|source| wrap(profile, source))?,
        ),
        #[cfg(not(feature = "sqlite"))]
        DataSourceKind::Sqlite => return Err(RegistryError::Unsupported(DataSourceKind::Sqlite)),

        #[cfg(feature = "postgres")]
        DataSourceKind::Postgres => Arc::new(
            quarry_postgres::PostgresDataSource::from_profile(profile, sink)
                .map_err(|source| wrap(profile, source))?,
        ),
        #[cfg(not(feature = "postgres"))]
        DataSourceKind::Postgres => {
            return Err(RegistryError::Unsupported(DataSourceKind::Postgres));
        }
    };

    tracing::debug!(profile = %profile.name, kind = %profile.kind, "data source created");

    Ok(source)
}

///
/// DataSourceRegistry
///

#[derive(Default)]
pub struct DataSourceRegistry {
    sources: HashMap<String, Arc<dyn DataSource>>,
}

impl DataSourceRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create and register one connector per profile. Connectors that reach
    /// a server connect lazily, so this must run inside a tokio runtime.
    pub fn from_profiles<'a>(
        profiles: impl IntoIterator<Item = &'a DataSourceProfile>,
        sink: &Arc<dyn QueryLogSink>,
    ) -> Result<Self, RegistryError> {
        let mut registry = Self::new();
        for profile in profiles {
            let source = create_data_source(profile, Arc::clone(sink))?;
            registry.register(&profile.name, source)?;
        }

        Ok(registry)
    }

    pub fn register(
        &mut self,
        name: &str,
        source: Arc<dyn DataSource>,
    ) -> Result<(), RegistryError> {
        if self.sources.contains_key(name) {
            return Err(RegistryError::AlreadyRegistered(name.to_string()));
        }
        self.sources.insert(name.to_string(), source);

        Ok(())
    }

    pub fn try_get(&self, name: &str) -> Result<Arc<dyn DataSource>, RegistryError> {
        self.sources
            .get(name)
            .cloned()
            .ok_or_else(|| RegistryError::NotFound(name.to_string()))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Arc<dyn DataSource>)> {
        self.sources.iter().map(|(name, source)| (name.as_str(), source))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.sources.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}
