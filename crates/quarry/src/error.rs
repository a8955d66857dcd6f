use crate::registry::RegistryError;
use quarry_build::{ArtifactError, ParseError};
use quarry_config::ConfigError;
use quarry_core::data_source::DataSourceError;
use thiserror::Error as ThisError;

///
/// Error
/// Any failure surfaced by the facade.
///

#[derive(Debug, ThisError)]
#[remain::sorted]
pub enum Error {
    #[error(transparent)]
    Artifact(#[from] ArtifactError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    DataSource(#[from] DataSourceError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error("schema '{source_name}' references unknown profile '{profile}'")]
    UnknownProfile {
        source_name: String,
        profile: String,
    },
}
