//! ## Crate layout
//! - `build`: schema readers, the middleware pipeline and the compiled artifact.
//! - `config`: the TOML project configuration.
//! - `core`: schemas, validators, the data source contract and query logging.
//! - `postgres` / `sqlite`: connectors, each behind its cargo feature.
//!
//! [`Builder`] compiles a project into its artifact; [`DataSourceRegistry`]
//! turns configured profiles into ready connectors.

pub use quarry_build as build;
pub use quarry_config as config;
pub use quarry_core as core;
#[cfg(feature = "postgres")]
pub use quarry_postgres as postgres;
#[cfg(feature = "sqlite")]
pub use quarry_sqlite as sqlite;

mod builder;
mod error;
pub mod registry;

pub use builder::Builder;
pub use error::Error;
pub use registry::{DataSourceRegistry, RegistryError, create_data_source};

//
// Consts
//

/// Workspace version re-export for downstream tooling/tests.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

///
/// Prelude
///

pub mod prelude {
    pub use crate::{
        Builder, DataSourceRegistry, Error,
        build::{Artifact, ParameterCheckPolicy, SchemaParser},
        config::QuarryConfig,
    };
    pub use quarry_core::prelude::*;
}
