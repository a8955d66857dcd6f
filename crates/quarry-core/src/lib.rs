//! Core vocabulary for Quarry: compiled API schemas, validators, the data
//! source execution contract, and the query-log sink.
//!
//! Schema compilation lives in `quarry-build`; concrete connectors live in
//! their own crates and implement [`data_source::DataSource`].

pub mod data_source;
pub mod obs;
pub mod schema;
pub mod validator;

///
/// CONSTANTS
///

/// Number of rows a connector batches into one chunk while streaming.
///
/// Chunks are a backend-internal unit; consumers only ever see single rows.
pub const DEFAULT_CHUNK_SIZE: usize = 1024;

///
/// Prelude
///
/// Domain vocabulary only. Connectors, sinks and helpers stay in their
/// modules.
///

pub mod prelude {
    pub use crate::{
        data_source::{
            BindParameters, ColumnType, DataColumn, DataResult, DataRow, DataSource,
            DataSourceKind, DataSourceProfile, ExecuteOptions, OperationContext, PrepareParameter,
        },
        schema::{
            AllTemplateMetadata, ApiSchema, ErrorDefinition, FieldIn, FieldType, RequestParameter,
            TemplateMetadata, ValidatorDefinition,
        },
        validator::{Validator, ValidatorLoader},
    };
}
