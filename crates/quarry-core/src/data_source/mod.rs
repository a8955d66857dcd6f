//! Data source execution contract.
//!
//! Every connector implements [`DataSource`]: `prepare` hands out the
//! placeholder token a bound value must be keyed by, and `execute` runs one
//! statement and returns its columns plus a lazy, pull-based row stream.
//! Rows reach the caller one at a time in backend order; the backend batches
//! them into bounded chunks internally (see [`stream`]).

pub mod stream;

use crate::obs::{QueryLogSink, QueryLogger};
use async_trait::async_trait;
use derive_more::Display;
use futures::{TryStreamExt, stream::BoxStream};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::{Map, Value};
use std::{fmt, sync::Arc};
use thiserror::Error as ThisError;

/// Token → value mapping passed to `execute`. Insertion order is the order
/// bound values are logged in.
pub type BindParameters = IndexMap<String, Value>;

/// One decoded row, keyed by column name in column order.
pub type DataRow = IndexMap<String, Value>;

/// Lazy row sequence returned by `execute`.
pub type RowStream = BoxStream<'static, Result<DataRow, DataSourceError>>;

///
/// DataSourceError
///

#[derive(Debug, ThisError)]
#[remain::sorted]
pub enum DataSourceError {
    #[error("cannot bind '{token}': {message}")]
    BindParameter { token: String, message: String },

    #[error("cannot decode column '{column}': {message}")]
    Decode { column: String, message: String },

    /// Backend rejected or failed the statement; `message` is the backend's
    /// own diagnostic.
    #[error("{message}")]
    Execution { message: String },

    #[error("invalid connection options for profile '{profile}': {message}")]
    InvalidOptions { profile: String, message: String },

    #[error("column '{column}' has unsupported native type '{native}'")]
    UnsupportedType { column: String, native: String },
}

impl DataSourceError {
    /// Wrap a backend diagnostic without rewording it.
    pub fn execution(err: impl fmt::Display) -> Self {
        Self::Execution {
            message: err.to_string(),
        }
    }
}

///
/// DataSourceKind
/// Backend selection key.
///

#[derive(Clone, Copy, Debug, Deserialize, Display, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum DataSourceKind {
    #[display("sqlite")]
    Sqlite,
    #[display("postgres")]
    Postgres,
}

///
/// ColumnType
///
/// Canonical column types exposed to consumers. Connectors map their native
/// types onto exactly one of these; `Unknown` is reserved for columns that
/// carry no type information at all (an untyped expression whose first value
/// is NULL).
///

#[derive(Clone, Copy, Debug, Deserialize, Display, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
#[remain::sorted]
pub enum ColumnType {
    #[display("binary")]
    Binary,
    #[display("boolean")]
    Boolean,
    #[display("date")]
    Date,
    #[display("json")]
    Json,
    #[display("number")]
    Number,
    #[display("string")]
    String,
    #[display("unknown")]
    Unknown,
}

///
/// DataColumn
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct DataColumn {
    pub name: String,

    #[serde(rename = "type")]
    pub column_type: ColumnType,
}

impl DataColumn {
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
        }
    }
}

///
/// PrepareParameter
///

#[derive(Clone, Debug, PartialEq)]
pub struct PrepareParameter {
    /// 1-based position of the parameter in the statement.
    pub parameter_index: usize,
    pub value: Value,
}

///
/// OperationContext
/// Per-request context handed to `execute`.
///

#[derive(Clone, Debug, Default)]
pub struct OperationContext {
    pub request_id: Option<String>,
}

///
/// ExecuteOptions
///

#[derive(Clone, Debug)]
pub struct ExecuteOptions {
    pub statement: String,
    pub bind_params: BindParameters,
    pub operations: OperationContext,
}

impl ExecuteOptions {
    pub fn new(statement: impl Into<String>) -> Self {
        Self {
            statement: statement.into(),
            bind_params: BindParameters::new(),
            operations: OperationContext::default(),
        }
    }

    #[must_use]
    pub fn bind(mut self, token: impl Into<String>, value: impl Into<Value>) -> Self {
        self.bind_params.insert(token.into(), value.into());
        self
    }

    #[must_use]
    pub fn with_bind_params(mut self, bind_params: BindParameters) -> Self {
        self.bind_params = bind_params;
        self
    }

    #[must_use]
    pub fn with_operations(mut self, operations: OperationContext) -> Self {
        self.operations = operations;
        self
    }
}

///
/// DataResult
///
/// Columns are known as soon as `execute` returns; rows are pulled lazily.
///

pub struct DataResult {
    columns: Vec<DataColumn>,
    data: RowStream,
}

impl DataResult {
    #[must_use]
    pub fn new(columns: Vec<DataColumn>, data: RowStream) -> Self {
        Self { columns, data }
    }

    /// Result with no columns and no rows.
    #[must_use]
    pub fn empty() -> Self {
        Self::new(Vec::new(), Box::pin(futures::stream::empty()))
    }

    /// Column descriptors in backend column order.
    #[must_use]
    pub fn columns(&self) -> &[DataColumn] {
        &self.columns
    }

    /// Take the row stream.
    #[must_use]
    pub fn into_data(self) -> RowStream {
        self.data
    }

    #[must_use]
    pub fn into_parts(self) -> (Vec<DataColumn>, RowStream) {
        (self.columns, self.data)
    }

    /// Drain every row into memory. Intended for small results and tests.
    pub async fn collect_rows(self) -> Result<Vec<DataRow>, DataSourceError> {
        self.data.try_collect().await
    }
}

impl fmt::Debug for DataResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataResult")
            .field("columns", &self.columns)
            .finish_non_exhaustive()
    }
}

///
/// DataSource
///

#[async_trait]
pub trait DataSource: Send + Sync {
    fn kind(&self) -> DataSourceKind;

    /// Register one positional value and return the placeholder token that
    /// must key it in `ExecuteOptions::bind_params`.
    async fn prepare(&self, parameter: PrepareParameter) -> Result<String, DataSourceError>;

    /// Run a statement. Backend failures surface here (or from the row
    /// stream, if they happen after the first chunk).
    async fn execute(&self, options: ExecuteOptions) -> Result<DataResult, DataSourceError>;
}

///
/// DataSourceProfile
///
/// One configured backend: selection key, query logging switches and the
/// backend-specific connection options (kept opaque here; each connector
/// deserializes its own shape).
///

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct DataSourceProfile {
    pub name: String,

    #[serde(rename = "type")]
    pub kind: DataSourceKind,

    #[serde(default)]
    pub log_queries: bool,

    #[serde(default)]
    pub log_parameters: bool,

    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub connection: Value,
}

impl DataSourceProfile {
    pub fn new(name: impl Into<String>, kind: DataSourceKind) -> Self {
        Self {
            name: name.into(),
            kind,
            log_queries: false,
            log_parameters: false,
            connection: Value::Null,
        }
    }

    #[must_use]
    pub const fn with_query_logging(mut self, log_queries: bool, log_parameters: bool) -> Self {
        self.log_queries = log_queries;
        self.log_parameters = log_parameters;
        self
    }

    #[must_use]
    pub fn with_connection(mut self, connection: Value) -> Self {
        self.connection = connection;
        self
    }

    /// Decode the connector's option struct. A missing connection table
    /// decodes as an empty one.
    pub fn connection_options<T: DeserializeOwned>(&self) -> Result<T, DataSourceError> {
        let value = match &self.connection {
            Value::Null => Value::Object(Map::new()),
            other => other.clone(),
        };

        serde_json::from_value(value).map_err(|e| DataSourceError::InvalidOptions {
            profile: self.name.clone(),
            message: e.to_string(),
        })
    }

    /// Query logger honouring this profile's logging switches.
    #[must_use]
    pub fn query_logger(&self, sink: Arc<dyn QueryLogSink>) -> QueryLogger {
        QueryLogger::new(self.log_queries, self.log_parameters, sink)
    }
}
