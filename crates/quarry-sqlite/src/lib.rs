//! Embedded SQLite connector.
//!
//! Statements run on tokio's blocking pool. The producer steps the native
//! cursor, batches rows into chunks of [`DEFAULT_CHUNK_SIZE`] and hands them
//! to the shared chunk streamer, so at most one chunk is buffered ahead of
//! the consumer.

mod decode;

use async_trait::async_trait;
use decode::{SqliteColumn, SqliteRow, SqliteRowDecoder, bind_value};
use quarry_core::{
    DEFAULT_CHUNK_SIZE,
    data_source::{
        BindParameters, DataResult, DataSource, DataSourceError, DataSourceKind,
        DataSourceProfile, ExecuteOptions, PrepareParameter,
        stream::{ChunkSender, chunk_channel, stream_chunks},
    },
    obs::{QueryLogSink, QueryLogger},
};
use rusqlite::{Connection, types::Value as SqlValue};
use serde::{Deserialize, Serialize};
use std::{
    mem,
    path::PathBuf,
    sync::{Arc, Mutex},
};

///
/// SqliteOptions
/// Connection options read from a profile's `connection` table.
///

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct SqliteOptions {
    /// Database file. Without one the connector uses a private in-memory
    /// database that lives as long as the connector.
    pub persistent_path: Option<PathBuf>,
}

// Where connections are opened.
#[derive(Clone, Debug)]
enum Target {
    File(PathBuf),
    Memory(String),
}

impl Target {
    fn open(&self) -> Result<Connection, DataSourceError> {
        let opened = match self {
            Self::File(path) => Connection::open(path),
            Self::Memory(uri) => Connection::open(uri),
        };

        opened.map_err(DataSourceError::execution)
    }
}

///
/// SqliteDataSource
///
/// Every execution opens its own connection. The in-memory database is a
/// named shared-cache database kept alive by an anchor connection held for
/// the connector's lifetime.
///

pub struct SqliteDataSource {
    target: Target,
    logger: QueryLogger,
    _anchor: Option<Mutex<Connection>>,
}

impl SqliteDataSource {
    pub fn new(options: SqliteOptions, logger: QueryLogger) -> Result<Self, DataSourceError> {
        let (target, anchor) = match options.persistent_path {
            Some(path) => (Target::File(path), None),
            None => {
                let uri = format!(
                    "file:quarry-{}?mode=memory&cache=shared",
                    uuid::Uuid::new_v4().simple()
                );
                let target = Target::Memory(uri);
                let anchor = target.open()?;

                (target, Some(Mutex::new(anchor)))
            }
        };

        tracing::debug!(database = ?target, "sqlite data source ready");

        Ok(Self {
            target,
            logger,
            _anchor: anchor,
        })
    }

    /// Build from a configured profile.
    pub fn from_profile(
        profile: &DataSourceProfile,
        sink: Arc<dyn QueryLogSink>,
    ) -> Result<Self, DataSourceError> {
        let options = profile.connection_options::<SqliteOptions>()?;

        Self::new(options, profile.query_logger(sink))
    }
}

#[async_trait]
impl DataSource for SqliteDataSource {
    fn kind(&self) -> DataSourceKind {
        DataSourceKind::Sqlite
    }

    async fn prepare(&self, parameter: PrepareParameter) -> Result<String, DataSourceError> {
        Ok(format!("${}", parameter.parameter_index))
    }

    async fn execute(&self, options: ExecuteOptions) -> Result<DataResult, DataSourceError> {
        let ExecuteOptions {
            statement,
            bind_params,
            ..
        } = options;

        self.logger.log(&statement, &bind_params);

        let (sender, chunks) = chunk_channel();
        let target = self.target.clone();

        // detached; the producer ends when the consumer drops the stream
        tokio::task::spawn_blocking(move || {
            if let Err(err) = produce(&target, &statement, &bind_params, &sender) {
                sender.blocking_send(Err(err));
            }
        });

        stream_chunks(SqliteRowDecoder, chunks).await
    }
}

// Run one statement and push its rows in chunks. Returns early once the
// consumer is gone.
fn produce(
    target: &Target,
    statement: &str,
    bind_params: &BindParameters,
    sender: &ChunkSender<SqliteRow>,
) -> Result<(), DataSourceError> {
    let connection = target.open()?;
    let mut stmt = connection
        .prepare(statement)
        .map_err(DataSourceError::execution)?;

    for (token, value) in bind_params {
        let index = stmt
            .parameter_index(token)
            .map_err(DataSourceError::execution)?
            .ok_or_else(|| DataSourceError::BindParameter {
                token: token.clone(),
                message: "statement has no such placeholder".to_string(),
            })?;

        stmt.raw_bind_parameter(index, bind_value(value))
            .map_err(|e| DataSourceError::BindParameter {
                token: token.clone(),
                message: e.to_string(),
            })?;
    }

    let header: Arc<[SqliteColumn]> = stmt
        .columns()
        .iter()
        .map(|column| SqliteColumn {
            name: column.name().to_string(),
            decl_type: column.decl_type().map(str::to_string),
        })
        .collect();
    let width = header.len();

    let mut rows = stmt.raw_query();
    let mut chunk = Vec::with_capacity(DEFAULT_CHUNK_SIZE);

    while let Some(row) = rows.next().map_err(DataSourceError::execution)? {
        let values = (0..width)
            .map(|i| row.get::<_, SqlValue>(i))
            .collect::<Result<Vec<_>, _>>()
            .map_err(DataSourceError::execution)?;

        chunk.push(SqliteRow {
            header: header.clone(),
            values,
        });

        if chunk.len() == DEFAULT_CHUNK_SIZE {
            let full = mem::replace(&mut chunk, Vec::with_capacity(DEFAULT_CHUNK_SIZE));
            if !sender.blocking_send(Ok(full)) {
                return Ok(());
            }
        }
    }

    if !chunk.is_empty() {
        sender.blocking_send(Ok(chunk));
    }

    Ok(())
}
