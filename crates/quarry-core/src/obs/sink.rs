use crate::data_source::BindParameters;
use serde_json::Value;
use std::{fmt, sync::Arc};
use tracing::Level;

/// Log target used by [`TracingQueryLogSink`].
pub const QUERY_LOG_TARGET: &str = "quarry::query";

///
/// QueryLogEntry
///
/// `parameters` is `Some` only when parameter logging is enabled; values are
/// in bind order.
///

#[derive(Clone, Debug, PartialEq)]
pub struct QueryLogEntry {
    pub level: Level,
    pub statement: String,
    pub parameters: Option<Vec<Value>>,
}

///
/// QueryLogSink
///

pub trait QueryLogSink: Send + Sync {
    fn record(&self, entry: QueryLogEntry);
}

///
/// TracingQueryLogSink
/// Default sink; emits one `tracing` event per entry.
///

#[derive(Clone, Copy, Debug, Default)]
pub struct TracingQueryLogSink;

// tracing needs the level at the call site
macro_rules! emit {
    ($level:expr, $($rest:tt)+) => {{
        let level = $level;
        if level == Level::ERROR {
            tracing::error!(target: QUERY_LOG_TARGET, $($rest)+);
        } else if level == Level::WARN {
            tracing::warn!(target: QUERY_LOG_TARGET, $($rest)+);
        } else if level == Level::INFO {
            tracing::info!(target: QUERY_LOG_TARGET, $($rest)+);
        } else if level == Level::DEBUG {
            tracing::debug!(target: QUERY_LOG_TARGET, $($rest)+);
        } else {
            tracing::trace!(target: QUERY_LOG_TARGET, $($rest)+);
        }
    }};
}

impl QueryLogSink for TracingQueryLogSink {
    fn record(&self, entry: QueryLogEntry) {
        let QueryLogEntry {
            level,
            statement,
            parameters,
        } = entry;

        match parameters {
            Some(parameters) => {
                let parameters = Value::Array(parameters);
                emit!(level, parameters = %parameters, "{statement}");
            }
            None => emit!(level, "{statement}"),
        }
    }
}

///
/// QueryLogger
///
/// Both switches default to off. With `log_queries` alone an entry carries
/// just the statement; with `log_parameters` too it also carries the bound
/// values.
///

#[derive(Clone)]
pub struct QueryLogger {
    log_queries: bool,
    log_parameters: bool,
    sink: Arc<dyn QueryLogSink>,
}

impl QueryLogger {
    #[must_use]
    pub fn new(log_queries: bool, log_parameters: bool, sink: Arc<dyn QueryLogSink>) -> Self {
        Self {
            log_queries,
            log_parameters,
            sink,
        }
    }

    /// Logger that never emits.
    #[must_use]
    pub fn disabled() -> Self {
        Self::new(false, false, Arc::new(TracingQueryLogSink))
    }

    #[must_use]
    pub const fn log_queries(&self) -> bool {
        self.log_queries
    }

    #[must_use]
    pub const fn log_parameters(&self) -> bool {
        self.log_parameters
    }

    /// Emit the statement (and optionally its bound values) once, before the
    /// connector runs it.
    pub fn log(&self, statement: &str, bind_params: &BindParameters) {
        if !self.log_queries {
            return;
        }

        let parameters = self
            .log_parameters
            .then(|| bind_params.values().cloned().collect());

        self.sink.record(QueryLogEntry {
            level: Level::INFO,
            statement: statement.to_string(),
            parameters,
        });
    }
}

impl Default for QueryLogger {
    fn default() -> Self {
        Self::disabled()
    }
}

impl fmt::Debug for QueryLogger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryLogger")
            .field("log_queries", &self.log_queries)
            .field("log_parameters", &self.log_parameters)
            .finish_non_exhaustive()
    }
}
