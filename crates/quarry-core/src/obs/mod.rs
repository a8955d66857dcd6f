//! Observability: the query-log side channel.
//!
//! Connectors never call `tracing` for statement logging directly; they hand
//! statements to a [`QueryLogger`], which applies the profile's switches and
//! forwards at most one [`QueryLogEntry`] per execution to a [`QueryLogSink`].

mod sink;

pub use sink::{QUERY_LOG_TARGET, QueryLogEntry, QueryLogSink, QueryLogger, TracingQueryLogSink};
