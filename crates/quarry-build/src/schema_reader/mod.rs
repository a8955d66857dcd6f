//! Schema document sources.
//!
//! A [`SchemaReader`] yields a lazy, finite, non-restartable sequence of
//! [`SchemaDocument`]s. The parser consumes it strictly in order.

mod file;

pub use file::FileSchemaReader;

use crate::options::SchemaParserOptions;
use derive_more::Display;
use futures::stream::BoxStream;
use serde::{Deserialize, Serialize};
use std::{io, path::PathBuf};
use thiserror::Error as ThisError;

///
/// ReaderError
///

#[derive(Debug, ThisError)]
pub enum ReaderError {
    #[error("cannot read schema source '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

///
/// SchemaFormat
/// Declared format of one document's content.
///

#[derive(Clone, Debug, Display, Eq, PartialEq)]
pub enum SchemaFormat {
    #[display("yaml")]
    Yaml,

    /// Any format tag without a decoder.
    #[display("{_0}")]
    Other(String),
}

impl SchemaFormat {
    /// Map a file extension onto a format tag.
    #[must_use]
    pub fn from_extension(extension: &str) -> Self {
        match extension.to_ascii_lowercase().as_str() {
            "yaml" | "yml" => Self::Yaml,
            _ => Self::Other(extension.to_string()),
        }
    }
}

///
/// SchemaDocument
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SchemaDocument {
    /// Stable identifier, unique within one read pass.
    pub source_name: String,
    pub format: SchemaFormat,
    pub content: String,
}

impl SchemaDocument {
    pub fn new(source_name: impl Into<String>, format: SchemaFormat, content: impl Into<String>) -> Self {
        Self {
            source_name: source_name.into(),
            format,
            content: content.into(),
        }
    }
}

/// Lazy document sequence returned by [`SchemaReader::read_schema`].
pub type SchemaDocumentStream<'a> = BoxStream<'a, Result<SchemaDocument, ReaderError>>;

///
/// SchemaReader
///

pub trait SchemaReader: Send + Sync {
    fn read_schema(&self) -> SchemaDocumentStream<'_>;
}

///
/// SchemaReaderKind
///

#[derive(Clone, Copy, Debug, Default, Deserialize, Display, Eq, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SchemaReaderKind {
    #[default]
    #[display("local-file")]
    LocalFile,
}

/// Build the reader selected by the parser options.
#[must_use]
pub fn create_schema_reader(options: &SchemaParserOptions) -> Box<dyn SchemaReader> {
    match options.reader {
        SchemaReaderKind::LocalFile => Box::new(FileSchemaReader::new(&options.schema_path)),
    }
}
