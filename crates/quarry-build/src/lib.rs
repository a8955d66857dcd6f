//! Build-time schema compilation.
//!
//! ## Crate layout
//! - `schema_reader`: where raw schema documents come from.
//! - `schema_parser`: format decoding and the middleware pipeline that turns
//!   a raw document into an [`ApiSchema`](quarry_core::schema::ApiSchema).
//! - `artifact`: persistence of the compiled schema list.
//! - `options`: parser options consumed from configuration.

pub mod artifact;
pub mod options;
pub mod schema_parser;
pub mod schema_reader;

pub use artifact::{Artifact, ArtifactError};
pub use options::{ArtifactOptions, ParameterCheckPolicy, SchemaParserOptions};
pub use schema_parser::{
    Middleware, MiddlewareError, Next, ParseError, RawApiSchema, SchemaParseResult, SchemaParser,
};
pub use schema_reader::{
    FileSchemaReader, ReaderError, SchemaDocument, SchemaDocumentStream, SchemaFormat,
    SchemaReader, SchemaReaderKind, create_schema_reader,
};
