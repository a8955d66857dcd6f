//! Schema compilation: format decoding plus the middleware pipeline.

pub mod middleware;
mod raw;

pub use middleware::{Middleware, MiddlewareError, Next, Pipeline};
pub use raw::{RawApiSchema, RawRequestParameter, RawValidator};

use crate::{
    options::{ParameterCheckPolicy, SchemaParserOptions},
    schema_reader::{ReaderError, SchemaDocument, SchemaFormat, SchemaReader, create_schema_reader},
};
use futures::TryStreamExt;
use middleware::{
    AddMissingErrors, CheckParameter, CheckValidator, FallbackErrors, GenerateTemplateSource,
    GenerateUrl, TransformValidator,
};
use quarry_core::{
    schema::{AllTemplateMetadata, ApiSchema},
    validator::ValidatorLoader,
};
use std::{fmt, sync::Arc};
use thiserror::Error as ThisError;

///
/// ParseError
///
/// Every variant tied to one document names its source.
///

#[derive(Debug, ThisError)]
#[remain::sorted]
pub enum ParseError {
    #[error("cannot decode schema '{source_name}': {source}")]
    Decode {
        source_name: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("schema '{source_name}': {source}")]
    Middleware {
        source_name: String,
        #[source]
        source: MiddlewareError,
    },

    #[error(transparent)]
    Read(#[from] ReaderError),

    #[error("schema '{source_name}' has unsupported format '{format}'")]
    UnsupportedFormat { source_name: String, format: String },
}

/// Decode one document into a draft. Empty content decodes as an empty
/// draft.
pub fn parse_content(document: SchemaDocument) -> Result<RawApiSchema, ParseError> {
    let SchemaDocument {
        source_name,
        format,
        content,
    } = document;

    let mut raw = match format {
        SchemaFormat::Yaml if content.trim().is_empty() => RawApiSchema::default(),
        SchemaFormat::Yaml => {
            serde_yaml::from_str::<Option<RawApiSchema>>(&content)
                .map_err(|source| ParseError::Decode {
                    source_name: source_name.clone(),
                    source,
                })?
                .unwrap_or_default()
        }
        SchemaFormat::Other(format) => {
            return Err(ParseError::UnsupportedFormat {
                source_name,
                format,
            });
        }
    };
    raw.source_name = source_name;

    Ok(raw)
}

///
/// SchemaParseResult
///

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SchemaParseResult {
    pub schemas: Vec<ApiSchema>,
}

///
/// SchemaParser
///
/// Reads every document, runs it through the standard stages and collects
/// the compiled schemas. The metadata-driven stages are appended per call
/// only when metadata is supplied. The first failing document aborts the
/// pass.
///

pub struct SchemaParser {
    reader: Box<dyn SchemaReader>,
    middleware: Vec<Arc<dyn Middleware>>,
    parameter_check: ParameterCheckPolicy,
}

impl SchemaParser {
    /// Parser with the standard stage set.
    #[must_use]
    pub fn new(reader: Box<dyn SchemaReader>, loader: Arc<dyn ValidatorLoader>) -> Self {
        Self {
            reader,
            middleware: vec![
                Arc::new(GenerateUrl),
                Arc::new(GenerateTemplateSource),
                Arc::new(TransformValidator),
                Arc::new(CheckValidator::new(loader)),
                Arc::new(FallbackErrors),
            ],
            parameter_check: ParameterCheckPolicy::default(),
        }
    }

    /// Parser whose reader and policy come from configuration.
    #[must_use]
    pub fn from_options(options: &SchemaParserOptions, loader: Arc<dyn ValidatorLoader>) -> Self {
        Self::new(create_schema_reader(options), loader).with_parameter_check(options.parameter_check)
    }

    #[must_use]
    pub const fn with_parameter_check(mut self, policy: ParameterCheckPolicy) -> Self {
        self.parameter_check = policy;
        self
    }

    /// Append a stage after the standard set.
    pub fn add_middleware(&mut self, middleware: Arc<dyn Middleware>) {
        self.middleware.push(middleware);
    }

    /// Registered stage names, without the per-call metadata stages.
    #[must_use]
    pub fn stage_names(&self) -> Vec<&'static str> {
        self.middleware.iter().map(|stage| stage.name()).collect()
    }

    pub async fn parse(
        &self,
        metadata: Option<Arc<AllTemplateMetadata>>,
    ) -> Result<SchemaParseResult, ParseError> {
        let pipeline = self.pipeline(metadata);
        let mut documents = self.reader.read_schema();
        let mut schemas = Vec::new();

        while let Some(document) = documents.try_next().await? {
            let mut raw = parse_content(document)?;
            let source_name = raw.source_name.clone();
            let wrap = |source| ParseError::Middleware {
                source_name: source_name.clone(),
                source,
            };

            pipeline.execute(&mut raw).await.map_err(wrap)?;
            let schema = raw.into_schema().map_err(wrap)?;

            tracing::debug!(
                source_name = %schema.source_name,
                url_path = %schema.url_path,
                parameters = schema.request.len(),
                errors = schema.errors.len(),
                "compiled schema"
            );
            schemas.push(schema);
        }

        Ok(SchemaParseResult { schemas })
    }

    fn pipeline(&self, metadata: Option<Arc<AllTemplateMetadata>>) -> Pipeline {
        let mut stages = self.middleware.clone();

        if let Some(metadata) = metadata {
            stages.push(Arc::new(CheckParameter::new(
                metadata.clone(),
                self.parameter_check,
            )));
            stages.push(Arc::new(AddMissingErrors::new(metadata)));
        }

        Pipeline::compose(stages)
    }
}

impl fmt::Debug for SchemaParser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchemaParser")
            .field("middleware", &self.stage_names())
            .field("parameter_check", &self.parameter_check)
            .finish_non_exhaustive()
    }
}
