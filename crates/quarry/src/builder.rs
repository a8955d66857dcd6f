use crate::Error;
use quarry_build::{Artifact, Middleware, SchemaParser};
use quarry_config::QuarryConfig;
use quarry_core::{
    schema::AllTemplateMetadata,
    validator::{ValidatorLoader, ValidatorRegistry},
};
use std::sync::Arc;

///
/// Builder
///
/// Compiles every schema document under the configured folder, checks that
/// each referenced profile exists, and writes the artifact.
///

pub struct Builder {
    loader: Arc<dyn ValidatorLoader>,
    middleware: Vec<Arc<dyn Middleware>>,
}

impl Default for Builder {
    fn default() -> Self {
        Self::new(Arc::new(ValidatorRegistry::builtin()))
    }
}

impl Builder {
    #[must_use]
    pub fn new(loader: Arc<dyn ValidatorLoader>) -> Self {
        Self {
            loader,
            middleware: Vec::new(),
        }
    }

    /// Extra stage appended after the standard set.
    #[must_use]
    pub fn with_middleware(mut self, middleware: Arc<dyn Middleware>) -> Self {
        self.middleware.push(middleware);
        self
    }

    pub async fn build(
        &self,
        config: &QuarryConfig,
        metadata: Option<Arc<AllTemplateMetadata>>,
    ) -> Result<Artifact, Error> {
        let mut parser = SchemaParser::from_options(&config.schema_parser, Arc::clone(&self.loader));
        for stage in &self.middleware {
            parser.add_middleware(Arc::clone(stage));
        }

        let artifact = Artifact::from(parser.parse(metadata).await?);
        for schema in &artifact.schemas {
            if let Some(profile) = schema.profiles.iter().find(|p| config.profile(p).is_none()) {
                return Err(Error::UnknownProfile {
                    source_name: schema.source_name.clone(),
                    profile: profile.clone(),
                });
            }
        }

        artifact.write(&config.artifact.path).await?;
        tracing::info!(
            path = %config.artifact.path.display(),
            schemas = artifact.schemas.len(),
            "build finished"
        );

        Ok(artifact)
    }
}
