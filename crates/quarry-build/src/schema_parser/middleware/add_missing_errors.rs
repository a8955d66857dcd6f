use crate::schema_parser::{
    RawApiSchema,
    middleware::{Middleware, MiddlewareError, Next},
};
use async_trait::async_trait;
use quarry_core::schema::{AllTemplateMetadata, ErrorDefinition, TemplateMetadata};
use std::sync::Arc;

/// Append a placeholder for every error code the template raises that
/// `errors` does not have yet. Idempotent.
pub fn add_missing_errors(errors: &mut Vec<ErrorDefinition>, metadata: &TemplateMetadata) {
    for error in &metadata.errors {
        if !errors.iter().any(|e| e.code == error.code) {
            errors.push(ErrorDefinition::placeholder(error.code.clone()));
        }
    }
}

///
/// AddMissingErrors
///
/// Backfills error codes recorded in template metadata. Runs on the way out,
/// after `fallbackErrors` has made sure the list exists.
///

#[derive(Clone, Debug)]
pub struct AddMissingErrors {
    metadata: Arc<AllTemplateMetadata>,
}

impl AddMissingErrors {
    #[must_use]
    pub const fn new(metadata: Arc<AllTemplateMetadata>) -> Self {
        Self { metadata }
    }
}

#[async_trait]
impl Middleware for AddMissingErrors {
    fn name(&self) -> &'static str {
        "addMissingErrors"
    }

    async fn handle(&self, schema: &mut RawApiSchema, next: Next<'_>) -> Result<(), MiddlewareError> {
        next.run(schema).await?;

        let metadata = schema
            .template_source
            .as_deref()
            .and_then(|template| self.metadata.get(template));

        if let Some(metadata) = metadata {
            add_missing_errors(schema.errors.get_or_insert_with(Vec::new), metadata);
        }

        Ok(())
    }
}
