use crate::schema_parser::{
    RawApiSchema,
    middleware::{Middleware, MiddlewareError, Next},
};
use async_trait::async_trait;

///
/// GenerateTemplateSource
/// Stamps `templateSource`, the key used to look up template metadata.
///

#[derive(Clone, Copy, Debug, Default)]
pub struct GenerateTemplateSource;

#[async_trait]
impl Middleware for GenerateTemplateSource {
    fn name(&self) -> &'static str {
        "generateTemplateSource"
    }

    async fn handle(&self, schema: &mut RawApiSchema, next: Next<'_>) -> Result<(), MiddlewareError> {
        if schema.template_source.is_none() {
            schema.template_source = Some(schema.source_name.replace('\\', "/"));
        }

        next.run(schema).await
    }
}
