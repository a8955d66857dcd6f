use crate::schema_parser::{
    RawApiSchema,
    middleware::{Middleware, MiddlewareError, Next},
};
use async_trait::async_trait;

///
/// FallbackErrors
/// Guarantees `errors` exists before anything downstream reads it.
///

#[derive(Clone, Copy, Debug, Default)]
pub struct FallbackErrors;

#[async_trait]
impl Middleware for FallbackErrors {
    fn name(&self) -> &'static str {
        "fallbackErrors"
    }

    async fn handle(&self, schema: &mut RawApiSchema, next: Next<'_>) -> Result<(), MiddlewareError> {
        schema.errors.get_or_insert_with(Vec::new);

        next.run(schema).await
    }
}
