use crate::schema_parser::{
    RawApiSchema, RawValidator,
    middleware::{Middleware, MiddlewareError, Next},
};
use async_trait::async_trait;
use quarry_core::schema::ValidatorDefinition;

///
/// TransformValidator
///
/// Expands shorthand validator names into definitions with empty args.
/// Definitions pass through untouched and order is preserved.
///

#[derive(Clone, Copy, Debug, Default)]
pub struct TransformValidator;

#[async_trait]
impl Middleware for TransformValidator {
    fn name(&self) -> &'static str {
        "transformValidator"
    }

    async fn handle(&self, schema: &mut RawApiSchema, next: Next<'_>) -> Result<(), MiddlewareError> {
        for parameter in schema.parameters_mut() {
            for validator in &mut parameter.validators {
                if let RawValidator::Name(name) = validator {
                    *validator = RawValidator::Definition(ValidatorDefinition::new(name.as_str()));
                }
            }
        }

        next.run(schema).await
    }
}
