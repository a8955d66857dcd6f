use crate::schema_parser::{
    RawApiSchema, RawValidator,
    middleware::{Middleware, MiddlewareError, Next},
};
use async_trait::async_trait;
use quarry_core::validator::{ValidatorArgs, ValidatorLoader};
use std::{fmt, sync::Arc};

///
/// CheckValidator
///
/// Resolves every validator through the loader and checks its arguments.
/// Runs after the rest of the chain, so validators added by later stages
/// are checked too.
///

#[derive(Clone)]
pub struct CheckValidator {
    loader: Arc<dyn ValidatorLoader>,
}

impl CheckValidator {
    #[must_use]
    pub fn new(loader: Arc<dyn ValidatorLoader>) -> Self {
        Self { loader }
    }

    fn check(&self, schema: &RawApiSchema) -> Result<(), MiddlewareError> {
        let no_args = ValidatorArgs::new();

        for parameter in schema.request.iter().flatten() {
            let parameter_name = parameter.field_name.as_deref().unwrap_or_default();

            for raw in &parameter.validators {
                let (name, args) = match raw {
                    RawValidator::Name(name) => (name.as_str(), &no_args),
                    RawValidator::Definition(definition) => {
                        (definition.name.as_str(), &definition.args)
                    }
                };

                let validator =
                    self.loader
                        .load(name)
                        .map_err(|source| MiddlewareError::ValidatorNotFound {
                            parameter: parameter_name.to_string(),
                            source,
                        })?;

                validator
                    .validate_args(args)
                    .map_err(|message| MiddlewareError::InvalidValidatorArgs {
                        parameter: parameter_name.to_string(),
                        name: name.to_string(),
                        message,
                    })?;
            }
        }

        Ok(())
    }
}

#[async_trait]
impl Middleware for CheckValidator {
    fn name(&self) -> &'static str {
        "checkValidator"
    }

    async fn handle(&self, schema: &mut RawApiSchema, next: Next<'_>) -> Result<(), MiddlewareError> {
        next.run(schema).await?;

        self.check(schema)
    }
}

impl fmt::Debug for CheckValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CheckValidator").finish_non_exhaustive()
    }
}
