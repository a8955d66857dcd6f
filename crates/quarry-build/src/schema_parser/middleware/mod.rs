//! Onion-model transform stages.
//!
//! A stage receives the draft and a [`Next`] handle for the rest of the
//! chain. Work done before `next.run(..)` happens on the way in (outer
//! stages first); work after it happens on the way out (outer stages last).
//! A stage that never runs `next` short-circuits everything downstream
//! without failing.

mod add_missing_errors;
mod check_parameter;
mod check_validator;
mod fallback_errors;
mod generate_template_source;
mod generate_url;
mod transform_validator;

pub use add_missing_errors::{AddMissingErrors, add_missing_errors};
pub use check_parameter::CheckParameter;
pub use check_validator::CheckValidator;
pub use fallback_errors::FallbackErrors;
pub use generate_template_source::GenerateTemplateSource;
pub use generate_url::GenerateUrl;
pub use transform_validator::TransformValidator;

use crate::schema_parser::RawApiSchema;
use async_trait::async_trait;
use quarry_core::validator::ValidatorLoaderError;
use std::{fmt, sync::Arc};
use thiserror::Error as ThisError;

///
/// MiddlewareError
///

#[derive(Debug, ThisError)]
#[remain::sorted]
pub enum MiddlewareError {
    #[error("duplicate error code '{0}'")]
    DuplicateErrorCode(String),

    /// A required field is still unset once the chain has finished.
    #[error("schema is incomplete: '{field}' was never set")]
    Incomplete { field: &'static str },

    #[error("parameter '{parameter}': invalid arguments for validator '{name}': {message}")]
    InvalidValidatorArgs {
        parameter: String,
        name: String,
        message: String,
    },

    #[error("template '{template}' uses undeclared parameters: {}", names.join(", "))]
    UndeclaredParameter { template: String, names: Vec<String> },

    #[error("parameter '{parameter}': {source}")]
    ValidatorNotFound {
        parameter: String,
        #[source]
        source: ValidatorLoaderError,
    },
}

///
/// Middleware
///

#[async_trait]
pub trait Middleware: Send + Sync {
    fn name(&self) -> &'static str;

    /// Transform the draft, running `next` at most once.
    async fn handle(&self, schema: &mut RawApiSchema, next: Next<'_>) -> Result<(), MiddlewareError>;
}

///
/// Next
///
/// The remainder of the chain. Consumed by `run`, so a stage cannot invoke
/// it twice.
///

pub struct Next<'a> {
    stages: &'a [Arc<dyn Middleware>],
}

impl Next<'_> {
    pub async fn run(self, schema: &mut RawApiSchema) -> Result<(), MiddlewareError> {
        match self.stages.split_first() {
            Some((stage, rest)) => stage.handle(schema, Next { stages: rest }).await,
            None => Ok(()),
        }
    }
}

///
/// Pipeline
/// A fixed stage list composed into one entry point.
///

#[derive(Clone, Default)]
pub struct Pipeline {
    stages: Vec<Arc<dyn Middleware>>,
}

impl Pipeline {
    #[must_use]
    pub fn compose(stages: Vec<Arc<dyn Middleware>>) -> Self {
        Self { stages }
    }

    /// Run every stage against one draft.
    pub async fn execute(&self, schema: &mut RawApiSchema) -> Result<(), MiddlewareError> {
        Next {
            stages: &self.stages,
        }
        .run(schema)
        .await
    }

    /// Stage names in execution order.
    #[must_use]
    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|stage| stage.name()).collect()
    }
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("stages", &self.stage_names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct Trace {
        name: &'static str,
        log: Arc<Mutex<Vec<String>>>,
        forward: bool,
    }

    #[async_trait]
    impl Middleware for Trace {
        fn name(&self) -> &'static str {
            self.name
        }

        async fn handle(
            &self,
            schema: &mut RawApiSchema,
            next: Next<'_>,
        ) -> Result<(), MiddlewareError> {
            self.log.lock().expect("log lock").push(format!("in:{}", self.name));
            if self.forward {
                next.run(schema).await?;
            }
            self.log.lock().expect("log lock").push(format!("out:{}", self.name));

            Ok(())
        }
    }

    fn trace(name: &'static str, log: &Arc<Mutex<Vec<String>>>, forward: bool) -> Arc<dyn Middleware> {
        Arc::new(Trace {
            name,
            log: log.clone(),
            forward,
        })
    }

    #[tokio::test]
    async fn stages_wrap_the_rest_of_the_chain() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let pipeline = Pipeline::compose(vec![
            trace("a", &log, true),
            trace("b", &log, true),
            trace("c", &log, true),
        ]);

        pipeline
            .execute(&mut RawApiSchema::new("x"))
            .await
            .expect("pipeline should run");

        assert_eq!(
            *log.lock().expect("log lock"),
            vec!["in:a", "in:b", "in:c", "out:c", "out:b", "out:a"]
        );
    }

    #[tokio::test]
    async fn skipping_next_short_circuits_without_error() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let pipeline = Pipeline::compose(vec![
            trace("a", &log, true),
            trace("b", &log, false),
            trace("c", &log, true),
        ]);

        pipeline
            .execute(&mut RawApiSchema::new("x"))
            .await
            .expect("short circuit is not an error");

        assert_eq!(
            *log.lock().expect("log lock"),
            vec!["in:a", "in:b", "out:b", "out:a"]
        );
    }

    #[tokio::test]
    async fn empty_pipeline_is_a_no_op() {
        let mut schema = RawApiSchema::new("x");
        Pipeline::default()
            .execute(&mut schema)
            .await
            .expect("empty pipeline");

        assert_eq!(schema, RawApiSchema::new("x"));
    }
}
