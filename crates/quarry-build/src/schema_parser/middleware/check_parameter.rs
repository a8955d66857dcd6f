use crate::{
    options::ParameterCheckPolicy,
    schema_parser::{
        RawApiSchema,
        middleware::{Middleware, MiddlewareError, Next},
    },
};
use async_trait::async_trait;
use quarry_core::schema::AllTemplateMetadata;
use std::sync::Arc;

///
/// CheckParameter
///
/// Every parameter the template reads must be declared in `request`.
/// Undeclared ones fail the document or produce one warning each, depending
/// on the policy. Templates without metadata are skipped.
///

#[derive(Clone, Debug)]
pub struct CheckParameter {
    metadata: Arc<AllTemplateMetadata>,
    policy: ParameterCheckPolicy,
}

impl CheckParameter {
    #[must_use]
    pub const fn new(metadata: Arc<AllTemplateMetadata>, policy: ParameterCheckPolicy) -> Self {
        Self { metadata, policy }
    }

    fn check(&self, schema: &RawApiSchema) -> Result<(), MiddlewareError> {
        let Some(template) = schema.template_source.as_deref() else {
            return Ok(());
        };
        let Some(metadata) = self.metadata.get(template) else {
            return Ok(());
        };

        let declared = schema.declared_parameters();
        let undeclared: Vec<String> = metadata
            .used_parameters
            .iter()
            .filter(|name| !declared.contains(name.as_str()))
            .cloned()
            .collect();

        if undeclared.is_empty() {
            return Ok(());
        }

        match self.policy {
            ParameterCheckPolicy::Fail => Err(MiddlewareError::UndeclaredParameter {
                template: template.to_string(),
                names: undeclared,
            }),
            ParameterCheckPolicy::Warn => {
                for parameter in &undeclared {
                    tracing::warn!(
                        template,
                        parameter = parameter.as_str(),
                        "template uses a parameter the schema does not declare"
                    );
                }

                Ok(())
            }
        }
    }
}

#[async_trait]
impl Middleware for CheckParameter {
    fn name(&self) -> &'static str {
        "checkParameter"
    }

    async fn handle(&self, schema: &mut RawApiSchema, next: Next<'_>) -> Result<(), MiddlewareError> {
        self.check(schema)?;

        next.run(schema).await
    }
}
