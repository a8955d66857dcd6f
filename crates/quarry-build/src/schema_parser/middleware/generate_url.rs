use crate::schema_parser::{
    RawApiSchema,
    middleware::{Middleware, MiddlewareError, Next},
};
use async_trait::async_trait;

///
/// GenerateUrl
///
/// Derives `urlPath` from the source name when it is unset. An explicit value
/// is kept but normalized to exactly one leading `/`.
///

#[derive(Clone, Copy, Debug, Default)]
pub struct GenerateUrl;

#[async_trait]
impl Middleware for GenerateUrl {
    fn name(&self) -> &'static str {
        "generateUrl"
    }

    async fn handle(&self, schema: &mut RawApiSchema, next: Next<'_>) -> Result<(), MiddlewareError> {
        let url = schema
            .url_path
            .as_deref()
            .unwrap_or(&schema.source_name);
        schema.url_path = Some(normalize(url));

        next.run(schema).await
    }
}

fn normalize(path: &str) -> String {
    let path = path.replace('\\', "/");

    format!("/{}", path.trim_start_matches('/'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema_parser::middleware::Pipeline;
    use std::sync::Arc;

    async fn run(schema: &mut RawApiSchema) {
        Pipeline::compose(vec![Arc::new(GenerateUrl)])
            .execute(schema)
            .await
            .expect("stage should succeed");
    }

    #[tokio::test]
    async fn url_defaults_to_source_name() {
        let mut schema = RawApiSchema::new("user/list");
        run(&mut schema).await;

        assert_eq!(schema.url_path.as_deref(), Some("/user/list"));
    }

    #[tokio::test]
    async fn explicit_url_gets_one_leading_slash() {
        let mut schema = RawApiSchema {
            url_path: Some("//users/:id".to_string()),
            ..RawApiSchema::new("user/detail")
        };
        run(&mut schema).await;

        assert_eq!(schema.url_path.as_deref(), Some("/users/:id"));
    }

    #[test]
    fn backslashes_become_slashes() {
        assert_eq!(normalize("user\\list"), "/user/list");
    }
}
