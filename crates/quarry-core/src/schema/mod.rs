//! Compiled API schema model.

mod metadata;

pub use metadata::{AllTemplateMetadata, TemplateMetadata};

use derive_more::Display;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

///
/// ApiSchema
///
/// Fully compiled API definition. Every validator is expanded and resolved,
/// and every error code the template raises is present in `errors`.
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiSchema {
    pub source_name: String,
    pub url_path: String,
    pub template_source: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default)]
    pub request: Vec<RequestParameter>,

    #[serde(default)]
    pub errors: Vec<ErrorDefinition>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub profiles: Vec<String>,
}

impl ApiSchema {
    /// Look up a declared request parameter by name.
    #[must_use]
    pub fn parameter(&self, field_name: &str) -> Option<&RequestParameter> {
        self.request.iter().find(|p| p.field_name == field_name)
    }

    /// Look up an error definition by code.
    #[must_use]
    pub fn error(&self, code: &str) -> Option<&ErrorDefinition> {
        self.errors.iter().find(|e| e.code == code)
    }
}

///
/// RequestParameter
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestParameter {
    pub field_name: String,

    #[serde(default)]
    pub field_in: FieldIn,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, rename = "type")]
    pub field_type: FieldType,

    /// Ordered; validators run in declaration order.
    #[serde(default)]
    pub validators: Vec<ValidatorDefinition>,
}

///
/// FieldIn
/// Where a request parameter is read from.
///

#[derive(Clone, Copy, Debug, Default, Deserialize, Display, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldIn {
    #[default]
    #[display("query")]
    Query,
    #[display("header")]
    Header,
    #[display("path")]
    Path,
    #[display("cookie")]
    Cookie,
}

///
/// FieldType
///

#[derive(Clone, Copy, Debug, Default, Deserialize, Display, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    #[default]
    #[display("string")]
    String,
    #[display("number")]
    Number,
    #[display("integer")]
    Integer,
    #[display("boolean")]
    Boolean,
}

///
/// ValidatorDefinition
/// Canonical validator reference: a validator name plus its arguments.
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct ValidatorDefinition {
    pub name: String,

    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub args: Map<String, Value>,
}

impl ValidatorDefinition {
    /// Build a definition without arguments.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            args: Map::new(),
        }
    }

    /// Attach one argument.
    #[must_use]
    pub fn with_arg(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.args.insert(key.into(), value.into());
        self
    }
}

///
/// ErrorDefinition
///
/// One declared API error. `code` is unique within a schema; an empty
/// `message` is a placeholder for codes backfilled from template metadata.
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct ErrorDefinition {
    pub code: String,

    #[serde(default)]
    pub message: String,
}

impl ErrorDefinition {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }

    /// Error with a code and an empty message.
    pub fn placeholder(code: impl Into<String>) -> Self {
        Self::new(code, String::new())
    }
}
