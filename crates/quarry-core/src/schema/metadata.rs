use crate::schema::ErrorDefinition;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

///
/// TemplateMetadata
///
/// Facts recovered by analysing one SQL template: the request parameters it
/// reads and the error codes it can raise. Read-only input to schema
/// compilation.
///

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateMetadata {
    #[serde(default)]
    pub used_parameters: BTreeSet<String>,

    #[serde(default)]
    pub errors: Vec<ErrorDefinition>,
}

impl TemplateMetadata {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_parameter(mut self, name: impl Into<String>) -> Self {
        self.used_parameters.insert(name.into());
        self
    }

    #[must_use]
    pub fn with_error(mut self, code: impl Into<String>, message: impl Into<String>) -> Self {
        self.errors.push(ErrorDefinition::new(code, message));
        self
    }
}

/// Template metadata keyed by template identifier (`templateSource`).
pub type AllTemplateMetadata = BTreeMap<String, TemplateMetadata>;
