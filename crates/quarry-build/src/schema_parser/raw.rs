use crate::schema_parser::MiddlewareError;
use quarry_core::schema::{
    ApiSchema, ErrorDefinition, FieldIn, FieldType, RequestParameter, ValidatorDefinition,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

///
/// RawApiSchema
///
/// Decoded but unvalidated schema document. Every field is optional; stages
/// fill them in place and [`RawApiSchema::into_schema`] checks that nothing
/// required is still missing.
///

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RawApiSchema {
    /// Set from the document, never from its content.
    #[serde(skip)]
    pub source_name: String,

    pub url_path: Option<String>,
    pub template_source: Option<String>,
    pub description: Option<String>,
    pub request: Option<Vec<RawRequestParameter>>,
    pub errors: Option<Vec<ErrorDefinition>>,
    pub profiles: Option<Vec<String>>,
}

///
/// RawRequestParameter
///

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RawRequestParameter {
    pub field_name: Option<String>,
    pub field_in: Option<FieldIn>,
    pub description: Option<String>,

    #[serde(rename = "type")]
    pub field_type: Option<FieldType>,

    #[serde(default)]
    pub validators: Vec<RawValidator>,
}

///
/// RawValidator
/// Either the shorthand (a bare name) or a full definition.
///

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(untagged)]
pub enum RawValidator {
    Name(String),
    Definition(ValidatorDefinition),
}

impl RawValidator {
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Name(name) => name,
            Self::Definition(definition) => &definition.name,
        }
    }
}

impl RawApiSchema {
    pub fn new(source_name: impl Into<String>) -> Self {
        Self {
            source_name: source_name.into(),
            ..Self::default()
        }
    }

    /// Request parameters, empty when none are declared.
    pub fn parameters_mut(&mut self) -> impl Iterator<Item = &mut RawRequestParameter> {
        self.request.iter_mut().flatten()
    }

    /// Declared parameter names.
    #[must_use]
    pub fn declared_parameters(&self) -> BTreeSet<&str> {
        self.request
            .iter()
            .flatten()
            .filter_map(|p| p.field_name.as_deref())
            .collect()
    }

    /// Convert into the compiled schema, failing on the first missing field.
    pub fn into_schema(self) -> Result<ApiSchema, MiddlewareError> {
        let url_path = self.url_path.ok_or(MiddlewareError::Incomplete { field: "urlPath" })?;
        let template_source = self
            .template_source
            .ok_or(MiddlewareError::Incomplete {
                field: "templateSource",
            })?;
        let errors = self.errors.ok_or(MiddlewareError::Incomplete { field: "errors" })?;

        let mut seen = BTreeSet::new();
        for error in &errors {
            if !seen.insert(error.code.as_str()) {
                return Err(MiddlewareError::DuplicateErrorCode(error.code.clone()));
            }
        }

        let request = self
            .request
            .unwrap_or_default()
            .into_iter()
            .map(RawRequestParameter::into_parameter)
            .collect::<Result<_, _>>()?;

        Ok(ApiSchema {
            source_name: self.source_name,
            url_path,
            template_source,
            description: self.description,
            request,
            errors,
            profiles: self.profiles.unwrap_or_default(),
        })
    }
}

impl RawRequestParameter {
    fn into_parameter(self) -> Result<RequestParameter, MiddlewareError> {
        let field_name = self
            .field_name
            .ok_or(MiddlewareError::Incomplete { field: "fieldName" })?;

        let validators = self
            .validators
            .into_iter()
            .map(|validator| match validator {
                RawValidator::Definition(definition) => Ok(definition),
                RawValidator::Name(_) => Err(MiddlewareError::Incomplete {
                    field: "validators",
                }),
            })
            .collect::<Result<_, _>>()?;

        Ok(RequestParameter {
            field_name,
            field_in: self.field_in.unwrap_or_default(),
            description: self.description,
            field_type: self.field_type.unwrap_or_default(),
            validators,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complete(source_name: &str) -> RawApiSchema {
        RawApiSchema {
            url_path: Some(format!("/{source_name}")),
            template_source: Some(source_name.to_string()),
            errors: Some(Vec::new()),
            ..RawApiSchema::new(source_name)
        }
    }

    #[test]
    fn validators_accept_both_shapes() {
        let parameter: RawRequestParameter = serde_yaml::from_str(
            "fieldName: id\nvalidators:\n  - required\n  - name: integer\n    args:\n      min: 1\n",
        )
        .expect("parameter should decode");

        assert_eq!(parameter.validators[0], RawValidator::Name("required".to_string()));
        assert_eq!(
            parameter.validators[1],
            RawValidator::Definition(ValidatorDefinition::new("integer").with_arg("min", 1))
        );
    }

    #[test]
    fn missing_url_is_incomplete() {
        let raw = RawApiSchema {
            url_path: None,
            ..complete("a")
        };

        let err = raw.into_schema().expect_err("missing url must fail");
        assert!(matches!(err, MiddlewareError::Incomplete { field: "urlPath" }));
    }

    #[test]
    fn unexpanded_validator_is_incomplete() {
        let raw = RawApiSchema {
            request: Some(vec![RawRequestParameter {
                field_name: Some("id".to_string()),
                validators: vec![RawValidator::Name("required".to_string())],
                ..RawRequestParameter::default()
            }]),
            ..complete("a")
        };

        let err = raw.into_schema().expect_err("shorthand must be expanded first");
        assert!(matches!(err, MiddlewareError::Incomplete { field: "validators" }));
    }

    #[test]
    fn duplicate_error_codes_are_rejected() {
        let raw = RawApiSchema {
            errors: Some(vec![
                ErrorDefinition::new("E1", "a"),
                ErrorDefinition::new("E1", "b"),
            ]),
            ..complete("a")
        };

        let err = raw.into_schema().expect_err("duplicate code must fail");
        assert!(matches!(err, MiddlewareError::DuplicateErrorCode(ref code) if code == "E1"));
    }

    #[test]
    fn complete_draft_converts_with_defaults() {
        let raw = RawApiSchema {
            request: Some(vec![RawRequestParameter {
                field_name: Some("q".to_string()),
                ..RawRequestParameter::default()
            }]),
            ..complete("user/list")
        };

        let schema = raw.into_schema().expect("draft should convert");
        assert_eq!(schema.source_name, "user/list");
        assert_eq!(schema.request[0].field_in, FieldIn::Query);
        assert_eq!(schema.request[0].field_type, FieldType::String);
        assert!(schema.profiles.is_empty());
    }
}
