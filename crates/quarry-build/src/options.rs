use crate::schema_reader::SchemaReaderKind;
use derive_more::Display;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

///
/// ParameterCheckPolicy
/// What `checkParameter` does with template parameters the schema does
/// not declare.
///

#[derive(Clone, Copy, Debug, Default, Deserialize, Display, Eq, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ParameterCheckPolicy {
    /// Fail the document.
    #[default]
    #[display("fail")]
    Fail,

    /// Emit one warning per undeclared parameter and continue.
    #[display("warn")]
    Warn,
}

///
/// SchemaParserOptions
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct SchemaParserOptions {
    pub reader: SchemaReaderKind,
    pub schema_path: PathBuf,
    pub parameter_check: ParameterCheckPolicy,
}

impl Default for SchemaParserOptions {
    fn default() -> Self {
        Self {
            reader: SchemaReaderKind::LocalFile,
            schema_path: PathBuf::from("."),
            parameter_check: ParameterCheckPolicy::Fail,
        }
    }
}

///
/// ArtifactOptions
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct ArtifactOptions {
    pub path: PathBuf,
}

impl Default for ArtifactOptions {
    fn default() -> Self {
        Self {
            path: PathBuf::from("result.json"),
        }
    }
}
