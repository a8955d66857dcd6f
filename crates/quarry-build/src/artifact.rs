use crate::schema_parser::SchemaParseResult;
use quarry_core::schema::ApiSchema;
use serde::{Deserialize, Serialize};
use std::{
    io,
    path::{Path, PathBuf},
};
use thiserror::Error as ThisError;
use tokio::fs;

///
/// ArtifactError
///

#[derive(Debug, ThisError)]
pub enum ArtifactError {
    #[error("artifact '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("artifact '{path}' is not valid: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

///
/// Artifact
/// Persisted compilation output.
///

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct Artifact {
    pub schemas: Vec<ApiSchema>,
}

impl From<SchemaParseResult> for Artifact {
    fn from(result: SchemaParseResult) -> Self {
        Self {
            schemas: result.schemas,
        }
    }
}

impl Artifact {
    /// Write as pretty JSON, creating parent folders as needed.
    pub async fn write(&self, path: &Path) -> Result<(), ArtifactError> {
        let io = |source| ArtifactError::Io {
            path: path.to_path_buf(),
            source,
        };

        let bytes = serde_json::to_vec_pretty(self).map_err(|source| ArtifactError::Json {
            path: path.to_path_buf(),
            source,
        })?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await.map_err(io)?;
        }
        fs::write(path, bytes).await.map_err(io)?;

        tracing::info!(path = %path.display(), schemas = self.schemas.len(), "artifact written");

        Ok(())
    }

    pub async fn read(path: &Path) -> Result<Self, ArtifactError> {
        let bytes = fs::read(path).await.map_err(|source| ArtifactError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        serde_json::from_slice(&bytes).map_err(|source| ArtifactError::Json {
            path: path.to_path_buf(),
            source,
        })
    }
}
