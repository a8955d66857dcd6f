//! Validator contract and the loader that resolves validator names.

pub mod builtin;

use serde_json::{Map, Value};
use std::{collections::HashMap, fmt, sync::Arc};
use thiserror::Error as ThisError;

/// Arguments attached to one validator reference in a schema.
pub type ValidatorArgs = Map<String, Value>;

///
/// ValidatorLoaderError
///

#[derive(Debug, ThisError)]
pub enum ValidatorLoaderError {
    #[error("validator '{0}' not found")]
    NotFound(String),

    #[error("validator '{0}' already registered")]
    AlreadyRegistered(String),
}

///
/// Validator
///
/// One named input validator. `validate_args` runs at schema compile time
/// against the arguments the schema declares; `validate` runs per request.
///

pub trait Validator: Send + Sync {
    fn name(&self) -> &'static str;

    fn validate_args(&self, args: &ValidatorArgs) -> Result<(), String>;

    fn validate(&self, value: &Value, args: &ValidatorArgs) -> Result<(), String>;
}

///
/// ValidatorLoader
///

pub trait ValidatorLoader: Send + Sync {
    /// Resolve a validator by name.
    fn load(&self, name: &str) -> Result<Arc<dyn Validator>, ValidatorLoaderError>;
}

///
/// ValidatorRegistry
///
/// In-memory name → validator map. `ValidatorRegistry::builtin()` is the
/// loader used when the caller supplies nothing else.
///

#[derive(Clone, Default)]
pub struct ValidatorRegistry {
    validators: HashMap<&'static str, Arc<dyn Validator>>,
}

impl ValidatorRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry seeded with every builtin validator.
    #[must_use]
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        for validator in builtin::all() {
            // builtin names are distinct
            let _ = registry.register(validator);
        }

        registry
    }

    /// Register a validator under its own name.
    pub fn register(&mut self, validator: Arc<dyn Validator>) -> Result<(), ValidatorLoaderError> {
        let name = validator.name();
        if self.validators.contains_key(name) {
            return Err(ValidatorLoaderError::AlreadyRegistered(name.to_string()));
        }
        self.validators.insert(name, validator);

        Ok(())
    }

    /// Iterate registered validator names.
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.validators.keys().copied()
    }
}

impl ValidatorLoader for ValidatorRegistry {
    fn load(&self, name: &str) -> Result<Arc<dyn Validator>, ValidatorLoaderError> {
        self.validators
            .get(name)
            .cloned()
            .ok_or_else(|| ValidatorLoaderError::NotFound(name.to_string()))
    }
}

impl fmt::Debug for ValidatorRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<_> = self.names().collect();
        names.sort_unstable();

        f.debug_struct("ValidatorRegistry")
            .field("validators", &names)
            .finish()
    }
}
