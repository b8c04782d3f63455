//! Declarative shape of a secret generation request.

use crate::error::FunctionError;
use serde::{Deserialize, Serialize};
use serde_yaml::Value;

/// A single secret reference: the key it lands under and where its value comes from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecretSource {
    #[serde(default)]
    pub key: String,

    /// Opaque locator. A literal value under the identity resolver, a
    /// Secret Manager version name under the external store resolver.
    #[serde(default)]
    pub source: String,
}

#[cfg(test)]
impl SecretSource {
    pub fn new(key: &str, source: &str) -> Self {
        Self {
            key: key.to_string(),
            source: source.to_string(),
        }
    }
}

/// The `spec` object of the function config.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolutionSpec {
    /// Name of the generated Secret
    #[serde(default)]
    pub name: String,

    /// Optional project used to scope bare secret names
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub project: String,

    #[serde(default, alias = "secrets")]
    pub sources: Vec<SecretSource>,

    /// Whether the generated Secret carries the kustomize needs-hash annotation
    #[serde(default = "default_hash_annotation")]
    pub hash_annotation: bool,
}

fn default_hash_annotation() -> bool {
    true
}

impl Default for ResolutionSpec {
    fn default() -> Self {
        Self {
            name: String::new(),
            project: String::new(),
            sources: Vec::new(),
            hash_annotation: default_hash_annotation(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct FunctionConfig {
    spec: Option<ResolutionSpec>,
}

impl ResolutionSpec {
    /// Parse and validate the spec out of a ResourceList `functionConfig`.
    pub fn from_function_config(config: &Value) -> Result<Self, FunctionError> {
        if config.is_null() {
            return Err(FunctionError::config("functionConfig is required"));
        }

        let parsed: FunctionConfig = serde_yaml::from_value(config.clone())
            .map_err(|e| FunctionError::config(format!("malformed functionConfig: {}", e)))?;

        let spec = parsed
            .spec
            .ok_or_else(|| FunctionError::config("functionConfig has no 'spec' object"))?;

        spec.validate()?;
        Ok(spec)
    }

    /// Check the invariants every request must satisfy before resolution starts.
    pub fn validate(&self) -> Result<(), FunctionError> {
        if self.name.trim().is_empty() {
            return Err(FunctionError::config("spec.name must not be empty"));
        }

        for (index, source) in self.sources.iter().enumerate() {
            if source.key.is_empty() {
                return Err(FunctionError::config(format!(
                    "spec.sources[{}].key must not be empty",
                    index
                )));
            }
        }

        Ok(())
    }
}
