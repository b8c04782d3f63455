//! SecretResolver trait and the resolved data handed to the renderer.

use crate::config::{ResolutionSpec, SecretSource};
use crate::error::FunctionError;
use secrecy::SecretString;

/// A secret value paired with the key it is published under.
///
/// The value is wrapped so it never shows up in `Debug` output and is
/// zeroed when dropped.
#[derive(Debug)]
pub struct ResolvedSecret {
    pub key: String,
    pub value: SecretString,
}

impl ResolvedSecret {
    pub fn new(key: &str, value: String) -> Self {
        Self {
            key: key.to_string(),
            value: SecretString::from(value),
        }
    }
}

/// Everything the renderer needs to build one Secret manifest.
#[derive(Debug)]
pub struct ResolvedManifestData {
    pub name: String,
    pub secrets: Vec<ResolvedSecret>,
}

/// Trait for secret resolution strategies.
///
/// Implementations turn one declarative source into a concrete value. A
/// failure is terminal for the whole request.
pub trait SecretResolver: Send + Sync {
    /// Get the strategy name (e.g., "identity", "gcp-secret-manager")
    fn get_type(&self) -> &str;

    /// Resolve a single source.
    fn resolve(&self, source: &SecretSource) -> Result<ResolvedSecret, FunctionError>;
}

/// Resolve every source of a spec in declaration order.
///
/// Stops at the first failure; no partial data is ever returned.
#[tracing::instrument(skip_all, fields(name = %spec.name, sources = spec.sources.len(), resolver = resolver.get_type()))]
pub fn resolve_spec(
    spec: &ResolutionSpec,
    resolver: &dyn SecretResolver,
) -> Result<ResolvedManifestData, FunctionError> {
    let mut secrets = Vec::with_capacity(spec.sources.len());

    for source in &spec.sources {
        tracing::debug!(key = %source.key, "resolving secret");
        let secret = resolver.resolve(source)?;
        secrets.push(secret);
    }

    tracing::info!(count = secrets.len(), "resolved all secrets");

    Ok(ResolvedManifestData {
        name: spec.name.clone(),
        secrets,
    })
}
