//! Identity resolver: the locator is the value.

use super::provider::{ResolvedSecret, SecretResolver};
use crate::config::SecretSource;
use crate::error::FunctionError;

/// Resolver that publishes each source string as-is.
///
/// Used for local and development configs where no secret store is
/// reachable. It never fails.
pub struct IdentityResolver;

impl IdentityResolver {
    /// Create a new identity resolver.
    pub fn new() -> Self {
        Self
    }
}

impl Default for IdentityResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl SecretResolver for IdentityResolver {
    fn get_type(&self) -> &str {
        "identity"
    }

    fn resolve(&self, source: &SecretSource) -> Result<ResolvedSecret, FunctionError> {
        Ok(ResolvedSecret::new(&source.key, source.source.clone()))
    }
}
