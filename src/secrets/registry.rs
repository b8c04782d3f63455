//! Resolver registry.
//!
//! Provides a central registry for building secret resolvers by strategy name.

use super::gcp::{
    DEFAULT_ENDPOINT, DEFAULT_TIMEOUT_SECS, ExternalStoreResolver, GoogleSecretManagerClient,
};
use super::identity::IdentityResolver;
use super::provider::SecretResolver;
use anyhow::{Result, bail};
use std::collections::BTreeMap;
use std::time::Duration;

pub const IDENTITY: &str = "identity";
pub const GCP_SECRET_MANAGER: &str = "gcp-secret-manager";

/// Settings shared by all resolver constructors
#[derive(Debug, Clone)]
pub struct ResolverSettings {
    /// Base URL of the Secret Manager API
    pub endpoint: String,
    /// Bound on each individual store call
    pub timeout: Duration,
    /// Project used to scope bare secret names
    pub project: String,
}

impl Default for ResolverSettings {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            project: String::new(),
        }
    }
}

type ResolverFactory = fn(&ResolverSettings) -> Result<Box<dyn SecretResolver>>;

/// Registry of available resolution strategies.
///
/// The strategy is picked once, at construction time; nothing downstream
/// inspects which one it got.
pub struct SecretResolverRegistry {
    factories: BTreeMap<&'static str, ResolverFactory>,
}

impl SecretResolverRegistry {
    /// Create a new registry with all built-in strategies.
    pub fn new() -> Self {
        let mut factories: BTreeMap<&'static str, ResolverFactory> = BTreeMap::new();
        factories.insert(IDENTITY, build_identity);
        factories.insert(GCP_SECRET_MANAGER, build_gcp_secret_manager);
        Self { factories }
    }

    /// Build the resolver registered under `resolver_type`.
    pub fn build(
        &self,
        resolver_type: &str,
        settings: &ResolverSettings,
    ) -> Result<Box<dyn SecretResolver>> {
        let Some(factory) = self.factories.get(resolver_type) else {
            bail!(
                "Unknown resolver '{}'. Supported resolvers: {}",
                resolver_type,
                self.supported_types().join(", ")
            );
        };

        factory(settings)
    }

    /// Get list of supported strategy names, sorted.
    pub fn supported_types(&self) -> Vec<&str> {
        self.factories.keys().copied().collect()
    }
}

impl Default for SecretResolverRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn build_identity(_settings: &ResolverSettings) -> Result<Box<dyn SecretResolver>> {
    Ok(Box::new(IdentityResolver::new()))
}

fn build_gcp_secret_manager(settings: &ResolverSettings) -> Result<Box<dyn SecretResolver>> {
    let client = GoogleSecretManagerClient::new(&settings.endpoint, settings.timeout)?;
    Ok(Box::new(ExternalStoreResolver::new(client, &settings.project)))
}
