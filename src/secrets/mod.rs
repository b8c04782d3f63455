//! Secret resolution.
//!
//! Turns the declarative sources of a [`crate::config::ResolutionSpec`] into
//! concrete values, either verbatim (identity) or by fetching them from
//! Google Secret Manager.

pub mod gcp;
mod identity;
pub mod provider;
mod registry;
mod token;

pub use provider::{ResolvedManifestData, SecretResolver, resolve_spec};
pub use registry::{GCP_SECRET_MANAGER, ResolverSettings, SecretResolverRegistry};

#[cfg(test)]
pub use identity::IdentityResolver;
#[cfg(test)]
pub use provider::ResolvedSecret;
#[cfg(test)]
pub use registry::IDENTITY;
