//! OAuth access tokens for Google Secret Manager.
//!
//! Credentials are not managed here. A token is taken from the
//! `GOOGLE_OAUTH_ACCESS_TOKEN` environment variable when present, otherwise
//! requested once from the GCE metadata server and reused for the rest of
//! the process.

use anyhow::{Context, Result, anyhow, bail};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::sync::Mutex;

pub const TOKEN_ENV_VAR: &str = "GOOGLE_OAUTH_ACCESS_TOKEN";

const METADATA_TOKEN_URL: &str =
    "http://metadata.google.internal/computeMetadata/v1/instance/service-accounts/default/token";

/// Source of bearer tokens for the Secret Manager API
pub trait AccessTokenSource: Send + Sync {
    fn token(&self) -> Result<SecretString>;
}

#[derive(Deserialize)]
struct MetadataTokenResponse {
    access_token: String,
}

/// Environment variable first, metadata server second.
pub struct DefaultTokenSource {
    http: reqwest::blocking::Client,
    metadata_url: String,
    cached: Mutex<Option<SecretString>>,
}

impl DefaultTokenSource {
    pub fn new(http: reqwest::blocking::Client) -> Self {
        let from_env = env_token(std::env::var(TOKEN_ENV_VAR).ok());
        if from_env.is_some() {
            tracing::debug!("using access token from {}", TOKEN_ENV_VAR);
        }

        Self::with_metadata_url(http, METADATA_TOKEN_URL, from_env)
    }

    fn with_metadata_url(
        http: reqwest::blocking::Client,
        metadata_url: &str,
        initial: Option<SecretString>,
    ) -> Self {
        Self {
            http,
            metadata_url: metadata_url.to_string(),
            cached: Mutex::new(initial),
        }
    }

    fn fetch_from_metadata(&self) -> Result<SecretString> {
        tracing::debug!("requesting access token from metadata server");

        let response = self
            .http
            .get(&self.metadata_url)
            .header("Metadata-Flavor", "Google")
            .send()
            .with_context(|| {
                format!(
                    "no {} set and metadata server is unreachable",
                    TOKEN_ENV_VAR
                )
            })?;

        if !response.status().is_success() {
            bail!(
                "metadata server refused token request with status {}",
                response.status()
            );
        }

        let body = response
            .text()
            .context("Failed to read metadata server token response")?;
        parse_token_response(body)
    }
}

impl AccessTokenSource for DefaultTokenSource {
    fn token(&self) -> Result<SecretString> {
        let mut cached = self
            .cached
            .lock()
            .map_err(|_| anyhow!("access token cache is poisoned"))?;

        if let Some(token) = cached.as_ref() {
            return Ok(SecretString::from(token.expose_secret().to_string()));
        }

        let token = self.fetch_from_metadata()?;
        let copy = SecretString::from(token.expose_secret().to_string());
        *cached = Some(token);
        Ok(copy)
    }
}

/// Blank values count as unset.
fn env_token(value: Option<String>) -> Option<SecretString> {
    value
        .filter(|token| !token.trim().is_empty())
        .map(SecretString::from)
}

/// Parse the metadata server token JSON, consuming (and zeroing) the raw body.
fn parse_token_response(mut body: String) -> Result<SecretString> {
    let parsed: Result<MetadataTokenResponse, _> = serde_json::from_str(&body);
    zeroize::Zeroize::zeroize(&mut body);

    let response = parsed.context("metadata server returned a malformed token response")?;
    if response.access_token.is_empty() {
        bail!("metadata server returned an empty access token");
    }
    Ok(SecretString::from(response.access_token))
}

/// Fixed token for tests
#[cfg(test)]
pub struct StaticTokenSource {
    token: SecretString,
}

#[cfg(test)]
impl StaticTokenSource {
    pub fn new(token: &str) -> Self {
        Self {
            token: SecretString::from(token.to_string()),
        }
    }
}

#[cfg(test)]
impl AccessTokenSource for StaticTokenSource {
    fn token(&self) -> Result<SecretString> {
        Ok(SecretString::from(self.token.expose_secret().to_string()))
    }
}
