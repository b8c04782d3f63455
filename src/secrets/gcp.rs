//! Google Secret Manager backed resolver.
//!
//! Each source locator names a secret version
//! (`projects/<p>/secrets/<s>/versions/<v>`) and is fetched with a single
//! `:access` call bounded by the client timeout.

use super::provider::{ResolvedSecret, SecretResolver};
use super::token::{AccessTokenSource, DefaultTokenSource};
use crate::config::SecretSource;
use crate::error::FunctionError;
use anyhow::{Context, Result, anyhow, bail};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use secrecy::ExposeSecret;
use serde::Deserialize;
use std::time::Duration;
use url::Url;
use zeroize::Zeroize;

pub const DEFAULT_ENDPOINT: &str = "https://secretmanager.googleapis.com";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Remote secret store, keyed by an opaque locator.
pub trait SecretStore: Send + Sync {
    /// Fetch the raw payload of one secret version
    fn access(&self, locator: &str) -> Result<Vec<u8>>;
}

#[derive(Deserialize)]
struct AccessSecretVersionResponse {
    payload: Option<SecretPayload>,
}

#[derive(Deserialize)]
struct SecretPayload {
    #[serde(default)]
    data: Option<String>,
}

/// Secret Manager v1 REST client
pub struct GoogleSecretManagerClient {
    http: reqwest::blocking::Client,
    endpoint: Url,
    timeout: Duration,
    tokens: Box<dyn AccessTokenSource>,
}

impl GoogleSecretManagerClient {
    /// Create a client with the default token source.
    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self> {
        let http = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;
        let tokens = Box::new(DefaultTokenSource::new(http.clone()));
        Self::with_token_source(http, endpoint, timeout, tokens)
    }

    pub fn with_token_source(
        http: reqwest::blocking::Client,
        endpoint: &str,
        timeout: Duration,
        tokens: Box<dyn AccessTokenSource>,
    ) -> Result<Self> {
        let endpoint = Url::parse(endpoint)
            .with_context(|| format!("Invalid Secret Manager endpoint: {}", endpoint))?;

        Ok(Self {
            http,
            endpoint,
            timeout,
            tokens,
        })
    }

    fn access_url(&self, locator: &str) -> Result<Url> {
        let base = self.endpoint.as_str().trim_end_matches('/');
        Url::parse(&format!("{}/v1/{}:access", base, locator))
            .with_context(|| format!("Invalid secret locator: {}", locator))
    }
}

impl SecretStore for GoogleSecretManagerClient {
    fn access(&self, locator: &str) -> Result<Vec<u8>> {
        validate_locator(locator)?;

        let url = self.access_url(locator)?;
        let token = self.tokens.token()?;

        let response = self
            .http
            .get(url)
            .bearer_auth(token.expose_secret())
            .send()
            .map_err(|e| {
                if e.is_timeout() {
                    anyhow!("request timed out after {}s", self.timeout.as_secs())
                } else {
                    anyhow!("request failed: {}", e)
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            bail!("{}", describe_status(status.as_u16()));
        }

        let body = response
            .text()
            .map_err(|e| anyhow!("could not read response body: {}", e))?;
        decode_access_response(body)
    }
}

/// Reject locators that would escape the `/v1/<name>:access` path.
fn validate_locator(locator: &str) -> Result<()> {
    if locator.trim().is_empty() {
        bail!("secret locator is empty");
    }

    if locator.contains(['?', '#', ' ']) || locator.contains("..") {
        bail!("secret locator contains characters that are not allowed in a resource name");
    }

    Ok(())
}

fn describe_status(status: u16) -> String {
    match status {
        400 => "invalid secret version name (400)".to_string(),
        401 => "unauthenticated: access token rejected (401)".to_string(),
        403 => "permission denied (403)".to_string(),
        404 => "secret version not found (404)".to_string(),
        429 => "quota exceeded (429)".to_string(),
        code => format!("Secret Manager returned status {}", code),
    }
}

/// Extract the decoded payload from an `:access` response body.
///
/// The raw body and the base64 text are zeroed once decoded.
fn decode_access_response(mut body: String) -> Result<Vec<u8>> {
    let parsed: Result<AccessSecretVersionResponse, _> = serde_json::from_str(&body);
    body.zeroize();

    let payload = parsed
        .map_err(|_| anyhow!("malformed access response"))?
        .payload
        .ok_or_else(|| anyhow!("access response has no payload"))?;

    let Some(mut data) = payload.data else {
        return Ok(Vec::new());
    };

    let decoded = STANDARD
        .decode(data.as_bytes())
        .map_err(|_| anyhow!("payload is not valid base64"));
    data.zeroize();
    decoded
}

/// Expand a bare secret name into a full version locator when a project is known.
///
/// Locators that already contain a `/` are returned unchanged.
pub fn scoped_locator(source: &str, project: &str) -> String {
    if project.is_empty() || source.is_empty() || source.contains('/') {
        return source.to_string();
    }

    format!("projects/{}/secrets/{}/versions/latest", project, source)
}

/// Resolver that fetches every value from a remote [`SecretStore`].
pub struct ExternalStoreResolver<S: SecretStore> {
    store: S,
    project: String,
}

impl<S: SecretStore> ExternalStoreResolver<S> {
    pub fn new(store: S, project: &str) -> Self {
        Self {
            store,
            project: project.to_string(),
        }
    }
}

impl<S: SecretStore> SecretResolver for ExternalStoreResolver<S> {
    fn get_type(&self) -> &str {
        "gcp-secret-manager"
    }

    fn resolve(&self, source: &SecretSource) -> Result<ResolvedSecret, FunctionError> {
        let locator = scoped_locator(&source.source, &self.project);
        tracing::debug!(key = %source.key, locator = %locator, "accessing secret version");

        let bytes = self
            .store
            .access(&locator)
            .map_err(|e| FunctionError::resolution(&source.key, &locator, format!("{:#}", e)))?;

        let value = String::from_utf8(bytes).map_err(|e| {
            let mut raw = e.into_bytes();
            raw.zeroize();
            FunctionError::resolution(&source.key, &locator, "payload is not valid UTF-8")
        })?;

        Ok(ResolvedSecret::new(&source.key, value))
    }
}

/// In-memory secret store for testing
#[cfg(test)]
pub struct MockSecretStore {
    responses: std::collections::HashMap<String, std::result::Result<Vec<u8>, String>>,
    calls: std::sync::Mutex<Vec<String>>,
}

#[cfg(test)]
impl MockSecretStore {
    pub fn new() -> Self {
        Self {
            responses: std::collections::HashMap::new(),
            calls: std::sync::Mutex::new(Vec::new()),
        }
    }

    pub fn with_secret(mut self, locator: &str, value: &str) -> Self {
        self.responses
            .insert(locator.to_string(), Ok(value.as_bytes().to_vec()));
        self
    }

    pub fn with_bytes(mut self, locator: &str, value: Vec<u8>) -> Self {
        self.responses.insert(locator.to_string(), Ok(value));
        self
    }

    pub fn with_error(mut self, locator: &str, error: &str) -> Self {
        self.responses
            .insert(locator.to_string(), Err(error.to_string()));
        self
    }

    /// Locators requested so far, in call order
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[cfg(test)]
impl SecretStore for &MockSecretStore {
    fn access(&self, locator: &str) -> Result<Vec<u8>> {
        self.calls.lock().unwrap().push(locator.to_string());
        match self.responses.get(locator) {
            Some(Ok(bytes)) => Ok(bytes.clone()),
            Some(Err(error)) => Err(anyhow!("{}", error)),
            None => Err(anyhow!("secret version not found (404)")),
        }
    }
}
