use crate::error::FunctionError;
use crate::function::Document;
use crate::secrets::ResolvedManifestData;
use handlebars::{Handlebars, Helper, HelperResult, Output, RenderContext};
use indexmap::IndexMap;
use secrecy::ExposeSecret;
use serde::Serialize;
use serde_yaml::Value;
use zeroize::Zeroize;

/// Annotation that makes kustomize append a content hash to the Secret name
pub const NEEDS_HASH_ANNOTATION: &str = "kustomize.config.k8s.io/needs-hash";

const SECRET_TEMPLATE_NAME: &str = "secret";

// Every scalar goes through the `json` helper: a JSON string is a valid YAML
// double-quoted scalar, so keys and values can never break the structure.
const SECRET_TEMPLATE: &str = r#"apiVersion: v1
kind: Secret
metadata:
  name: {{json name}}
{{#if hash_annotation}}
  annotations:
    {{json annotation}}: "true"
{{/if}}
{{#if entries}}
stringData:
{{#each entries}}
  {{json this.key}}: {{json this.value}}
{{/each}}
{{else}}
stringData: {}
{{/if}}
"#;

/// Presentation options for the generated Secret
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderOptions {
    /// Emit the kustomize needs-hash annotation
    pub hash_annotation: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            hash_annotation: true,
        }
    }
}

#[derive(Serialize)]
struct TemplateEntry<'a> {
    key: &'a str,
    value: &'a str,
}

#[derive(Serialize)]
struct TemplateData<'a> {
    name: &'a str,
    hash_annotation: bool,
    annotation: &'static str,
    entries: Vec<TemplateEntry<'a>>,
}

/// Renders resolved secrets into a `v1/Secret` manifest using Handlebars
pub struct ManifestRenderer {
    handlebars: Handlebars<'static>,
    options: RenderOptions,
}

impl ManifestRenderer {
    /// Create a new manifest renderer
    pub fn new(options: RenderOptions) -> Result<Self, FunctionError> {
        let mut handlebars = Handlebars::new();
        handlebars.set_strict_mode(true);
        handlebars.register_escape_fn(handlebars::no_escape);
        handlebars.register_helper("json", Box::new(json_helper));
        handlebars
            .register_template_string(SECRET_TEMPLATE_NAME, SECRET_TEMPLATE)
            .map_err(FunctionError::render)?;

        Ok(Self {
            handlebars,
            options,
        })
    }

    /// Render one Secret document.
    ///
    /// Duplicate keys collapse with the last value winning; the surviving
    /// entry keeps the position of the key's first occurrence.
    pub fn render(&self, data: &ResolvedManifestData) -> Result<Document, FunctionError> {
        if data.name.trim().is_empty() {
            return Err(FunctionError::render("secret name is empty"));
        }

        let entries = collapse_entries(data);
        let template_data = TemplateData {
            name: &data.name,
            hash_annotation: self.options.hash_annotation,
            annotation: NEEDS_HASH_ANNOTATION,
            entries: entries
                .iter()
                .map(|(&key, &value)| TemplateEntry { key, value })
                .collect(),
        };

        let mut text = self
            .handlebars
            .render(SECRET_TEMPLATE_NAME, &template_data)
            .map_err(|e| FunctionError::render(format!("template failed: {}", e)))?;
        let parsed: Result<Value, _> = serde_yaml::from_str(&text);
        text.zeroize();

        let document = parsed
            .map_err(|e| FunctionError::render(format!("rendered manifest is not valid YAML: {}", e)))?;
        verify_document(&document, &data.name, &entries)?;

        tracing::debug!(name = %data.name, keys = entries.len(), "rendered secret manifest");
        Ok(document)
    }
}

fn collapse_entries(data: &ResolvedManifestData) -> IndexMap<&str, &str> {
    let mut entries = IndexMap::with_capacity(data.secrets.len());
    for secret in &data.secrets {
        entries.insert(secret.key.as_str(), secret.value.expose_secret());
    }
    entries
}

/// Check that every key and value came back from YAML exactly as it went in.
fn verify_document(
    document: &Value,
    name: &str,
    entries: &IndexMap<&str, &str>,
) -> Result<(), FunctionError> {
    let rendered_name = document
        .get("metadata")
        .and_then(|metadata| metadata.get("name"))
        .and_then(Value::as_str);
    if rendered_name != Some(name) {
        return Err(FunctionError::render("metadata.name did not survive encoding"));
    }

    let string_data = document
        .get("stringData")
        .and_then(Value::as_mapping)
        .ok_or_else(|| FunctionError::render("stringData is not a mapping"))?;

    if string_data.len() != entries.len() {
        return Err(FunctionError::render(format!(
            "expected {} stringData entries, found {}",
            entries.len(),
            string_data.len()
        )));
    }

    for (key, value) in entries {
        match string_data.get(*key).and_then(Value::as_str) {
            Some(rendered) if rendered == *value => {}
            _ => {
                return Err(FunctionError::render(format!(
                    "value for key '{}' cannot be represented in the manifest",
                    key
                )));
            }
        }
    }

    Ok(())
}

/// Helper that writes its parameter as a JSON literal
fn json_helper(
    h: &Helper,
    _: &Handlebars,
    _: &handlebars::Context,
    _: &mut RenderContext,
    out: &mut dyn Output,
) -> HelperResult {
    if let Some(param) = h.param(0) {
        if let Ok(mut encoded) = yaml_safe_json(param.value()) {
            out.write(&encoded)?;
            encoded.zeroize();
        }
    }

    Ok(())
}

/// Encode a value as JSON that libyaml reads back unchanged.
///
/// serde_json leaves DEL, C1 controls and the Unicode line separators raw.
/// YAML rejects the former and folds the latter inside double quotes, so
/// both are rewritten as `\uXXXX` escapes.
fn yaml_safe_json(value: &serde_json::Value) -> serde_json::Result<String> {
    let mut encoded = serde_json::to_string(value)?;
    if !encoded.chars().any(needs_escape) {
        return Ok(encoded);
    }

    let mut escaped = String::with_capacity(encoded.len() + 16);
    for c in encoded.chars() {
        if needs_escape(c) {
            escaped.push_str(&format!("\\u{:04X}", c as u32));
        } else {
            escaped.push(c);
        }
    }
    encoded.zeroize();
    Ok(escaped)
}

fn needs_escape(c: char) -> bool {
    c.is_control() || matches!(c, '\u{2028}' | '\u{2029}' | '\u{FEFF}' | '\u{FFFE}' | '\u{FFFF}')
}
