//! KRM `ResourceList` envelope read from stdin and written to stdout.

use crate::error::FunctionError;
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};

/// One opaque configuration document in the stream
pub type Document = serde_yaml::Value;

pub const RESOURCE_LIST_API_VERSION: &str = "config.kubernetes.io/v1";
pub const RESOURCE_LIST_KIND: &str = "ResourceList";

/// Encoding of the emitted ResourceList
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Block-style YAML
    #[default]
    Yaml,
    /// Pretty-printed JSON (inline mappings)
    Json,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceList {
    #[serde(default = "default_api_version")]
    pub api_version: String,

    #[serde(default = "default_kind")]
    pub kind: String,

    #[serde(default)]
    pub items: Vec<Document>,

    #[serde(default, skip_serializing_if = "Document::is_null")]
    pub function_config: Document,
}

fn default_api_version() -> String {
    RESOURCE_LIST_API_VERSION.to_string()
}

fn default_kind() -> String {
    RESOURCE_LIST_KIND.to_string()
}

impl ResourceList {
    /// Read a ResourceList from YAML or JSON input.
    pub fn read_from<R: Read>(mut reader: R) -> Result<Self, FunctionError> {
        let mut input = String::new();
        reader
            .read_to_string(&mut input)
            .map_err(|e| FunctionError::transport(format!("could not read input: {}", e)))?;

        if input.trim().is_empty() {
            return Err(FunctionError::transport("no ResourceList on input"));
        }

        let list: ResourceList = serde_yaml::from_str(&input)
            .map_err(|e| FunctionError::transport(format!("could not parse ResourceList: {}", e)))?;

        if list.kind != RESOURCE_LIST_KIND {
            return Err(FunctionError::transport(format!(
                "input must be a {}, got kind '{}'",
                RESOURCE_LIST_KIND, list.kind
            )));
        }

        if !list.api_version.starts_with("config.kubernetes.io/") {
            return Err(FunctionError::transport(format!(
                "unsupported ResourceList apiVersion '{}'",
                list.api_version
            )));
        }

        Ok(list)
    }

    /// Serialize the whole list before writing so a failure never leaves
    /// partial output behind.
    pub fn write_to<W: Write>(&self, mut writer: W, format: OutputFormat) -> Result<(), FunctionError> {
        let encoded = match format {
            OutputFormat::Yaml => serde_yaml::to_string(self).map_err(FunctionError::transport)?,
            OutputFormat::Json => {
                let mut json = serde_json::to_string_pretty(self).map_err(FunctionError::transport)?;
                json.push('\n');
                json
            }
        };

        writer
            .write_all(encoded.as_bytes())
            .and_then(|_| writer.flush())
            .map_err(|e| FunctionError::transport(format!("could not write ResourceList: {}", e)))
    }
}
