//! The resolve-render-append step invoked once per ResourceList.

use super::resource_list::Document;
use crate::config::ResolutionSpec;
use crate::error::FunctionError;
use crate::manifest::{ManifestRenderer, RenderOptions};
use crate::secrets::{SecretResolver, resolve_spec};

/// Narrow interface between the transport and the generator: take the
/// current items, return the new items.
pub trait ResourceFilter {
    fn filter(&self, items: &[Document]) -> Result<Vec<Document>, FunctionError>;
}

/// Resolve the spec, render one Secret and append it after `items`.
///
/// Existing items are neither inspected nor reordered. On any error nothing
/// is produced and the caller's items are untouched.
pub fn process(
    items: &[Document],
    spec: &ResolutionSpec,
    resolver: &dyn SecretResolver,
    renderer: &ManifestRenderer,
) -> Result<Vec<Document>, FunctionError> {
    spec.validate()?;

    let data = resolve_spec(spec, resolver)?;
    let manifest = renderer.render(&data)?;

    let mut output = Vec::with_capacity(items.len() + 1);
    output.extend_from_slice(items);
    output.push(manifest);
    Ok(output)
}

/// Secret generator bound to one parsed spec and one resolver
pub struct SecretGenerator {
    spec: ResolutionSpec,
    resolver: Box<dyn SecretResolver>,
    renderer: ManifestRenderer,
}

impl SecretGenerator {
    pub fn new(spec: ResolutionSpec, resolver: Box<dyn SecretResolver>) -> Result<Self, FunctionError> {
        let renderer = ManifestRenderer::new(RenderOptions {
            hash_annotation: spec.hash_annotation,
        })?;

        Ok(Self {
            spec,
            resolver,
            renderer,
        })
    }
}

impl ResourceFilter for SecretGenerator {
    fn filter(&self, items: &[Document]) -> Result<Vec<Document>, FunctionError> {
        process(items, &self.spec, self.resolver.as_ref(), &self.renderer)
    }
}
