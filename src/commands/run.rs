use crate::config::ResolutionSpec;
use crate::error::FunctionError;
use crate::function::{OutputFormat, ResourceFilter, ResourceList, SecretGenerator};
use crate::secrets::{ResolverSettings, SecretResolverRegistry};
use std::io::{Read, Write};
use std::time::Duration;

/// Options for a single function run
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Registered resolver name (e.g., "identity", "gcp-secret-manager")
    pub resolver: String,
    pub endpoint: String,
    pub timeout: Duration,
    pub format: OutputFormat,
}

/// Handles the default command - reads a ResourceList, appends the generated Secret, writes it back
pub struct RunCommand;

impl RunCommand {
    /// Execute against the process stdin and stdout
    pub fn execute(options: &RunOptions) -> Result<(), FunctionError> {
        let stdin = std::io::stdin().lock();
        let stdout = std::io::stdout().lock();
        Self::execute_with(stdin, stdout, options)
    }

    /// Execute against any reader and writer.
    ///
    /// Nothing is written unless the whole list was produced.
    pub fn execute_with<R: Read, W: Write>(
        input: R,
        output: W,
        options: &RunOptions,
    ) -> Result<(), FunctionError> {
        let list = ResourceList::read_from(input)?;
        tracing::info!(items = list.items.len(), "read resource list");

        let spec = ResolutionSpec::from_function_config(&list.function_config)?;

        let settings = ResolverSettings {
            endpoint: options.endpoint.clone(),
            timeout: options.timeout,
            project: spec.project.clone(),
        };
        let resolver = SecretResolverRegistry::new()
            .build(&options.resolver, &settings)
            .map_err(|e| FunctionError::config(format!("{:#}", e)))?;

        let generator = SecretGenerator::new(spec, resolver)?;
        let items = generator.filter(&list.items)?;

        let result = ResourceList { items, ..list };
        result.write_to(output, options.format)?;

        tracing::info!(items = result.items.len(), "wrote resource list");
        Ok(())
    }
}
