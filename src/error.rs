use thiserror::Error;

/// Errors that terminate a single function invocation.
///
/// None of these are retried. Messages identify the failing key or locator
/// but never carry a resolved secret value.
#[derive(Debug, Error)]
pub enum FunctionError {
    /// The function config is malformed or incomplete
    #[error("invalid function config: {0}")]
    Config(String),

    /// A single secret source could not be resolved
    #[error("could not resolve secret '{key}' from '{locator}': {cause}")]
    Resolution {
        key: String,
        locator: String,
        cause: String,
    },

    /// The Secret manifest could not be produced
    #[error("could not render secret manifest: {0}")]
    Render(String),

    /// The ResourceList could not be read, parsed or written
    #[error("resource list transport failed: {0}")]
    Transport(String),
}

impl FunctionError {
    pub fn config(message: impl Into<String>) -> Self {
        FunctionError::Config(message.into())
    }

    pub fn resolution(
        key: impl Into<String>,
        locator: impl Into<String>,
        cause: impl std::fmt::Display,
    ) -> Self {
        FunctionError::Resolution {
            key: key.into(),
            locator: locator.into(),
            cause: cause.to_string(),
        }
    }

    pub fn render(message: impl std::fmt::Display) -> Self {
        FunctionError::Render(message.to_string())
    }

    pub fn transport(message: impl std::fmt::Display) -> Self {
        FunctionError::Transport(message.to_string())
    }
}
