//! KRM function runtime: the ResourceList envelope and the filter that
//! appends the generated Secret to it.

mod processor;
mod resource_list;

pub use processor::{ResourceFilter, SecretGenerator};
pub use resource_list::{Document, OutputFormat, ResourceList};
