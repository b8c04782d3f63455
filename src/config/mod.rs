//! Function configuration parsed from the ResourceList `functionConfig`.

mod spec;

pub use spec::{ResolutionSpec, SecretSource};
