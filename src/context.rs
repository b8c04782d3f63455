use crate::traits::{FileSystem, RealFileSystem};
#[cfg(test)]
use crate::traits::MockFileSystem;
use std::sync::Arc;

/// Application context that holds all dependencies for dependency injection
pub struct Context {
    pub fs: Arc<dyn FileSystem>,
}

impl Context {
    /// Create a new context with real implementations (for production use)
    pub fn new() -> Self {
        Self {
            fs: Arc::new(RealFileSystem),
        }
    }

    /// Create a new context with mock implementations (for testing)
    #[cfg(test)]
    pub fn test() -> Self {
        Self {
            fs: Arc::new(MockFileSystem::new()),
        }
    }

    /// Create a test context with a specific filesystem
    #[cfg(test)]
    pub fn test_with(fs: Arc<dyn FileSystem>) -> Self {
        Self { fs }
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}
