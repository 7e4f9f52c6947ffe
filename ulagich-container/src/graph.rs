//! Resolution path tracking.
//!
//! Injectables are resolved depth-first. The path holds the keys currently
//! being resolved; meeting one of them again means the declared graph has a
//! cycle, which is reported instead of recursing forever.

use tracing::warn;

use crate::error::{CircularDependencyError, Result, UlagichError};
use crate::key::ComponentKey;

/// Keys on the current depth-first resolution path.
#[derive(Debug, Default)]
pub(crate) struct ResolutionPath {
    stack: Vec<ComponentKey>,
}

impl ResolutionPath {
    /// Pushes `key`, failing if it is already being resolved.
    pub fn enter(&mut self, key: &ComponentKey) -> Result<()> {
        if let Some(start) = self.stack.iter().position(|k| k == key) {
            let mut chain = self.stack[start..].to_vec();
            chain.push(key.clone());

            warn!(cycle = ?chain, "Circular dependency detected");
            return Err(UlagichError::CircularDependency(CircularDependencyError { chain }));
        }

        self.stack.push(key.clone());
        Ok(())
    }

    pub fn leave(&mut self) {
        self.stack.pop();
    }

    pub fn depth(&self) -> usize {
        self.stack.len()
    }
}
