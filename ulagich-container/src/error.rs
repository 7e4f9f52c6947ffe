//! Error types for Ulagich injector operations.
//!
//! Every error is fatal to the `bootstrap` or `get` call that raised it.
//! Composition errors name both sides of the broken edge.

use std::fmt;

use ulagich_support::rendering::render_chain;

use crate::key::{ComponentKey, TypeKey};
use crate::metadata::MetadataKey;

/// Error type returned by user constructors and lifecycle hooks.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Main error type for all Ulagich operations.
#[derive(Debug, thiserror::Error)]
pub enum UlagichError {
    /// A dependency is neither declared in the composition unit nor
    /// already resolved.
    #[error("{}", .0)]
    MissingDependency(MissingDependencyError),

    /// `get` was called with a key that has no resolved entry.
    #[error("{}", .0)]
    UnresolvedKey(UnresolvedKeyError),

    /// The declared dependency graph loops back on itself.
    #[error("{}", .0)]
    CircularDependency(CircularDependencyError),

    /// A resolved value was requested as a type it does not provide.
    #[error("{}", .0)]
    TypeMismatch(TypeMismatchError),

    /// A constructor asked for more arguments than were declared.
    #[error("Constructor argument {position} was requested but only {available} were resolved")]
    MissingArgument { position: usize, available: usize },

    /// A constructor returned an error.
    #[error("Failed to construct {key}: {source}")]
    ConstructionFailed {
        key: TypeKey,
        #[source]
        source: BoxError,
    },

    /// The per-request lifecycle hook returned an error.
    #[error("Request hook of {key} failed: {source}")]
    RequestHookFailed {
        key: TypeKey,
        #[source]
        source: BoxError,
    },

    /// The metadata store holds a value of the wrong kind under a
    /// well-known key.
    #[error("Metadata {key:?} of {target} holds an unexpected value")]
    MetadataMismatch { target: TypeKey, key: MetadataKey },

    /// A blocking helper could not start its runtime.
    #[error("Failed to start a runtime for a blocking call: {0}")]
    RuntimeUnavailable(#[source] std::io::Error),

    /// A blocking helper was called from inside an async runtime.
    #[error("Blocking helpers cannot run inside an async runtime; use the async API instead")]
    BlockingInsideRuntime,
}

/// A dependency could not be satisfied.
#[derive(Debug)]
pub struct MissingDependencyError {
    /// The type whose constructor declares the dependency.
    pub consumer: TypeKey,
    /// Effective key of the dependency (explicit token when present).
    pub dependency: ComponentKey,
    /// Constructor parameter position of the dependency.
    pub position: usize,
}

impl fmt::Display for MissingDependencyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Missing dependency: {} requires {} (parameter {})",
            self.consumer, self.dependency, self.position
        )?;
        match &self.dependency {
            ComponentKey::Type(ty) => write!(
                f,
                "\n  Hint: declare {} as an injectable of this composition unit",
                ty
            ),
            ComponentKey::Token(token) => write!(
                f,
                "\n  Hint: bind token {token} to a concrete type in this composition unit"
            ),
        }
    }
}

/// Lookup of a key that was never resolved.
#[derive(Debug)]
pub struct UnresolvedKeyError {
    pub key: ComponentKey,
    /// Resolved keys with similar names.
    pub suggestions: Vec<String>,
}

impl fmt::Display for UnresolvedKeyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "No resolved entry for {}", self.key)?;

        if !self.suggestions.is_empty() {
            write!(f, "\n  Did you mean one of:")?;
            for suggestion in &self.suggestions {
                write!(f, "\n    - {suggestion}")?;
            }
        }

        write!(f, "\n  Hint: only bootstrapped injectables and consumers can be looked up")
    }
}

/// A cycle in the dependency graph.
#[derive(Debug)]
pub struct CircularDependencyError {
    /// Keys along the cycle; the first and last entries are equal.
    pub chain: Vec<ComponentKey>,
}

impl fmt::Display for CircularDependencyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<String> = self.chain.iter().map(ToString::to_string).collect();
        write!(f, "Circular dependency detected:\n  {}", render_chain(&names))
    }
}

/// A value was downcast to a type it cannot provide.
#[derive(Debug)]
pub struct TypeMismatchError {
    /// The requested type.
    pub expected: &'static str,
    /// The concrete type that was resolved.
    pub found: TypeKey,
    /// Constructor parameter position, when raised while extracting
    /// arguments.
    pub position: Option<usize>,
}

impl fmt::Display for TypeMismatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Type mismatch: expected {}, found {}", self.expected, self.found)?;
        if let Some(position) = self.position {
            write!(f, " (argument {position})")?;
        }
        write!(
            f,
            "\n  Hint: expose the trait object through Capabilities::expose on {}",
            self.found
        )
    }
}

/// Convenient Result type for Ulagich operations.
pub type Result<T> = std::result::Result<T, UlagichError>;

#[cfg(test)]
mod tests {
    use super::*;

    struct Greeter;
    struct Mailer;

    #[test]
    fn missing_dependency_names_both_sides() {
        let err = UlagichError::MissingDependency(MissingDependencyError {
            consumer: TypeKey::of::<Greeter>(),
            dependency: ComponentKey::of::<Mailer>(),
            position: 0,
        });

        let msg = err.to_string();
        assert!(msg.contains("Greeter"));
        assert!(msg.contains("Mailer"));
    }

    #[test]
    fn missing_token_dependency_names_token() {
        let err = UlagichError::MissingDependency(MissingDependencyError {
            consumer: TypeKey::of::<Greeter>(),
            dependency: ComponentKey::token("Logger"),
            position: 1,
        });

        let msg = err.to_string();
        assert!(msg.contains("\"Logger\""));
        assert!(msg.contains("bind token"));
    }

    #[test]
    fn unresolved_key_lists_suggestions() {
        let err = UlagichError::UnresolvedKey(UnresolvedKeyError {
            key: ComponentKey::token("Loger"),
            suggestions: vec!["\"Logger\"".to_string()],
        });

        let msg = err.to_string();
        assert!(msg.contains("Did you mean"));
        assert!(msg.contains("\"Logger\""));
    }

    #[test]
    fn circular_dependency_renders_chain() {
        let err = UlagichError::CircularDependency(CircularDependencyError {
            chain: vec![
                ComponentKey::of::<Greeter>(),
                ComponentKey::of::<Mailer>(),
                ComponentKey::of::<Greeter>(),
            ],
        });

        let msg = err.to_string();
        assert!(msg.contains("Circular"));
        assert!(msg.contains("Greeter → Mailer → Greeter"));
    }
}
