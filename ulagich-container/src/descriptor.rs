//! Dependency descriptors read back from the metadata store.

use crate::error::{Result, UlagichError};
use crate::key::{ComponentKey, Token, TypeKey};
use crate::metadata::{MetadataKey, MetadataStore, MetadataValue};
use crate::scope::Scope;

/// One constructor parameter of a constructible type.
#[derive(Debug, Clone, PartialEq)]
pub struct Dependency {
    /// Constructor parameter position.
    pub position: usize,
    /// Statically declared parameter type.
    pub declared: TypeKey,
    /// Explicit token for this position, if any.
    pub token: Option<Token>,
}

impl Dependency {
    /// The key this parameter resolves through. An explicit token always
    /// wins over the declared type.
    pub fn effective_key(&self) -> ComponentKey {
        match &self.token {
            Some(token) => ComponentKey::Token(token.clone()),
            None => ComponentKey::Type(self.declared),
        }
    }
}

/// Reads the ordered dependency list of `target`.
///
/// A type without recorded parameter types has no dependencies.
pub fn dependencies_of(store: &dyn MetadataStore, target: &TypeKey) -> Result<Vec<Dependency>> {
    let params = match store.get_metadata(MetadataKey::ParamTypes, target) {
        None => return Ok(Vec::new()),
        Some(MetadataValue::ParamTypes(params)) => params,
        Some(_) => return Err(mismatch(target, MetadataKey::ParamTypes)),
    };

    params
        .into_iter()
        .enumerate()
        .map(|(position, declared)| {
            let key = MetadataKey::ParamToken(position);
            let token = match store.get_metadata(key, target) {
                None => None,
                Some(MetadataValue::Token(token)) => Some(token),
                Some(_) => return Err(mismatch(target, key)),
            };
            Ok(Dependency { position, declared, token })
        })
        .collect()
}

/// Reads the declared scope of `target`, defaulting to [`Scope::Singleton`].
pub fn declared_scope(store: &dyn MetadataStore, target: &TypeKey) -> Result<Scope> {
    match store.get_metadata(MetadataKey::Scope, target) {
        None => Ok(Scope::default()),
        Some(MetadataValue::Scope(scope)) => Ok(scope),
        Some(_) => Err(mismatch(target, MetadataKey::Scope)),
    }
}

fn mismatch(target: &TypeKey, key: MetadataKey) -> UlagichError {
    UlagichError::MetadataMismatch { target: *target, key }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::{Annotations, InMemoryMetadata};

    struct Clock;
    struct Greeter;

    #[test]
    fn no_metadata_means_no_dependencies() {
        let store = InMemoryMetadata::new();
        let deps = dependencies_of(&store, &TypeKey::of::<Clock>()).unwrap();
        assert!(deps.is_empty());
        assert_eq!(declared_scope(&store, &TypeKey::of::<Clock>()).unwrap(), Scope::Singleton);
    }

    #[test]
    fn token_wins_over_declared_type() {
        let store = InMemoryMetadata::new();
        let mut meta = Annotations::new();
        meta.param::<Clock>().param_token::<String>("Prefix");
        meta.apply(&store, &TypeKey::of::<Greeter>());

        let deps = dependencies_of(&store, &TypeKey::of::<Greeter>()).unwrap();
        assert_eq!(deps.len(), 2);
        assert_eq!(deps[0].effective_key(), ComponentKey::of::<Clock>());
        assert_eq!(deps[1].effective_key(), ComponentKey::token("Prefix"));
        assert_eq!(deps[1].declared, TypeKey::of::<String>());
    }

    #[test]
    fn wrong_value_kind_is_reported() {
        let store = InMemoryMetadata::new();
        let target = TypeKey::of::<Greeter>();
        store.set_metadata(MetadataKey::Scope, MetadataValue::Token(Token::new("x")), &target);

        match declared_scope(&store, &target) {
            Err(UlagichError::MetadataMismatch { key, .. }) => assert_eq!(key, MetadataKey::Scope),
            other => panic!("Expected MetadataMismatch, got: {other:?}"),
        }
    }
}
