//! Type metadata store.
//!
//! The injector never inspects types directly. Constructor parameter types,
//! per-parameter tokens and scope annotations are read from a
//! [`MetadataStore`] keyed by [`MetadataKey`] and target [`TypeKey`]. The
//! store can be populated by hand, by [`Annotations`], or by
//! `#[derive(Injectable)]`.

use std::collections::HashMap;
use std::sync::Arc;

use once_cell::sync::Lazy;
use parking_lot::RwLock;
use tracing::trace;

use crate::key::{Token, TypeKey};
use crate::scope::Scope;

/// Well-known metadata keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetadataKey {
    /// Ordered constructor parameter types.
    ParamTypes,
    /// Explicit token overriding the parameter type at this position.
    ParamToken(usize),
    /// Declared lifecycle scope.
    Scope,
}

/// A value stored under a [`MetadataKey`].
#[derive(Debug, Clone, PartialEq)]
pub enum MetadataValue {
    ParamTypes(Vec<TypeKey>),
    Token(Token),
    Scope(Scope),
}

/// Key/type indexed metadata storage.
///
/// Implementations use interior mutability so a single store can be shared
/// between the composition layer and the injector.
pub trait MetadataStore: Send + Sync {
    fn get_metadata(&self, key: MetadataKey, target: &TypeKey) -> Option<MetadataValue>;

    fn set_metadata(&self, key: MetadataKey, value: MetadataValue, target: &TypeKey);
}

static GLOBAL: Lazy<Arc<InMemoryMetadata>> = Lazy::new(|| Arc::new(InMemoryMetadata::new()));

/// In-memory [`MetadataStore`].
///
/// # Examples
/// ```
/// use ulagich_container::key::TypeKey;
/// use ulagich_container::metadata::{InMemoryMetadata, MetadataKey, MetadataStore, MetadataValue};
/// use ulagich_container::scope::Scope;
///
/// struct Session;
///
/// let store = InMemoryMetadata::new();
/// let target = TypeKey::of::<Session>();
/// store.set_metadata(MetadataKey::Scope, MetadataValue::Scope(Scope::Request), &target);
///
/// assert_eq!(
///     store.get_metadata(MetadataKey::Scope, &target),
///     Some(MetadataValue::Scope(Scope::Request)),
/// );
/// ```
#[derive(Debug, Default)]
pub struct InMemoryMetadata {
    entries: RwLock<HashMap<(TypeKey, MetadataKey), MetadataValue>>,
}

impl InMemoryMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide store.
    pub fn global() -> Arc<InMemoryMetadata> {
        GLOBAL.clone()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl MetadataStore for InMemoryMetadata {
    fn get_metadata(&self, key: MetadataKey, target: &TypeKey) -> Option<MetadataValue> {
        self.entries.read().get(&(*target, key)).cloned()
    }

    fn set_metadata(&self, key: MetadataKey, value: MetadataValue, target: &TypeKey) {
        trace!(target = %target, key = ?key, "Setting metadata");
        self.entries.write().insert((*target, key), value);
    }
}

/// Typed builder for the metadata of one constructible type.
///
/// Parameters are recorded in constructor order. Only what was annotated is
/// written by [`apply`](Annotations::apply).
///
/// ```
/// use ulagich_container::key::TypeKey;
/// use ulagich_container::metadata::{Annotations, InMemoryMetadata, MetadataKey, MetadataStore, MetadataValue};
///
/// trait Logger {}
/// struct Clock;
/// struct Greeter;
///
/// let mut meta = Annotations::new();
/// meta.param_token::<dyn Logger>("Logger").param::<Clock>();
///
/// let store = InMemoryMetadata::new();
/// meta.apply(&store, &TypeKey::of::<Greeter>());
///
/// assert_eq!(
///     store.get_metadata(MetadataKey::ParamToken(0), &TypeKey::of::<Greeter>()),
///     Some(MetadataValue::Token("Logger".into())),
/// );
/// ```
#[derive(Debug, Default, Clone)]
pub struct Annotations {
    params: Vec<TypeKey>,
    tokens: Vec<(usize, Token)>,
    scope: Option<Scope>,
}

impl Annotations {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a constructor parameter of type `T`.
    pub fn param<T: ?Sized + 'static>(&mut self) -> &mut Self {
        self.params.push(TypeKey::of::<T>());
        self
    }

    /// Appends a constructor parameter of static type `T` resolved through
    /// `token`.
    pub fn param_token<T: ?Sized + 'static>(&mut self, token: impl Into<Token>) -> &mut Self {
        self.tokens.push((self.params.len(), token.into()));
        self.params.push(TypeKey::of::<T>());
        self
    }

    pub fn scope(&mut self, scope: Scope) -> &mut Self {
        self.scope = Some(scope);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty() && self.scope.is_none()
    }

    /// Writes the recorded annotations for `target` into `store`.
    pub fn apply(&self, store: &dyn MetadataStore, target: &TypeKey) {
        if !self.params.is_empty() {
            store.set_metadata(
                MetadataKey::ParamTypes,
                MetadataValue::ParamTypes(self.params.clone()),
                target,
            );
        }
        for (position, token) in &self.tokens {
            store.set_metadata(
                MetadataKey::ParamToken(*position),
                MetadataValue::Token(token.clone()),
                target,
            );
        }
        if let Some(scope) = self.scope {
            store.set_metadata(MetadataKey::Scope, MetadataValue::Scope(scope), target);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Clock;
    struct Greeter;

    #[test]
    fn missing_entry_is_none() {
        let store = InMemoryMetadata::new();
        assert!(store.get_metadata(MetadataKey::Scope, &TypeKey::of::<Clock>()).is_none());
    }

    #[test]
    fn entries_are_per_target() {
        let store = InMemoryMetadata::new();
        store.set_metadata(
            MetadataKey::Scope,
            MetadataValue::Scope(Scope::Request),
            &TypeKey::of::<Greeter>(),
        );

        assert!(store.get_metadata(MetadataKey::Scope, &TypeKey::of::<Clock>()).is_none());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn annotations_record_positions() {
        let mut meta = Annotations::new();
        meta.param::<Clock>()
            .param_token::<String>("Prefix")
            .scope(Scope::Request);

        let store = InMemoryMetadata::new();
        let target = TypeKey::of::<Greeter>();
        meta.apply(&store, &target);

        assert_eq!(
            store.get_metadata(MetadataKey::ParamTypes, &target),
            Some(MetadataValue::ParamTypes(vec![
                TypeKey::of::<Clock>(),
                TypeKey::of::<String>(),
            ])),
        );
        assert!(store.get_metadata(MetadataKey::ParamToken(0), &target).is_none());
        assert_eq!(
            store.get_metadata(MetadataKey::ParamToken(1), &target),
            Some(MetadataValue::Token(Token::new("Prefix"))),
        );
        assert_eq!(
            store.get_metadata(MetadataKey::Scope, &target),
            Some(MetadataValue::Scope(Scope::Request)),
        );
    }

    #[test]
    fn empty_annotations_write_nothing() {
        let store = InMemoryMetadata::new();
        Annotations::new().apply(&store, &TypeKey::of::<Greeter>());
        assert!(store.is_empty());
    }

    #[test]
    fn global_store_is_shared() {
        assert!(Arc::ptr_eq(&InMemoryMetadata::global(), &InMemoryMetadata::global()));
    }
}
