//! Resolved registry — component keys mapped to instance factories.
//!
//! Entries are added during bootstrap and never replaced or removed. The
//! registry is cheaply cloneable; request-scoped factories receive a handle
//! to it so they can rebuild their dependencies by key.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use parking_lot::RwLock;
use tracing::trace;
use ulagich_support::rendering::suggest_similar;

use crate::context::Context;
use crate::declaration::BuildFn;
use crate::error::{Result, UlagichError, UnresolvedKeyError};
use crate::instance::{Arguments, Instance};
use crate::key::{ComponentKey, TypeKey};
use crate::scope::Scope;

/// Boxed, sendable future.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Produces an instance for one registry entry.
///
/// Singleton factories ignore both arguments. Request factories resolve
/// their dependencies through the registry handle, threading the context.
pub type FactoryFn =
    Arc<dyn Fn(ResolvedRegistry, Option<Context>) -> BoxFuture<'static, Result<Instance>> + Send + Sync>;

/// One resolved entry.
#[derive(Clone)]
pub struct Registration {
    key: ComponentKey,
    concrete: TypeKey,
    scope: Scope,
    factory: FactoryFn,
}

impl Registration {
    pub(crate) fn new(key: ComponentKey, concrete: TypeKey, scope: Scope, factory: FactoryFn) -> Self {
        Self {
            key,
            concrete,
            scope,
            factory,
        }
    }

    pub fn key(&self) -> &ComponentKey {
        &self.key
    }

    /// The concrete type satisfying the key.
    pub fn concrete_type(&self) -> TypeKey {
        self.concrete
    }

    /// Effective scope, including scope inherited from dependencies.
    pub fn scope(&self) -> Scope {
        self.scope
    }
}

impl std::fmt::Debug for Registration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registration")
            .field("key", &self.key)
            .field("concrete", &self.concrete)
            .field("scope", &self.scope)
            .finish()
    }
}

/// The resolved registry.
///
/// The concrete-type column of each [`Registration`] doubles as the
/// resolved type map.
#[derive(Clone)]
pub struct ResolvedRegistry {
    entries: Arc<DashMap<ComponentKey, Registration>>,
    order: Arc<RwLock<Vec<ComponentKey>>>,
    max_suggestions: usize,
}

impl ResolvedRegistry {
    pub(crate) fn new(max_suggestions: usize) -> Self {
        Self {
            entries: Arc::new(DashMap::new()),
            order: Arc::new(RwLock::new(Vec::new())),
            max_suggestions,
        }
    }

    /// Inserts `registration` unless its key is already present.
    ///
    /// Returns `false` when an earlier registration won.
    pub(crate) fn insert(&self, registration: Registration) -> bool {
        match self.entries.entry(registration.key.clone()) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                self.order.write().push(registration.key.clone());
                slot.insert(registration);
                true
            }
        }
    }

    /// Invokes the factory stored under `key`.
    ///
    /// # Errors
    /// [`UlagichError::UnresolvedKey`] if `key` has no entry; otherwise
    /// whatever the factory raises.
    pub async fn get(&self, key: &ComponentKey, ctx: Option<Context>) -> Result<Instance> {
        let factory = self.entries.get(key).map(|entry| entry.factory.clone());
        let Some(factory) = factory else {
            return Err(self.unresolved(key));
        };

        trace!(key = %key, has_context = ctx.is_some(), "Resolving");
        factory(self.clone(), ctx).await
    }

    pub fn contains(&self, key: &ComponentKey) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Resolved keys in registration order.
    pub fn keys(&self) -> Vec<ComponentKey> {
        self.order.read().clone()
    }

    pub fn registration(&self, key: &ComponentKey) -> Option<Registration> {
        self.entries.get(key).map(|entry| entry.value().clone())
    }

    pub fn scope_of(&self, key: &ComponentKey) -> Option<Scope> {
        self.entries.get(key).map(|entry| entry.scope)
    }

    /// The concrete type resolved for `key`.
    pub fn resolved_type(&self, key: &ComponentKey) -> Option<TypeKey> {
        self.entries.get(key).map(|entry| entry.concrete)
    }

    fn unresolved(&self, key: &ComponentKey) -> UlagichError {
        let names: Vec<String> = self
            .keys()
            .iter()
            .map(|k| k.display_name().into_owned())
            .collect();
        let available: Vec<&str> = names.iter().map(String::as_str).collect();

        UlagichError::UnresolvedKey(UnresolvedKeyError {
            key: key.clone(),
            suggestions: suggest_similar(&key.display_name(), &available, self.max_suggestions),
        })
    }
}

impl std::fmt::Debug for ResolvedRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolvedRegistry")
            .field("resolved", &self.entries.len())
            .finish()
    }
}

/// Factory returning one memoized instance.
pub(crate) fn singleton(instance: Instance) -> FactoryFn {
    Arc::new(
        move |_: ResolvedRegistry, _: Option<Context>| -> BoxFuture<'static, Result<Instance>> {
            Box::pin(std::future::ready(Ok(instance.clone())))
        },
    )
}

/// Factory rebuilding the instance on every call.
///
/// Dependencies are fetched one at a time, in declaration order, with the
/// same context.
pub(crate) fn per_request(dependencies: Vec<ComponentKey>, build: BuildFn) -> FactoryFn {
    let dependencies: Arc<[ComponentKey]> = dependencies.into();

    Arc::new(
        move |registry: ResolvedRegistry, ctx: Option<Context>| -> BoxFuture<'static, Result<Instance>> {
            let dependencies = dependencies.clone();
            let build = build.clone();

            Box::pin(async move {
                let mut values = Vec::with_capacity(dependencies.len());
                for key in dependencies.iter() {
                    values.push(registry.get(key, ctx.clone()).await?);
                }
                build(Arguments::new(values), ctx).await
            })
        },
    )
}
