//! # The Injector — heart of Ulagich
//!
//! Bootstraps composition units into a [`ResolvedRegistry`] and serves
//! lookups from it.
//!
//! # Architecture
//! ```text
//! CompositionUnit ──bootstrap()──> Injector ──get(key, ctx)──> Instance
//!                                     │
//!                             ResolvedRegistry
//!                     (key → singleton | per-request factory)
//! ```
//!
//! Bootstrap runs in two phases. Injectables are resolved depth-first in
//! declaration order: dependencies first, singletons constructed eagerly,
//! request-scoped components stored as factories. A component depending on
//! anything request-scoped becomes request-scoped itself. Consumers are
//! then wired against what is already resolved.
//!
//! # Examples
//! ```rust
//! use ulagich_container::prelude::*;
//!
//! struct Clock;
//!
//! #[async_trait::async_trait]
//! impl Injectable for Clock {
//!     async fn construct(_args: Arguments) -> std::result::Result<Self, BoxError> {
//!         Ok(Clock)
//!     }
//! }
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let mut injector = Injector::new();
//! injector
//!     .bootstrap(&CompositionUnit::new("app").provide::<Clock>())
//!     .await
//!     .expect("bootstrap failed");
//!
//! let a = injector.resolve::<Clock>(None).await.expect("lookup failed");
//! let b = injector.resolve::<Clock>(None).await.expect("lookup failed");
//! assert!(std::sync::Arc::ptr_eq(&a, &b));
//! # });
//! ```

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use tracing::{debug, info, instrument, trace};

use crate::context::Context;
use crate::declaration::{CompositionUnit, Constructible, InjectableDecl};
use crate::descriptor::{self, Dependency};
use crate::error::{MissingDependencyError, Result, UlagichError};
use crate::graph::ResolutionPath;
use crate::instance::{Arguments, Instance};
use crate::key::{ComponentKey, TypeKey};
use crate::metadata::{InMemoryMetadata, MetadataStore};
use crate::module::Module;
use crate::registry::{self, BoxFuture, Registration, ResolvedRegistry};
use crate::scope::Scope;
use crate::settings::InjectorSettings;

/// Injectables of the unit being bootstrapped, by declaration key.
type Availability<'u> = HashMap<ComponentKey, &'u InjectableDecl>;

// ============================================================
// InjectorBuilder
// ============================================================

/// Builds an [`Injector`].
///
/// ```rust,ignore
/// let injector = Injector::builder()
///     .metadata(store)
///     .max_suggestions(5)
///     .build();
/// ```
pub struct InjectorBuilder {
    metadata: Option<Arc<dyn MetadataStore>>,
    settings: InjectorSettings,
}

impl InjectorBuilder {
    fn new() -> Self {
        Self {
            metadata: None,
            settings: InjectorSettings::default(),
        }
    }

    /// Reads and replays type metadata through `store`.
    pub fn metadata(mut self, store: Arc<dyn MetadataStore>) -> Self {
        self.metadata = Some(store);
        self
    }

    /// Uses the process-wide [`InMemoryMetadata::global`] store.
    pub fn global_metadata(self) -> Self {
        self.metadata(InMemoryMetadata::global())
    }

    pub fn settings(mut self, settings: InjectorSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn max_suggestions(mut self, max: usize) -> Self {
        self.settings.max_suggestions = max;
        self
    }

    pub fn build(self) -> Injector {
        let metadata = self
            .metadata
            .unwrap_or_else(|| Arc::new(InMemoryMetadata::new()));

        Injector {
            metadata,
            registry: ResolvedRegistry::new(self.settings.max_suggestions),
            settings: self.settings,
            units: HashSet::new(),
        }
    }
}

// ═══════════════════════════════════════════
// Injector
// ═══════════════════════════════════════════

/// The dependency-resolution engine.
///
/// Bootstrapping needs `&mut self`; afterwards the injector is read-only
/// and can be shared (for example in an `Arc`) between concurrent lookups.
/// An injector whose bootstrap failed must not be used further.
pub struct Injector {
    metadata: Arc<dyn MetadataStore>,
    registry: ResolvedRegistry,
    settings: InjectorSettings,
    units: HashSet<String>,
}

impl Injector {
    /// Injector with a private in-memory metadata store.
    pub fn new() -> Self {
        Self::builder().build()
    }

    pub fn builder() -> InjectorBuilder {
        InjectorBuilder::new()
    }

    /// Registers the unit's injectables, then wires its consumers.
    ///
    /// Keys that are already resolved are skipped, so bootstrapping a unit
    /// again only adds what is new.
    ///
    /// # Errors
    /// - [`UlagichError::MissingDependency`] — undeclared dependency
    /// - [`UlagichError::CircularDependency`] — cyclic declarations
    /// - [`UlagichError::ConstructionFailed`] — a singleton constructor failed
    #[instrument(skip(self, unit), fields(unit = %unit.name()))]
    pub async fn bootstrap(&mut self, unit: &CompositionUnit) -> Result<()> {
        if self.units.contains(unit.name()) {
            debug!("Composition unit name seen before, registering new keys only");
        }

        if self.settings.announce_units {
            info!(
                injectables = unit.injectables().len(),
                consumers = unit.consumers().len(),
                "Bootstrapping composition unit {}",
                unit.name()
            );
        } else {
            debug!(
                injectables = unit.injectables().len(),
                consumers = unit.consumers().len(),
                "Bootstrapping composition unit {}",
                unit.name()
            );
        }

        unit.annotate(self.metadata.as_ref());

        let mut available = Availability::new();
        for decl in unit.injectables() {
            available.entry(decl.key()).or_insert(decl);
        }

        let mut path = ResolutionPath::default();
        for decl in unit.injectables() {
            self.resolve_injectable(decl, &available, &mut path).await?;
        }

        for consumer in unit.consumers() {
            self.resolve_consumer(consumer).await?;
        }

        self.units.insert(unit.name().to_string());
        debug!(resolved = self.registry.len(), "Composition unit ready");
        Ok(())
    }

    /// Bootstraps the unit declared by `module`.
    pub async fn bootstrap_module(&mut self, module: &dyn Module) -> Result<()> {
        self.bootstrap(&CompositionUnit::from_module(module)).await
    }

    /// Whether `key` has a resolved entry.
    pub fn has(&self, key: impl Into<ComponentKey>) -> bool {
        self.registry.contains(&key.into())
    }

    /// Produces the instance for `key`.
    ///
    /// Singleton entries return their memoized instance. Request entries
    /// build a fresh instance graph, threading `ctx` through.
    ///
    /// # Errors
    /// [`UlagichError::UnresolvedKey`] if `key` was never resolved.
    pub async fn get(&self, key: impl Into<ComponentKey>, ctx: Option<Context>) -> Result<Instance> {
        let key = key.into();
        self.registry.get(&key, ctx).await
    }

    /// Looks up `T` by its own type.
    pub async fn resolve<T: Send + Sync + 'static>(&self, ctx: Option<Context>) -> Result<Arc<T>> {
        self.get(ComponentKey::of::<T>(), ctx).await?.downcast::<T>()
    }

    /// Looks up `key` and views the result as `T`.
    ///
    /// ```rust,ignore
    /// let logger: Arc<dyn Logger> = injector.resolve_as("Logger", None).await?;
    /// ```
    pub async fn resolve_as<T: ?Sized + 'static>(
        &self,
        key: impl Into<ComponentKey>,
        ctx: Option<Context>,
    ) -> Result<Arc<T>> {
        self.get(key, ctx).await?.downcast::<T>()
    }

    /// The full resolved registry.
    pub fn get_all(&self) -> &ResolvedRegistry {
        &self.registry
    }

    pub fn metadata(&self) -> &Arc<dyn MetadataStore> {
        &self.metadata
    }

    pub fn settings(&self) -> &InjectorSettings {
        &self.settings
    }

    /// Whether a unit with this name was bootstrapped successfully.
    pub fn is_bootstrapped(&self, unit: &str) -> bool {
        self.units.contains(unit)
    }

    // ── Phase 1: injectables ──

    /// Resolves one injectable and returns its effective scope.
    fn resolve_injectable<'a>(
        &'a mut self,
        decl: &'a InjectableDecl,
        available: &'a Availability<'a>,
        path: &'a mut ResolutionPath,
    ) -> BoxFuture<'a, Result<Scope>> {
        Box::pin(async move {
            let key = decl.key();
            if let Some(scope) = self.registry.scope_of(&key) {
                return Ok(scope);
            }

            path.enter(&key)?;
            trace!(key = %key, depth = path.depth(), "Resolving injectable");

            let target = decl.target();
            let concrete = target.type_key();
            let declared = descriptor::declared_scope(self.metadata.as_ref(), &concrete)?;
            let dependencies = descriptor::dependencies_of(self.metadata.as_ref(), &concrete)?;

            let mut scope = declared;
            for dependency in &dependencies {
                let inherited = self
                    .resolve_dependency(&concrete, dependency, available, path)
                    .await?;
                scope = scope.merge(inherited);
            }

            path.leave();

            if scope != declared {
                debug!(component = %concrete, "Request scope inherited from dependencies");
            }

            self.install(key, target, &dependencies, scope).await?;
            Ok(scope)
        })
    }

    /// Ensures one dependency is resolved and returns its effective scope.
    async fn resolve_dependency(
        &mut self,
        parent: &TypeKey,
        dependency: &Dependency,
        available: &Availability<'_>,
        path: &mut ResolutionPath,
    ) -> Result<Scope> {
        let key = dependency.effective_key();
        if let Some(scope) = self.registry.scope_of(&key) {
            return Ok(scope);
        }

        match available.get(&key) {
            Some(&decl) => self.resolve_injectable(decl, available, path).await,
            None => Err(missing(parent, dependency)),
        }
    }

    // ── Phase 2: consumers ──

    async fn resolve_consumer(&self, consumer: &Constructible) -> Result<()> {
        let concrete = consumer.type_key();
        let key = ComponentKey::Type(concrete);
        if self.registry.contains(&key) {
            return Ok(());
        }

        let dependencies = descriptor::dependencies_of(self.metadata.as_ref(), &concrete)?;

        let mut scope = Scope::Singleton;
        for dependency in &dependencies {
            let inherited = self
                .registry
                .scope_of(&dependency.effective_key())
                .ok_or_else(|| missing(&concrete, dependency))?;
            scope = scope.merge(inherited);
        }

        self.install(key, consumer, &dependencies, scope).await
    }

    // ── Shared ──

    /// Stores the factory for `key`: an eagerly built singleton, or a
    /// per-request factory.
    async fn install(
        &self,
        key: ComponentKey,
        target: &Constructible,
        dependencies: &[Dependency],
        scope: Scope,
    ) -> Result<()> {
        let keys: Vec<ComponentKey> = dependencies.iter().map(Dependency::effective_key).collect();
        let concrete = target.type_key();

        let factory = if scope.is_request() {
            registry::per_request(keys, target.build_fn())
        } else {
            let mut values = Vec::with_capacity(keys.len());
            for dependency in &keys {
                values.push(self.registry.get(dependency, None).await?);
            }
            let instance = target.build(Arguments::new(values), None).await?;
            registry::singleton(instance)
        };

        if self
            .registry
            .insert(Registration::new(key.clone(), concrete, scope, factory))
        {
            debug!(key = %key, concrete = %concrete, scope = %scope, "Registered component");
        }
        Ok(())
    }
}

fn missing(parent: &TypeKey, dependency: &Dependency) -> UlagichError {
    UlagichError::MissingDependency(MissingDependencyError {
        consumer: *parent,
        dependency: dependency.effective_key(),
        position: dependency.position,
    })
}

impl Default for Injector {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Injector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Injector")
            .field("resolved", &self.registry.len())
            .field("units", &self.units.len())
            .finish()
    }
}

// ═══════════════════════════════════════════
// Blocking helpers
// ═══════════════════════════════════════════

#[cfg(feature = "blocking")]
impl Injector {
    /// [`bootstrap`](Injector::bootstrap) on a throwaway current-thread
    /// runtime.
    ///
    /// # Errors
    /// [`UlagichError::BlockingInsideRuntime`] when called from inside an
    /// async runtime.
    pub fn bootstrap_blocking(&mut self, unit: &CompositionUnit) -> Result<()> {
        block_on(self.bootstrap(unit))?
    }

    /// [`get`](Injector::get) on a throwaway current-thread runtime.
    pub fn get_blocking(&self, key: impl Into<ComponentKey>, ctx: Option<Context>) -> Result<Instance> {
        block_on(self.get(key, ctx))?
    }
}

#[cfg(feature = "blocking")]
fn block_on<F: std::future::Future>(future: F) -> Result<F::Output> {
    if tokio::runtime::Handle::try_current().is_ok() {
        return Err(UlagichError::BlockingInsideRuntime);
    }

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(UlagichError::RuntimeUnavailable)?;
    Ok(runtime.block_on(future))
}

// ═══════════════════════════════════════════
// Prelude
// ═══════════════════════════════════════════

pub mod prelude {
    pub use super::{Injector, InjectorBuilder};
    pub use crate::context::{Context, RequestInitializable};
    pub use crate::declaration::{CompositionUnit, Constructible, Injectable, InjectableDecl};
    pub use crate::error::{BoxError, Result, UlagichError};
    pub use crate::instance::{Arguments, Capabilities, Instance};
    pub use crate::key::{ComponentKey, Token, TypeKey};
    pub use crate::metadata::{Annotations, InMemoryMetadata, MetadataStore};
    pub use crate::module::{Declarations, Module};
    pub use crate::scope::Scope;
    pub use crate::settings::InjectorSettings;
}

// ═══════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════
