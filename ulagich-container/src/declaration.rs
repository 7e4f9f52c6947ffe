//! Injectable and consumer declarations.
//!
//! A [`CompositionUnit`] bundles what one `bootstrap` call processes:
//! injectable declarations (plain or token-bound) and consumers. Each
//! declared type is carried as a [`Constructible`], the type-erased
//! constructor plus the annotations replayed into the metadata store.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;

use crate::context::Context;
use crate::error::{BoxError, Result, UlagichError};
use crate::instance::{Arguments, Capabilities, Instance};
use crate::key::{ComponentKey, Token, TypeKey};
use crate::metadata::{Annotations, MetadataStore};
use crate::module::{Declarations, Module};
use crate::registry::BoxFuture;

/// Builds an instance from resolved arguments, running the request hook
/// when a context is given.
pub(crate) type BuildFn =
    Arc<dyn Fn(Arguments, Option<Context>) -> BoxFuture<'static, Result<Instance>> + Send + Sync>;

/// A type the injector can construct.
///
/// Usually derived with `#[derive(Injectable)]`.
///
/// ```rust,ignore
/// struct Greeter {
///     logger: Arc<dyn Logger>,
/// }
///
/// #[async_trait]
/// impl Injectable for Greeter {
///     fn annotate(meta: &mut Annotations) {
///         meta.param_token::<dyn Logger>("Logger");
///     }
///
///     async fn construct(mut args: Arguments) -> Result<Self, BoxError> {
///         Ok(Greeter { logger: args.take::<dyn Logger>()? })
///     }
/// }
/// ```
#[async_trait]
pub trait Injectable: Sized + Send + Sync + 'static {
    /// Records constructor parameters, tokens and scope.
    fn annotate(_meta: &mut Annotations) {}

    /// Registers exposed views and the request hook.
    fn capabilities(_caps: &mut Capabilities<Self>) {}

    /// Builds the value from its resolved constructor arguments.
    async fn construct(args: Arguments) -> std::result::Result<Self, BoxError>;
}

/// Type-erased constructible type.
#[derive(Clone)]
pub struct Constructible {
    key: TypeKey,
    annotations: Annotations,
    build: BuildFn,
    request_hook: bool,
}

impl Constructible {
    /// Constructible for an [`Injectable`] type.
    pub fn of<T: Injectable>() -> Self {
        let mut annotations = Annotations::new();
        T::annotate(&mut annotations);

        let mut caps = Capabilities::<T>::new();
        T::capabilities(&mut caps);

        Self::assemble(annotations, caps, |args: Arguments| T::construct(args))
    }

    /// Constructible from a plain constructor closure.
    ///
    /// Its metadata comes from the store, or from
    /// [`annotated`](Constructible::annotated).
    pub fn from_fn<T, F, Fut>(constructor: F) -> Self
    where
        T: Send + Sync + 'static,
        F: Fn(Arguments) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = std::result::Result<T, BoxError>> + Send + 'static,
    {
        Self::assemble(Annotations::new(), Capabilities::new(), constructor)
    }

    /// Like [`from_fn`](Constructible::from_fn), with explicit capabilities.
    pub fn with_capabilities<T, F, Fut>(caps: Capabilities<T>, constructor: F) -> Self
    where
        T: Send + Sync + 'static,
        F: Fn(Arguments) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = std::result::Result<T, BoxError>> + Send + 'static,
    {
        Self::assemble(Annotations::new(), caps, constructor)
    }

    /// Adds annotations replayed into the metadata store at bootstrap.
    pub fn annotated(mut self, annotate: impl FnOnce(&mut Annotations)) -> Self {
        annotate(&mut self.annotations);
        self
    }

    fn assemble<T, F, Fut>(annotations: Annotations, caps: Capabilities<T>, constructor: F) -> Self
    where
        T: Send + Sync + 'static,
        F: Fn(Arguments) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = std::result::Result<T, BoxError>> + Send + 'static,
    {
        let key = TypeKey::of::<T>();
        let (views, hook) = caps.into_parts();
        let request_hook = hook.is_some();
        let constructor = Arc::new(constructor);

        let build: BuildFn = Arc::new(
            move |args: Arguments, ctx: Option<Context>| -> BoxFuture<'static, Result<Instance>> {
                let constructor = constructor.clone();
                let views = views.clone();
                let hook = hook.clone();

                Box::pin(async move {
                    let mut value = constructor(args)
                        .await
                        .map_err(|source| UlagichError::ConstructionFailed { key, source })?;

                    if let (Some(hook), Some(ctx)) = (hook, ctx) {
                        value = hook(value, ctx)
                            .await
                            .map_err(|source| UlagichError::RequestHookFailed { key, source })?;
                    }

                    Ok(Instance::new(value, views))
                })
            },
        );

        Self {
            key,
            annotations,
            build,
            request_hook,
        }
    }

    pub fn type_key(&self) -> TypeKey {
        self.key
    }

    /// Whether instances run a request hook.
    pub fn has_request_hook(&self) -> bool {
        self.request_hook
    }

    pub(crate) fn build_fn(&self) -> BuildFn {
        self.build.clone()
    }

    pub(crate) async fn build(&self, args: Arguments, ctx: Option<Context>) -> Result<Instance> {
        (self.build)(args, ctx).await
    }

    pub(crate) fn annotate_into(&self, store: &dyn MetadataStore) {
        if !self.annotations.is_empty() {
            self.annotations.apply(store, &self.key);
        }
    }
}

impl fmt::Debug for Constructible {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Constructible")
            .field("key", &self.key)
            .field("annotations", &self.annotations)
            .field("request_hook", &self.request_hook)
            .finish()
    }
}

/// An injectable declaration.
#[derive(Debug, Clone)]
pub enum InjectableDecl {
    /// Resolved under its own type.
    Direct(Constructible),
    /// Resolved under `token`, constructing `target`.
    TokenBound { token: Token, target: Constructible },
}

impl InjectableDecl {
    /// Registry key of the declaration.
    pub fn key(&self) -> ComponentKey {
        match self {
            Self::Direct(target) => ComponentKey::Type(target.type_key()),
            Self::TokenBound { token, .. } => ComponentKey::Token(token.clone()),
        }
    }

    /// The type actually constructed.
    pub fn target(&self) -> &Constructible {
        match self {
            Self::Direct(target) | Self::TokenBound { target, .. } => target,
        }
    }
}

/// Declarations processed together by one `bootstrap` call.
///
/// ```rust,ignore
/// let unit = CompositionUnit::new("users")
///     .provide::<Clock>()
///     .bind::<ConsoleLogger>("Logger")
///     .consumer::<UserHandler>();
/// ```
#[derive(Debug, Clone)]
pub struct CompositionUnit {
    name: String,
    injectables: Vec<InjectableDecl>,
    consumers: Vec<Constructible>,
}

impl CompositionUnit {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            injectables: Vec::new(),
            consumers: Vec::new(),
        }
    }

    /// Collects the declarations of a [`Module`].
    pub fn from_module(module: &dyn Module) -> Self {
        let mut unit = Self::new(module.name());
        module.declare(&mut unit);
        unit
    }

    /// Declares `T` injectable under its own type.
    pub fn provide<T: Injectable>(mut self) -> Self {
        self.register_injectable(Constructible::of::<T>());
        self
    }

    /// Declares `T` injectable under `token`.
    pub fn bind<T: Injectable>(mut self, token: impl Into<Token>) -> Self {
        self.register_token(token.into(), Constructible::of::<T>());
        self
    }

    /// Declares `T` as a consumer.
    pub fn consumer<T: Injectable>(mut self) -> Self {
        self.register_consumer(Constructible::of::<T>());
        self
    }

    /// Adds an already built declaration.
    pub fn with(mut self, declaration: InjectableDecl) -> Self {
        self.injectables.push(declaration);
        self
    }

    /// Adds an already built consumer.
    pub fn with_consumer(mut self, consumer: Constructible) -> Self {
        self.consumers.push(consumer);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn injectables(&self) -> &[InjectableDecl] {
        &self.injectables
    }

    pub fn consumers(&self) -> &[Constructible] {
        &self.consumers
    }

    /// Replays every declared type's annotations into `store`.
    pub(crate) fn annotate(&self, store: &dyn MetadataStore) {
        for decl in &self.injectables {
            decl.target().annotate_into(store);
        }
        for consumer in &self.consumers {
            consumer.annotate_into(store);
        }
    }
}

impl Declarations for CompositionUnit {
    fn register_injectable(&mut self, target: Constructible) {
        self.injectables.push(InjectableDecl::Direct(target));
    }

    fn register_token(&mut self, token: Token, target: Constructible) {
        self.injectables.push(InjectableDecl::TokenBound { token, target });
    }

    fn register_consumer(&mut self, target: Constructible) {
        self.consumers.push(target);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::{InMemoryMetadata, MetadataKey, MetadataValue};
    use crate::scope::Scope;

    struct Clock;

    #[async_trait]
    impl Injectable for Clock {
        async fn construct(_args: Arguments) -> std::result::Result<Self, BoxError> {
            Ok(Clock)
        }
    }

    struct Session;

    #[async_trait]
    impl Injectable for Session {
        fn annotate(meta: &mut Annotations) {
            meta.param::<Clock>().scope(Scope::Request);
        }

        async fn construct(_args: Arguments) -> std::result::Result<Self, BoxError> {
            Ok(Session)
        }
    }

    #[test]
    fn declaration_keys() {
        let direct = InjectableDecl::Direct(Constructible::of::<Clock>());
        assert_eq!(direct.key(), ComponentKey::of::<Clock>());

        let bound = InjectableDecl::TokenBound {
            token: Token::new("Clock"),
            target: Constructible::of::<Clock>(),
        };
        assert_eq!(bound.key(), ComponentKey::token("Clock"));
        assert_eq!(bound.target().type_key(), TypeKey::of::<Clock>());
    }

    #[test]
    fn unit_builder_keeps_order() {
        let unit = CompositionUnit::new("app")
            .provide::<Clock>()
            .bind::<Clock>("Clock")
            .consumer::<Session>();

        assert_eq!(unit.name(), "app");
        assert_eq!(unit.injectables().len(), 2);
        assert!(matches!(unit.injectables()[0], InjectableDecl::Direct(_)));
        assert!(matches!(unit.injectables()[1], InjectableDecl::TokenBound { .. }));
        assert_eq!(unit.consumers()[0].type_key(), TypeKey::of::<Session>());
    }

    #[test]
    fn annotations_replayed_into_store() {
        let store = InMemoryMetadata::new();
        CompositionUnit::new("app")
            .provide::<Clock>()
            .provide::<Session>()
            .annotate(&store);

        let target = TypeKey::of::<Session>();
        assert_eq!(
            store.get_metadata(MetadataKey::Scope, &target),
            Some(MetadataValue::Scope(Scope::Request)),
        );
        // Clock declares nothing
        assert_eq!(store.len(), 2);
    }

    #[tokio::test]
    async fn from_fn_builds_instances() {
        let constructible = Constructible::from_fn(|_args| async { Ok::<_, BoxError>(42u32) });
        let instance = constructible.build(Arguments::default(), None).await.unwrap();
        assert_eq!(*instance.downcast::<u32>().unwrap(), 42);
    }

    trait Named: Send + Sync {
        fn name(&self) -> &'static str;
    }

    impl Named for Clock {
        fn name(&self) -> &'static str {
            "clock"
        }
    }

    struct Stamp;

    #[async_trait]
    impl crate::context::RequestInitializable for Stamp {
        async fn on_request(&mut self, _ctx: &Context) -> std::result::Result<(), BoxError> {
            Err("stamp rejected".into())
        }
    }

    #[tokio::test]
    async fn explicit_capabilities_expose_views() {
        let mut caps = Capabilities::<Clock>::new();
        caps.expose::<dyn Named>(|this| this);

        let constructible = Constructible::with_capabilities(caps, |_args| async { Ok::<_, BoxError>(Clock) });
        assert!(!constructible.has_request_hook());

        let instance = constructible.build(Arguments::default(), None).await.unwrap();
        assert_eq!(instance.downcast::<dyn Named>().unwrap().name(), "clock");
    }

    #[tokio::test]
    async fn request_hook_runs_only_with_context() {
        let mut caps = Capabilities::<Stamp>::new();
        caps.request_initializable();

        let constructible = Constructible::with_capabilities(caps, |_args| async { Ok::<_, BoxError>(Stamp) });
        assert!(constructible.has_request_hook());

        assert!(constructible.build(Arguments::default(), None).await.is_ok());
        assert!(matches!(
            constructible
                .build(Arguments::default(), Some(Context::new(1u8)))
                .await,
            Err(UlagichError::RequestHookFailed { .. })
        ));
    }

    #[tokio::test]
    async fn constructor_error_is_wrapped() {
        let constructible =
            Constructible::from_fn(|_args| async { Err::<u32, BoxError>("disk on fire".into()) });

        match constructible.build(Arguments::default(), None).await {
            Err(UlagichError::ConstructionFailed { key, source }) => {
                assert_eq!(key, TypeKey::of::<u32>());
                assert_eq!(source.to_string(), "disk on fire");
            }
            other => panic!("Expected ConstructionFailed, got: {other:?}"),
        }
    }
}
