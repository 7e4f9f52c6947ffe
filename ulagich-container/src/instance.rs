//! Type-erased component instances and constructor arguments.
//!
//! An [`Instance`] is a shared `Arc<dyn Any>` plus a table of views. Every
//! instance can be viewed as its concrete type; additional trait-object
//! views are registered through [`Capabilities::expose`].

use std::any::{Any, TypeId, type_name};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::context::{Context, RequestInitializable};
use crate::error::{BoxError, Result, TypeMismatchError, UlagichError};
use crate::key::TypeKey;
use crate::registry::BoxFuture;

type ErasedValue = Arc<dyn Any + Send + Sync>;

/// Produces a boxed `Arc<U>` view of an erased value.
type ViewFn = Arc<dyn Fn(&ErasedValue) -> Option<Box<dyn Any + Send + Sync>> + Send + Sync>;

pub(crate) type ViewTable = Arc<HashMap<TypeId, ViewFn>>;

/// Runs the per-request hook on a freshly built value.
pub(crate) type RequestHook<T> =
    Arc<dyn Fn(T, Context) -> BoxFuture<'static, std::result::Result<T, BoxError>> + Send + Sync>;

/// A resolved component value.
///
/// Cloning is cheap and preserves identity.
#[derive(Clone)]
pub struct Instance {
    value: ErasedValue,
    concrete: TypeKey,
    views: ViewTable,
}

impl Instance {
    pub(crate) fn new<T: Send + Sync + 'static>(value: T, views: ViewTable) -> Self {
        Self {
            value: Arc::new(value),
            concrete: TypeKey::of::<T>(),
            views,
        }
    }

    /// The concrete type that was constructed.
    pub fn concrete_type(&self) -> TypeKey {
        self.concrete
    }

    /// Views this instance as `T`: its concrete type or an exposed trait
    /// object.
    ///
    /// # Errors
    /// [`UlagichError::TypeMismatch`] if no such view exists.
    pub fn downcast<T: ?Sized + 'static>(&self) -> Result<Arc<T>> {
        self.view::<T>().ok_or_else(|| {
            UlagichError::TypeMismatch(TypeMismatchError {
                expected: type_name::<T>(),
                found: self.concrete,
                position: None,
            })
        })
    }

    fn view<T: ?Sized + 'static>(&self) -> Option<Arc<T>> {
        let view = self.views.get(&TypeId::of::<T>())?;
        view(&self.value)?.downcast::<Arc<T>>().ok().map(|boxed| *boxed)
    }

    /// Whether both handles point at the same value.
    pub fn ptr_eq(&self, other: &Instance) -> bool {
        Arc::ptr_eq(&self.value, &other.value)
    }
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Instance")
            .field("concrete", &self.concrete)
            .field("views", &self.views.len())
            .finish()
    }
}

/// Optional capabilities of a constructible type `T`.
///
/// ```
/// use std::sync::Arc;
/// use ulagich_container::instance::Capabilities;
///
/// trait Logger: Send + Sync {}
/// struct ConsoleLogger;
/// impl Logger for ConsoleLogger {}
///
/// let mut caps = Capabilities::<ConsoleLogger>::new();
/// caps.expose::<dyn Logger>(|this| this);
/// ```
pub struct Capabilities<T> {
    views: HashMap<TypeId, ViewFn>,
    hook: Option<RequestHook<T>>,
}

impl<T: Send + Sync + 'static> Capabilities<T> {
    /// Capabilities with only the concrete view of `T`.
    pub fn new() -> Self {
        let identity: ViewFn = Arc::new(|value: &ErasedValue| {
            value
                .clone()
                .downcast::<T>()
                .ok()
                .map(|concrete| Box::new(concrete) as Box<dyn Any + Send + Sync>)
        });

        let mut views = HashMap::new();
        views.insert(TypeId::of::<T>(), identity);
        Self { views, hook: None }
    }

    /// Lets instances of `T` be injected as `Arc<U>`.
    pub fn expose<U: ?Sized + Send + Sync + 'static>(&mut self, cast: fn(Arc<T>) -> Arc<U>) -> &mut Self {
        let view: ViewFn = Arc::new(move |value: &ErasedValue| {
            value
                .clone()
                .downcast::<T>()
                .ok()
                .map(|concrete| Box::new(cast(concrete)) as Box<dyn Any + Send + Sync>)
        });
        self.views.insert(TypeId::of::<U>(), view);
        self
    }

    /// Runs [`RequestInitializable::on_request`] on every request-scoped
    /// instance of `T` built with a context.
    pub fn request_initializable(&mut self) -> &mut Self
    where
        T: RequestInitializable,
    {
        let hook: RequestHook<T> = Arc::new(
            |mut value: T, ctx: Context| -> BoxFuture<'static, std::result::Result<T, BoxError>> {
                Box::pin(async move {
                    value.on_request(&ctx).await?;
                    Ok(value)
                })
            },
        );
        self.hook = Some(hook);
        self
    }

    pub fn has_request_hook(&self) -> bool {
        self.hook.is_some()
    }

    pub(crate) fn into_parts(self) -> (ViewTable, Option<RequestHook<T>>) {
        (Arc::new(self.views), self.hook)
    }
}

impl<T: Send + Sync + 'static> Default for Capabilities<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Resolved constructor arguments in declaration order.
///
/// ```rust,ignore
/// async fn construct(mut args: Arguments) -> Result<Self, BoxError> {
///     Ok(Greeter {
///         logger: args.take::<dyn Logger>()?,
///         clock: args.take::<Clock>()?,
///     })
/// }
/// ```
#[derive(Debug, Default)]
pub struct Arguments {
    values: Vec<Instance>,
    cursor: usize,
}

impl Arguments {
    pub fn new(values: Vec<Instance>) -> Self {
        Self { values, cursor: 0 }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// The raw instance at `position`.
    pub fn instance(&self, position: usize) -> Option<&Instance> {
        self.values.get(position)
    }

    /// The argument at `position`, viewed as `T`.
    pub fn get<T: ?Sized + 'static>(&self, position: usize) -> Result<Arc<T>> {
        let instance = self.values.get(position).ok_or(UlagichError::MissingArgument {
            position,
            available: self.values.len(),
        })?;

        instance.downcast::<T>().map_err(|err| match err {
            UlagichError::TypeMismatch(mismatch) => UlagichError::TypeMismatch(TypeMismatchError {
                position: Some(position),
                ..mismatch
            }),
            other => other,
        })
    }

    /// The next argument in declaration order, viewed as `T`.
    pub fn take<T: ?Sized + 'static>(&mut self) -> Result<Arc<T>> {
        let value = self.get::<T>(self.cursor)?;
        self.cursor += 1;
        Ok(value)
    }
}
