//! External request context and the per-request lifecycle hook.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::BoxError;

/// Opaque handle of one external request.
///
/// The injector threads it unmodified through every request-scoped factory
/// and only hands it to [`RequestInitializable::on_request`].
///
/// ```
/// use ulagich_container::context::Context;
///
/// struct HttpRequest { path: &'static str }
///
/// let ctx = Context::new(HttpRequest { path: "/users" });
/// assert_eq!(ctx.downcast_ref::<HttpRequest>().map(|r| r.path), Some("/users"));
/// assert!(ctx.downcast_ref::<String>().is_none());
/// ```
#[derive(Clone)]
pub struct Context(Arc<dyn Any + Send + Sync>);

impl Context {
    pub fn new<T: Send + Sync + 'static>(value: T) -> Self {
        Self(Arc::new(value))
    }

    pub fn from_arc(value: Arc<dyn Any + Send + Sync>) -> Self {
        Self(value)
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.0.downcast_ref::<T>()
    }

    /// Whether both handles refer to the same request.
    pub fn ptr_eq(&self, other: &Context) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context").finish_non_exhaustive()
    }
}

/// Capability of request-scoped components that initialize themselves from
/// the request context.
///
/// Register it with
/// [`Capabilities::request_initializable`](crate::instance::Capabilities::request_initializable).
/// The hook runs once on every freshly built instance, before it is handed
/// out, and only when the lookup supplied a context. A failing hook fails
/// the lookup; it is not retried.
#[async_trait]
pub trait RequestInitializable: Send + Sync + 'static {
    async fn on_request(&mut self, ctx: &Context) -> Result<(), BoxError>;
}
