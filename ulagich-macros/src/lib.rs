//! Procedural macros for Ulagich.
//!
//! * `#[derive(Injectable)]` - constructor, annotations and capabilities
//!   for a struct whose injected fields are `Arc<T>`

use proc_macro::TokenStream;

mod injectable;

/// Derives `ulagich::Injectable`.
///
/// Every field is a constructor parameter, in declaration order, and must
/// be an `Arc<T>`. The dependency is declared as `T` unless the field
/// names a token.
///
/// ```ignore
/// #[derive(Injectable)]
/// #[injectable(scope = "request", on_request, expose = "dyn Auditor")]
/// struct UserHandler {
///     clock: Arc<Clock>,
///     #[inject(token = "Logger")]
///     logger: Arc<dyn Logger>,
///     #[inject(skip)]
///     hits: AtomicU64,
/// }
/// ```
///
/// # Struct attributes
///
/// - `scope = "singleton" | "request"` - declared scope (default singleton)
/// - `on_request` - run `RequestInitializable::on_request` on request instances
/// - `expose = "dyn Trait"` - injectable as `Arc<dyn Trait>`; repeatable
///
/// # Field attributes
///
/// - `token = "name"` - resolve the field through a token binding
/// - `skip` - not injected, initialized with `Default::default()`
#[proc_macro_derive(Injectable, attributes(injectable, inject))]
pub fn derive_injectable(input: TokenStream) -> TokenStream {
    injectable::derive_injectable(input)
}
