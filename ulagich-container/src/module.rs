//! Modules — named groups of related declarations.
//!
//! # Examples
//! ```rust,ignore
//! struct UsersModule;
//!
//! impl Module for UsersModule {
//!     fn declare(&self, unit: &mut dyn Declarations) {
//!         unit.register_injectable(Constructible::of::<UserRepository>());
//!         unit.register_token("Logger".into(), Constructible::of::<ConsoleLogger>());
//!         unit.register_consumer(Constructible::of::<UserHandler>());
//!     }
//! }
//!
//! injector.bootstrap_module(&UsersModule).await?;
//! ```

use crate::declaration::Constructible;
use crate::key::Token;

/// A composition unit described in code.
///
/// Each module becomes one
/// [`CompositionUnit`](crate::declaration::CompositionUnit) named after
/// [`name`](Module::name); bootstrapping the same module twice is a no-op.
pub trait Module: Send + Sync {
    /// Declares injectables and consumers.
    fn declare(&self, unit: &mut dyn Declarations);

    /// Unit name, used for the bootstrap log line and idempotency.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

/// Sink that modules declare into.
pub trait Declarations {
    /// Declares `target` injectable under its own type.
    fn register_injectable(&mut self, target: Constructible);

    /// Declares `target` injectable under `token`.
    fn register_token(&mut self, token: Token, target: Constructible);

    /// Declares a consumer. Consumers receive dependencies but are never
    /// injected into others.
    fn register_consumer(&mut self, target: Constructible);
}
