//! # Ulagich — dependency resolution for Rust
//!
//! Declare injectables and consumers in composition units, bootstrap them
//! into an [`Injector`], and look components up by type or by token.
//! Singletons are built once at bootstrap; request-scoped components are
//! rebuilt on every lookup, and anything depending on them becomes
//! request-scoped too.
//!
//! ```rust
//! use std::sync::Arc;
//! use ulagich::prelude::*;
//!
//! trait Logger: Send + Sync {
//!     fn log(&self, msg: &str) -> String;
//! }
//!
//! #[derive(Injectable)]
//! #[injectable(expose = "dyn Logger")]
//! struct ConsoleLogger;
//!
//! impl Logger for ConsoleLogger {
//!     fn log(&self, msg: &str) -> String {
//!         format!("[console] {msg}")
//!     }
//! }
//!
//! #[derive(Injectable)]
//! struct UserHandler {
//!     #[inject(token = "Logger")]
//!     logger: Arc<dyn Logger>,
//! }
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let unit = CompositionUnit::new("users")
//!     .bind::<ConsoleLogger>("Logger")
//!     .consumer::<UserHandler>();
//!
//! let mut injector = Injector::new();
//! injector.bootstrap(&unit).await.expect("bootstrap failed");
//!
//! let handler = injector.resolve::<UserHandler>(None).await.expect("lookup failed");
//! assert_eq!(handler.logger.log("hi"), "[console] hi");
//! # });
//! ```

pub use async_trait::async_trait;
pub use ulagich_container::*;
pub use ulagich_derive::*;
pub use ulagich_support as support;

pub mod prelude {
    pub use ulagich_container::prelude::*;
    pub use ulagich_derive::Injectable;
}
