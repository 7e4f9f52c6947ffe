//! Core injector implementation for Ulagich.

pub mod context;
pub mod declaration;
pub mod descriptor;
pub mod error;
pub(crate) mod graph;
pub mod injector;
pub mod instance;
pub mod key;
pub mod metadata;
pub mod module;
pub mod registry;
pub mod scope;
pub mod settings;

pub use context::{Context, RequestInitializable};
pub use declaration::{CompositionUnit, Constructible, Injectable, InjectableDecl};
pub use error::{BoxError, Result, UlagichError};
pub use injector::{Injector, InjectorBuilder, prelude};
pub use instance::{Arguments, Capabilities, Instance};
pub use key::{ComponentKey, Token, TypeKey};
pub use metadata::{Annotations, InMemoryMetadata, MetadataKey, MetadataStore, MetadataValue};
pub use module::{Declarations, Module};
pub use registry::{Registration, ResolvedRegistry};
pub use scope::Scope;
pub use settings::InjectorSettings;
