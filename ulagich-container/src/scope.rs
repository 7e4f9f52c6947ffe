//! Component lifecycle scopes.
//!
//! - [`Scope::Singleton`] — one instance for the process lifetime
//! - [`Scope::Request`] — a fresh instance per external request context
//!
//! # Ordering
//! Scopes are ordered by volatility: `Singleton < Request`. A component's
//! effective scope is the [`merge`](Scope::merge) of its declared scope and
//! the effective scopes of everything it depends on.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Lifecycle policy of a resolved component.
///
/// # Examples
/// ```
/// use ulagich_container::scope::Scope;
///
/// assert_eq!(Scope::default(), Scope::Singleton);
/// assert_eq!(Scope::Singleton.merge(Scope::Request), Scope::Request);
/// ```
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    /// Constructed once at bootstrap and shared by every lookup.
    #[default]
    Singleton,

    /// Constructed again on every lookup, with the request context threaded
    /// through to its own request-scoped dependencies.
    Request,
}

impl Scope {
    /// The more volatile of the two scopes.
    #[inline]
    pub fn merge(self, other: Scope) -> Scope {
        self.max(other)
    }

    #[inline]
    pub fn is_request(&self) -> bool {
        matches!(self, Scope::Request)
    }

    #[inline]
    pub fn is_singleton(&self) -> bool {
        matches!(self, Scope::Singleton)
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::Singleton => write!(f, "Singleton"),
            Scope::Request => write!(f, "Request"),
        }
    }
}
