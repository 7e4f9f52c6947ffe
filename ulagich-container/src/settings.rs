//! Injector settings.

use serde::{Deserialize, Serialize};

/// Tunables of an [`Injector`](crate::injector::Injector).
///
/// Deserializable from any serde format; missing fields take their
/// defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InjectorSettings {
    /// Upper bound on "did you mean?" suggestions for unresolved keys.
    pub max_suggestions: usize,
    /// Log the per-unit bootstrap line at info level instead of debug.
    pub announce_units: bool,
}

impl Default for InjectorSettings {
    fn default() -> Self {
        Self {
            max_suggestions: 3,
            announce_units: true,
        }
    }
}
