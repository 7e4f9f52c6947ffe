//! Derive macros for Ulagich.

pub use ulagich_macros::Injectable;
