//! # Ulagich Support
//!
//! Shared helpers for the Ulagich injector crates.
//!
//! This crate provides:
//! - Text rendering for resolution diagnostics

pub mod rendering;
