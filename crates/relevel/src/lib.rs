//! Public facade crate for `relevel`.
//!
//! This crate intentionally contains no IO or provider-specific logic.
//! It re-exports the backend-agnostic types/traits from `relevel-core`.

pub use relevel_core::*;
