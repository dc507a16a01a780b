//! Local implementations for `relevel`.
//!
//! The pipeline stages live in their own modules and compose left to right:
//! `select` -> `normalize` -> `client` -> `mapper`, with `snapshot` consulted
//! before the mapper runs and restored wholesale on reset. `session` owns the
//! composition and the single "rewritten" flag.

pub mod client;
pub mod dom;
pub mod mapper;
pub mod normalize;
pub mod select;
pub mod session;
pub mod snapshot;
