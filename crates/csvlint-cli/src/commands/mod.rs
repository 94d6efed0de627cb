//! CLI command implementations.

pub mod classify;
pub mod links;
pub mod validate;
