//! Shared helpers without pipeline semantics.

pub mod mime;
pub mod path;
