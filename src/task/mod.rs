//! Build orchestration primitives.
//!
//! - [`TaskGraph`]: tasks and their `requires` / `after` edges
//! - [`execute`]: runs a graph through a [`TaskRunner`]
//! - [`TaskError`]: per-task failure, classified by [`ErrorClass`]

mod error;
mod executor;
mod graph;

pub use error::{ErrorClass, TaskError};
pub use executor::{BuildReport, TaskOutcome, TaskReport, TaskRunner, execute};
pub use graph::{Edge, GraphError, TaskGraph, TaskId};
