//! Path utilities.
//!
//! Pure functions for path manipulation. No side effects.
//!
//! - [`fs`]: Filesystem path normalization (`normalize_path`, `clean_path`, `relative_path`)
//! - [`pattern`]: Glob patterns anchored at the project root (`resolve_pattern`, `pattern_base`)

pub mod fs;
pub mod pattern;

pub use fs::{normalize_path, relative_path};
pub use pattern::{pattern_base, resolve_pattern};
