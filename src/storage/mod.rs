//! File system storage management
//!
//! Handles path resolution, file deletion and directory listings.

pub mod operations;
pub mod validation;

pub use operations::{delete_file, list_target};
pub use validation::resolve_path;
