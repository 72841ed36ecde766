//! Navigate module
//!
//! Handles working directory changes for a session.

mod operations;

pub use operations::change_directory;
