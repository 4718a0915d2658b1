//! Utility modules for project_store
//!
//! Timestamp handling and filesystem path relocation shared by the record
//! types.

pub mod datetime;
pub mod path;

// Re-export commonly used items
pub use datetime::{RecordDateTime, RecordDateTimeExt, chrono};
pub use path::relocate_path;
