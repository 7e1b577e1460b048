//! Command implementations
//!
//! Each module backs one binary.

pub mod archive;
pub mod init_session;

pub use archive::{run as archive_run, ArchiveArgs};
