//! Storage result types
//!
//! Defines result structures returned by storage operations.

use std::path::PathBuf;
use std::time::SystemTime;

/// Name of the synthetic "go up one level" entry.
pub const PARENT_ENTRY_NAME: &str = "..";

/// One row of a directory listing, read from filesystem metadata at
/// listing time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    pub name: String,
    pub is_directory: bool,
    pub size: u64,
    pub modified_at: SystemTime,
}

impl DirEntry {
    pub fn is_parent(&self) -> bool {
        self.name == PARENT_ENTRY_NAME
    }
}

/// A file ready to be streamed back to a client.
#[derive(Debug, Clone)]
pub struct DownloadTarget {
    pub file_path: PathBuf,
    pub size: u64,
    pub modified_at: Option<SystemTime>,
}
