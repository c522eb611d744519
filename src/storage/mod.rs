//! File system storage management
//!
//! Handles path resolution, directory listing and file operations, all
//! confined to the server root.

pub mod listing;
pub mod operations;
pub mod path;
pub mod results;

pub use listing::list_directory;
pub use operations::{prepare_download, remove_path, upload_file};
pub use path::{PathSegment, RelativePath, ResolvedPath, Root};
pub use results::{DirEntry, DownloadTarget};
