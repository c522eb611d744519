//! Directory listing

use std::fs;
use std::io;
use std::time::SystemTime;

use log::{info, warn};

use crate::error::StorageError;
use crate::storage::path::{ResolvedPath, Root};
use crate::storage::results::{DirEntry, PARENT_ENTRY_NAME};

/// Lists the contents of a resolved directory, sorted by name
/// (case-sensitive, ascending).
///
/// When `dir` is not the root a synthetic `..` entry is prepended. Entry
/// names are not checked for safety here; that happens when a name is sent
/// back through [`Root::resolve`].
///
/// The directory flag follows symlinks so a link to a directory is browsable;
/// size and modification time describe the entry itself.
pub fn list_directory(root: &Root, dir: &ResolvedPath) -> Result<Vec<DirEntry>, StorageError> {
    let virtual_path = dir.relative().to_string();

    let metadata =
        fs::metadata(dir.path()).map_err(|e| StorageError::from_io(e, &virtual_path))?;
    if !metadata.is_dir() {
        return Err(StorageError::NotADirectory(virtual_path));
    }

    let mut entries = Vec::new();
    for entry in fs::read_dir(dir.path()).map_err(|e| StorageError::from_io(e, &virtual_path))? {
        let entry = entry?;
        let path = entry.path();

        let own = match fs::symlink_metadata(&path) {
            Ok(m) => m,
            // removed between read_dir and stat
            Err(e) if e.kind() == io::ErrorKind::NotFound => continue,
            Err(e) => return Err(StorageError::Io(e)),
        };
        // dangling, looping or otherwise unfollowable links are plain entries
        let is_directory = fs::metadata(&path).is_ok_and(|target| target.is_dir());

        let name = match entry.file_name().into_string() {
            Ok(name) => name,
            Err(raw) => {
                warn!("Skipping non UTF-8 entry {:?} in /{}", raw, virtual_path);
                continue;
            }
        };

        entries.push(DirEntry {
            name,
            is_directory,
            size: own.len(),
            modified_at: own.modified().unwrap_or(SystemTime::UNIX_EPOCH),
        });
    }

    entries.sort_by(|a, b| a.name.cmp(&b.name));

    if !root.is_root(dir) {
        let parent = dir.path().parent().unwrap_or(root.path());
        let parent_meta = fs::symlink_metadata(parent)?;
        entries.insert(
            0,
            DirEntry {
                name: PARENT_ENTRY_NAME.to_string(),
                is_directory: true,
                size: parent_meta.len(),
                modified_at: parent_meta.modified().unwrap_or(SystemTime::UNIX_EPOCH),
            },
        );
    }

    info!(
        "Listed directory /{} (real: {}) - {} entries",
        virtual_path,
        dir.path().display(),
        entries.len()
    );

    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn setup() -> (TempDir, Root) {
        let temp = TempDir::new().unwrap();
        let base = temp.path();
        fs::create_dir_all(base.join("empty")).unwrap();
        fs::create_dir_all(base.join("beta")).unwrap();
        fs::write(base.join("alpha.txt"), b"12345").unwrap();
        fs::write(base.join("Zulu.txt"), b"z").unwrap();
        let root = Root::new(base).unwrap();
        (temp, root)
    }

    #[test]
    fn test_root_listing_sorted_without_parent() {
        let (_temp, root) = setup();
        let dir = root.resolve("").unwrap();
        let entries = list_directory(&root, &dir).unwrap();
        let names: Vec<&str> = entries.iter().map(|e| e.name.as_str()).collect();
        // case-sensitive: uppercase sorts first
        assert_eq!(names, vec!["Zulu.txt", "alpha.txt", "beta", "empty"]);

        let alpha = &entries[1];
        assert!(!alpha.is_directory);
        assert_eq!(alpha.size, 5);
        assert!(entries[2].is_directory);
    }

    #[test]
    fn test_empty_subdirectory_has_only_parent_entry() {
        let (_temp, root) = setup();
        let dir = root.resolve("empty").unwrap();
        let entries = list_directory(&root, &dir).unwrap();
        assert_eq!(entries.len(), 1);
        assert!(entries[0].is_parent());
        assert!(entries[0].is_directory);
    }

    #[test]
    fn test_empty_root_is_empty() {
        let temp = TempDir::new().unwrap();
        let root = Root::new(temp.path()).unwrap();
        let dir = root.resolve(".").unwrap();
        assert!(list_directory(&root, &dir).unwrap().is_empty());
    }

    #[test]
    fn test_listing_a_file_is_not_a_directory() {
        let (_temp, root) = setup();
        let file = root.resolve("alpha.txt").unwrap();
        assert!(matches!(
            list_directory(&root, &file),
            Err(StorageError::NotADirectory(_))
        ));
    }

    #[test]
    fn test_listing_missing_directory_is_not_found() {
        let (_temp, root) = setup();
        let missing = root.resolve("nope").unwrap();
        assert!(matches!(
            list_directory(&root, &missing),
            Err(StorageError::NotFound(_))
        ));
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinked_directory_is_flagged_as_directory() {
        use std::os::unix::fs::symlink;

        let (_temp, root) = setup();
        symlink(root.path().join("beta"), root.path().join("link")).unwrap();
        symlink(root.path().join("ghost"), root.path().join("dangling")).unwrap();

        let dir = root.resolve("").unwrap();
        let entries = list_directory(&root, &dir).unwrap();
        let link = entries.iter().find(|e| e.name == "link").unwrap();
        assert!(link.is_directory);
        let dangling = entries.iter().find(|e| e.name == "dangling").unwrap();
        assert!(!dangling.is_directory);
    }

    #[cfg(unix)]
    #[test]
    fn test_unfollowable_links_do_not_break_listing() {
        use std::os::unix::fs::symlink;

        let (_temp, root) = setup();
        symlink(root.path().join("loop"), root.path().join("loop")).unwrap();
        symlink(root.path().join("alpha.txt/x"), root.path().join("bad")).unwrap();

        let dir = root.resolve("").unwrap();
        let entries = list_directory(&root, &dir).unwrap();
        for name in ["loop", "bad"] {
            let entry = entries.iter().find(|e| e.name == name).unwrap();
            assert!(!entry.is_directory, "entry {name}");
        }
        assert!(entries.iter().any(|e| e.name == "alpha.txt"));
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_non_utf8_names_are_skipped() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let (_temp, root) = setup();
        fs::write(root.path().join(OsStr::from_bytes(b"bad\xffname")), b"x").unwrap();

        let dir = root.resolve("").unwrap();
        let entries = list_directory(&root, &dir).unwrap();
        let names: Vec<&str> = entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["Zulu.txt", "alpha.txt", "beta", "empty"]);
    }
}
