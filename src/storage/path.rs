//! Path resolution
//!
//! Turns untrusted, request-supplied relative paths into canonical absolute
//! paths that are guaranteed to lie inside the configured server root.
//!
//! Resolution happens in two stages:
//!
//! 1. [`RelativePath::parse`] normalises the raw string lexically. Both `/`
//!    and `\` separate segments, empty and `.` segments vanish, and `..`
//!    pops the previous segment. A `..` with nothing left to pop is an
//!    escape attempt and is rejected outright rather than clamped.
//! 2. [`Root::resolve`] walks the clean segments against the real
//!    filesystem, canonicalising every symlink it meets and checking the
//!    result against the canonical root at each step.
//!
//! [`ResolvedPath`] values can only be produced by this module.

use std::fmt;
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

use log::{debug, warn};

use crate::error::StorageError;

/// A single path component: never empty, never `.` or `..`, no separators.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathSegment(String);

impl PathSegment {
    /// Validates one segment. Rejections are reported as `OutsideRoot`
    /// since a segment the host would not treat as a plain name can change
    /// where a joined path points.
    pub fn new(segment: &str) -> Result<Self, StorageError> {
        if segment.is_empty() || segment == "." || segment == ".." {
            return Err(StorageError::OutsideRoot(segment.to_string()));
        }
        if segment.contains(['/', '\\', '\0']) {
            return Err(StorageError::OutsideRoot(segment.to_string()));
        }
        // Catches drive prefixes and the like on hosts that have them.
        let mut components = Path::new(segment).components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(name)), None) if name == segment => {
                Ok(Self(segment.to_string()))
            }
            _ => Err(StorageError::OutsideRoot(segment.to_string())),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A lexically normalised path below the root. Empty means the root itself.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RelativePath {
    segments: Vec<PathSegment>,
}

impl RelativePath {
    /// The root itself.
    pub fn root() -> Self {
        Self::default()
    }

    /// Parses and normalises an untrusted path string.
    pub fn parse(raw: &str) -> Result<Self, StorageError> {
        let mut segments: Vec<PathSegment> = Vec::new();

        for piece in raw.split(['/', '\\']) {
            match piece {
                "" | "." => continue,
                ".." => {
                    if segments.pop().is_none() {
                        return Err(StorageError::OutsideRoot(raw.to_string()));
                    }
                }
                name => segments.push(
                    PathSegment::new(name)
                        .map_err(|_| StorageError::OutsideRoot(raw.to_string()))?,
                ),
            }
        }

        Ok(Self { segments })
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// Returns this path with one more segment appended.
    pub fn join(&self, segment: PathSegment) -> Self {
        let mut segments = self.segments.clone();
        segments.push(segment);
        Self { segments }
    }

    /// The containing directory, or `None` at the root.
    pub fn parent(&self) -> Option<Self> {
        let (_, rest) = self.segments.split_last()?;
        Some(Self {
            segments: rest.to_vec(),
        })
    }

    pub fn file_name(&self) -> Option<&str> {
        self.segments.last().map(PathSegment::as_str)
    }
}

impl fmt::Display for RelativePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                f.write_str("/")?;
            }
            f.write_str(segment.as_str())?;
        }
        Ok(())
    }
}

/// A validated location inside the root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPath {
    path: PathBuf,
    relative: RelativePath,
    link: Option<PathBuf>,
}

impl ResolvedPath {
    /// Canonical absolute path (symlinks resolved).
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The normalised relative path the caller asked for.
    pub fn relative(&self) -> &RelativePath {
        &self.relative
    }

    /// The directory entry itself: the symlink when the last segment is
    /// one, otherwise the same as [`ResolvedPath::path`].
    pub fn entry_path(&self) -> &Path {
        self.link.as_deref().unwrap_or(&self.path)
    }

    pub fn is_symlink(&self) -> bool {
        self.link.is_some()
    }

    pub fn exists(&self) -> bool {
        fs::symlink_metadata(self.entry_path()).is_ok()
    }
}

/// The single directory every operation is confined to.
#[derive(Debug, Clone)]
pub struct Root {
    path: PathBuf,
}

impl Root {
    /// Canonicalises `path` and checks that it is an existing directory.
    pub fn new(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let path = path.as_ref();
        let display = path.display().to_string();

        let canonical = fs::canonicalize(path).map_err(|e| StorageError::from_io(e, &display))?;
        let metadata = fs::metadata(&canonical).map_err(|e| StorageError::from_io(e, &display))?;
        if !metadata.is_dir() {
            return Err(StorageError::NotADirectory(display));
        }

        Ok(Self { path: canonical })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Segment-aware containment: `/base-evil` is not inside `/base`.
    pub fn contains(&self, candidate: &Path) -> bool {
        candidate.starts_with(&self.path)
    }

    /// True when `resolved` canonically denotes the root itself.
    pub fn is_root(&self, resolved: &ResolvedPath) -> bool {
        resolved.path == self.path
    }

    /// Resolves an untrusted relative path. The target need not exist.
    pub fn resolve(&self, raw: &str) -> Result<ResolvedPath, StorageError> {
        let relative = RelativePath::parse(raw).inspect_err(|_| {
            warn!("Rejected path outside root: {raw:?}");
        })?;
        self.resolve_relative(relative)
    }

    /// Like [`Root::resolve`] but fails with `NotFound` for missing targets.
    pub fn resolve_existing(&self, raw: &str) -> Result<ResolvedPath, StorageError> {
        let resolved = self.resolve(raw)?;
        if !resolved.exists() {
            return Err(StorageError::NotFound(resolved.relative.to_string()));
        }
        Ok(resolved)
    }

    /// Resolves a single untrusted file name inside an already resolved
    /// directory.
    pub fn resolve_child(
        &self,
        dir: &ResolvedPath,
        file_name: &str,
    ) -> Result<ResolvedPath, StorageError> {
        if file_name.is_empty() || file_name == "." {
            return Err(StorageError::InvalidFilename(file_name.to_string()));
        }
        let segment = PathSegment::new(file_name).inspect_err(|_| {
            warn!("Rejected file name {file_name:?} in {}", dir.relative);
        })?;
        self.resolve_relative(dir.relative.join(segment))
    }

    /// Resolves a path whose last entry is about to be unlinked.
    ///
    /// A symlink in last position is never followed for removal, so only its
    /// parent directory has to resolve inside the root. Links whose target
    /// cannot be canonicalised (dangling, looping) or lands outside the root
    /// resolve to the link itself. Everything else resolves as usual.
    pub fn resolve_for_removal(&self, raw: &str) -> Result<ResolvedPath, StorageError> {
        let relative = RelativePath::parse(raw).inspect_err(|_| {
            warn!("Rejected path outside root: {raw:?}");
        })?;
        let (Some(parent), Some(name)) = (relative.parent(), relative.file_name()) else {
            return self.resolve_relative(relative);
        };

        let dir = self.resolve_relative(parent)?;
        let entry = dir.path.join(name);
        match fs::symlink_metadata(&entry) {
            Ok(metadata) if metadata.file_type().is_symlink() => {
                let path = match fs::canonicalize(&entry) {
                    Ok(target) if self.contains(&target) => target,
                    _ => entry.clone(),
                };
                debug!("Resolved link {:?} for removal", relative.to_string());
                Ok(ResolvedPath {
                    path,
                    relative,
                    link: Some(entry),
                })
            }
            _ => self.resolve_relative(relative),
        }
    }

    /// Walks `relative` from the root one segment at a time.
    ///
    /// Existing symlinks are canonicalised and must land inside the root.
    /// The first missing segment ends the walk; the remaining segments are
    /// already lexically clean, so appending them cannot leave the root.
    pub fn resolve_relative(&self, relative: RelativePath) -> Result<ResolvedPath, StorageError> {
        let mut current = self.path.clone();
        let mut link = None;
        let segments = relative.segments();

        for (idx, segment) in segments.iter().enumerate() {
            let next = current.join(segment.as_str());
            let is_last = idx + 1 == segments.len();

            match fs::symlink_metadata(&next) {
                Ok(metadata) if metadata.file_type().is_symlink() => {
                    let target = fs::canonicalize(&next).map_err(|e| match e.kind() {
                        // dangling: cannot prove where it points
                        io::ErrorKind::NotFound => StorageError::OutsideRoot(relative.to_string()),
                        _ => StorageError::Io(e),
                    })?;
                    if !self.contains(&target) {
                        warn!(
                            "Symlink {} escapes root via {}",
                            next.display(),
                            target.display()
                        );
                        return Err(StorageError::OutsideRoot(relative.to_string()));
                    }
                    if is_last {
                        link = Some(next);
                    }
                    current = target;
                }
                Ok(_) => current = next,
                Err(e)
                    if matches!(
                        e.kind(),
                        io::ErrorKind::NotFound | io::ErrorKind::NotADirectory
                    ) =>
                {
                    current = next;
                    for rest in &segments[idx + 1..] {
                        current.push(rest.as_str());
                    }
                    break;
                }
                Err(e) => return Err(StorageError::Io(e)),
            }
        }

        if !self.contains(&current) {
            return Err(StorageError::OutsideRoot(relative.to_string()));
        }

        debug!("Resolved {:?} to {}", relative.to_string(), current.display());

        Ok(ResolvedPath {
            path: current,
            relative,
            link,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn setup() -> (TempDir, Root) {
        let temp = TempDir::new().unwrap();
        let base = temp.path().join("files");
        fs::create_dir_all(base.join("docs")).unwrap();
        fs::write(base.join("docs/report.pdf"), b"pdf").unwrap();
        let root = Root::new(&base).unwrap();
        (temp, root)
    }

    #[test]
    fn test_empty_dot_and_slash_resolve_to_root() {
        let (_temp, root) = setup();
        for raw in ["", ".", "/", "./", "//", "\\"] {
            let resolved = root.resolve(raw).unwrap();
            assert_eq!(resolved.path(), root.path(), "input {raw:?}");
            assert!(root.is_root(&resolved));
            assert!(resolved.relative().is_root());
        }
    }

    #[test]
    fn test_escaping_paths_are_rejected() {
        let (_temp, root) = setup();
        for raw in [
            "..",
            "../",
            "../../etc/passwd",
            "docs/../..",
            "docs/../../files",
            "./../files",
            "..\\..\\windows",
            "docs/./../../x",
            "a/b/../../../c",
        ] {
            assert!(
                matches!(root.resolve(raw), Err(StorageError::OutsideRoot(_))),
                "expected rejection for {raw:?}"
            );
        }
    }

    #[test]
    fn test_leading_dotdot_is_rejected_even_when_it_would_come_back() {
        let (_temp, root) = setup();
        // naive joining would land back on the root
        assert!(matches!(
            root.resolve("../files/docs"),
            Err(StorageError::OutsideRoot(_))
        ));
    }

    #[test]
    fn test_inside_paths_resolve_to_canonical_join() {
        let (_temp, root) = setup();
        let expected = root.path().join("docs").join("report.pdf");
        for raw in [
            "docs/report.pdf",
            "docs/../docs/report.pdf",
            "docs//report.pdf",
            "./docs/./report.pdf",
            "/docs/report.pdf",
            "docs\\report.pdf",
        ] {
            let resolved = root.resolve(raw).unwrap();
            assert_eq!(resolved.path(), expected, "input {raw:?}");
            assert_eq!(resolved.relative().to_string(), "docs/report.pdf");
        }
    }

    #[test]
    fn test_missing_targets_resolve_but_fail_existing_check() {
        let (_temp, root) = setup();
        let resolved = root.resolve("docs/new/deep/file.txt").unwrap();
        assert_eq!(
            resolved.path(),
            root.path().join("docs/new/deep/file.txt")
        );
        assert!(!resolved.exists());
        assert!(matches!(
            root.resolve_existing("docs/new/deep/file.txt"),
            Err(StorageError::NotFound(_))
        ));
    }

    #[test]
    fn test_sibling_with_common_prefix_is_not_inside() {
        let (temp, root) = setup();
        let evil = temp.path().join("files-evil");
        fs::create_dir_all(&evil).unwrap();
        assert!(!root.contains(&fs::canonicalize(&evil).unwrap()));
        assert!(root.contains(&root.path().join("docs")));
    }

    #[test]
    fn test_nul_byte_is_rejected() {
        let (_temp, root) = setup();
        assert!(matches!(
            root.resolve("docs/evil\0.txt"),
            Err(StorageError::OutsideRoot(_))
        ));
    }

    #[test]
    fn test_resolve_child_rejects_separators_and_dots() {
        let (_temp, root) = setup();
        let docs = root.resolve("docs").unwrap();
        for name in ["../x", "a/b", "a\\b", ".."] {
            assert!(
                matches!(
                    root.resolve_child(&docs, name),
                    Err(StorageError::OutsideRoot(_))
                ),
                "expected rejection for {name:?}"
            );
        }
        for name in ["", "."] {
            assert!(matches!(
                root.resolve_child(&docs, name),
                Err(StorageError::InvalidFilename(_))
            ));
        }
        let child = root.resolve_child(&docs, "notes.txt").unwrap();
        assert_eq!(child.path(), root.path().join("docs/notes.txt"));
        assert_eq!(child.relative().to_string(), "docs/notes.txt");
    }

    #[test]
    fn test_missing_root_is_not_found() {
        let temp = TempDir::new().unwrap();
        assert!(matches!(
            Root::new(temp.path().join("nope")),
            Err(StorageError::NotFound(_))
        ));
        let file = temp.path().join("plain");
        fs::write(&file, b"x").unwrap();
        assert!(matches!(
            Root::new(&file),
            Err(StorageError::NotADirectory(_))
        ));
    }

    #[test]
    fn test_relative_path_parent_and_display() {
        let rel = RelativePath::parse("a/b/c").unwrap();
        assert_eq!(rel.file_name(), Some("c"));
        assert_eq!(rel.parent().unwrap().to_string(), "a/b");
        assert_eq!(RelativePath::root().parent(), None);
    }

    #[cfg(unix)]
    mod symlinks {
        use super::*;
        use std::os::unix::fs::symlink;

        #[test]
        fn test_symlink_escaping_root_is_rejected() {
            let (temp, root) = setup();
            let outside = temp.path().join("outside");
            fs::create_dir_all(&outside).unwrap();
            fs::write(outside.join("secret"), b"s").unwrap();
            symlink(&outside, root.path().join("escape")).unwrap();

            assert!(matches!(
                root.resolve("escape"),
                Err(StorageError::OutsideRoot(_))
            ));
            assert!(matches!(
                root.resolve("escape/secret"),
                Err(StorageError::OutsideRoot(_))
            ));
            assert!(matches!(
                root.resolve("escape/not-yet-there"),
                Err(StorageError::OutsideRoot(_))
            ));
        }

        #[test]
        fn test_symlink_inside_root_is_followed() {
            let (_temp, root) = setup();
            symlink(root.path().join("docs"), root.path().join("alias")).unwrap();

            let resolved = root.resolve("alias/report.pdf").unwrap();
            assert_eq!(resolved.path(), root.path().join("docs/report.pdf"));

            let link = root.resolve("alias").unwrap();
            assert!(link.is_symlink());
            assert_eq!(link.path(), root.path().join("docs"));
            assert_eq!(link.entry_path(), root.path().join("alias"));
        }

        #[test]
        fn test_dangling_symlink_fails_closed() {
            let (temp, root) = setup();
            symlink(temp.path().join("ghost"), root.path().join("dangling")).unwrap();
            assert!(matches!(
                root.resolve("dangling"),
                Err(StorageError::OutsideRoot(_))
            ));
        }

        #[test]
        fn test_broken_links_resolve_to_the_link_for_removal() {
            let (temp, root) = setup();
            symlink(temp.path().join("ghost"), root.path().join("docs/dangling")).unwrap();
            symlink(root.path().join("docs/loop"), root.path().join("docs/loop")).unwrap();
            symlink(temp.path(), root.path().join("docs/escape")).unwrap();

            for name in ["dangling", "loop", "escape"] {
                let raw = format!("docs/{name}");
                let resolved = root.resolve_for_removal(&raw).unwrap();
                let link = root.path().join("docs").join(name);
                assert!(resolved.is_symlink());
                assert_eq!(resolved.entry_path(), link);
                assert_eq!(resolved.path(), link, "link {name}");
            }
        }

        #[test]
        fn test_removal_resolution_still_checks_the_parent() {
            let (temp, root) = setup();
            let outside = temp.path().join("outside");
            fs::create_dir_all(&outside).unwrap();
            symlink(temp.path().join("ghost"), outside.join("dangling")).unwrap();
            symlink(&outside, root.path().join("escape")).unwrap();

            assert!(matches!(
                root.resolve_for_removal("escape/dangling"),
                Err(StorageError::OutsideRoot(_))
            ));
            assert!(matches!(
                root.resolve_for_removal("../outside/dangling"),
                Err(StorageError::OutsideRoot(_))
            ));
        }

        #[test]
        fn test_removal_resolution_of_link_to_root_is_root() {
            let (_temp, root) = setup();
            symlink(root.path(), root.path().join("docs/home")).unwrap();
            let resolved = root.resolve_for_removal("docs/home").unwrap();
            assert!(root.is_root(&resolved));
            assert_eq!(resolved.entry_path(), root.path().join("docs/home"));
        }

        #[test]
        fn test_root_behind_symlink() {
            let (temp, root) = setup();
            let alias = temp.path().join("root-alias");
            symlink(root.path(), &alias).unwrap();

            let via_alias = Root::new(&alias).unwrap();
            assert_eq!(via_alias.path(), root.path());
            assert!(matches!(
                via_alias.resolve("../outside"),
                Err(StorageError::OutsideRoot(_))
            ));
            assert_eq!(
                via_alias.resolve("docs").unwrap().path(),
                root.path().join("docs")
            );
        }

        #[test]
        fn test_link_to_root_resolves_to_root() {
            let (_temp, root) = setup();
            symlink(root.path(), root.path().join("docs/home")).unwrap();
            let resolved = root.resolve("docs/home").unwrap();
            assert!(root.is_root(&resolved));
        }
    }
}
