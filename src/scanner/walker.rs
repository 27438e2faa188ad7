//! Directory enumeration and entry classification.
//!
//! # Overview
//!
//! [`Walker`] knows which entries of a directory tree are worth hashing and
//! which failures are fatal. It offers two shapes of traversal:
//!
//! - [`Walker::visit`] enumerates the direct entries of one directory and
//!   reports each subdirectory and hashable file to a callback as it is
//!   found. The fan-out strategy spawns a task from that callback, so
//!   recursion happens by spawning rather than by a nested call.
//! - [`Walker::walk`] is a recursive, single-threaded iterator built on
//!   `walkdir`, used by the sequential and pipeline strategies.
//!
//! Both apply the same rules:
//!
//! - directories are descended into, symlinks are never followed;
//! - regular files with a size above zero are reported;
//! - empty files and anything that is not a regular file are skipped;
//! - an entry that vanishes between listing and inspection is ignored;
//! - every other I/O failure is a fatal [`ScanError`].

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use walkdir::WalkDir;

use super::{is_vanished, FileEntry, ScanError, ScanStats};

/// One interesting entry found while enumerating a directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Discovered {
    /// A subdirectory to descend into.
    Directory(PathBuf),
    /// A regular, non-empty file to hash.
    File(FileEntry),
}

/// Directory walker shared by all scan strategies.
#[derive(Debug, Clone, Default)]
pub struct Walker {
    stats: Option<Arc<ScanStats>>,
}

impl Walker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record directories, files and vanished entries into `stats`.
    #[must_use]
    pub fn with_stats(mut self, stats: Arc<ScanStats>) -> Self {
        self.stats = Some(stats);
        self
    }

    /// Enumerate the direct entries of `dir`.
    ///
    /// `on_item` is called for every subdirectory and hashable file. If `dir`
    /// itself has vanished the visit is a no-op.
    ///
    /// # Errors
    ///
    /// Returns the first I/O failure that is not a vanished entry.
    pub fn visit<F>(&self, dir: &Path, mut on_item: F) -> Result<(), ScanError>
    where
        F: FnMut(Discovered),
    {
        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) if is_vanished(&e) => {
                log::debug!("Directory vanished before listing: {}", dir.display());
                self.record_vanished();
                return Ok(());
            }
            Err(e) => return Err(ScanError::from_io(dir.to_path_buf(), e)),
        };

        if let Some(stats) = &self.stats {
            stats.record_dir();
        }

        for entry in entries {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    self.tolerate(dir, e)?;
                    continue;
                }
            };
            let path = entry.path();

            let file_type = match entry.file_type() {
                Ok(ft) => ft,
                Err(e) => {
                    self.tolerate(&path, e)?;
                    continue;
                }
            };

            if file_type.is_dir() {
                on_item(Discovered::Directory(path));
                continue;
            }
            if !file_type.is_file() {
                log::trace!("Skipping non-regular entry: {}", path.display());
                continue;
            }

            let metadata = match entry.metadata() {
                Ok(m) => m,
                Err(e) => {
                    self.tolerate(&path, e)?;
                    continue;
                }
            };

            if let Some(file) = self.accept(FileEntry::from_metadata(path, &metadata)) {
                on_item(Discovered::File(file));
            }
        }

        Ok(())
    }

    /// Walk the whole tree under `root`, yielding hashable files.
    ///
    /// Errors are yielded rather than ending iteration; callers decide
    /// whether to stop. A failure on `root` itself is always yielded, even
    /// when it is a vanished entry.
    ///
    /// ```no_run
    /// use dupfind::scanner::Walker;
    /// use std::path::Path;
    ///
    /// let walker = Walker::new();
    /// let files: Vec<_> = walker.walk(Path::new(".")).filter_map(Result::ok).collect();
    /// println!("Found {} files", files.len());
    /// ```
    pub fn walk<'a>(
        &'a self,
        root: &Path,
    ) -> impl Iterator<Item = Result<FileEntry, ScanError>> + 'a {
        WalkDir::new(root)
            .follow_links(false)
            .into_iter()
            .filter_map(move |result| match result {
                Ok(entry) => {
                    let file_type = entry.file_type();
                    if file_type.is_dir() {
                        if let Some(stats) = &self.stats {
                            stats.record_dir();
                        }
                        return None;
                    }
                    if !file_type.is_file() {
                        log::trace!("Skipping non-regular entry: {}", entry.path().display());
                        return None;
                    }
                    match entry.metadata() {
                        Ok(metadata) => self
                            .accept(FileEntry::from_metadata(entry.into_path(), &metadata))
                            .map(Ok),
                        Err(e) => self.walkdir_error(e).map(Err),
                    }
                }
                Err(e) => self.walkdir_error(e).map(Err),
            })
    }

    fn accept(&self, file: FileEntry) -> Option<FileEntry> {
        if !file.is_hashable() {
            log::trace!("Skipping empty file: {}", file.path.display());
            return None;
        }
        if let Some(stats) = &self.stats {
            stats.record_file(file.size);
        }
        Some(file)
    }

    fn tolerate(&self, path: &Path, err: io::Error) -> Result<(), ScanError> {
        if is_vanished(&err) {
            log::debug!("Entry vanished during scan: {}", path.display());
            self.record_vanished();
            Ok(())
        } else {
            Err(ScanError::from_io(path.to_path_buf(), err))
        }
    }

    fn walkdir_error(&self, err: walkdir::Error) -> Option<ScanError> {
        let depth = err.depth();
        let path = err.path().map(Path::to_path_buf).unwrap_or_default();
        let source = match err.into_io_error() {
            Some(e) => e,
            None => return Some(ScanError::from_io(path, io::Error::other("filesystem loop"))),
        };

        if depth > 0 && is_vanished(&source) {
            log::debug!("Entry vanished during scan: {}", path.display());
            self.record_vanished();
            return None;
        }
        Some(ScanError::from_io(path, source))
    }

    fn record_vanished(&self) {
        if let Some(stats) = &self.stats {
            stats.record_vanished();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use tempfile::TempDir;

    /// Create a test directory with some files.
    fn create_test_dir() -> TempDir {
        let dir = TempDir::new().unwrap();

        let mut f = File::create(dir.path().join("file1.txt")).unwrap();
        writeln!(f, "Hello, world!").unwrap();

        let mut f = File::create(dir.path().join("file2.txt")).unwrap();
        writeln!(f, "Another file").unwrap();

        File::create(dir.path().join("empty.txt")).unwrap();

        let subdir = dir.path().join("subdir");
        fs::create_dir(&subdir).unwrap();
        let mut f = File::create(subdir.join("nested.txt")).unwrap();
        writeln!(f, "Nested file content").unwrap();

        dir
    }

    fn visit_all(walker: &Walker, dir: &Path) -> (Vec<PathBuf>, Vec<FileEntry>) {
        let mut dirs = Vec::new();
        let mut files = Vec::new();
        walker
            .visit(dir, |item| match item {
                Discovered::Directory(d) => dirs.push(d),
                Discovered::File(f) => files.push(f),
            })
            .unwrap();
        files.sort_by(|a, b| a.path.cmp(&b.path));
        (dirs, files)
    }

    #[test]
    fn test_visit_reports_direct_entries_only() {
        let dir = create_test_dir();
        let (dirs, files) = visit_all(&Walker::new(), dir.path());

        assert_eq!(dirs, vec![dir.path().join("subdir")]);
        let names: Vec<_> = files
            .iter()
            .map(|f| f.path.file_name().unwrap().to_str().unwrap())
            .collect();
        assert_eq!(names, vec!["file1.txt", "file2.txt"]);
        assert!(files.iter().all(FileEntry::is_hashable));
    }

    #[test]
    fn test_visit_skips_empty_files() {
        let dir = create_test_dir();
        let (_, files) = visit_all(&Walker::new(), dir.path());
        assert!(files.iter().all(|f| f.path.file_name().unwrap() != "empty.txt"));
    }

    #[test]
    fn test_visit_vanished_directory_is_noop() {
        let dir = TempDir::new().unwrap();
        let stats = Arc::new(ScanStats::default());
        let walker = Walker::new().with_stats(Arc::clone(&stats));

        let (dirs, files) = visit_all(&walker, &dir.path().join("gone"));
        assert!(dirs.is_empty());
        assert!(files.is_empty());
        assert_eq!(stats.vanished(), 1);
        assert_eq!(stats.dirs_visited(), 0);
    }

    #[test]
    fn test_visit_records_stats() {
        let dir = create_test_dir();
        let stats = Arc::new(ScanStats::default());
        let walker = Walker::new().with_stats(Arc::clone(&stats));

        visit_all(&walker, dir.path());
        assert_eq!(stats.dirs_visited(), 1);
        assert_eq!(stats.files_discovered(), 2);
    }

    #[test]
    #[cfg(unix)]
    fn test_visit_skips_symlinks() {
        let dir = create_test_dir();
        std::os::unix::fs::symlink(dir.path().join("file1.txt"), dir.path().join("link.txt"))
            .unwrap();
        std::os::unix::fs::symlink(dir.path().join("subdir"), dir.path().join("linkdir")).unwrap();

        let (dirs, files) = visit_all(&Walker::new(), dir.path());
        assert_eq!(dirs.len(), 1);
        assert_eq!(files.len(), 2);
    }

    #[test]
    #[cfg(unix)]
    fn test_visit_unreadable_directory_is_fatal() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let locked = dir.path().join("locked");
        fs::create_dir(&locked).unwrap();
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

        // Privileged users can read it anyway.
        if fs::read_dir(&locked).is_ok() {
            fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
            return;
        }

        let result = Walker::new().visit(&locked, |_| {});
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
        assert!(matches!(result, Err(ScanError::PermissionDenied(_))));
    }

    #[test]
    fn test_walk_finds_nested_files() {
        let dir = create_test_dir();
        let walker = Walker::new();

        let files: Vec<_> = walker.walk(dir.path()).collect::<Result<_, _>>().unwrap();

        assert_eq!(files.len(), 3);
        for file in &files {
            assert!(file.size > 0);
            assert!(file.path.exists());
        }
    }

    #[test]
    fn test_walk_missing_root_yields_error() {
        let dir = TempDir::new().unwrap();
        let walker = Walker::new();

        let results: Vec<_> = walker.walk(&dir.path().join("missing")).collect();
        assert_eq!(results.len(), 1);
        assert!(results[0].is_err());
    }

    #[test]
    fn test_walk_counts_directories() {
        let dir = create_test_dir();
        let stats = Arc::new(ScanStats::default());
        let walker = Walker::new().with_stats(Arc::clone(&stats));

        let count = walker.walk(dir.path()).filter_map(Result::ok).count();
        assert_eq!(count, 3);
        assert_eq!(stats.dirs_visited(), 2);
        assert_eq!(stats.files_discovered(), 3);
    }
}
