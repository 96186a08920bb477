use std::collections::{BTreeMap, BTreeSet};
use std::io::{Cursor, Write};
use std::sync::Arc;

use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use parking_lot::Mutex;

use crate::RestAdminResult;
use crate::error::{Error, ErrorKind};

use super::FilePath;
use super::traits::{Pal, ReadSeek};

/* 📖 # Why use in-memory maps for MockPal storage?

MockPal keeps files and directories in memory behind Arc<Mutex<T>>:
1. **Speed**: No filesystem I/O, deterministic and fast for unit tests
2. **Isolation**: No side effects on the real filesystem
3. **Control**: Tests seed module configs directly and inspect generated sources

Sorted maps keep walk results in a stable order, so assertions don't depend on
hash iteration order.
*/

/// In-memory PAL implementation for testing.
///
/// # Examples
///
/// ```
/// use restadmin_base::{MockPal, Pal, FilePath};
///
/// let mock = MockPal::new();
/// mock.add_file(FilePath::from("test.txt"), b"content".to_vec());
/// let content = mock.read_file_to_string(&FilePath::from("test.txt")).unwrap();
/// assert_eq!(content, "content");
/// ```
#[derive(Debug, Clone, Default)]
pub struct MockPal {
    files: Arc<Mutex<BTreeMap<FilePath, Vec<u8>>>>,
    directories: Arc<Mutex<BTreeSet<FilePath>>>,
}

impl MockPal {
    /// Create a new empty MockPal.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a file to the mock storage, registering its parent directories.
    pub fn add_file(&self, path: FilePath, content: Vec<u8>) {
        let mut directories = self.directories.lock();
        let mut current = path.parent();
        while let Some(dir) = current {
            current = dir.parent();
            directories.insert(dir);
        }
        self.files.lock().insert(path, content);
    }

    /// Add a directory to the mock storage.
    pub fn add_directory(&self, path: FilePath) {
        self.directories.lock().insert(path);
    }

    /// All file paths currently stored, sorted.
    pub fn file_paths(&self) -> Vec<FilePath> {
        self.files.lock().keys().cloned().collect()
    }

    fn build_glob_set(globs: &[String]) -> RestAdminResult<GlobSet> {
        let mut builder = GlobSetBuilder::new();
        for glob in globs {
            let compiled = GlobBuilder::new(glob).build().map_err(|e| {
                Box::new(Error::message(format!(
                    "Invalid glob pattern '{}': {}",
                    glob, e
                )))
            })?;
            builder.add(compiled);
        }
        builder
            .build()
            .map_err(|e| Box::new(Error::message(format!("Failed to build glob set: {}", e))))
    }
}

impl Pal for MockPal {
    fn file_exists(&self, path: &FilePath) -> RestAdminResult<bool> {
        Ok(self.files.lock().contains_key(path) || self.directories.lock().contains(path))
    }

    fn read_file(&self, path: &FilePath) -> RestAdminResult<Box<dyn ReadSeek + 'static>> {
        let files = self.files.lock();
        let content = files
            .get(path)
            .ok_or_else(|| {
                Box::new(Error::new(ErrorKind::FileError {
                    path: path.as_path().to_path_buf(),
                    source: std::io::Error::new(
                        std::io::ErrorKind::NotFound,
                        format!("File not found: {}", path),
                    ),
                }))
            })?
            .clone();
        Ok(Box::new(Cursor::new(content)))
    }

    fn create_file(&self, path: &FilePath) -> RestAdminResult<Box<dyn Write>> {
        // Return a writer that will store in the mock storage when dropped
        Ok(Box::new(MockFileWriter {
            path: path.clone(),
            files: Arc::clone(&self.files),
            buffer: Vec::new(),
        }))
    }

    fn create_directory_all(&self, path: &FilePath) -> RestAdminResult<()> {
        let mut directories = self.directories.lock();
        let mut current = Some(path.clone());
        while let Some(dir) = current {
            current = dir.parent();
            directories.insert(dir);
        }
        Ok(())
    }

    fn remove_directory_all(&self, path: &FilePath) -> RestAdminResult<()> {
        let mut directories = self.directories.lock();
        if !directories.contains(path) {
            return Err(Box::new(Error::new(ErrorKind::FileError {
                path: path.as_path().to_path_buf(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "directory not found"),
            })));
        }
        directories.retain(|dir| !dir.starts_with(path));
        self.files.lock().retain(|file, _| !file.starts_with(path));
        Ok(())
    }

    fn walk_directory(
        &self,
        path: &FilePath,
        globs: &[String],
    ) -> RestAdminResult<Box<dyn Iterator<Item = RestAdminResult<FilePath>> + '_>> {
        let glob_set = Self::build_glob_set(globs)?;
        let root = path.join("");
        let matching: Vec<FilePath> = self
            .files
            .lock()
            .keys()
            .filter_map(|file| {
                let relative = if root.as_relative().as_str().is_empty() {
                    Some(file.clone())
                } else {
                    file.strip_prefix(&root)
                }?;
                glob_set
                    .is_match(relative.as_path())
                    .then(|| file.clone())
            })
            .collect();
        Ok(Box::new(matching.into_iter().map(Ok)))
    }
}

/// Helper struct for writing files to MockPal.
struct MockFileWriter {
    path: FilePath,
    files: Arc<Mutex<BTreeMap<FilePath, Vec<u8>>>>,
    buffer: Vec<u8>,
}

impl Write for MockFileWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.buffer.write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl Drop for MockFileWriter {
    fn drop(&mut self) {
        self.files
            .lock()
            .insert(self.path.clone(), std::mem::take(&mut self.buffer));
    }
}
