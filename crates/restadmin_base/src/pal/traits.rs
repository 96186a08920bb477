use std::io::{Read, Seek, Write};
use std::sync::Arc;

use crate::RestAdminResult;
use crate::error::{Error, ErrorKind};

use super::file_path::FilePath;

/// Trait combining Read + Seek for file operations.
pub trait ReadSeek: Read + Seek {}
impl<T: Read + Seek> ReadSeek for T {}

/* 📖 # Why is Pal a trait instead of a struct?

Using a trait enables two key benefits:
1. **Testability**: MockPal implements Pal for fast, deterministic tests without filesystem side effects
2. **Flexibility**: Code depends on the abstraction, not the concrete implementation

The module configuration files and the generated skeleton sources are both
written through this trait, so a whole create/update/delete cycle can be
exercised in memory.
*/

/// Platform Abstraction Layer (PAL) trait providing filesystem operations.
///
/// Two implementations are provided:
/// - `RealPal`: Uses the real filesystem via `std::fs`
/// - `MockPal`: In-memory implementation for testing
pub trait Pal: std::fmt::Debug + Send + Sync + 'static {
    /// Check if a file or directory exists at the given path.
    fn file_exists(&self, path: &FilePath) -> RestAdminResult<bool>;

    /// Open a file for reading.
    fn read_file(&self, path: &FilePath) -> RestAdminResult<Box<dyn ReadSeek + 'static>>;

    /// Read entire file contents as a UTF-8 string.
    fn read_file_to_string(&self, path: &FilePath) -> RestAdminResult<String> {
        let mut reader = self.read_file(path)?;
        let mut contents = Vec::new();
        reader.read_to_end(&mut contents).map_err(|e| {
            Box::new(Error::new(ErrorKind::FileError {
                path: path.as_path().to_path_buf(),
                source: e,
            }))
        })?;
        String::from_utf8(contents).map_err(|_e| crate::err!("File is not valid UTF-8: {}", path))
    }

    /// Create a new file, overwriting if it exists.
    fn create_file(&self, path: &FilePath) -> RestAdminResult<Box<dyn Write>>;

    /// Write the whole file in one go, creating parent directories first.
    fn write_file(&self, path: &FilePath, contents: &[u8]) -> RestAdminResult<()> {
        if let Some(parent) = path.parent() {
            self.create_directory_all(&parent)?;
        }
        let mut writer = self.create_file(path)?;
        writer
            .write_all(contents)
            .and_then(|_| writer.flush())
            .map_err(|e| {
                Box::new(Error::new(ErrorKind::FileError {
                    path: path.as_path().to_path_buf(),
                    source: e,
                }))
            })
    }

    /// Create a directory and all parent directories.
    fn create_directory_all(&self, path: &FilePath) -> RestAdminResult<()>;

    /// Remove a directory and all its contents.
    fn remove_directory_all(&self, path: &FilePath) -> RestAdminResult<()>;

    /// Walk a directory tree, yielding paths matching the given glob patterns.
    ///
    /// # Arguments
    /// * `path` - Directory to walk
    /// * `globs` - Glob patterns, matched against paths relative to `path`
    fn walk_directory(
        &self,
        path: &FilePath,
        globs: &[String],
    ) -> RestAdminResult<Box<dyn Iterator<Item = RestAdminResult<FilePath>> + '_>>;
}

/// Handle to a PAL implementation, enabling shared ownership.
///
/// Internally wraps `Arc<dyn Pal>` for cheap cloning and thread-safe sharing.
///
/// # Examples
///
/// ```no_run
/// use restadmin_base::{RealPal, PalHandle};
///
/// let pal = PalHandle::new(RealPal::new(".".into()));
/// let pal_clone = pal.clone(); // Cheap clone, shares the same implementation
/// ```
#[derive(Debug, Clone)]
pub struct PalHandle(Arc<dyn Pal>);

impl PalHandle {
    /// Create a new PalHandle from a Pal implementation.
    pub fn new(pal: impl Pal + 'static) -> Self {
        Self(Arc::new(pal))
    }
}

impl std::ops::Deref for PalHandle {
    type Target = dyn Pal;

    fn deref(&self) -> &Self::Target {
        &*self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pal::MockPal;

    #[test]
    fn test_pal_handle_clone_shares_state() {
        let mock = MockPal::new();
        let pal = PalHandle::new(mock);
        let pal_clone = pal.clone();
        pal.write_file(&FilePath::from("a/b.txt"), b"shared").unwrap();
        assert!(pal_clone.file_exists(&FilePath::from("a/b.txt")).unwrap());
    }

    #[test]
    fn test_write_file_creates_parent_directory() {
        let mock = MockPal::new();
        mock.write_file(&FilePath::from("module/BarConf/config/module.config.json"), b"{}")
            .unwrap();
        assert!(mock.file_exists(&FilePath::from("module/BarConf/config")).unwrap());
        assert_eq!(
            mock.read_file_to_string(&FilePath::from("module/BarConf/config/module.config.json"))
                .unwrap(),
            "{}"
        );
    }
}
