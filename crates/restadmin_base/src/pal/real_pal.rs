use std::fs;
use std::io::Write;
use std::path::PathBuf;

use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use tracing::{debug, instrument};
use walkdir::WalkDir;

use crate::RestAdminResult;
use crate::error::{Error, ErrorKind};

use super::FilePath;
use super::traits::{Pal, ReadSeek};

/* 📖 # Why use std::fs instead of async or other crates?

Admin operations are single-threaded and synchronous: read a module config,
rewrite it, drop a few skeleton files. std::fs is sufficient, well-tested and
keeps the code easy to follow.
*/

/// Concrete PAL implementation using the real filesystem via std::fs.
///
/// All file paths are resolved relative to a configured base directory,
/// ensuring operations stay within intended boundaries.
#[derive(Debug)]
pub struct RealPal {
    base_dir: PathBuf,
}

fn file_error(path: PathBuf, source: std::io::Error) -> Box<Error> {
    Box::new(Error::new(ErrorKind::FileError { path, source }))
}

impl RealPal {
    /// Create a new RealPal with the given base directory.
    ///
    /// # Arguments
    /// * `base_dir` - All paths will be resolved relative to this directory
    pub fn new(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    /// Resolve a FilePath to an absolute filesystem path.
    fn resolve_path(&self, path: &FilePath) -> PathBuf {
        self.base_dir.join(path.as_path())
    }

    /// Build a GlobSet from the given glob patterns.
    #[instrument(skip(self))]
    fn build_glob_set(&self, globs: &[String]) -> RestAdminResult<GlobSet> {
        debug!("compiling {} glob patterns", globs.len());
        let mut builder = GlobSetBuilder::new();
        for (idx, glob) in globs.iter().enumerate() {
            let compiled = GlobBuilder::new(glob).build().map_err(|e| {
                debug!(index = idx, pattern = %glob, error = %e, "failed to compile glob pattern");
                Box::new(Error::message(format!(
                    "Invalid glob pattern '{}': {}",
                    glob, e
                )))
            })?;
            builder.add(compiled);
        }
        builder.build().map_err(|e| {
            debug!(error = %e, "failed to build glob set");
            Box::new(Error::message(format!("Failed to build glob set: {}", e)))
        })
    }
}

impl Pal for RealPal {
    #[instrument(skip(self), fields(path = %path))]
    fn file_exists(&self, path: &FilePath) -> RestAdminResult<bool> {
        let resolved = self.resolve_path(path);
        let exists = resolved.exists();
        debug!(exists, resolved = %resolved.display(), "checked file existence");
        Ok(exists)
    }

    #[instrument(skip(self), fields(path = %path))]
    fn read_file(&self, path: &FilePath) -> RestAdminResult<Box<dyn ReadSeek + 'static>> {
        let resolved = self.resolve_path(path);
        debug!(resolved = %resolved.display(), "opening file for reading");
        let file = fs::File::open(&resolved).map_err(|e| {
            debug!(error = %e, "failed to open file");
            file_error(resolved, e)
        })?;
        Ok(Box::new(file))
    }

    #[instrument(skip(self), fields(path = %path))]
    fn create_file(&self, path: &FilePath) -> RestAdminResult<Box<dyn Write>> {
        let resolved = self.resolve_path(path);
        debug!(resolved = %resolved.display(), "creating file");
        let file = fs::File::create(&resolved).map_err(|e| {
            debug!(error = %e, "failed to create file");
            file_error(resolved, e)
        })?;
        Ok(Box::new(file))
    }

    #[instrument(skip(self), fields(path = %path))]
    fn create_directory_all(&self, path: &FilePath) -> RestAdminResult<()> {
        let resolved = self.resolve_path(path);
        debug!(resolved = %resolved.display(), "creating directory and parents");
        fs::create_dir_all(&resolved).map_err(|e| {
            debug!(error = %e, "failed to create directory");
            file_error(resolved, e)
        })
    }

    #[instrument(skip(self), fields(path = %path))]
    fn remove_directory_all(&self, path: &FilePath) -> RestAdminResult<()> {
        let resolved = self.resolve_path(path);
        debug!(resolved = %resolved.display(), "removing directory and contents");
        fs::remove_dir_all(&resolved).map_err(|e| {
            debug!(error = %e, "failed to remove directory");
            file_error(resolved, e)
        })
    }

    #[instrument(skip(self), fields(path = %path, globs = ?globs))]
    fn walk_directory(
        &self,
        path: &FilePath,
        globs: &[String],
    ) -> RestAdminResult<Box<dyn Iterator<Item = RestAdminResult<FilePath>> + '_>> {
        let resolved = self.resolve_path(path);
        debug!(resolved = %resolved.display(), "starting directory walk");

        if !resolved.exists() {
            debug!("directory not found");
            return Err(file_error(
                resolved,
                std::io::Error::new(std::io::ErrorKind::NotFound, "directory not found"),
            ));
        }

        let glob_set = self.build_glob_set(globs)?;

        let base_path = path.clone();
        let iter = WalkDir::new(&resolved)
            .sort_by_file_name()
            .into_iter()
            .filter_map(move |entry| match entry {
                Ok(e) => {
                    let relative = e.path().strip_prefix(&resolved).ok()?;
                    if !e.file_type().is_file() || !glob_set.is_match(relative) {
                        return None;
                    }
                    let relative = FilePath::from(relative);
                    Some(Ok(base_path.join(relative.as_relative().as_str())))
                }
                Err(e) => {
                    debug!(error = %e, "error walking directory");
                    Some(Err(file_error(
                        e.path()
                            .map(|p| p.to_path_buf())
                            .unwrap_or_else(|| PathBuf::from("unknown")),
                        std::io::Error::other(e.to_string()),
                    )))
                }
            });

        Ok(Box::new(iter))
    }
}
