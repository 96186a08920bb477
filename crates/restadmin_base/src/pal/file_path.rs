use relative_path::{RelativePath, RelativePathBuf};
use std::path::Path;

/* 📖 # Why use RelativePathBuf for FilePath?

FilePath wraps RelativePathBuf to enforce that all paths are relative to the PAL's
base directory, not absolute system paths. Module directories, configuration files
and generated sources are all addressed relative to the admin workspace root, so
the same paths work against RealPal and MockPal.
*/

/// Type-safe wrapper for file paths relative to PAL base directory.
///
/// # Examples
///
/// ```
/// use restadmin_base::FilePath;
///
/// let module = FilePath::from("module/BarConf");
/// let config = module.join("config/module.config.json");
/// assert_eq!(config.to_string(), "module/BarConf/config/module.config.json");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FilePath(RelativePathBuf);

impl FilePath {
    /// Returns the underlying RelativePathBuf as a reference.
    pub fn as_relative(&self) -> &RelativePath {
        &self.0
    }

    /// Converts to a regular Path for use with std::fs operations.
    /// This returns the relative path portion without a base directory.
    pub fn as_path(&self) -> &Path {
        Path::new(self.as_relative().as_str())
    }

    /// Appends a relative path, normalizing `.` segments away.
    pub fn join(&self, path: impl AsRef<str>) -> Self {
        Self(self.0.join_normalized(path.as_ref()))
    }

    /// The parent directory, if the path has more than one component.
    pub fn parent(&self) -> Option<Self> {
        self.0
            .parent()
            .filter(|parent| !parent.as_str().is_empty())
            .map(Self::from)
    }

    /// Returns true if `self` equals `ancestor` or lies below it.
    pub fn starts_with(&self, ancestor: &FilePath) -> bool {
        self.0.starts_with(&ancestor.0)
    }

    /// The path below `ancestor`, if `self` lies below it.
    pub fn strip_prefix(&self, ancestor: &FilePath) -> Option<Self> {
        self.0
            .strip_prefix(&ancestor.0)
            .ok()
            .map(|rest| Self(rest.to_relative_path_buf()))
    }
}

impl From<&str> for FilePath {
    fn from(s: &str) -> Self {
        Self(RelativePathBuf::from(s))
    }
}

impl From<String> for FilePath {
    fn from(s: String) -> Self {
        Self(RelativePathBuf::from(s))
    }
}

impl From<RelativePathBuf> for FilePath {
    fn from(p: RelativePathBuf) -> Self {
        Self(p)
    }
}

impl From<&RelativePath> for FilePath {
    fn from(p: &RelativePath) -> Self {
        Self(p.to_relative_path_buf())
    }
}

impl From<&Path> for FilePath {
    fn from(p: &Path) -> Self {
        Self(RelativePathBuf::from(p.to_string_lossy().into_owned()))
    }
}

impl std::fmt::Display for FilePath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<RelativePath> for FilePath {
    fn as_ref(&self) -> &RelativePath {
        &self.0
    }
}
