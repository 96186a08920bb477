/* 📖 # Why serialize with sorted keys and a trailing newline?

The module configuration file is rewritten whole on every admin operation. Sorted
keys (serde_json's default map) and a fixed layout mean that reading a document and
writing it back unchanged produces byte-identical output, so version control only
shows the sections an operation actually touched.
*/

use tracing::{debug, instrument};

use restadmin_base::{FilePath, PalHandle, RestAdminError, RestAdminResult, ResultExt};

use crate::config::ConfigFormat;
use crate::document::ConfigDocument;
use crate::store::traits::ConfigStore;

/// A configuration store persisted to a single file through the PAL.
#[derive(Debug, Clone)]
pub struct FileConfigStore {
    pal: PalHandle,
    path: FilePath,
    format: ConfigFormat,
}

impl FileConfigStore {
    /// Create a store for the file at `path`.
    ///
    /// The file does not need to exist yet; it is created on first write.
    pub fn new(pal: PalHandle, path: FilePath, format: ConfigFormat) -> Self {
        Self { pal, path, format }
    }

    /// The file backing this store.
    pub fn path(&self) -> &FilePath {
        &self.path
    }

    fn parse(&self, contents: &str) -> RestAdminResult<ConfigDocument> {
        let value: serde_json::Value = match self.format {
            ConfigFormat::Json if contents.trim().is_empty() => serde_json::Value::Null,
            ConfigFormat::Json => serde_json::from_str(contents).map_err(|e| {
                Box::new(RestAdminError::validation(format!(
                    "Invalid JSON in '{}': {}",
                    self.path, e
                )))
            })?,
            ConfigFormat::Yaml => serde_yaml::from_str(contents).map_err(|e| {
                Box::new(RestAdminError::validation(format!(
                    "Invalid YAML in '{}': {}",
                    self.path, e
                )))
            })?,
        };
        ConfigDocument::from_value(value)
            .with_context(|| format!("Failed to load configuration '{}'", self.path))
    }

    fn serialize(&self, document: &ConfigDocument) -> RestAdminResult<String> {
        match self.format {
            ConfigFormat::Json => serde_json::to_string_pretty(document.as_map())
                .map(|mut text| {
                    text.push('\n');
                    text
                })
                .map_err(|e| restadmin_base::err!("Failed to serialize '{}': {}", self.path, e)),
            ConfigFormat::Yaml => serde_yaml::to_string(document.as_map())
                .map_err(|e| restadmin_base::err!("Failed to serialize '{}': {}", self.path, e)),
        }
    }
}

impl ConfigStore for FileConfigStore {
    #[instrument(skip(self), fields(path = %self.path))]
    fn read(&self) -> RestAdminResult<ConfigDocument> {
        if !self.pal.file_exists(&self.path)? {
            debug!("configuration file missing, starting from an empty document");
            return Ok(ConfigDocument::new());
        }
        let contents = self.pal.read_file_to_string(&self.path)?;
        self.parse(&contents)
    }

    #[instrument(skip(self, document), fields(path = %self.path))]
    fn write(&mut self, document: &ConfigDocument) -> RestAdminResult<()> {
        let text = self.serialize(document)?;
        self.pal
            .write_file(&self.path, text.as_bytes())
            .with_context(|| format!("Failed to write configuration '{}'", self.path))?;
        debug!(bytes = text.len(), "configuration written");
        Ok(())
    }
}
