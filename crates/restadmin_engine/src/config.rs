use serde::Deserialize;
use tracing::{debug, instrument};

use restadmin_base::{FilePath, PalHandle, RestAdminError, RestAdminResult, ResultExt};

/// Default name of the admin configuration file.
pub const CONFIG_FILE_NAME: &str = "restadmin.toml";

/// Configuration for a restadmin workspace.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Directory scanned for modules (`<modules_path>/<Name>/config/module.config.*`).
    #[serde(default = "default_modules_path")]
    pub modules_path: String,
    /// Serialization format of module configuration files.
    #[serde(default)]
    pub config_format: ConfigFormat,
    /// File extension of generated skeleton sources.
    #[serde(default = "default_source_extension")]
    pub source_extension: String,
    /// Explicitly declared modules, in addition to discovered ones.
    #[serde(default)]
    pub module: Vec<ModuleConfig>,
}

/// A module declared in the configuration file.
#[derive(Debug, Clone, Deserialize)]
pub struct ModuleConfig {
    /// Module name, also the root namespace of its generated classes.
    pub name: String,
    /// Module directory, relative to the workspace root.
    pub path: String,
}

/// On-disk format of module configuration documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfigFormat {
    #[default]
    Json,
    Yaml,
}

impl ConfigFormat {
    /// File extension used for module configuration files.
    pub fn extension(self) -> &'static str {
        match self {
            ConfigFormat::Json => "json",
            ConfigFormat::Yaml => "yaml",
        }
    }

    /// Format implied by a file extension, if any.
    pub fn from_extension(extension: &str) -> Option<Self> {
        match extension {
            "json" => Some(ConfigFormat::Json),
            "yaml" => Some(ConfigFormat::Yaml),
            _ => None,
        }
    }
}

fn default_modules_path() -> String {
    "module".to_string()
}

fn default_source_extension() -> String {
    "php".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            modules_path: default_modules_path(),
            config_format: ConfigFormat::default(),
            source_extension: default_source_extension(),
            module: Vec::new(),
        }
    }
}

/// Load and parse the workspace configuration file.
#[instrument(skip(pal), fields(path = %path))]
pub fn load_config(pal: &PalHandle, path: &FilePath) -> RestAdminResult<Config> {
    let contents = pal
        .read_file_to_string(path)
        .with_context(|| format!("Failed to read configuration file '{}'", path))?;
    let config: Config = toml::from_str(&contents).map_err(|e| {
        Box::new(RestAdminError::validation(format!(
            "Invalid configuration file '{}': {}",
            path, e
        )))
    })?;
    debug!(
        modules_path = %config.modules_path,
        declared_modules = config.module.len(),
        "configuration loaded"
    );
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use restadmin_base::MockPal;

    #[test]
    fn test_load_config_with_defaults() {
        let mock = MockPal::new();
        mock.add_file(FilePath::from(CONFIG_FILE_NAME), b"".to_vec());
        let pal = PalHandle::new(mock);

        let config = load_config(&pal, &FilePath::from(CONFIG_FILE_NAME)).unwrap();
        assert_eq!(config.modules_path, "module");
        assert_eq!(config.config_format, ConfigFormat::Json);
        assert_eq!(config.source_extension, "php");
        assert!(config.module.is_empty());
    }

    #[test]
    fn test_load_config_full() {
        let mock = MockPal::new();
        mock.add_file(
            FilePath::from(CONFIG_FILE_NAME),
            br#"
modules_path = "modules"
config_format = "yaml"
source_extension = "inc"

[[module]]
name = "BarConf"
path = "vendor/BarConf"
"#
            .to_vec(),
        );
        let pal = PalHandle::new(mock);

        let config = load_config(&pal, &FilePath::from(CONFIG_FILE_NAME)).unwrap();
        assert_eq!(config.modules_path, "modules");
        assert_eq!(config.config_format, ConfigFormat::Yaml);
        assert_eq!(config.source_extension, "inc");
        assert_eq!(config.module.len(), 1);
        assert_eq!(config.module[0].name, "BarConf");
        assert_eq!(config.module[0].path, "vendor/BarConf");
    }

    #[test]
    fn test_load_config_missing_file() {
        let pal = PalHandle::new(MockPal::new());
        let err = load_config(&pal, &FilePath::from(CONFIG_FILE_NAME)).unwrap_err();
        assert!(err.to_string().starts_with("Failed to read configuration file"));
    }

    #[test]
    fn test_load_config_rejects_unknown_format() {
        let mock = MockPal::new();
        mock.add_file(
            FilePath::from(CONFIG_FILE_NAME),
            b"config_format = \"ini\"\n".to_vec(),
        );
        let pal = PalHandle::new(mock);

        let err = load_config(&pal, &FilePath::from(CONFIG_FILE_NAME)).unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn test_format_extensions() {
        assert_eq!(ConfigFormat::Json.extension(), "json");
        assert_eq!(ConfigFormat::from_extension("yaml"), Some(ConfigFormat::Yaml));
        assert_eq!(ConfigFormat::from_extension("yml"), None);
        assert_eq!(ConfigFormat::from_extension("php"), None);
    }
}
