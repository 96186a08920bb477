/* 📖 # Why discover modules in addition to declaring them?

Most workspaces follow the `<modules_path>/<Name>/config/module.config.json`
convention, so walking the modules directory finds every module without any
configuration. Modules living elsewhere (vendored, nested) are declared in
`restadmin.toml`; a declaration wins over a discovered module of the same name.
*/

use std::collections::BTreeMap;

use tracing::{debug, instrument, warn};

use restadmin_base::{FilePath, PalHandle, RestAdminError, RestAdminResult};

use crate::config::{Config, ConfigFormat};
use crate::store::{FileConfigStore, StoreHandle};

const MODULE_CONFIG_STEM: &str = "module.config";

/// A module known to the registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleDescriptor {
    /// Module name, also the root namespace of its classes.
    pub name: String,
    /// Module directory, relative to the workspace root.
    pub path: FilePath,
    /// Format of the module's configuration file.
    pub format: ConfigFormat,
}

impl ModuleDescriptor {
    pub fn new(name: impl Into<String>, path: impl Into<FilePath>, format: ConfigFormat) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            format,
        }
    }

    /// `<path>/config/module.config.<ext>`
    pub fn config_path(&self) -> FilePath {
        self.path
            .join(format!("config/{}.{}", MODULE_CONFIG_STEM, self.format.extension()))
    }

    /// Root directory of the module's generated sources.
    pub fn source_path(&self) -> FilePath {
        self.path.join("src")
    }
}

/// Resolves module names to their directories and configuration stores.
#[derive(Debug, Clone)]
pub struct ModuleRegistry {
    pal: PalHandle,
    modules: BTreeMap<String, ModuleDescriptor>,
}

impl ModuleRegistry {
    /// Build the registry from declared modules plus those discovered under `modules_path`.
    #[instrument(skip(pal, config), fields(modules_path = %config.modules_path))]
    pub fn discover(pal: PalHandle, config: &Config) -> RestAdminResult<Self> {
        let mut modules = BTreeMap::new();
        let modules_path = FilePath::from(config.modules_path.as_str());

        if pal.file_exists(&modules_path)? {
            let globs = [ConfigFormat::Json, ConfigFormat::Yaml]
                .map(|format| format!("*/config/{}.{}", MODULE_CONFIG_STEM, format.extension()));
            for entry in pal.walk_directory(&modules_path, &globs)? {
                let config_file = entry?;
                let Some(module) = descriptor_from_config_file(&modules_path, &config_file) else {
                    warn!(path = %config_file, "skipping unrecognized module configuration file");
                    continue;
                };
                debug!(module = %module.name, path = %module.path, "discovered module");
                modules.insert(module.name.clone(), module);
            }
        } else {
            debug!("modules directory missing, relying on declared modules");
        }

        for declared in &config.module {
            let module = ModuleDescriptor::new(
                declared.name.clone(),
                declared.path.as_str(),
                config.config_format,
            );
            debug!(module = %module.name, path = %module.path, "declared module");
            modules.insert(module.name.clone(), module);
        }

        Ok(Self { pal, modules })
    }

    /// Build a registry from an explicit list of modules.
    pub fn from_modules(pal: PalHandle, modules: impl IntoIterator<Item = ModuleDescriptor>) -> Self {
        Self {
            pal,
            modules: modules
                .into_iter()
                .map(|module| (module.name.clone(), module))
                .collect(),
        }
    }

    pub fn pal(&self) -> &PalHandle {
        &self.pal
    }

    /// All known modules, ordered by name.
    pub fn modules(&self) -> impl Iterator<Item = &ModuleDescriptor> {
        self.modules.values()
    }

    /// Look up a module by name.
    pub fn get(&self, name: &str) -> RestAdminResult<&ModuleDescriptor> {
        self.modules.get(name).ok_or_else(|| {
            Box::new(RestAdminError::not_found(format!("module '{}'", name)))
        })
    }

    /// A store over the module's configuration file.
    pub fn config_store(&self, name: &str) -> RestAdminResult<StoreHandle> {
        let module = self.get(name)?;
        Ok(StoreHandle::new(FileConfigStore::new(
            self.pal.clone(),
            module.config_path(),
            module.format,
        )))
    }
}

/// `<modules_path>/<Name>/config/module.config.<ext>` → descriptor for `<Name>`.
fn descriptor_from_config_file(
    modules_path: &FilePath,
    config_file: &FilePath,
) -> Option<ModuleDescriptor> {
    let relative = config_file.strip_prefix(modules_path)?;
    let relative = relative.as_relative();
    let format = ConfigFormat::from_extension(relative.extension()?)?;
    let name = relative.components().next()?.as_str().to_string();
    let path = modules_path.join(&name);
    Some(ModuleDescriptor::new(name, path, format))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ModuleConfig;
    use restadmin_base::MockPal;

    fn registry(mock: &MockPal, config: &Config) -> ModuleRegistry {
        ModuleRegistry::discover(PalHandle::new(mock.clone()), config).unwrap()
    }

    #[test]
    fn test_descriptor_paths() {
        let module = ModuleDescriptor::new("BarConf", "module/BarConf", ConfigFormat::Json);
        assert_eq!(
            module.config_path(),
            FilePath::from("module/BarConf/config/module.config.json")
        );
        assert_eq!(module.source_path(), FilePath::from("module/BarConf/src"));

        let yaml = ModuleDescriptor::new("Foo", "vendor/Foo", ConfigFormat::Yaml);
        assert_eq!(
            yaml.config_path(),
            FilePath::from("vendor/Foo/config/module.config.yaml")
        );
    }

    #[test]
    fn test_discover_modules() {
        let mock = MockPal::new();
        mock.add_file(FilePath::from("module/BarConf/config/module.config.json"), b"{}".to_vec());
        mock.add_file(FilePath::from("module/Foo/config/module.config.yaml"), b"{}".to_vec());
        mock.add_file(FilePath::from("module/Foo/src/Foo.php"), b"".to_vec());
        mock.add_file(FilePath::from("module/README.md"), b"".to_vec());

        let registry = registry(&mock, &Config::default());
        let names: Vec<_> = registry.modules().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["BarConf", "Foo"]);

        let foo = registry.get("Foo").unwrap();
        assert_eq!(foo.path, FilePath::from("module/Foo"));
        assert_eq!(foo.format, ConfigFormat::Yaml);
    }

    #[test]
    fn test_discovery_ignores_yml_extension() {
        let mock = MockPal::new();
        mock.add_file(FilePath::from("module/Short/config/module.config.yml"), b"{}".to_vec());

        let registry = registry(&mock, &Config::default());
        assert_eq!(registry.modules().count(), 0);
        assert!(registry.get("Short").unwrap_err().is_not_found());
    }

    #[test]
    fn test_declared_module_overrides_discovered() {
        let mock = MockPal::new();
        mock.add_file(FilePath::from("module/BarConf/config/module.config.json"), b"{}".to_vec());
        let config = Config {
            module: vec![ModuleConfig {
                name: "BarConf".to_string(),
                path: "vendor/BarConf".to_string(),
            }],
            ..Config::default()
        };

        let registry = registry(&mock, &config);
        assert_eq!(registry.get("BarConf").unwrap().path, FilePath::from("vendor/BarConf"));
    }

    #[test]
    fn test_missing_modules_directory_is_not_an_error() {
        let config = Config {
            module: vec![ModuleConfig {
                name: "Only".to_string(),
                path: "lib/Only".to_string(),
            }],
            ..Config::default()
        };
        let registry = registry(&MockPal::new(), &config);
        assert_eq!(registry.modules().count(), 1);
    }

    #[test]
    fn test_unknown_module_is_not_found() {
        let registry = registry(&MockPal::new(), &Config::default());
        let err = registry.get("Nope").unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "Not found: module 'Nope'");
        assert!(registry.config_store("Nope").unwrap_err().is_not_found());
    }

    #[test]
    fn test_config_store_reads_module_file() {
        let mock = MockPal::new();
        mock.add_file(
            FilePath::from("module/BarConf/config/module.config.json"),
            br#"{"zf-rest": {}}"#.to_vec(),
        );
        let registry = registry(&mock, &Config::default());

        let store = registry.config_store("BarConf").unwrap();
        assert!(store.read().unwrap().contains(&["zf-rest"]));
    }
}
