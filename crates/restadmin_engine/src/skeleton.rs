/* 📖 # Why render skeletons from templates?

Generated classes are plain boilerplate that differs only in namespace and class
name. Keeping them as minijinja templates makes the emitted text easy to read and
snapshot-test, and keeps source generation out of the registry logic.

Target paths follow the module's autoloading layout: the fully-qualified class name
with `\` turned into `/`, below the module's `src` directory.
*/

use std::fmt;

use minijinja::{Environment, context};
use tracing::{debug, instrument};

use restadmin_base::{FilePath, PalHandle, RestAdminError, RestAdminResult, ResultExt, err};

use crate::module::ModuleDescriptor;

const ENTITY_TEMPLATE: &str = r"<?php
namespace {{ namespace }};

class {{ class_name }} extends \ArrayObject
{
}
";

const COLLECTION_TEMPLATE: &str = r"<?php
namespace {{ namespace }};

use Zend\Paginator\Paginator;

class {{ class_name }} extends Paginator
{
}
";

const RESOURCE_TEMPLATE: &str = r"<?php
namespace {{ namespace }};

use ZF\ApiProblem\ApiProblem;
use ZF\Rest\AbstractResourceListener;

class {{ class_name }} extends AbstractResourceListener
{
{% for method in methods %}
{% if not loop.first %}

{% endif %}
    public function {{ method }}({{ arguments[method] }})
    {
        return new ApiProblem(405, 'The {{ method }} method has not been defined');
    }
{% endfor %}
}
";

const RESOURCE_METHODS: [(&str, &str); 8] = [
    ("create", "$data"),
    ("delete", "$id"),
    ("deleteList", "$data"),
    ("fetch", "$id"),
    ("fetchAll", "$params = array()"),
    ("patch", "$id, $data"),
    ("update", "$id, $data"),
    ("replaceList", "$data"),
];

/// The kinds of class a REST service gets generated for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkeletonKind {
    Entity,
    Collection,
    Resource,
}

impl SkeletonKind {
    fn template_name(self) -> &'static str {
        match self {
            SkeletonKind::Entity => "entity",
            SkeletonKind::Collection => "collection",
            SkeletonKind::Resource => "resource",
        }
    }
}

impl fmt::Display for SkeletonKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.template_name())
    }
}

/// Emits class skeletons into a module's source tree.
pub struct SkeletonGenerator {
    pal: PalHandle,
    extension: String,
    env: Environment<'static>,
}

impl SkeletonGenerator {
    pub fn new(pal: PalHandle, extension: impl Into<String>) -> RestAdminResult<Self> {
        let mut env = Environment::new();
        env.set_keep_trailing_newline(true);
        env.set_trim_blocks(true);
        for (kind, source) in [
            (SkeletonKind::Entity, ENTITY_TEMPLATE),
            (SkeletonKind::Collection, COLLECTION_TEMPLATE),
            (SkeletonKind::Resource, RESOURCE_TEMPLATE),
        ] {
            env.add_template(kind.template_name(), source)
                .map_err(|e| err!("Invalid {} template: {}", kind, e))?;
        }
        Ok(Self {
            pal,
            extension: extension.into(),
            env,
        })
    }

    /// The PAL the skeletons are written through.
    pub fn pal(&self) -> &PalHandle {
        &self.pal
    }

    /// Where the source of `class_name` lives inside `module`.
    pub fn class_path(&self, module: &ModuleDescriptor, class_name: &str) -> FilePath {
        module
            .source_path()
            .join(format!("{}.{}", class_name.replace('\\', "/"), self.extension))
    }

    /// Render the skeleton for the fully-qualified `class_name`.
    pub fn render(&self, kind: SkeletonKind, class_name: &str) -> RestAdminResult<String> {
        let (namespace, short_name) = class_name
            .rsplit_once('\\')
            .ok_or_else(|| {
                Box::new(RestAdminError::validation(format!(
                    "class name '{}' has no namespace",
                    class_name
                )))
            })?;
        let methods: Vec<&str> = RESOURCE_METHODS.iter().map(|(method, _)| *method).collect();
        let arguments: std::collections::BTreeMap<&str, &str> =
            RESOURCE_METHODS.iter().copied().collect();

        let template = self
            .env
            .get_template(kind.template_name())
            .map_err(|e| err!("Missing {} template: {}", kind, e))?;
        template
            .render(context! {
                namespace => namespace,
                class_name => short_name,
                methods => methods,
                arguments => arguments,
            })
            .map_err(|e| err!("Failed to render {} skeleton for '{}': {}", kind, class_name, e))
    }

    /// Render and write the skeleton, failing with a conflict if the file exists.
    #[instrument(skip(self, module), fields(module = %module.name))]
    pub fn generate(
        &self,
        module: &ModuleDescriptor,
        kind: SkeletonKind,
        class_name: &str,
    ) -> RestAdminResult<FilePath> {
        let path = self.class_path(module, class_name);
        if self.pal.file_exists(&path)? {
            return Err(Box::new(RestAdminError::conflict(format!(
                "{} class '{}' already exists at '{}'",
                kind, class_name, path
            ))));
        }
        let source = self.render(kind, class_name)?;
        self.pal
            .write_file(&path, source.as_bytes())
            .with_context(|| format!("Failed to generate {} skeleton", kind))?;
        debug!(%path, "skeleton generated");
        Ok(path)
    }
}

impl fmt::Debug for SkeletonGenerator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SkeletonGenerator")
            .field("extension", &self.extension)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigFormat;
    use expect_test::expect;
    use restadmin_base::{MockPal, Pal};

    fn generator(mock: &MockPal) -> SkeletonGenerator {
        SkeletonGenerator::new(PalHandle::new(mock.clone()), "php").unwrap()
    }

    fn module() -> ModuleDescriptor {
        ModuleDescriptor::new("BarConf", "module/BarConf", ConfigFormat::Json)
    }

    #[test]
    fn test_class_path() {
        let generator = generator(&MockPal::new());
        assert_eq!(
            generator.class_path(&module(), "BarConf\\Rest\\Barbaz\\BarbazEntity"),
            FilePath::from("module/BarConf/src/BarConf/Rest/Barbaz/BarbazEntity.php")
        );
    }

    #[test]
    fn test_render_entity() {
        let rendered = generator(&MockPal::new())
            .render(SkeletonKind::Entity, "BarConf\\Rest\\Barbaz\\BarbazEntity")
            .unwrap();
        expect![[r#"
            <?php
            namespace BarConf\Rest\Barbaz;

            class BarbazEntity extends \ArrayObject
            {
            }
        "#]]
        .assert_eq(&rendered);
    }

    #[test]
    fn test_render_collection() {
        let rendered = generator(&MockPal::new())
            .render(SkeletonKind::Collection, "BarConf\\Rest\\Barbaz\\BarbazCollection")
            .unwrap();
        expect![[r#"
            <?php
            namespace BarConf\Rest\Barbaz;

            use Zend\Paginator\Paginator;

            class BarbazCollection extends Paginator
            {
            }
        "#]]
        .assert_eq(&rendered);
    }

    #[test]
    fn test_render_resource_lists_every_method() {
        let rendered = generator(&MockPal::new())
            .render(SkeletonKind::Resource, "BarConf\\Rest\\Barbaz\\BarbazResource")
            .unwrap();
        assert!(rendered.starts_with("<?php\nnamespace BarConf\\Rest\\Barbaz;\n"));
        assert!(rendered.contains("class BarbazResource extends AbstractResourceListener"));
        for (method, arguments) in RESOURCE_METHODS {
            assert!(
                rendered.contains(&format!("public function {}({})", method, arguments)),
                "missing {}",
                method
            );
        }
        assert!(rendered.contains("    }\n\n    public function delete($id)"));
        assert!(rendered.ends_with("    }\n}\n"));
    }

    #[test]
    fn test_render_requires_namespace() {
        let err = generator(&MockPal::new())
            .render(SkeletonKind::Entity, "Barbaz")
            .unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn test_generate_writes_file_and_refuses_to_overwrite() {
        let mock = MockPal::new();
        let generator = generator(&mock);
        let class_name = "BarConf\\Rest\\Barbaz\\BarbazCollection";

        let path = generator
            .generate(&module(), SkeletonKind::Collection, class_name)
            .unwrap();
        assert!(mock.read_file_to_string(&path).unwrap().contains("class BarbazCollection"));

        let err = generator
            .generate(&module(), SkeletonKind::Collection, class_name)
            .unwrap_err();
        assert!(err.is_conflict());
    }
}
