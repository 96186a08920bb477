/* 📖 # Why does the registry own the identity derivation?

Every name of a REST service (controller, classes, route) derives from the module
name and the resource name. Deriving them in one place means a service created
through any model, generic or db-connected, lands in the configuration with the
same shape:

- `router.routes.<route_name>`: the Segment route with the controller default
- `zf-rest.<controller>`: listener (resource class), route and class names
- `zf-hal.metadata_map`: entity and collection rendering metadata
- `service_manager.invokables`: only when the resource class is generated here

Fetches read the same sections back and pass the result through the fetch
events, so listeners can recast it.
*/

use convert_case::{Case, Casing};
use regex::Regex;
use serde_json::{Value, json};
use tracing::{debug, info, instrument};

use restadmin_base::{RestAdminError, RestAdminResult, err};

use crate::document::ConfigDocument;
use crate::entity::{RestService, RestServiceEntity};
use crate::events::{FetchEvents, FetchListener};
use crate::module::ModuleDescriptor;
use crate::skeleton::{SkeletonGenerator, SkeletonKind};
use crate::store::StoreHandle;

const RESOURCE_NAME_PATTERN: &str = r"^[a-zA-Z][a-zA-Z0-9_]*(\\[a-zA-Z][a-zA-Z0-9_]*)*$";

const ROUTES: [&str; 2] = ["router", "routes"];
const REST: &str = "zf-rest";
const HAL_METADATA: [&str; 2] = ["zf-hal", "metadata_map"];
const INVOKABLES: [&str; 2] = ["service_manager", "invokables"];

/// Options for [`RestServiceModel::create_service_with`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CreateOptions {
    /// Generate the resource class skeleton and register it as an invokable.
    pub generate_resource_class: bool,
}

impl Default for CreateOptions {
    fn default() -> Self {
        Self {
            generate_resource_class: true,
        }
    }
}

/// What [`RestServiceModel::delete_service`] removes besides configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeleteMode {
    /// Only the configuration entries.
    #[default]
    ConfigOnly,
    /// Configuration entries and the generated source directory.
    Recursive,
}

/// Lifecycle of generic REST services within one module.
#[derive(Debug)]
pub struct RestServiceModel {
    module: ModuleDescriptor,
    store: StoreHandle,
    generator: SkeletonGenerator,
    events: FetchEvents,
    resource_name_pattern: Regex,
}

impl RestServiceModel {
    pub fn new(
        module: ModuleDescriptor,
        store: StoreHandle,
        generator: SkeletonGenerator,
    ) -> RestAdminResult<Self> {
        let resource_name_pattern = Regex::new(RESOURCE_NAME_PATTERN)
            .map_err(|e| err!("Invalid resource name pattern: {}", e))?;
        Ok(Self {
            module,
            store,
            generator,
            events: FetchEvents::new(),
            resource_name_pattern,
        })
    }

    pub fn module(&self) -> &ModuleDescriptor {
        &self.module
    }

    pub fn store(&self) -> &StoreHandle {
        &self.store
    }

    /// Attach a listener to the fetch event.
    pub fn attach_fetch_listener(&mut self, listener: impl FetchListener + 'static) {
        self.events.attach(listener);
    }

    pub fn events(&self) -> &FetchEvents {
        &self.events
    }

    /// Create a service with the default options; see [`Self::create_service_with`].
    pub fn create_service<'a>(
        &self,
        entity: &'a mut RestServiceEntity,
    ) -> RestAdminResult<&'a mut RestServiceEntity> {
        self.create_service_with(entity, CreateOptions::default())
    }

    /// Derive the missing identity fields of `entity`, generate its skeletons and
    /// register it in the module configuration.
    ///
    /// Returns the same entity, now fully populated.
    #[instrument(skip(self, entity), fields(module = %self.module.name, resource = ?entity.resource_name))]
    pub fn create_service_with<'a>(
        &self,
        entity: &'a mut RestServiceEntity,
        options: CreateOptions,
    ) -> RestAdminResult<&'a mut RestServiceEntity> {
        self.derive_identity(entity)?;
        let identity = Identity::from_entity(entity)?;

        self.store.modify(|doc| {
            if doc.contains(&[REST, identity.controller]) {
                return Err(Box::new(RestAdminError::conflict(format!(
                    "REST service '{}' already exists",
                    identity.controller
                ))));
            }
            if doc.contains(&[ROUTES[0], ROUTES[1], identity.route_name]) {
                return Err(Box::new(RestAdminError::conflict(format!(
                    "route '{}' already exists",
                    identity.route_name
                ))));
            }

            self.generator
                .generate(&self.module, SkeletonKind::Entity, identity.entity_class)?;
            self.generator
                .generate(&self.module, SkeletonKind::Collection, identity.collection_class)?;
            if options.generate_resource_class {
                self.generator
                    .generate(&self.module, SkeletonKind::Resource, identity.resource_class)?;
                doc.put(
                    &[INVOKABLES[0], INVOKABLES[1], identity.resource_class],
                    Value::from(identity.resource_class),
                );
            }

            identity.write_sections(doc);
            Ok(())
        })?;

        info!(controller = identity.controller, "REST service created");
        Ok(entity)
    }

    /// Fetch the service registered under `controller_service_name`.
    #[instrument(skip(self), fields(module = %self.module.name))]
    pub fn fetch(&self, controller_service_name: &str) -> RestAdminResult<RestService> {
        let doc = self.store.read()?;
        self.fetch_from(&doc, controller_service_name)
    }

    /// Fetch every service of the module, ordered by controller name.
    #[instrument(skip(self), fields(module = %self.module.name))]
    pub fn fetch_all(&self) -> RestAdminResult<Vec<RestService>> {
        let doc = self.store.read()?;
        let controllers: Vec<&String> = doc
            .get_map(&[REST])
            .map(|services| services.keys().collect())
            .unwrap_or_default();
        controllers
            .into_iter()
            .map(|controller| self.fetch_from(&doc, controller))
            .collect()
    }

    /// Apply the supplied `route_match` and `route_identifier_name` and return a fresh fetch.
    #[instrument(skip(self, entity), fields(module = %self.module.name, controller = ?entity.controller_service_name))]
    pub fn update_service(&self, entity: &RestServiceEntity) -> RestAdminResult<RestService> {
        let controller = entity.require_controller_service_name("update a REST service")?;

        self.store.modify(|doc| {
            let section = doc
                .get_map(&[REST, controller])
                .ok_or_else(|| not_registered(controller))?;
            let route_name = section
                .get("route_name")
                .and_then(Value::as_str)
                .map(str::to_string);
            let entity_class = section
                .get("entity_class")
                .and_then(Value::as_str)
                .map(str::to_string);

            if let (Some(route_match), Some(route_name)) = (&entity.route_match, &route_name) {
                doc.put(
                    &[ROUTES[0], ROUTES[1], route_name.as_str(), "options", "route"],
                    Value::from(route_match.as_str()),
                );
            }
            if let Some(identifier) = &entity.route_identifier_name {
                doc.put(
                    &[REST, controller, "route_identifier_name"],
                    Value::from(identifier.as_str()),
                );
                if let Some(entity_class) = &entity_class {
                    doc.put(
                        &[HAL_METADATA[0], HAL_METADATA[1], entity_class.as_str(), "route_identifier_name"],
                        Value::from(identifier.as_str()),
                    );
                }
            }
            Ok(())
        })?;

        info!(controller, "REST service updated");
        self.fetch(controller)
    }

    /// Remove the service's configuration entries, and with
    /// [`DeleteMode::Recursive`] its generated sources.
    ///
    /// Deleting a service that is already gone is not an error.
    #[instrument(skip(self, entity), fields(module = %self.module.name, controller = ?entity.controller_service_name))]
    pub fn delete_service(
        &self,
        entity: &RestServiceEntity,
        mode: DeleteMode,
    ) -> RestAdminResult<()> {
        let controller = entity.require_controller_service_name("delete a REST service")?;

        self.store.modify(|doc| {
            let persisted = doc.get_map(&[REST, controller]).cloned();
            let lookup = |key: &str, fallback: &Option<String>| {
                persisted
                    .as_ref()
                    .and_then(|section| section.get(key))
                    .and_then(Value::as_str)
                    .map(str::to_string)
                    .or_else(|| fallback.clone())
            };
            let route_name = lookup("route_name", &entity.route_name);
            let resource_class = lookup("listener", &entity.resource_class);
            let entity_class = lookup("entity_class", &entity.entity_class);
            let collection_class = lookup("collection_class", &entity.collection_class);

            doc.remove(&[REST, controller]);
            if let Some(route_name) = &route_name {
                doc.remove(&[ROUTES[0], ROUTES[1], route_name.as_str()]);
            }
            for class in [&entity_class, &collection_class].into_iter().flatten() {
                doc.remove(&[HAL_METADATA[0], HAL_METADATA[1], class.as_str()]);
            }
            if let Some(resource_class) = &resource_class {
                doc.remove(&[INVOKABLES[0], INVOKABLES[1], resource_class.as_str()]);
            }
            Ok(())
        })?;

        if mode == DeleteMode::Recursive {
            if let Some(namespace) = controller.strip_suffix("\\Controller") {
                let directory = self
                    .module
                    .source_path()
                    .join(namespace.replace('\\', "/"));
                let pal = self.generator.pal();
                if pal.file_exists(&directory)? {
                    pal.remove_directory_all(&directory)?;
                    debug!(%directory, "generated sources removed");
                }
            }
        }

        info!(controller, "REST service deleted");
        Ok(())
    }

    fn fetch_from(&self, doc: &ConfigDocument, controller: &str) -> RestAdminResult<RestService> {
        let section = doc
            .get_map(&[REST, controller])
            .ok_or_else(|| not_registered(controller))?;
        let text = |key: &str| section.get(key).and_then(Value::as_str).map(str::to_string);

        let route_name = text("route_name");
        let route_match = route_name.as_deref().and_then(|route_name| {
            doc.get_str(&[ROUTES[0], ROUTES[1], route_name, "options", "route"])
                .map(str::to_string)
        });
        let resource_name = format!("{}\\Rest\\", self.module.name);
        let resource_name = controller
            .strip_prefix(resource_name.as_str())
            .and_then(|rest| rest.strip_suffix("\\Controller"))
            .map(str::to_string);

        let entity = RestServiceEntity {
            resource_name,
            controller_service_name: Some(controller.to_string()),
            resource_class: text("listener"),
            entity_class: text("entity_class"),
            collection_class: text("collection_class"),
            route_name,
            route_match,
            route_identifier_name: text("route_identifier_name"),
            table_service: None,
        };
        debug!(controller, "REST service read");
        self.events.trigger(RestService::Generic(entity), doc)
    }

    fn derive_identity(&self, entity: &mut RestServiceEntity) -> RestAdminResult<()> {
        let resource = entity.resource_name.as_deref().ok_or_else(|| {
            Box::new(RestAdminError::validation(
                "resource_name is required to create a REST service",
            ))
        })?;
        if !self.resource_name_pattern.is_match(resource) {
            return Err(Box::new(RestAdminError::validation(format!(
                "invalid resource name '{}'",
                resource
            ))));
        }

        let namespace = format!("{}\\Rest\\{}", self.module.name, resource);
        let short_name = resource.rsplit('\\').next().unwrap_or(resource);
        let kebab_segments: Vec<String> = resource
            .split('\\')
            .map(|segment| segment.to_case(Case::Kebab))
            .collect();

        let derived = RestServiceEntity {
            resource_name: None,
            controller_service_name: Some(format!("{}\\Controller", namespace)),
            resource_class: Some(format!("{}\\{}Resource", namespace, short_name)),
            entity_class: Some(format!("{}\\{}Entity", namespace, short_name)),
            collection_class: Some(format!("{}\\{}Collection", namespace, short_name)),
            route_name: Some(format!(
                "{}.rest.{}",
                self.module.name.to_case(Case::Kebab),
                kebab_segments.join("-")
            )),
            route_match: Some(format!("/{}", kebab_segments.join("/"))),
            route_identifier_name: Some(format!("{}_id", short_name.to_case(Case::Snake))),
            table_service: None,
        };

        fill(&mut entity.controller_service_name, derived.controller_service_name);
        fill(&mut entity.resource_class, derived.resource_class);
        fill(&mut entity.entity_class, derived.entity_class);
        fill(&mut entity.collection_class, derived.collection_class);
        fill(&mut entity.route_name, derived.route_name);
        fill(&mut entity.route_match, derived.route_match);
        fill(&mut entity.route_identifier_name, derived.route_identifier_name);
        Ok(())
    }
}

fn fill(slot: &mut Option<String>, derived: Option<String>) {
    if slot.is_none() {
        *slot = derived;
    }
}

fn not_registered(controller: &str) -> Box<RestAdminError> {
    Box::new(RestAdminError::not_found(format!(
        "REST service '{}'",
        controller
    )))
}

/// Borrowed view of a fully derived entity.
struct Identity<'e> {
    controller: &'e str,
    resource_class: &'e str,
    entity_class: &'e str,
    collection_class: &'e str,
    route_name: &'e str,
    route_match: &'e str,
    route_identifier_name: &'e str,
}

impl<'e> Identity<'e> {
    fn from_entity(entity: &'e RestServiceEntity) -> RestAdminResult<Self> {
        let required = |value: &'e Option<String>, name: &str| {
            value.as_deref().ok_or_else(|| {
                Box::new(RestAdminError::validation(format!("{} is required", name)))
            })
        };
        Ok(Self {
            controller: required(&entity.controller_service_name, "controller_service_name")?,
            resource_class: required(&entity.resource_class, "resource_class")?,
            entity_class: required(&entity.entity_class, "entity_class")?,
            collection_class: required(&entity.collection_class, "collection_class")?,
            route_name: required(&entity.route_name, "route_name")?,
            route_match: required(&entity.route_match, "route_match")?,
            route_identifier_name: required(
                &entity.route_identifier_name,
                "route_identifier_name",
            )?,
        })
    }

    fn write_sections(&self, doc: &mut ConfigDocument) {
        doc.put(
            &[ROUTES[0], ROUTES[1], self.route_name],
            json!({
                "type": "Segment",
                "options": {
                    "route": self.route_match,
                    "defaults": {"controller": self.controller},
                },
            }),
        );
        doc.put(
            &[REST, self.controller],
            json!({
                "listener": self.resource_class,
                "route_name": self.route_name,
                "route_identifier_name": self.route_identifier_name,
                "entity_class": self.entity_class,
                "collection_class": self.collection_class,
            }),
        );
        doc.put(
            &[HAL_METADATA[0], HAL_METADATA[1], self.entity_class],
            json!({
                "route_name": self.route_name,
                "route_identifier_name": self.route_identifier_name,
            }),
        );
        doc.put(
            &[HAL_METADATA[0], HAL_METADATA[1], self.collection_class],
            json!({
                "route_name": self.route_name,
                "is_collection": true,
            }),
        );
    }
}
