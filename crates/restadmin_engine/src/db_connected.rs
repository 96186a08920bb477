/* 📖 # Why recast at fetch time instead of storing a type tag?

A db-connected REST service is a regular REST service plus one configuration
section, `zf-api-first.db-connected.<resource class>`. The registry never learns
about that section. Instead the fetch listener looks for it on every fetch and, if
present, upgrades the generic entity into a `DbConnectedRestServiceEntity`.

This keeps the registry usable on its own and makes the section the single source
of truth: delete the section and the service is generic again.

Creation and update are wrapped rather than hooked:

1. **Create**: derive the identity through the registry (without a resource class
   skeleton, the table gateway replaces it), then write the section
2. **Update**: overlay the supplied fields onto the section, then update the
   identity through the registry and return a freshly fetched entity
3. **Delete**: delete through the registry, then drop the section

Identity creation and the section write are two store modifications. A failure in
between leaves a generic service behind; there is no rollback.
*/

use serde_json::Value;
use tracing::{debug, info, instrument};

use restadmin_base::{RestAdminError, RestAdminResult, ResultExt};

use crate::document::{ConfigDocument, value_kind};
use crate::entity::{
    DbConnectedRestServiceEntity, RestService, RestServiceEntity, TABLE_SERVICE_SUFFIX,
};
use crate::events::{FetchEvent, FetchListener};
use crate::rest::{CreateOptions, DeleteMode, RestServiceModel};
use crate::store::StoreHandle;

/// Configuration path holding one section per db-connected resource class.
pub const DB_CONNECTED_PATH: [&str; 2] = ["zf-api-first", "db-connected"];

/// Administers db-connected REST services of one module.
#[derive(Debug)]
pub struct DbConnectedRestServiceModel {
    rest: RestServiceModel,
    store: StoreHandle,
}

impl DbConnectedRestServiceModel {
    /// Wrap a registry. Attach a [`DbConnectedFetchListener`] to it so that its
    /// fetches are recast as well.
    pub fn new(rest: RestServiceModel) -> Self {
        let store = rest.store().clone();
        Self { rest, store }
    }

    /// The wrapped registry.
    pub fn rest(&self) -> &RestServiceModel {
        &self.rest
    }

    /// Create the generic service and its db-connected section.
    ///
    /// Missing fields are derived in place; the same entity is returned.
    #[instrument(skip(self, entity), fields(module = %self.rest.module().name, table = ?entity.table_name))]
    pub fn create_service<'a>(
        &self,
        entity: &'a mut DbConnectedRestServiceEntity,
    ) -> RestAdminResult<&'a mut DbConnectedRestServiceEntity> {
        let table_name = match entity.table_name.as_deref() {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => {
                return Err(Box::new(RestAdminError::validation(
                    "table_name is required to create a db-connected REST service",
                )));
            }
        };
        if entity.base.resource_name.is_none() {
            entity.base.resource_name = Some(upper_first(&table_name));
        }

        self.rest.create_service_with(
            &mut entity.base,
            CreateOptions {
                generate_resource_class: false,
            },
        )?;

        let resource_class = entity
            .base
            .require_resource_class("create a db-connected REST service")?
            .to_string();
        if entity.base.table_service.is_none() {
            entity.base.table_service = Some(default_table_service(&resource_class));
        }
        entity.hydrator_name = Some(entity.effective_hydrator_name().to_string());

        let section = Value::Object(entity.db_connected_config());
        self.store.modify(|doc| {
            doc.put(&section_path(&resource_class), section);
            Ok(())
        })?;

        info!(%resource_class, "db-connected REST service created");
        Ok(entity)
    }

    /// Overlay the set fields of `entity` onto the persisted section and update
    /// the identity, returning a freshly fetched entity.
    #[instrument(skip(self, entity), fields(module = %self.rest.module().name, resource_class = ?entity.base.resource_class))]
    pub fn update_service(
        &self,
        entity: &DbConnectedRestServiceEntity,
    ) -> RestAdminResult<DbConnectedRestServiceEntity> {
        let resource_class = entity
            .base
            .require_resource_class("update a db-connected REST service")?;
        if entity.table_name.as_deref() == Some("") {
            return Err(Box::new(RestAdminError::validation(
                "table_name must not be empty when updating a db-connected REST service",
            )));
        }
        let path = section_path(resource_class);

        let persisted_controller = self.store.modify(|doc| {
            if !doc.contains(&path) {
                return Err(not_db_connected(resource_class));
            }
            doc.merge(&path, Value::Object(entity.db_connected_config()));
            let mut merged = path.to_vec();
            merged.push("controller_service_name");
            Ok(doc.get_str(&merged).map(str::to_string))
        })?;
        debug!("db-connected section updated");

        let mut base = entity.base.clone();
        if base.controller_service_name.is_none() {
            base.controller_service_name = persisted_controller;
        }
        let updated = match self.rest.update_service(&base)? {
            RestService::DbConnected(updated) => updated,
            RestService::Generic(generic) => try_augment(&generic, &self.store.read()?)?
                .ok_or_else(|| not_db_connected(resource_class))?,
        };

        info!(resource_class, "db-connected REST service updated");
        Ok(updated)
    }

    /// Delete the generic service and the db-connected section.
    ///
    /// Deleting a service that is already gone is not an error.
    #[instrument(skip(self, entity), fields(module = %self.rest.module().name, resource_class = ?entity.base.resource_class))]
    pub fn delete_service(
        &self,
        entity: &DbConnectedRestServiceEntity,
        mode: DeleteMode,
    ) -> RestAdminResult<()> {
        let resource_class = entity
            .base
            .require_resource_class("delete a db-connected REST service")?;
        let path = section_path(resource_class);

        let mut base = entity.base.clone();
        if base.controller_service_name.is_none() {
            let doc = self.store.read()?;
            let mut controller_path = path.to_vec();
            controller_path.push("controller_service_name");
            base.controller_service_name = doc.get_str(&controller_path).map(str::to_string);
        }
        if base.controller_service_name.is_some() {
            self.rest.delete_service(&base, mode)?;
        } else {
            debug!("no controller known, only removing the db-connected section");
        }

        self.store.modify(|doc| {
            doc.remove(&path);
            Ok(())
        })?;

        info!(resource_class, "db-connected REST service deleted");
        Ok(())
    }

    /// Fetch a service through the registry.
    pub fn fetch(&self, controller_service_name: &str) -> RestAdminResult<RestService> {
        self.rest.fetch(controller_service_name)
    }

    /// Fetch every service of the module through the registry.
    pub fn fetch_all(&self) -> RestAdminResult<Vec<RestService>> {
        self.rest.fetch_all()
    }

    /// Recast the fetched entity if its configuration marks it as db-connected.
    pub fn on_fetch(&self, event: &FetchEvent<'_>) -> RestAdminResult<Option<RestService>> {
        DbConnectedFetchListener.on_fetch(event)
    }
}

/// Fetch listener recasting generic entities into db-connected ones.
#[derive(Debug, Clone, Copy, Default)]
pub struct DbConnectedFetchListener;

impl FetchListener for DbConnectedFetchListener {
    fn on_fetch(&self, event: &FetchEvent<'_>) -> RestAdminResult<Option<RestService>> {
        match event.entity {
            RestService::DbConnected(_) => Ok(None),
            RestService::Generic(entity) => {
                Ok(try_augment(entity, event.config)?.map(RestService::DbConnected))
            }
        }
    }

    fn name(&self) -> &str {
        "db-connected"
    }
}

/// Build the db-connected view of `entity` from its section in `config`.
///
/// Returns `None` when the entity has no resource class or no section.
pub fn try_augment(
    entity: &RestServiceEntity,
    config: &ConfigDocument,
) -> RestAdminResult<Option<DbConnectedRestServiceEntity>> {
    let Some(resource_class) = entity.resource_class.as_deref() else {
        return Ok(None);
    };
    let section = match config.get(&section_path(resource_class)) {
        None => return Ok(None),
        Some(Value::Object(section)) => section,
        Some(other) => {
            return Err(Box::new(RestAdminError::validation(format!(
                "db-connected configuration for '{}' must be a mapping, found {}",
                resource_class,
                value_kind(other)
            ))));
        }
    };

    let mut augmented = DbConnectedRestServiceEntity::from_base(entity.clone());
    augmented.exchange_array(section).with_context(|| {
        format!("Invalid db-connected configuration for '{}'", resource_class)
    })?;
    if augmented.base.table_service.is_none() {
        augmented.base.table_service = Some(default_table_service(resource_class));
    }
    debug!(resource_class, "entity recast as db-connected");
    Ok(Some(augmented))
}

fn section_path(resource_class: &str) -> [&str; 3] {
    [DB_CONNECTED_PATH[0], DB_CONNECTED_PATH[1], resource_class]
}

fn default_table_service(resource_class: &str) -> String {
    format!("{}{}", resource_class, TABLE_SERVICE_SUFFIX)
}

fn upper_first(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn not_db_connected(resource_class: &str) -> Box<RestAdminError> {
    Box::new(RestAdminError::not_found(format!(
        "db-connected REST service '{}'",
        resource_class
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const RESOURCE_CLASS: &str = "BarConf\\Rest\\Barbaz\\BarbazResource";

    fn generic() -> RestServiceEntity {
        RestServiceEntity {
            controller_service_name: Some("BarConf\\Rest\\Barbaz\\Controller".to_string()),
            resource_class: Some(RESOURCE_CLASS.to_string()),
            route_name: Some("bar-conf.rest.barbaz".to_string()),
            ..RestServiceEntity::default()
        }
    }

    fn config_with(section: Value) -> ConfigDocument {
        let mut doc = ConfigDocument::new();
        doc.put(&section_path(RESOURCE_CLASS), section);
        doc
    }

    #[test]
    fn test_upper_first() {
        assert_eq!(upper_first("barbaz"), "Barbaz");
        assert_eq!(upper_first("Barbaz"), "Barbaz");
        assert_eq!(upper_first("élan"), "Élan");
        assert_eq!(upper_first(""), "");
    }

    #[test]
    fn test_try_augment_without_section() {
        assert_eq!(try_augment(&generic(), &ConfigDocument::new()).unwrap(), None);
        assert_eq!(
            try_augment(&RestServiceEntity::default(), &config_with(json!({}))).unwrap(),
            None
        );
    }

    #[test]
    fn test_try_augment_copies_base_and_overlays_section() {
        let doc = config_with(json!({
            "table_name": "barbaz",
            "adapter_name": "DB\\Barbaz",
            "page_size": 25,
        }));

        let augmented = try_augment(&generic(), &doc).unwrap().unwrap();

        assert_eq!(augmented.base.route_name.as_deref(), Some("bar-conf.rest.barbaz"));
        assert_eq!(augmented.table_name.as_deref(), Some("barbaz"));
        assert_eq!(augmented.adapter_name.as_deref(), Some("DB\\Barbaz"));
        assert_eq!(augmented.page_size, Some(25));
        assert_eq!(
            augmented.base.table_service.as_deref(),
            Some("BarConf\\Rest\\Barbaz\\BarbazResource\\Table")
        );
    }

    #[test]
    fn test_try_augment_keeps_configured_table_service() {
        let doc = config_with(json!({"table_name": "barbaz", "table_service": "My\\Custom\\Table"}));
        let augmented = try_augment(&generic(), &doc).unwrap().unwrap();
        assert_eq!(augmented.base.table_service.as_deref(), Some("My\\Custom\\Table"));
    }

    #[test]
    fn test_try_augment_rejects_malformed_sections() {
        let err = try_augment(&generic(), &config_with(json!("barbaz"))).unwrap_err();
        assert!(err.is_validation());
        assert_eq!(
            err.to_string(),
            "Validation failed: db-connected configuration for 'BarConf\\Rest\\Barbaz\\BarbazResource' must be a mapping, found a string"
        );

        let err = try_augment(&generic(), &config_with(json!({"tablename": "x"}))).unwrap_err();
        assert!(err.is_validation());
        assert!(err.to_string().starts_with("Invalid db-connected configuration"));
    }

    #[test]
    fn test_listener_leaves_db_connected_entities_alone() {
        let doc = config_with(json!({"table_name": "barbaz"}));
        let already = RestService::DbConnected(DbConnectedRestServiceEntity::from_base(generic()));
        let event = FetchEvent {
            entity: &already,
            config: &doc,
        };
        assert_eq!(DbConnectedFetchListener.on_fetch(&event).unwrap(), None);

        let plain = RestService::Generic(generic());
        let event = FetchEvent {
            entity: &plain,
            config: &doc,
        };
        let recast = DbConnectedFetchListener.on_fetch(&event).unwrap().unwrap();
        assert!(recast.is_db_connected());
    }
}
