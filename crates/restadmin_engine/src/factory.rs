use std::collections::BTreeMap;

use parking_lot::Mutex;
use tracing::{debug, instrument};

use restadmin_base::{PalHandle, RestAdminResult};

use crate::config::Config;
use crate::db_connected::{DbConnectedFetchListener, DbConnectedRestServiceModel};
use crate::module::ModuleRegistry;
use crate::rest::RestServiceModel;
use crate::skeleton::SkeletonGenerator;
use crate::store::StoreHandle;

/// Builds the admin models of a module, wired to its configuration store.
///
/// Models built for the same module share one [`StoreHandle`], so their
/// read-modify-write cycles are serialized on the same lock.
#[derive(Debug)]
pub struct ModelFactory {
    registry: ModuleRegistry,
    source_extension: String,
    stores: Mutex<BTreeMap<String, StoreHandle>>,
}

impl ModelFactory {
    pub fn new(registry: ModuleRegistry, source_extension: impl Into<String>) -> Self {
        Self {
            registry,
            source_extension: source_extension.into(),
            stores: Mutex::new(BTreeMap::new()),
        }
    }

    /// Discover modules according to `config` and build a factory over them.
    pub fn from_config(pal: PalHandle, config: &Config) -> RestAdminResult<Self> {
        let registry = ModuleRegistry::discover(pal, config)?;
        Ok(Self::new(registry, config.source_extension.clone()))
    }

    pub fn registry(&self) -> &ModuleRegistry {
        &self.registry
    }

    /// The shared configuration store of `module`.
    pub fn store(&self, module: &str) -> RestAdminResult<StoreHandle> {
        let mut stores = self.stores.lock();
        if let Some(store) = stores.get(module) {
            return Ok(store.clone());
        }
        let store = self.registry.config_store(module)?;
        stores.insert(module.to_string(), store.clone());
        Ok(store)
    }

    /// A REST service registry for `module`, recasting db-connected services on fetch.
    #[instrument(skip(self))]
    pub fn rest_service_model(&self, module: &str) -> RestAdminResult<RestServiceModel> {
        let descriptor = self.registry.get(module)?.clone();
        let generator =
            SkeletonGenerator::new(self.registry.pal().clone(), self.source_extension.as_str())?;
        let mut model = RestServiceModel::new(descriptor, self.store(module)?, generator)?;
        model.attach_fetch_listener(DbConnectedFetchListener);
        debug!(listeners = model.events().len(), "REST service model built");
        Ok(model)
    }

    /// A db-connected REST service model for `module`.
    pub fn db_connected_model(&self, module: &str) -> RestAdminResult<DbConnectedRestServiceModel> {
        Ok(DbConnectedRestServiceModel::new(self.rest_service_model(module)?))
    }
}
