/* 📖 # Why create a ConfigStore trait?

The ConfigStore trait abstracts where a module's configuration document lives.
The admin models only ever read the whole document, change it in memory and write
the whole document back, so the trait is deliberately tiny:

1. **File store**: the module's `config/module.config.{json,yaml}` through the PAL
2. **In-memory store**: for tests that don't care about serialization

Models hold a StoreHandle and never see which backend they talk to.
*/

use std::sync::Arc;

use parking_lot::RwLock;

use restadmin_base::RestAdminResult;

use crate::document::ConfigDocument;

/// Trait for configuration document storage implementations.
pub trait ConfigStore: Send + Sync + 'static {
    /// Read the full current document.
    ///
    /// A store that has never been written returns an empty document.
    fn read(&self) -> RestAdminResult<ConfigDocument>;

    /// Replace the persisted document with `document`.
    fn write(&mut self, document: &ConfigDocument) -> RestAdminResult<()>;
}

/// A thread-safe handle to a configuration store.
///
/// StoreHandle provides cheap cloning (via Arc) and interior mutability (via RwLock),
/// following the same pattern as `PalHandle` in restadmin_base.
#[derive(Clone)]
pub struct StoreHandle(Arc<RwLock<dyn ConfigStore>>);

impl StoreHandle {
    /// Create a new StoreHandle wrapping the given store implementation.
    pub fn new<S: ConfigStore>(store: S) -> Self {
        Self(Arc::new(RwLock::new(store)))
    }

    /// Read the full document.
    ///
    /// See [`ConfigStore::read`] for details.
    pub fn read(&self) -> RestAdminResult<ConfigDocument> {
        self.0.read().read()
    }

    /// Replace the full document.
    ///
    /// See [`ConfigStore::write`] for details.
    pub fn write(&self, document: &ConfigDocument) -> RestAdminResult<()> {
        self.0.write().write(document)
    }

    /// Read the document, let `f` change it, and write it back.
    ///
    /// The write lock is held for the whole cycle, so two modifications through
    /// handles of the same store never interleave. If `f` fails nothing is written.
    pub fn modify<R, F>(&self, f: F) -> RestAdminResult<R>
    where
        F: FnOnce(&mut ConfigDocument) -> RestAdminResult<R>,
    {
        let mut store = self.0.write();
        let mut document = store.read()?;
        let result = f(&mut document)?;
        store.write(&document)?;
        Ok(result)
    }
}

impl std::fmt::Debug for StoreHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("StoreHandle")
    }
}
