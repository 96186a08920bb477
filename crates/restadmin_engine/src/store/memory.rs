use restadmin_base::RestAdminResult;

use crate::document::ConfigDocument;
use crate::store::traits::ConfigStore;

/// A configuration store that keeps the document in memory.
///
/// # Example
///
/// ```
/// use restadmin_engine::ConfigDocument;
/// use restadmin_engine::store::{InMemoryConfigStore, StoreHandle};
/// use serde_json::json;
///
/// let store = StoreHandle::new(InMemoryConfigStore::new());
/// store
///     .modify(|doc| {
///         doc.put(&["zf-rest"], json!({}));
///         Ok(())
///     })
///     .unwrap();
/// assert!(store.read().unwrap().contains(&["zf-rest"]));
/// ```
#[derive(Debug, Default)]
pub struct InMemoryConfigStore {
    document: ConfigDocument,
}

impl InMemoryConfigStore {
    /// Create a store holding an empty document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store seeded with `document`.
    pub fn with_document(document: ConfigDocument) -> Self {
        Self { document }
    }
}

impl ConfigStore for InMemoryConfigStore {
    fn read(&self) -> RestAdminResult<ConfigDocument> {
        Ok(self.document.clone())
    }

    fn write(&mut self, document: &ConfigDocument) -> RestAdminResult<()> {
        self.document = document.clone();
        Ok(())
    }
}
