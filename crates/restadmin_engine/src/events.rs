/* 📖 # Why an explicit listener list for fetch events?

Other admin models need to enrich what the REST service registry returns without
the registry knowing about them. The db-connected model is the first such
listener: it recasts a generic entity when its configuration marks it as
db-connected.

Listeners run synchronously in registration order. Each sees the entity as left by
the listeners before it and may hand back a replacement. There is no priority
mechanism; the factory attaches listeners in a fixed order.
*/

use std::fmt;

use tracing::trace;

use restadmin_base::RestAdminResult;

use crate::document::ConfigDocument;
use crate::entity::RestService;

/// Payload of a fetch event.
#[derive(Debug, Clone, Copy)]
pub struct FetchEvent<'a> {
    /// The entity as fetched so far.
    pub entity: &'a RestService,
    /// The module configuration the entity was read from.
    pub config: &'a ConfigDocument,
}

/// Observer of REST service fetches.
pub trait FetchListener: Send + Sync {
    /// Inspect a fetched entity; return `Some` to replace it.
    fn on_fetch(&self, event: &FetchEvent<'_>) -> RestAdminResult<Option<RestService>>;

    /// Name used in trace output.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

/// Ordered set of fetch listeners.
#[derive(Default)]
pub struct FetchEvents {
    listeners: Vec<Box<dyn FetchListener>>,
}

impl FetchEvents {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a listener; it runs after all previously attached ones.
    pub fn attach(&mut self, listener: impl FetchListener + 'static) {
        self.listeners.push(Box::new(listener));
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    /// Run every listener over `entity` and return the final result.
    ///
    /// The first listener error aborts the fetch.
    pub fn trigger(
        &self,
        entity: RestService,
        config: &ConfigDocument,
    ) -> RestAdminResult<RestService> {
        let mut current = entity;
        for listener in &self.listeners {
            let event = FetchEvent {
                entity: &current,
                config,
            };
            if let Some(replacement) = listener.on_fetch(&event)? {
                trace!(listener = listener.name(), "fetch result replaced");
                current = replacement;
            }
        }
        Ok(current)
    }
}

impl fmt::Debug for FetchEvents {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.listeners.iter().map(|listener| listener.name()))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{DbConnectedRestServiceEntity, RestServiceEntity};
    use parking_lot::Mutex;
    use restadmin_base::RestAdminError;
    use std::sync::Arc;

    struct Recorder {
        label: &'static str,
        seen: Arc<Mutex<Vec<String>>>,
    }

    impl FetchListener for Recorder {
        fn on_fetch(&self, event: &FetchEvent<'_>) -> RestAdminResult<Option<RestService>> {
            let kind = if event.entity.is_db_connected() { "db" } else { "generic" };
            self.seen.lock().push(format!("{}:{}", self.label, kind));
            Ok(None)
        }
    }

    struct Upgrade;

    impl FetchListener for Upgrade {
        fn on_fetch(&self, event: &FetchEvent<'_>) -> RestAdminResult<Option<RestService>> {
            let upgraded = DbConnectedRestServiceEntity::from_base(event.entity.base().clone());
            Ok(Some(RestService::DbConnected(upgraded)))
        }
    }

    struct Failing;

    impl FetchListener for Failing {
        fn on_fetch(&self, _event: &FetchEvent<'_>) -> RestAdminResult<Option<RestService>> {
            Err(Box::new(RestAdminError::validation("broken section")))
        }
    }

    fn entity() -> RestService {
        RestService::Generic(RestServiceEntity {
            resource_class: Some("Foo\\Rest\\Bar\\BarResource".to_string()),
            ..RestServiceEntity::default()
        })
    }

    #[test]
    fn test_no_listeners_returns_entity_unchanged() {
        let events = FetchEvents::new();
        assert!(events.is_empty());
        let result = events.trigger(entity(), &ConfigDocument::new()).unwrap();
        assert_eq!(result, entity());
    }

    #[test]
    fn test_listeners_run_in_order_and_see_replacements() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut events = FetchEvents::new();
        events.attach(Recorder {
            label: "first",
            seen: seen.clone(),
        });
        events.attach(Upgrade);
        events.attach(Recorder {
            label: "last",
            seen: seen.clone(),
        });

        let result = events.trigger(entity(), &ConfigDocument::new()).unwrap();

        assert!(result.is_db_connected());
        assert_eq!(result.base(), entity().base());
        assert_eq!(*seen.lock(), vec!["first:generic", "last:db"]);
    }

    #[test]
    fn test_listener_error_aborts_fetch() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut events = FetchEvents::new();
        events.attach(Failing);
        events.attach(Recorder {
            label: "never",
            seen: seen.clone(),
        });

        let err = events.trigger(entity(), &ConfigDocument::new()).unwrap_err();
        assert!(err.is_validation());
        assert!(seen.lock().is_empty());
    }
}
