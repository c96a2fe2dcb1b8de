//! Service registration table

use super::handler::GattServiceHandler;
use crate::error::{Result, ServerError};
use crate::gatt::ServiceId;
use std::collections::HashMap;
use std::sync::Arc;

/// Registered service and its handler
#[derive(Clone)]
pub struct RegisteredService {
    pub id: ServiceId,
    pub handler: Arc<dyn GattServiceHandler>,
}

/// Mapping from service identity to handler, in registration order.
///
/// The table itself does no locking; the [`Dispatcher`](super::Dispatcher)
/// wraps it.
#[derive(Default)]
pub struct ServiceRegistry {
    entries: Vec<RegisteredService>,
    index: HashMap<ServiceId, usize>,
}

impl ServiceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a handler under the identity of its service definition.
    ///
    /// A second handler for an identity already present is rejected and the
    /// existing entry is left untouched.
    pub fn insert(&mut self, handler: Arc<dyn GattServiceHandler>) -> Result<ServiceId> {
        let id = handler.service().id();
        if self.index.contains_key(&id) {
            return Err(ServerError::DuplicateService(id));
        }

        self.index.insert(id, self.entries.len());
        self.entries.push(RegisteredService { id, handler });

        Ok(id)
    }

    pub fn get(&self, id: &ServiceId) -> Option<&Arc<dyn GattServiceHandler>> {
        self.index.get(id).map(|&i| &self.entries[i].handler)
    }

    pub fn contains(&self, id: &ServiceId) -> bool {
        self.index.contains_key(id)
    }

    /// Identities in registration order
    pub fn ids(&self) -> Vec<ServiceId> {
        self.entries.iter().map(|e| e.id).collect()
    }

    /// Handlers in registration order
    pub fn handlers(&self) -> Vec<Arc<dyn GattServiceHandler>> {
        self.entries.iter().map(|e| e.handler.clone()).collect()
    }

    pub fn last(&self) -> Option<&RegisteredService> {
        self.entries.last()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.index.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gatt::GattService;
    use crate::uuid::Uuid;

    struct Plain {
        service: GattService,
        name: &'static str,
    }

    impl GattServiceHandler for Plain {
        fn service(&self) -> &GattService {
            &self.service
        }

        fn name(&self) -> &str {
            self.name
        }
    }

    fn plain(uuid: u16, name: &'static str) -> Arc<dyn GattServiceHandler> {
        Arc::new(Plain {
            service: GattService::new(Uuid::from_u16(uuid)),
            name,
        })
    }

    #[test]
    fn test_insert_keeps_order() {
        let mut registry = ServiceRegistry::new();
        assert!(registry.is_empty());

        registry.insert(plain(0x180A, "dis")).unwrap();
        registry.insert(plain(0x1805, "cts")).unwrap();
        registry.insert(plain(0x180D, "hrs")).unwrap();

        let ids: Vec<u16> = registry
            .ids()
            .iter()
            .filter_map(|id| id.uuid.as_u16())
            .collect();
        assert_eq!(ids, vec![0x180A, 0x1805, 0x180D]);
        assert_eq!(registry.last().unwrap().handler.name(), "hrs");
        assert_eq!(registry.len(), 3);
    }

    #[test]
    fn test_duplicate_rejected_without_replacing() {
        let mut registry = ServiceRegistry::new();
        let id = registry.insert(plain(0x180D, "first")).unwrap();

        let err = registry.insert(plain(0x180D, "second")).unwrap_err();
        assert_eq!(err, ServerError::DuplicateService(id));
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get(&id).unwrap().name(), "first");
    }

    #[test]
    fn test_clear() {
        let mut registry = ServiceRegistry::new();
        let id = registry.insert(plain(0x180D, "hrs")).unwrap();
        registry.clear();
        assert!(!registry.contains(&id));
        assert!(registry.get(&id).is_none());
        assert!(registry.last().is_none());

        registry.insert(plain(0x180D, "hrs")).unwrap();
        assert!(registry.contains(&id));
    }
}
