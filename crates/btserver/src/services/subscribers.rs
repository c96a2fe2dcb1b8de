use crate::gap::Central;
use crate::uuid::Uuid;
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Centrals subscribed to each notifying characteristic of a service.
#[derive(Debug, Default)]
pub struct Subscribers {
    by_characteristic: RwLock<HashMap<Uuid, Vec<Central>>>,
}

impl Subscribers {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<Uuid, Vec<Central>>> {
        self.by_characteristic
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<Uuid, Vec<Central>>> {
        self.by_characteristic
            .write()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns false if the central was already subscribed.
    pub fn subscribe(&self, characteristic: Uuid, central: Central) -> bool {
        let mut map = self.write();
        let centrals = map.entry(characteristic).or_default();
        if centrals.contains(&central) {
            return false;
        }
        centrals.push(central);
        true
    }

    /// Returns false if the central was not subscribed.
    pub fn unsubscribe(&self, characteristic: &Uuid, central: &Central) -> bool {
        let mut map = self.write();
        let Some(centrals) = map.get_mut(characteristic) else {
            return false;
        };
        let before = centrals.len();
        centrals.retain(|c| c != central);
        centrals.len() != before
    }

    /// Forgets a central on every characteristic.
    pub fn remove_central(&self, central: &Central) {
        for centrals in self.write().values_mut() {
            centrals.retain(|c| c != central);
        }
    }

    /// Snapshot of the subscribers, in subscription order.
    pub fn subscribers(&self, characteristic: &Uuid) -> Vec<Central> {
        self.read()
            .get(characteristic)
            .cloned()
            .unwrap_or_default()
    }

    pub fn is_subscribed(&self, characteristic: &Uuid, central: &Central) -> bool {
        self.read()
            .get(characteristic)
            .is_some_and(|centrals| centrals.contains(central))
    }
}
