use std::collections::BTreeMap;
use std::sync::Arc;

use crate::service::B2BService;

/// Maps service names to service instances.
#[derive(Default)]
pub struct ServiceRegistry {
    services: BTreeMap<String, Arc<dyn B2BService>>,
}

impl ServiceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<S>(&mut self, name: S, service: Arc<dyn B2BService>)
    where
        S: Into<String>,
    {
        self.services.insert(name.into(), service);
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn B2BService>> {
        self.services.get(name)
    }

    /// Registered names in sorted order.
    pub fn names(&self) -> Vec<String> {
        self.services.keys().cloned().collect()
    }
}
