use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use tracing::{debug, info};

use crate::call::Registration;
use crate::error::ProxyError;
use crate::service::{CallHandler, ServiceProxy};

/// Maps service names to the proxy that serves them.
#[derive(Debug, Default)]
pub struct ProxyRegistry {
    by_service: RwLock<HashMap<String, ServiceProxy>>,
}

impl ProxyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `service` to `proxy`. A later registration for the same name wins.
    pub fn register(&self, service: impl Into<String>, proxy: ServiceProxy) {
        let service = service.into();
        let previous = self.by_service.write().insert(service.clone(), proxy.clone());
        match previous {
            Some(old) if !old.same_as(&proxy) => {
                info!(service = %service, proxy = %proxy.name(), replaced = %old.name(), "service re-registered");
            }
            Some(_) => debug!(service = %service, "service registration refreshed"),
            None => info!(service = %service, proxy = %proxy.name(), "service registered"),
        }
    }

    pub fn register_all<I, S>(&self, services: I, proxy: &ServiceProxy)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for service in services {
            self.register(service, proxy.clone());
        }
    }

    pub fn lookup(&self, service: &str) -> Result<ServiceProxy, ProxyError> {
        self.by_service
            .read()
            .get(service)
            .cloned()
            .ok_or_else(|| ProxyError::ProxyNotFound(service.to_string()))
    }

    pub fn contains(&self, service: &str) -> bool {
        self.by_service.read().contains_key(service)
    }

    /// Routes a call to whichever proxy owns `service`.
    pub async fn call_service(
        &self,
        service: &str,
        method: &str,
        params: Vec<u8>,
    ) -> Result<Vec<u8>, ProxyError> {
        let proxy = self.lookup(service)?;
        proxy.call_service(service, method, params).await
    }

    /// Registered service names, sorted.
    pub fn services(&self) -> Vec<String> {
        let mut names: Vec<String> = self.by_service.read().keys().cloned().collect();
        names.sort();
        names
    }

    /// Drops every service still bound to `proxy`. Returns the removed names.
    pub fn unregister_proxy(&self, proxy: &ServiceProxy) -> Vec<String> {
        let mut removed = Vec::new();
        self.by_service.write().retain(|name, p| {
            let keep = !p.same_as(proxy);
            if !keep {
                removed.push(name.clone());
            }
            keep
        });
        removed.sort();
        if !removed.is_empty() {
            info!(proxy = %proxy.name(), services = ?removed, "services unregistered");
        }
        removed
    }

    /// Handler for the first `call` a freshly launched backend sends.
    pub fn registration_handler(self: &Arc<Self>) -> Arc<dyn CallHandler> {
        Arc::new(RegistrationHandler {
            registry: Arc::clone(self),
        })
    }
}

pub struct RegistrationHandler {
    registry: Arc<ProxyRegistry>,
}

#[async_trait]
impl CallHandler for RegistrationHandler {
    async fn handle(&self, proxy: &ServiceProxy, body: Vec<u8>) -> Result<Vec<u8>, ProxyError> {
        let reg = Registration::decode(&body)?;
        self.registry.register_all(reg.service_names.iter().cloned(), proxy);
        reg.encode()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn idle_proxy(name: &str) -> ServiceProxy {
        let (a, _b) = tokio::io::duplex(64);
        let (r, w) = tokio::io::split(a);
        ServiceProxy::builder(name).attach(r, w)
    }

    #[tokio::test]
    async fn last_registration_wins() {
        let registry = ProxyRegistry::new();
        let first = idle_proxy("first");
        let second = idle_proxy("second");
        registry.register("users", first.clone());
        registry.register("users", second.clone());
        assert!(registry.lookup("users").unwrap().same_as(&second));
        assert!(registry.unregister_proxy(&first).is_empty());
    }

    #[tokio::test]
    async fn unknown_service_is_not_found() {
        let registry = ProxyRegistry::new();
        let err = registry.call_service("nope", "m", Vec::new()).await.unwrap_err();
        assert_eq!(err, ProxyError::ProxyNotFound("nope".to_string()));
    }

    #[tokio::test]
    async fn unregister_removes_all_names_of_a_proxy() {
        let registry = ProxyRegistry::new();
        let p = idle_proxy("p");
        registry.register_all(["b", "a"], &p);
        assert_eq!(registry.services(), vec!["a", "b"]);
        assert_eq!(registry.unregister_proxy(&p), vec!["a", "b"]);
        assert!(registry.services().is_empty());
    }
}
