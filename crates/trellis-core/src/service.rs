//! Endpoint services and their registry.
//!
//! A [`Service`] owns a set of named methods. The [`ServiceRegistry`] is the
//! lookup the handler uses to turn an [`EndpointHandler`](crate::EndpointHandler)
//! into something callable. Services are registered once at startup and
//! shared behind `Arc` afterwards.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use trellis_core::service::{FnService, ServiceRegistry};
//! use trellis_core::{Reply, ServiceId};
//!
//! let users = FnService::new().method("show", |req, _res| {
//!     Ok(Reply::Data(serde_json::json!({ "path": req.path() })))
//! });
//!
//! let mut registry = ServiceRegistry::new();
//! registry.register_named("users", Arc::new(users));
//!
//! let service = registry.resolve(&ServiceId::from("users")).unwrap();
//! assert!(service.handles("show"));
//! assert!(!service.handles("delete"));
//! ```

use crate::{ApiRequest, ApiResponse, DispatchError, HandlerResult, ServiceId};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// A set of endpoint methods addressed by name.
pub trait Service: Send + Sync + 'static {
    /// Whether `method` exists on this service.
    fn handles(&self, method: &str) -> bool;

    /// Invokes `method`.
    ///
    /// Callers check [`Service::handles`] first; implementations may return
    /// any error for unknown methods.
    fn call(&self, method: &str, request: &ApiRequest, response: &ApiResponse) -> HandlerResult;
}

type MethodFn = dyn Fn(&ApiRequest, &ApiResponse) -> HandlerResult + Send + Sync;

/// A service assembled from closures.
#[derive(Default)]
pub struct FnService {
    methods: HashMap<String, Arc<MethodFn>>,
}

impl FnService {
    /// Creates a service with no methods.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a method. A second method with the same name replaces the first.
    #[must_use]
    pub fn method<F>(mut self, name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&ApiRequest, &ApiResponse) -> HandlerResult + Send + Sync + 'static,
    {
        self.methods.insert(name.into(), Arc::new(f));
        self
    }
}

impl Service for FnService {
    fn handles(&self, method: &str) -> bool {
        self.methods.contains_key(method)
    }

    fn call(&self, method: &str, request: &ApiRequest, response: &ApiResponse) -> HandlerResult {
        match self.methods.get(method) {
            Some(f) => f(request, response),
            None => Err(crate::ApiError::internal(format!(
                "method '{method}' is not defined"
            ))),
        }
    }
}

impl fmt::Debug for FnService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<_> = self.methods.keys().collect();
        names.sort();
        f.debug_struct("FnService").field("methods", &names).finish()
    }
}

/// Services keyed by [`ServiceId`].
#[derive(Default, Clone)]
pub struct ServiceRegistry {
    services: HashMap<ServiceId, Arc<dyn Service>>,
}

impl ServiceRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a service under its type name.
    pub fn register<S: Service>(&mut self, service: Arc<S>) {
        self.insert(ServiceId::of::<S>(), service);
    }

    /// Registers a service under an explicit id.
    pub fn register_named(&mut self, id: impl Into<ServiceId>, service: Arc<dyn Service>) {
        self.insert(id.into(), service);
    }

    fn insert(&mut self, id: ServiceId, service: Arc<dyn Service>) {
        if self.services.insert(id.clone(), service).is_some() {
            tracing::debug!(service = %id, "replaced registered service");
        }
    }

    /// Looks up a service.
    #[must_use]
    pub fn resolve(&self, id: &ServiceId) -> Option<Arc<dyn Service>> {
        self.services.get(id).cloned()
    }

    /// Looks up a service or fails with [`DispatchError::ServiceNotFound`].
    pub fn resolve_required(&self, id: &ServiceId) -> Result<Arc<dyn Service>, DispatchError> {
        self.resolve(id).ok_or_else(|| DispatchError::ServiceNotFound {
            service: id.to_string(),
        })
    }

    /// Checks if a service is registered.
    #[must_use]
    pub fn contains(&self, id: &ServiceId) -> bool {
        self.services.contains_key(id)
    }

    /// Returns the number of registered services.
    #[must_use]
    pub fn len(&self) -> usize {
        self.services.len()
    }

    /// Returns `true` if no services are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }
}

impl fmt::Debug for ServiceRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceRegistry")
            .field("service_count", &self.services.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ApiError, Reply};
    use serde_json::json;

    struct Greeter;

    impl Service for Greeter {
        fn handles(&self, method: &str) -> bool {
            method == "hello"
        }

        fn call(&self, _method: &str, _req: &ApiRequest, _res: &ApiResponse) -> HandlerResult {
            Ok(Reply::Data(json!({"greeting": "hello"})))
        }
    }

    #[test]
    fn test_register_by_type() {
        let mut registry = ServiceRegistry::new();
        registry.register(Arc::new(Greeter));

        assert!(registry.contains(&ServiceId::of::<Greeter>()));
        let service = registry.resolve_required(&ServiceId::of::<Greeter>()).unwrap();
        assert!(service.handles("hello"));
    }

    #[test]
    fn test_resolve_missing() {
        let registry = ServiceRegistry::new();
        assert!(registry.is_empty());
        let err = registry
            .resolve_required(&ServiceId::from("billing"))
            .err()
            .unwrap();
        assert!(matches!(err, DispatchError::ServiceNotFound { service } if service == "billing"));
    }

    #[test]
    fn test_register_named_replaces() {
        let mut registry = ServiceRegistry::new();
        registry.register_named("svc", Arc::new(FnService::new().method("a", |_, _| {
            Err(ApiError::conflict("a"))
        })));
        registry.register_named("svc", Arc::new(FnService::new().method("b", |_, _| {
            Err(ApiError::conflict("b"))
        })));

        assert_eq!(registry.len(), 1);
        let service = registry.resolve(&ServiceId::from("svc")).unwrap();
        assert!(!service.handles("a"));
        assert!(service.handles("b"));
    }

    #[test]
    fn test_fn_service_unknown_method() {
        let service = FnService::new();
        let result = service.call("missing", &ApiRequest::get("/"), &ApiResponse::new());
        assert!(matches!(result, Err(ApiError::Internal { .. })));
    }
}
