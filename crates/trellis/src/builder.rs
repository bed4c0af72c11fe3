//! Startup wiring: configuration, decorators and services in, an immutable
//! [`Dispatcher`] out.

use std::sync::Arc;

use tracing::{debug, info};
use trellis_config::{MappingConfig, TrellisConfig};
use trellis_core::{Endpoint, Service, ServiceId, ServiceRegistry};
use trellis_mapping::{ParameterMapper, RequestParametersDecorator, TypeMapper, TypeMapperRegistry};
use trellis_pipeline::{Decorator, DecoratorRegistry, Dispatcher, Router};

use crate::BuildError;

/// Entry point for wiring a pipeline.
#[derive(Debug, Clone, Copy)]
pub struct Trellis;

impl Trellis {
    /// Starts a new builder with the default configuration.
    #[must_use]
    pub fn builder() -> TrellisBuilder {
        TrellisBuilder::new()
    }
}

/// Builder for a [`Dispatcher`].
///
/// Decorators are registered in call order, so equal priorities keep the
/// order in which [`TrellisBuilder::decorator`] was called. The parameter
/// mapping decorator is registered last, at the configured priority.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use trellis::Trellis;
/// use trellis::core::{Endpoint, EndpointHandler, EndpointParameter, FnService, Reply};
///
/// let dispatcher = Trellis::builder()
///     .service_named(
///         "users",
///         Arc::new(FnService::new().method("show", |req, _| {
///             Ok(Reply::Data(serde_json::json!({ "id": req.attribute("id") })))
///         })),
///     )
///     .endpoint(
///         Endpoint::new(EndpointHandler::new("users", "show"))
///             .with_parameter(EndpointParameter::new("id", "int")),
///     )
///     .build()
///     .unwrap();
///
/// assert_eq!(
///     dispatcher.chains().names(trellis::pipeline::decorator::Capability::HandlerRequest),
///     vec!["request_parameters"]
/// );
/// ```
pub struct TrellisBuilder {
    config: TrellisConfig,
    decorators: DecoratorRegistry,
    services: ServiceRegistry,
    type_mappers: Vec<(String, Arc<dyn TypeMapper>)>,
    router: Option<Arc<dyn Router>>,
    endpoints: Vec<Endpoint>,
}

impl Default for TrellisBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TrellisBuilder {
    /// Creates a builder with the default configuration and nothing registered.
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: TrellisConfig::default(),
            decorators: DecoratorRegistry::new(),
            services: ServiceRegistry::new(),
            type_mappers: Vec::new(),
            router: None,
            endpoints: Vec::new(),
        }
    }

    /// Replaces the configuration.
    #[must_use]
    pub fn config(mut self, config: TrellisConfig) -> Self {
        self.config = config;
        self
    }

    /// Registers a decorator at `priority`. Higher priorities run first.
    #[must_use]
    pub fn decorator<D: Decorator>(mut self, decorator: Arc<D>, priority: i32) -> Self {
        self.decorators.register(decorator, priority);
        self
    }

    /// Registers a service under its type name.
    #[must_use]
    pub fn service<S: Service>(mut self, service: Arc<S>) -> Self {
        self.services.register(service);
        self
    }

    /// Registers a service under an explicit id.
    #[must_use]
    pub fn service_named(mut self, id: impl Into<ServiceId>, service: Arc<dyn Service>) -> Self {
        self.services.register_named(id, service);
        self
    }

    /// Adds a type mapper on top of the configured ones.
    ///
    /// A key that is also configured resolves to this mapper.
    #[must_use]
    pub fn type_mapper(mut self, type_key: impl Into<String>, mapper: Arc<dyn TypeMapper>) -> Self {
        self.type_mappers.push((type_key.into(), mapper));
        self
    }

    /// Sets the router.
    #[must_use]
    pub fn router(mut self, router: impl Router) -> Self {
        self.router = Some(Arc::new(router));
        self
    }

    /// Adds an endpoint whose parameters are checked against the type
    /// mappers at build time.
    #[must_use]
    pub fn endpoint(mut self, endpoint: Endpoint) -> Self {
        self.endpoints.push(endpoint);
        self
    }

    /// Adds several endpoints. See [`TrellisBuilder::endpoint`].
    #[must_use]
    pub fn endpoints(mut self, endpoints: impl IntoIterator<Item = Endpoint>) -> Self {
        self.endpoints.extend(endpoints);
        self
    }

    /// Validates the configuration, installs parameter mapping and builds
    /// the dispatcher.
    ///
    /// # Errors
    ///
    /// - [`BuildError::Config`] if the configuration is invalid
    /// - [`BuildError::UnknownTypeKey`] if a supplied endpoint references a
    ///   type key with no mapper
    pub fn build(self) -> Result<Dispatcher, BuildError> {
        self.config.validate()?;

        let Self {
            config,
            mut decorators,
            services,
            type_mappers,
            router,
            endpoints,
        } = self;

        match mapping_registry(&config.mapping, type_mappers) {
            Some(registry) => {
                let mapper = ParameterMapper::new(registry);
                for endpoint in &endpoints {
                    check_endpoint(&mapper, endpoint)?;
                }
                info!(
                    type_keys = mapper.registry().len(),
                    priority = config.mapping.priority,
                    coercion = ?config.mapping.coercion,
                    "parameter mapping installed"
                );
                decorators.register(
                    Arc::new(RequestParametersDecorator::new(mapper)),
                    config.mapping.priority,
                );
            }
            None => debug!("parameter mapping not installed"),
        }

        let mut dispatcher = Dispatcher::new(decorators.distribute(), services);
        if let Some(router) = router {
            dispatcher = dispatcher.with_shared_router(router);
        }
        Ok(dispatcher)
    }
}

// None when mapping is disabled or there is nothing to map with.
fn mapping_registry(
    config: &MappingConfig,
    extra: Vec<(String, Arc<dyn TypeMapper>)>,
) -> Option<TypeMapperRegistry> {
    if !config.enabled || (config.types.is_empty() && extra.is_empty()) {
        return None;
    }

    let mut registry = TypeMapperRegistry::new();
    for (type_key, mapper) in &config.types {
        registry.register(type_key.clone(), mapper.build(config.coercion));
    }
    for (type_key, mapper) in extra {
        registry.register(type_key, mapper);
    }
    Some(registry)
}

fn check_endpoint(mapper: &ParameterMapper, endpoint: &Endpoint) -> Result<(), BuildError> {
    mapper
        .check_endpoint(endpoint)
        .map_err(|unmapped| BuildError::UnknownTypeKey {
            endpoint: endpoint.mask().map_or_else(
                || format!("{}.{}", endpoint.handler().service(), endpoint.handler().method()),
                str::to_string,
            ),
            parameter: unmapped.parameter().to_string(),
            type_key: unmapped.type_key().to_string(),
        })
}
