//! The parameter mapping decorator.

use crate::parameters::ParameterMapper;
use std::sync::Arc;
use trellis_core::{ApiRequest, ApiResponse};
use trellis_pipeline::{
    Capabilities, Decorator, DecoratorResult, HandlerRequestDecorator, RequestFlow,
};

/// Priority the decorator is registered with unless configured otherwise.
pub const DEFAULT_PRIORITY: i32 = 100;

/// Runs a [`ParameterMapper`] in the handler request chain, so endpoints
/// find their declared parameters as typed request attributes.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use trellis_mapping::{CoercionPolicy, ParameterMapper, RequestParametersDecorator, TypeMapperRegistry, DEFAULT_PRIORITY};
/// use trellis_pipeline::decorator::Capability;
/// use trellis_pipeline::DecoratorRegistry;
///
/// let mapper = ParameterMapper::new(TypeMapperRegistry::with_defaults(CoercionPolicy::Permissive));
/// let mut registry = DecoratorRegistry::new();
/// registry.register(Arc::new(RequestParametersDecorator::new(mapper)), DEFAULT_PRIORITY);
///
/// let chains = registry.distribute();
/// assert_eq!(chains.names(Capability::HandlerRequest), vec!["request_parameters"]);
/// ```
#[derive(Debug, Clone)]
pub struct RequestParametersDecorator {
    mapper: ParameterMapper,
}

impl RequestParametersDecorator {
    /// Wraps `mapper`.
    #[must_use]
    pub const fn new(mapper: ParameterMapper) -> Self {
        Self { mapper }
    }

    /// The wrapped mapper.
    #[must_use]
    pub const fn mapper(&self) -> &ParameterMapper {
        &self.mapper
    }
}

impl Decorator for RequestParametersDecorator {
    fn name(&self) -> &str {
        "request_parameters"
    }

    fn capabilities(self: Arc<Self>) -> Capabilities {
        Capabilities::new().handler_request(self)
    }
}

impl HandlerRequestDecorator for RequestParametersDecorator {
    fn decorate_handler_request(
        &self,
        request: &ApiRequest,
        response: &ApiResponse,
    ) -> DecoratorResult<RequestFlow> {
        self.mapper.map(request, response).map(RequestFlow::Continue)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapper::CoercionPolicy;
    use crate::registry::TypeMapperRegistry;
    use trellis_core::{DispatchError, Endpoint, EndpointHandler, EndpointParameter, Value};
    use trellis_pipeline::{classify, Capability};

    fn decorator() -> RequestParametersDecorator {
        RequestParametersDecorator::new(ParameterMapper::new(TypeMapperRegistry::with_defaults(
            CoercionPolicy::Permissive,
        )))
    }

    #[test]
    fn test_only_handler_request() {
        let set = classify(&Arc::new(decorator()));
        assert_eq!(set.iter().collect::<Vec<_>>(), vec![Capability::HandlerRequest]);
    }

    #[test]
    fn test_continues_with_mapped_request() {
        let request = ApiRequest::get("/items?n=3").with_endpoint(
            Endpoint::new(EndpointHandler::new("items", "list"))
                .with_parameter(EndpointParameter::new("n", "int").in_query()),
        );
        match decorator()
            .decorate_handler_request(&request, &ApiResponse::new())
            .unwrap()
        {
            RequestFlow::Continue(mapped) => {
                assert_eq!(mapped.attribute("n"), Some(&Value::Int(3)));
            }
            RequestFlow::ShortCircuit(_) => panic!("mapping never short-circuits"),
        }
    }

    #[test]
    fn test_propagates_missing_endpoint() {
        let err = decorator()
            .decorate_handler_request(&ApiRequest::get("/"), &ApiResponse::new())
            .unwrap_err();
        assert!(matches!(err, DispatchError::MissingEndpoint));
    }
}
