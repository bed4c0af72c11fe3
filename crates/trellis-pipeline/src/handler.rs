//! Endpoint invocation wrapped in the handler-level chains.

use crate::chain::Recovery;
use crate::registry::Chains;
use std::sync::Arc;
use tracing::debug;
use trellis_core::{
    ApiRequest, ApiResponse, DispatchError, Entity, Reply, ServiceRegistry,
};
use trellis_telemetry::logging::fields;

/// Runs the endpoint bound to a routed request.
///
/// In order:
///
/// 1. handler request chain
/// 2. service lookup from the bound [`Endpoint`](trellis_core::Endpoint)
/// 3. invocation, with the endpoint attached to the response
/// 4. reply classification: JSON objects and arrays become the response
///    [`Entity`], finished responses are used as-is, anything else fails with
///    [`DispatchError::UnsupportedReturnType`]
/// 5. handler exception chain if the endpoint returned an error
/// 6. handler response chain
#[derive(Debug, Clone)]
pub struct DecorableHandler {
    chains: Arc<Chains>,
    services: Arc<ServiceRegistry>,
}

impl DecorableHandler {
    /// Creates a handler over `chains` and `services`.
    #[must_use]
    pub fn new(chains: Arc<Chains>, services: Arc<ServiceRegistry>) -> Self {
        Self { chains, services }
    }

    /// The service registry.
    #[must_use]
    pub fn services(&self) -> &ServiceRegistry {
        &self.services
    }

    /// Handles a routed request.
    ///
    /// # Errors
    ///
    /// Wiring and contract errors, errors returned by handler decorators, and
    /// endpoint errors the handler exception chain did not recover.
    pub fn handle(
        &self,
        request: &ApiRequest,
        response: &ApiResponse,
    ) -> Result<ApiResponse, DispatchError> {
        let request = self
            .chains
            .handler_request()
            .run(request.clone(), response)?;

        let endpoint = request
            .endpoint()
            .cloned()
            .ok_or(DispatchError::MissingEndpoint)?;
        let target = endpoint.handler();

        let service = self.services.resolve_required(target.service())?;
        if !service.handles(target.method()) {
            return Err(DispatchError::MethodNotFound {
                service: target.service().to_string(),
                method: target.method().to_string(),
            });
        }

        let response = response.clone().with_endpoint(Arc::clone(&endpoint));
        debug!(
            { fields::SERVICE } = %target.service(),
            { fields::METHOD } = target.method(),
            "invoking endpoint"
        );

        let response = match service.call(target.method(), &request, &response) {
            Ok(reply) => into_response(reply, response)?,
            Err(error) => {
                debug!({ fields::ERROR } = %error, "endpoint failed");
                match self
                    .chains
                    .handler_exception()
                    .run(error, &request, &response)?
                {
                    Recovery::Recovered(recovered) => recovered,
                    Recovery::Unhandled(error) => return Err(error.into()),
                }
            }
        };

        self.chains.handler_response().run(&request, response)
    }
}

fn into_response(reply: Reply, response: ApiResponse) -> Result<ApiResponse, DispatchError> {
    match reply {
        Reply::Response(finished) => Ok(finished),
        Reply::Data(value @ (serde_json::Value::Object(_) | serde_json::Value::Array(_))) => {
            Ok(response.with_entity(Entity::new(value)))
        }
        Reply::Data(other) => Err(DispatchError::UnsupportedReturnType {
            found: json_kind(&other),
        }),
    }
}

const fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "bool",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}
