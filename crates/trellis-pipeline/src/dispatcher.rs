//! The dispatch pipeline.
//!
//! ```text
//! http::Request ─► request chain ─┬─► router ─► DecorableHandler ─┬─► response chain ─► http::Response
//!                                 │                 │ ApiError    │
//!                                 │                 ▼             │
//!                                 │          exception chain ─────┤
//!                                 └── short-circuit ──────────────┘
//! ```

use crate::chain::{Decoration, Recovery};
use crate::handler::DecorableHandler;
use crate::registry::Chains;
use crate::router::Router;
use bytes::Bytes;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info_span, warn};
use trellis_core::{ApiRequest, ApiResponse, DispatchError, ServiceRegistry};
use trellis_telemetry::logging::fields;
use trellis_telemetry::metrics::{record_dispatch, DispatchOutcome};

/// Orchestrates one request through every stage.
///
/// A `Dispatcher` is immutable once built and is `Send + Sync`; share it
/// behind an `Arc` across threads.
///
/// # Example
///
/// ```
/// use bytes::Bytes;
/// use std::sync::Arc;
/// use trellis_core::{ApiError, ApiRequest, Endpoint, EndpointHandler, FnService, Reply, ServiceRegistry};
/// use trellis_pipeline::{DecoratorRegistry, Dispatcher};
///
/// let mut services = ServiceRegistry::new();
/// services.register_named(
///     "health",
///     Arc::new(FnService::new().method("check", |_, _| Ok(Reply::Data(serde_json::json!({"ok": true}))))),
/// );
///
/// let dispatcher = Dispatcher::new(DecoratorRegistry::new().distribute(), services)
///     .with_router(|req: &ApiRequest| -> Result<ApiRequest, ApiError> {
///         Ok(req.clone().with_endpoint(Endpoint::new(EndpointHandler::new("health", "check"))))
///     });
///
/// let response = dispatcher
///     .dispatch(
///         http::Request::new(Bytes::new()),
///         http::Response::new(Bytes::new()),
///     )
///     .unwrap();
/// assert_eq!(response.status(), 200);
/// ```
#[derive(Clone)]
pub struct Dispatcher {
    chains: Arc<Chains>,
    handler: DecorableHandler,
    router: Option<Arc<dyn Router>>,
}

impl Dispatcher {
    /// Creates a dispatcher without a router; requests must arrive with an
    /// endpoint already bound.
    #[must_use]
    pub fn new(chains: Chains, services: ServiceRegistry) -> Self {
        let chains = Arc::new(chains);
        let handler = DecorableHandler::new(Arc::clone(&chains), Arc::new(services));
        Self {
            chains,
            handler,
            router: None,
        }
    }

    /// Sets the router.
    #[must_use]
    pub fn with_router(mut self, router: impl Router) -> Self {
        self.router = Some(Arc::new(router));
        self
    }

    /// Sets a router that is already shared.
    #[must_use]
    pub fn with_shared_router(mut self, router: Arc<dyn Router>) -> Self {
        self.router = Some(router);
        self
    }

    /// The chains this dispatcher runs.
    #[must_use]
    pub fn chains(&self) -> &Chains {
        &self.chains
    }

    /// The handler used after routing.
    #[must_use]
    pub const fn handler(&self) -> &DecorableHandler {
        &self.handler
    }

    /// Dispatches a native request/response pair.
    ///
    /// The response argument is the template the pipeline starts from,
    /// usually an empty `200 OK`.
    ///
    /// # Errors
    ///
    /// Fatal wiring and contract errors, and domain errors no exception
    /// decorator recovered.
    pub fn dispatch(
        &self,
        request: http::Request<Bytes>,
        response: http::Response<Bytes>,
    ) -> Result<http::Response<Bytes>, DispatchError> {
        self.dispatch_api(ApiRequest::from_http(request), ApiResponse::from_http(response))
            .map(ApiResponse::into_http)
    }

    /// Dispatches already wrapped values.
    ///
    /// # Errors
    ///
    /// See [`Dispatcher::dispatch`].
    pub fn dispatch_api(
        &self,
        request: ApiRequest,
        response: ApiResponse,
    ) -> Result<ApiResponse, DispatchError> {
        let span = info_span!(
            "dispatch",
            { fields::HTTP_METHOD } = %request.method(),
            { fields::HTTP_PATH } = %request.path(),
        );
        let _enter = span.enter();
        let started = Instant::now();

        let result = self.run(request, response);

        match result {
            Ok((response, outcome)) => {
                record_dispatch(outcome, started.elapsed());
                debug!(
                    { fields::OUTCOME } = %outcome,
                    { fields::HTTP_STATUS } = response.status().as_u16(),
                    "dispatch finished"
                );
                Ok(response)
            }
            Err(error) => {
                record_dispatch(DispatchOutcome::Failed, started.elapsed());
                warn!({ fields::ERROR } = %error, recoverable = error.is_recoverable(), "dispatch failed");
                Err(error)
            }
        }
    }

    fn run(
        &self,
        request: ApiRequest,
        response: ApiResponse,
    ) -> Result<(ApiResponse, DispatchOutcome), DispatchError> {
        let (request, response, outcome) = match self.chains.request().run(request, &response)? {
            Decoration::EarlyReturn {
                request,
                response: early,
            } => (request, early, DispatchOutcome::ShortCircuited),
            Decoration::Proceed(request) => {
                let (request, handled) = match self.route(&request) {
                    Ok(routed) => {
                        let handled = self.handler.handle(&routed, &response);
                        (routed, handled)
                    }
                    Err(error) => (request, Err(error.into())),
                };

                match handled {
                    Ok(handled) => (request, handled, DispatchOutcome::Completed),
                    Err(DispatchError::Api(error)) => {
                        match self.chains.exception().run(error, &request, &response)? {
                            Recovery::Recovered(recovered) => {
                                (request, recovered, DispatchOutcome::Recovered)
                            }
                            Recovery::Unhandled(error) => return Err(error.into()),
                        }
                    }
                    Err(fatal) => return Err(fatal),
                }
            }
        };

        let response = self.chains.response().run(&request, response)?;
        Ok((response, outcome))
    }

    fn route(&self, request: &ApiRequest) -> Result<ApiRequest, trellis_core::ApiError> {
        match &self.router {
            Some(router) => router.route(request),
            None => Ok(request.clone()),
        }
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("chains", &self.chains)
            .field("services", &self.handler.services().len())
            .field("router", &self.router.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn test_dispatcher_is_send_sync() {
        assert_send_sync::<Dispatcher>();
    }

    #[test]
    fn test_no_router_without_endpoint_is_missing_endpoint() {
        let dispatcher = Dispatcher::new(Chains::default(), ServiceRegistry::new());
        let err = dispatcher
            .dispatch(
                http::Request::new(Bytes::new()),
                http::Response::new(Bytes::new()),
            )
            .unwrap_err();
        assert!(matches!(err, DispatchError::MissingEndpoint));
    }

    #[test]
    fn test_routing_error_without_exception_chain_propagates() {
        let dispatcher = Dispatcher::new(Chains::default(), ServiceRegistry::new())
            .with_router(|_: &ApiRequest| -> Result<ApiRequest, trellis_core::ApiError> {
                Err(trellis_core::ApiError::not_found("no route"))
            });
        let err = dispatcher
            .dispatch_api(ApiRequest::get("/x"), ApiResponse::new())
            .unwrap_err();
        assert!(err.is_recoverable());
        assert!(err.to_string().contains("no route"));
    }
}
