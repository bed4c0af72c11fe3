//! The routing seam.

use trellis_core::{ApiError, ApiRequest};

/// Binds an [`Endpoint`](trellis_core::Endpoint) and path parameters onto a request.
///
/// Matching URLs is not Trellis' job; anything that can answer "which
/// endpoint handles this request" plugs in here. Closures work too:
///
/// ```
/// use trellis_core::{ApiError, ApiRequest, Endpoint, EndpointHandler};
/// use trellis_pipeline::Router;
///
/// let router = |req: &ApiRequest| -> Result<ApiRequest, ApiError> {
///     match req.path() {
///         "/health" => Ok(req
///             .clone()
///             .with_endpoint(Endpoint::new(EndpointHandler::new("health", "check")))),
///         path => Err(ApiError::not_found(format!("no route for {path}"))),
///     }
/// };
///
/// assert!(router.route(&ApiRequest::get("/health")).is_ok());
/// assert!(router.route(&ApiRequest::get("/nope")).is_err());
/// ```
pub trait Router: Send + Sync + 'static {
    /// Returns the routed request.
    ///
    /// Errors are domain errors (typically not found) and go through the
    /// pipeline exception chain.
    fn route(&self, request: &ApiRequest) -> Result<ApiRequest, ApiError>;
}

impl<F> Router for F
where
    F: Fn(&ApiRequest) -> Result<ApiRequest, ApiError> + Send + Sync + 'static,
{
    fn route(&self, request: &ApiRequest) -> Result<ApiRequest, ApiError> {
        self(request)
    }
}
