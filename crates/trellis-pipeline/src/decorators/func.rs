//! Closure-backed decorators.
//!
//! ```
//! use std::sync::Arc;
//! use trellis_core::ApiError;
//! use trellis_pipeline::decorators::FnRequestDecorator;
//! use trellis_pipeline::{DecoratorRegistry, RequestFlow};
//!
//! let auth = FnRequestDecorator::new("auth", |req, _res| match req.header("x-auth") {
//!     Some(_) => Ok(RequestFlow::Continue(req.clone())),
//!     None => Err(ApiError::authentication("missing X-Auth").into()),
//! });
//!
//! let mut registry = DecoratorRegistry::new();
//! registry.register(Arc::new(auth), 100);
//! ```

use crate::decorator::{
    Capabilities, Decorator, DecoratorResult, RequestDecorator, RequestFlow, ResponseDecorator,
};
use std::fmt;
use std::sync::Arc;
use trellis_core::{ApiRequest, ApiResponse};

/// A pipeline request decorator backed by a closure.
pub struct FnRequestDecorator<F> {
    name: String,
    func: F,
}

impl<F> FnRequestDecorator<F>
where
    F: Fn(&ApiRequest, &ApiResponse) -> DecoratorResult<RequestFlow> + Send + Sync + 'static,
{
    /// Creates a named request decorator.
    pub fn new(name: impl Into<String>, func: F) -> Self {
        Self {
            name: name.into(),
            func,
        }
    }
}

impl<F> Decorator for FnRequestDecorator<F>
where
    F: Fn(&ApiRequest, &ApiResponse) -> DecoratorResult<RequestFlow> + Send + Sync + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn capabilities(self: Arc<Self>) -> Capabilities {
        Capabilities::new().request(self)
    }
}

impl<F> RequestDecorator for FnRequestDecorator<F>
where
    F: Fn(&ApiRequest, &ApiResponse) -> DecoratorResult<RequestFlow> + Send + Sync + 'static,
{
    fn decorate_request(
        &self,
        request: &ApiRequest,
        response: &ApiResponse,
    ) -> DecoratorResult<RequestFlow> {
        (self.func)(request, response)
    }
}

impl<F> fmt::Debug for FnRequestDecorator<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnRequestDecorator")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// A pipeline response decorator backed by a closure.
pub struct FnResponseDecorator<F> {
    name: String,
    func: F,
}

impl<F> FnResponseDecorator<F>
where
    F: Fn(&ApiRequest, &ApiResponse) -> DecoratorResult<ApiResponse> + Send + Sync + 'static,
{
    /// Creates a named response decorator.
    pub fn new(name: impl Into<String>, func: F) -> Self {
        Self {
            name: name.into(),
            func,
        }
    }
}

impl<F> Decorator for FnResponseDecorator<F>
where
    F: Fn(&ApiRequest, &ApiResponse) -> DecoratorResult<ApiResponse> + Send + Sync + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn capabilities(self: Arc<Self>) -> Capabilities {
        Capabilities::new().response(self)
    }
}

impl<F> ResponseDecorator for FnResponseDecorator<F>
where
    F: Fn(&ApiRequest, &ApiResponse) -> DecoratorResult<ApiResponse> + Send + Sync + 'static,
{
    fn decorate_response(
        &self,
        request: &ApiRequest,
        response: &ApiResponse,
    ) -> DecoratorResult<ApiResponse> {
        (self.func)(request, response)
    }
}

impl<F> fmt::Debug for FnResponseDecorator<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnResponseDecorator")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decorator::{classify, Capability};

    #[test]
    fn test_fn_request_decorator() {
        let decorator = FnRequestDecorator::new("tag", |req: &ApiRequest, _: &ApiResponse| {
            Ok(RequestFlow::Continue(req.clone().with_attribute("tagged", true)))
        });
        assert_eq!(decorator.name(), "tag");

        match decorator
            .decorate_request(&ApiRequest::get("/"), &ApiResponse::new())
            .unwrap()
        {
            RequestFlow::Continue(req) => assert!(req.attribute("tagged").is_some()),
            RequestFlow::ShortCircuit(_) => panic!("expected continue"),
        }
        assert!(classify(&Arc::new(decorator)).contains(Capability::Request));
    }

    #[test]
    fn test_fn_response_decorator() {
        let decorator = FnResponseDecorator::new("stamp", |_: &ApiRequest, res: &ApiResponse| {
            Ok(res.clone().with_header("x-stamp", "1"))
        });
        let out = decorator
            .decorate_response(&ApiRequest::get("/"), &ApiResponse::new())
            .unwrap();
        assert_eq!(out.header("x-stamp"), Some("1"));
        assert_eq!(
            classify(&Arc::new(decorator)).iter().collect::<Vec<_>>(),
            vec![Capability::Response]
        );
    }
}
