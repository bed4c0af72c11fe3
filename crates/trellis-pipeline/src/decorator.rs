//! Decorator capability traits.
//!
//! A decorator is one value that opts into any of six stage contracts. Each
//! contract is its own trait; [`Decorator::capabilities`] reports which ones
//! the value implements so the registry can place it into every matching
//! chain at wiring time.
//!
//! | Capability | Trait | Returns |
//! |------------|-------|---------|
//! | `request` | [`RequestDecorator`] | [`RequestFlow`] (may short-circuit) |
//! | `handler_request` | [`HandlerRequestDecorator`] | [`RequestFlow`] (must continue) |
//! | `handler_response` | [`HandlerResponseDecorator`] | [`ApiResponse`] |
//! | `response` | [`ResponseDecorator`] | [`ApiResponse`] |
//! | `handler_exception` | [`HandlerExceptionDecorator`] | [`ApiResponse`] |
//! | `exception` | [`ExceptionDecorator`] | [`ApiResponse`] |
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use trellis_core::{ApiRequest, ApiResponse};
//! use trellis_pipeline::decorator::{
//!     Capabilities, Capability, Decorator, DecoratorResult, RequestDecorator, RequestFlow,
//!     ResponseDecorator,
//! };
//!
//! struct Trace;
//!
//! impl Decorator for Trace {
//!     fn name(&self) -> &str {
//!         "trace"
//!     }
//!
//!     fn capabilities(self: Arc<Self>) -> Capabilities {
//!         Capabilities::new().request(self.clone()).response(self)
//!     }
//! }
//!
//! impl RequestDecorator for Trace {
//!     fn decorate_request(&self, req: &ApiRequest, _: &ApiResponse) -> DecoratorResult<RequestFlow> {
//!         Ok(RequestFlow::Continue(req.clone().with_header("x-trace", "on")))
//!     }
//! }
//!
//! impl ResponseDecorator for Trace {
//!     fn decorate_response(&self, _: &ApiRequest, res: &ApiResponse) -> DecoratorResult<ApiResponse> {
//!         Ok(res.clone().with_header("x-traced", "1"))
//!     }
//! }
//!
//! let caps = Arc::new(Trace).capabilities().set();
//! assert!(caps.contains(Capability::Request));
//! assert!(caps.contains(Capability::Response));
//! assert!(!caps.contains(Capability::Exception));
//! ```

use std::fmt;
use std::sync::Arc;
use trellis_core::{ApiError, ApiRequest, ApiResponse, DispatchError};

/// Result returned by every decorator method.
pub type DecoratorResult<T> = Result<T, DispatchError>;

/// Outcome of a request decorator.
#[derive(Debug, Clone)]
pub enum RequestFlow {
    /// Pass this request to the next stage.
    Continue(ApiRequest),
    /// Stop request processing and answer with this response.
    ///
    /// Only pipeline-level request decorators may short-circuit.
    ShortCircuit(ApiResponse),
}

/// Base trait for everything that can be registered as a decorator.
pub trait Decorator: Send + Sync + 'static {
    /// Name used in logs and contract violation errors.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// Returns handles to every stage contract this decorator implements.
    fn capabilities(self: Arc<Self>) -> Capabilities;
}

/// Pipeline-level request stage, before routing.
pub trait RequestDecorator: Send + Sync {
    /// Transforms the request or short-circuits with a response.
    fn decorate_request(
        &self,
        request: &ApiRequest,
        response: &ApiResponse,
    ) -> DecoratorResult<RequestFlow>;
}

/// Handler-level request stage, after routing and before invocation.
pub trait HandlerRequestDecorator: Send + Sync {
    /// Transforms the routed request. Returning [`RequestFlow::ShortCircuit`]
    /// is a contract violation.
    fn decorate_handler_request(
        &self,
        request: &ApiRequest,
        response: &ApiResponse,
    ) -> DecoratorResult<RequestFlow>;
}

/// Handler-level response stage, right after invocation.
pub trait HandlerResponseDecorator: Send + Sync {
    /// Transforms the endpoint's response.
    fn decorate_handler_response(
        &self,
        request: &ApiRequest,
        response: &ApiResponse,
    ) -> DecoratorResult<ApiResponse>;
}

/// Pipeline-level response stage, the last stage before the response leaves.
pub trait ResponseDecorator: Send + Sync {
    /// Transforms the outgoing response.
    fn decorate_response(
        &self,
        request: &ApiRequest,
        response: &ApiResponse,
    ) -> DecoratorResult<ApiResponse>;
}

/// Handler-level exception stage, for errors raised by the endpoint.
pub trait HandlerExceptionDecorator: Send + Sync {
    /// Produces a response for `error`. Returning an error declines recovery.
    fn decorate_handler_exception(
        &self,
        error: &ApiError,
        request: &ApiRequest,
        response: &ApiResponse,
    ) -> DecoratorResult<ApiResponse>;
}

/// Pipeline-level exception stage, for errors the handler level did not recover.
pub trait ExceptionDecorator: Send + Sync {
    /// Produces a response for `error`. Returning an error declines recovery.
    fn decorate_exception(
        &self,
        error: &ApiError,
        request: &ApiRequest,
        response: &ApiResponse,
    ) -> DecoratorResult<ApiResponse>;
}

/// A stage contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum Capability {
    /// [`RequestDecorator`]
    Request = 0,
    /// [`HandlerRequestDecorator`]
    HandlerRequest = 1,
    /// [`HandlerResponseDecorator`]
    HandlerResponse = 2,
    /// [`ResponseDecorator`]
    Response = 3,
    /// [`HandlerExceptionDecorator`]
    HandlerException = 4,
    /// [`ExceptionDecorator`]
    Exception = 5,
}

impl Capability {
    /// Stage name used in logs, metrics and errors.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Request => "request",
            Self::HandlerRequest => "handler_request",
            Self::HandlerResponse => "handler_response",
            Self::Response => "response",
            Self::HandlerException => "handler_exception",
            Self::Exception => "exception",
        }
    }

    /// Returns true for the three stages that run around endpoint invocation.
    #[must_use]
    pub const fn is_handler_level(self) -> bool {
        matches!(
            self,
            Self::HandlerRequest | Self::HandlerResponse | Self::HandlerException
        )
    }

    /// All capabilities in declaration order.
    ///
    /// Exception stages come last; they run only when a stage fails.
    #[must_use]
    pub const fn all() -> [Capability; 6] {
        [
            Self::Request,
            Self::HandlerRequest,
            Self::HandlerResponse,
            Self::Response,
            Self::HandlerException,
            Self::Exception,
        ]
    }

    const fn bit(self) -> u8 {
        1 << (self as u8)
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A set of [`Capability`] tags.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct CapabilitySet(u8);

impl CapabilitySet {
    /// The empty set.
    #[must_use]
    pub const fn empty() -> Self {
        Self(0)
    }

    /// Adds a capability.
    #[must_use]
    pub const fn with(self, capability: Capability) -> Self {
        Self(self.0 | capability.bit())
    }

    /// Membership test.
    #[must_use]
    pub const fn contains(self, capability: Capability) -> bool {
        self.0 & capability.bit() != 0
    }

    /// Returns true if no capability is set.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Number of capabilities in the set.
    #[must_use]
    pub const fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    /// Iterates in execution order.
    pub fn iter(self) -> impl Iterator<Item = Capability> {
        Capability::all().into_iter().filter(move |c| self.contains(*c))
    }
}

impl fmt::Debug for CapabilitySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter().map(Capability::name)).finish()
    }
}

impl FromIterator<Capability> for CapabilitySet {
    fn from_iter<I: IntoIterator<Item = Capability>>(iter: I) -> Self {
        iter.into_iter().fold(Self::empty(), Self::with)
    }
}

/// Typed handles to the stage contracts a decorator implements.
#[derive(Clone, Default)]
pub struct Capabilities {
    pub(crate) request: Option<Arc<dyn RequestDecorator>>,
    pub(crate) handler_request: Option<Arc<dyn HandlerRequestDecorator>>,
    pub(crate) handler_response: Option<Arc<dyn HandlerResponseDecorator>>,
    pub(crate) response: Option<Arc<dyn ResponseDecorator>>,
    pub(crate) handler_exception: Option<Arc<dyn HandlerExceptionDecorator>>,
    pub(crate) exception: Option<Arc<dyn ExceptionDecorator>>,
}

impl Capabilities {
    /// No capabilities.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds the pipeline request capability.
    #[must_use]
    pub fn request(mut self, decorator: Arc<dyn RequestDecorator>) -> Self {
        self.request = Some(decorator);
        self
    }

    /// Adds the handler request capability.
    #[must_use]
    pub fn handler_request(mut self, decorator: Arc<dyn HandlerRequestDecorator>) -> Self {
        self.handler_request = Some(decorator);
        self
    }

    /// Adds the handler response capability.
    #[must_use]
    pub fn handler_response(mut self, decorator: Arc<dyn HandlerResponseDecorator>) -> Self {
        self.handler_response = Some(decorator);
        self
    }

    /// Adds the pipeline response capability.
    #[must_use]
    pub fn response(mut self, decorator: Arc<dyn ResponseDecorator>) -> Self {
        self.response = Some(decorator);
        self
    }

    /// Adds the handler exception capability.
    #[must_use]
    pub fn handler_exception(mut self, decorator: Arc<dyn HandlerExceptionDecorator>) -> Self {
        self.handler_exception = Some(decorator);
        self
    }

    /// Adds the pipeline exception capability.
    #[must_use]
    pub fn exception(mut self, decorator: Arc<dyn ExceptionDecorator>) -> Self {
        self.exception = Some(decorator);
        self
    }

    /// The capability tags present.
    #[must_use]
    pub fn set(&self) -> CapabilitySet {
        let mut set = CapabilitySet::empty();
        if self.request.is_some() {
            set = set.with(Capability::Request);
        }
        if self.handler_request.is_some() {
            set = set.with(Capability::HandlerRequest);
        }
        if self.handler_response.is_some() {
            set = set.with(Capability::HandlerResponse);
        }
        if self.response.is_some() {
            set = set.with(Capability::Response);
        }
        if self.handler_exception.is_some() {
            set = set.with(Capability::HandlerException);
        }
        if self.exception.is_some() {
            set = set.with(Capability::Exception);
        }
        set
    }

    /// Returns true if no capability is present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.set().is_empty()
    }
}

impl fmt::Debug for Capabilities {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Capabilities").field(&self.set()).finish()
    }
}

/// Reports the capability tags of `decorator`.
pub fn classify<D: Decorator>(decorator: &Arc<D>) -> CapabilitySet {
    Arc::clone(decorator).capabilities().set()
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Both;

    impl Decorator for Both {
        fn capabilities(self: Arc<Self>) -> Capabilities {
            Capabilities::new()
                .exception(self.clone())
                .handler_exception(self)
        }
    }

    impl ExceptionDecorator for Both {
        fn decorate_exception(
            &self,
            error: &ApiError,
            _: &ApiRequest,
            _: &ApiResponse,
        ) -> DecoratorResult<ApiResponse> {
            Ok(ApiResponse::from_error(error))
        }
    }

    impl HandlerExceptionDecorator for Both {
        fn decorate_handler_exception(
            &self,
            error: &ApiError,
            _: &ApiRequest,
            _: &ApiResponse,
        ) -> DecoratorResult<ApiResponse> {
            Ok(ApiResponse::from_error(error))
        }
    }

    struct Nothing;

    impl Decorator for Nothing {
        fn name(&self) -> &str {
            "nothing"
        }

        fn capabilities(self: Arc<Self>) -> Capabilities {
            Capabilities::new()
        }
    }

    #[test]
    fn test_classify_multiple_capabilities() {
        let set = classify(&Arc::new(Both));
        assert_eq!(set.len(), 2);
        assert_eq!(
            set.iter().collect::<Vec<_>>(),
            vec![Capability::HandlerException, Capability::Exception]
        );
    }

    #[test]
    fn test_classify_empty() {
        let set = classify(&Arc::new(Nothing));
        assert!(set.is_empty());
        assert_eq!(format!("{set:?}"), "{}");
    }

    #[test]
    fn test_default_name_is_type_name() {
        assert!(Both.name().ends_with("Both"));
        assert_eq!(Nothing.name(), "nothing");
    }

    #[test]
    fn test_capability_set_from_iter() {
        let set: CapabilitySet = [Capability::Response, Capability::Request, Capability::Request]
            .into_iter()
            .collect();
        assert_eq!(set.len(), 2);
        assert!(set.contains(Capability::Request));
        assert!(!set.contains(Capability::HandlerResponse));
    }

    #[test]
    fn test_all_follows_declaration_order() {
        let all = Capability::all();
        assert!(all.windows(2).all(|pair| pair[0] < pair[1]));
        assert_eq!(all.last(), Some(&Capability::Exception));
    }

    #[test]
    fn test_capability_levels() {
        let handler_level: Vec<_> = Capability::all()
            .into_iter()
            .filter(|c| c.is_handler_level())
            .map(Capability::name)
            .collect();
        assert_eq!(
            handler_level,
            vec!["handler_request", "handler_response", "handler_exception"]
        );
    }
}
