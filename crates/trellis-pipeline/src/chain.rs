//! Chain executors.
//!
//! A [`Chain`] is the priority-ordered list of decorators for one stage. Each
//! stage has its own `run` with the contract of that stage:
//!
//! - request chains fold the request and may stop early ([`Decoration`])
//! - handler request chains fold the request and must never stop early
//! - response chains fold the response
//! - exception chains fold a recovery response, or report the error as
//!   unhandled when empty ([`Recovery`])
//!
//! Every step is logged at debug level with the decorator name, stage and
//! priority.

use crate::decorator::{
    Capability, DecoratorResult, ExceptionDecorator, HandlerExceptionDecorator,
    HandlerRequestDecorator, HandlerResponseDecorator, RequestDecorator, RequestFlow,
    ResponseDecorator,
};
use std::fmt;
use std::sync::Arc;
use tracing::debug;
use trellis_core::{ApiError, ApiRequest, ApiResponse, DispatchError};
use trellis_telemetry::logging::fields;
use trellis_telemetry::metrics::record_contract_violation;

/// One decorator in a chain.
pub struct ChainEntry<T: ?Sized> {
    name: Arc<str>,
    priority: i32,
    decorator: Arc<T>,
}

impl<T: ?Sized> ChainEntry<T> {
    /// Creates an entry.
    pub fn new(name: impl Into<Arc<str>>, priority: i32, decorator: Arc<T>) -> Self {
        Self {
            name: name.into(),
            priority,
            decorator,
        }
    }

    /// Decorator name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Registration priority.
    #[must_use]
    pub const fn priority(&self) -> i32 {
        self.priority
    }

    /// The decorator.
    #[must_use]
    pub const fn decorator(&self) -> &Arc<T> {
        &self.decorator
    }
}

impl<T: ?Sized> Clone for ChainEntry<T> {
    fn clone(&self) -> Self {
        Self {
            name: Arc::clone(&self.name),
            priority: self.priority,
            decorator: Arc::clone(&self.decorator),
        }
    }
}

impl<T: ?Sized> fmt::Debug for ChainEntry<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChainEntry")
            .field("name", &self.name)
            .field("priority", &self.priority)
            .finish_non_exhaustive()
    }
}

/// Decorators for one stage, highest priority first.
pub struct Chain<T: ?Sized> {
    stage: Capability,
    entries: Vec<ChainEntry<T>>,
}

impl<T: ?Sized> Chain<T> {
    /// Creates an empty chain for `stage`.
    #[must_use]
    pub const fn new(stage: Capability) -> Self {
        Self {
            stage,
            entries: Vec::new(),
        }
    }

    /// Inserts after every entry with a priority greater than or equal to
    /// the new one, so equal priorities keep registration order.
    pub fn insert(&mut self, entry: ChainEntry<T>) {
        let at = self
            .entries
            .partition_point(|existing| existing.priority >= entry.priority);
        self.entries.insert(at, entry);
    }

    /// The stage this chain runs.
    #[must_use]
    pub const fn stage(&self) -> Capability {
        self.stage
    }

    /// Entries in execution order.
    pub fn iter(&self) -> impl Iterator<Item = &ChainEntry<T>> {
        self.entries.iter()
    }

    /// Decorator names in execution order.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(ChainEntry::name).collect()
    }

    /// Number of decorators.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the chain has no decorators.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn trace(&self, entry: &ChainEntry<T>) {
        debug!(
            { fields::DECORATOR } = %entry.name,
            { fields::STAGE } = self.stage.name(),
            { fields::PRIORITY } = entry.priority,
            "applying decorator"
        );
    }
}

impl<T: ?Sized> Clone for Chain<T> {
    fn clone(&self) -> Self {
        Self {
            stage: self.stage,
            entries: self.entries.clone(),
        }
    }
}

impl<T: ?Sized> fmt::Debug for Chain<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Chain")
            .field("stage", &self.stage.name())
            .field("decorators", &self.names())
            .finish()
    }
}

/// Result of the pipeline request chain.
#[derive(Debug, Clone)]
pub enum Decoration {
    /// Every decorator continued; dispatch goes on with this request.
    Proceed(ApiRequest),
    /// A decorator stopped the chain.
    EarlyReturn {
        /// The latest request value when the chain stopped.
        request: ApiRequest,
        /// The response to send.
        response: ApiResponse,
    },
}

/// Result of an exception chain.
#[derive(Debug)]
pub enum Recovery {
    /// A response was produced for the error.
    Recovered(ApiResponse),
    /// No decorator handled the error.
    Unhandled(ApiError),
}

impl Chain<dyn RequestDecorator> {
    /// Folds the request through every decorator, stopping at the first
    /// short-circuit.
    pub fn run(&self, request: ApiRequest, response: &ApiResponse) -> DecoratorResult<Decoration> {
        let mut current = request;
        for entry in &self.entries {
            self.trace(entry);
            match entry.decorator.decorate_request(&current, response)? {
                RequestFlow::Continue(next) => current = next,
                RequestFlow::ShortCircuit(early) => {
                    debug!(
                        { fields::DECORATOR } = %entry.name,
                        { fields::HTTP_STATUS } = early.status().as_u16(),
                        "request short-circuited"
                    );
                    return Ok(Decoration::EarlyReturn {
                        request: current,
                        response: early,
                    });
                }
            }
        }
        Ok(Decoration::Proceed(current))
    }
}

impl Chain<dyn HandlerRequestDecorator> {
    /// Folds the routed request through every decorator.
    ///
    /// A short-circuit here fails with [`DispatchError::ContractViolation`].
    pub fn run(&self, request: ApiRequest, response: &ApiResponse) -> DecoratorResult<ApiRequest> {
        let mut current = request;
        for entry in &self.entries {
            self.trace(entry);
            match entry.decorator.decorate_handler_request(&current, response)? {
                RequestFlow::Continue(next) => current = next,
                RequestFlow::ShortCircuit(_) => {
                    record_contract_violation(self.stage.name());
                    return Err(DispatchError::contract_violation(
                        entry.name(),
                        self.stage.name(),
                        "handler request decorators must return a request, got a response",
                    ));
                }
            }
        }
        Ok(current)
    }
}

impl Chain<dyn HandlerResponseDecorator> {
    /// Folds the endpoint response through every decorator.
    pub fn run(&self, request: &ApiRequest, response: ApiResponse) -> DecoratorResult<ApiResponse> {
        let mut current = response;
        for entry in &self.entries {
            self.trace(entry);
            current = entry.decorator.decorate_handler_response(request, &current)?;
        }
        Ok(current)
    }
}

impl Chain<dyn ResponseDecorator> {
    /// Folds the outgoing response through every decorator.
    pub fn run(&self, request: &ApiRequest, response: ApiResponse) -> DecoratorResult<ApiResponse> {
        let mut current = response;
        for entry in &self.entries {
            self.trace(entry);
            current = entry.decorator.decorate_response(request, &current)?;
        }
        Ok(current)
    }
}

impl Chain<dyn HandlerExceptionDecorator> {
    /// Lets every decorator produce a response for `error`; the last one wins.
    pub fn run(
        &self,
        error: ApiError,
        request: &ApiRequest,
        response: &ApiResponse,
    ) -> DecoratorResult<Recovery> {
        if self.entries.is_empty() {
            return Ok(Recovery::Unhandled(error));
        }
        let mut current = response.clone();
        for entry in &self.entries {
            self.trace(entry);
            current = entry
                .decorator
                .decorate_handler_exception(&error, request, &current)?;
        }
        Ok(Recovery::Recovered(current))
    }
}

impl Chain<dyn ExceptionDecorator> {
    /// Lets every decorator produce a response for `error`; the last one wins.
    pub fn run(
        &self,
        error: ApiError,
        request: &ApiRequest,
        response: &ApiResponse,
    ) -> DecoratorResult<Recovery> {
        if self.entries.is_empty() {
            return Ok(Recovery::Unhandled(error));
        }
        let mut current = response.clone();
        for entry in &self.entries {
            self.trace(entry);
            current = entry.decorator.decorate_exception(&error, request, &current)?;
        }
        Ok(Recovery::Recovered(current))
    }
}
