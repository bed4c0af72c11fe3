//! Decorator registration and distribution.
//!
//! Decorators are registered once, with a priority, at wiring time. The
//! registry asks each one for its [`Capabilities`] and [`distribute`]s it into
//! every matching chain. The resulting [`Chains`] are immutable.
//!
//! [`distribute`]: DecoratorRegistry::distribute

use crate::chain::{Chain, ChainEntry};
use crate::decorator::{
    Capabilities, Capability, CapabilitySet, Decorator, ExceptionDecorator,
    HandlerExceptionDecorator, HandlerRequestDecorator, HandlerResponseDecorator,
    RequestDecorator, ResponseDecorator,
};
use std::sync::Arc;
use tracing::{debug, warn};
use trellis_telemetry::logging::fields;

struct Registration {
    name: Arc<str>,
    priority: i32,
    capabilities: Capabilities,
}

/// Collects decorators before dispatch starts.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use trellis_core::{ApiRequest, ApiResponse};
/// use trellis_pipeline::decorator::{Capabilities, Decorator, DecoratorResult, ResponseDecorator};
/// use trellis_pipeline::DecoratorRegistry;
///
/// struct Stamp;
///
/// impl Decorator for Stamp {
///     fn capabilities(self: Arc<Self>) -> Capabilities {
///         Capabilities::new().response(self)
///     }
/// }
///
/// impl ResponseDecorator for Stamp {
///     fn decorate_response(&self, _: &ApiRequest, res: &ApiResponse) -> DecoratorResult<ApiResponse> {
///         Ok(res.clone().with_header("x-stamp", "1"))
///     }
/// }
///
/// let mut registry = DecoratorRegistry::new();
/// assert!(!registry.register(Arc::new(Stamp), 10).is_empty());
///
/// let chains = registry.distribute();
/// assert_eq!(chains.response().len(), 1);
/// assert!(chains.request().is_empty());
/// ```
#[derive(Default)]
pub struct DecoratorRegistry {
    registrations: Vec<Registration>,
}

impl DecoratorRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `decorator` at `priority`. Higher priorities run first.
    ///
    /// Returns the capability tags the decorator was registered under. A
    /// decorator with no capability is logged and skipped, and the returned
    /// set is empty.
    pub fn register<D: Decorator>(&mut self, decorator: Arc<D>, priority: i32) -> CapabilitySet {
        let name: Arc<str> = Arc::from(decorator.name());
        let capabilities = decorator.capabilities();
        let set = capabilities.set();

        if set.is_empty() {
            warn!(
                { fields::DECORATOR } = %name,
                "decorator implements no capability, not registering it"
            );
            return set;
        }

        debug!(
            { fields::DECORATOR } = %name,
            { fields::PRIORITY } = priority,
            capabilities = ?set,
            "registered decorator"
        );
        self.registrations.push(Registration {
            name,
            priority,
            capabilities,
        });
        set
    }

    /// Number of registered decorators.
    #[must_use]
    pub fn len(&self) -> usize {
        self.registrations.len()
    }

    /// Returns true if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.registrations.is_empty()
    }

    /// Builds the six chains. Each decorator lands in every chain it has a
    /// capability for.
    #[must_use]
    pub fn distribute(&self) -> Chains {
        let mut chains = Chains::default();
        for reg in &self.registrations {
            let caps = &reg.capabilities;
            let name = &reg.name;
            if let Some(d) = &caps.request {
                chains.request.insert(ChainEntry::new(name.clone(), reg.priority, d.clone()));
            }
            if let Some(d) = &caps.handler_request {
                chains
                    .handler_request
                    .insert(ChainEntry::new(name.clone(), reg.priority, d.clone()));
            }
            if let Some(d) = &caps.handler_response {
                chains
                    .handler_response
                    .insert(ChainEntry::new(name.clone(), reg.priority, d.clone()));
            }
            if let Some(d) = &caps.response {
                chains.response.insert(ChainEntry::new(name.clone(), reg.priority, d.clone()));
            }
            if let Some(d) = &caps.handler_exception {
                chains
                    .handler_exception
                    .insert(ChainEntry::new(name.clone(), reg.priority, d.clone()));
            }
            if let Some(d) = &caps.exception {
                chains.exception.insert(ChainEntry::new(name.clone(), reg.priority, d.clone()));
            }
        }
        chains
    }
}

impl std::fmt::Debug for DecoratorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(
                self.registrations
                    .iter()
                    .map(|r| (&*r.name, r.priority, r.capabilities.set())),
            )
            .finish()
    }
}

/// The six stage chains, built once and read-only afterwards.
#[derive(Debug, Clone)]
pub struct Chains {
    request: Chain<dyn RequestDecorator>,
    handler_request: Chain<dyn HandlerRequestDecorator>,
    handler_response: Chain<dyn HandlerResponseDecorator>,
    response: Chain<dyn ResponseDecorator>,
    handler_exception: Chain<dyn HandlerExceptionDecorator>,
    exception: Chain<dyn ExceptionDecorator>,
}

impl Default for Chains {
    fn default() -> Self {
        Self {
            request: Chain::new(Capability::Request),
            handler_request: Chain::new(Capability::HandlerRequest),
            handler_response: Chain::new(Capability::HandlerResponse),
            response: Chain::new(Capability::Response),
            handler_exception: Chain::new(Capability::HandlerException),
            exception: Chain::new(Capability::Exception),
        }
    }
}

impl Chains {
    /// Pipeline request chain.
    #[must_use]
    pub const fn request(&self) -> &Chain<dyn RequestDecorator> {
        &self.request
    }

    /// Handler request chain.
    #[must_use]
    pub const fn handler_request(&self) -> &Chain<dyn HandlerRequestDecorator> {
        &self.handler_request
    }

    /// Handler response chain.
    #[must_use]
    pub const fn handler_response(&self) -> &Chain<dyn HandlerResponseDecorator> {
        &self.handler_response
    }

    /// Pipeline response chain.
    #[must_use]
    pub const fn response(&self) -> &Chain<dyn ResponseDecorator> {
        &self.response
    }

    /// Handler exception chain.
    #[must_use]
    pub const fn handler_exception(&self) -> &Chain<dyn HandlerExceptionDecorator> {
        &self.handler_exception
    }

    /// Pipeline exception chain.
    #[must_use]
    pub const fn exception(&self) -> &Chain<dyn ExceptionDecorator> {
        &self.exception
    }

    /// Decorator names of one stage, in execution order.
    #[must_use]
    pub fn names(&self, stage: Capability) -> Vec<&str> {
        match stage {
            Capability::Request => self.request.names(),
            Capability::HandlerRequest => self.handler_request.names(),
            Capability::HandlerResponse => self.handler_response.names(),
            Capability::Response => self.response.names(),
            Capability::HandlerException => self.handler_exception.names(),
            Capability::Exception => self.exception.names(),
        }
    }
}
