//! Endpoint parameter mapping.

use crate::error::{MappingError, UnmappedParameter};
use crate::registry::TypeMapperRegistry;
use crate::source::RawParameters;
use std::sync::Arc;
use tracing::debug;
use trellis_core::{
    ApiError, ApiRequest, ApiResponse, DispatchError, Endpoint, FieldErrors,
};
use trellis_telemetry::logging::fields;
use trellis_telemetry::metrics::record_parameters_mapped;

/// Resolves the declared parameters of the bound endpoint into typed
/// request attributes.
///
/// # Example
///
/// ```
/// use trellis_core::{ApiRequest, ApiResponse, Endpoint, EndpointHandler, EndpointParameter, PathParams, Value};
/// use trellis_mapping::{CoercionPolicy, ParameterMapper, TypeMapperRegistry};
///
/// let mapper = ParameterMapper::new(TypeMapperRegistry::with_defaults(CoercionPolicy::Permissive));
///
/// let mut params = PathParams::new();
/// params.push("id", "7");
/// let endpoint = Endpoint::new(EndpointHandler::new("users", "show"))
///     .with_parameter(EndpointParameter::new("id", "int"));
/// let request = ApiRequest::get("/users/7")
///     .with_path_params(params)
///     .with_endpoint(endpoint);
///
/// let mapped = mapper.map(&request, &ApiResponse::new()).unwrap();
/// assert_eq!(mapped.attribute("id"), Some(&Value::Int(7)));
/// ```
#[derive(Debug, Clone)]
pub struct ParameterMapper {
    registry: Arc<TypeMapperRegistry>,
}

impl ParameterMapper {
    /// Creates a mapper over `registry`.
    #[must_use]
    pub fn new(registry: impl Into<Arc<TypeMapperRegistry>>) -> Self {
        Self {
            registry: registry.into(),
        }
    }

    /// The type mapper registry.
    #[must_use]
    pub fn registry(&self) -> &TypeMapperRegistry {
        &self.registry
    }

    /// Returns a new request whose attributes hold the typed value of every
    /// declared parameter that is present.
    ///
    /// Missing required parameters and rejected values are collected and
    /// reported together. The response is only read.
    ///
    /// # Errors
    ///
    /// - [`DispatchError::MissingEndpoint`] if routing bound no endpoint
    /// - [`DispatchError::UnknownTypeKey`] if any declared type has no mapper,
    ///   checked before any value is read
    /// - [`DispatchError::Api`] with a validation error naming each bad parameter
    pub fn map(
        &self,
        request: &ApiRequest,
        _response: &ApiResponse,
    ) -> Result<ApiRequest, DispatchError> {
        let endpoint = request.endpoint().ok_or(DispatchError::MissingEndpoint)?;
        if endpoint.parameters().is_empty() {
            return Ok(request.clone());
        }
        self.check_endpoint(endpoint)?;

        let raw = RawParameters::decode(request, endpoint)?;
        let mut mapped = Vec::with_capacity(endpoint.parameters().len());
        let mut invalid = FieldErrors::new();

        for parameter in endpoint.parameters() {
            let Some(value) = raw.get(parameter.name(), parameter.source()) else {
                if parameter.is_required() {
                    invalid.add(
                        parameter.name(),
                        format!("missing required {} parameter", parameter.source()),
                    );
                }
                continue;
            };

            match self.registry.normalize(parameter.type_key(), &value) {
                Ok(typed) => {
                    debug!(
                        { fields::PARAMETER } = parameter.name(),
                        { fields::TYPE_KEY } = parameter.type_key(),
                        value = %typed,
                        "mapped parameter"
                    );
                    mapped.push((parameter.name().to_string(), typed));
                }
                Err(MappingError::Conversion { source, .. }) => {
                    invalid.add(parameter.name(), source.to_string());
                }
                Err(unknown @ MappingError::UnknownTypeKey { .. }) => return Err(unknown.into()),
            }
        }

        if !invalid.is_empty() {
            return Err(ApiError::validation_with_fields(
                format!("{} invalid parameter(s)", invalid.len()),
                invalid,
            )
            .into());
        }

        record_parameters_mapped(mapped.len() as u64);
        Ok(mapped
            .into_iter()
            .fold(request.clone(), |req, (name, value)| {
                req.with_attribute(name, value)
            }))
    }

    /// Checks that every parameter type `endpoint` declares has a mapper.
    ///
    /// # Errors
    ///
    /// [`UnmappedParameter`] for the first parameter with an unknown type key.
    pub fn check_endpoint(&self, endpoint: &Endpoint) -> Result<(), UnmappedParameter> {
        match endpoint
            .parameters()
            .iter()
            .find(|p| !self.registry.contains(p.type_key()))
        {
            Some(parameter) => Err(UnmappedParameter::new(
                parameter.name(),
                parameter.type_key(),
            )),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapper::CoercionPolicy;
    use trellis_core::{EndpointHandler, EndpointParameter, PathParams, Value};

    fn mapper(policy: CoercionPolicy) -> ParameterMapper {
        ParameterMapper::new(TypeMapperRegistry::with_defaults(policy))
    }

    fn bound(path: &str, params: &[(&str, &str)], declared: Vec<EndpointParameter>) -> ApiRequest {
        let mut path_params = PathParams::new();
        for (name, value) in params {
            path_params.push(*name, *value);
        }
        let endpoint = declared.into_iter().fold(
            Endpoint::new(EndpointHandler::new("users", "show")),
            Endpoint::with_parameter,
        );
        ApiRequest::get(path)
            .with_path_params(path_params)
            .with_endpoint(endpoint)
    }

    #[test]
    fn test_path_int_parameter() {
        let request = bound("/users/7", &[("id", "7")], vec![EndpointParameter::new("id", "int")]);
        let mapped = mapper(CoercionPolicy::Permissive)
            .map(&request, &ApiResponse::new())
            .unwrap();
        assert_eq!(mapped.attribute("id"), Some(&Value::Int(7)));
        // the original request is untouched
        assert!(request.attribute("id").is_none());
    }

    #[test]
    fn test_mixed_sources() {
        let request = bound(
            "/users/7?limit=2.5&q=x",
            &[("id", "7")],
            vec![
                EndpointParameter::new("id", "int"),
                EndpointParameter::new("limit", "float").in_query(),
                EndpointParameter::new("q", "string").in_query(),
                EndpointParameter::new("x-tenant", "string").in_header(),
            ],
        )
        .with_header("x-tenant", "acme");

        let mapped = mapper(CoercionPolicy::Permissive)
            .map(&request, &ApiResponse::new())
            .unwrap();
        assert_eq!(mapped.attribute("limit"), Some(&Value::Float(2.5)));
        assert_eq!(mapped.attribute("q"), Some(&Value::String("x".into())));
        assert_eq!(
            mapped.attribute("x-tenant"),
            Some(&Value::String("acme".into()))
        );
    }

    #[test]
    fn test_missing_endpoint() {
        let err = mapper(CoercionPolicy::Permissive)
            .map(&ApiRequest::get("/"), &ApiResponse::new())
            .unwrap_err();
        assert!(matches!(err, DispatchError::MissingEndpoint));
    }

    #[test]
    fn test_unknown_type_key() {
        let request = bound("/", &[("when", "2024-01-01")], vec![EndpointParameter::new("when", "date")]);
        let err = mapper(CoercionPolicy::Permissive)
            .map(&request, &ApiResponse::new())
            .unwrap_err();
        assert!(matches!(err, DispatchError::UnknownTypeKey { ref type_key } if type_key == "date"));
    }

    #[test]
    fn test_optional_absent_is_skipped() {
        let request = bound(
            "/users",
            &[],
            vec![EndpointParameter::new("page", "int").in_query().optional()],
        );
        let mapped = mapper(CoercionPolicy::Strict)
            .map(&request, &ApiResponse::new())
            .unwrap();
        assert!(mapped.attribute("page").is_none());
    }

    #[test]
    fn test_errors_are_collected() {
        let request = bound(
            "/users/abc?limit=lots",
            &[("id", "abc")],
            vec![
                EndpointParameter::new("id", "int"),
                EndpointParameter::new("limit", "float").in_query(),
                EndpointParameter::new("x-tenant", "string").in_header(),
            ],
        );
        let err = mapper(CoercionPolicy::Strict)
            .map(&request, &ApiResponse::new())
            .unwrap_err();

        let api = err.as_api().unwrap();
        assert_eq!(api.status_code(), 400);
        let fields = api.field_errors().unwrap();
        assert_eq!(fields.len(), 3);
        assert!(fields.get("id").is_some());
        assert!(fields.get("limit").is_some());
        assert_eq!(
            fields.get("x-tenant").unwrap(),
            ["missing required header parameter".to_string()]
        );
    }

    #[test]
    fn test_permissive_never_rejects_values() {
        let request = bound("/users/abc", &[("id", "abc")], vec![EndpointParameter::new("id", "int")]);
        let mapped = mapper(CoercionPolicy::Permissive)
            .map(&request, &ApiResponse::new())
            .unwrap();
        assert_eq!(mapped.attribute("id"), Some(&Value::Int(0)));
    }

    #[test]
    fn test_check_endpoint() {
        let mapper = mapper(CoercionPolicy::Permissive);
        let ok = Endpoint::new(EndpointHandler::new("s", "m"))
            .with_parameter(EndpointParameter::new("a", "int"));
        assert!(mapper.check_endpoint(&ok).is_ok());

        let bad = ok.with_parameter(EndpointParameter::new("b", "uuid"));
        assert_eq!(
            mapper.check_endpoint(&bad).unwrap_err(),
            UnmappedParameter::new("b", "uuid")
        );
    }

    #[test]
    fn test_unknown_type_key_on_absent_required_parameter() {
        let request = bound(
            "/events",
            &[],
            vec![EndpointParameter::new("since", "date").in_query()],
        );
        let err = mapper(CoercionPolicy::Strict)
            .map(&request, &ApiResponse::new())
            .unwrap_err();
        assert!(matches!(err, DispatchError::UnknownTypeKey { ref type_key } if type_key == "date"));
        assert!(!err.is_recoverable());
    }

    #[test]
    fn test_unknown_type_key_on_absent_optional_parameter() {
        let request = bound(
            "/events/3",
            &[("id", "3")],
            vec![
                EndpointParameter::new("id", "int"),
                EndpointParameter::new("since", "date").in_query().optional(),
            ],
        );
        let err = mapper(CoercionPolicy::Permissive)
            .map(&request, &ApiResponse::new())
            .unwrap_err();
        assert!(matches!(err, DispatchError::UnknownTypeKey { ref type_key } if type_key == "date"));
    }
}
