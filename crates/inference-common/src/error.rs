//! Error types for the InferenceService controller
//!
//! Errors are structured with fields to aid debugging in production.
//! Failures raised inside a reconcile pass are wrapped with the identity of
//! the step that produced them (component, ingress, status commit) so that the
//! event stream and the logs both say *where* a pass stopped.

use thiserror::Error;

use crate::crd::ComponentKind;

/// Default context value when no specific context is available
pub const UNKNOWN_CONTEXT: &str = "unknown";

/// Main error type for InferenceService reconciliation
#[derive(Debug, Error)]
pub enum Error {
    /// Kubernetes API error
    #[error("kubernetes error: {source}")]
    Kube {
        /// The underlying kube-rs error
        #[from]
        source: kube::Error,
    },

    /// Invalid spec or configuration
    #[error("validation error for {service}: {message}")]
    Validation {
        /// Name of the InferenceService (or `unknown`)
        service: String,
        /// Description of what's invalid
        message: String,
    },

    /// A component reconciler failed
    #[error("failed to reconcile {kind} component: {source}")]
    Component {
        /// Which component failed
        kind: ComponentKind,
        /// The component's own failure
        #[source]
        source: Box<Error>,
    },

    /// The ingress reconciler failed
    #[error("failed to reconcile ingress: {source}")]
    Ingress {
        /// The ingress reconciler's own failure
        #[source]
        source: Box<Error>,
    },

    /// Writing the status subresource failed
    #[error("failed to update status for {service}: {source}")]
    StatusUpdate {
        /// Name of the InferenceService whose status was being written
        service: String,
        /// The underlying store failure
        #[source]
        source: Box<Error>,
    },

    /// Internal/operational error
    #[error("internal error [{context}]: {message}")]
    Internal {
        /// Description of what failed
        message: String,
        /// Where the error occurred (e.g. "predictor", "store")
        context: String,
    },
}

impl Error {
    /// Create a validation error without service context
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            service: UNKNOWN_CONTEXT.to_string(),
            message: msg.into(),
        }
    }

    /// Create a validation error for a specific InferenceService
    pub fn validation_for(service: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Validation {
            service: service.into(),
            message: msg.into(),
        }
    }

    /// Wrap a failure with the identity of the component that produced it
    pub fn component(kind: ComponentKind, source: Error) -> Self {
        Self::Component {
            kind,
            source: Box::new(source),
        }
    }

    /// Wrap a failure raised by the ingress reconciler
    pub fn ingress(source: Error) -> Self {
        Self::Ingress {
            source: Box::new(source),
        }
    }

    /// Wrap a failed status write
    pub fn status_update(service: impl Into<String>, source: Error) -> Self {
        Self::StatusUpdate {
            service: service.into(),
            source: Box::new(source),
        }
    }

    /// API server NotFound for an InferenceService that disappeared mid-pass
    pub fn not_found(service: &str) -> Self {
        Self::Kube {
            source: kube::Error::Api(kube::core::ErrorResponse {
                status: "Failure".to_string(),
                message: format!("inferenceservices \"{}\" not found", service),
                reason: "NotFound".to_string(),
                code: 404,
            }),
        }
    }

    /// Create an internal error without specific context
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal {
            message: msg.into(),
            context: UNKNOWN_CONTEXT.to_string(),
        }
    }

    /// Create an internal error with context
    pub fn internal_with_context(context: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Internal {
            message: msg.into(),
            context: context.into(),
        }
    }

    /// Check if this error is retryable
    ///
    /// Validation errors need a spec change.
    /// Kubernetes errors are retryable unless they are 4xx responses, with
    /// the exception of 409 Conflict (a concurrent write won the race) and
    /// 429 Too Many Requests. Wrapped errors defer to their cause.
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Kube { source } => match source {
                kube::Error::Api(ae) => {
                    ae.code == 409 || ae.code == 429 || !(400..500).contains(&ae.code)
                }
                _ => true,
            },
            Error::Validation { .. } => false,
            Error::Component { source, .. } => source.is_retryable(),
            Error::Ingress { source } => source.is_retryable(),
            Error::StatusUpdate { source, .. } => source.is_retryable(),
            Error::Internal { .. } => true,
        }
    }

    /// The component that failed, if this error came from a component reconciler
    pub fn failed_component(&self) -> Option<ComponentKind> {
        match self {
            Error::Component { kind, .. } => Some(*kind),
            _ => None,
        }
    }

    /// Check if this is a 404 NotFound from the API server
    pub fn is_not_found(&self) -> bool {
        match self {
            Error::Kube {
                source: kube::Error::Api(ae),
            } => ae.code == 404,
            Error::StatusUpdate { source, .. } => source.is_not_found(),
            _ => false,
        }
    }

    /// Check if this is a 409 Conflict from the API server
    pub fn is_conflict(&self) -> bool {
        match self {
            Error::Kube {
                source: kube::Error::Api(ae),
            } => ae.code == 409,
            Error::StatusUpdate { source, .. } => source.is_conflict(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn api_error(code: u16, reason: &str) -> Error {
        Error::from(kube::Error::Api(kube::core::ErrorResponse {
            status: "Failure".to_string(),
            message: format!("{reason} from apiserver"),
            reason: reason.to_string(),
            code,
        }))
    }

    /// Story: a failing predictor is reported with its identity attached
    #[test]
    fn story_component_failure_names_the_component() {
        let err = Error::component(
            ComponentKind::Predictor,
            Error::internal_with_context("predictor", "deployment lookup failed"),
        );

        assert!(err.to_string().contains("predictor component"));
        assert!(err.to_string().contains("deployment lookup failed"));
        assert_eq!(err.failed_component(), Some(ComponentKind::Predictor));
    }

    #[test]
    fn ingress_and_status_wrappers_keep_the_cause() {
        let err = Error::ingress(Error::validation_for("sklearn", "empty ingress domain"));
        assert!(err.to_string().contains("failed to reconcile ingress"));
        assert!(err.to_string().contains("empty ingress domain"));
        assert_eq!(err.failed_component(), None);

        let err = Error::status_update("sklearn", Error::internal("boom"));
        assert!(err.to_string().contains("failed to update status for sklearn"));
        assert!(std::error::Error::source(&err).is_some());
    }

    /// Story: the error policy can tell transient from permanent failures
    #[test]
    fn story_retryability_follows_the_cause() {
        assert!(!Error::validation("bad spec").is_retryable());
        assert!(Error::internal("transient").is_retryable());

        let wrapped = Error::component(ComponentKind::Transformer, Error::validation("bad"));
        assert!(!wrapped.is_retryable());

        let wrapped = Error::ingress(Error::internal("transient"));
        assert!(wrapped.is_retryable());
    }

    #[test]
    fn kube_conflicts_are_retryable_other_client_errors_are_not() {
        let conflict = api_error(409, "Conflict");
        assert!(conflict.is_retryable());
        assert!(conflict.is_conflict());

        let forbidden = api_error(403, "Forbidden");
        assert!(!forbidden.is_retryable());
        assert!(!forbidden.is_conflict());

        let unavailable = api_error(503, "ServiceUnavailable");
        assert!(unavailable.is_retryable());

        let wrapped = Error::status_update("sklearn", api_error(409, "Conflict"));
        assert!(wrapped.is_conflict());
        assert!(wrapped.is_retryable());
    }

    #[test]
    fn not_found_is_permanent() {
        let err = Error::not_found("sklearn");
        assert!(err.is_not_found());
        assert!(!err.is_conflict());
        assert!(!err.is_retryable());
        assert!(err.to_string().contains("sklearn"));
        assert!(!api_error(409, "Conflict").is_not_found());
    }

    #[test]
    fn default_context_is_unknown() {
        match Error::validation("x") {
            Error::Validation { service, .. } => assert_eq!(service, UNKNOWN_CONTEXT),
            other => panic!("expected Validation, got {other:?}"),
        }
        assert!(Error::internal("x").to_string().contains("[unknown]"));
    }
}
