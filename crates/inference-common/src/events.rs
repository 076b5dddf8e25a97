//! Kubernetes Event recording for the InferenceService controller.
//!
//! Events are the user-visible side of a reconcile pass: failures and
//! readiness transitions show up in `kubectl describe inferenceservice`.
//!
//! Publishing is **fire-and-forget**. A failed event is logged and dropped;
//! it never fails or blocks the pass that emitted it.

use async_trait::async_trait;
use k8s_openapi::api::core::v1::ObjectReference;
use kube::runtime::events::{Event, EventType, Recorder, Reporter};
use kube::Client;
use tracing::warn;

/// Sink for Kubernetes Events attached to an object.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    /// Publish an Event about `resource_ref`.
    ///
    /// * `type_` - Normal or Warning
    /// * `reason` - machine-readable reason (see [`reasons`])
    /// * `action` - what the controller was doing (see [`actions`])
    /// * `note` - human-readable message
    async fn publish(
        &self,
        resource_ref: &ObjectReference,
        type_: EventType,
        reason: &str,
        action: &str,
        note: Option<String>,
    );
}

/// Publisher backed by `kube::runtime::events::Recorder`.
pub struct KubeEventPublisher {
    recorder: Recorder,
}

impl KubeEventPublisher {
    /// Create a publisher reporting as `controller_name`.
    pub fn new(client: Client, controller_name: &str) -> Self {
        let reporter = Reporter {
            controller: controller_name.to_string(),
            instance: std::env::var("POD_NAME").ok(),
        };
        Self {
            recorder: Recorder::new(client, reporter),
        }
    }
}

#[async_trait]
impl EventPublisher for KubeEventPublisher {
    async fn publish(
        &self,
        resource_ref: &ObjectReference,
        type_: EventType,
        reason: &str,
        action: &str,
        note: Option<String>,
    ) {
        let event = Event {
            type_,
            reason: reason.to_string(),
            note,
            action: action.to_string(),
            secondary: None,
        };
        if let Err(e) = self.recorder.publish(&event, resource_ref).await {
            warn!(
                reason,
                object = ?resource_ref.name,
                error = %e,
                "failed to publish event"
            );
        }
    }
}

/// Publisher that drops every event.
pub struct NoopEventPublisher;

#[async_trait]
impl EventPublisher for NoopEventPublisher {
    async fn publish(
        &self,
        _resource_ref: &ObjectReference,
        _type_: EventType,
        _reason: &str,
        _action: &str,
        _note: Option<String>,
    ) {
    }
}

/// Event reasons, shown in the REASON column of `kubectl get events`.
pub mod reasons {
    /// A component or ingress reconciler failed
    pub const INTERNAL_ERROR: &str = "InternalError";
    /// Writing the status subresource failed
    pub const UPDATE_FAILED: &str = "UpdateFailed";
    /// The InferenceService became Ready
    pub const READY: &str = "InferenceServiceReady";
    /// The InferenceService was Ready and no longer is
    pub const NOT_READY: &str = "InferenceServiceNotReady";
}

/// Event actions, shown in the ACTION column of `kubectl get events`.
pub mod actions {
    /// Running a component or ingress reconciler
    pub const RECONCILE: &str = "Reconcile";
    /// Committing status to the API server
    pub const UPDATE_STATUS: &str = "UpdateStatus";
}
