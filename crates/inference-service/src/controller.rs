//! InferenceService controller implementation
//!
//! A reconcile pass is fetch → components → ingress → status commit. The
//! watched object only supplies the key: the pass reads the object itself,
//! threads one mutable copy through every reconciler, and hands the result
//! to [`commit_status`]. A failing step ends the pass without writing
//! anything, so status keeps its last committed value until a later pass
//! gets all the way through.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use kube::runtime::controller::Action;
use kube::runtime::events::EventType;
use kube::{Client, Resource, ResourceExt};
use tracing::{debug, error, info, instrument, warn};

use inference_common::crd::{ComponentKind, InferenceService};
use inference_common::events::{actions, reasons, EventPublisher};
use inference_common::{Error, KubeEventPublisher, FIELD_MANAGER};

use crate::components::{ComponentSet, WorkloadComponentReconciler, WorkloadKubeClientImpl};
use crate::config::ControllerConfig;
use crate::ingress::{IngressReconciler, StatusIngressReconciler};
use crate::status::commit_status;
use crate::store::{InferenceServiceKubeClient, InferenceServiceKubeClientImpl};

/// Namespace/name identity of an InferenceService
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ObjectKey {
    /// Namespace of the object
    pub namespace: String,
    /// Name of the object
    pub name: String,
}

impl ObjectKey {
    /// Create a key
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }

    /// Key of an existing object; InferenceServices are namespaced
    pub fn from_object(isvc: &InferenceService) -> Result<Self, Error> {
        let name = isvc.name_any();
        let namespace = isvc
            .namespace()
            .ok_or_else(|| Error::validation_for(&name, "InferenceService must be namespaced"))?;
        Ok(Self { namespace, name })
    }
}

impl fmt::Display for ObjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

/// Per-key exponential backoff for retryable failures
pub struct ErrorBackoff {
    failures: DashMap<ObjectKey, u32>,
    base: Duration,
    max: Duration,
}

impl ErrorBackoff {
    /// Delays start at `base` and double per consecutive failure up to `max`
    pub fn new(base: Duration, max: Duration) -> Self {
        Self {
            failures: DashMap::new(),
            base,
            max,
        }
    }

    /// Record a failure for `key` and return how long to wait before retrying
    pub fn next_delay(&self, key: &ObjectKey) -> Duration {
        let mut failures = self.failures.entry(key.clone()).or_insert(0);
        let attempt = *failures;
        *failures = attempt.saturating_add(1);
        let factor = 2u32.saturating_pow(attempt.min(31));
        self.base.saturating_mul(factor).min(self.max)
    }

    /// Forget past failures for `key` (successful pass or deleted object)
    pub fn reset(&self, key: &ObjectKey) {
        self.failures.remove(key);
    }
}

/// Controller context for InferenceService reconciliation
///
/// Built once by the operator and shared by every pass.
pub struct InferenceServiceContext {
    /// Resource store
    pub kube: Arc<dyn InferenceServiceKubeClient>,
    /// Component reconcilers
    pub components: ComponentSet,
    /// Ingress reconciler, run after every component succeeded
    pub ingress: Arc<dyn IngressReconciler>,
    /// Event publisher for emitting Kubernetes Events
    pub events: Arc<dyn EventPublisher>,
    /// Requeue delays for retryable failures
    pub backoff: ErrorBackoff,
}

impl InferenceServiceContext {
    /// Create a context from explicit collaborators
    pub fn new(
        kube: Arc<dyn InferenceServiceKubeClient>,
        components: ComponentSet,
        ingress: Arc<dyn IngressReconciler>,
        events: Arc<dyn EventPublisher>,
        config: &ControllerConfig,
    ) -> Self {
        Self {
            kube,
            components,
            ingress,
            events,
            backoff: ErrorBackoff::new(config.error_requeue_base, config.error_requeue_max),
        }
    }

    /// Create a context wired to a real cluster
    pub fn from_client(client: Client, config: &ControllerConfig) -> Self {
        let workloads = Arc::new(WorkloadKubeClientImpl::new(client.clone()));
        let component = |kind: ComponentKind| {
            Arc::new(WorkloadComponentReconciler::new(
                kind,
                workloads.clone(),
                config.cluster_domain.clone(),
            ))
        };
        let components = ComponentSet {
            predictor: component(ComponentKind::Predictor),
            transformer: component(ComponentKind::Transformer),
            explainer: component(ComponentKind::Explainer),
        };

        Self::new(
            Arc::new(InferenceServiceKubeClientImpl::new(client.clone())),
            components,
            Arc::new(StatusIngressReconciler::new(config.ingress.clone())),
            Arc::new(KubeEventPublisher::new(client, FIELD_MANAGER)),
            config,
        )
    }
}

/// Reconcile an InferenceService
///
/// Entry point registered with the kube-rs `Controller`, which serializes
/// passes per object.
#[instrument(skip(isvc, ctx), fields(service = %isvc.name_any()))]
pub async fn reconcile(
    isvc: Arc<InferenceService>,
    ctx: Arc<InferenceServiceContext>,
) -> Result<Action, Error> {
    let key = ObjectKey::from_object(&isvc)?;
    let action = reconcile_key(&key, &ctx).await?;
    ctx.backoff.reset(&key);
    Ok(action)
}

/// Run one reconcile pass for `key`
pub async fn reconcile_key(
    key: &ObjectKey,
    ctx: &InferenceServiceContext,
) -> Result<Action, Error> {
    let Some(mut isvc) = ctx
        .kube
        .get_inference_service(&key.name, &key.namespace)
        .await?
    else {
        debug!(service = %key, "InferenceService not found, nothing to do");
        ctx.backoff.reset(key);
        return Ok(Action::await_change());
    };

    info!(service = %key, "reconciling InferenceService");
    let object_ref = isvc.object_ref(&());

    for (kind, reconciler) in ctx.components.ordered_for(&isvc.spec) {
        debug!(component = %kind, "reconciling component");
        if let Err(e) = reconciler.reconcile(&mut isvc).await {
            warn!(service = %key, component = %kind, error = %e, "component reconcile failed");
            ctx.events
                .publish(
                    &object_ref,
                    EventType::Warning,
                    reasons::INTERNAL_ERROR,
                    actions::RECONCILE,
                    Some(format!("Failed to reconcile {}: {}", kind, e)),
                )
                .await;
            return Err(Error::component(kind, e));
        }
    }

    if let Err(e) = ctx.ingress.reconcile(&mut isvc).await {
        warn!(service = %key, error = %e, "ingress reconcile failed");
        ctx.events
            .publish(
                &object_ref,
                EventType::Warning,
                reasons::INTERNAL_ERROR,
                actions::RECONCILE,
                Some(format!("Failed to reconcile ingress: {}", e)),
            )
            .await;
        return Err(Error::ingress(e));
    }

    let outcome = commit_status(key, &isvc, ctx).await?;
    debug!(service = %key, ?outcome, "reconcile pass complete");
    Ok(Action::await_change())
}

/// Error policy for the controller
///
/// Retryable failures requeue with per-object exponential backoff; anything
/// else waits for the object to change.
pub fn error_policy(
    isvc: Arc<InferenceService>,
    error: &Error,
    ctx: Arc<InferenceServiceContext>,
) -> Action {
    error!(
        ?error,
        service = %isvc.name_any(),
        component = ?error.failed_component(),
        retryable = error.is_retryable(),
        "reconciliation failed"
    );

    let Ok(key) = ObjectKey::from_object(&isvc) else {
        return Action::await_change();
    };
    // Deleted objects are never reconciled again
    if error.is_not_found() {
        ctx.backoff.reset(&key);
        return Action::await_change();
    }
    if !error.is_retryable() {
        return Action::await_change();
    }
    Action::requeue(ctx.backoff.next_delay(&key))
}
