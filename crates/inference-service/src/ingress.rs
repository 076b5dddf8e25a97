//! Ingress reconciliation
//!
//! Runs after every component succeeded. The shipped implementation
//! publishes the external URL and entry address and folds the component
//! conditions into the top-level `Ready` condition. Routing objects
//! (gateways, virtual services) are owned by whichever `IngressReconciler`
//! a deployment plugs in instead.

use async_trait::async_trait;
use kube::ResourceExt;
use tracing::debug;

use inference_common::crd::{
    condition_types, ComponentKind, Condition, ConditionStatus, InferenceService,
    InferenceServiceStatus,
};
use inference_common::Error;

use crate::config::IngressConfig;

/// Converges externally-reachable routing for an InferenceService.
#[async_trait]
pub trait IngressReconciler: Send + Sync {
    /// Converge routing and update `isvc.status` for the fields it owns.
    async fn reconcile(&self, isvc: &mut InferenceService) -> Result<(), Error>;
}

/// Ingress reconciler that derives URL, address and `Ready` from status
pub struct StatusIngressReconciler {
    config: IngressConfig,
}

impl StatusIngressReconciler {
    /// Create a reconciler with the given URL settings
    pub fn new(config: IngressConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl IngressReconciler for StatusIngressReconciler {
    async fn reconcile(&self, isvc: &mut InferenceService) -> Result<(), Error> {
        let name = isvc.name_any();
        let namespace = isvc
            .namespace()
            .ok_or_else(|| Error::validation_for(&name, "InferenceService must be namespaced"))?;
        if self.config.domain.trim().is_empty() {
            return Err(Error::validation_for(&name, "ingress domain must not be empty"));
        }

        let requested = isvc.spec.requested_components();
        let generation = isvc.metadata.generation;
        let status = isvc.status.get_or_insert_with(Default::default);

        prune_unrequested(status, &requested);

        // Traffic enters through the transformer when there is one.
        let entry = if requested.contains(&ComponentKind::Transformer) {
            ComponentKind::Transformer
        } else {
            ComponentKind::Predictor
        };
        status.address = status.component_address(entry).map(str::to_string);
        status.url = Some(self.config.url_for(&name, &namespace));

        let ingress_condition = match &status.address {
            Some(_) => Condition::new(
                condition_types::INGRESS_READY,
                ConditionStatus::True,
                "RouteReady",
                format!("Traffic routed to the {}", entry),
            ),
            None => Condition::new(
                condition_types::INGRESS_READY,
                ConditionStatus::False,
                "EndpointNotPublished",
                format!("Waiting for the {} to publish its endpoint", entry),
            ),
        };
        status.set_condition(ingress_condition);

        let ready = aggregate_ready(status, &requested);
        debug!(service = %name, ready = %ready.status, reason = %ready.reason, "aggregated readiness");
        status.set_condition(ready);
        status.observed_generation = generation;

        Ok(())
    }
}

/// Drop component state and conditions for components no longer in the spec
fn prune_unrequested(status: &mut InferenceServiceStatus, requested: &[ComponentKind]) {
    status.components.retain(|kind, _| requested.contains(kind));
    let stale: Vec<&'static str> = ComponentKind::ALL
        .into_iter()
        .filter(|kind| !requested.contains(kind))
        .map(|kind| kind.ready_condition())
        .collect();
    status
        .conditions
        .retain(|c| !stale.contains(&c.type_.as_str()));
}

/// Fold the requested components' conditions and `IngressReady` into `Ready`.
///
/// False wins over Unknown; the first not-ready condition names the reason.
fn aggregate_ready(status: &InferenceServiceStatus, requested: &[ComponentKind]) -> Condition {
    let inputs = requested
        .iter()
        .map(|kind| kind.ready_condition())
        .chain(std::iter::once(condition_types::INGRESS_READY));

    let mut first_false: Option<(&str, String)> = None;
    let mut first_unknown: Option<(&str, String)> = None;

    for type_ in inputs {
        let (value, message) = match status.get_condition(type_) {
            Some(c) => (c.status, c.message.clone()),
            None => (ConditionStatus::Unknown, format!("{} not reported", type_)),
        };
        match value {
            ConditionStatus::True => {}
            ConditionStatus::False if first_false.is_none() => {
                first_false = Some((type_, message));
            }
            ConditionStatus::Unknown if first_unknown.is_none() => {
                first_unknown = Some((type_, message));
            }
            _ => {}
        }
    }

    match (first_false, first_unknown) {
        (Some((type_, message)), _) => Condition::new(
            condition_types::READY,
            ConditionStatus::False,
            format!("{}False", type_),
            message,
        ),
        (None, Some((type_, message))) => Condition::new(
            condition_types::READY,
            ConditionStatus::Unknown,
            format!("{}Unknown", type_),
            message,
        ),
        (None, None) => Condition::new(
            condition_types::READY,
            ConditionStatus::True,
            "AllComponentsReady",
            "InferenceService is serving",
        ),
    }
}
