//! Component reconcilers
//!
//! Each logical component of an InferenceService (predictor, transformer,
//! explainer) has a reconciler that converges the component and records what
//! it observed in the object's status. The orchestrator runs them
//! sequentially over one `&mut InferenceService`; a reconciler must not keep
//! any reference to the object past its own call.

mod workload;

use std::sync::Arc;

use async_trait::async_trait;

use inference_common::crd::{ComponentKind, InferenceService, InferenceServiceSpec};
use inference_common::Error;

pub use workload::{
    workload_name, WorkloadComponentReconciler, WorkloadKubeClient, WorkloadKubeClientImpl,
};

/// Converges one component of an InferenceService.
#[async_trait]
pub trait ComponentReconciler: Send + Sync {
    /// Converge the component and update `isvc.status` for the fields it owns.
    async fn reconcile(&self, isvc: &mut InferenceService) -> Result<(), Error>;
}

/// The reconcilers available for each component kind
#[derive(Clone)]
pub struct ComponentSet {
    /// Always run
    pub predictor: Arc<dyn ComponentReconciler>,
    /// Run when `spec.transformer` is set
    pub transformer: Arc<dyn ComponentReconciler>,
    /// Run when `spec.explainer` is set
    pub explainer: Arc<dyn ComponentReconciler>,
}

impl ComponentSet {
    /// Reconciler registered for `kind`
    pub fn get(&self, kind: ComponentKind) -> Arc<dyn ComponentReconciler> {
        match kind {
            ComponentKind::Predictor => self.predictor.clone(),
            ComponentKind::Transformer => self.transformer.clone(),
            ComponentKind::Explainer => self.explainer.clone(),
        }
    }

    /// Reconcilers to run for `spec`, in order, each tagged with its kind.
    ///
    /// The predictor always comes first: transformer and explainer route to
    /// the endpoint it publishes.
    pub fn ordered_for(
        &self,
        spec: &InferenceServiceSpec,
    ) -> Vec<(ComponentKind, Arc<dyn ComponentReconciler>)> {
        spec.requested_components()
            .into_iter()
            .map(|kind| (kind, self.get(kind)))
            .collect()
    }
}
