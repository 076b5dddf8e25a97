//! Workload-observing component reconciler
//!
//! Reports a component's state from the Deployment that serves it
//! (`{isvc}-{component}`). The Deployment is produced elsewhere; this
//! reconciler reads it, publishes the component's in-cluster address once it
//! is available, and sets the component's `*Ready` condition.

use std::sync::Arc;

use async_trait::async_trait;
use k8s_openapi::api::apps::v1::Deployment;
use kube::api::Api;
use kube::{Client, ResourceExt};
use tracing::debug;

#[cfg(test)]
use mockall::automock;

use inference_common::crd::{
    ComponentKind, ComponentStatus, Condition, ConditionStatus, InferenceService,
};
use inference_common::Error;

use super::ComponentReconciler;

/// Name of the workload serving `kind` for the InferenceService `isvc_name`
pub fn workload_name(isvc_name: &str, kind: ComponentKind) -> String {
    format!("{}-{}", isvc_name, kind)
}

/// Read access to component workloads
#[cfg_attr(test, automock)]
#[async_trait]
pub trait WorkloadKubeClient: Send + Sync {
    /// Get a Deployment by name, `None` if it does not exist
    async fn get_deployment(&self, name: &str, namespace: &str)
        -> Result<Option<Deployment>, Error>;
}

/// Real Kubernetes client implementation
pub struct WorkloadKubeClientImpl {
    client: Client,
}

impl WorkloadKubeClientImpl {
    /// Wrap a kube client
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl WorkloadKubeClient for WorkloadKubeClientImpl {
    async fn get_deployment(
        &self,
        name: &str,
        namespace: &str,
    ) -> Result<Option<Deployment>, Error> {
        let api: Api<Deployment> = Api::namespaced(self.client.clone(), namespace);
        Ok(api.get_opt(name).await?)
    }
}

/// Component reconciler that observes the component's Deployment
pub struct WorkloadComponentReconciler {
    kind: ComponentKind,
    kube: Arc<dyn WorkloadKubeClient>,
    cluster_domain: String,
}

impl WorkloadComponentReconciler {
    /// Create a reconciler for one component kind
    pub fn new(
        kind: ComponentKind,
        kube: Arc<dyn WorkloadKubeClient>,
        cluster_domain: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            kube,
            cluster_domain: cluster_domain.into(),
        }
    }

    fn address(&self, workload: &str, namespace: &str) -> String {
        format!(
            "http://{}.{}.svc.{}",
            workload, namespace, self.cluster_domain
        )
    }
}

/// What the Deployment says about the component
enum Observation {
    Missing,
    Unavailable { ready_replicas: i32 },
    Available { ready_replicas: i32 },
}

fn observe(deployment: Option<&Deployment>) -> Observation {
    let Some(deployment) = deployment else {
        return Observation::Missing;
    };
    let status = deployment.status.as_ref();
    let ready_replicas = status.and_then(|s| s.ready_replicas).unwrap_or(0);
    let available = status
        .and_then(|s| s.conditions.as_ref())
        .map(|conds| {
            conds
                .iter()
                .any(|c| c.type_ == "Available" && c.status == "True")
        })
        .unwrap_or(false);

    if available && ready_replicas > 0 {
        Observation::Available { ready_replicas }
    } else {
        Observation::Unavailable { ready_replicas }
    }
}

#[async_trait]
impl ComponentReconciler for WorkloadComponentReconciler {
    async fn reconcile(&self, isvc: &mut InferenceService) -> Result<(), Error> {
        let name = isvc.name_any();
        let namespace = isvc
            .namespace()
            .ok_or_else(|| Error::validation_for(&name, "InferenceService must be namespaced"))?;
        let workload = workload_name(&name, self.kind);
        let condition_type = self.kind.ready_condition();

        let status = isvc.status.get_or_insert_with(Default::default);

        if self.kind != ComponentKind::Predictor
            && status.component_address(ComponentKind::Predictor).is_none()
        {
            debug!(component = %self.kind, "predictor endpoint not published, waiting");
            status.components.insert(self.kind, ComponentStatus::default());
            status.set_condition(Condition::new(
                condition_type,
                ConditionStatus::False,
                "PredictorNotReady",
                "Waiting for the predictor to publish its endpoint",
            ));
            return Ok(());
        }

        let deployment = self.kube.get_deployment(&workload, &namespace).await?;

        let (component, condition) = match observe(deployment.as_ref()) {
            Observation::Missing => (
                ComponentStatus::default(),
                Condition::new(
                    condition_type,
                    ConditionStatus::Unknown,
                    "WorkloadNotFound",
                    format!("Deployment {} not found", workload),
                ),
            ),
            Observation::Unavailable { ready_replicas } => (
                ComponentStatus {
                    ready_replicas,
                    address: None,
                },
                Condition::new(
                    condition_type,
                    ConditionStatus::False,
                    "WorkloadUnavailable",
                    format!("Deployment {} is not available", workload),
                ),
            ),
            Observation::Available { ready_replicas } => (
                ComponentStatus {
                    ready_replicas,
                    address: Some(self.address(&workload, &namespace)),
                },
                Condition::new(
                    condition_type,
                    ConditionStatus::True,
                    "WorkloadAvailable",
                    format!("Deployment {} is available", workload),
                ),
            ),
        };

        debug!(
            component = %self.kind,
            workload = %workload,
            status = %condition.status,
            ready_replicas = component.ready_replicas,
            "observed component workload"
        );

        status.components.insert(self.kind, component);
        status.set_condition(condition);
        Ok(())
    }
}
