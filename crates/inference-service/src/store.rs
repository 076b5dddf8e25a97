//! Resource store access for InferenceService objects
//!
//! The controller reads and writes InferenceServices only through
//! [`InferenceServiceKubeClient`], so reconcile passes can be tested against
//! mocks and in-memory fakes.

use async_trait::async_trait;
use kube::api::{Api, Patch, PatchParams};
use kube::{Client, Resource, ResourceExt};
use tracing::debug;

#[cfg(test)]
use mockall::automock;

use inference_common::crd::InferenceService;
use inference_common::{Error, FIELD_MANAGER};

/// Store operations the reconcile pass consumes
#[cfg_attr(test, automock)]
#[async_trait]
pub trait InferenceServiceKubeClient: Send + Sync {
    /// Fetch an InferenceService straight from the API server.
    ///
    /// Returns `Ok(None)` when the object does not exist.
    async fn get_inference_service(
        &self,
        name: &str,
        namespace: &str,
    ) -> Result<Option<InferenceService>, Error>;

    /// Write the status of `isvc`.
    ///
    /// The write carries the object's `resourceVersion`, so the API server
    /// rejects it with 409 Conflict if the object changed since it was read.
    async fn update_status(&self, isvc: &InferenceService) -> Result<(), Error>;
}

/// Real Kubernetes client implementation
pub struct InferenceServiceKubeClientImpl {
    client: Client,
}

impl InferenceServiceKubeClientImpl {
    /// Wrap a kube client
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl InferenceServiceKubeClient for InferenceServiceKubeClientImpl {
    async fn get_inference_service(
        &self,
        name: &str,
        namespace: &str,
    ) -> Result<Option<InferenceService>, Error> {
        let api: Api<InferenceService> = Api::namespaced(self.client.clone(), namespace);
        Ok(api.get_opt(name).await?)
    }

    async fn update_status(&self, isvc: &InferenceService) -> Result<(), Error> {
        let name = isvc.name_any();
        let namespace = isvc
            .namespace()
            .ok_or_else(|| Error::validation_for(&name, "InferenceService must be namespaced"))?;
        let api: Api<InferenceService> = Api::namespaced(self.client.clone(), &namespace);

        // Server-side apply of the full status: fields this manager stops
        // sending (a removed component, a cleared url) are pruned, and the
        // resourceVersion acts as a precondition.
        let patch = serde_json::json!({
            "apiVersion": InferenceService::api_version(&()),
            "kind": InferenceService::kind(&()),
            "metadata": {
                "name": name,
                "namespace": namespace,
                "resourceVersion": isvc.resource_version(),
            },
            "status": isvc.status,
        });

        api.patch_status(
            &name,
            &PatchParams::apply(FIELD_MANAGER).force(),
            &Patch::Apply(&patch),
        )
        .await?;

        debug!(service = %name, namespace = %namespace, "status written");
        Ok(())
    }
}
