//! CRD installation on startup using server-side apply

use k8s_openapi::apiextensions_apiserver::pkg::apis::apiextensions::v1::CustomResourceDefinition;
use kube::api::{Api, Patch, PatchParams};
use kube::{Client, CustomResourceExt};

use inference_common::crd::InferenceService;
use inference_common::FIELD_MANAGER;

/// Install or update the InferenceService CRD so it always matches this binary
pub async fn ensure_crds(client: &Client) -> anyhow::Result<()> {
    let crds: Api<CustomResourceDefinition> = Api::all(client.clone());
    let params = PatchParams::apply(FIELD_MANAGER).force();
    let name = InferenceService::crd_name();

    tracing::info!("Installing {} CRD...", name);
    crds.patch(name, &params, &Patch::Apply(&InferenceService::crd()))
        .await
        .map_err(|e| anyhow::anyhow!("failed to install {} CRD: {}", name, e))?;

    tracing::info!("InferenceService CRD installed/updated");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crd_name_matches_group_and_plural() {
        assert_eq!(
            InferenceService::crd_name(),
            "inferenceservices.serving.kubeflow.org"
        );
        assert_eq!(InferenceService::crd().metadata.name.as_deref(), Some(InferenceService::crd_name()));
    }
}
